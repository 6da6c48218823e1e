//! Derivation functions
//!
//! Derivations compute a datapoint from siblings that were already evaluated
//! earlier in the same pass rather than from registers. Each one is a pure
//! function of its static argument and the context built so far; the
//! registry guarantees at load time that every label read here is defined
//! before the datapoint that reads it.

pub mod tables;

use crate::codec::round_to;
use crate::datapoint::{LoadQuantity, StageForm, Value};
use crate::error::EvalError;
use crate::evaluator::EvaluationContext;

pub const CSTATE: &str = "cstate";
pub const STATE: &str = "state";
pub const RESTING_REASON: &str = "restingreason";
pub const VOUT: &str = "vout";
pub const IOUT: &str = "iout";
pub const IBAT: &str = "ibat";
pub const VPV: &str = "vpv";
pub const IPV: &str = "ipv";

/// Charge stage as an English word or as a linear, charting-friendly code.
///
/// An unlisted stage reads "Unknown" as a word and fails in linear form.
pub fn translate_stage(form: StageForm, ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let code = ctx.code(CSTATE)?;
    match form {
        StageForm::Word => tables::STAGE_WORDS.get(code).map(Value::from),
        StageForm::Linear => tables::STAGE_LINEAR.get(code).map(Value::from),
    }
}

/// Controller state word; unlisted codes read "Unknown"
pub fn translate_state(ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let code = ctx.code(STATE)?;
    tables::STATE_WORDS.get(code).map(Value::from)
}

/// Full explanation of the resting reason; undocumented codes are an error
pub fn translate_resting(ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let code = ctx.code(RESTING_REASON)?;
    tables::RESTING_REASONS.get(code).map(Value::from)
}

/// Short resting reason; undocumented codes read "Unknown"
pub fn translate_resting_short(ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let code = ctx.code(RESTING_REASON)?;
    tables::RESTING_REASONS_SHORT.get(code).map(Value::from)
}

/// Load side figures from the WhizBang Jr. shunt.
///
/// The shunt reports battery current positive while charging, so whatever
/// the controller outputs beyond that goes to the loads.
pub fn calc_load_data(
    quantity: LoadQuantity,
    ctx: &EvaluationContext,
) -> Result<Value, EvalError> {
    let vout = ctx.number(VOUT)?;
    let iout = ctx.number(IOUT)?;
    let ibat = ctx.number(IBAT)?;
    let iload = iout - ibat;

    let value = match quantity {
        LoadQuantity::Batstate => {
            let state = if ibat > 0.0 { "Charging" } else { "Discharging" };
            return Ok(Value::from(state));
        }
        LoadQuantity::Iload => iload,
        LoadQuantity::Pload => iload * vout,
        LoadQuantity::Iabsbat => ibat.abs(),
        LoadQuantity::Ichgbat => {
            if ibat > 0.0 {
                ibat
            } else {
                0.0
            }
        }
        LoadQuantity::Idisbat => {
            if ibat < 0.0 {
                -ibat
            } else {
                0.0
            }
        }
    };
    Ok(Value::Decimal(round_to(value, 1)))
}

/// PV input power over output power, in whole percent; 0 while not producing
pub fn calc_efficiency(ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let pin = ctx.number(IPV)? * ctx.number(VPV)?;
    let pout = ctx.number(IOUT)? * ctx.number(VOUT)?;
    let eff = if pout == 0.0 { 0.0 } else { pin / pout * 100.0 };
    Ok(Value::Integer(round_to(eff, 0) as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datapoint::DatapointResult;

    fn ctx(values: &[(&str, Value)]) -> EvaluationContext {
        let mut ctx = EvaluationContext::new();
        for (label, value) in values {
            ctx.insert(label, DatapointResult::new(label, value.clone(), ""));
        }
        ctx
    }

    #[test]
    fn test_translate_stage() {
        let c = ctx(&[(CSTATE, Value::Integer(4))]);
        assert_eq!(
            translate_stage(StageForm::Word, &c).unwrap(),
            Value::from("Bulk")
        );
        assert_eq!(
            translate_stage(StageForm::Linear, &c).unwrap(),
            Value::Integer(3)
        );

        let c = ctx(&[(CSTATE, Value::Integer(9))]);
        assert_eq!(
            translate_stage(StageForm::Word, &c).unwrap(),
            Value::from("Unknown")
        );
        assert!(matches!(
            translate_stage(StageForm::Linear, &c),
            Err(EvalError::UnknownCode { code: 9, .. })
        ));
    }

    #[test]
    fn test_translate_state() {
        let c = ctx(&[(STATE, Value::Integer(2))]);
        assert_eq!(translate_state(&c).unwrap(), Value::from("Waking"));

        let c = ctx(&[(STATE, Value::Integer(8))]);
        assert_eq!(translate_state(&c).unwrap(), Value::from("Unknown"));
    }

    #[test]
    fn test_resting_translators_differ_on_unknown_codes() {
        let c = ctx(&[(RESTING_REASON, Value::Integer(23))]);
        assert!(matches!(
            translate_resting(&c),
            Err(EvalError::UnknownCode { code: 23, .. })
        ));
        assert_eq!(translate_resting_short(&c).unwrap(), Value::from("Unknown"));
    }

    #[test]
    fn test_load_data() {
        let c = ctx(&[
            (VOUT, Value::Decimal(48.0)),
            (IOUT, Value::Decimal(10.0)),
            (IBAT, Value::Decimal(6.0)),
        ]);
        assert_eq!(
            calc_load_data(LoadQuantity::Iload, &c).unwrap(),
            Value::Decimal(4.0)
        );
        assert_eq!(
            calc_load_data(LoadQuantity::Pload, &c).unwrap(),
            Value::Decimal(192.0)
        );
        assert_eq!(
            calc_load_data(LoadQuantity::Batstate, &c).unwrap(),
            Value::from("Charging")
        );
        assert_eq!(
            calc_load_data(LoadQuantity::Ichgbat, &c).unwrap(),
            Value::Decimal(6.0)
        );
        assert_eq!(
            calc_load_data(LoadQuantity::Idisbat, &c).unwrap(),
            Value::Decimal(0.0)
        );
    }

    #[test]
    fn test_load_data_discharging() {
        let c = ctx(&[
            (VOUT, Value::Decimal(51.2)),
            (IOUT, Value::Decimal(0.0)),
            (IBAT, Value::Decimal(-12.3)),
        ]);
        assert_eq!(
            calc_load_data(LoadQuantity::Batstate, &c).unwrap(),
            Value::from("Discharging")
        );
        assert_eq!(
            calc_load_data(LoadQuantity::Iabsbat, &c).unwrap(),
            Value::Decimal(12.3)
        );
        assert_eq!(
            calc_load_data(LoadQuantity::Idisbat, &c).unwrap(),
            Value::Decimal(12.3)
        );
        assert_eq!(
            calc_load_data(LoadQuantity::Iload, &c).unwrap(),
            Value::Decimal(12.3)
        );
    }

    #[test]
    fn test_load_data_needs_siblings() {
        let c = ctx(&[(VOUT, Value::Decimal(48.0)), (IOUT, Value::Decimal(10.0))]);
        assert_eq!(
            calc_load_data(LoadQuantity::Iload, &c),
            Err(EvalError::missing_datapoint(IBAT))
        );
    }

    #[test]
    fn test_efficiency() {
        let c = ctx(&[
            (IPV, Value::Decimal(5.2)),
            (VPV, Value::Decimal(100.0)),
            (IOUT, Value::Decimal(10.0)),
            (VOUT, Value::Decimal(50.0)),
        ]);
        assert_eq!(calc_efficiency(&c).unwrap(), Value::Integer(104));

        let idle = ctx(&[
            (IPV, Value::Decimal(0.0)),
            (VPV, Value::Decimal(20.0)),
            (IOUT, Value::Decimal(0.0)),
            (VOUT, Value::Decimal(50.0)),
        ]);
        assert_eq!(calc_efficiency(&idle).unwrap(), Value::Integer(0));
    }
}

//! Built-in datapoint table for the Midnite Classic
//!
//! Register numbers follow the Classic's Modbus map as written by the
//! acquisition daemon (base address + 1).

use crate::datapoint::{DatapointDefinition, LoadQuantity, Method, StageForm};
use crate::error::{ClassicError, Result};

fn formula(
    label: &str,
    name: &str,
    unit: &str,
    source: &str,
    precision: Option<u8>,
) -> Result<DatapointDefinition> {
    let method = Method::formula(source, precision)
        .map_err(|e| ClassicError::registry(label, e.to_string()))?;
    Ok(DatapointDefinition::new(label, name, unit, method))
}

fn derived(label: &str, name: &str, unit: &str, method: Method) -> DatapointDefinition {
    DatapointDefinition::new(label, name, unit, method)
}

fn load(label: &str, name: &str, unit: &str, quantity: LoadQuantity) -> DatapointDefinition {
    derived(label, name, unit, Method::LoadData { quantity })
}

/// All datapoints in evaluation order
pub fn definitions() -> Result<Vec<DatapointDefinition>> {
    Ok(vec![
        formula("classic", "Classic Unit Type", "", "lsb([4101])", None)?
            .with_comment("150, 200, 250, or 251 for the 250KS"),
        formula("rev", "Classic PCB Revision", "", "msb([4101])", None)?,
        derived(
            "firmdate",
            "Firmware Date",
            "",
            Method::Date {
                year: 4102,
                month_day: 4103,
            },
        ),
        formula("firmver", "Firmware Version", "", "[16387]", None)?,
        formula(
            "commver",
            "Revision of the communications code stack",
            "",
            "[16389]",
            None,
        )?,
        formula(
            "uptimes",
            "Uptime",
            "seconds",
            "round((([4350]<<16)+[4349]))",
            None,
        )?,
        formula(
            "uptimeh",
            "Uptime hours",
            "hours",
            "round((([4350]<<16)+[4349])/60/60)",
            None,
        )?,
        formula(
            "uptime",
            "Uptime days",
            "days",
            "round((([4350]<<16)+[4349])/60/60/24, 2)",
            None,
        )?,
        formula(
            "plifetime",
            "Lifetime kWh",
            "kWh",
            "(([4127]<<16)+[4126])/10",
            None,
        )?,
        formula("ptoday", "kWh Today", "kWh", "[4118]/10", Some(1))?
            .with_comment("reset once per day"),
        formula("ftoday", "Float Time Today", "seconds", "[4138]", None)?,
        formula("cstate", "Charge Stage Raw", "", "msb([4120])", None)?,
        derived(
            "cstageword",
            "Charge Stage",
            "",
            Method::TranslateStage {
                form: StageForm::Word,
            },
        ),
        derived(
            "cstagelin",
            "Charge Stage Lin",
            "",
            Method::TranslateStage {
                form: StageForm::Linear,
            },
        ),
        formula("state", "State Raw", "", "lsb([4120])", None)?,
        derived("stateword", "State", "", Method::TranslateState),
        formula("restingreason", "Reason for resting", "", "[4275]", None)?,
        derived(
            "restingreasonword",
            "Reason for resting",
            "",
            Method::TranslateResting,
        ),
        derived(
            "restingreasonwordshort",
            "Reason for resting",
            "",
            Method::TranslateRestingShort,
        ),
        formula("infoflags", "Info Flags", "", "(([4131]<<16)+[4130])", None)?
            .with_comment("decimal rendition of the hex flags"),
        // 65535 when no sensor is fitted; report the 25 °C the controller assumes
        formula(
            "tbat",
            "Battery Temp",
            "°C",
            "[4132] > 65000 ? 25 : [4132]/10",
            None,
        )?,
        formula("tcc", "FET Temp", "°C", "[4133]/10", Some(1))?,
        formula("tcc2", "PCB Temp", "°C", "[4134]/10", Some(1))?,
        formula("pout", "Output Power", "W", "[4119]", None)?,
        formula("vout", "Output Voltage", "V", "[4115]/10", Some(1))?,
        formula("iout", "Output Current", "A", "[4117]/10", Some(1))?,
        formula("vpv", "PV Voltage", "V", "[4116]/10", Some(1))?,
        formula("ipv", "PV Current", "A", "[4121]/10", Some(1))?,
        formula(
            "whizbtemp",
            "WhizBangJr Shunt Temperature",
            "°C",
            "lsb([4372])-50",
            None,
        )?,
        formula(
            "ibat",
            "WhizBangJr Current",
            "A",
            "signed16([4371])/10",
            Some(1),
        )?
        .with_comment("positive while charging"),
        formula("soc", "State of Charge", "%", "[4373]", None)?,
        formula(
            "battahrem",
            "Remaining battery capacity",
            "Ah",
            "[4377]",
            None,
        )?,
        formula("battah", "Battery capacity", "Ah", "[4381]", None)?,
        load("iabsbat", "Battery Current Abs", "A", LoadQuantity::Iabsbat),
        load(
            "ichgbat",
            "Battery Current Charge",
            "A",
            LoadQuantity::Ichgbat,
        ),
        load(
            "idisbat",
            "Battery Current Discharge",
            "A",
            LoadQuantity::Idisbat,
        ),
        load(
            "batstate",
            "Battery Current State",
            "",
            LoadQuantity::Batstate,
        ),
        load("iload", "Load Current", "A", LoadQuantity::Iload),
        load("pload", "Load Power", "W", LoadQuantity::Pload),
        derived("eff", "Efficiency", "%", Method::Efficiency),
    ])
}

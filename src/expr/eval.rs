use super::parser::{BinOp, Expr, Helper};
use crate::codec;
use crate::error::EvalError;
use crate::registers::RegisterSnapshot;
use std::cmp::Ordering;

/// Largest shift accepted by `<<`; 32-bit counters are composed with 16
const MAX_SHIFT: i64 = 47;

/// Result of evaluating a formula.
///
/// Integer arithmetic stays integral until a division is inexact, the same
/// way the controller's register maths is usually written down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    fn is_truthy(self) -> bool {
        match self {
            Number::Int(v) => v != 0,
            Number::Float(v) => v != 0.0,
        }
    }

    /// Integer view for bitwise operations; fractional parts are truncated
    fn as_int(self, what: &'static str) -> Result<i64, EvalError> {
        match self {
            Number::Int(v) => Ok(v),
            Number::Float(v) if v.is_finite() && v.abs() < 9.0e15 => Ok(v.trunc() as i64),
            Number::Float(v) => Err(EvalError::OutOfRange {
                what,
                value: v.to_string(),
            }),
        }
    }

    fn as_u16(self, what: &'static str) -> Result<u16, EvalError> {
        let v = self.as_int(what)?;
        u16::try_from(v).map_err(|_| EvalError::OutOfRange {
            what,
            value: v.to_string(),
        })
    }
}

pub fn evaluate(expr: &Expr, registers: &RegisterSnapshot) -> Result<Number, EvalError> {
    match expr {
        Expr::Int(v) => Ok(Number::Int(*v)),
        Expr::Float(v) => Ok(Number::Float(*v)),
        Expr::Register(r) => registers.get_raw(*r).map(|v| Number::Int(i64::from(v))),
        Expr::Neg(inner) => match evaluate(inner, registers)? {
            Number::Int(v) => v.checked_neg().map(Number::Int).ok_or(EvalError::Overflow),
            Number::Float(v) => Ok(Number::Float(-v)),
        },
        Expr::Binary(op, l, r) => {
            let left = evaluate(l, registers)?;
            let right = evaluate(r, registers)?;
            binary(*op, left, right)
        }
        Expr::Ternary(cond, then, otherwise) => {
            // Only the selected branch is evaluated
            if evaluate(cond, registers)?.is_truthy() {
                evaluate(then, registers)
            } else {
                evaluate(otherwise, registers)
            }
        }
        Expr::Call(helper, args) => {
            let values = args
                .iter()
                .map(|a| evaluate(a, registers))
                .collect::<Result<Vec<_>, _>>()?;
            call(*helper, &values)
        }
    }
}

fn binary(op: BinOp, left: Number, right: Number) -> Result<Number, EvalError> {
    use Number::{Float, Int};

    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul => match (left, right) {
            (Int(a), Int(b)) => {
                let v = match op {
                    BinOp::Add => a.checked_add(b),
                    BinOp::Sub => a.checked_sub(b),
                    _ => a.checked_mul(b),
                };
                v.map(Int).ok_or(EvalError::Overflow)
            }
            _ => {
                let (a, b) = (left.as_f64(), right.as_f64());
                finite(match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    _ => a * b,
                })
            }
        },
        BinOp::Div => match (left, right) {
            (_, Int(0)) => Err(EvalError::DivisionByZero),
            (_, Float(b)) if b == 0.0 => Err(EvalError::DivisionByZero),
            (Int(a), Int(b)) if a.checked_rem(b) == Some(0) => {
                a.checked_div(b).map(Int).ok_or(EvalError::Overflow)
            }
            _ => finite(left.as_f64() / right.as_f64()),
        },
        BinOp::Shl => {
            let value = left.as_int("shift operand")?;
            let amount = right.as_int("shift amount")?;
            if !(0..=MAX_SHIFT).contains(&amount) {
                return Err(EvalError::OutOfRange {
                    what: "shift amount",
                    value: amount.to_string(),
                });
            }
            value
                .checked_mul(1i64 << amount)
                .map(Int)
                .ok_or(EvalError::Overflow)
        }
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne => {
            let ordering = match (left, right) {
                (Int(a), Int(b)) => Some(a.cmp(&b)),
                _ => left.as_f64().partial_cmp(&right.as_f64()),
            };
            let holds = match (op, ordering) {
                (BinOp::Ne, None) => true,
                (_, None) => false,
                (BinOp::Lt, Some(o)) => o == Ordering::Less,
                (BinOp::Le, Some(o)) => o != Ordering::Greater,
                (BinOp::Gt, Some(o)) => o == Ordering::Greater,
                (BinOp::Ge, Some(o)) => o != Ordering::Less,
                (BinOp::Eq, Some(o)) => o == Ordering::Equal,
                (_, Some(o)) => o != Ordering::Equal,
            };
            Ok(Int(i64::from(holds)))
        }
    }
}

fn finite(v: f64) -> Result<Number, EvalError> {
    if v.is_finite() {
        Ok(Number::Float(v))
    } else {
        Err(EvalError::Overflow)
    }
}

fn call(helper: Helper, args: &[Number]) -> Result<Number, EvalError> {
    let arg = |i: usize| args.get(i).copied();
    match helper {
        Helper::Lsb => Ok(Number::Int(i64::from(codec::lsb(word(arg(0), "lsb argument")?)))),
        Helper::Msb => Ok(Number::Int(i64::from(codec::msb(word(arg(0), "msb argument")?)))),
        Helper::Signed16 => Ok(Number::Int(i64::from(codec::to_signed16(word(
            arg(0),
            "signed16 argument",
        )?)))),
        Helper::Compose32 => {
            let hi = word(arg(0), "compose32 high word")?;
            let lo = word(arg(1), "compose32 low word")?;
            Ok(Number::Int(i64::from(codec::compose32(hi, lo))))
        }
        Helper::Bits => {
            let value = word(arg(0), "bits argument")?;
            let hi = bit_index(arg(1))?;
            let lo = match arg(2) {
                Some(n) => bit_index(Some(n))?,
                None => hi,
            };
            if lo > hi {
                return Err(EvalError::OutOfRange {
                    what: "bit range",
                    value: format!("[{}, {}]", lo, hi),
                });
            }
            Ok(Number::Int(i64::from(codec::bits(value, hi, lo))))
        }
        Helper::Round => {
            let value = arg(0).unwrap_or(Number::Int(0));
            let digits = match arg(1) {
                Some(n) => n.as_int("round digits")?,
                None => 0,
            };
            if !(0..=10).contains(&digits) {
                return Err(EvalError::OutOfRange {
                    what: "round digits",
                    value: digits.to_string(),
                });
            }
            match value {
                Number::Int(_) => Ok(value),
                Number::Float(v) if digits == 0 => {
                    let rounded = v.round();
                    if rounded.is_finite() && rounded.abs() < 9.0e15 {
                        Ok(Number::Int(rounded as i64))
                    } else {
                        Err(EvalError::Overflow)
                    }
                }
                Number::Float(v) => Ok(Number::Float(codec::round_to(v, digits as u8))),
            }
        }
    }
}

fn word(value: Option<Number>, what: &'static str) -> Result<u16, EvalError> {
    value.unwrap_or(Number::Int(0)).as_u16(what)
}

fn bit_index(value: Option<Number>) -> Result<u8, EvalError> {
    let index = value.unwrap_or(Number::Int(0)).as_int("bit index")?;
    u8::try_from(index)
        .ok()
        .filter(|i| *i <= 15)
        .ok_or_else(|| EvalError::OutOfRange {
            what: "bit index",
            value: index.to_string(),
        })
}

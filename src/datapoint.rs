//! Datapoint definitions and results
//!
//! A [`DatapointDefinition`] is one row of the registry: a label, display
//! metadata and the [`Method`] that produces its value. Evaluating it yields
//! a [`DatapointResult`], which is either a [`Value`] or the error that made
//! the datapoint unavailable for this snapshot.

use crate::codec;
use crate::derive;
use crate::error::EvalError;
use crate::expr::{Formula, Number};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Broad class of a datapoint: read from registers or derived from siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationKind {
    FormulaExpr,
    Lookup,
}

/// Output form of the charge stage translator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageForm {
    /// English stage name
    Word,
    /// Stage remapped onto a monotonically ordered integer
    Linear,
}

/// Quantity produced by the WhizBang Jr. load derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadQuantity {
    Iload,
    Pload,
    Iabsbat,
    Ichgbat,
    Idisbat,
    Batstate,
}

/// How a datapoint's value is produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Method {
    /// Register formula, optionally rounded to a fixed number of decimals
    Formula {
        formula: Formula,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        precision: Option<u8>,
    },
    /// `year-month-day` text from a year register and a month/day byte pair
    Date { year: u16, month_day: u16 },
    TranslateStage { form: StageForm },
    TranslateState,
    TranslateResting,
    TranslateRestingShort,
    LoadData { quantity: LoadQuantity },
    Efficiency,
}

impl Method {
    pub fn formula(source: &str, precision: Option<u8>) -> Result<Self, EvalError> {
        Ok(Method::Formula {
            formula: Formula::parse(source)?,
            precision,
        })
    }

    pub fn kind(&self) -> EvaluationKind {
        match self {
            Method::Formula { .. } | Method::Date { .. } => EvaluationKind::FormulaExpr,
            _ => EvaluationKind::Lookup,
        }
    }

    /// Sibling datapoints this method reads; they must be defined earlier
    pub fn dependencies(&self) -> &'static [&'static str] {
        match self {
            Method::Formula { .. } | Method::Date { .. } => &[],
            Method::TranslateStage { .. } => &[derive::CSTATE],
            Method::TranslateState => &[derive::STATE],
            Method::TranslateResting | Method::TranslateRestingShort => {
                &[derive::RESTING_REASON]
            }
            Method::LoadData { .. } => &[derive::VOUT, derive::IOUT, derive::IBAT],
            Method::Efficiency => &[derive::IPV, derive::VPV, derive::IOUT, derive::VOUT],
        }
    }

    /// Registers this method reads directly
    pub fn registers(&self) -> Vec<u16> {
        match self {
            Method::Formula { formula, .. } => formula.registers(),
            Method::Date { year, month_day } => vec![*year, *month_day],
            _ => Vec::new(),
        }
    }
}

/// One registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatapointDefinition {
    /// Unique key in the output map
    pub label: String,

    /// Human-readable name
    pub name: String,

    /// Display unit, empty for codes and text
    #[serde(default)]
    pub unit: String,

    pub method: Method,

    /// Evaluation sequence; 0 lets the registry assign the next position
    #[serde(default)]
    pub order: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl DatapointDefinition {
    pub fn new(label: &str, name: &str, unit: &str, method: Method) -> Self {
        Self {
            label: label.to_string(),
            name: name.to_string(),
            unit: unit.to_string(),
            method,
            order: 0,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }
}

/// A computed datapoint value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl Value {
    /// Convert a formula result, rounding when a precision is given
    pub fn from_number(number: Number, precision: Option<u8>) -> Self {
        match (number, precision) {
            (Number::Int(v), None) => Value::Integer(v),
            (Number::Float(v), None) => Value::Decimal(v),
            (n, Some(0)) => Value::Integer(n.as_f64().round() as i64),
            (n, Some(p)) => Value::Decimal(codec::round_to(n.as_f64(), p)),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Decimal(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    /// Whole-number view, used for status codes
    pub fn as_code(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Decimal(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Decimal(v)
    }
}

/// Outcome of one datapoint in one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct DatapointResult {
    pub name: String,
    pub value: Result<Value, EvalError>,
    pub unit: String,
}

impl DatapointResult {
    pub fn new<V: Into<Value>>(name: &str, value: V, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            value: Ok(value.into()),
            unit: unit.to_string(),
        }
    }

    pub fn from_definition(def: &DatapointDefinition, value: Result<Value, EvalError>) -> Self {
        Self {
            name: def.name.clone(),
            value,
            unit: def.unit.clone(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.value.is_ok()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref().ok()
    }

    pub fn error(&self) -> Option<&EvalError> {
        self.value.as_ref().err()
    }
}

impl Serialize for DatapointResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.value {
            Ok(value) => {
                let mut s = serializer.serialize_struct("DatapointResult", 3)?;
                s.serialize_field("name", &self.name)?;
                s.serialize_field("value", value)?;
                s.serialize_field("unit", &self.unit)?;
                s.end()
            }
            Err(err) => {
                let mut s = serializer.serialize_struct("DatapointResult", 5)?;
                s.serialize_field("name", &self.name)?;
                s.serialize_field("value", &Option::<Value>::None)?;
                s.serialize_field("unit", &self.unit)?;
                s.serialize_field("error", err.kind())?;
                s.serialize_field("detail", &err.to_string())?;
                s.end()
            }
        }
    }
}

//! Snapshot evaluation
//!
//! The [`SnapshotEvaluator`] walks the registry in order, dispatches each
//! definition on its [`Method`] and accumulates the results in an
//! [`EvaluationContext`] that later derivations read from. A datapoint that
//! fails is recorded with its error and the pass carries on.

use crate::codec;
use crate::datapoint::{DatapointDefinition, DatapointResult, Method, Value};
use crate::derive;
use crate::error::{EvalError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::registers::RegisterSnapshot;
use crate::registry::Registry;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::sync::Arc;

/// Results of the current pass, in evaluation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationContext {
    entries: Vec<(String, DatapointResult)>,
    index: HashMap<String, usize>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the result for a label; a repeated label replaces the earlier value in place
    pub fn insert(&mut self, label: &str, result: DatapointResult) {
        match self.index.get(label) {
            Some(&i) => self.entries[i].1 = result,
            None => {
                self.index.insert(label.to_string(), self.entries.len());
                self.entries.push((label.to_string(), result));
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&DatapointResult> {
        self.index.get(label).map(|&i| &self.entries[i].1)
    }

    /// Successfully computed value of a sibling
    pub fn value(&self, label: &str) -> std::result::Result<&Value, EvalError> {
        self.get(label)
            .and_then(DatapointResult::value)
            .ok_or_else(|| EvalError::missing_datapoint(label))
    }

    /// Numeric value of a sibling
    pub fn number(&self, label: &str) -> std::result::Result<f64, EvalError> {
        self.value(label)?
            .as_f64()
            .ok_or_else(|| EvalError::NotNumeric {
                label: label.to_string(),
            })
    }

    /// Whole-number status code held by a sibling
    pub fn code(&self, label: &str) -> std::result::Result<i64, EvalError> {
        self.value(label)?
            .as_code()
            .ok_or_else(|| EvalError::NotNumeric {
                label: label.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DatapointResult)> {
        self.entries.iter().map(|(l, r)| (l.as_str(), r))
    }
}

impl Serialize for EvaluationContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, result) in &self.entries {
            map.serialize_entry(label, result)?;
        }
        map.end()
    }
}

/// Final outcome of one evaluation pass
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotReport {
    pub timestamp: DateTime<Utc>,
    pub data: EvaluationContext,
}

impl SnapshotReport {
    pub fn get(&self, label: &str) -> Option<&DatapointResult> {
        self.data.get(label)
    }

    /// Labels that could not be computed, with their errors
    pub fn failures(&self) -> Vec<(&str, &EvalError)> {
        self.data
            .iter()
            .filter_map(|(label, r)| r.error().map(|e| (label, e)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Render as `{"timestamp": <unix seconds>, "data": {...}}`
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

impl Serialize for SnapshotReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("timestamp", &self.timestamp.timestamp())?;
        map.serialize_entry("data", &self.data)?;
        map.end()
    }
}

/// Orchestrates one pass over the datapoint registry
#[derive(Clone)]
pub struct SnapshotEvaluator {
    registry: Arc<Registry>,
    referenced: Vec<u16>,
    logger: StructuredLogger,
}

impl SnapshotEvaluator {
    pub fn new(registry: Arc<Registry>) -> Self {
        let context =
            LogContext::new("evaluator").with_field("datapoints", registry.len().to_string());
        Self {
            referenced: registry.registers(),
            registry,
            logger: get_logger_with_context(context),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Evaluate every definition exactly once, in registry order
    pub fn evaluate(&self, snapshot: &RegisterSnapshot) -> SnapshotReport {
        let mut ctx = EvaluationContext::new();
        let mut failed = 0usize;

        for def in self.registry.iter() {
            let value = evaluate_definition(def, snapshot, &ctx);
            if let Err(ref e) = value {
                failed += 1;
                self.logger.warn(&format!(
                    "Datapoint '{}' unavailable ({}): {}",
                    def.label,
                    e.kind(),
                    e
                ));
            }
            ctx.insert(&def.label, DatapointResult::from_definition(def, value));
        }

        let absent = self
            .referenced
            .iter()
            .filter(|r| !snapshot.contains(**r))
            .count();
        self.logger.debug(&format!(
            "Evaluated {} datapoints from {} registers ({} of {} referenced absent), {} failed",
            ctx.len(),
            snapshot.len(),
            absent,
            self.referenced.len(),
            failed
        ));

        SnapshotReport {
            timestamp: snapshot.timestamp(),
            data: ctx,
        }
    }
}

fn evaluate_definition(
    def: &DatapointDefinition,
    snapshot: &RegisterSnapshot,
    ctx: &EvaluationContext,
) -> std::result::Result<Value, EvalError> {
    match &def.method {
        Method::Formula { formula, precision } => formula
            .evaluate(snapshot)
            .map(|n| Value::from_number(n, *precision)),
        Method::Date { year, month_day } => {
            let year = snapshot.get_raw(*year)?;
            let month_day = snapshot.get_raw(*month_day)?;
            Ok(Value::Text(format!(
                "{}-{}-{}",
                year,
                codec::msb(month_day),
                codec::lsb(month_day)
            )))
        }
        Method::TranslateStage { form } => derive::translate_stage(*form, ctx),
        Method::TranslateState => derive::translate_state(ctx),
        Method::TranslateResting => derive::translate_resting(ctx),
        Method::TranslateRestingShort => derive::translate_resting_short(ctx),
        Method::LoadData { quantity } => derive::calc_load_data(*quantity, ctx),
        Method::Efficiency => derive::calc_efficiency(ctx),
    }
}

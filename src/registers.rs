//! Register store for a single snapshot
//!
//! Holds the raw register map read from the controller at one instant. The
//! store is built once per decode cycle and never mutated afterwards.

use crate::error::EvalError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// One timestamped set of raw register readings
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterSnapshot {
    timestamp: DateTime<Utc>,
    registers: BTreeMap<u16, u16>,
}

impl RegisterSnapshot {
    /// Create a snapshot from already-decoded register values
    pub fn new<I>(timestamp: DateTime<Utc>, registers: I) -> Self
    where
        I: IntoIterator<Item = (u16, u16)>,
    {
        Self {
            timestamp,
            registers: registers.into_iter().collect(),
        }
    }

    /// Instant the registers were sampled
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Raw value of a register, failing if the snapshot does not contain it
    pub fn get_raw(&self, register: u16) -> Result<u16, EvalError> {
        self.registers
            .get(&register)
            .copied()
            .ok_or(EvalError::MissingRegister { register })
    }

    pub fn contains(&self, register: u16) -> bool {
        self.registers.contains_key(&register)
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}

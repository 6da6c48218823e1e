//! # classic-monitor - Midnite Classic register snapshot decoder
//!
//! Turns the raw register dump written by a Modbus polling daemon into a set
//! of named, unit-tagged datapoints: voltages, currents, temperatures, charge
//! stage, energy counters and a few figures derived from the WhizBang Jr.
//! battery shunt.
//!
//! ## Features
//!
//! - **Safe formulas**: register formulas are parsed by a small,
//!   grammar-limited evaluator when the registry is built
//! - **Ordered derivations**: derived datapoints declare the siblings they
//!   read and the registry checks that those come first
//! - **Partial results**: one missing register marks one datapoint as
//!   unavailable instead of failing the whole snapshot
//! - **Custom tables**: the built-in datapoint table can be replaced by YAML
//!
//! ## Architecture
//!
//! - `registers`: register store for one snapshot
//! - `codec`: byte, bit and word decoding helpers
//! - `expr`: formula lexer, parser and evaluator
//! - `datapoint`: definitions, evaluation methods and results
//! - `registry`: validated, ordered datapoint table
//! - `derive`: lookup translations and cross-datapoint arithmetic
//! - `evaluator`: the per-snapshot evaluation pass
//! - `snapshot`: the daemon's status file format
//! - `config`: configuration management and validation
//! - `logging`: structured logging and tracing

pub mod codec;
pub mod config;
pub mod datapoint;
pub mod derive;
pub mod error;
pub mod evaluator;
pub mod expr;
pub mod logging;
pub mod registers;
pub mod registry;
pub mod snapshot;

// Re-export commonly used types
pub use config::Config;
pub use datapoint::{DatapointDefinition, DatapointResult, Method, Value};
pub use error::{ClassicError, EvalError, Result};
pub use evaluator::{EvaluationContext, SnapshotEvaluator, SnapshotReport};
pub use registers::RegisterSnapshot;
pub use registry::Registry;

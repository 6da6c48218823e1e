//! Error types and handling for classic-monitor
//!
//! Two layers of errors live here. [`ClassicError`] covers everything that
//! stops the program or rejects an input as a whole: configuration, registry
//! construction, snapshot parsing and I/O. [`EvalError`] is the recoverable,
//! per-datapoint failure recorded by the evaluator while it keeps going with
//! the rest of the pass.

use thiserror::Error;

/// Result type alias for classic-monitor operations
pub type Result<T> = std::result::Result<T, ClassicError>;

/// Main error type for classic-monitor
#[derive(Debug, Error)]
pub enum ClassicError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Datapoint registry construction errors (fatal at load time)
    #[error("Registry error: {label} - {message}")]
    Registry { label: String, message: String },

    /// Malformed snapshot text
    #[error("Snapshot error at line {line}: {message}")]
    Snapshot { line: usize, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// A snapshot evaluation exceeded its wall-clock budget
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl ClassicError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        ClassicError::Config {
            message: message.into(),
        }
    }

    /// Create a new registry error for the given datapoint label
    pub fn registry<L: Into<String>, S: Into<String>>(label: L, message: S) -> Self {
        ClassicError::Registry {
            label: label.into(),
            message: message.into(),
        }
    }

    /// Create a new snapshot parse error (1-based line number)
    pub fn snapshot<S: Into<String>>(line: usize, message: S) -> Self {
        ClassicError::Snapshot {
            line,
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        ClassicError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        ClassicError::Io {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        ClassicError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        ClassicError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ClassicError {
    fn from(err: std::io::Error) -> Self {
        ClassicError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for ClassicError {
    fn from(err: serde_yaml::Error) -> Self {
        ClassicError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ClassicError {
    fn from(err: serde_json::Error) -> Self {
        ClassicError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<chrono::ParseError> for ClassicError {
    fn from(err: chrono::ParseError) -> Self {
        ClassicError::validation("datetime", err.to_string())
    }
}

/// Failure of a single datapoint within one evaluation pass.
///
/// These never abort the pass; the evaluator records them against the
/// failing label and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A formula referenced a register that is absent from the snapshot
    #[error("register {register} is missing from the snapshot")]
    MissingRegister { register: u16 },

    /// A derivation needed a sibling datapoint that is absent or failed
    #[error("datapoint '{label}' is not available")]
    MissingDatapoint { label: String },

    /// The formula text does not match the expression grammar
    #[error("invalid formula '{formula}': {message}")]
    FormulaSyntax { formula: String, message: String },

    /// A lookup table has no entry for the code
    #[error("no entry for code {code} in {table} table")]
    UnknownCode { table: &'static str, code: i64 },

    /// A formula divided by a zero denominator
    #[error("division by zero")]
    DivisionByZero,

    /// A sibling datapoint holds text where a number was required
    #[error("datapoint '{label}' is not numeric")]
    NotNumeric { label: String },

    /// Integer arithmetic left the representable range
    #[error("arithmetic overflow")]
    Overflow,

    /// A helper or shift received an operand outside its domain
    #[error("{what} out of range: {value}")]
    OutOfRange { what: &'static str, value: String },
}

impl EvalError {
    /// Create a new formula syntax error
    pub fn syntax<F: Into<String>, S: Into<String>>(formula: F, message: S) -> Self {
        EvalError::FormulaSyntax {
            formula: formula.into(),
            message: message.into(),
        }
    }

    /// Create a new missing datapoint error
    pub fn missing_datapoint<S: Into<String>>(label: S) -> Self {
        EvalError::MissingDatapoint {
            label: label.into(),
        }
    }

    /// Stable kind name surfaced next to an unavailable value
    pub fn kind(&self) -> &'static str {
        match self {
            EvalError::MissingRegister { .. } | EvalError::MissingDatapoint { .. } => {
                "MissingRegisterError"
            }
            EvalError::FormulaSyntax { .. } => "FormulaSyntaxError",
            EvalError::UnknownCode { .. } => "UnknownCodeError",
            EvalError::DivisionByZero => "DivisionByZeroError",
            EvalError::NotNumeric { .. } => "NotNumericError",
            EvalError::Overflow => "OverflowError",
            EvalError::OutOfRange { .. } => "OutOfRangeError",
        }
    }
}

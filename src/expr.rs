//! Register formula language
//!
//! Formulas mix integer/decimal arithmetic with register references written
//! as a bracketed register number, e.g. `(([4350] << 16) + [4349]) / 3600`.
//! They are parsed once, when the datapoint registry is built, and evaluated
//! against each snapshot by walking the tree; register values are looked up
//! at evaluation time and never spliced into text.
//!
//! Supported, loosest binding first: ternary `c ? a : b`, one comparison
//! (`< <= > >= == !=`), `<<`, `+ -`, `* /`, unary `-`. Callable helpers are
//! `lsb`, `msb`, `bits`, `signed16`, `compose32` and `round`. Nesting is
//! capped at [`MAX_DEPTH`]. Anything else is a [`EvalError::FormulaSyntax`].

mod eval;
mod lexer;
mod parser;

pub use eval::Number;
pub use parser::MAX_DEPTH;

use crate::error::EvalError;
use crate::registers::RegisterSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed, validated register formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Formula {
    source: String,
    expr: parser::Expr,
}

impl Formula {
    /// Parse formula text, rejecting anything outside the grammar
    pub fn parse(source: &str) -> Result<Self, EvalError> {
        let expr = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// Original formula text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Registers read by this formula, in source order, deduplicated
    pub fn registers(&self) -> Vec<u16> {
        let mut regs = Vec::new();
        self.expr.registers(&mut regs);
        let mut seen = std::collections::HashSet::new();
        regs.retain(|r| seen.insert(*r));
        regs
    }

    /// Evaluate against one snapshot's registers
    pub fn evaluate(&self, registers: &RegisterSnapshot) -> Result<Number, EvalError> {
        eval::evaluate(&self.expr, registers)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for Formula {
    type Error = EvalError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Formula::parse(&source)
    }
}

impl From<Formula> for String {
    fn from(formula: Formula) -> Self {
        formula.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_uptime_formulas() {
        let snap = RegisterSnapshot::new(Utc::now(), [(4349, 3600), (4350, 0)]);

        let seconds = Formula::parse("round((([4350]<<16)+[4349]))").unwrap();
        assert_eq!(seconds.evaluate(&snap).unwrap(), Number::Int(3600));

        let days = Formula::parse("round((([4350]<<16)+[4349])/60/60/24,2)").unwrap();
        assert_eq!(days.evaluate(&snap).unwrap(), Number::Float(0.04));
    }

    #[test]
    fn test_registers_are_deduplicated() {
        let f = Formula::parse("[4132] > 65000 ? 25 : [4132]/10").unwrap();
        assert_eq!(f.registers(), vec![4132]);
    }

    #[test]
    fn test_serde_as_string() {
        let f: Formula = serde_yaml::from_str("\"msb([4120])\"").unwrap();
        assert_eq!(f.source(), "msb([4120])");
        assert!(serde_yaml::from_str::<Formula>("\"system('ls')\"").is_err());
        let yaml = serde_yaml::to_string(&f).unwrap();
        let back: Formula = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, f);
    }
}

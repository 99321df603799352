//! Public models for the calculator module.
//!
//! These are transport-agnostic data structures that define the contract
//! between the calculator service and its consumers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalculatorError;

/// Outcome of a single operation: a number, or the error the service raised.
pub type OperationResult = Result<f64, CalculatorError>;

/// Arithmetic operation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    /// All supported operations, in declaration order.
    pub const ALL: [Self; 4] = [Self::Add, Self::Subtract, Self::Multiply, Self::Divide];

    /// Lowercase name as used in scenario text (`add`, `subtract`, ...).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }

    /// Arithmetic symbol (`+`, `-`, `*`, `/`).
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when text names no known operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation: '{0}'")]
pub struct ParseOperationError(pub String);

impl FromStr for Operation {
    type Err = ParseOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| {
                op.name().eq_ignore_ascii_case(trimmed)
                    || (trimmed.len() == 1 && trimmed.starts_with(op.symbol()))
            })
            .ok_or_else(|| ParseOperationError(trimmed.to_owned()))
    }
}

/// A pair of operands plus the operation to apply to them.
///
/// Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    operation: Operation,
    lhs: f64,
    rhs: f64,
}

impl OperationRequest {
    /// Creates a new request.
    #[must_use]
    pub const fn new(operation: Operation, lhs: f64, rhs: f64) -> Self {
        Self { operation, lhs, rhs }
    }

    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// Left-hand operand (the dividend for `Divide`).
    #[must_use]
    pub const fn lhs(&self) -> f64 {
        self.lhs
    }

    /// Right-hand operand (the divisor for `Divide`).
    #[must_use]
    pub const fn rhs(&self) -> f64 {
        self.rhs
    }
}

impl fmt::Display for OperationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.operation.symbol(), self.rhs)
    }
}

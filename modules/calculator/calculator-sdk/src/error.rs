//! Error type for calculator operations.

use thiserror::Error;

/// Error type for Calculator operations
///
/// Division by zero is the only failure: every other finite input produces a
/// value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculatorError {
    #[error("division by zero")]
    DivisionByZero,
}

impl CalculatorError {
    /// Stable machine-readable code for reports.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::DivisionByZero => "division_by_zero",
        }
    }
}

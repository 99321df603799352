//! Domain service for calculator
//!
//! Contains the core business logic for arithmetic operations.

use calculator_sdk::{CalculatorError, Operation, OperationRequest, OperationResult};
use tracing::debug;

/// Domain service that performs arithmetic operations.
///
/// This is a stateless service: every result depends only on the operands
/// and the selected operation. Arithmetic follows IEEE-754 `f64` semantics;
/// the one rejected input is a zero divisor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Service;

#[allow(clippy::unused_self)]
impl Service {
    /// Create a new service.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluate a request by dispatching on its operation.
    ///
    /// # Errors
    ///
    /// Returns `CalculatorError::DivisionByZero` for a divide with a zero divisor.
    pub fn evaluate(&self, request: &OperationRequest) -> OperationResult {
        let (a, b) = (request.lhs(), request.rhs());
        match request.operation() {
            Operation::Add => Ok(self.add(a, b)),
            Operation::Subtract => Ok(self.subtract(a, b)),
            Operation::Multiply => Ok(self.multiply(a, b)),
            Operation::Divide => self.divide(a, b),
        }
    }

    /// Add two numbers and return the sum.
    #[must_use]
    pub fn add(&self, a: f64, b: f64) -> f64 {
        debug!(a, b, "performing addition");
        a + b
    }

    #[must_use]
    pub fn subtract(&self, a: f64, b: f64) -> f64 {
        debug!(a, b, "performing subtraction");
        a - b
    }

    #[must_use]
    pub fn multiply(&self, a: f64, b: f64) -> f64 {
        debug!(a, b, "performing multiplication");
        a * b
    }

    /// Divide `a` by `b`.
    ///
    /// # Errors
    ///
    /// Returns `CalculatorError::DivisionByZero` when `b` is `0.0` or `-0.0`.
    pub fn divide(&self, a: f64, b: f64) -> OperationResult {
        if b == 0.0 {
            debug!(a, "rejecting division by zero");
            return Err(CalculatorError::DivisionByZero);
        }
        debug!(a, b, "performing division");
        Ok(a / b)
    }
}

//! Calculator API trait
//!
//! Contract trait for the calculator service.

use crate::models::{Operation, OperationRequest, OperationResult};

/// Calculator API trait
///
/// Every operation is a pure function of its operands. Implementations hold no
/// mutable state and can be shared freely across threads.
///
/// ```ignore
/// let client: Arc<dyn CalculatorClientV1> = calculator::client();
/// assert_eq!(client.add(4.0, 5.0)?, 9.0);
/// ```
pub trait CalculatorClientV1: Send + Sync {
    /// Evaluate a single operation request.
    ///
    /// # Errors
    ///
    /// * `DivisionByZero` - if the request divides by zero
    fn evaluate(&self, request: &OperationRequest) -> OperationResult;

    /// Add two numbers and return the sum.
    ///
    /// # Errors
    ///
    /// Never fails for `add`; the `Result` keeps the trait uniform.
    fn add(&self, a: f64, b: f64) -> OperationResult {
        self.evaluate(&OperationRequest::new(Operation::Add, a, b))
    }

    /// Subtract `b` from `a`.
    ///
    /// # Errors
    ///
    /// Never fails for `subtract`.
    fn subtract(&self, a: f64, b: f64) -> OperationResult {
        self.evaluate(&OperationRequest::new(Operation::Subtract, a, b))
    }

    /// Multiply two numbers.
    ///
    /// # Errors
    ///
    /// Never fails for `multiply`.
    fn multiply(&self, a: f64, b: f64) -> OperationResult {
        self.evaluate(&OperationRequest::new(Operation::Multiply, a, b))
    }

    /// Divide `a` by `b`.
    ///
    /// # Errors
    ///
    /// * `DivisionByZero` - if `b` is zero
    fn divide(&self, a: f64, b: f64) -> OperationResult {
        self.evaluate(&OperationRequest::new(Operation::Divide, a, b))
    }
}

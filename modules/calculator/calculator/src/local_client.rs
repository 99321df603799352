//! Local client implementing the `CalculatorClientV1` trait.

use std::sync::Arc;

use calculator_sdk::{CalculatorClientV1, OperationRequest, OperationResult};

use crate::domain::Service;

/// Local client for the calculator module.
///
/// This client implements the `CalculatorClientV1` trait and delegates
/// to the domain service. It is what both scenario runners and any other
/// in-process consumer call.
#[derive(Debug, Clone)]
pub struct CalculatorLocalClient {
    service: Arc<Service>,
}

impl CalculatorLocalClient {
    /// Creates a new local client with the given service.
    #[must_use]
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

impl CalculatorClientV1 for CalculatorLocalClient {
    fn evaluate(&self, request: &OperationRequest) -> OperationResult {
        self.service.evaluate(request)
    }
}

//! Calculator Module
//!
//! A pure arithmetic service (add, subtract, multiply, divide) exercised by
//! two parallel test surfaces: plain unit tests and Gherkin scenarios.
//!
//! ## Architecture
//!
//! - `domain/service.rs` - Core business logic
//! - `local_client.rs` - In-process `CalculatorClientV1` implementation
//! - `steps.rs` - Step vocabulary shared by the cucumber suite and `calculator-scenarios`
//! - `features/*.feature` - Behavior scenarios shared by both scenario runners
//!
//! External consumers should depend on `calculator-sdk` for the API trait and
//! obtain an implementation through [`client`].

use std::sync::Arc;

use calculator_sdk::CalculatorClientV1;

pub mod domain;
pub mod local_client;
pub mod steps;

pub use domain::Service;
pub use local_client::CalculatorLocalClient;

/// Build the in-process calculator client.
#[must_use]
pub fn client() -> Arc<dyn CalculatorClientV1> {
    Arc::new(CalculatorLocalClient::new(Arc::new(Service::new())))
}

//! Calculator SDK
//!
//! This crate provides everything needed to consume the calculator service:
//! - API trait (`CalculatorClientV1`)
//! - Request and result types (`Operation`, `OperationRequest`, `OperationResult`)
//! - Error types (`CalculatorError`)
//!
//! ## Usage
//!
//! ```ignore
//! use calculator_sdk::{CalculatorClientV1, Operation, OperationRequest};
//!
//! let client = calculator::client();
//! let sum = client.add(4.0, 5.0)?;
//! let quotient = client.evaluate(&OperationRequest::new(Operation::Divide, 10.0, 2.0))?;
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

// === API TRAIT AND TYPES ===
pub mod api;
pub mod error;
pub mod models;

pub use api::CalculatorClientV1;
pub use error::CalculatorError;
pub use models::{Operation, OperationRequest, OperationResult, ParseOperationError};

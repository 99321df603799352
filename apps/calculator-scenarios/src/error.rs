//! Error types for the scenario runner.

use std::path::PathBuf;

use thiserror::Error;

/// Harness-level failures: anything that stops a feature file or the runner
/// itself from getting as far as executing steps.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to load configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("invalid step pattern: {0}")]
    StepPattern(#[from] regex::Error),
}

impl ScenarioError {
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

//! Runner configuration.
//!
//! Layers, lowest to highest precedence: built-in defaults, an optional YAML
//! file, `CALC_SCENARIOS_*` environment variables, and command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

pub const ENV_PREFIX: &str = "CALC_SCENARIOS_";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioRunnerConfig {
    /// Directories or files to search for `.feature` files.
    pub paths: Vec<PathBuf>,
    /// Glob patterns; matching files are skipped.
    pub exclude: Vec<String>,
    /// Absolute tolerance for `the result should be` assertions.
    pub tolerance: f64,
    pub scenario_timeout_ms: u64,
    /// Scenarios in flight at once.
    pub concurrency: usize,
    /// Default filter when `RUST_LOG` is not set.
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ScenarioRunnerConfig {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from("modules")],
            exclude: Vec::new(),
            tolerance: 1.0e-9,
            scenario_timeout_ms: 5_000,
            concurrency: std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get),
            log_level: "warn".to_owned(),
            log_format: LogFormat::Text,
        }
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub paths: Vec<PathBuf>,
    pub exclude: Vec<String>,
    pub tolerance: Option<f64>,
    pub scenario_timeout_ms: Option<u64>,
    pub concurrency: Option<usize>,
    pub log_format: Option<LogFormat>,
}

impl ScenarioRunnerConfig {
    /// Merge defaults, the optional YAML file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `file` is given but does not exist, or if any layer
    /// holds a value of the wrong type or an unknown key.
    pub fn load(file: Option<&Path>) -> Result<Self, ScenarioError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = file {
            if !path.is_file() {
                return Err(ScenarioError::invalid_config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Yaml::file(path));
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(Box::new)?;

        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }

    /// Command-line values win over everything loaded from files and the environment.
    pub fn apply_cli_overrides(&mut self, cli: CliOverrides) {
        if !cli.paths.is_empty() {
            self.paths = cli.paths;
        }
        self.exclude.extend(cli.exclude);
        if let Some(tolerance) = cli.tolerance {
            self.tolerance = tolerance;
        }
        if let Some(timeout) = cli.scenario_timeout_ms {
            self.scenario_timeout_ms = timeout;
        }
        if let Some(concurrency) = cli.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(format) = cli.log_format {
            self.log_format = format;
        }
    }

    /// # Errors
    ///
    /// Returns `ScenarioError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ScenarioError::invalid_config(format!(
                "tolerance must be a positive finite number, got {}",
                self.tolerance
            )));
        }
        if self.scenario_timeout_ms == 0 {
            return Err(ScenarioError::invalid_config(
                "scenario_timeout_ms must be greater than zero",
            ));
        }
        if self.concurrency == 0 {
            return Err(ScenarioError::invalid_config(
                "concurrency must be greater than zero",
            ));
        }
        if self.paths.is_empty() {
            return Err(ScenarioError::invalid_config("no paths to scan"));
        }
        Ok(())
    }

    #[must_use]
    pub const fn scenario_timeout(&self) -> Duration {
        Duration::from_millis(self.scenario_timeout_ms)
    }
}

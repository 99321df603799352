//! Tracing subscriber setup for the runner.
//!
//! Logs go to stderr in text or JSON. The filter comes from `RUST_LOG` when
//! set, otherwise from `-v` flags, otherwise from the configured `log_level`.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ScenarioRunnerConfig};

/// Filter directive for `-v` flags; `None` means "use the configured level".
fn verbosity_directive(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// `RUST_LOG` wins, then `-v` flags, then `log_level` from the config.
fn build_filter(config: &ScenarioRunnerConfig, verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(verbosity_directive(verbose).unwrap_or(config.log_level.as_str()))
    })
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean for
/// reports. A second call is a no-op.
pub fn init_logging(config: &ScenarioRunnerConfig, verbose: u8) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(config, verbose))
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    if installed.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}

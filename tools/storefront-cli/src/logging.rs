//! Tracing subscriber setup.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

const DEFAULT_FILTER: &str = "info";

/// Pick the filter directive: `RUST_LOG`, then the config, then `info`.
/// `--verbose` overrides all of them with `debug`.
pub fn filter_directive(verbose: bool, env: Option<String>, config: &LogConfig) -> String {
    if verbose {
        return "debug".to_string();
    }
    env.filter(|f| !f.trim().is_empty())
        .or_else(|| config.filter.clone())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays parseable.
pub fn init(verbose: bool, json: bool, config: &LogConfig) -> Result<()> {
    let directive = filter_directive(verbose, std::env::var(EnvFilter::DEFAULT_ENV).ok(), config);
    let filter = EnvFilter::try_new(&directive).map_err(|e| anyhow!(e))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    installed.map_err(|e| anyhow!(e))
}

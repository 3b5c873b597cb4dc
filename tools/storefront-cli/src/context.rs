//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use turbo_auth::LoggingNavigator;
use turbo_cache::FileStorage;
use turbo_commerce::Storefront;
use turbo_data::ReqwestTransport;

use crate::config::{CliConfig, CONFIG_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    pub config: CliConfig,
    /// File the config was read from, if any.
    pub config_path: Option<PathBuf>,
    pub output: Output,
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = match config_path {
            Some(path) => (CliConfig::load(path)?, Some(PathBuf::from(path))),
            None => match Self::find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            },
        };

        Ok(Self {
            config: config.with_env_overrides(),
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some((config, config_path));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }

    /// Open the durable store and wire a storefront over it.
    pub fn storefront(&self) -> Result<Storefront> {
        let dir = self.resolve_path(&self.config.storage.dir);
        let storage = FileStorage::for_origin(&dir, &self.config.storage.origin)
            .with_context(|| format!("Failed to open storage in {}", dir.display()))?;
        self.output
            .debug(&format!("Storage: {}", storage.path().display()));

        let transport = ReqwestTransport::new(self.config.api.timeout())
            .context("Failed to build HTTP client")?;

        Ok(Storefront::builder(Arc::new(storage), Arc::new(transport))
            .base_url(self.config.api.base_url.clone())
            .navigator(Arc::new(LoggingNavigator))
            .ttls(self.config.cache.ttls())
            .feedback_delay(self.config.cart.feedback_delay())
            .build())
    }
}

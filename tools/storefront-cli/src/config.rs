//! CLI configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use turbo_commerce::api::DEFAULT_API_BASE;
use turbo_commerce::cart::DEFAULT_FEEDBACK_DELAY;
use turbo_commerce::catalog::CatalogTtls;

/// Environment variable overriding `[api] base_url`.
pub const API_URL_ENV: &str = "STOREFRONT_API_URL";

/// File names searched for, in order, in each directory.
pub const CONFIG_NAMES: [&str; 3] = ["storefront.toml", ".storefront.toml", "storefront.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub cart: CartConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::parse(path, &content)
    }

    /// Parse config text; `path` only decides between JSON and TOML.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(content).with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Apply overrides taken from the environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            self.apply_api_url(Some(url));
        }
        self
    }

    fn apply_api_url(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url;
        }
    }
}

/// Backend API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL that relative image paths are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_url: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            storage_url: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Where the durable key/value file lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub dir: String,

    /// Origin the stored data belongs to. One file per origin.
    #[serde(default = "default_origin")]
    pub origin: String,
}

fn default_storage_dir() -> String {
    ".storefront".to_string()
}

fn default_origin() -> String {
    "https://vipuri.co.tz".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            origin: default_origin(),
        }
    }
}

/// Catalog cache lifetimes, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub categories_ttl_secs: u64,
    pub home_categories_ttl_secs: u64,
    pub banners_ttl_secs: u64,
    pub footer_ttl_secs: u64,
    pub subcategories_ttl_secs: u64,
    pub attributes_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let ttls = CatalogTtls::default();
        Self {
            categories_ttl_secs: ttls.categories.as_secs(),
            home_categories_ttl_secs: ttls.home_categories.as_secs(),
            banners_ttl_secs: ttls.banners.as_secs(),
            footer_ttl_secs: ttls.footer.as_secs(),
            subcategories_ttl_secs: ttls.subcategories.as_secs(),
            attributes_ttl_secs: ttls.attributes.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttls(&self) -> CatalogTtls {
        CatalogTtls {
            categories: Duration::from_secs(self.categories_ttl_secs),
            home_categories: Duration::from_secs(self.home_categories_ttl_secs),
            banners: Duration::from_secs(self.banners_ttl_secs),
            footer: Duration::from_secs(self.footer_ttl_secs),
            subcategories: Duration::from_secs(self.subcategories_ttl_secs),
            attributes: Duration::from_secs(self.attributes_ttl_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartConfig {
    #[serde(default = "default_feedback_delay_ms")]
    pub feedback_delay_ms: u64,
}

fn default_feedback_delay_ms() -> u64 {
    DEFAULT_FEEDBACK_DELAY.as_millis() as u64
}

impl CartConfig {
    pub fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_delay_ms)
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            feedback_delay_ms: default_feedback_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive, e.g. `info,turbo_commerce=debug`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Generate a default storefront.toml config file.
pub fn generate_default_config() -> String {
    let cache = CacheConfig::default();
    format!(
        r#"# Storefront client configuration

[api]
base_url = "{base_url}"
# storage_url = "https://api.vipuri.co.tz/storage"
timeout_ms = {timeout_ms}

[storage]
dir = "{dir}"
origin = "{origin}"

[cache]
categories_ttl_secs = {categories}
home_categories_ttl_secs = {home}
banners_ttl_secs = {banners}
footer_ttl_secs = {footer}
subcategories_ttl_secs = {subcategories}
attributes_ttl_secs = {attributes}

[cart]
feedback_delay_ms = {feedback}

[log]
# filter = "info,turbo_commerce=debug"
"#,
        base_url = default_base_url(),
        timeout_ms = default_timeout_ms(),
        dir = default_storage_dir(),
        origin = default_origin(),
        categories = cache.categories_ttl_secs,
        home = cache.home_categories_ttl_secs,
        banners = cache.banners_ttl_secs,
        footer = cache.footer_ttl_secs,
        subcategories = cache.subcategories_ttl_secs,
        attributes = cache.attributes_ttl_secs,
        feedback = default_feedback_delay_ms(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config = CliConfig::parse("storefront.toml", &generate_default_config()).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CliConfig::parse(
            "storefront.toml",
            r#"
[api]
base_url = "http://localhost:8000/api"

[cache]
footer_ttl_secs = 30
"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.cache.ttls().footer, Duration::from_secs(30));
        assert_eq!(config.cache.ttls().categories, CatalogTtls::default().categories);
        assert_eq!(config.cart.feedback_delay(), DEFAULT_FEEDBACK_DELAY);
    }

    #[test]
    fn test_json_config() {
        let config = CliConfig::parse(
            "storefront.json",
            r#"{"storage": {"dir": "/tmp/shop", "origin": "https://shop.example"}, "log": {"filter": "debug"}}"#,
        )
        .unwrap();

        assert_eq!(config.storage.dir, "/tmp/shop");
        assert_eq!(config.storage.origin, "https://shop.example");
        assert_eq!(config.log.filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = CliConfig::parse("storefront.toml", "[api\nbase_url = ").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse TOML config"));
    }

    #[test]
    fn test_api_url_override_ignores_blank() {
        let mut config = CliConfig::default();
        config.apply_api_url(Some("  ".to_string()));
        assert_eq!(config.api.base_url, DEFAULT_API_BASE);

        config.apply_api_url(Some("http://staging/api".to_string()));
        assert_eq!(config.api.base_url, "http://staging/api");
    }
}

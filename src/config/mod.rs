//! # Configuration Management Module
//!
//! Storeforge reads a small TOML file that supplies the defaults used when new entities are
//! created, which hook providers count as enabled, and how the binary logs.
//!
//! ## Configuration Structure
//!
//! - [`EconomyConfig`] - defaults for new goods, currencies and categories
//! - [`HooksConfig`] - enabled hook providers and the stub-api switch
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use storeforge::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("storeforge.toml").await?;
//!     println!("Default currency: {}", config.economy.default_currency_id);
//!
//!     Config::create_default("storeforge.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [economy]
//! default_currency_id = "currency_coins"
//! default_price = 100.0
//!
//! [hooks]
//! stub_api = false
//! enabled_providers = ["sponsorpay"]
//!
//! [logging]
//! level = "info"
//! file = "storeforge.log"
//! ```
//!
//! Every section may be omitted; missing values fall back to [`Config::default`].

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

pub use crate::economy::graph::EconomyConfig;
pub use crate::hooks::manager::HooksConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub hooks: HooksConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Write the default configuration to `path`
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.economy.default_currency_id.trim().is_empty() {
            return Err(anyhow!("economy.default_currency_id must not be empty"));
        }
        if !self.economy.default_price.is_finite() || self.economy.default_price < 0.0 {
            return Err(anyhow!(
                "economy.default_price must be a non-negative number, got {}",
                self.economy.default_price
            ));
        }
        match self.logging.level.to_ascii_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" | "off" => Ok(()),
            other => Err(anyhow!("logging.level '{}' is not a log level", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::manager::EnabledProviders;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.economy.default_currency_id, "currency_coins");
        assert_eq!(config.economy.default_price, 100.0);
        assert_eq!(config.economy.default_good_name, "Untitled");
        assert_eq!(config.economy.default_currency_name, "coins");
        assert_eq!(config.economy.default_category_name, "General");
        assert!(!config.hooks.stub_api);
        assert_eq!(config.logging.level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [economy]
            default_price = 250.0

            [hooks]
            enabled_providers = { sponsorpay = true }
            "#,
        )
        .unwrap();
        assert_eq!(config.economy.default_price, 250.0);
        assert_eq!(config.economy.default_currency_id, "currency_coins");
        assert_eq!(
            config.hooks.enabled_providers,
            Some(EnabledProviders::Map([("sponsorpay".to_string(), true)].into()))
        );
    }

    #[test]
    fn test_legacy_provider_list() {
        let config: Config = toml::from_str(
            r#"
            [hooks]
            enabled_providers = ["sponsorpay"]
            "#,
        )
        .unwrap();
        let enabled = config.hooks.enabled_providers.unwrap();
        assert!(enabled.is_enabled("sponsorpay"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.economy.default_price = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "loud".into();
        assert!(config.validate().is_err());
    }
}

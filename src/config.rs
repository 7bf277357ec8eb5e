use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_NUMBER_PREFIX: &str = "L";
const DEFAULT_PAGE_SIZE: u64 = 10;
const DEFAULT_MAX_PAGE_SIZE: u64 = 100;
const DEFAULT_APPLICANT_ID: &str = "user-001";
const DEFAULT_APPLICANT_NAME: &str = "System Applicant";
const CONFIG_DIR: &str = "config";

/// Store configuration with validation.
///
/// Loaded once at startup and handed to [`crate::store::RebateStore`]; every
/// field has a sensible default so an empty configuration source is valid.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Prefix for generated application numbers (`{prefix}{YYYYMM}{seq}`)
    #[serde(default = "default_number_prefix")]
    #[validate(length(min = 1))]
    pub application_number_prefix: String,

    /// Page size used when a search request does not specify one
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1))]
    pub default_page_size: u64,

    /// Upper bound applied to any requested page size
    #[serde(default = "default_max_page_size")]
    #[validate(range(min = 1))]
    pub max_page_size: u64,

    /// Applicant id recorded when a create request omits one
    #[serde(default = "default_applicant_id")]
    pub default_applicant_id: String,

    /// Applicant display name recorded when a create request omits one
    #[serde(default = "default_applicant_name")]
    pub default_applicant_name: String,
}

fn default_number_prefix() -> String {
    DEFAULT_NUMBER_PREFIX.to_string()
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> u64 {
    DEFAULT_MAX_PAGE_SIZE
}

fn default_applicant_id() -> String {
    DEFAULT_APPLICANT_ID.to_string()
}

fn default_applicant_name() -> String {
    DEFAULT_APPLICANT_NAME.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            application_number_prefix: default_number_prefix(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            default_applicant_id: default_applicant_id(),
            default_applicant_name: default_applicant_name(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

impl StoreConfig {
    /// Loads configuration from `config/rebate.*` (optional) layered with
    /// `REBATE_`-prefixed environment variables.
    pub fn load() -> Result<Self, ConfigLoadError> {
        let settings = Config::builder()
            .add_source(File::with_name(&format!("{}/rebate", CONFIG_DIR)).required(false))
            .add_source(Environment::with_prefix("REBATE").separator("__"))
            .build()?;

        let config: StoreConfig = settings.try_deserialize()?;
        config.ensure_valid()?;

        info!(
            default_page_size = config.default_page_size,
            max_page_size = config.max_page_size,
            "Store configuration loaded"
        );
        Ok(config)
    }

    fn ensure_valid(&self) -> Result<(), ConfigLoadError> {
        self.validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;
        if self.default_page_size > self.max_page_size {
            return Err(ConfigLoadError::Validation(format!(
                "default_page_size ({}) exceeds max_page_size ({})",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = StoreConfig::default();
        assert!(config.ensure_valid().is_ok());
        assert_eq!(config.application_number_prefix, "L");
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.max_page_size, 100);
    }

    #[test]
    fn rejects_default_page_size_above_max() {
        let config = StoreConfig {
            default_page_size: 500,
            ..StoreConfig::default()
        };
        assert!(config.ensure_valid().is_err());
    }
}

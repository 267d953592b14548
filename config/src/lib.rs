//! # Configuration Management for QuerySmith
//!
//! This crate provides the configuration structures read by the query builder.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::BuilderConfig;
//!
//! let builder = BuilderConfig::new("SplitOn".to_string(), "Id".to_string(), false);
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [builder]
//! splitter_prefix = "SplitOn"
//! default_split_on = "Id"
//! log_generated_sql = true
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from QUERYSMITH_CONFIG or ./querysmith.toml
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./querysmith.toml";
const CONFIG_PATH_VAR: &str = "QUERYSMITH_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub builder: BuilderConfig,
}

/// Query builder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Prefix of the sentinel column emitted for every join
    pub splitter_prefix: String,
    /// Split-on value reported when every join splits on it
    pub default_split_on: String,
    pub log_generated_sql: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            splitter_prefix: "SplitOn".to_string(),
            default_split_on: "Id".to_string(),
            log_generated_sql: false,
        }
    }
}

impl BuilderConfig {
    /// Create a new builder configuration
    pub fn new(splitter_prefix: String, default_split_on: String, log_generated_sql: bool) -> Self {
        Self {
            splitter_prefix,
            default_split_on,
            log_generated_sql,
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_token("splitter_prefix", &self.splitter_prefix)?;
        validate_token("default_split_on", &self.default_split_on)?;
        Ok(())
    }
}

fn validate_token(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid(format!("Builder {} cannot be empty", key)));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::Invalid(format!(
            "Builder {} cannot contain whitespace: '{}'",
            key, value
        )));
    }
    Ok(())
}

impl AppConfig {
    /// Load configuration from the TOML file named by `QUERYSMITH_CONFIG` (after
    /// reading `.env`) or from `./querysmith.toml`. Defaults apply when neither exists.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is not an error
        dotenvy::dotenv().ok();

        let config_path = match env::var(CONFIG_PATH_VAR) {
            Ok(path) => Some(path),
            Err(env::VarError::NotPresent) => None,
            Err(e) => return Err(e.into()),
        };
        Self::load_from(config_path.as_deref(), DEFAULT_CONFIG_PATH)
    }

    fn load_from(config_path: Option<&str>, default_path: &str) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            Self::from_file(path)
        } else if Path::new(default_path).exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.builder.validate()
    }
}

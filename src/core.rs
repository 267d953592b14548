//! Core QuerySmith functionality
//!
//! This module contains the main QuerySmith struct, which carries the builder
//! configuration and compiles criteria into queries.

use criteria_engine::{BuildOptions, Criteria, Query, QueryBuilder};

use crate::errors::QuerySmithError;
use config::{AppConfig, BuilderConfig};

/// Entry point that compiles criteria with a fixed builder configuration
#[derive(Debug, Clone, Default)]
pub struct QuerySmith {
    config: BuilderConfig,
}

impl QuerySmith {
    /// Create a new QuerySmith, validating the configuration
    pub fn new(config: BuilderConfig) -> Result<Self, QuerySmithError> {
        config.validate()?;
        crate::debug_log!(
            splitter_prefix = %config.splitter_prefix,
            default_split_on = %config.default_split_on,
            "querysmith configured"
        );
        Ok(Self { config })
    }

    /// Create a QuerySmith from `QUERYSMITH_CONFIG` or `./querysmith.toml`
    pub fn load() -> Result<Self, QuerySmithError> {
        let app_config = AppConfig::load()?;
        Self::new(app_config.builder)
    }

    /// Get builder configuration reference
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Build options handed to every query builder
    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            splitter_prefix: self.config.splitter_prefix.clone(),
            default_split_on: self.config.default_split_on.clone(),
            log_generated_sql: self.config.log_generated_sql,
        }
    }

    /// Compile a criteria instance into SQL, parameters and the split-on hint
    pub fn build<C>(&self, criteria: &C) -> Result<Query, QuerySmithError>
    where
        C: Criteria + 'static,
    {
        crate::trace_log!(criteria = std::any::type_name::<C>(), "building query");
        let query = QueryBuilder::new(criteria)?
            .with_options(self.options())
            .build()?;
        Ok(query)
    }
}

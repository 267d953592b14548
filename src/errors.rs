//! Error types for the QuerySmith crate
//!
//! This module contains all error types that can be returned by QuerySmith operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuerySmithError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Query error: {0}")]
    Query(#[from] criteria_engine::QueryError),
}

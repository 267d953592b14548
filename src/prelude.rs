//! Convenience re-exports for common QuerySmith usage
//!
//! This prelude module re-exports the most commonly used items from the QuerySmith crates,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use querysmith::prelude::*;
//!
//! // Now you have access to the facade, the criteria model and the derive macros
//! ```

// Core QuerySmith components
pub use crate::core::QuerySmith;
pub use crate::errors::QuerySmithError;

// Re-export centralized config
pub use config::{AppConfig, BuilderConfig};

// Re-export commonly used criteria-engine types for convenience
pub use criteria_engine::prelude::*;

// Re-export criteria_engine module for macro-generated code
pub use criteria_engine;

// Re-export criteria derive for criteria declaration
pub use criteria_derive::{criteria, Criteria};

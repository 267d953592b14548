//! # QuerySmith
//!
//! Declarative criteria to SQL compiler: a struct's fields carry filter, join and
//! extra-select directives, and every build yields parameterised SQL, the bound
//! parameters and a split-on hint for multi-table row mapping.
//!
//! ## Quick Start
//!
//! ```rust
//! use querysmith::prelude::*;
//!
//! #[criteria]
//! #[table(name = "Users")]
//! pub struct UserCriteria {
//!     #[base]
//!     pub base: CriteriaBase,
//!
//!     #[filter(compare = Like)]
//!     pub name: Option<String>,
//!
//!     #[join(kind = Left, table = "Roles", field = "UserId", current_field = "Id")]
//!     pub with_roles: bool,
//! }
//!
//! fn main() -> Result<(), QuerySmithError> {
//!     let smith = QuerySmith::new(BuilderConfig::default())?;
//!
//!     let criteria = UserCriteria {
//!         name: Some("ann".to_string()),
//!         with_roles: true,
//!         ..Default::default()
//!     };
//!
//!     let query = smith.build(&criteria)?;
//!     println!("{}", query.sql);
//!     assert_eq!(query.split_on, "SplitOnRolesUserId");
//!
//!     Ok(())
//! }
//! ```

extern crate self as querysmith;

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use crate::core::QuerySmith;
pub use crate::errors::QuerySmithError;

// Re-export centralized config
pub use config::{AppConfig, BuilderConfig};

// Re-export internal crates used by macros and public API
// These MUST be public for the generated macro code to work correctly
pub use criteria_derive;
pub use criteria_engine;

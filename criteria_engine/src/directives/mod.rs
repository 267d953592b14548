//! Per-field directive records.
//!
//! Directives are declared once per criteria type and never mutated.

pub mod filter;
pub mod join;
pub mod select;

pub use filter::{formatters, CompareKind, FilterDirective, ValueFormatter};
pub use join::{AddOnTarget, BridgeTable, JoinDirective, JoinKind, JoinVariant};
pub use select::SelectDirective;

//! Convenience re-exports for common criteria-engine usage

// Criteria model
pub use crate::criteria::{Criteria, CriteriaBase, FieldValue, QueryType, ToFieldValue};

// Directives
pub use crate::directives::{
    formatters, AddOnTarget, BridgeTable, CompareKind, FilterDirective, JoinDirective, JoinKind,
    SelectDirective,
};
pub use crate::registry::DirectiveRegistry;

// Error types
pub use crate::errors::{QueryError, QueryResult};

// Query building
pub use crate::query_builder::{BuildOptions, Query, QueryBuilder, SelectClause, SortOrder};

// Common external dependencies that are frequently used
pub use serde::{Deserialize, Serialize};

//! Criteria Engine - declarative criteria to SQL compiler for QuerySmith
//!
//! This crate holds the criteria model, per-field directives, the directive
//! registry, the clause resolvers and the SQL template engine that assembles
//! the final query.

pub mod criteria;
pub mod directives;
pub mod errors;
pub mod prelude;
pub mod query_builder;
pub mod registry;

pub use criteria::{Criteria, CriteriaBase, FieldValue, QueryType, ToFieldValue};
pub use directives::{
    formatters, AddOnTarget, BridgeTable, CompareKind, FilterDirective, JoinDirective, JoinKind,
    JoinVariant, SelectDirective, ValueFormatter,
};
pub use errors::{QueryError, QueryResult};
pub use query_builder::{
    BuildOptions, Parameters, Query, QueryBuilder, SelectClause, SelectListParser, SortOrder,
    SqlTemplateEngine, TableColumns,
};
pub use registry::{registry_for, DirectiveRegistry, FieldDirectives, TableBinding};

//! Clause resolution and template assembly.

pub mod builder;
pub mod join;
pub mod ordering;
pub mod parameters;
pub mod select_clause;
pub mod select_parser;
pub mod template;
pub mod where_clause;


pub use builder::{split_on_string, BuildOptions, Query, QueryBuilder};
pub use join::{JoinClause, JoinFragmentFactory, ResolvedJoin};
pub use ordering::SortOrder;
pub use parameters::Parameters;
pub use select_parser::{SelectClause, SelectListParser, TableColumns};
pub use template::{ClauseGroup, ResolvedTemplate, SqlTemplateEngine, TemplateId};
pub use where_clause::WhereClause;

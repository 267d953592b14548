//! Extra-select directives.

use crate::errors::QueryResult;
use crate::query_builder::select_parser::{self, TableColumns};

/// Extra columns added by a criteria field.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectDirective {
    /// Pre-parsed columns added when a bool field is true or an `Option` field is set.
    Columns(TableColumns),
    /// Columns read from the string field's own runtime value.
    FromValue,
}

impl SelectDirective {
    /// Parse a select-list once, at registration time.
    pub fn columns(spec: &str) -> QueryResult<Self> {
        Ok(SelectDirective::Columns(select_parser::parse(spec)?))
    }

    pub fn from_value() -> Self {
        SelectDirective::FromValue
    }
}

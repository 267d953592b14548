//! SELECT list resolution.

use crate::criteria::{Criteria, FieldValue};
use crate::directives::SelectDirective;
use crate::errors::{QueryError, QueryResult};
use crate::query_builder::select_parser::{SelectClause, SelectListParser};
use crate::registry::DirectiveRegistry;
use serde_json::Value;

/// Base select clause first, then per-field extras in declaration order.
///
/// Aggregate query types keep the base clause only. Clauses without an
/// owning table are bound to `primary_table`.
pub fn resolve<C: Criteria>(
    criteria: &C,
    registry: &DirectiveRegistry,
    primary_table: &str,
) -> QueryResult<Vec<SelectClause>> {
    let base = criteria.base();
    let mut clauses = Vec::new();

    if let Some(select) = &base.select {
        let mut select = select.clone();
        if select.table.as_deref().is_none_or(|t| t.trim().is_empty()) {
            select.table = Some(primary_table.to_string());
        }
        clauses.push(select);
    }

    if base.query_type.is_aggregate() {
        tracing::trace!(count = clauses.len(), "aggregate query, extra selects suppressed");
        return Ok(clauses);
    }

    let parser = SelectListParser::lenient();
    for (field, directive) in registry.selects() {
        let value = match criteria.field_value(field)? {
            Some(value) => value,
            None => continue,
        };
        match directive {
            SelectDirective::Columns(columns) => match value.gate() {
                Some(true) => clauses.extend(columns.clauses().cloned()),
                Some(false) => {}
                None => return Err(unsupported(field, &value)),
            },
            SelectDirective::FromValue => {
                let text = match &value {
                    FieldValue::Text(text) => Some(text.as_str()),
                    FieldValue::Optional(Some(Value::String(text))) => Some(text.as_str()),
                    FieldValue::Optional(None) | FieldValue::Optional(Some(Value::Null)) => None,
                    _ => return Err(unsupported(field, &value)),
                };
                match text {
                    Some(text) if !text.trim().is_empty() => {
                        clauses.extend(parser.parse(text)?.clauses().cloned());
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::trace!(count = clauses.len(), "resolved select clauses");
    Ok(clauses)
}

fn unsupported(field: &str, value: &FieldValue) -> QueryError {
    QueryError::UnsupportedFieldType {
        field: field.to_string(),
        directive: "select",
        found: value.kind(),
    }
}

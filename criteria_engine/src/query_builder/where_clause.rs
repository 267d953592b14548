//! WHERE clause resolution.

use crate::criteria::Criteria;
use crate::directives::FilterDirective;
use crate::errors::QueryResult;
use crate::registry::DirectiveRegistry;
use serde_json::Value;

const TABLE_NAME_TOKEN: &str = "/**TableName**/";
const FIELD_NAME_TOKEN: &str = "/**FieldName**/";
const COMPARE_OPERATION_TOKEN: &str = "/**CompareOperation**/";
const PARAMETER_TOKEN: &str = "/**Parameter**/";

/// One resolved filter.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub sql: String,
    /// Parameter name including the leading `@`.
    pub parameter: String,
    pub value: Option<Value>,
    /// True for `is null` / `is not null`; nothing is bound.
    pub without_value: bool,
}

/// Resolve every active filter of `criteria`, one clause per directive, in
/// declaration order.
pub fn resolve<C: Criteria>(
    criteria: &C,
    registry: &DirectiveRegistry,
    primary_table: &str,
) -> QueryResult<Vec<WhereClause>> {
    let mut clauses = Vec::new();
    for field in registry.fields() {
        if field.filters.is_empty() {
            continue;
        }
        let value = match criteria.field_value(&field.name)? {
            Some(value) => value,
            None => continue,
        };
        let value = match value.filter_value() {
            Some(value) => value,
            None => continue,
        };
        for directive in &field.filters {
            clauses.push(resolve_one(directive, &field.name, value.clone(), primary_table));
        }
    }
    tracing::trace!(count = clauses.len(), "resolved where clauses");
    Ok(clauses)
}

fn resolve_one(
    directive: &FilterDirective,
    field: &str,
    value: Value,
    primary_table: &str,
) -> WhereClause {
    let table = directive.table.as_deref().unwrap_or(primary_table);
    let column = directive.column.as_deref().unwrap_or(field);
    let parameter = format!("@{}{}", table, field);
    let without_value = directive.compare.is_without_value();

    let sql = match &directive.expression {
        Some(expression) => {
            let substituted = expression
                .replace(TABLE_NAME_TOKEN, table)
                .replace(FIELD_NAME_TOKEN, column)
                .replace(COMPARE_OPERATION_TOKEN, directive.compare.to_sql())
                .replace(PARAMETER_TOKEN, &parameter);
            format!("({})", substituted)
        }
        None => format!(
            "{}.{} {}",
            table,
            column,
            directive.compare.expression(&parameter)
        ),
    };

    let value = if without_value {
        None
    } else {
        Some(match directive.effective_formatter() {
            Some(format) => format(value),
            None => value,
        })
    };

    WhereClause {
        sql,
        parameter,
        value,
        without_value,
    }
}

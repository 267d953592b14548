//! JOIN clause resolution
//!
//! Each join directive is resolved against the criteria instance into a
//! [`JoinClause`]. Clauses are then ordered by their explicit order key and
//! inactive clauses are deduplicated by splitter.

pub mod factory;

pub use factory::{
    factory_for, JoinClause, JoinFragmentFactory, ManyToManyJoinFactory, ResolvedJoin,
    SimpleJoinFactory,
};

use crate::criteria::Criteria;
use crate::errors::{QueryError, QueryResult};
use crate::registry::DirectiveRegistry;
use std::collections::HashSet;

/// Resolve every join directive of `criteria` in emission order.
pub fn resolve<C: Criteria>(
    criteria: &C,
    registry: &DirectiveRegistry,
    primary_table: &str,
    splitter_prefix: &str,
) -> QueryResult<Vec<JoinClause>> {
    let mut clauses = Vec::new();

    for field in registry.fields() {
        if field.joins.is_empty() {
            continue;
        }
        let value = criteria.field_value(&field.name)?.ok_or_else(|| {
            QueryError::Configuration(format!("join field '{}' has no runtime value", field.name))
        })?;
        let active = value.gate().ok_or_else(|| QueryError::UnsupportedFieldType {
            field: field.name.clone(),
            directive: "join",
            found: value.kind(),
        })?;

        for directive in &field.joins {
            let factory = factory_for(directive);
            let join = ResolvedJoin::new(directive, primary_table, &field.name, splitter_prefix);
            let clause = if active {
                let suppress = match directive.including.as_deref() {
                    Some(including) => is_active(criteria, including)?,
                    None => false,
                };
                factory.create_active(&join.suppress_columns(suppress))?
            } else {
                factory.create_inactive(&join)?
            };
            clauses.push(clause);
        }
    }

    // Stable: unkeyed joins keep declaration order after every keyed one.
    clauses.sort_by_key(|clause| (clause.order.is_none(), clause.order));
    let clauses = dedup_inactive(clauses);

    tracing::trace!(count = clauses.len(), "resolved join clauses");
    Ok(clauses)
}

fn is_active<C: Criteria>(criteria: &C, field: &str) -> QueryResult<bool> {
    let value = criteria.field_value(field)?.ok_or_else(|| {
        QueryError::Configuration(format!("including references unknown field '{}'", field))
    })?;
    Ok(match value.gate() {
        Some(active) => active,
        None => value.filter_value().is_some(),
    })
}

/// Drop inactive clauses whose splitter is already emitted by an active
/// clause or an earlier inactive one.
fn dedup_inactive(clauses: Vec<JoinClause>) -> Vec<JoinClause> {
    let active: HashSet<String> = clauses
        .iter()
        .filter(|c| c.has_join)
        .map(|c| c.splitter.clone())
        .collect();
    let mut seen = HashSet::new();

    clauses
        .into_iter()
        .filter(|clause| {
            if clause.has_join {
                return true;
            }
            !active.contains(&clause.splitter) && seen.insert(clause.splitter.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::JoinKind;

    fn clause(splitter: &str, has_join: bool, order: Option<i32>) -> JoinClause {
        JoinClause {
            splitter: splitter.to_string(),
            joins: Vec::new(),
            selects: Vec::new(),
            kind: JoinKind::Left,
            has_join,
            order,
        }
    }

    #[test]
    fn test_dedup_inactive() {
        let clauses = vec![
            clause("SplitOnRolesId", false, None),
            clause("SplitOnRolesId", false, None),
            clause("SplitOnTagsId", true, None),
            clause("SplitOnTagsId", false, None),
            clause("", false, None),
            clause("", false, None),
        ];
        let kept: Vec<_> = dedup_inactive(clauses)
            .into_iter()
            .map(|c| (c.splitter, c.has_join))
            .collect();
        assert_eq!(
            kept,
            vec![
                ("SplitOnRolesId".to_string(), false),
                ("SplitOnTagsId".to_string(), true),
                (String::new(), false),
            ]
        );
    }

    #[test]
    fn test_active_clauses_are_never_deduplicated() {
        let clauses = vec![
            clause("SplitOnRolesId", true, None),
            clause("SplitOnRolesId", true, None),
        ];
        assert_eq!(dedup_inactive(clauses).len(), 2);
    }
}

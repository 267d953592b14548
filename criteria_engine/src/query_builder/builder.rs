//! Query builder
//!
//! Compiles one criteria instance into a [`Query`]. Every build uses a fresh
//! template engine; only the per-type directive registry is shared.

use crate::criteria::{Criteria, CriteriaBase, QueryType};
use crate::errors::{QueryError, QueryResult};
use crate::query_builder::join;
use crate::query_builder::parameters::Parameters;
use crate::query_builder::select_clause;
use crate::query_builder::template::{SqlTemplateEngine, TemplateId};
use crate::query_builder::where_clause;
use crate::registry::{registry_for, DirectiveRegistry};
use serde::Serialize;
use std::sync::Arc;

pub const DEFAULT_SPLITTER_PREFIX: &str = "SplitOn";
pub const DEFAULT_SPLIT_ON: &str = "Id";

/// Final SQL text, its parameters and the row-splitting hint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub sql: String,
    pub parameters: Parameters,
    pub split_on: String,
}

/// Build-time settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    /// Prefix of every join splitter token.
    pub splitter_prefix: String,
    /// Split-on value used when every splitter equals it.
    pub default_split_on: String,
    pub log_generated_sql: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            splitter_prefix: DEFAULT_SPLITTER_PREFIX.to_string(),
            default_split_on: DEFAULT_SPLIT_ON.to_string(),
            log_generated_sql: false,
        }
    }
}

/// Templates registered against one engine.
#[derive(Debug, Clone, Copy)]
struct Templates {
    simple: TemplateId,
    paginate: TemplateId,
    count: TemplateId,
    exists: TemplateId,
    sum: TemplateId,
}

impl Templates {
    fn register(engine: &mut SqlTemplateEngine, table: &str, base: &CriteriaBase) -> Self {
        const JOINS: &str = "/**innerjoin**/ /**leftjoin**/ /**rightjoin**/";

        let simple_sql = format!(
            "Select /**select**/ from {} {} /**where**/ /**groupby**/ /**orderby**/",
            table, JOINS
        );
        let paginate_sql = format!("{} OFFSET @Skip ROWS FETCH NEXT @Take ROWS ONLY", simple_sql);
        let pagination = Parameters::new()
            .with("Skip", base.skip)
            .with("Take", base.take);

        Self {
            simple: engine.create_template(simple_sql, Parameters::new()),
            paginate: engine.create_template(paginate_sql, pagination),
            count: engine.create_template(
                format!("Select count(1) from {} {} /**where**/", table, JOINS),
                Parameters::new(),
            ),
            exists: engine.create_template(
                format!("Select 1 from {} {} /**where**/", table, JOINS),
                Parameters::new(),
            ),
            sum: engine.create_template(
                format!("Select /**select**/ from {} {} /**where**/ /**groupby**/", table, JOINS),
                Parameters::new(),
            ),
        }
    }

    fn for_query_type(&self, query_type: QueryType) -> TemplateId {
        match query_type {
            QueryType::Simple => self.simple,
            QueryType::Paginate => self.paginate,
            QueryType::OnlyCount => self.count,
            QueryType::Exists => self.exists,
            QueryType::Sum => self.sum,
        }
    }
}

/// Compiles a criteria instance into SQL.
#[derive(Debug)]
pub struct QueryBuilder<'a, C: Criteria> {
    criteria: &'a C,
    registry: Arc<DirectiveRegistry>,
    options: BuildOptions,
}

impl<'a, C: Criteria + 'static> QueryBuilder<'a, C> {
    /// Builder over the shared registry of `C`.
    pub fn new(criteria: &'a C) -> QueryResult<Self> {
        Ok(Self::with_registry(criteria, registry_for::<C>()?))
    }
}

impl<'a, C: Criteria> QueryBuilder<'a, C> {
    /// Builder over an explicit registry.
    pub fn with_registry(criteria: &'a C, registry: Arc<DirectiveRegistry>) -> Self {
        Self {
            criteria,
            registry,
            options: BuildOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn criteria(&self) -> &C {
        self.criteria
    }

    pub fn build(&self) -> QueryResult<Query> {
        let table = self.registry.table()?;
        let base = self.criteria.base();
        let mut engine = SqlTemplateEngine::new();
        let templates = Templates::register(&mut engine, table, base);

        self.add_selects(&mut engine, table)?;
        let split_on = self.add_joins(&mut engine, table)?;
        self.add_filters(&mut engine, table)?;
        for column in &base.group_by {
            engine.group_by(column.as_str());
        }
        for (key, order) in &base.order {
            engine.order_by(format!("{} {}", key, order.to_sql()));
        }
        tracing::trace!(
            group_by = base.group_by.len(),
            order_by = base.order.len(),
            "added grouping and ordering"
        );

        let template = templates.for_query_type(base.query_type);
        tracing::debug!(table, query_type = ?base.query_type, "selected sql template");
        let resolved = engine.resolve(template)?.clone();

        let query = Query {
            sql: resolved.sql,
            parameters: resolved.parameters,
            split_on: split_on_string(&split_on, &self.options.default_split_on),
        };
        if self.options.log_generated_sql {
            tracing::debug!(sql = %query.sql, split_on = %query.split_on, "generated sql");
        }
        Ok(query)
    }

    fn add_selects(&self, engine: &mut SqlTemplateEngine, table: &str) -> QueryResult<()> {
        for clause in select_clause::resolve(self.criteria, &self.registry, table)? {
            engine.select(clause.to_sql(table));
        }
        Ok(())
    }

    /// Adds join fragments and returns the splitters in emission order.
    fn add_joins(&self, engine: &mut SqlTemplateEngine, table: &str) -> QueryResult<Vec<String>> {
        let clauses = join::resolve(
            self.criteria,
            &self.registry,
            table,
            &self.options.splitter_prefix,
        )?;

        // Aggregate selects carry the base clause only: no sentinels, no joined columns.
        let aggregate = self.criteria.base().query_type.is_aggregate();
        let mut split_on = Vec::with_capacity(clauses.len());
        for clause in clauses {
            if !aggregate && !clause.splitter.is_empty() {
                engine.select(format!("0 as {}", clause.splitter));
            }
            if clause.has_join {
                let group = clause.kind.clause_group();
                for sql in clause.joins {
                    engine.add_to_group(group, sql, None);
                }
                if !aggregate {
                    for select in clause.selects {
                        engine.select(select);
                    }
                }
            }
            if !aggregate {
                split_on.push(clause.splitter);
            }
        }
        Ok(split_on)
    }

    /// Adds filter fragments. A parameter bound twice must carry the same value.
    fn add_filters(&self, engine: &mut SqlTemplateEngine, table: &str) -> QueryResult<()> {
        let mut bound = Parameters::new();
        for clause in where_clause::resolve(self.criteria, &self.registry, table)? {
            let parameters = match clause.value {
                Some(value) if !clause.without_value => {
                    if let Some(existing) = bound.get(&clause.parameter).filter(|v| **v != value) {
                        return Err(QueryError::InvalidArgument(format!(
                            "parameter {} is bound to both {} and {}",
                            clause.parameter, existing, value
                        )));
                    }
                    bound.add(&clause.parameter, value.clone());
                    Some(Parameters::new().with(&clause.parameter, value))
                }
                _ => None,
            };
            engine.and_where(clause.sql, parameters);
        }
        Ok(())
    }
}

/// Collapse to `default` when every splitter equals it, otherwise join with `,`.
pub fn split_on_string(splitters: &[String], default: &str) -> String {
    if splitters.iter().all(|s| s == default) {
        default.to_string()
    } else {
        splitters.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_split_on_collapses_to_default() {
        assert_eq!(split_on_string(&[], "Id"), "Id");
        assert_eq!(split_on_string(&strings(&["Id", "Id"]), "Id"), "Id");
    }

    #[test]
    fn test_split_on_joins_mixed_splitters() {
        assert_eq!(
            split_on_string(&strings(&["Id", "SplitOnRolesId"]), "Id"),
            "Id,SplitOnRolesId"
        );
        assert_eq!(
            split_on_string(&strings(&["SplitOnRolesId", "", "SplitOnTagsId"]), "Id"),
            "SplitOnRolesId,,SplitOnTagsId"
        );
    }
}

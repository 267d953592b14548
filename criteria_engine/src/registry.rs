//! Per-criteria-type directive registry.
//!
//! Each criteria type declares its table binding and per-field directives
//! once. [`registry_for`] builds that declaration on first use and publishes
//! it as an immutable `Arc` shared by every later build.

use crate::criteria::Criteria;
use crate::directives::{FilterDirective, JoinDirective, SelectDirective};
use crate::errors::{QueryError, QueryResult};
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// Primary table of a criteria type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBinding {
    pub name: String,
}

impl TableBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Directives declared on one field.
#[derive(Debug, Clone)]
pub struct FieldDirectives {
    pub name: String,
    pub filters: Vec<FilterDirective>,
    pub joins: Vec<JoinDirective>,
    pub select: Option<SelectDirective>,
}

impl FieldDirectives {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            filters: Vec::new(),
            joins: Vec::new(),
            select: None,
        }
    }
}

/// Table binding plus field directives in declaration order.
#[derive(Debug, Clone, Default)]
pub struct DirectiveRegistry {
    table: Option<TableBinding>,
    fields: Vec<FieldDirectives>,
}

impl DirectiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(TableBinding::new(name));
        self
    }

    pub fn filter(mut self, field: &str, directive: FilterDirective) -> Self {
        self.field_mut(field).filters.push(directive);
        self
    }

    pub fn join(mut self, field: &str, directive: JoinDirective) -> Self {
        self.field_mut(field).joins.push(directive);
        self
    }

    /// A field carries at most one select directive; a later one replaces it.
    pub fn select(mut self, field: &str, directive: SelectDirective) -> Self {
        self.field_mut(field).select = Some(directive);
        self
    }

    fn field_mut(&mut self, field: &str) -> &mut FieldDirectives {
        let position = match self.fields.iter().position(|f| f.name == field) {
            Some(position) => position,
            None => {
                self.fields.push(FieldDirectives::new(field));
                self.fields.len() - 1
            }
        };
        &mut self.fields[position]
    }

    pub fn table_binding(&self) -> Option<&TableBinding> {
        self.table.as_ref()
    }

    /// Primary table name, or a configuration error when none is bound.
    pub fn table(&self) -> QueryResult<&str> {
        self.table
            .as_ref()
            .map(|t| t.name.as_str())
            .ok_or_else(|| QueryError::Configuration("criteria has no table binding".to_string()))
    }

    pub fn fields(&self) -> &[FieldDirectives] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDirectives> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// `(field, directive)` pairs in declaration order.
    pub fn filters(&self) -> impl Iterator<Item = (&str, &FilterDirective)> {
        self.fields
            .iter()
            .flat_map(|f| f.filters.iter().map(move |d| (f.name.as_str(), d)))
    }

    pub fn joins(&self) -> impl Iterator<Item = (&str, &JoinDirective)> {
        self.fields
            .iter()
            .flat_map(|f| f.joins.iter().map(move |d| (f.name.as_str(), d)))
    }

    pub fn selects(&self) -> impl Iterator<Item = (&str, &SelectDirective)> {
        self.fields
            .iter()
            .filter_map(|f| f.select.as_ref().map(|d| (f.name.as_str(), d)))
    }
}

type RegistryMap = HashMap<TypeId, Arc<DirectiveRegistry>>;

static REGISTRIES: OnceLock<RwLock<RegistryMap>> = OnceLock::new();

/// Shared registry of criteria type `C`, built on first use.
///
/// Concurrent first uses may each build the registry; the first one
/// published wins and every caller receives that instance.
pub fn registry_for<C: Criteria + 'static>() -> QueryResult<Arc<DirectiveRegistry>> {
    let registries = REGISTRIES.get_or_init(|| RwLock::new(HashMap::new()));
    let key = TypeId::of::<C>();

    {
        let map = registries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(registry) = map.get(&key) {
            return Ok(Arc::clone(registry));
        }
    }

    let registry = C::directives()?;
    if registry.table_binding().is_none() {
        return Err(QueryError::Configuration(format!(
            "no table bound to criteria {}",
            type_name::<C>()
        )));
    }
    tracing::debug!(
        criteria = type_name::<C>(),
        fields = registry.fields().len(),
        "registered criteria directives"
    );

    let mut map = registries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    Ok(Arc::clone(map.entry(key).or_insert_with(|| Arc::new(registry))))
}

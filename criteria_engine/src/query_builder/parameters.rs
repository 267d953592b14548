//! Ordered parameter sink shared by every clause of a query.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Ordered name -> value parameter set.
///
/// Names are stored without their leading `@`, `:` or `?` marker, so
/// `@UsersId` and `UsersId` address the same entry. Adding a name that already
/// exists replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Parameters {
    entries: IndexMap<String, Value>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, value: impl Into<Value>) {
        self.entries.insert(clean_name(name).to_string(), value.into());
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.add(name, value);
        self
    }

    /// Merge another set into this one, preserving the other set's order.
    pub fn extend_from(&mut self, other: &Parameters) {
        for (name, value) in &other.entries {
            self.add(name, value.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(clean_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(clean_name(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Parameters {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

fn clean_name(name: &str) -> &str {
    match name.chars().next() {
        Some('@' | ':' | '?') => &name[1..],
        _ => name,
    }
}

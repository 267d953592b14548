//! Criteria model
//!
//! A criteria type is a plain struct that embeds a [`CriteriaBase`] and
//! exposes its directive-carrying fields by name. Implementations are
//! normally generated by `#[derive(Criteria)]`.

use crate::registry::DirectiveRegistry;
use crate::errors::{QueryError, QueryResult};
use crate::query_builder::ordering::SortOrder;
use crate::query_builder::select_parser::SelectClause;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Which template a build resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueryType {
    #[default]
    Simple,
    Paginate,
    OnlyCount,
    Exists,
    Sum,
}

impl QueryType {
    /// Aggregate queries select the base clause only.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, QueryType::Sum)
    }
}

impl FromStr for QueryType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(QueryType::Simple),
            "paginate" => Ok(QueryType::Paginate),
            "onlycount" | "count" => Ok(QueryType::OnlyCount),
            "exists" => Ok(QueryType::Exists),
            "sum" => Ok(QueryType::Sum),
            _ => Err(QueryError::invalid_enum("query type", s)),
        }
    }
}

/// Fields shared by every criteria type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriteriaBase {
    pub take: i64,
    pub skip: i64,
    pub query_type: QueryType,
    /// Sort keys in the order they are emitted.
    pub order: Vec<(String, SortOrder)>,
    /// Base select clause; `None` selects nothing besides per-field extras.
    pub select: Option<SelectClause>,
    pub group_by: Vec<String>,
}

impl Default for CriteriaBase {
    fn default() -> Self {
        Self {
            take: 0,
            skip: 0,
            query_type: QueryType::Simple,
            order: Vec::new(),
            select: Some(SelectClause::all()),
            group_by: Vec::new(),
        }
    }
}

impl CriteriaBase {
    pub fn new(query_type: QueryType) -> Self {
        Self {
            query_type,
            ..Self::default()
        }
    }

    /// Paginated base with `skip`/`take` bound to the OFFSET/FETCH template.
    pub fn paginate(skip: i64, take: i64) -> Self {
        Self {
            take,
            skip,
            query_type: QueryType::Paginate,
            ..Self::default()
        }
    }

    pub fn order_by(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        let key = key.into();
        match self.order.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = order,
            None => self.order.push((key, order)),
        }
        self
    }

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by.push(column.into());
        self
    }

    pub fn select(mut self, clause: SelectClause) -> Self {
        self.select = Some(clause);
        self
    }

    pub fn has_order(&self) -> bool {
        !self.order.is_empty()
    }

    pub fn has_grouping(&self) -> bool {
        !self.group_by.is_empty()
    }
}

/// Runtime value of a directive-carrying field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain `bool`; used as a presence gate.
    Flag(bool),
    /// Any `Option<T>`.
    Optional(Option<Value>),
    /// Plain `String`.
    Text(String),
    /// Anything else: numbers, lists, raw JSON.
    Scalar(Value),
}

impl FieldValue {
    /// Short name of the shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Flag(_) => "bool",
            FieldValue::Optional(_) => "option",
            FieldValue::Text(_) => "string",
            FieldValue::Scalar(_) => "scalar",
        }
    }

    /// True for `Flag(true)` and a present `Optional`.
    ///
    /// Text and scalar values are not gates and report `None`.
    pub fn gate(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(flag) => Some(*flag),
            FieldValue::Optional(value) => Some(matches!(value, Some(v) if !v.is_null())),
            FieldValue::Text(_) | FieldValue::Scalar(_) => None,
        }
    }

    /// Value bound by a filter, or `None` when the filter is skipped.
    pub fn filter_value(&self) -> Option<Value> {
        match self {
            FieldValue::Flag(false) => None,
            FieldValue::Flag(true) => Some(Value::Bool(true)),
            FieldValue::Optional(None) | FieldValue::Optional(Some(Value::Null)) => None,
            FieldValue::Optional(Some(value)) => Some(value.clone()),
            FieldValue::Text(text) => Some(Value::String(text.clone())),
            FieldValue::Scalar(value) => Some(value.clone()),
        }
    }
}

/// Conversion of a criteria field into a [`FieldValue`].
pub trait ToFieldValue {
    fn to_field_value(&self) -> QueryResult<FieldValue>;
}

impl ToFieldValue for bool {
    fn to_field_value(&self) -> QueryResult<FieldValue> {
        Ok(FieldValue::Flag(*self))
    }
}

impl ToFieldValue for String {
    fn to_field_value(&self) -> QueryResult<FieldValue> {
        Ok(FieldValue::Text(self.clone()))
    }
}

impl ToFieldValue for Value {
    fn to_field_value(&self) -> QueryResult<FieldValue> {
        Ok(FieldValue::Scalar(self.clone()))
    }
}

impl<T: Serialize> ToFieldValue for Option<T> {
    fn to_field_value(&self) -> QueryResult<FieldValue> {
        let value = match self {
            Some(inner) => Some(serde_json::to_value(inner)?),
            None => None,
        };
        Ok(FieldValue::Optional(value))
    }
}

impl<T: Serialize> ToFieldValue for Vec<T> {
    fn to_field_value(&self) -> QueryResult<FieldValue> {
        Ok(FieldValue::Scalar(serde_json::to_value(self)?))
    }
}

macro_rules! scalar_field_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToFieldValue for $ty {
                fn to_field_value(&self) -> QueryResult<FieldValue> {
                    Ok(FieldValue::Scalar(serde_json::to_value(self)?))
                }
            }
        )*
    };
}

scalar_field_value!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, usize, isize, char);

/// A query-parameter object.
pub trait Criteria {
    /// Shared pagination, ordering and selection settings.
    fn base(&self) -> &CriteriaBase;

    /// Directives of this criteria type. Built once per type and cached by
    /// [`crate::registry_for`].
    fn directives() -> QueryResult<DirectiveRegistry>
    where
        Self: Sized;

    /// Runtime value of a field that carries directives or is referenced by
    /// an `including` setting. Unknown names yield `Ok(None)`.
    fn field_value(&self, field: &str) -> QueryResult<Option<FieldValue>>;
}

//! Join directives
//!
//! A join directive is declared on a bool or `Option` criteria field and
//! pulls another table into the query when that field is active.

use crate::errors::{QueryError, QueryResult};
use crate::query_builder::select_parser::{self, TableColumns};
use crate::query_builder::template::ClauseGroup;
use std::str::FromStr;

/// Represents the type of SQL JOIN operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    /// INNER JOIN - returns records that have matching values in both tables
    Inner,
    /// LEFT JOIN - returns all records from the left table and matched records from the right table
    Left,
    /// RIGHT JOIN - returns all records from the right table and matched records from the left table
    Right,
}

impl JoinKind {
    /// Convert JoinKind to SQL string
    pub fn to_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }

    /// Template group that receives this kind's join fragments
    pub fn clause_group(&self) -> ClauseGroup {
        match self {
            JoinKind::Inner => ClauseGroup::InnerJoin,
            JoinKind::Left => ClauseGroup::LeftJoin,
            JoinKind::Right => ClauseGroup::RightJoin,
        }
    }
}

impl FromStr for JoinKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinKind::Inner),
            "left" => Ok(JoinKind::Left),
            "right" => Ok(JoinKind::Right),
            _ => Err(QueryError::invalid_enum("join kind", s)),
        }
    }
}

/// Which side of a many-to-many join receives the extra ON fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddOnTarget {
    /// The bridge (communication) table join
    Bridge,
    #[default]
    Joined,
}

/// Bridge table of a many-to-many join
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeTable {
    pub table: String,
    /// Bridge column referencing the current table
    pub current_field: String,
    /// Bridge column referencing the joined table
    pub joined_field: String,
    pub add_on_target: AddOnTarget,
}

impl BridgeTable {
    pub fn new(
        table: impl Into<String>,
        current_field: impl Into<String>,
        joined_field: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            current_field: current_field.into(),
            joined_field: joined_field.into(),
            add_on_target: AddOnTarget::default(),
        }
    }

    pub fn add_on_target(mut self, target: AddOnTarget) -> Self {
        self.add_on_target = target;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinVariant {
    Simple,
    ManyToMany(BridgeTable),
}

impl JoinVariant {
    pub fn name(&self) -> &'static str {
        match self {
            JoinVariant::Simple => "simple",
            JoinVariant::ManyToMany(_) => "many-to-many",
        }
    }
}

/// Join declared on a criteria field.
///
/// Directives are shared, immutable configuration. The current table and
/// field fall back to the criteria's primary table and the declaring field at
/// resolution time without being written back here.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinDirective {
    pub kind: JoinKind,
    pub joined_table: String,
    pub joined_field: String,
    pub current_table: Option<String>,
    pub current_field: Option<String>,
    pub columns: Option<TableColumns>,
    pub add_on: Option<String>,
    pub no_split: bool,
    pub including: Option<String>,
    pub order: Option<i32>,
    pub variant: JoinVariant,
}

impl JoinDirective {
    pub fn simple(
        kind: JoinKind,
        joined_table: impl Into<String>,
        joined_field: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            joined_table: joined_table.into(),
            joined_field: joined_field.into(),
            current_table: None,
            current_field: None,
            columns: None,
            add_on: None,
            no_split: false,
            including: None,
            order: None,
            variant: JoinVariant::Simple,
        }
    }

    pub fn many_to_many(
        kind: JoinKind,
        joined_table: impl Into<String>,
        joined_field: impl Into<String>,
        bridge: BridgeTable,
    ) -> Self {
        Self {
            variant: JoinVariant::ManyToMany(bridge),
            ..Self::simple(kind, joined_table, joined_field)
        }
    }

    pub fn current_table(mut self, table: impl Into<String>) -> Self {
        self.current_table = Some(table.into());
        self
    }

    pub fn current_field(mut self, field: impl Into<String>) -> Self {
        self.current_field = Some(field.into());
        self
    }

    /// Columns to select instead of `joined.*`, in select-list syntax.
    pub fn select_columns(mut self, spec: &str) -> QueryResult<Self> {
        self.columns = Some(select_parser::parse(spec)?);
        Ok(self)
    }

    pub fn add_on(mut self, clause: impl Into<String>) -> Self {
        self.add_on = Some(clause.into());
        self
    }

    pub fn no_split(mut self) -> Self {
        self.no_split = true;
        self
    }

    /// Suppress this join's columns whenever `field` is active.
    pub fn including(mut self, field: impl Into<String>) -> Self {
        self.including = Some(field.into());
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Sentinel column name marking where this join's columns start.
    /// Empty when the directive is marked `no_split`.
    pub fn splitter(&self, prefix: &str) -> String {
        if self.no_split {
            String::new()
        } else {
            format!("{}{}{}", prefix, self.joined_table, self.joined_field)
        }
    }
}

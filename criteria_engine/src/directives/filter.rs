//! Filter directives and comparison kinds.

use crate::errors::QueryError;
use serde_json::Value;
use std::str::FromStr;

/// Comparison applied by a filter directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareKind {
    Eq,        // =
    NotEq,     // <>
    Gt,        // >
    Lt,        // <
    GtEq,      // >=
    LtEq,      // <=
    Like,      // Like
    In,        // in
    NotIn,     // not in
    IsNull,    // is null
    IsNotNull, // is not null
}

impl CompareKind {
    pub const ALL: [CompareKind; 11] = [
        CompareKind::Eq,
        CompareKind::NotEq,
        CompareKind::Gt,
        CompareKind::Lt,
        CompareKind::GtEq,
        CompareKind::LtEq,
        CompareKind::Like,
        CompareKind::In,
        CompareKind::NotIn,
        CompareKind::IsNull,
        CompareKind::IsNotNull,
    ];

    /// Operator text inserted into the WHERE fragment
    pub fn to_sql(&self) -> &'static str {
        match self {
            CompareKind::Eq => "=",
            CompareKind::NotEq => "<>",
            CompareKind::Gt => ">",
            CompareKind::Lt => "<",
            CompareKind::GtEq => ">=",
            CompareKind::LtEq => "<=",
            CompareKind::Like => "Like",
            CompareKind::In => "in",
            CompareKind::NotIn => "not in",
            CompareKind::IsNull => "is null",
            CompareKind::IsNotNull => "is not null",
        }
    }

    /// `is null` / `is not null` never bind a parameter.
    pub fn is_without_value(&self) -> bool {
        matches!(self, CompareKind::IsNull | CompareKind::IsNotNull)
    }

    /// Operator followed by the parameter placeholder when the comparison takes one.
    pub fn expression(&self, parameter: &str) -> String {
        if self.is_without_value() {
            self.to_sql().to_string()
        } else {
            format!("{} {}", self.to_sql(), parameter)
        }
    }

    /// Formatter applied to the bound value when the directive carries none.
    pub fn default_formatter(&self) -> Option<ValueFormatter> {
        match self {
            CompareKind::Like => Some(formatters::like_contains),
            _ => None,
        }
    }
}

impl FromStr for CompareKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim() {
            "Eq" | "=" => CompareKind::Eq,
            "NotEq" | "<>" | "!=" => CompareKind::NotEq,
            "Gt" | ">" => CompareKind::Gt,
            "Lt" | "<" => CompareKind::Lt,
            "GtEq" | ">=" => CompareKind::GtEq,
            "LtEq" | "<=" => CompareKind::LtEq,
            "Like" => CompareKind::Like,
            "In" => CompareKind::In,
            "NotIn" => CompareKind::NotIn,
            "IsNull" => CompareKind::IsNull,
            "IsNotNull" => CompareKind::IsNotNull,
            _ => return Err(QueryError::invalid_enum("comparison kind", s)),
        };
        Ok(kind)
    }
}

/// Transform applied to a filter value before it is bound.
pub type ValueFormatter = fn(Value) -> Value;

/// Built-in value formatters.
pub mod formatters {
    use serde_json::Value;

    fn text(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// `%value%`, the default for `Like`
    pub fn like_contains(value: Value) -> Value {
        Value::String(format!("%{}%", text(&value)))
    }

    pub fn like_starts_with(value: Value) -> Value {
        Value::String(format!("{}%", text(&value)))
    }

    pub fn like_ends_with(value: Value) -> Value {
        Value::String(format!("%{}", text(&value)))
    }

    pub fn identity(value: Value) -> Value {
        value
    }
}

/// Filter declared on a criteria field.
///
/// Column and table default to the field name and the criteria's primary
/// table. When `expression` is set, its `/**TableName**/`, `/**FieldName**/`,
/// `/**CompareOperation**/` and `/**Parameter**/` tokens are substituted and
/// the result is parenthesised.
#[derive(Debug, Clone)]
pub struct FilterDirective {
    pub compare: CompareKind,
    pub column: Option<String>,
    pub table: Option<String>,
    pub expression: Option<String>,
    pub formatter: Option<ValueFormatter>,
}

impl FilterDirective {
    pub fn new(compare: CompareKind) -> Self {
        Self {
            compare,
            column: None,
            table: None,
            expression: None,
            formatter: None,
        }
    }

    pub fn eq() -> Self {
        Self::new(CompareKind::Eq)
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub fn formatter(mut self, formatter: ValueFormatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Explicit formatter, falling back to the comparison's default.
    pub fn effective_formatter(&self) -> Option<ValueFormatter> {
        self.formatter.or_else(|| self.compare.default_formatter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_text() {
        let expected = [
            (CompareKind::Eq, "="),
            (CompareKind::NotEq, "<>"),
            (CompareKind::Gt, ">"),
            (CompareKind::Lt, "<"),
            (CompareKind::GtEq, ">="),
            (CompareKind::LtEq, "<="),
            (CompareKind::Like, "Like"),
            (CompareKind::In, "in"),
            (CompareKind::NotIn, "not in"),
            (CompareKind::IsNull, "is null"),
            (CompareKind::IsNotNull, "is not null"),
        ];
        for (kind, text) in expected {
            assert_eq!(kind.to_sql(), text);
        }
    }

    #[test]
    fn test_without_value() {
        for kind in CompareKind::ALL {
            let expected = matches!(kind, CompareKind::IsNull | CompareKind::IsNotNull);
            assert_eq!(kind.is_without_value(), expected, "{kind:?}");
        }
    }

    #[test]
    fn test_expression() {
        assert_eq!(CompareKind::Eq.expression("@Name"), "= @Name");
        assert_eq!(CompareKind::In.expression("@Name"), "in @Name");
        assert_eq!(CompareKind::Like.expression("@Name"), "Like @Name");
        assert_eq!(CompareKind::IsNull.expression("@Name"), "is null");
        assert_eq!(CompareKind::IsNotNull.expression(""), "is not null");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("GtEq".parse::<CompareKind>().unwrap(), CompareKind::GtEq);
        assert_eq!("<>".parse::<CompareKind>().unwrap(), CompareKind::NotEq);
        assert!(matches!(
            "Between".parse::<CompareKind>(),
            Err(QueryError::InvalidEnumValue { kind: "comparison kind", .. })
        ));
    }

    #[test]
    fn test_formatters() {
        assert_eq!(formatters::like_contains(json!("123")), json!("%123%"));
        assert_eq!(formatters::like_contains(json!(5)), json!("%5%"));
        assert_eq!(formatters::like_starts_with(json!("ab")), json!("ab%"));
        assert_eq!(formatters::like_ends_with(json!("ab")), json!("%ab"));
        assert_eq!(formatters::identity(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn test_effective_formatter() {
        let like = FilterDirective::new(CompareKind::Like);
        let formatter = like.effective_formatter().unwrap();
        assert_eq!(formatter(json!("x")), json!("%x%"));

        let custom = FilterDirective::new(CompareKind::Like).formatter(formatters::like_starts_with);
        let formatter = custom.effective_formatter().unwrap();
        assert_eq!(formatter(json!("x")), json!("x%"));

        assert!(FilterDirective::eq().effective_formatter().is_none());
    }
}

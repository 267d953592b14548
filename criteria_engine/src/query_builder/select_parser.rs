//! Parser for the compact select-list grammar.
//!
//! ```text
//! entry (";" entry)*
//! entry      := table ":" columnlist
//! columnlist := segment ("," segment)*
//! ```
//!
//! A segment wrapped in `{{` and `}}` is a raw expression and is taken
//! verbatim, including any `,` or `;` it contains.

use crate::errors::{QueryError, QueryResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const EXPRESSION_OPEN: &[u8] = b"{{";
const EXPRESSION_CLOSE: &[u8] = b"}}";
const FORMAT_HINT: &str =
    "expected \"TableName:field1,field2;TableName2:{{expression}},field3\"";

/// A single selected column or raw expression.
///
/// Equality is structural: two clauses are equal when text, table and the
/// expression flag all match. Duplicate detection relies on this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectClause {
    pub select: String,
    pub table: Option<String>,
    pub is_expression: bool,
}

impl SelectClause {
    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            select: column.into(),
            table: Some(table.into()),
            is_expression: false,
        }
    }

    pub fn expression(table: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            select: expression.into(),
            table: Some(table.into()),
            is_expression: true,
        }
    }

    /// `*` of the owning table, the default base select of every criteria.
    pub fn all() -> Self {
        Self {
            select: "*".to_string(),
            table: None,
            is_expression: false,
        }
    }

    /// Render the clause, qualifying plain columns with `default_table` when
    /// the clause has no table of its own.
    pub fn to_sql(&self, default_table: &str) -> String {
        if self.is_expression {
            return self.select.clone();
        }
        let table = self.table.as_deref().unwrap_or(default_table);
        format!("{}.{}", table, self.select)
    }
}

impl Default for SelectClause {
    fn default() -> Self {
        Self::all()
    }
}

/// Insertion-ordered mapping of table name to its selected clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableColumns {
    tables: IndexMap<String, Vec<SelectClause>>,
}

impl TableColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn get(&self, table: &str) -> Option<&[SelectClause]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SelectClause])> {
        self.tables
            .iter()
            .map(|(name, clauses)| (name.as_str(), clauses.as_slice()))
    }

    /// All clauses, table by table, in insertion order.
    pub fn clauses(&self) -> impl Iterator<Item = &SelectClause> {
        self.tables.values().flatten()
    }

    /// SQL select fragments: expressions verbatim, columns as `table.column`.
    pub fn to_sql_fragments(&self) -> Vec<String> {
        self.tables
            .iter()
            .flat_map(|(table, clauses)| clauses.iter().map(move |c| c.to_sql(table)))
            .collect()
    }

    fn push(&mut self, table: &str, clause: SelectClause, strict: bool) -> QueryResult<()> {
        let clauses = self.tables.entry(table.to_string()).or_default();
        if strict && clauses.contains(&clause) {
            return Err(QueryError::DuplicateName {
                table: table.to_string(),
                column: clause.select,
            });
        }
        clauses.push(clause);
        Ok(())
    }
}

/// Select-list parser. Strict parsers reject a column repeated for a table.
#[derive(Debug, Clone, Copy)]
pub struct SelectListParser {
    strict: bool,
}

impl Default for SelectListParser {
    fn default() -> Self {
        Self::strict()
    }
}

impl SelectListParser {
    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn lenient() -> Self {
        Self { strict: false }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn parse(&self, text: &str) -> QueryResult<TableColumns> {
        let mut result = TableColumns::new();

        for entry in split_entries(text)? {
            if entry.trim().is_empty() {
                continue;
            }
            let (table, columns) = entry
                .split_once(':')
                .ok_or_else(|| format_error(entry))?;
            let table = table.trim();
            if table.is_empty() {
                return Err(format_error(entry));
            }

            let segments = split_segments(columns).map_err(|_| format_error(entry))?;
            if segments.is_empty() {
                return Err(format_error(entry));
            }

            for segment in segments {
                let clause = match segment {
                    Segment::Column(column) => SelectClause::column(table, column),
                    Segment::Expression(expression) => SelectClause::expression(table, expression),
                };
                result.push(table, clause, self.strict)?;
            }
        }

        Ok(result)
    }
}

/// Parse with duplicate checking enabled.
pub fn parse(text: &str) -> QueryResult<TableColumns> {
    SelectListParser::strict().parse(text)
}

/// Parse with an explicit duplicate policy.
pub fn parse_with(text: &str, strict: bool) -> QueryResult<TableColumns> {
    SelectListParser { strict }.parse(text)
}

enum Segment<'a> {
    Column(&'a str),
    Expression(&'a str),
}

fn format_error(entry: &str) -> QueryError {
    QueryError::Format(format!("malformed select entry '{}': {}", entry, FORMAT_HINT))
}

/// Split on `;` outside of expression delimiters.
fn split_entries(text: &str) -> QueryResult<Vec<&str>> {
    let bytes = text.as_bytes();
    let mut entries = Vec::new();
    let mut start = 0;
    let mut in_expression = false;
    let mut i = 0;

    while i < bytes.len() {
        if in_expression {
            if bytes[i..].starts_with(EXPRESSION_CLOSE) {
                in_expression = false;
                i += EXPRESSION_CLOSE.len();
                continue;
            }
        } else if bytes[i..].starts_with(EXPRESSION_OPEN) {
            in_expression = true;
            i += EXPRESSION_OPEN.len();
            continue;
        } else if bytes[i] == b';' {
            entries.push(&text[start..i]);
            start = i + 1;
        }
        i += 1;
    }

    if in_expression {
        return Err(QueryError::Format(format!(
            "unterminated expression in select list '{}'",
            text
        )));
    }
    entries.push(&text[start..]);
    Ok(entries)
}

fn split_segments(columns: &str) -> QueryResult<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut rest = columns;

    loop {
        let Some(open) = find(rest, EXPRESSION_OPEN) else {
            push_columns(rest, &mut segments)?;
            break;
        };
        push_columns(&rest[..open], &mut segments)?;

        let after_open = &rest[open + EXPRESSION_OPEN.len()..];
        let close = find(after_open, EXPRESSION_CLOSE).ok_or_else(|| {
            QueryError::Format(format!("unterminated expression in '{}'", columns))
        })?;
        let expression = &after_open[..close];
        if expression.trim().is_empty() {
            return Err(QueryError::Format(format!("empty expression in '{}'", columns)));
        }
        segments.push(Segment::Expression(expression));
        rest = &after_open[close + EXPRESSION_CLOSE.len()..];
    }

    Ok(segments)
}

fn push_columns<'a>(part: &'a str, segments: &mut Vec<Segment<'a>>) -> QueryResult<()> {
    if part.contains(':') {
        return Err(QueryError::Format(format!("unexpected ':' in '{}'", part)));
    }
    segments.extend(
        part.split(',')
            .map(str::trim)
            .filter(|column| !column.is_empty())
            .map(Segment::Column),
    );
    Ok(())
}

fn find(haystack: &str, needle: &[u8]) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selects(columns: &TableColumns, table: &str) -> Vec<String> {
        columns
            .get(table)
            .unwrap()
            .iter()
            .map(|c| c.select.clone())
            .collect()
    }

    #[test]
    fn test_parse_single_table() {
        let res = parse("Table:column1,column2,column3").unwrap();

        assert_eq!(res.len(), 1);
        assert_eq!(selects(&res, "Table"), vec!["column1", "column2", "column3"]);
        assert!(res.clauses().all(|c| !c.is_expression));
        assert!(res.clauses().all(|c| c.table.as_deref() == Some("Table")));
    }

    #[test]
    fn test_parse_two_tables() {
        let res = parse("Table:column1,column2,column3;TableTwo:column,column100").unwrap();

        assert_eq!(res.len(), 2);
        assert_eq!(selects(&res, "Table"), vec!["column1", "column2", "column3"]);
        assert_eq!(selects(&res, "TableTwo"), vec!["column", "column100"]);
    }

    #[test]
    fn test_parse_repeated_table_extends_columns() {
        let res =
            parse("Table:column1,column2,column3;TableTwo:column,column100;Table:column4").unwrap();

        assert_eq!(res.len(), 2);
        assert_eq!(
            selects(&res, "Table"),
            vec!["column1", "column2", "column3", "column4"]
        );
        assert_eq!(selects(&res, "TableTwo"), vec!["column", "column100"]);
        let order: Vec<&str> = res.iter().map(|(table, _)| table).collect();
        assert_eq!(order, vec!["Table", "TableTwo"]);
    }

    #[test]
    fn test_parse_strict_duplicate() {
        let err = parse("Table:column1,column2,column3;TableTwo:column,column1;Table:column1")
            .unwrap_err();

        match err {
            QueryError::DuplicateName { table, column } => {
                assert_eq!(table, "Table");
                assert_eq!(column, "column1");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            parse("T:a,a"),
            Err(QueryError::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_parse_lenient_duplicate() {
        let res = parse_with(
            "Table:column1,column2,column3;TableTwo:column,column1;Table:column1",
            false,
        )
        .unwrap();

        assert_eq!(
            selects(&res, "Table"),
            vec!["column1", "column2", "column3", "column1"]
        );
        assert_eq!(selects(&res, "TableTwo"), vec!["column", "column1"]);

        let res = SelectListParser::lenient().parse("T:a,a").unwrap();
        assert_eq!(selects(&res, "T"), vec!["a", "a"]);
    }

    #[test]
    fn test_same_text_column_and_expression_are_distinct() {
        let res = parse("T:a,{{a}}").unwrap();
        let clauses = res.get("T").unwrap();
        assert_eq!(clauses.len(), 2);
        assert!(!clauses[0].is_expression);
        assert!(clauses[1].is_expression);
    }

    #[test]
    fn test_parse_with_expressions() {
        let res = parse(
            "Table:{{sum(x)}},one,two,{{three, four}},five,{{next}};\
             SecondTable:one,{{(select id from table2 where code=Table.Code)}}",
        )
        .unwrap();
        assert_eq!(res.len(), 2);

        let result = res.get("Table").unwrap();
        assert_eq!(result.len(), 6);
        let expected = [
            ("sum(x)", true),
            ("one", false),
            ("two", false),
            ("three, four", true),
            ("five", false),
            ("next", true),
        ];
        for (clause, (select, is_expression)) in result.iter().zip(expected) {
            assert_eq!(clause.select, select);
            assert_eq!(clause.is_expression, is_expression);
            assert_eq!(clause.table.as_deref(), Some("Table"));
        }

        let result = res.get("SecondTable").unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].select, "one");
        assert!(!result[0].is_expression);
        assert_eq!(
            result[1].select,
            "(select id from table2 where code=Table.Code)"
        );
        assert!(result[1].is_expression);
    }

    #[test]
    fn test_expression_may_contain_semicolon_and_colon() {
        let res = parse("T:{{coalesce(a, 0)::int; -- note}},b;U:c").unwrap();

        assert_eq!(res.len(), 2);
        let t = res.get("T").unwrap();
        assert_eq!(t[0].select, "coalesce(a, 0)::int; -- note");
        assert_eq!(t[1].select, "b");
        assert_eq!(selects(&res, "U"), vec!["c"]);
    }

    #[test]
    fn test_parse_format_errors() {
        let malformed = [
            "Table:column1:1:2:3:,column2,column3;TableTwo:column,column1;Table:column4",
            "NoColumnDelimiter",
            ":column",
            "Table:",
            "Table:{{unterminated",
            "Table:{{}}",
        ];
        for text in malformed {
            assert!(
                matches!(parse(text), Err(QueryError::Format(_))),
                "expected format error for {text}"
            );
        }
    }

    #[test]
    fn test_parse_skips_empty_entries() {
        let res = parse("T:a;;U:b;").unwrap();
        assert_eq!(res.len(), 2);
    }

    #[test]
    fn test_to_sql_fragments() {
        let res = parse("CurrentTable:Id,Name;Bridge:{{count(1) as Total}}").unwrap();
        assert_eq!(
            res.to_sql_fragments(),
            vec!["CurrentTable.Id", "CurrentTable.Name", "count(1) as Total"]
        );
    }

    #[test]
    fn test_select_clause_to_sql() {
        assert_eq!(SelectClause::all().to_sql("Users"), "Users.*");
        assert_eq!(SelectClause::column("Roles", "Name").to_sql("Users"), "Roles.Name");
        assert_eq!(SelectClause::expression("Users", "max(Id)").to_sql("Users"), "max(Id)");
    }
}

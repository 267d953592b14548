//! SQL template engine
//!
//! Clause fragments are accumulated into a closed set of named groups. Any
//! number of templates can be registered against the same accumulator; each
//! one substitutes `/**group**/` placeholders with the rendered group text and
//! caches the result until the accumulator changes.

use crate::errors::{QueryError, QueryResult};
use crate::query_builder::parameters::Parameters;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*\*(.+?)\*\*/").expect("placeholder pattern is valid"));

/// Clause groups a template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseGroup {
    Select,
    InnerJoin,
    LeftJoin,
    RightJoin,
    Where,
    GroupBy,
    OrderBy,
}

impl ClauseGroup {
    pub const ALL: [ClauseGroup; 7] = [
        ClauseGroup::Select,
        ClauseGroup::InnerJoin,
        ClauseGroup::LeftJoin,
        ClauseGroup::RightJoin,
        ClauseGroup::Where,
        ClauseGroup::GroupBy,
        ClauseGroup::OrderBy,
    ];

    /// Name used inside `/**name**/` placeholders
    pub fn token(&self) -> &'static str {
        match self {
            ClauseGroup::Select => "select",
            ClauseGroup::InnerJoin => "innerjoin",
            ClauseGroup::LeftJoin => "leftjoin",
            ClauseGroup::RightJoin => "rightjoin",
            ClauseGroup::Where => "where",
            ClauseGroup::GroupBy => "groupby",
            ClauseGroup::OrderBy => "orderby",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|group| group.token() == token)
    }

    pub fn placeholder(&self) -> String {
        format!("/**{}**/", self.token())
    }

    fn joiner(&self) -> &'static str {
        match self {
            ClauseGroup::Select | ClauseGroup::GroupBy | ClauseGroup::OrderBy => " , ",
            ClauseGroup::InnerJoin => "\nINNER JOIN ",
            ClauseGroup::LeftJoin => "\nLEFT JOIN ",
            ClauseGroup::RightJoin => "\nRIGHT JOIN ",
            ClauseGroup::Where => " AND ",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            ClauseGroup::Select => "",
            ClauseGroup::InnerJoin => "\nINNER JOIN ",
            ClauseGroup::LeftJoin => "\nLEFT JOIN ",
            ClauseGroup::RightJoin => "\nRIGHT JOIN ",
            ClauseGroup::Where => "WHERE ",
            ClauseGroup::GroupBy => "\nGROUP BY ",
            ClauseGroup::OrderBy => "ORDER BY ",
        }
    }

    fn suffix(&self) -> &'static str {
        "\n"
    }
}

#[derive(Debug, Clone)]
struct Clause {
    sql: String,
    parameters: Option<Parameters>,
}

/// Handle of a template registered with a [`SqlTemplateEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateId(usize);

/// Fully substituted SQL plus the merged parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTemplate {
    pub sql: String,
    pub parameters: Parameters,
}

#[derive(Debug)]
struct Template {
    raw_sql: String,
    parameters: Parameters,
    resolved: Option<(u64, ResolvedTemplate)>,
    resolutions: usize,
}

/// Clause accumulator shared by every registered template.
#[derive(Debug, Default)]
pub struct SqlTemplateEngine {
    groups: HashMap<ClauseGroup, Vec<Clause>>,
    arrivals: Vec<(ClauseGroup, usize)>,
    version: u64,
    templates: Vec<Template>,
}

impl SqlTemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment to a group. Invalidates every template's cache.
    pub fn add_to_group(
        &mut self,
        group: ClauseGroup,
        sql: impl Into<String>,
        parameters: Option<Parameters>,
    ) -> &mut Self {
        let clauses = self.groups.entry(group).or_default();
        clauses.push(Clause {
            sql: sql.into(),
            parameters,
        });
        self.arrivals.push((group, clauses.len() - 1));
        self.version += 1;
        self
    }

    pub fn select(&mut self, sql: impl Into<String>) -> &mut Self {
        self.add_to_group(ClauseGroup::Select, sql, None)
    }

    pub fn inner_join(&mut self, sql: impl Into<String>) -> &mut Self {
        self.add_to_group(ClauseGroup::InnerJoin, sql, None)
    }

    pub fn left_join(&mut self, sql: impl Into<String>) -> &mut Self {
        self.add_to_group(ClauseGroup::LeftJoin, sql, None)
    }

    pub fn right_join(&mut self, sql: impl Into<String>) -> &mut Self {
        self.add_to_group(ClauseGroup::RightJoin, sql, None)
    }

    pub fn and_where(&mut self, sql: impl Into<String>, parameters: Option<Parameters>) -> &mut Self {
        self.add_to_group(ClauseGroup::Where, sql, parameters)
    }

    pub fn group_by(&mut self, sql: impl Into<String>) -> &mut Self {
        self.add_to_group(ClauseGroup::GroupBy, sql, None)
    }

    pub fn order_by(&mut self, sql: impl Into<String>) -> &mut Self {
        self.add_to_group(ClauseGroup::OrderBy, sql, None)
    }

    /// Register a template. `parameters` are bound ahead of any clause parameters.
    pub fn create_template(&mut self, raw_sql: impl Into<String>, parameters: Parameters) -> TemplateId {
        self.templates.push(Template {
            raw_sql: raw_sql.into(),
            parameters,
            resolved: None,
            resolutions: 0,
        });
        TemplateId(self.templates.len() - 1)
    }

    /// Accumulator version; bumped by every `add_to_group`.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn fragments(&self, group: ClauseGroup) -> impl Iterator<Item = &str> {
        self.groups
            .get(&group)
            .into_iter()
            .flat_map(|clauses| clauses.iter().map(|c| c.sql.as_str()))
    }

    pub fn sql(&mut self, id: TemplateId) -> QueryResult<&str> {
        Ok(self.resolve(id)?.sql.as_str())
    }

    pub fn parameters(&mut self, id: TemplateId) -> QueryResult<&Parameters> {
        Ok(&self.resolve(id)?.parameters)
    }

    /// Resolve a template, reusing the cached result when nothing was added
    /// since the last resolution.
    pub fn resolve(&mut self, id: TemplateId) -> QueryResult<&ResolvedTemplate> {
        let TemplateId(index) = id;
        let template = self
            .templates
            .get(index)
            .ok_or_else(|| QueryError::InvalidArgument(format!("unknown template #{}", index)))?;

        let stale = match &template.resolved {
            Some((version, _)) => *version != self.version,
            None => true,
        };
        if stale {
            let resolved = self.render(template);
            tracing::trace!(template = index, version = self.version, "resolved sql template");
            let template = &mut self.templates[index];
            template.resolved = Some((self.version, resolved));
            template.resolutions += 1;
        }

        match &self.templates[index].resolved {
            Some((_, resolved)) => Ok(resolved),
            None => Err(QueryError::InvalidArgument(format!(
                "template #{} could not be resolved",
                index
            ))),
        }
    }

    fn render(&self, template: &Template) -> ResolvedTemplate {
        let mut parameters = template.parameters.clone();
        for (group, index) in &self.arrivals {
            if let Some(clause_parameters) = self
                .groups
                .get(group)
                .and_then(|clauses| clauses.get(*index))
                .and_then(|clause| clause.parameters.as_ref())
            {
                parameters.extend_from(clause_parameters);
            }
        }

        // Single pass over the raw template: clause text is never rescanned.
        let sql = PLACEHOLDER
            .replace_all(&template.raw_sql, |caps: &Captures| {
                match ClauseGroup::from_token(&caps[1]) {
                    Some(group) => self.render_group(group),
                    None => String::new(),
                }
            })
            .into_owned();

        ResolvedTemplate { sql, parameters }
    }

    fn render_group(&self, group: ClauseGroup) -> String {
        match self.groups.get(&group) {
            Some(clauses) if !clauses.is_empty() => {
                let body = clauses
                    .iter()
                    .map(|c| c.sql.as_str())
                    .collect::<Vec<_>>()
                    .join(group.joiner());
                format!("{}{}{}", group.prefix(), body, group.suffix())
            }
            _ => String::new(),
        }
    }

    #[cfg(test)]
    fn resolutions(&self, id: TemplateId) -> usize {
        self.templates[id.0].resolutions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn simplify(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_empty_groups_render_nothing() {
        let mut engine = SqlTemplateEngine::new();
        let id = engine.create_template("Select /**select**/ from T /**where**/ /**orderby**/", Parameters::new());

        assert_eq!(simplify(engine.sql(id).unwrap()), "Select from T");
    }

    #[test]
    fn test_groups_use_prefix_and_joiner() {
        let mut engine = SqlTemplateEngine::new();
        engine.select("T.*").select("U.Name");
        engine.inner_join("U on U.Id = T.UserId");
        engine.left_join("V on V.Id = T.VId").left_join("W on W.Id = V.WId");
        engine.and_where("T.Id = @TId", None).and_where("T.Name is null", None);
        engine.group_by("T.Kind");
        engine.order_by("T.Name ASC").order_by("T.Id DESC");
        let id = engine.create_template(
            "Select /**select**/ from T /**innerjoin**/ /**leftjoin**/ /**where**/ /**groupby**/ /**orderby**/",
            Parameters::new(),
        );

        assert_eq!(
            simplify(engine.sql(id).unwrap()),
            "Select T.* , U.Name from T INNER JOIN U on U.Id = T.UserId \
             LEFT JOIN V on V.Id = T.VId LEFT JOIN W on W.Id = V.WId \
             WHERE T.Id = @TId AND T.Name is null GROUP BY T.Kind ORDER BY T.Name ASC , T.Id DESC"
        );
    }

    #[test]
    fn test_unknown_placeholders_are_stripped() {
        let mut engine = SqlTemplateEngine::new();
        engine.select("T.*");
        let id = engine.create_template(
            "Select /**select**/ from T /**having**/ /**custom**/ /**where**/",
            Parameters::new(),
        );

        assert_eq!(simplify(engine.sql(id).unwrap()), "Select T.* from T");
    }

    #[test]
    fn test_stripping_is_not_greedy() {
        let mut engine = SqlTemplateEngine::new();
        engine.left_join("U on U.Id = T.UId");
        let id = engine.create_template(
            "from T /**unknown**/ where 1 = 1 /**other**/ /**leftjoin**/",
            Parameters::new(),
        );

        assert_eq!(
            simplify(engine.sql(id).unwrap()),
            "from T where 1 = 1 LEFT JOIN U on U.Id = T.UId"
        );
    }

    #[test]
    fn test_comments_inside_clauses_are_kept() {
        let mut engine = SqlTemplateEngine::new();
        engine.select("count(1) /** rows **/ as Total");
        engine.and_where("(T.Flag = 1 /**where**/)", None);
        let id = engine.create_template(
            "Select /**select**/ from T /**unknown**/ /**where**/",
            Parameters::new(),
        );

        assert_eq!(
            simplify(engine.sql(id).unwrap()),
            "Select count(1) /** rows **/ as Total from T WHERE (T.Flag = 1 /**where**/)"
        );
    }

    #[test]
    fn test_parameters_merge_in_arrival_order() {
        let mut engine = SqlTemplateEngine::new();
        engine.and_where("a = @A", Some(Parameters::new().with("@A", 1)));
        engine.add_to_group(ClauseGroup::Select, "@B as b", Some(Parameters::new().with("@B", 2)));
        engine.and_where("c = @C", Some(Parameters::new().with("@C", 3)));
        let id = engine.create_template("Select /**select**/ from T /**where**/", Parameters::new().with("@Skip", 0));

        let params = engine.parameters(id).unwrap();
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["Skip", "A", "B", "C"]);
        assert_eq!(params.get("C"), Some(&json!(3)));
    }

    #[test]
    fn test_unreferenced_group_parameters_are_still_bound() {
        let mut engine = SqlTemplateEngine::new();
        engine.and_where("T.Id = @TId", Some(Parameters::new().with("@TId", 7)));
        let id = engine.create_template("Select 1 from T", Parameters::new());

        assert_eq!(engine.parameters(id).unwrap().get("TId"), Some(&json!(7)));
    }

    #[test]
    fn test_resolution_is_cached_until_accumulator_changes() {
        let mut engine = SqlTemplateEngine::new();
        let simple = engine.create_template("Select /**select**/ from T", Parameters::new());
        let count = engine.create_template("Select count(1) from T /**where**/", Parameters::new());
        engine.select("T.*");

        let first = engine.sql(simple).unwrap().to_string();
        let _ = engine.parameters(simple).unwrap();
        let second = engine.sql(simple).unwrap().to_string();
        assert_eq!(first, second);
        assert_eq!(engine.resolutions(simple), 1);
        assert_eq!(engine.resolutions(count), 0);

        let version = engine.version();
        engine.and_where("T.Id = @TId", None);
        assert_eq!(engine.version(), version + 1);

        assert!(engine.sql(simple).unwrap().contains("T.*"));
        assert!(engine.sql(count).unwrap().contains("WHERE T.Id = @TId"));
        assert_eq!(engine.resolutions(simple), 2);
        assert_eq!(engine.resolutions(count), 1);
    }

    #[test]
    fn test_fragments_lists_group_contents() {
        let mut engine = SqlTemplateEngine::new();
        engine.select("a").select("b");
        assert_eq!(engine.fragments(ClauseGroup::Select).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(engine.fragments(ClauseGroup::Where).count(), 0);
    }

    #[test]
    fn test_unknown_template_id() {
        let mut other = SqlTemplateEngine::new();
        let _ = other.create_template("a", Parameters::new());
        let id = other.create_template("b", Parameters::new());

        let mut engine = SqlTemplateEngine::new();
        assert!(matches!(engine.sql(id), Err(QueryError::InvalidArgument(_))));
    }
}

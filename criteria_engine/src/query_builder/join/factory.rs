//! Join fragment factories, one per join variant.

use crate::directives::{AddOnTarget, JoinDirective, JoinKind, JoinVariant};
use crate::errors::{QueryError, QueryResult};

/// A resolved join: SQL fragments plus the select fragments it contributes.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// Sentinel column name, empty when the join does not split.
    pub splitter: String,
    pub joins: Vec<String>,
    pub selects: Vec<String>,
    pub kind: JoinKind,
    /// False when the gating field was off; only the sentinel is emitted.
    pub has_join: bool,
    pub order: Option<i32>,
}

/// Per-build view of a shared [`JoinDirective`] with its defaults applied.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedJoin<'a> {
    pub directive: &'a JoinDirective,
    pub current_table: &'a str,
    pub current_field: &'a str,
    pub splitter_prefix: &'a str,
    /// Set when an `including` field is active.
    pub suppress_columns: bool,
}

impl<'a> ResolvedJoin<'a> {
    /// Fill the current table and field from the criteria when the directive
    /// leaves them unset.
    pub fn new(
        directive: &'a JoinDirective,
        primary_table: &'a str,
        field: &'a str,
        splitter_prefix: &'a str,
    ) -> Self {
        Self {
            directive,
            current_table: non_blank(directive.current_table.as_deref()).unwrap_or(primary_table),
            current_field: non_blank(directive.current_field.as_deref()).unwrap_or(field),
            splitter_prefix,
            suppress_columns: false,
        }
    }

    pub fn suppress_columns(mut self, suppress: bool) -> Self {
        self.suppress_columns = suppress;
        self
    }

    pub fn splitter(&self) -> String {
        self.directive.splitter(self.splitter_prefix)
    }

    fn selects(&self) -> Vec<String> {
        if self.suppress_columns {
            return Vec::new();
        }
        match &self.directive.columns {
            Some(columns) if !columns.is_empty() => columns.to_sql_fragments(),
            _ => vec![format!("{}.*", self.directive.joined_table)],
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn with_add_on(sql: String, add_on: Option<&str>) -> String {
    match non_blank(add_on) {
        Some(add_on) => format!("{} AND {}", sql, add_on),
        None => sql,
    }
}

/// Builds join clauses for one join variant.
pub trait JoinFragmentFactory {
    /// Clause for a join whose gating field is on.
    fn create_active(&self, join: &ResolvedJoin<'_>) -> QueryResult<JoinClause>;

    /// Clause for a join whose gating field is off: no SQL, sentinel only.
    fn create_inactive(&self, join: &ResolvedJoin<'_>) -> QueryResult<JoinClause> {
        Ok(JoinClause {
            splitter: join.splitter(),
            joins: Vec::new(),
            selects: Vec::new(),
            kind: join.directive.kind,
            has_join: false,
            order: join.directive.order,
        })
    }
}

/// One-to-one / one-to-many join.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleJoinFactory;

impl JoinFragmentFactory for SimpleJoinFactory {
    fn create_active(&self, join: &ResolvedJoin<'_>) -> QueryResult<JoinClause> {
        let directive = join.directive;
        if directive.variant != JoinVariant::Simple {
            return Err(wrong_variant("simple", &directive.variant));
        }

        let sql = format!(
            "{joined} on {joined}.{joined_field} = {current}.{current_field}",
            joined = directive.joined_table,
            joined_field = directive.joined_field,
            current = join.current_table,
            current_field = join.current_field,
        );

        Ok(JoinClause {
            splitter: join.splitter(),
            joins: vec![with_add_on(sql, directive.add_on.as_deref())],
            selects: join.selects(),
            kind: directive.kind,
            has_join: true,
            order: directive.order,
        })
    }
}

/// Many-to-many join through a bridge table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManyToManyJoinFactory;

impl JoinFragmentFactory for ManyToManyJoinFactory {
    fn create_active(&self, join: &ResolvedJoin<'_>) -> QueryResult<JoinClause> {
        let directive = join.directive;
        let bridge = match &directive.variant {
            JoinVariant::ManyToMany(bridge) => bridge,
            other => return Err(wrong_variant("many-to-many", other)),
        };

        let (bridge_add_on, joined_add_on) = match bridge.add_on_target {
            AddOnTarget::Bridge => (directive.add_on.as_deref(), None),
            AddOnTarget::Joined => (None, directive.add_on.as_deref()),
        };

        let bridge_sql = format!(
            "{bridge} on {bridge}.{bridge_field} = {current}.{current_field}",
            bridge = bridge.table,
            bridge_field = bridge.current_field,
            current = join.current_table,
            current_field = join.current_field,
        );
        let joined_sql = format!(
            "{joined} on {joined}.{joined_field} = {bridge}.{bridge_field}",
            joined = directive.joined_table,
            joined_field = directive.joined_field,
            bridge = bridge.table,
            bridge_field = bridge.joined_field,
        );

        Ok(JoinClause {
            splitter: join.splitter(),
            joins: vec![
                with_add_on(bridge_sql, bridge_add_on),
                with_add_on(joined_sql, joined_add_on),
            ],
            selects: join.selects(),
            kind: directive.kind,
            has_join: true,
            order: directive.order,
        })
    }
}

fn wrong_variant(expected: &str, found: &JoinVariant) -> QueryError {
    QueryError::InvalidArgument(format!(
        "{} join factory received a {} join directive",
        expected,
        found.name()
    ))
}

/// Factory matching the directive's variant.
pub fn factory_for(directive: &JoinDirective) -> &'static dyn JoinFragmentFactory {
    match directive.variant {
        JoinVariant::Simple => &SimpleJoinFactory,
        JoinVariant::ManyToMany(_) => &ManyToManyJoinFactory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::BridgeTable;

    fn resolved<'a>(directive: &'a JoinDirective, field: &'a str) -> ResolvedJoin<'a> {
        ResolvedJoin::new(directive, "Users", field, "SplitOn")
    }

    #[test]
    fn test_simple_active() {
        let directive = JoinDirective::simple(JoinKind::Left, "Roles", "Id");
        let clause = SimpleJoinFactory
            .create_active(&resolved(&directive, "RoleId"))
            .unwrap();

        assert!(clause.has_join);
        assert_eq!(clause.joins, vec!["Roles on Roles.Id = Users.RoleId"]);
        assert_eq!(clause.selects, vec!["Roles.*"]);
        assert_eq!(clause.splitter, "SplitOnRolesId");
        assert_eq!(clause.kind, JoinKind::Left);
    }

    #[test]
    fn test_simple_inactive() {
        let directive = JoinDirective::simple(JoinKind::Inner, "Roles", "Id");
        let clause = SimpleJoinFactory
            .create_inactive(&resolved(&directive, "RoleId"))
            .unwrap();

        assert!(!clause.has_join);
        assert_eq!(clause.splitter, "SplitOnRolesId");
        assert!(clause.joins.is_empty());
        assert!(clause.selects.is_empty());
    }

    #[test]
    fn test_simple_overrides_and_add_on() {
        let directive = JoinDirective::simple(JoinKind::Inner, "Profiles", "UserId")
            .current_table("Accounts")
            .current_field("OwnerId")
            .add_on("Profiles.IsActive = 1")
            .select_columns("Profiles:Nick;Profiles:{{count(1) as Cnt}}")
            .unwrap();
        let clause = SimpleJoinFactory
            .create_active(&resolved(&directive, "WithProfile"))
            .unwrap();

        assert_eq!(
            clause.joins,
            vec!["Profiles on Profiles.UserId = Accounts.OwnerId AND Profiles.IsActive = 1"]
        );
        assert_eq!(clause.selects, vec!["Profiles.Nick", "count(1) as Cnt"]);
    }

    #[test]
    fn test_defaults_are_per_call() {
        let directive = JoinDirective::simple(JoinKind::Left, "Roles", "Id");
        let first = resolved(&directive, "RoleId");
        let second = ResolvedJoin::new(&directive, "Admins", "MainRoleId", "SplitOn");

        assert_eq!(first.current_table, "Users");
        assert_eq!(second.current_table, "Admins");
        assert_eq!(second.current_field, "MainRoleId");
        assert_eq!(directive.current_table, None);
        assert_eq!(directive.current_field, None);
    }

    #[test]
    fn test_suppressed_columns_keep_join() {
        let directive = JoinDirective::simple(JoinKind::Left, "Roles", "Id");
        let clause = SimpleJoinFactory
            .create_active(&resolved(&directive, "RoleId").suppress_columns(true))
            .unwrap();

        assert_eq!(clause.joins.len(), 1);
        assert!(clause.selects.is_empty());
        assert_eq!(clause.splitter, "SplitOnRolesId");
    }

    #[test]
    fn test_many_to_many_fragment_order() {
        let directive = JoinDirective::many_to_many(
            JoinKind::Left,
            "Tags",
            "Id",
            BridgeTable::new("UserTags", "UserId", "TagId"),
        )
        .current_field("Id")
        .add_on("Tags.Deleted = 0");
        let clause = factory_for(&directive)
            .create_active(&resolved(&directive, "WithTags"))
            .unwrap();

        assert_eq!(
            clause.joins,
            vec![
                "UserTags on UserTags.UserId = Users.Id",
                "Tags on Tags.Id = UserTags.TagId AND Tags.Deleted = 0",
            ]
        );
        assert_eq!(clause.selects, vec!["Tags.*"]);
    }

    #[test]
    fn test_many_to_many_add_on_on_bridge() {
        let directive = JoinDirective::many_to_many(
            JoinKind::Inner,
            "Tags",
            "Id",
            BridgeTable::new("UserTags", "UserId", "TagId").add_on_target(AddOnTarget::Bridge),
        )
        .current_field("Id")
        .add_on("UserTags.Visible = 1");
        let clause = ManyToManyJoinFactory
            .create_active(&resolved(&directive, "WithTags"))
            .unwrap();

        assert_eq!(
            clause.joins,
            vec![
                "UserTags on UserTags.UserId = Users.Id AND UserTags.Visible = 1",
                "Tags on Tags.Id = UserTags.TagId",
            ]
        );
    }

    #[test]
    fn test_wrong_variant_is_invalid_argument() {
        let simple = JoinDirective::simple(JoinKind::Left, "Roles", "Id");
        let bridged = JoinDirective::many_to_many(
            JoinKind::Left,
            "Tags",
            "Id",
            BridgeTable::new("UserTags", "UserId", "TagId"),
        );

        assert!(matches!(
            ManyToManyJoinFactory.create_active(&resolved(&simple, "F")),
            Err(QueryError::InvalidArgument(_))
        ));
        assert!(matches!(
            SimpleJoinFactory.create_active(&resolved(&bridged, "F")),
            Err(QueryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_no_split_has_empty_splitter() {
        let directive = JoinDirective::simple(JoinKind::Left, "Roles", "Id").no_split();
        let clause = SimpleJoinFactory
            .create_inactive(&resolved(&directive, "RoleId"))
            .unwrap();
        assert_eq!(clause.splitter, "");
    }
}

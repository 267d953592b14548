//! Parsing utilities for criteria attributes
//!
//! This module reads the struct-level `#[table]` attribute and the per-field
//! `#[base]`, `#[filter]`, `#[join]`, `#[many_to_many]` and `#[add_select]`
//! attributes into plain descriptions consumed by code generation.

use proc_macro2::Span;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Data, Error, Fields, Ident, LitInt, LitStr, Path, Result};

pub const COMPARE_KINDS: &[&str] = &[
    "Eq", "NotEq", "Gt", "Lt", "GtEq", "LtEq", "Like", "In", "NotIn", "IsNull", "IsNotNull",
];
pub const JOIN_KINDS: &[&str] = &["Inner", "Left", "Right"];
pub const ADD_ON_TARGETS: &[&str] = &["Bridge", "Joined"];

/// How Rust field names map to the names used in SQL parameters and columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenameRule {
    /// `age_from` -> `AgeFrom`
    #[default]
    PascalCase,
    /// Field names are used as written
    None,
}

impl RenameRule {
    pub fn apply(&self, ident: &Ident) -> String {
        let raw = ident.to_string();
        let raw = raw.strip_prefix("r#").unwrap_or(&raw);
        match self {
            RenameRule::PascalCase => to_pascal_case(raw),
            RenameRule::None => raw.to_string(),
        }
    }
}

pub fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct TableInfo {
    pub name: Option<String>,
    pub rename: RenameRule,
}

pub struct FilterSpec {
    pub compare: Ident,
    pub column: Option<String>,
    pub table: Option<String>,
    pub expression: Option<String>,
    pub format: Option<Path>,
}

pub struct BridgeSpec {
    pub table: String,
    pub current_field: String,
    pub joined_field: String,
    pub add_on_target: Option<Ident>,
}

pub struct JoinSpec {
    pub kind: Ident,
    pub table: String,
    pub field: String,
    pub current_table: Option<String>,
    pub current_field: Option<String>,
    pub columns: Option<String>,
    pub on: Option<String>,
    pub no_split: bool,
    /// Rust name of the referenced field as written in the attribute
    pub including: Option<LitStr>,
    pub order: Option<i32>,
    pub bridge: Option<BridgeSpec>,
}

#[derive(Debug)]
pub enum SelectSpec {
    Columns(String),
    FromValue,
}

pub struct FieldInfo {
    pub ident: Ident,
    pub name: String,
    pub type_string: String,
    pub filters: Vec<FilterSpec>,
    pub joins: Vec<JoinSpec>,
    pub select: Option<SelectSpec>,
}

impl FieldInfo {
    pub fn has_directives(&self) -> bool {
        !self.filters.is_empty() || !self.joins.is_empty() || self.select.is_some()
    }
}

pub struct CriteriaInfo {
    pub table: TableInfo,
    pub base: Ident,
    /// Every named field except the base, in declaration order
    pub fields: Vec<FieldInfo>,
}

impl CriteriaInfo {
    pub fn field_by_ident(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| {
            let ident = f.ident.to_string();
            ident.strip_prefix("r#").unwrap_or(&ident) == name
        })
    }

    /// Logical name of the field an `including` setting points at
    pub fn resolve_including(&self, including: &LitStr) -> Result<String> {
        self.field_by_ident(&including.value())
            .map(|f| f.name.clone())
            .ok_or_else(|| {
                Error::new(
                    including.span(),
                    format!("including refers to unknown field '{}'", including.value()),
                )
            })
    }

    /// Fields whose runtime value the generated code must expose
    pub fn exposed_fields(&self) -> Result<Vec<&FieldInfo>> {
        let mut exposed: Vec<&FieldInfo> =
            self.fields.iter().filter(|f| f.has_directives()).collect();
        for field in &self.fields {
            for join in &field.joins {
                if let Some(including) = &join.including {
                    let target = self.field_by_ident(&including.value()).ok_or_else(|| {
                        Error::new(
                            including.span(),
                            format!("including refers to unknown field '{}'", including.value()),
                        )
                    })?;
                    if !exposed.iter().any(|f| f.ident == target.ident) {
                        exposed.push(target);
                    }
                }
            }
        }
        Ok(exposed)
    }
}

fn string_value(meta: &ParseNestedMeta) -> Result<String> {
    let lit: LitStr = meta.value()?.parse()?;
    let value = lit.value();
    if value.trim().is_empty() {
        return Err(Error::new(lit.span(), "value cannot be empty"));
    }
    Ok(value)
}

fn checked_ident(meta: &ParseNestedMeta, allowed: &[&str], what: &str) -> Result<Ident> {
    let ident: Ident = meta.value()?.parse()?;
    if !allowed.iter().any(|a| ident == *a) {
        return Err(Error::new(
            ident.span(),
            format!("unknown {} '{}', expected one of: {}", what, ident, allowed.join(", ")),
        ));
    }
    Ok(ident)
}

pub fn parse_table_attributes(attrs: &[Attribute]) -> Result<TableInfo> {
    let mut info = TableInfo::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("table")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                info.name = Some(string_value(&meta)?);
            } else if meta.path.is_ident("rename_all") {
                let lit: LitStr = meta.value()?.parse()?;
                info.rename = match lit.value().as_str() {
                    "PascalCase" => RenameRule::PascalCase,
                    "none" => RenameRule::None,
                    other => {
                        return Err(Error::new(
                            lit.span(),
                            format!("unknown rename rule '{}', expected \"PascalCase\" or \"none\"", other),
                        ))
                    }
                };
            } else {
                return Err(meta.error("unknown table attribute, expected `name` or `rename_all`"));
            }
            Ok(())
        })?;
    }

    Ok(info)
}

fn parse_filter(attr: &Attribute) -> Result<FilterSpec> {
    let mut spec = FilterSpec {
        compare: Ident::new("Eq", Span::call_site()),
        column: None,
        table: None,
        expression: None,
        format: None,
    };

    // #[filter] without arguments is an equality filter
    if matches!(attr.meta, syn::Meta::Path(_)) {
        return Ok(spec);
    }

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("compare") {
            spec.compare = checked_ident(&meta, COMPARE_KINDS, "comparison")?;
        } else if meta.path.is_ident("column") {
            spec.column = Some(string_value(&meta)?);
        } else if meta.path.is_ident("table") {
            spec.table = Some(string_value(&meta)?);
        } else if meta.path.is_ident("expression") {
            spec.expression = Some(string_value(&meta)?);
        } else if meta.path.is_ident("format") {
            spec.format = Some(meta.value()?.parse()?);
        } else {
            return Err(meta.error(
                "unknown filter attribute, expected one of: compare, column, table, expression, format",
            ));
        }
        Ok(())
    })?;

    Ok(spec)
}

#[derive(Default)]
struct JoinFields {
    kind: Option<Ident>,
    table: Option<String>,
    field: Option<String>,
    current_table: Option<String>,
    current_field: Option<String>,
    columns: Option<String>,
    on: Option<String>,
    no_split: bool,
    including: Option<LitStr>,
    order: Option<i32>,
    bridge: Option<String>,
    bridge_current_field: Option<String>,
    bridge_joined_field: Option<String>,
    add_on_target: Option<Ident>,
}

fn parse_join(attr: &Attribute, many_to_many: bool) -> Result<JoinSpec> {
    let mut fields = JoinFields::default();

    attr.parse_nested_meta(|meta| {
        let path = &meta.path;
        if path.is_ident("kind") {
            fields.kind = Some(checked_ident(&meta, JOIN_KINDS, "join kind")?);
        } else if path.is_ident("table") {
            fields.table = Some(string_value(&meta)?);
        } else if path.is_ident("field") {
            fields.field = Some(string_value(&meta)?);
        } else if path.is_ident("current_table") {
            fields.current_table = Some(string_value(&meta)?);
        } else if path.is_ident("current_field") {
            fields.current_field = Some(string_value(&meta)?);
        } else if path.is_ident("columns") {
            fields.columns = Some(string_value(&meta)?);
        } else if path.is_ident("on") {
            fields.on = Some(string_value(&meta)?);
        } else if path.is_ident("no_split") {
            fields.no_split = true;
        } else if path.is_ident("including") {
            fields.including = Some(meta.value()?.parse()?);
        } else if path.is_ident("order") {
            let lit: LitInt = meta.value()?.parse()?;
            fields.order = Some(lit.base10_parse()?);
        } else if many_to_many && path.is_ident("bridge") {
            fields.bridge = Some(string_value(&meta)?);
        } else if many_to_many && path.is_ident("bridge_current_field") {
            fields.bridge_current_field = Some(string_value(&meta)?);
        } else if many_to_many && path.is_ident("bridge_joined_field") {
            fields.bridge_joined_field = Some(string_value(&meta)?);
        } else if many_to_many && path.is_ident("add_on_target") {
            fields.add_on_target = Some(checked_ident(&meta, ADD_ON_TARGETS, "add-on target")?);
        } else {
            return Err(meta.error("unknown join attribute"));
        }
        Ok(())
    })?;

    let missing = |key: &str| Error::new_spanned(attr, format!("join attribute requires `{}`", key));

    let bridge = if many_to_many {
        Some(BridgeSpec {
            table: fields.bridge.ok_or_else(|| missing("bridge"))?,
            current_field: fields
                .bridge_current_field
                .ok_or_else(|| missing("bridge_current_field"))?,
            joined_field: fields
                .bridge_joined_field
                .ok_or_else(|| missing("bridge_joined_field"))?,
            add_on_target: fields.add_on_target,
        })
    } else {
        None
    };

    Ok(JoinSpec {
        kind: fields.kind.ok_or_else(|| missing("kind"))?,
        table: fields.table.ok_or_else(|| missing("table"))?,
        field: fields.field.ok_or_else(|| missing("field"))?,
        current_table: fields.current_table,
        current_field: fields.current_field,
        columns: fields.columns,
        on: fields.on,
        no_split: fields.no_split,
        including: fields.including,
        order: fields.order,
        bridge,
    })
}

fn parse_add_select(attr: &Attribute) -> Result<SelectSpec> {
    if matches!(attr.meta, syn::Meta::Path(_)) {
        return Ok(SelectSpec::FromValue);
    }

    let mut columns = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("columns") {
            columns = Some(string_value(&meta)?);
            Ok(())
        } else {
            Err(meta.error("unknown add_select attribute, expected `columns`"))
        }
    })?;

    columns
        .map(SelectSpec::Columns)
        .ok_or_else(|| Error::new_spanned(attr, "add_select requires `columns` or no arguments"))
}

pub fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

pub fn parse_criteria(data: &Data, attrs: &[Attribute]) -> Result<CriteriaInfo> {
    let table = parse_table_attributes(attrs)?;

    let fields_named = match data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(named) => named,
            _ => {
                return Err(Error::new(
                    Span::call_site(),
                    "Criteria can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                Span::call_site(),
                "Criteria can only be derived for structs with named fields",
            ))
        }
    };

    let mut base = None;
    let mut fields = Vec::new();

    for field in &fields_named.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| Error::new_spanned(field, "Field must have a name"))?;

        if has_attribute(&field.attrs, "base") {
            if base.is_some() {
                return Err(Error::new(ident.span(), "only one field can be marked #[base]"));
            }
            for other in ["filter", "join", "many_to_many", "add_select"] {
                if has_attribute(&field.attrs, other) {
                    return Err(Error::new(
                        ident.span(),
                        format!("the #[base] field cannot carry #[{}]", other),
                    ));
                }
            }
            base = Some(ident);
            continue;
        }

        let ty = &field.ty;
        let type_string = quote::quote!(#ty).to_string().replace(' ', "");

        let mut info = FieldInfo {
            name: table.rename.apply(&ident),
            ident,
            type_string,
            filters: Vec::new(),
            joins: Vec::new(),
            select: None,
        };

        for attr in &field.attrs {
            if attr.path().is_ident("filter") {
                info.filters.push(parse_filter(attr)?);
            } else if attr.path().is_ident("join") {
                info.joins.push(parse_join(attr, false)?);
            } else if attr.path().is_ident("many_to_many") {
                info.joins.push(parse_join(attr, true)?);
            } else if attr.path().is_ident("add_select") {
                if info.select.is_some() {
                    return Err(Error::new_spanned(attr, "a field can carry only one #[add_select]"));
                }
                let spec = parse_add_select(attr)?;
                if matches!(spec, SelectSpec::FromValue) && info.type_string == "bool" {
                    return Err(Error::new_spanned(
                        attr,
                        "bare #[add_select] reads columns from a String field; use #[add_select(columns = \"...\")] on bool fields",
                    ));
                }
                info.select = Some(spec);
            }
        }

        fields.push(info);
    }

    let base = base.ok_or_else(|| {
        Error::new(
            Span::call_site(),
            "criteria requires a field of type CriteriaBase marked #[base]",
        )
    })?;

    Ok(CriteriaInfo { table, base, fields })
}

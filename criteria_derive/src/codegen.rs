//! Code generation for `#[derive(Criteria)]`

use crate::parsing::{CriteriaInfo, FieldInfo, FilterSpec, JoinSpec, SelectSpec};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Generics, Ident, Result};

fn engine() -> TokenStream {
    quote! { ::querysmith::criteria_engine }
}

fn optional_call(method: &str, value: &Option<String>) -> TokenStream {
    match value {
        Some(value) => {
            let method = Ident::new(method, proc_macro2::Span::call_site());
            quote! { .#method(#value) }
        }
        None => quote! {},
    }
}

fn filter_expr(filter: &FilterSpec) -> TokenStream {
    let engine = engine();
    let compare = &filter.compare;
    let column = optional_call("column", &filter.column);
    let table = optional_call("table", &filter.table);
    let expression = optional_call("expression", &filter.expression);
    let formatter = match &filter.format {
        Some(path) => quote! { .formatter(#path) },
        None => quote! {},
    };

    quote! {
        #engine::FilterDirective::new(#engine::CompareKind::#compare)
            #column #table #expression #formatter
    }
}

fn join_expr(join: &JoinSpec, info: &CriteriaInfo) -> Result<TokenStream> {
    let engine = engine();
    let kind = &join.kind;
    let table = &join.table;
    let field = &join.field;

    let constructor = match &join.bridge {
        Some(bridge) => {
            let bridge_table = &bridge.table;
            let current_field = &bridge.current_field;
            let joined_field = &bridge.joined_field;
            let target = match &bridge.add_on_target {
                Some(target) => quote! { .add_on_target(#engine::AddOnTarget::#target) },
                None => quote! {},
            };
            quote! {
                #engine::JoinDirective::many_to_many(
                    #engine::JoinKind::#kind,
                    #table,
                    #field,
                    #engine::BridgeTable::new(#bridge_table, #current_field, #joined_field) #target,
                )
            }
        }
        None => quote! {
            #engine::JoinDirective::simple(#engine::JoinKind::#kind, #table, #field)
        },
    };

    let current_table = optional_call("current_table", &join.current_table);
    let current_field = optional_call("current_field", &join.current_field);
    let add_on = optional_call("add_on", &join.on);
    let no_split = if join.no_split {
        quote! { .no_split() }
    } else {
        quote! {}
    };
    let including = match &join.including {
        Some(including) => {
            let target = info.resolve_including(including)?;
            quote! { .including(#target) }
        }
        None => quote! {},
    };
    let order = match join.order {
        Some(order) => quote! { .order(#order) },
        None => quote! {},
    };
    // Parsed at registration so malformed column lists surface as a format error
    let columns = match &join.columns {
        Some(columns) => quote! { .select_columns(#columns)? },
        None => quote! {},
    };

    Ok(quote! {
        #constructor #current_table #current_field #add_on #no_split #including #order #columns
    })
}

fn select_expr(select: &SelectSpec) -> TokenStream {
    let engine = engine();
    match select {
        SelectSpec::Columns(columns) => quote! { #engine::SelectDirective::columns(#columns)? },
        SelectSpec::FromValue => quote! { #engine::SelectDirective::from_value() },
    }
}

fn field_registrations(field: &FieldInfo, info: &CriteriaInfo) -> Result<Vec<TokenStream>> {
    let name = &field.name;
    let mut statements = Vec::new();

    for filter in &field.filters {
        let directive = filter_expr(filter);
        statements.push(quote! { registry = registry.filter(#name, #directive); });
    }
    for join in &field.joins {
        let directive = join_expr(join, info)?;
        statements.push(quote! { registry = registry.join(#name, #directive); });
    }
    if let Some(select) = &field.select {
        let directive = select_expr(select);
        statements.push(quote! { registry = registry.select(#name, #directive); });
    }

    Ok(statements)
}

/// Generate the `Criteria` implementation
pub fn generate_criteria_impl(
    name: &Ident,
    generics: &Generics,
    info: &CriteriaInfo,
) -> Result<TokenStream> {
    let engine = engine();
    let base = &info.base;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let with_table = match &info.table.name {
        Some(table) => quote! { .with_table(#table) },
        None => quote! {},
    };

    let mut registrations = Vec::new();
    for field in &info.fields {
        registrations.extend(field_registrations(field, info)?);
    }

    let value_arms: Vec<TokenStream> = info
        .exposed_fields()?
        .into_iter()
        .map(|field| {
            let field_name = &field.name;
            let ident = &field.ident;
            quote! {
                #field_name => #engine::ToFieldValue::to_field_value(&self.#ident).map(::core::option::Option::Some),
            }
        })
        .collect();

    Ok(quote! {
        impl #impl_generics #engine::Criteria for #name #ty_generics #where_clause {
            fn base(&self) -> &#engine::CriteriaBase {
                &self.#base
            }

            #[allow(unused_mut)]
            fn directives() -> #engine::QueryResult<#engine::DirectiveRegistry> {
                let mut registry = #engine::DirectiveRegistry::new() #with_table;
                #(#registrations)*
                ::core::result::Result::Ok(registry)
            }

            fn field_value(
                &self,
                field: &str,
            ) -> #engine::QueryResult<::core::option::Option<#engine::FieldValue>> {
                match field {
                    #(#value_arms)*
                    _ => ::core::result::Result::Ok(::core::option::Option::None),
                }
            }
        }
    })
}

/// Generate inherent helpers
pub fn generate_helper_impl(name: &Ident, generics: &Generics, info: &CriteriaInfo) -> TokenStream {
    let engine = engine();
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let table = match &info.table.name {
        Some(table) => quote! { ::core::option::Option::Some(#table) },
        None => quote! { ::core::option::Option::None },
    };

    quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            /// Primary table declared with `#[table(name = "...")]`
            pub const TABLE_NAME: ::core::option::Option<&'static str> = #table;

            /// Compile this criteria with default build options
            pub fn to_query(&self) -> #engine::QueryResult<#engine::Query>
            where
                Self: 'static,
            {
                #engine::QueryBuilder::new(self)?.build()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_criteria;
    use syn::DeriveInput;

    fn expand(input: DeriveInput) -> String {
        let info = parse_criteria(&input.data, &input.attrs).unwrap();
        generate_criteria_impl(&input.ident, &input.generics, &info)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_generated_registrations() {
        let input: DeriveInput = syn::parse_quote! {
            #[table(name = "Users")]
            struct UserCriteria {
                #[base]
                base: CriteriaBase,
                #[filter(compare = Like, format = formatters::like_starts_with)]
                name: Option<String>,
                #[join(kind = Left, table = "Roles", field = "UserId", columns = "Roles:Name", no_split)]
                with_roles: bool,
            }
        };
        let code = expand(input).replace(' ', "");

        assert!(code.contains(".with_table(\"Users\")"));
        assert!(code.contains("registry.filter(\"Name\","));
        assert!(code.contains("CompareKind::Like"));
        assert!(code.contains(".formatter(formatters::like_starts_with)"));
        assert!(code.contains("registry.join(\"WithRoles\","));
        assert!(code.contains(".no_split()"));
        assert!(code.contains(".select_columns(\"Roles:Name\")?"));
        assert!(code.contains("\"WithRoles\"=>"));
    }

    #[test]
    fn test_untagged_fields_are_not_exposed() {
        let input: DeriveInput = syn::parse_quote! {
            #[table(name = "Users")]
            struct UserCriteria {
                #[base]
                base: CriteriaBase,
                note: String,
            }
        };
        let code = expand(input).replace(' ', "");
        assert!(!code.contains("\"Note\"=>"));
    }
}

//! Procedural macros for declaring query criteria
//!
//! This crate provides the `#[criteria]` attribute and the `Criteria` derive,
//! which register a struct's filters, joins and extra selects at compile time.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod codegen;
mod criteria_macro;
mod parsing;

use codegen::{generate_criteria_impl, generate_helper_impl};
use criteria_macro::criteria_attribute;
use parsing::parse_criteria;

/// Derive macro for the `Criteria` trait
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Default, Criteria)]
/// #[table(name = "Users")]
/// pub struct UserCriteria {
///     #[base]
///     pub base: CriteriaBase,
///
///     #[filter(compare = Like)]
///     pub name: Option<String>,
///
///     #[filter(compare = GtEq, column = "Age")]
///     pub age_from: Option<i32>,
///
///     #[join(kind = Left, table = "Roles", field = "UserId", current_field = "Id")]
///     pub with_roles: bool,
///
///     #[many_to_many(kind = Left, table = "Tags", field = "Id", current_field = "Id",
///         bridge = "UserTags", bridge_current_field = "UserId", bridge_joined_field = "TagId")]
///     pub with_tags: bool,
///
///     #[add_select(columns = "Users:Email,Phone")]
///     pub with_contacts: bool,
/// }
/// ```
///
/// Field names are converted to PascalCase (`age_from` becomes `AgeFrom`)
/// unless the struct declares `#[table(rename_all = "none")]`.
#[proc_macro_derive(
    Criteria,
    attributes(table, base, filter, join, many_to_many, add_select)
)]
pub fn derive_criteria(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let info = match parse_criteria(&input.data, &input.attrs) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    let criteria_impl = match generate_criteria_impl(name, &input.generics, &info) {
        Ok(tokens) => tokens,
        Err(e) => return e.to_compile_error().into(),
    };
    let helper_impl = generate_helper_impl(name, &input.generics, &info);

    let expanded = quote::quote! {
        #criteria_impl
        #helper_impl
    };

    TokenStream::from(expanded)
}

/// Attribute macro that adds `Debug`, `Clone`, `Default` and the `Criteria` derive
#[proc_macro_attribute]
pub fn criteria(attr: TokenStream, item: TokenStream) -> TokenStream {
    criteria_attribute(attr, item)
}

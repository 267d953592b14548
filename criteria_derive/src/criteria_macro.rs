use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Error};

/// Convenience attribute macro that adds all necessary derives for a criteria type
///
/// Usage:
/// ```rust,ignore
/// use querysmith::prelude::*;
///
/// #[criteria]
/// #[table(name = "Users")]
/// pub struct UserCriteria {
///     #[base]
///     pub base: CriteriaBase,
///     #[filter]
///     pub id: Option<i64>,
/// }
/// ```
pub fn criteria_attribute(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let attrs = &input.attrs;
    let vis = &input.vis;
    let generics = &input.generics;
    let where_clause = &generics.where_clause;

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Error::new_spanned(name, "criteria can only be used on structs")
                .to_compile_error()
                .into()
        }
    };

    let expanded = quote! {
        #[derive(Debug, Clone, Default, ::querysmith::criteria_derive::Criteria)]
        #(#attrs)*
        #vis struct #name #generics #where_clause #fields
    };

    TokenStream::from(expanded)
}

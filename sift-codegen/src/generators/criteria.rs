//! Implementation of the `#[derive(Criteria)]` macro.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Path};

use super::attrs::{QueryField, parse_query_field, parse_struct_attrs};

/// Parse and generate code for the `#[derive(Criteria)]` macro.
pub fn derive_criteria_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Criteria derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Criteria derive only supports structs",
            ));
        }
    };

    let struct_attrs = parse_struct_attrs(input)?;
    let krate = &struct_attrs.krate;

    let query_fields: Vec<QueryField> = fields
        .iter()
        .map(parse_query_field)
        .filter_map(Result::transpose)
        .collect::<Result<_, _>>()?;

    let entries = query_fields.iter().map(|field| generate_entry(krate, field));
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #krate::Criteria for #name #ty_generics #where_clause {
            fn criteria_fields(
                &self,
            ) -> #krate::QueryResult<::std::vec::Vec<#krate::CriteriaField>> {
                ::std::result::Result::Ok(::std::vec![#(#entries),*])
            }
        }
    })
}

/// One `CriteriaField::new(...)` expression.
fn generate_entry(krate: &Path, field: &QueryField) -> TokenStream {
    let ident = &field.ident;
    let name = &field.name;
    let operator = &field.operator;

    let column = field.column.as_ref().map(|column| quote! { .column(#column) });
    let blurry = if field.blurry.is_empty() {
        None
    } else {
        let targets = &field.blurry;
        Some(quote! { .blurry([#(#targets),*]) })
    };

    quote! {
        #krate::CriteriaField::new(
            #krate::FieldSpec::new(#name, #krate::OperatorKind::#operator) #column #blurry,
            #krate::ToFilterValue::to_filter_value(&self.#ident),
        )
    }
}

//! Parsing of `#[criteria(...)]` and `#[query(...)]` attributes.

use proc_macro2::Span;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::parse::Parse;
use syn::{DeriveInput, Ident, LitStr, Meta, Path, Token};

/// Operator names accepted in `#[query(...)]`, with their `OperatorKind`
/// variant.
const OPERATORS: &[(&str, &str)] = &[
    ("equal", "Equal"),
    ("not_equal", "NotEqual"),
    ("greater_than", "GreaterThan"),
    ("less_than", "LessThan"),
    ("greater_or_equal", "GreaterOrEqual"),
    ("less_or_equal", "LessOrEqual"),
    ("between", "Between"),
    ("left_like", "LeftLike"),
    ("inner_like", "InnerLike"),
    ("right_like", "RightLike"),
    ("in", "In"),
    ("not_in", "NotIn"),
    ("is_null", "IsNull"),
    ("is_not_null", "IsNotNull"),
];

/// Struct-level `#[criteria(...)]` attributes.
#[derive(Debug)]
pub struct StructAttrs {
    /// Path to the runtime crate.
    pub krate: Path,
}

impl Default for StructAttrs {
    fn default() -> Self {
        Self {
            krate: syn::parse_quote!(::sift_query),
        }
    }
}

/// Parse struct-level `#[criteria(...)]` attributes.
pub fn parse_struct_attrs(input: &DeriveInput) -> Result<StructAttrs, syn::Error> {
    let mut attrs = StructAttrs::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("criteria") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.krate = value.parse()?;
                Ok(())
            } else {
                Err(meta.error("unsupported criteria attribute, expected `crate = \"...\"`"))
            }
        })?;
    }

    Ok(attrs)
}

/// A field carrying a `#[query]` attribute.
#[derive(Debug)]
pub struct QueryField {
    pub ident: Ident,
    /// Name handed to `FieldSpec::new`.
    pub name: String,
    /// `OperatorKind` variant.
    pub operator: Ident,
    pub column: Option<String>,
    pub blurry: Vec<String>,
}

/// Parse the `#[query(...)]` attribute of a field.
///
/// Returns `None` for fields without one.
pub fn parse_query_field(field: &syn::Field) -> Result<Option<QueryField>, syn::Error> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "Criteria fields must be named"))?;

    let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("query")) else {
        return Ok(None);
    };

    let mut operator: Option<Ident> = None;
    let mut column = None;
    let mut blurry = Vec::new();

    // A bare `#[query]` compares for equality.
    if !matches!(attr.meta, Meta::Path(_)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let value: LitStr = meta.value()?.parse()?;
                column = Some(value.value());
            } else if meta.path.is_ident("blurry") {
                blurry = parse_blurry(&meta)?;
            } else {
                let variant = operator_variant(&meta)?;
                if operator.replace(variant).is_some() {
                    return Err(meta.error("only one operator may be given per field"));
                }
            }
            Ok(())
        })?;
    }

    Ok(Some(QueryField {
        name: ident.unraw().to_string(),
        ident,
        operator: operator.unwrap_or_else(|| Ident::new("Equal", Span::call_site())),
        column,
        blurry,
    }))
}

fn operator_variant(meta: &ParseNestedMeta<'_>) -> Result<Ident, syn::Error> {
    let known = || OPERATORS.iter().map(|(snake, _)| *snake).collect::<Vec<_>>().join(", ");

    let ident = meta.path.get_ident().ok_or_else(|| {
        meta.error(format!("expected one of: {}, column, blurry", known()))
    })?;
    let name = ident.to_string();

    OPERATORS
        .iter()
        .find(|(snake, _)| *snake == name)
        .map(|(_, variant)| Ident::new(variant, ident.span()))
        .ok_or_else(|| meta.error(format!("unknown query operator `{}`, expected one of: {}", name, known())))
}

fn parse_blurry(meta: &ParseNestedMeta<'_>) -> Result<Vec<String>, syn::Error> {
    let content;
    syn::parenthesized!(content in meta.input);
    let targets: Vec<String> = content
        .parse_terminated(<LitStr as Parse>::parse, Token![,])?
        .into_iter()
        .map(|target| target.value())
        .collect();

    if targets.is_empty() {
        return Err(meta.error("blurry needs at least one column"));
    }
    Ok(targets)
}

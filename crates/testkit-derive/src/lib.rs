//! # testkit-derive
//!
//! Derive macro for mapping data records onto structs.
//!
//! ## Example
//!
//! ```rust,ignore
//! use testkit_derive::FromRecord;
//!
//! #[derive(FromRecord)]
//! struct User {
//!     id: i32,
//!     #[testkit(rename = "user_name")]
//!     name: String,
//!     email: Option<String>,
//! }
//! ```

#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Field, Fields, LitStr, parse_macro_input};

/// Derive macro for implementing `sql_testkit::FromRecord`.
///
/// Each field is read from the column of the same name (matched
/// case-insensitively) with strict typed access. `Option<T>` fields map
/// NULL to `None`.
///
/// ## Attributes
///
/// - `#[testkit(rename = "column_name")]` - Read the field from a different column
/// - `#[testkit(skip)]` - Skip this field (must have a Default implementation)
///
/// ## Example
///
/// ```rust,ignore
/// #[derive(FromRecord)]
/// struct User {
///     id: i32,
///     #[testkit(rename = "user_name")]
///     name: String,
///     #[testkit(skip)]
///     computed: String,
/// }
/// ```
#[proc_macro_derive(FromRecord, attributes(testkit))]
pub fn derive_from_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_from_record(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_from_record(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "FromRecord can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "FromRecord can only be derived for structs",
            ));
        }
    };

    let initializers = fields
        .iter()
        .map(field_initializer)
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        impl #impl_generics ::sql_testkit::FromRecord for #name #ty_generics #where_clause {
            fn from_record<__R: ::sql_testkit::DataRecord + ?::core::marker::Sized>(
                record: &__R,
            ) -> ::sql_testkit::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#initializers,)*
                })
            }
        }
    })
}

/// Options from `#[testkit(...)]` on a field.
#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    skip: bool,
}

fn parse_field_attrs(field: &Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("testkit")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let column: LitStr = meta.value()?.parse()?;
                attrs.rename = Some(column.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported testkit attribute, expected `rename` or `skip`"))
            }
        })?;
    }
    Ok(attrs)
}

fn field_initializer(field: &Field) -> syn::Result<TokenStream2> {
    let Some(ident) = &field.ident else {
        return Err(syn::Error::new_spanned(field, "expected a named field"));
    };
    let attrs = parse_field_attrs(field)?;

    if attrs.skip {
        if attrs.rename.is_some() {
            return Err(syn::Error::new_spanned(
                ident,
                "`skip` and `rename` cannot be combined",
            ));
        }
        return Ok(quote! { #ident: ::core::default::Default::default() });
    }

    let column = attrs
        .rename
        .unwrap_or_else(|| ident.unraw().to_string());
    Ok(quote! {
        #ident: ::sql_testkit::data_record::field_by_name(record, #column)?
    })
}

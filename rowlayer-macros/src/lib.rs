//! Procedural macros for the rowlayer project.
//!
//! This crate provides compile-time code generation for the rowlayer
//! framework, currently the `#[derive(Schema)]` macro that turns a plain
//! struct into a record schema.

#[allow(unused_extern_crates)]
extern crate self as rowlayer_macros;

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, GenericArgument, LitStr, PathArguments, Type, parse_macro_input};

/// Derives `rowlayer_core::record::Schema` for a named-field struct.
///
/// The table name defaults to the snake_case form of the struct name and can
/// be overridden with `#[record(table = "...")]`. Fields typed `Vec<T>` or
/// `Option<Vec<T>>` are registered as list fields so their string-serialized
/// column values parse back into sequences. The struct must carry an
/// `id: Option<i64>` field.
///
/// ```ignore
/// #[derive(Schema, Serialize, Deserialize, Clone, Debug)]
/// #[record(table = "members")]
/// struct TeamMember {
///     id: Option<i64>,
///     name: String,
///     roles: Vec<String>,
/// }
/// ```
#[proc_macro_derive(Schema, attributes(record))]
pub fn derive_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_schema(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

fn expand_schema(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;

    let mut table = snake_case(&ident.to_string());
    for attr in &input.attrs {
        if attr.path().is_ident("record") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    let name: LitStr = meta.value()?.parse()?;
                    table = name.value();
                    Ok(())
                } else {
                    Err(meta.error("unsupported record attribute"))
                }
            })?;
        }
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "Schema can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "Schema can only be derived for structs",
            ));
        }
    };

    let mut field_names = Vec::new();
    let mut list_fields = Vec::new();
    let mut has_id = false;
    for field in fields {
        let Some(name) = &field.ident else { continue };
        let name = name.to_string();
        if name == "id" {
            has_id = true;
        }
        if is_list_type(&field.ty) {
            list_fields.push(name.clone());
        }
        field_names.push(name);
    }

    if !has_id {
        return Err(syn::Error::new_spanned(
            ident,
            "Schema requires an `id: Option<i64>` field",
        ));
    }

    Ok(quote! {
        impl rowlayer_core::record::Schema for #ident {
            fn table_name() -> &'static str {
                #table
            }

            fn field_names() -> &'static [&'static str] {
                &[#(#field_names),*]
            }

            fn list_fields() -> &'static [&'static str] {
                &[#(#list_fields),*]
            }

            fn id(&self) -> Option<i64> {
                self.id
            }
        }
    })
}

/// Whether a field type is `Vec<T>` or `Option<Vec<T>>`.
fn is_list_type(ty: &Type) -> bool {
    let Type::Path(path) = ty else { return false };
    let Some(segment) = path.path.segments.last() else { return false };

    if segment.ident == "Vec" {
        return true;
    }
    if segment.ident == "Option" {
        if let PathArguments::AngleBracketed(args) = &segment.arguments {
            return args.args.iter().any(|arg| match arg {
                GenericArgument::Type(inner) => is_list_type(inner),
                _ => false,
            });
        }
    }
    false
}

/// Converts a type name like `TeamMember` to its table form `team_member`.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (index, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if index > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::snake_case;

    #[test]
    fn snake_case_type_names() {
        assert_eq!(snake_case("User"), "user");
        assert_eq!(snake_case("TeamMember"), "team_member");
        assert_eq!(snake_case("HTTPRoute"), "h_t_t_p_route");
    }
}

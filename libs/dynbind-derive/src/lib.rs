use std::collections::HashSet;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// Derive macro for binding a record to dynamic values.
///
/// Implements `dynbind::Typed` and `dynbind::Struct` for a struct with named
/// fields. The struct must implement `Default`; its default is the zero
/// value that absent fields are reset to.
///
/// Field attributes:
///
/// - `#[bind(name = "...")]`: external name (defaults to the field name).
/// - `#[bind(omit_empty)]`: drop the field when lowering a zero value.
/// - `#[bind(flatten)]`: promote the fields of an embedded record
///   (`R`, `Box<R>` or `Option<Box<R>>`) into this one.
/// - `#[bind(skip)]`: invisible to the engine.
///
/// A field of type `dynbind::Value` receives the whole value the record was
/// raised from.
///
/// # Example
///
/// ```ignore
/// #[derive(Typed, Default)]
/// pub struct Task {
///     #[bind(name = "task_key")]
///     pub key: String,
///
///     #[bind(omit_empty)]
///     pub retries: i64,
///
///     #[bind(flatten)]
///     pub common: Option<Box<Common>>,
/// }
/// ```
#[proc_macro_derive(Typed, attributes(bind))]
pub fn derive_typed(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;
    let name_str = name.to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Typed does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Typed only supports structs with named fields",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Typed only supports structs")),
    };

    let mut field_info_tokens: Vec<TokenStream2> = Vec::new();
    let mut field_ref_arms: Vec<TokenStream2> = Vec::new();
    let mut field_mut_arms: Vec<TokenStream2> = Vec::new();
    let mut seen_names = HashSet::new();
    let mut index = 0usize;

    for field in fields {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;
        let ident_str = field_name.to_string();
        let field_ty = &field.ty;

        // Parse #[bind(...)] attribute.
        let mut external: Option<String> = None;
        let mut omit_empty = false;
        let mut flatten = false;
        let mut skip = false;

        for attr in &field.attrs {
            if !attr.path().is_ident("bind") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    external = Some(value.value());
                } else if meta.path.is_ident("omit_empty") {
                    omit_empty = true;
                } else if meta.path.is_ident("flatten") {
                    flatten = true;
                } else if meta.path.is_ident("skip") {
                    skip = true;
                } else {
                    return Err(meta.error(
                        "unknown bind attribute (expected name, omit_empty, flatten or skip)",
                    ));
                }
                Ok(())
            })?;
        }

        if skip {
            continue;
        }
        if flatten && (external.is_some() || omit_empty) {
            return Err(syn::Error::new_spanned(
                field_name,
                "#[bind(flatten)] cannot be combined with name or omit_empty",
            ));
        }

        let external = external.unwrap_or_else(|| ident_str.clone());
        if !flatten && !seen_names.insert(external.clone()) {
            return Err(syn::Error::new_spanned(
                field_name,
                format!("duplicate field name '{external}'"),
            ));
        }

        field_info_tokens.push(quote! {
            ::dynbind::reflect::FieldInfo {
                ident: #ident_str,
                name: #external,
                omit_empty: #omit_empty,
                flatten: #flatten,
                ty: <#field_ty as ::dynbind::reflect::Typed>::type_info,
            }
        });
        field_ref_arms.push(quote! {
            #index => ::core::option::Option::Some(&self.#field_name as &dyn ::dynbind::reflect::Typed),
        });
        field_mut_arms.push(quote! {
            #index => ::core::option::Option::Some(&mut self.#field_name as &mut dyn ::dynbind::reflect::Typed),
        });
        index += 1;
    }

    let expanded = quote! {
        const _: () = {
            static INFO: ::dynbind::reflect::StructInfo = ::dynbind::reflect::StructInfo {
                name: #name_str,
                fields: &[
                    #(#field_info_tokens),*
                ],
            };

            impl ::dynbind::reflect::Typed for #name {
                fn type_info() -> ::dynbind::reflect::TypeInfo {
                    ::dynbind::reflect::TypeInfo::Struct(
                        ::dynbind::reflect::StructType::of::<#name>(&INFO),
                    )
                }

                fn reflect(&self) -> ::dynbind::reflect::TypedRef<'_> {
                    ::dynbind::reflect::TypedRef::Struct(self)
                }

                fn reflect_mut(&mut self) -> ::dynbind::reflect::TypedMut<'_> {
                    ::dynbind::reflect::TypedMut::Struct(self)
                }
            }

            impl ::dynbind::reflect::Struct for #name {
                fn struct_type(&self) -> ::dynbind::reflect::StructType {
                    ::dynbind::reflect::StructType::of::<#name>(&INFO)
                }

                fn field(&self, index: usize) -> ::core::option::Option<&dyn ::dynbind::reflect::Typed> {
                    match index {
                        #(#field_ref_arms)*
                        _ => ::core::option::Option::None,
                    }
                }

                fn field_mut(&mut self, index: usize) -> ::core::option::Option<&mut dyn ::dynbind::reflect::Typed> {
                    match index {
                        #(#field_mut_arms)*
                        _ => ::core::option::Option::None,
                    }
                }

                fn zero(&mut self) {
                    *self = <#name as ::core::default::Default>::default();
                }
            }
        };
    };

    Ok(TokenStream::from(expanded))
}

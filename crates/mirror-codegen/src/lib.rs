// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use std::collections::BTreeSet;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DataEnum, DeriveInput, Fields, Ident, LitInt, LitStr,
    Visibility,
};

/// Accessibility level selected for a field
#[derive(Clone, Copy)]
enum Access {
    Public,
    Protected,
    Private,
}

impl Access {
    fn from_visibility(vis: &Visibility) -> Self {
        match vis {
            Visibility::Public(_) => Self::Public,
            Visibility::Restricted(_) => Self::Protected,
            Visibility::Inherited => Self::Private,
        }
    }

    fn tokens(self) -> TokenStream2 {
        match self {
            Self::Public => quote!(::mirror::Accessibility::Public),
            Self::Protected => quote!(::mirror::Accessibility::Protected),
            Self::Private => quote!(::mirror::Accessibility::Private),
        }
    }
}

/// `#[reflect(...)]` on the type itself
#[derive(Default)]
struct TypeOptions {
    name: Option<String>,
    description: Option<String>,
}

/// `#[reflect(...)]` on one field
#[derive(Default)]
struct FieldOptions {
    index: Option<u32>,
    name: Option<String>,
    description: Option<String>,
    access: Option<Access>,
    flags: Option<u32>,
    base: Option<u32>,
    skip: bool,
    opaque: bool,
    anonymous: bool,
}

/// `#[derive(Reflect)]` macro: generates the `mirror::Reflect` registration function
///
/// Supports:
/// - Structs with named fields: every field becomes a property, in order
/// - Field-less enums: registered as named scalar types without properties
///
/// Field defaults: index = lowest index not taken by an explicit `index`
/// and not given to an earlier field, name = field name, accessibility from visibility (`pub` -> Public, `pub(..)` ->
/// Protected, private -> Private).
///
/// Example:
/// ```ignore
/// use mirror::Reflect;
///
/// #[derive(Reflect)]
/// #[reflect(name = "Frame", description = "Video frame header")]
/// struct Frame {
///     #[reflect(base = 0)]
///     header: Header,
///     pub width: u16,
///     #[reflect(index = 10, access = "protected", flags = 4)]
///     height: u16,
///     #[reflect(opaque)]
///     handle: std::fs::File,
///     #[reflect(skip)]
///     cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Reflect cannot be derived for generic types, implement it by hand",
        ));
    }

    let name = &input.ident;
    let options = parse_type_options(&input.attrs)?;
    let header = declare_tokens(&options);

    match &input.data {
        Data::Struct(data) => {
            let Fields::Named(fields) = &data.fields else {
                return Err(syn::Error::new_spanned(
                    &data.fields,
                    "Only named fields are supported",
                ));
            };

            let mut parsed = Vec::new();
            for field in &fields.named {
                let Some(field_name) = field.ident.as_ref() else {
                    return Err(syn::Error::new_spanned(field, "Field must have a name"));
                };
                let opts = parse_field_options(&field.attrs)?;
                if !opts.skip {
                    parsed.push((field, field_name, opts));
                }
            }

            let mut explicit = BTreeSet::new();
            for (field, _, opts) in &parsed {
                if let (None, Some(index)) = (opts.base, opts.index) {
                    if !explicit.insert(index) {
                        return Err(syn::Error::new_spanned(
                            field,
                            format!("index {} is used by another field", index),
                        ));
                    }
                }
            }

            let mut registrations = Vec::new();
            let mut next = 0u32;
            for (field, field_name, opts) in &parsed {
                if let Some(base) = opts.base {
                    registrations.push(quote! {
                        mirror.base_class(#base, ::mirror::member!(#name, #field_name))?;
                    });
                    continue;
                }

                let index = match opts.index {
                    Some(index) => index,
                    None => {
                        while explicit.contains(&next) {
                            next += 1;
                        }
                        let index = next;
                        next += 1;
                        index
                    }
                };
                registrations.push(property_tokens(name, field_name, &field.vis, index, opts));
            }

            Ok(quote! {
                impl ::mirror::Reflect for #name {
                    #[allow(unused_variables)]
                    fn reflect(mirror: &mut ::mirror::Mirror<'_, Self>) -> ::mirror::Result<()> {
                        #header
                        #(#registrations)*
                        Ok(())
                    }
                }
            })
        }
        Data::Enum(data) => {
            check_fieldless(data)?;
            Ok(quote! {
                impl ::mirror::Reflect for #name {
                    const FLAGS: ::mirror::TypeFlags = ::mirror::TypeFlags::ENUMERATION;

                    #[allow(unused_variables)]
                    fn reflect(mirror: &mut ::mirror::Mirror<'_, Self>) -> ::mirror::Result<()> {
                        #header
                        Ok(())
                    }
                }
            })
        }
        Data::Union(data) => Err(syn::Error::new_spanned(
            data.union_token,
            "Unions are not supported",
        )),
    }
}

fn declare_tokens(options: &TypeOptions) -> TokenStream2 {
    let declare = options.name.as_ref().map(|type_name| {
        quote! { mirror.declare(#type_name)?; }
    });
    let describe = options.description.as_ref().map(|description| {
        quote! { mirror.describe(#description); }
    });
    quote! { #declare #describe }
}

fn property_tokens(
    owner: &Ident,
    field: &Ident,
    vis: &Visibility,
    index: u32,
    opts: &FieldOptions,
) -> TokenStream2 {
    let start = if opts.opaque {
        quote!(mirror.opaque(::mirror::member!(#owner, #field), #index))
    } else {
        quote!(mirror.property(::mirror::member!(#owner, #field), #index))
    };

    let name = if opts.anonymous {
        None
    } else {
        let property_name = opts.name.clone().unwrap_or_else(|| field.to_string());
        Some(quote!(.name(#property_name)))
    };
    let description = opts
        .description
        .as_ref()
        .map(|description| quote!(.description(#description)));
    let access = opts
        .access
        .unwrap_or_else(|| Access::from_visibility(vis))
        .tokens();
    let flags = opts.flags.map(|flags| quote!(.custom_flags(#flags)));

    quote! {
        #start
            #name
            #description
            .accessibility(#access)
            #flags
            .register()?;
    }
}

fn check_fieldless(data: &DataEnum) -> syn::Result<()> {
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Only field-less enums are supported",
            ));
        }
    }
    Ok(())
}

fn parse_type_options(attrs: &[Attribute]) -> syn::Result<TypeOptions> {
    let mut options = TypeOptions::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                options.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("description") {
                options.description = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error("expected `name` or `description`"));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

fn parse_field_options(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("index") {
                options.index = Some(meta.value()?.parse::<LitInt>()?.base10_parse()?);
            } else if meta.path.is_ident("name") {
                options.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("description") {
                options.description = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("access") {
                let lit = meta.value()?.parse::<LitStr>()?;
                options.access = Some(match lit.value().as_str() {
                    "public" => Access::Public,
                    "protected" => Access::Protected,
                    "private" => Access::Private,
                    _ => {
                        return Err(syn::Error::new_spanned(
                            lit,
                            "expected \"public\", \"protected\" or \"private\"",
                        ))
                    }
                });
            } else if meta.path.is_ident("flags") {
                options.flags = Some(meta.value()?.parse::<LitInt>()?.base10_parse()?);
            } else if meta.path.is_ident("base") {
                options.base = Some(meta.value()?.parse::<LitInt>()?.base10_parse()?);
            } else if meta.path.is_ident("skip") {
                options.skip = true;
            } else if meta.path.is_ident("opaque") {
                options.opaque = true;
            } else if meta.path.is_ident("anonymous") {
                options.anonymous = true;
            } else {
                return Err(meta.error("unsupported reflect attribute"));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

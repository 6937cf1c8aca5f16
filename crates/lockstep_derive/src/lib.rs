use std::collections::HashSet;

use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Field, Fields, LitStr, Type, parse_macro_input};

/// Generates a lens per named field plus a `<Record>Fields` accessor struct.
///
/// `#[edit(key = "...")]` on a field overrides the field id, which defaults
/// to the field name. Ids must be unique within a record.
#[proc_macro_derive(EditableRecord, attributes(edit))]
pub fn derive_editable_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

struct RecordField {
    ident: Ident,
    ty: Type,
    key: LitStr,
    lens: Ident,
}

impl RecordField {
    fn parse(record: &Ident, field: &Field) -> syn::Result<Self> {
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let mut key = LitStr::new(&ident.to_string(), ident.span());
        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("edit")) {
            attr.parse_nested_meta(|meta| {
                if !meta.path.is_ident("key") {
                    return Err(meta.error("unsupported edit attribute, expected `key`"));
                }
                key = meta.value()?.parse()?;
                Ok(())
            })?;
        }
        let lens = format_ident!("{record}{}Lens", camel_case(&ident.to_string()));
        Ok(Self {
            ty: field.ty.clone(),
            ident,
            key,
            lens,
        })
    }

    fn lens_impl(&self, root: &TokenStream2, record: &Ident) -> TokenStream2 {
        let Self {
            ident,
            ty,
            key,
            lens,
        } = self;
        quote! {
            #[derive(Clone, Copy, Debug)]
            pub struct #lens;

            impl #root::edit::FieldLens<#record> for #lens {
                type Value = #ty;

                fn key(self) -> #root::edit::FieldId {
                    #root::edit::FieldId::from(#key)
                }

                fn get<'a>(self, record: &'a #record) -> &'a #ty {
                    &record.#ident
                }

                fn set(self, record: &mut #record, value: #ty) {
                    record.#ident = value;
                }
            }
        }
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "EditableRecord cannot be derived for generic records",
        ));
    }
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "EditableRecord can only be derived for structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &data.fields,
            "EditableRecord requires named fields",
        ));
    };

    let record = &input.ident;
    let fields = named
        .named
        .iter()
        .map(|field| RecordField::parse(record, field))
        .collect::<syn::Result<Vec<_>>>()?;

    let mut seen = HashSet::new();
    for field in &fields {
        if !seen.insert(field.key.value()) {
            return Err(syn::Error::new_spanned(
                &field.key,
                format!("duplicate field id `{}`", field.key.value()),
            ));
        }
    }

    let root = lockstep_path();
    let accessor_struct = format_ident!("{record}Fields");
    let lens_impls = fields.iter().map(|field| field.lens_impl(&root, record));
    let accessors = fields.iter().map(|RecordField { ident, lens, .. }| {
        quote! {
            pub const fn #ident(&self) -> #lens {
                #lens
            }
        }
    });

    Ok(quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #accessor_struct;

        impl #accessor_struct {
            #(#accessors)*
        }

        impl #root::edit::EditableRecord for #record {
            type Fields = #accessor_struct;

            fn fields() -> Self::Fields {
                #accessor_struct
            }
        }

        #(#lens_impls)*
    })
}

fn lockstep_path() -> TokenStream2 {
    match crate_name("lockstep") {
        Ok(FoundCrate::Itself) => quote!(crate),
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Err(_) => quote!(::lockstep),
    }
}

fn camel_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .flat_map(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase())
                .into_iter()
                .chain(chars)
        })
        .collect()
}

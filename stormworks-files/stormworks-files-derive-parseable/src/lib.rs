extern crate proc_macro2;

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::{Span, TokenStream};
use quote::{quote, quote_spanned};
use syn::{Data, DeriveInput, Fields, FieldsNamed, Ident, parse_macro_input, spanned::Spanned};

/// Reads every named field in declaration order through its `Parseable` impl.
#[proc_macro_derive(Parse)]
pub fn derive_parseable(item: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    derive_parse_internal(input).into()
}

/// Writes every named field in declaration order through its `Emit` impl.
#[proc_macro_derive(Emit)]
pub fn derive_emit(item: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    derive_emit_internal(input).into()
}

fn files_crate() -> TokenStream {
    let found_crate = crate_name("stormworks-files").expect("stormworks-files is present in `Cargo.toml`");

    match found_crate {
        FoundCrate::Itself => quote!(crate),
        FoundCrate::Name(name) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(#ident)
        }
    }
}

fn named_fields<'a>(ident: &Ident, data: &'a Data, derive: &str) -> &'a FieldsNamed {
    match data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(fields) => fields,
            _ => panic!(
                "`#[derive({})]` only supports named struct fields at the moment: {}",
                derive, ident
            ),
        },
        _ => panic!("`#[derive({})]` is only available on structs: {}", derive, ident),
    }
}

// taken from sharnoff/derive-syn-parse: put it into a separate function for testability
pub(crate) fn derive_parse_internal(input: DeriveInput) -> TokenStream {
    let crate_name = files_crate();
    let ident = input.ident;
    let fields = named_fields(&ident, &input.data, "Parse");

    let recurse = fields.named.iter().map(|f| {
        let name = &f.ident;
        let ftype = &f.ty;
        // The qualified path also covers array and generic field types, e.g. `[f32; 9]`.
        quote_spanned! {f.span()=>
            #name: <#ftype as #crate_name::common::reader::Parseable<#ftype>>::parse(rdr)?,
        }
    });

    quote!(
        impl #crate_name::common::reader::Parseable<#ident> for #ident {
            fn parse(
                rdr: &mut #crate_name::common::reader::ByteReader<'_>,
            ) -> Result<#ident, #crate_name::CodecError> {
                Ok(#ident {
                    #(#recurse)*
                })
            }
        }
    )
}

pub(crate) fn derive_emit_internal(input: DeriveInput) -> TokenStream {
    let crate_name = files_crate();
    let ident = input.ident;
    let fields = named_fields(&ident, &input.data, "Emit");

    let recurse = fields.named.iter().map(|f| {
        let name = &f.ident;
        quote_spanned! {f.span()=>
            #crate_name::common::writer::Emit::emit(&self.#name, w);
        }
    });

    quote!(
        impl #crate_name::common::writer::Emit for #ident {
            fn emit(&self, w: &mut #crate_name::common::writer::ByteWriter) {
                #(#recurse)*
            }
        }
    )
}

//! Model derive macro implementation

mod attrs;

use attrs::get_model_attr;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Result};

/// `MyModel` -> `my_model`, with an underscore before every later uppercase letter.
fn table_name_for(type_name: &str) -> String {
    let mut out = String::with_capacity(type_name.len() + 4);
    for (i, ch) in type_name.chars().enumerate() {
        if i > 0 && ch.is_uppercase() {
            out.push('_');
        }
        out.extend(ch.to_lowercase());
    }
    out
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    if let Data::Union(_) = &input.data {
        return Err(syn::Error::new_spanned(
            &input,
            "Model cannot be derived for unions",
        ));
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let attr = get_model_attr(&input)?;

    // Same translation `tinyorm::default_table_name` applies at runtime.
    let table = attr
        .table
        .unwrap_or_else(|| table_name_for(&name.to_string()));

    let primary_key = attr.primary_key.map(|pk| {
        quote! { const PRIMARY_KEY: &'static str = #pk; }
    });

    let defaults = attr.defaults.map(|path| {
        quote! {
            fn defaults() -> ::tinyorm::Defaults {
                #path()
            }
        }
    });

    let hooks = (!attr.hooks).then(|| {
        quote! {
            impl #impl_generics ::tinyorm::ModelHooks for #name #ty_generics #where_clause {}
        }
    });

    Ok(quote! {
        impl #impl_generics ::tinyorm::Model for #name #ty_generics #where_clause {
            const TABLE: ::core::option::Option<&'static str> =
                ::core::option::Option::Some(#table);
            #primary_key
            #defaults
        }

        #hooks
    })
}

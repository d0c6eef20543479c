//! Attribute parsing for the Model derive macro.
//!
//! Handles the struct-level `#[orm(...)]` attribute.

use crate::sql_ident::parse_sql_ident;
use syn::{DeriveInput, Result};

/// Parsed `#[orm(table = "..", primary_key = "..", defaults = path, hooks)]`.
#[derive(Default)]
pub(super) struct ModelAttr {
    pub table: Option<String>,
    pub primary_key: Option<String>,
    pub defaults: Option<syn::Path>,
    pub hooks: bool,
}

impl ModelAttr {
    fn merge(&mut self, other: ModelAttr, origin: &syn::Attribute) -> Result<()> {
        fn set<T>(
            slot: &mut Option<T>,
            value: Option<T>,
            key: &str,
            origin: &syn::Attribute,
        ) -> Result<()> {
            if let Some(value) = value {
                if slot.is_some() {
                    return Err(syn::Error::new_spanned(
                        origin,
                        format!("duplicate `{key}` in #[orm(...)]"),
                    ));
                }
                *slot = Some(value);
            }
            Ok(())
        }

        set(&mut self.table, other.table, "table", origin)?;
        set(&mut self.primary_key, other.primary_key, "primary_key", origin)?;
        set(&mut self.defaults, other.defaults, "defaults", origin)?;
        self.hooks |= other.hooks;
        Ok(())
    }
}

impl syn::parse::Parse for ModelAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = ModelAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;

            if ident == "hooks" {
                attr.hooks = true;
            } else {
                let _: syn::Token![=] = input.parse()?;
                if ident == "table" {
                    let lit: syn::LitStr = input.parse()?;
                    attr.table = Some(parse_sql_ident(&lit, "table")?);
                } else if ident == "primary_key" {
                    let lit: syn::LitStr = input.parse()?;
                    attr.primary_key = Some(parse_sql_ident(&lit, "primary_key")?);
                } else if ident == "defaults" {
                    attr.defaults = Some(input.parse()?);
                } else {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!(
                            "unknown orm attribute `{ident}` (expected table, primary_key, defaults or hooks)"
                        ),
                    ));
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `,`"));
        }
        Ok(attr)
    }
}

/// Collect every struct-level `#[orm(...)]` attribute.
pub(super) fn get_model_attr(input: &DeriveInput) -> Result<ModelAttr> {
    let mut merged = ModelAttr::default();
    for attr in &input.attrs {
        if attr.path().is_ident("orm") {
            let parsed: ModelAttr = attr.parse_args()?;
            merged.merge(parsed, attr)?;
        }
    }
    Ok(merged)
}

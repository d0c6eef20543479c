//! Derive macros for tinyorm
//!
//! Provides `#[derive(Model)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod model;
mod sql_ident;

/// Derive `tinyorm::Model` (and, unless `hooks` is given, an empty
/// `tinyorm::ModelHooks`) for a marker type.
///
/// # Example
///
/// ```ignore
/// use tinyorm::{Defaults, Model};
///
/// #[derive(Model)]
/// #[orm(table = "users", primary_key = "user_id", defaults = user_defaults)]
/// struct User;
///
/// fn user_defaults() -> Defaults {
///     Defaults::new().value("name", "John Doe")
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Table name (default: snake_case of the type name)
/// - `#[orm(primary_key = "col")]` - Primary key column (default: `id`)
/// - `#[orm(defaults = path)]` - A `fn() -> tinyorm::Defaults`
/// - `#[orm(hooks)]` - The type implements `ModelHooks` by hand
#[proc_macro_derive(Model, attributes(orm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

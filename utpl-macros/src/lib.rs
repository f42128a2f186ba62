mod assets;
mod attrs;

use proc_macro::TokenStream;

/// Embeds every file matching a glob pattern (relative to the crate root) and
/// registers them into `utpl::template_manager::TEMPLATES` at startup.
///
/// ```ignore
/// utpl::template_assets!("templates/**/*.tpl");
/// ```
#[proc_macro]
pub fn template_assets(input: TokenStream) -> TokenStream {
    assets::template_assets_impl(input)
}

/// Exposes struct fields, and optionally zero-argument methods, to dotted
/// lookups such as `{{ user.name }}` or `{{ user.display_name }}`.
///
/// ```ignore
/// #[derive(Debug, Clone, Attrs)]
/// #[attrs(methods(display_name))]
/// struct User {
///     #[attr("login")]
///     name: String,
///     #[attr(ignore)]
///     password: String,
/// }
/// ```
#[proc_macro_derive(Attrs, attributes(attr, attrs))]
pub fn derive_attrs(input: TokenStream) -> TokenStream {
    attrs::derive_attrs_impl(input)
}

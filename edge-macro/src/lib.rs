mod process_js;

use proc_macro::TokenStream;

/// Derives `rquickjs::FromJs` for a struct with named fields, reading each
/// field from the property of the same name.
///
/// Field attributes: `#[js(rename = "name")]`, `#[js(default)]`.
#[proc_macro_derive(FromJs, attributes(js))]
pub fn derive_from_js(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);
    process_js::process_from_js(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derives `rquickjs::IntoJs` for a struct with named fields, producing a
/// plain object.
#[proc_macro_derive(IntoJs, attributes(js))]
pub fn derive_into_js(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);
    process_js::process_into_js(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

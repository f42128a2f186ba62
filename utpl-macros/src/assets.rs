use glob::glob;
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use std::collections::hash_map::DefaultHasher;
use std::env;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use syn::{LitStr, parse_macro_input};

pub fn template_assets_impl(input: TokenStream) -> TokenStream {
    let pattern = parse_macro_input!(input as LitStr);
    let pattern_str = pattern.value();

    // Relative patterns are resolved against the crate being compiled.
    let root = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            return syn::Error::new(pattern.span(), "CARGO_MANIFEST_DIR is not set")
                .to_compile_error()
                .into();
        }
    };
    let full_pattern = root.join(&pattern_str);
    let full_pattern_str = full_pattern.to_string_lossy();

    let files: Vec<String> = match glob(&full_pattern_str) {
        Ok(paths) => paths
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .map(|path| path.to_string_lossy().to_string())
            .collect(),
        Err(e) => {
            return syn::Error::new(pattern.span(), format!("Invalid glob pattern: {}", e))
                .to_compile_error()
                .into();
        }
    };

    // `include_str!` embeds the contents and makes cargo rebuild when they change.
    let assets: Vec<_> = files
        .iter()
        .map(|f| {
            quote! {
                (#f, include_str!(#f))
            }
        })
        .collect();

    // One registration function per pattern, so the macro can be used more than once in a scope.
    let mut hasher = DefaultHasher::new();
    pattern_str.hash(&mut hasher);
    let fn_name = format_ident!("__utpl_auto_register_templates_{}", hasher.finish());

    let output = quote! {
        #[utpl::ctor::ctor]
        fn #fn_name() {
            let assets = vec![
                #(#assets),*
            ];

            if let Err(e) = utpl::template_manager::TEMPLATES.load_assets(assets) {
                utpl::log::error!("Failed to register embedded templates: {}", e);
            }
        }
    };

    output.into()
}

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{DeriveInput, Ident, LitStr, parse_macro_input};

pub fn derive_attrs_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(name, "Attrs only supports structs with named fields")
                    .to_compile_error()
                    .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "Attrs only supports structs")
                .to_compile_error()
                .into();
        }
    };

    let methods = match parse_methods(&input.attrs) {
        Ok(methods) => methods,
        Err(e) => return e.to_compile_error().into(),
    };

    let mut field_arms = Vec::new();
    for f in fields {
        let Some(field_name) = f.ident.as_ref() else {
            continue;
        };
        let (key, ignore) = match parse_field_attrs(f, field_name) {
            Ok(parsed) => parsed,
            Err(e) => return e.to_compile_error().into(),
        };
        if ignore {
            continue;
        }
        let key_lit = LitStr::new(&key, Span::call_site());
        field_arms.push(quote! {
            #key_lit => ::std::option::Option::Some(
                utpl::value::ToValue::to_value(&self.#field_name)
            ),
        });
    }

    // Methods are bound to a clone of `self`; dotted lookups call them with no arguments.
    let method_arms = methods.iter().map(|method| {
        let key_lit = LitStr::new(&method.to_string(), Span::call_site());
        quote! {
            #key_lit => {
                let this = ::std::clone::Clone::clone(self);
                ::std::option::Option::Some(utpl::value::Value::method(#key_lit, move || {
                    ::std::result::Result::Ok(utpl::value::ToValue::to_value(&this.#method()))
                }))
            }
        }
    });

    TokenStream::from(quote! {
        impl #impl_generics utpl::value::Object for #name #ty_generics #where_clause {
            fn get_attr(&self, name: &str) -> ::std::option::Option<utpl::value::Value> {
                match name {
                    #(#field_arms)*
                    #(#method_arms)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl #impl_generics utpl::value::ToValue for #name #ty_generics #where_clause {
            fn to_value(&self) -> utpl::value::Value {
                utpl::value::Value::Object(::std::sync::Arc::new(::std::clone::Clone::clone(self)))
            }
        }
    })
}

/// Reads `#[attrs(methods(a, b))]` from the struct.
fn parse_methods(attrs: &[syn::Attribute]) -> syn::Result<Vec<Ident>> {
    let mut methods = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("attrs") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("methods") {
                meta.parse_nested_meta(|method| {
                    let ident = method
                        .path
                        .get_ident()
                        .cloned()
                        .ok_or_else(|| method.error("expected a method name"))?;
                    methods.push(ident);
                    Ok(())
                })
            } else {
                Err(meta.error("unsupported attrs option, expected `methods(...)`"))
            }
        })?;
    }
    Ok(methods)
}

/// Reads `#[attr("name")]`, `#[attr(rename = "name")]` or `#[attr(ignore)]` from a field.
fn parse_field_attrs(field: &syn::Field, ident: &Ident) -> syn::Result<(String, bool)> {
    let mut name = ident.to_string();
    let mut ignore = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("attr") {
            continue;
        }
        if let Ok(s) = attr.parse_args::<LitStr>() {
            name = s.value();
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("ignore") {
                ignore = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                let s: LitStr = meta.value()?.parse()?;
                name = s.value();
                Ok(())
            } else {
                Err(meta.error("unsupported attr option, expected `rename` or `ignore`"))
            }
        })?;
    }
    Ok((name, ignore))
}

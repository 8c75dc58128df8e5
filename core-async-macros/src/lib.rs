//! Attribute macros that turn an `async fn` into a test or entry point driven
//! by `core_async::runtime`, so downstream crates never name Tokio directly.
//!
//! ```ignore
//! #[core_async::test]
//! async fn runs_on_one_thread() {}
//!
//! #[core_async::test(multi_thread)]
//! async fn runs_across_workers() {}
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Ident, ItemFn};

const MULTI_THREAD_WORKERS: usize = 4;

#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, MacroKind::Test)
}

#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, MacroKind::Main)
}

enum MacroKind {
    Test,
    Main,
}

enum Flavor {
    CurrentThread,
    MultiThread,
}

fn parse_flavor(attr: TokenStream) -> syn::Result<Flavor> {
    if attr.is_empty() {
        return Ok(Flavor::CurrentThread);
    }

    let tokens = TokenStream2::from(attr);
    let ident: Ident = syn::parse2(tokens.clone()).map_err(|_| {
        syn::Error::new_spanned(
            &tokens,
            "core_async attribute macros accept only `multi_thread` or `current_thread`",
        )
    })?;

    match ident.to_string().as_str() {
        "current_thread" => Ok(Flavor::CurrentThread),
        "multi_thread" => Ok(Flavor::MultiThread),
        other => Err(syn::Error::new_spanned(
            ident,
            format!("unknown runtime flavor `{other}`, expected `multi_thread` or `current_thread`"),
        )),
    }
}

fn expand(attr: TokenStream, item: TokenStream, kind: MacroKind) -> TokenStream {
    let flavor = match parse_flavor(attr) {
        Ok(flavor) => flavor,
        Err(err) => return err.to_compile_error().into(),
    };

    let input = parse_macro_input!(item as ItemFn);

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            input.sig.fn_token,
            "core_async attribute macros require `async fn`",
        )
        .to_compile_error()
        .into();
    }

    let mut sync_sig = input.sig.clone();
    sync_sig.asyncness = None;

    let attrs = input.attrs;
    let vis = input.vis;
    let block = input.block;

    let driver = match flavor {
        Flavor::CurrentThread => quote! {
            core_async::runtime::block_on(async move #block)
        },
        Flavor::MultiThread => quote! {
            core_async::runtime::block_on_multi_thread(#MULTI_THREAD_WORKERS, async move #block)
        },
    };

    let test_attr = match kind {
        MacroKind::Test => quote!(#[test]),
        MacroKind::Main => quote!(),
    };

    quote! {
        #(#attrs)*
        #test_attr
        #vis #sync_sig {
            #driver
        }
    }
    .into()
}

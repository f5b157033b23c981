use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg};

/// Shorthand to print nice errors.
macro_rules! error {
    ($tokens:expr, $($msg:expr),+ $(,)?) => {{
        let error = syn::Error::new(syn::spanned::Spanned::span(&$tokens), format!($($msg),+));
        return error.to_compile_error().into();
    }};
}

/// Defines an end-to-end test that injects test accounts through parameters.
///
/// For more information see [`crate::test`].
pub(crate) fn test(_attr: TokenStream, input: TokenStream) -> TokenStream {
    let item_fn = parse_macro_input!(input as syn::ItemFn);
    let attrs = &item_fn.attrs;
    let sig = &item_fn.sig;
    let fn_name = &sig.ident;
    let fn_return_type = &sig.output;
    let fn_block = &item_fn.block;
    let fn_args = &sig.inputs;

    if sig.asyncness.is_none() {
        error!(sig.fn_token, "end-to-end tests must be async");
    }
    if matches!(fn_return_type, syn::ReturnType::Default) {
        error!(sig, "end-to-end tests must return a `Result`");
    }

    let mut account_declarations = Vec::with_capacity(fn_args.len());
    for arg in fn_args {
        let FnArg::Typed(arg) = arg else {
            error!(arg, "unexpected receiver argument in test signature");
        };
        let account_binding = &arg.pat;
        let account_ty = &arg.ty;
        account_declarations.push(quote! {
            let #account_binding = <#account_ty>::new(&__e2e_chain)?;
        });
    }

    quote! {
        #( #attrs )*
        #[tokio::test]
        async fn #fn_name() #fn_return_type {
            let __e2e_chain = ::e2e::Chain::spawn()?;
            #( #account_declarations )*
            #fn_block
        }
    }
    .into()
}

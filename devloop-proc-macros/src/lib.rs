use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::parse_macro_input;
use syn::Token;

/// Checks a string literal against a `fancy_regex` pattern at compile time.
///
/// Expands to the given expression if the literal matches. Otherwise compilation fails with an
/// error pointing at the literal, worded with the given description of what was expected.
///
/// ```
/// let image = devloop_proc_macros::verify_literal!(
///     "redis",
///     "^[a-z0-9]+$",
///     "an image name",
///     String::from("redis")
/// );
/// assert_eq!(image, "redis");
/// ```
///
/// ```compile_fail
/// devloop_proc_macros::verify_literal!("Redis", "^[a-z0-9]+$", "an image name", ());
/// ```
#[proc_macro]
pub fn verify_literal(input: TokenStream) -> TokenStream {
    let VerifyLiteralInput {
        value,
        pattern,
        description,
        expression,
    } = parse_macro_input!(input as VerifyLiteralInput);

    let regex = match fancy_regex::Regex::new(&pattern.value()) {
        Ok(regex) => regex,
        Err(error) => {
            return syn::Error::new(pattern.span(), format!("Invalid regular expression: {error}"))
                .to_compile_error()
                .into();
        }
    };

    if regex.is_match(&value.value()).unwrap_or(false) {
        quote! { #expression }.into()
    } else {
        syn::Error::new(
            value.span(),
            format!("`{}` is not {}", value.value(), description.value()),
        )
        .to_compile_error()
        .into()
    }
}

struct VerifyLiteralInput {
    value: syn::LitStr,
    pattern: syn::LitStr,
    description: syn::LitStr,
    expression: syn::Expr,
}

impl Parse for VerifyLiteralInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let value = input.parse()?;
        input.parse::<Token![,]>()?;
        let pattern = input.parse()?;
        input.parse::<Token![,]>()?;
        let description = input.parse()?;
        input.parse::<Token![,]>()?;
        let expression = input.parse()?;

        Ok(Self {
            value,
            pattern,
            description,
            expression,
        })
    }
}

use anyhow::Context;
use proc_macro2::TokenStream;
use quote::quote;

/// Parse tokens of a whole source file and pretty-print them
pub fn format_file(tokens: TokenStream) -> anyhow::Result<String> {
    let file = tokens.to_string();
    let parsed = syn::parse_file(&file)
        .context(format!("Failed to parse:\n{}", file))?;
    Ok(prettyplease::unparse(&parsed))
}

/// Wrap expression tokens in a static item so that they can be formatted as a file
pub fn format_expr(tokens: TokenStream) -> anyhow::Result<String> {
    format_file(quote! {
        static EXPR: ExprType = #tokens;
    })
}

#[cfg(test)]
pub fn assert_tokens_eq(left: TokenStream, right: TokenStream) {
    let left = format_expr(left).unwrap();
    let right = format_expr(right).unwrap();
    similar_asserts::assert_eq!(left, right);
}

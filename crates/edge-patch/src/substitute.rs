//! Placeholder substitution.

use edge_core::{find_placeholder, RouteParams};

use crate::document::{Document, Region};
use crate::error::PatchResult;
use crate::escape::Escaping;

/// Replace every placeholder whose name is in `params` with the escaped
/// value. Tokens for other names are left untouched. The scan runs left to
/// right once, so inserted values are never rescanned.
pub fn substitute_placeholders(text: &str, params: &RouteParams, escaping: Escaping) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(span) = find_placeholder(text, pos) {
        out.push_str(&text[pos..span.start]);
        match params.get(span.name) {
            Some(value) => out.push_str(&escaping.apply(value)),
            None => out.push_str(&text[span.start..span.end]),
        }
        pos = span.end;
    }
    out.push_str(&text[pos..]);
    out
}

/// Substitute placeholders across a whole document, escaping for each
/// region: HTML in markup, doubly JSON-escaped in payload chunks.
pub fn substitute_document(html: &str, params: &RouteParams) -> PatchResult<String> {
    let mut doc = Document::parse(html)?;
    for region in doc.regions_mut() {
        match region {
            Region::Markup(markup) => {
                *markup = substitute_placeholders(markup, params, Escaping::Html);
            }
            Region::Payload(chunk) => {
                let literal = substitute_placeholders(chunk.literal(), params, Escaping::Payload);
                chunk.set_literal(literal);
            }
        }
    }
    Ok(doc.render())
}

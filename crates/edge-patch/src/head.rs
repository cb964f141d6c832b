//! Markup rewrites: title, managed tags, primary content.
//!
//! These work on the raw document. Inline payload literals never contain a
//! raw `<`, so tag scanning cannot match inside them.

use crate::error::{PatchError, PatchResult};
use crate::escape::escape_html;
use crate::tags::{is_managed_tag, Tag, TagKind};

/// Byte span of a start tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TagSpan {
    start: usize,
    end: usize,
}

/// Find the next start tag `<name ...>` at or after `from`. `lower` is the
/// ASCII-lowercased document, so offsets match.
fn find_start_tag(html: &str, lower: &str, name: &str, from: usize) -> Option<TagSpan> {
    let needle = format!("<{}", name);
    let mut cursor = from;
    while let Some(rel) = lower.get(cursor..)?.find(&needle) {
        let start = cursor + rel;
        let after = start + needle.len();
        match html.as_bytes().get(after) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => {
                let end = tag_end(html, after)?;
                return Some(TagSpan { start, end });
            }
            _ => cursor = after,
        }
    }
    None
}

/// Offset one past the `>` closing a start tag, honouring quoted values.
fn tag_end(html: &str, from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, b) in html.as_bytes().iter().enumerate().skip(from) {
        match (quote, *b) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, b'"') | (None, b'\'') => quote = Some(*b),
            (None, b'>') => return Some(i + 1),
            _ => {}
        }
    }
    None
}

fn find_end_tag(lower: &str, name: &str, from: usize) -> Option<usize> {
    lower.get(from..)?.find(&format!("</{}", name)).map(|i| from + i)
}

/// Parse the attributes of a start tag such as `<meta name="a" content='b'>`.
/// Names are lowercased; values are kept as written.
fn parse_attrs(tag: &str) -> Vec<(String, String)> {
    let inner = tag
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim_end_matches('/');
    let bytes = inner.as_bytes();
    let mut i = inner
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(inner.len());
    let mut attrs = Vec::new();

    loop {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        let name = inner[name_start..i].to_ascii_lowercase();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let value = match bytes.get(i) {
                Some(&q) if q == b'"' || q == b'\'' => {
                    let start = i + 1;
                    let end = inner[start..]
                        .find(q as char)
                        .map(|e| start + e)
                        .unwrap_or(inner.len());
                    i = (end + 1).min(inner.len());
                    &inner[start..end]
                }
                _ => {
                    let start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                        i += 1;
                    }
                    &inner[start..i]
                }
            };
            attrs.push((name, value.to_string()));
        } else {
            attrs.push((name, String::new()));
        }
    }
    attrs
}

/// Replace the document title, or add one to `<head>` when missing.
pub fn rewrite_title(html: &str, title: &str) -> PatchResult<String> {
    let lower = html.to_ascii_lowercase();
    let title_html = escape_html(title);

    if let Some(open) = find_start_tag(html, &lower, "title", 0) {
        if let Some(close) = find_end_tag(&lower, "title", open.end) {
            return Ok(format!("{}{}{}", &html[..open.end], title_html, &html[close..]));
        }
    }

    let close_head = find_end_tag(&lower, "head", 0).ok_or(PatchError::MissingHead)?;
    Ok(format!(
        "{}<title>{}</title>{}",
        &html[..close_head],
        title_html,
        &html[close_head..]
    ))
}

/// Remove every managed `<meta>`/`<link>` tag. `extra_names` extends the
/// managed `<meta name>` set.
pub fn strip_managed_tags(html: &str, extra_names: &[String]) -> String {
    let lower = html.to_ascii_lowercase();
    let mut remove: Vec<TagSpan> = Vec::new();

    for kind in [TagKind::Meta, TagKind::Link] {
        let mut pos = 0;
        while let Some(span) = find_start_tag(html, &lower, kind.as_str(), pos) {
            let tag = Tag {
                kind,
                attrs: parse_attrs(&html[span.start..span.end]),
            };
            if is_managed_tag(&tag, extra_names) {
                remove.push(span);
            }
            pos = span.end;
        }
    }
    remove.sort_by_key(|s| s.start);

    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    for span in remove {
        out.push_str(&html[pos..span.start]);
        pos = span.end;
    }
    out.push_str(&html[pos..]);
    out
}

/// Insert tags after `</title>`, or before `</head>` without a title.
pub fn insert_head_tags(html: &str, tags: &[Tag]) -> PatchResult<String> {
    let lower = html.to_ascii_lowercase();
    let at = match find_end_tag(&lower, "title", 0) {
        Some(close) => lower[close..]
            .find('>')
            .map(|i| close + i + 1)
            .ok_or(PatchError::MissingHead)?,
        None => find_end_tag(&lower, "head", 0).ok_or(PatchError::MissingHead)?,
    };
    let markup: String = tags.iter().map(Tag::to_html).collect();
    Ok(format!("{}{}{}", &html[..at], markup, &html[at..]))
}

/// Replace the primary content region with `markup`.
///
/// The region is the inside of the first `<main>`. Without one, it is the
/// body content up to the first `<script>`. Documents with neither are
/// returned unchanged.
pub fn replace_primary_content(html: &str, markup: &str) -> String {
    let lower = html.to_ascii_lowercase();

    if let Some(open) = find_start_tag(html, &lower, "main", 0) {
        if let Some(close) = find_end_tag(&lower, "main", open.end) {
            return format!("{}{}{}", &html[..open.end], markup, &html[close..]);
        }
    }

    let Some(body) = find_start_tag(html, &lower, "body", 0) else {
        return html.to_string();
    };
    let end = find_start_tag(html, &lower, "script", body.end)
        .map(|s| s.start)
        .or_else(|| find_end_tag(&lower, "body", body.end))
        .unwrap_or(html.len());
    format!("{}{}{}", &html[..body.end], markup, &html[end..])
}

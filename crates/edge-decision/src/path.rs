//! Request path classification.

/// What a request path addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// A file with a non-document extension.
    Asset,
    /// A page, with or without a document extension.
    Document,
}

fn extension(path: &str) -> Option<&str> {
    let last = path.trim_end_matches('/').rsplit('/').next()?;
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Classify a path. Extensions are compared case-insensitively.
pub fn classify_path(path: &str, document_extensions: &[String]) -> PathKind {
    match extension(path) {
        Some(ext) if !document_extensions.iter().any(|d| d.eq_ignore_ascii_case(ext)) => {
            PathKind::Asset
        }
        _ => PathKind::Document,
    }
}

/// The path with any document extension removed, for route matching.
pub fn route_path<'a>(path: &'a str, document_extensions: &[String]) -> &'a str {
    let trimmed = path.trim_end_matches('/');
    match extension(trimmed) {
        Some(ext) if document_extensions.iter().any(|d| d.eq_ignore_ascii_case(ext)) => {
            &trimmed[..trimmed.len() - ext.len() - 1]
        }
        _ => path,
    }
}

//! Object-store key derivation.
//!
//! All keys are pure functions of their input:
//!
//! | input | key |
//! |---|---|
//! | `/product/42` | `product/42.html` |
//! | `/product/42/` | `product/42.html` |
//! | `/` | `index.html` |
//! | route `/:lang/products/:id` | `products/_fallback.html` |

use crate::route::{canonical_path, normalize_path, RoutePattern};

/// Extension appended to rendered documents.
pub const DOCUMENT_EXTENSION: &str = "html";

/// Extension of the plain-payload variant.
pub const PAYLOAD_EXTENSION: &str = "txt";

/// Suffix of the directory holding per-segment artifacts.
pub const SEGMENTS_SUFFIX: &str = ".segments";

/// Default fallback template filename.
pub const DEFAULT_TEMPLATE_FILENAME: &str = "_fallback.html";

/// Key stem for a request path: canonical segments (decoded, with `%` and
/// `/` re-escaped), without leading/trailing slash or `.html` extension. The
/// root path maps to `index`.
pub fn artifact_stem(path: &str) -> String {
    let canonical = canonical_path(&normalize_path(path));
    let trimmed = canonical.trim_matches('/');
    let trimmed = trimmed
        .strip_suffix(".html")
        .unwrap_or(trimmed)
        .trim_end_matches('/');
    if trimmed.is_empty() {
        "index".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Key of the rendered document for a request path.
pub fn artifact_key(path: &str) -> String {
    format!("{}.{}", artifact_stem(path), DOCUMENT_EXTENSION)
}

/// Key of the plain-payload variant for a request path.
pub fn payload_key(path: &str) -> String {
    format!("{}.{}", artifact_stem(path), PAYLOAD_EXTENSION)
}

/// Prefix under which segment artifacts for a request path live.
pub fn segments_prefix(path: &str) -> String {
    format!("{}{}/", artifact_stem(path), SEGMENTS_SUFFIX)
}

/// Key of the fallback template for a route.
///
/// Static segments joined by `/`, then the template filename. Fully dynamic
/// routes share the root-level template. Routes with equal static segments
/// share one key.
pub fn template_key(route: &RoutePattern, filename: &str) -> String {
    if route.is_fully_dynamic() {
        return filename.to_string();
    }
    let statics: Vec<&str> = route.static_segments().collect();
    format!("{}/{}", statics.join("/"), filename)
}

/// Key of the sidecar describing a template's reference instance.
pub fn template_info_key(template_key: &str) -> String {
    match template_key.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() && !stem.ends_with('/') => format!("{}.json", stem),
        _ => format!("{}.json", template_key),
    }
}

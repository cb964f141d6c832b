//! Route pattern compilation and matching.
//!
//! Patterns look like `/product/:id` or `/:lang/products/:id`. Every
//! `:name` segment becomes a single-path-segment capture group; literal
//! segments are matched exactly. The compiled regex is anchored at both
//! ends.

use std::fmt;

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::context::RouteParams;
use crate::error::ConfigError;

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal segment that must match exactly.
    Static(String),
    /// Dynamic segment bound to a parameter name.
    Param(String),
}

impl Segment {
    /// Whether this segment is dynamic.
    pub fn is_param(&self) -> bool {
        matches!(self, Self::Param(_))
    }
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    pattern: String,
    segments: Vec<Segment>,
    param_names: Vec<String>,
    matcher: Regex,
}

impl RoutePattern {
    /// Compile a pattern into a matcher.
    ///
    /// Rejects patterns without a leading `/`, without any dynamic segment,
    /// with empty segments, or with invalid/duplicate parameter names.
    pub fn compile(pattern: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let rest = pattern
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;
        if rest.is_empty() {
            return Err(invalid("must contain at least one dynamic segment"));
        }

        let mut segments = Vec::new();
        let mut param_names: Vec<String> = Vec::new();
        let mut regex_src = String::from("^");

        for raw in rest.split('/') {
            if raw.is_empty() {
                return Err(invalid("empty path segment"));
            }
            regex_src.push('/');

            match raw.strip_prefix(':') {
                Some(name) => {
                    if !is_valid_param_name(name) {
                        return Err(invalid(&format!("invalid parameter name '{}'", name)));
                    }
                    if param_names.iter().any(|n| n == name) {
                        return Err(ConfigError::DuplicateParam {
                            pattern: pattern.to_string(),
                            name: name.to_string(),
                        });
                    }
                    regex_src.push_str("([^/]+)");
                    param_names.push(name.to_string());
                    segments.push(Segment::Param(name.to_string()));
                }
                None => {
                    regex_src.push_str(&regex::escape(&reescape(raw)));
                    segments.push(Segment::Static(raw.to_string()));
                }
            }
        }
        regex_src.push('$');

        if param_names.is_empty() {
            return Err(invalid("must contain at least one dynamic segment"));
        }

        let matcher = Regex::new(&regex_src).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            param_names,
            matcher,
        })
    }

    /// The source pattern string.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Parameter names in order of first appearance.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The compiled, anchored matcher.
    pub fn regex(&self) -> &Regex {
        &self.matcher
    }

    /// Literal segments in order.
    pub fn static_segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Static(lit) => Some(lit.as_str()),
            Segment::Param(_) => None,
        })
    }

    /// Whether every segment is dynamic.
    pub fn is_fully_dynamic(&self) -> bool {
        self.segments.iter().all(Segment::is_param)
    }

    /// Match a request path against this pattern.
    ///
    /// The query string and a trailing slash are ignored. Segments are
    /// compared after percent-decoding, and bound values are decoded.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        let canonical = canonical_path(&normalize_path(path));
        let caps = self.matcher.captures(&canonical)?;

        let params = self
            .param_names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                caps.get(i + 1)
                    .map(|m| (name.clone(), decode_segment(m.as_str())))
            })
            .collect();

        Some(RouteMatch {
            pattern: self.pattern.clone(),
            params,
        })
    }

    /// Build a concrete path from parameter values.
    ///
    /// Returns `None` if a parameter is missing.
    pub fn concrete_path(&self, params: &RouteParams) -> Option<String> {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Static(lit) => path.push_str(lit),
                Segment::Param(name) => path.push_str(params.get(name)?),
            }
        }
        Some(path)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl PartialEq for RoutePattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for RoutePattern {}

/// A successful match of a path against a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pattern: String,
    params: Vec<(String, String)>,
}

impl RouteMatch {
    /// The pattern that matched.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Bound parameters in declaration order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Get a parameter by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert into a keyed parameter map.
    pub fn to_params(&self) -> RouteParams {
        self.params.iter().cloned().collect()
    }
}

/// Strip the query string, fragment and trailing slash from a path.
///
/// An empty result becomes `/`.
pub fn normalize_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Percent-decode a single path segment.
pub fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// Decode each segment, then escape only `%` and `/` inside it, so segment
/// boundaries survive decoding. `/file/a%2Fb` stays two segments.
pub fn canonical_path(path: &str) -> String {
    if path == "/" {
        return path.to_string();
    }
    path.split('/')
        .map(|seg| reescape(&decode_segment(seg)))
        .collect::<Vec<_>>()
        .join("/")
}

fn reescape(segment: &str) -> String {
    segment.replace('%', "%25").replace('/', "%2F")
}

/// Whether a string is a valid parameter name (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_valid_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_compile_extracts_params_in_order() {
        let route = RoutePattern::compile("/:lang/products/:id").unwrap();
        assert_eq!(route.param_names(), &["lang".to_string(), "id".to_string()]);
        assert_eq!(route.regex().as_str(), "^/([^/]+)/products/([^/]+)$");
        assert_eq!(route.static_segments().collect::<Vec<_>>(), vec!["products"]);
    }

    #[test]
    fn test_compile_escapes_literals() {
        let route = RoutePattern::compile("/a.b+c/:id").unwrap();
        assert!(route.match_path("/a.b+c/1").is_some());
        assert!(route.match_path("/aXb+c/1").is_none());
    }

    #[test]
    fn test_compile_rejects_invalid_patterns() {
        assert!(RoutePattern::compile("product/:id").is_err());
        assert!(RoutePattern::compile("/product/list").is_err());
        assert!(RoutePattern::compile("/").is_err());
        assert!(RoutePattern::compile("/product//:id").is_err());
        assert!(RoutePattern::compile("/product/:").is_err());
        assert!(RoutePattern::compile("/product/:1d").is_err());
        assert!(matches!(
            RoutePattern::compile("/:id/x/:id"),
            Err(ConfigError::DuplicateParam { .. })
        ));
    }

    #[test]
    fn test_match_binds_params() {
        let route = RoutePattern::compile("/product/:id").unwrap();
        let m = route.match_path("/product/42").unwrap();
        assert_eq!(m.pattern(), "/product/:id");
        assert_eq!(m.get("id"), Some("42"));
    }

    #[test]
    fn test_match_ignores_query_and_trailing_slash() {
        let route = RoutePattern::compile("/product/:id").unwrap();
        assert_eq!(route.match_path("/product/42/?ref=home").unwrap().get("id"), Some("42"));
        assert_eq!(route.match_path("/product/42#top").unwrap().get("id"), Some("42"));
    }

    #[test]
    fn test_match_rejects_structural_mismatch() {
        let route = RoutePattern::compile("/product/:id").unwrap();
        assert!(route.match_path("/product").is_none());
        assert!(route.match_path("/product/42/reviews").is_none());
        assert!(route.match_path("/products/42").is_none());
        assert!(route.match_path("/").is_none());
    }

    #[test]
    fn test_match_is_independent_of_percent_encoding() {
        let route = RoutePattern::compile("/café/:name").unwrap();
        let plain = route.match_path("/café/hello world").unwrap();
        let encoded = route.match_path("/caf%C3%A9/hello%20world").unwrap();
        assert_eq!(plain, encoded);
        assert_eq!(encoded.get("name"), Some("hello world"));
    }

    #[test]
    fn test_encoded_slash_stays_in_one_segment() {
        let route = RoutePattern::compile("/file/:name").unwrap();
        let m = route.match_path("/file/a%2Fb").unwrap();
        assert_eq!(m.get("name"), Some("a/b"));
        let m = route.match_path("/file/100%25").unwrap();
        assert_eq!(m.get("name"), Some("100%"));
    }

    #[test]
    fn test_concrete_path() {
        let route = RoutePattern::compile("/:lang/products/:id").unwrap();
        let mut params = RouteParams::new();
        params.insert("lang".into(), "en".into());
        params.insert("id".into(), "7".into());
        assert_eq!(route.concrete_path(&params).as_deref(), Some("/en/products/7"));
        params.remove("id");
        assert!(route.concrete_path(&params).is_none());
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/?x=1"), "/");
        assert_eq!(normalize_path("/a/b/"), "/a/b");
    }

    fn segment_strategy() -> impl Strategy<Value = (bool, String)> {
        (any::<bool>(), "[a-z][a-z0-9]{0,6}")
    }

    proptest! {
        #[test]
        fn test_param_count_and_binding_order(
            mut segs in proptest::collection::vec(segment_strategy(), 1..6),
            values in proptest::collection::vec("[A-Za-z0-9._~-]{1,8}", 6),
        ) {
            // force at least one dynamic segment
            segs[0].0 = true;
            let mut pattern = String::new();
            let mut path = String::new();
            let mut expected = Vec::new();
            for (i, (dynamic, name)) in segs.iter().enumerate() {
                if *dynamic {
                    let pname = format!("p{}_{}", i, name);
                    pattern.push_str(&format!("/:{}", pname));
                    path.push('/');
                    path.push_str(&values[i]);
                    expected.push((pname, values[i].clone()));
                } else {
                    pattern.push('/');
                    pattern.push_str(name);
                    path.push('/');
                    path.push_str(name);
                }
            }

            let route = RoutePattern::compile(&pattern).unwrap();
            prop_assert_eq!(route.param_names().len(), expected.len());

            let m = route.match_path(&path).unwrap();
            prop_assert_eq!(m.params(), expected.as_slice());

            let longer = format!("{}/extra", path);
            prop_assert!(route.match_path(&longer).is_none());
        }
    }
}

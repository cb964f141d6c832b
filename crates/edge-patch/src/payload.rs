//! Structural rewrites of payload rows.
//!
//! Parameter values appear in three positions:
//!
//! ```text
//! {"params":{"id":"42"}}              component props
//! ["id","42","d"]                     route segment tuple
//! {"c":["","product","42"]}           path segment array
//! ```
//!
//! The per-page metadata entry is an array of `["$", tag, key, props]`
//! elements with at least one `title`.

use edge_core::{placeholder, RouteParams, RoutePattern, Segment};
use serde_json::{json, Value};

use crate::escape::Escaping;
use crate::flight::FlightText;
use crate::substitute::substitute_placeholders;
use crate::tags::{is_managed_tag, Tag};

/// Segment tuple type markers: dynamic, catch-all, optional catch-all,
/// intercepted catch-all.
const SEGMENT_TYPES: &[&str] = &["d", "c", "oc", "ci"];

/// Replace each parameter value with its placeholder wherever it appears
/// in a parameter position. Returns whether anything changed.
pub fn templatize_params(value: &mut Value, route: &RoutePattern, params: &RouteParams) -> bool {
    match value {
        Value::Object(map) => {
            let mut changed = false;
            for (key, child) in map.iter_mut() {
                changed |= match key.as_str() {
                    "params" => templatize_props(child, params),
                    "c" => templatize_path(child, route, params),
                    _ => false,
                };
                changed |= templatize_params(child, route, params);
            }
            changed
        }
        Value::Array(items) => {
            if templatize_tuple(items, params) {
                return true;
            }
            let mut changed = false;
            for item in items.iter_mut() {
                changed |= templatize_params(item, route, params);
            }
            changed
        }
        _ => false,
    }
}

fn templatize_props(props: &mut Value, params: &RouteParams) -> bool {
    let Value::Object(map) = props else {
        return false;
    };
    let mut changed = false;
    for (name, value) in map.iter_mut() {
        if let Some(concrete) = params.get(name) {
            if value.as_str() == Some(concrete.as_str()) {
                *value = Value::String(placeholder(name));
                changed = true;
            }
        }
    }
    changed
}

fn templatize_tuple(items: &mut [Value], params: &RouteParams) -> bool {
    let [name, value, kind] = items else {
        return false;
    };
    let (Some(name), Some(kind)) = (name.as_str(), kind.as_str()) else {
        return false;
    };
    if !SEGMENT_TYPES.contains(&kind) {
        return false;
    }
    match params.get(name) {
        Some(concrete) if value.as_str() == Some(concrete.as_str()) => {
            *value = Value::String(placeholder(name));
            true
        }
        _ => false,
    }
}

/// Rebuild a path segment array with only the dynamic slots replaced. The
/// array must line up with the route: same length, equal static segments,
/// equal parameter values.
fn templatize_path(path: &mut Value, route: &RoutePattern, params: &RouteParams) -> bool {
    let Value::Array(items) = path else {
        return false;
    };
    let segments = route.segments();
    if items.len() != segments.len() + 1 || items.first().and_then(Value::as_str) != Some("") {
        return false;
    }

    let mut rebuilt = Vec::with_capacity(items.len());
    rebuilt.push(json!(""));
    for (item, segment) in items[1..].iter().zip(segments) {
        let Some(text) = item.as_str() else {
            return false;
        };
        match segment {
            Segment::Static(lit) if lit == text => rebuilt.push(item.clone()),
            Segment::Param(name) if params.get(name).map(String::as_str) == Some(text) => {
                rebuilt.push(Value::String(placeholder(name)));
            }
            _ => return false,
        }
    }
    *items = rebuilt;
    true
}

/// Point a raw row stream at another route instance: parameter positions
/// holding `from` values are rewritten to `to` values.
pub fn retarget_flight_params(
    text: &str,
    route: &RoutePattern,
    from: &RouteParams,
    to: &RouteParams,
) -> String {
    let mut flight = FlightText::parse(text);
    if flight.edit(|_, value| templatize_params(value, route, from)) == 0 {
        return text.to_string();
    }
    substitute_placeholders(&flight.to_text(), to, Escaping::Flight)
}

fn element_tag(item: &Value) -> Option<&str> {
    let items = item.as_array()?;
    if items.len() != 4 || items[0].as_str()? != "$" || !items[3].is_object() {
        return None;
    }
    items[1].as_str()
}

/// Whether a value is a per-page metadata entry.
pub fn is_metadata_row(value: &Value) -> bool {
    let Some(items) = value.as_array() else {
        return false;
    };
    let mut has_title = false;
    for item in items {
        match element_tag(item) {
            Some("title") => has_title = true,
            Some("meta") | Some("link") | Some("base") => {}
            _ => return false,
        }
    }
    has_title
}

/// Replace every metadata entry inside `value` with one carrying `title`
/// and `tags`. Unmanaged elements (charset, viewport, base) keep their
/// place ahead of the title; elements are re-keyed in order. Returns
/// whether an entry was found.
pub fn patch_metadata_row(
    value: &mut Value,
    title: &str,
    tags: &[Tag],
    extra_names: &[String],
) -> bool {
    if is_metadata_row(value) {
        if let Value::Array(items) = value {
            let mut rebuilt: Vec<Value> = items
                .iter()
                .filter(|item| match element_tag(item) {
                    Some("title") => false,
                    Some("base") => true,
                    _ => Tag::from_element(item)
                        .map(|tag| !is_managed_tag(&tag, extra_names))
                        .unwrap_or(true),
                })
                .cloned()
                .collect();
            rebuilt.push(json!(["$", "title", "", {"children": title}]));
            rebuilt.extend(tags.iter().map(|tag| tag.to_element("")));
            for (i, item) in rebuilt.iter_mut().enumerate() {
                item[2] = Value::String(i.to_string());
            }
            *items = rebuilt;
        }
        return true;
    }

    match value {
        Value::Array(items) => items.iter_mut().fold(false, |acc, item| {
            patch_metadata_row(item, title, tags, extra_names) || acc
        }),
        Value::Object(map) => map.values_mut().fold(false, |acc, item| {
            patch_metadata_row(item, title, tags, extra_names) || acc
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(p: &str) -> RoutePattern {
        RoutePattern::compile(p).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> RouteParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_templatize_props_and_tuples() {
        let mut value = json!(["$", "$L1", null, {
            "params": {"id": "42", "other": "42"},
            "tree": ["id", "42", "d"],
            "kids": [["id", "41", "d"]]
        }]);
        let changed = templatize_params(&mut value, &route("/product/:id"), &params(&[("id", "42")]));
        assert!(changed);
        assert_eq!(value[3]["params"]["id"], placeholder("id"));
        assert_eq!(value[3]["params"]["other"], "42");
        assert_eq!(value[3]["tree"][1], placeholder("id"));
        assert_eq!(value[3]["kids"][0][1], "41");
    }

    #[test]
    fn test_templatize_interleaved_path() {
        let r = route("/:lang/products/:id");
        let mut value = json!({"c": ["", "en", "products", "42"]});
        assert!(templatize_params(&mut value, &r, &params(&[("lang", "en"), ("id", "42")])));
        assert_eq!(
            value["c"],
            json!(["", placeholder("lang"), "products", placeholder("id")])
        );

        // a static segment equal to a parameter value stays literal
        let mut value = json!({"c": ["", "products", "products", "products"]});
        let p = params(&[("lang", "products"), ("id", "products")]);
        assert!(templatize_params(&mut value, &r, &p));
        assert_eq!(
            value["c"],
            json!(["", placeholder("lang"), "products", placeholder("id")])
        );
    }

    #[test]
    fn test_templatize_path_rejects_mismatched_static() {
        let mut value = json!({"c": ["", "items", "42"]});
        assert!(!templatize_params(&mut value, &route("/product/:id"), &params(&[("id", "42")])));
        assert_eq!(value["c"][2], "42");
    }

    #[test]
    fn test_retarget_flight_params() {
        let text = "0:{\"c\":[\"\",\"product\",\"7\"]}\n1:I[\"x\",[],\"P\"]\n2:[\"id\",\"7\",\"d\"]\n";
        let out = retarget_flight_params(
            text,
            &route("/product/:id"),
            &params(&[("id", "7")]),
            &params(&[("id", "a\"b")]),
        );
        assert_eq!(
            out,
            "0:{\"c\":[\"\",\"product\",\"a\\\"b\"]}\n1:I[\"x\",[],\"P\"]\n2:[\"id\",\"a\\\"b\",\"d\"]\n"
        );
    }

    fn head_entry() -> Value {
        json!([
            ["$", "meta", "0", {"charSet": "utf-8"}],
            ["$", "title", "1", {"children": "Old"}],
            ["$", "meta", "2", {"name": "description", "content": "old"}],
            ["$", "meta", "3", {"name": "viewport", "content": "width=device-width"}]
        ])
    }

    #[test]
    fn test_is_metadata_row() {
        assert!(is_metadata_row(&head_entry()));
        assert!(!is_metadata_row(&json!([["$", "meta", "0", {"charSet": "utf-8"}]])));
        assert!(!is_metadata_row(&json!([["$", "div", "0", {}]])));
        assert!(!is_metadata_row(&json!({"title": "x"})));
    }

    #[test]
    fn test_patch_metadata_row_nested() {
        let mut row = json!(["$", "$L2", null, {"head": head_entry()}]);
        let tags = vec![Tag::meta_name("description", "new")];
        assert!(patch_metadata_row(&mut row, "Widget", &tags, &[]));
        assert_eq!(
            row[3]["head"],
            json!([
                ["$", "meta", "0", {"charSet": "utf-8"}],
                ["$", "meta", "1", {"name": "viewport", "content": "width=device-width"}],
                ["$", "title", "2", {"children": "Widget"}],
                ["$", "meta", "3", {"name": "description", "content": "new"}]
            ])
        );
    }

    #[test]
    fn test_patch_metadata_row_absent() {
        let mut row = json!({"params": {"id": "1"}});
        assert!(!patch_metadata_row(&mut row, "T", &[], &[]));
    }
}

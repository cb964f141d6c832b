//! Representative page discovery.

use std::path::{Path, PathBuf};

use edge_core::{RouteParams, RoutePattern, Segment};
use walkdir::WalkDir;

/// A build-output page matching a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    /// Page file on disk.
    pub file: PathBuf,
    /// Request path the page answers, e.g. `/product/42`.
    pub path: String,
    /// Parameter values bound from the directory names.
    pub params: RouteParams,
}

/// Find a page in `build_dir` that is an instance of `route`.
///
/// Static segments must match a subdirectory exactly. Dynamic segments try
/// each sibling in name order, skipping hidden (`.`) and internal (`_`)
/// entries, depth first. The last segment matches `<name>.html` or
/// `<name>/index.html`. The first instance found wins.
pub fn find_example(build_dir: &Path, route: &RoutePattern) -> Option<Example> {
    let mut path = Vec::new();
    let mut params = RouteParams::new();
    let file = walk(build_dir, route.segments(), &mut path, &mut params)?;
    Some(Example {
        file,
        path: format!("/{}", path.join("/")),
        params,
    })
}

fn walk(
    dir: &Path,
    segments: &[Segment],
    path: &mut Vec<String>,
    params: &mut RouteParams,
) -> Option<PathBuf> {
    let (segment, rest) = segments.split_first()?;

    let candidates: Vec<String> = match segment {
        Segment::Static(lit) => vec![lit.clone()],
        Segment::Param(_) => entries(dir, rest.is_empty()),
    };

    for name in candidates {
        path.push(name.clone());
        if let Segment::Param(param) = segment {
            params.insert(param.clone(), name.clone());
        }

        let found = if rest.is_empty() {
            page_file(dir, &name)
        } else {
            let child = dir.join(&name);
            if child.is_dir() {
                walk(&child, rest, path, params)
            } else {
                None
            }
        };
        if found.is_some() {
            return found;
        }

        path.pop();
        if let Segment::Param(param) = segment {
            params.remove(param);
        }
    }
    None
}

/// Candidate names in a directory: subdirectories, plus `.html` stems when
/// `terminal`.
fn entries(dir: &Path, terminal: bool) -> Vec<String> {
    let mut names: Vec<String> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            if name.starts_with('.') || name.starts_with('_') {
                return None;
            }
            if entry.file_type().is_dir() {
                Some(name)
            } else if terminal {
                name.strip_suffix(".html")
                    .filter(|stem| !stem.is_empty() && *stem != "index")
                    .map(str::to_string)
            } else {
                None
            }
        })
        .collect();
    names.dedup();
    names
}

fn page_file(dir: &Path, name: &str) -> Option<PathBuf> {
    let flat = dir.join(format!("{}.html", name));
    if flat.is_file() {
        return Some(flat);
    }
    let nested = dir.join(name).join("index.html");
    nested.is_file().then_some(nested)
}

//! Per-segment prefetch artifacts.
//!
//! A build-time instance may carry segment files under
//! `<stem>.segments/`. For a new instance they are derived from the
//! reference instance's set:
//!
//! | file | derived by |
//! |---|---|
//! | `_tree.segment.rsc` | parameters retargeted |
//! | `_head.segment.rsc` | metadata regenerated, parameters retargeted |
//! | `_full.segment.rsc` | replaced by the new plain payload |
//! | `__PAGE__.segment.rsc` | parameters retargeted |
//! | anything else | copied verbatim |

use edge_core::{segments_prefix, RouteParams, RoutePattern};
use edge_patch::{patch_flight, retarget_flight_params, DocumentPatch};
use edge_store::{ObjectStore, StoreError};
use futures::future::try_join_all;
use tracing::debug;

use crate::error::RenderResult;

/// How a segment file is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Tree,
    Head,
    Full,
    Page,
    Shared,
}

impl SegmentKind {
    /// Classify a segment file by its name.
    pub fn classify(relative: &str) -> Self {
        let name = relative.rsplit('/').next().unwrap_or(relative);
        match name {
            "_tree.segment.rsc" => Self::Tree,
            "_head.segment.rsc" => Self::Head,
            "_full.segment.rsc" => Self::Full,
            "__PAGE__.segment.rsc" => Self::Page,
            _ => Self::Shared,
        }
    }
}

/// The instance segments are derived for.
#[derive(Debug, Clone, Copy)]
pub struct SegmentTarget<'a> {
    pub route: &'a RoutePattern,
    pub reference_path: &'a str,
    pub reference_params: &'a RouteParams,
    pub path: &'a str,
    pub params: &'a RouteParams,
    pub patch: &'a DocumentPatch,
    /// Plain payload of the new instance.
    pub payload: &'a str,
}

/// Derive the target's segment files from the reference instance, as
/// `(key, body)` pairs. Nothing is written. Empty when the reference has no
/// segments.
pub async fn derive_segments(
    store: &dyn ObjectStore,
    target: SegmentTarget<'_>,
) -> RenderResult<Vec<(String, Vec<u8>)>> {
    let source_prefix = segments_prefix(target.reference_path);
    let keys = store.list(&source_prefix).await?;
    if keys.is_empty() {
        debug!(prefix = %source_prefix, "no reference segments");
        return Ok(Vec::new());
    }

    let target_prefix = segments_prefix(target.path);
    let derived = try_join_all(keys.iter().filter_map(|key| {
        let relative = key.strip_prefix(&source_prefix)?;
        let target_key = format!("{}{}", target_prefix, relative);
        Some(async move {
            let body = derive_one(store, &target, key, SegmentKind::classify(relative)).await?;
            RenderResult::Ok((target_key, body))
        })
    }))
    .await?;
    debug!(prefix = %target_prefix, count = derived.len(), "derived segment artifacts");
    Ok(derived)
}

async fn derive_one(
    store: &dyn ObjectStore,
    target: &SegmentTarget<'_>,
    key: &str,
    kind: SegmentKind,
) -> RenderResult<Vec<u8>> {
    let body = match kind {
        SegmentKind::Full => target.payload.as_bytes().to_vec(),
        SegmentKind::Shared => store.get(key).await?.unwrap_or_default(),
        SegmentKind::Tree | SegmentKind::Page | SegmentKind::Head => {
            let text = read_text(store, key).await?;
            let text =
                retarget_flight_params(&text, target.route, target.reference_params, target.params);
            if kind == SegmentKind::Head {
                patch_flight(&text, target.patch).into_bytes()
            } else {
                text.into_bytes()
            }
        }
    };
    Ok(body)
}

async fn read_text(store: &dyn ObjectStore, key: &str) -> RenderResult<String> {
    let bytes = store.get(key).await?.unwrap_or_default();
    String::from_utf8(bytes).map_err(|_| StoreError::NotUtf8(key.to_string()).into())
}

//! Metadata patch over a whole document.

use tracing::debug;

use crate::document::Document;
use crate::error::PatchResult;
use crate::flight::FlightText;
use crate::head::{insert_head_tags, rewrite_title, strip_managed_tags};
use crate::metadata::Metadata;
use crate::payload::patch_metadata_row;
use crate::tags::{extra_managed_names, metadata_tags, Tag};

/// Everything needed to patch one document: the title, the tags to emit,
/// and the free-form names to strip beyond the fixed managed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPatch {
    pub title: String,
    pub tags: Vec<Tag>,
    pub extra_names: Vec<String>,
}

impl DocumentPatch {
    /// Patch for a metadata value.
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            title: meta.resolved_title(),
            tags: metadata_tags(meta),
            extra_names: extra_managed_names(meta),
        }
    }

    /// Patch that leaves only a generic title.
    pub fn loading(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tags: Vec::new(),
            extra_names: Vec::new(),
        }
    }
}

impl From<&Metadata> for DocumentPatch {
    fn from(meta: &Metadata) -> Self {
        Self::from_metadata(meta)
    }
}

/// Apply a patch to markup and inline payload.
///
/// Markup: managed tags are stripped, the title rewritten and the new tags
/// inserted after it. Payload: every metadata entry is rebuilt in place so
/// the client sees the same values after hydration.
pub fn patch_document(html: &str, patch: &DocumentPatch) -> PatchResult<String> {
    let html = strip_managed_tags(html, &patch.extra_names);
    let html = rewrite_title(&html, &patch.title)?;
    let html = insert_head_tags(&html, &patch.tags)?;

    let mut doc = Document::parse(&html)?;
    let rows = doc.edit_payload_rows(|_, value| {
        patch_metadata_row(value, &patch.title, &patch.tags, &patch.extra_names)
    })?;
    debug!(rows, tags = patch.tags.len(), "patched document metadata");
    Ok(doc.render())
}

/// Apply a patch to a raw row stream (segment files, plain payload).
pub fn patch_flight(text: &str, patch: &DocumentPatch) -> String {
    let mut flight = FlightText::parse(text);
    let rows = flight.edit(|_, value| {
        patch_metadata_row(value, &patch.title, &patch.tags, &patch.extra_names)
    });
    if rows == 0 {
        return text.to_string();
    }
    flight.to_text()
}

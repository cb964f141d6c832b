//! Pure document transformations for on-demand regeneration.
//!
//! A rendered page is split into two kinds of region:
//!
//! ```text
//! <html><head>..</head><body>..   <script>self.__next_f.push([1,"0:[..]\n"])</script>
//! └──────────── markup ────────┘  └──────────────── payload chunk ─────────────────┘
//! ```
//!
//! Markup is patched with tag-level rewrites (title, managed meta/link
//! tags, primary content). Payload chunks hold an escaped row stream; rows
//! are decoded, edited as JSON and re-encoded in place, so every other byte
//! keeps its position.
//!
//! Modules:
//! - `document` - markup/payload tokenizer
//! - `flight` - payload row codec
//! - `escape` - per-context escaping
//! - `substitute` - placeholder substitution
//! - `metadata` / `tags` - metadata model and tag families
//! - `head` - markup rewrites
//! - `payload` - structural payload rewrites
//! - `patcher` - metadata patch over a whole document

mod document;
mod error;
mod escape;
mod flight;
mod head;
mod metadata;
mod patcher;
mod payload;
mod substitute;
mod tags;

pub use document::{Document, PayloadChunk, Region};
pub use error::{PatchError, PatchResult};
pub use escape::{escape_html, json_string_inner, script_literal_inner, Escaping};
pub use flight::{FlightText, Row};
pub use head::{
    insert_head_tags, replace_primary_content, rewrite_title, strip_managed_tags,
};
pub use metadata::*;
pub use patcher::{patch_document, patch_flight, DocumentPatch};
pub use payload::{
    is_metadata_row, patch_metadata_row, retarget_flight_params, templatize_params,
};
pub use substitute::{substitute_document, substitute_placeholders};
pub use tags::{
    alternate_tags, basic_tags, extra_managed_names, icon_tags, is_managed_tag, metadata_tags,
    open_graph_tags, other_tags, platform_tags, robots_tags, twitter_tags, verification_tags, Tag,
    TagKind,
};

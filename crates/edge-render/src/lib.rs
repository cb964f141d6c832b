//! On-demand renderer.
//!
//! Materializes the document for one concrete route instance:
//!
//! ```text
//! validate -> de-dup read -> load template -> substitute placeholders
//!          -> metadata generator -> patch -> persist (document, payload, segments)
//! ```
//!
//! Every failure is caught and normalized into a [`RenderOutcome`]; callers
//! never see a panic or a propagated error, only a response whose status
//! says whether the artifact now exists.

mod error;
mod generator;
mod hooks;
mod renderer;
mod request;
mod segments;
mod template;

pub use error::{NotFoundReason, RenderError, RenderResult};
pub use generator::{from_fn, FnGenerator, JsonMetadataGenerator, MetadataGenerator};
pub use hooks::{ParamValidator, RouteHooks, RouteRegistry};
pub use renderer::{Render, Renderer};
pub use request::{RenderOutcome, RenderRequest, RenderResponse};
pub use segments::{derive_segments, SegmentKind, SegmentTarget};
pub use template::{LoadedTemplate, TemplateLoader};

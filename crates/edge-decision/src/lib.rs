//! Edge decision function.
//!
//! Runs once per inbound request with no state shared across instances
//! beyond the object store. Every request is forwarded to the store; on a
//! miss that matches a dynamic route, the renderer is invoked first so the
//! store can answer with the new artifact.

mod decision;
mod error;
mod manifest;
mod path;

pub use decision::{Decision, EdgeDecision, ForwardReason, REQUEST_ID_HEADER};
pub use error::DecisionError;
pub use manifest::ManifestCache;
pub use path::{classify_path, route_path, PathKind};

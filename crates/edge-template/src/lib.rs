//! Fallback template generation.
//!
//! At deploy time, each dynamic route gets one generic template derived
//! from a representative page in the build output:
//!
//! ```text
//! out/product/42.html  --(route /product/:id, id=42)-->  product/_fallback.html
//!                                                         product/_fallback.json
//! ```
//!
//! The template keeps the page shell, carries a loading title and loading
//! content, and has a placeholder token wherever the example's parameter
//! values appeared in the payload. The `.json` sidecar records which
//! instance the template was derived from.

mod discover;
mod error;
mod generate;
mod info;

pub use discover::{find_example, Example};
pub use error::{TemplateError, TemplateResult};
pub use generate::{GeneratedTemplate, GenerationReport, TemplateGenerator};
pub use info::TemplateInfo;

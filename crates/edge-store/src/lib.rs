//! Object storage for rendered artifacts and fallback templates.
//!
//! The object store is the only shared mutable resource in the system.
//! Writers perform unconditional overwrites (last write wins); each `put`
//! is atomic, so concurrent writers never leave an interleaved object.
//!
//! # Example
//!
//! ```rust,ignore
//! use edge_store::{MemoryStore, ObjectStore};
//!
//! let store = MemoryStore::new("site");
//! store.put("product/42.html", html.into_bytes()).await?;
//! assert!(store.exists("product/42.html").await?);
//! ```

mod backend;
mod error;
mod fs;
mod memory;
mod store;

pub use backend::{DeployBackend, DeployReport, FsBackend};
pub use error::{StoreError, StoreResult};
pub use fs::FsStore;
pub use memory::MemoryStore;
pub use store::{content_type_for, validate_key, ObjectStore, ObjectStoreExt};

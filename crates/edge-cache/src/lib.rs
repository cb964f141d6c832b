//! Per-instance caching for the edge decision path.
//!
//! This crate provides:
//! - `TtlCache` - short-lived, best-effort cache owned by one instance
//! - `Clock` / `SystemClock` / `ManualClock` - injectable time source
//! - `CacheStatus` - outcome of a lookup, for logging
//!
//! Caches affect latency only. A miss or an expired entry always falls
//! through to a live read.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use edge_cache::TtlCache;
//!
//! let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(300));
//! let manifest = cache
//!     .get_or_try_insert_with("routes", || async { load_manifest().await })
//!     .await?;
//! ```

mod clock;
mod ttl;

pub use clock::*;
pub use ttl::*;

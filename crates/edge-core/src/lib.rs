//! Core abstractions for on-demand regeneration of a static export.
//!
//! This crate provides the leaf types every other crate builds on:
//! - `RoutePattern` / `RouteManifest` - route compilation and matching
//! - `artifact_key` and friends - deterministic object-store keys
//! - `placeholder` - per-parameter placeholder tokens
//! - `RegenConfig` - deploy and runtime configuration
//! - `RequestId` - request correlation

mod config;
mod context;
mod error;
mod key;
mod manifest;
mod placeholder;
mod route;

pub use config::*;
pub use context::*;
pub use error::*;
pub use key::*;
pub use manifest::*;
pub use placeholder::*;
pub use route::*;

//! Comboflow recipe resolution
//!
//! This crate resolves a base image's build recipe (its Dockerfile) and its
//! last-build timestamp. Dockerfiles come either from an explicit URL given
//! on the image reference or from Docker Hub description discovery; build
//! times come from the Docker daemon (pull + inspect). Resolution is
//! expensive and referentially transparent within one run, so a caching
//! wrapper memoizes both lookups per invocation.

pub mod cache;
pub mod error;
pub mod hub;
pub mod source;

pub use cache::CachedSource;
pub use error::{ResolveError, ResolveResult};
pub use hub::HubSource;
pub use source::RecipeSource;

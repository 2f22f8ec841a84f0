//! Comboflow core data model
//!
//! This crate defines the data model shared by all Comboflow crates
//! (image references, recipes, the derived combo reference) together with
//! the two pure decision functions of the pipeline: base-image
//! compatibility and rebuild staleness.

pub mod compat;
pub mod error;
pub mod model;
pub mod staleness;

pub use compat::*;
pub use error::*;
pub use model::*;
pub use staleness::*;

//! Comboflow Dockerfile merge engine
//!
//! This crate turns the resolved recipes of N base images into one
//! buildable Dockerfile: a single FROM instruction (from the first
//! constituent or an explicit override), each constituent's instructions in
//! order with COPY destinations resolved, lifecycle instructions dropped,
//! environment overrides applied, and cross-image file copies handled by
//! either a `--from=` stage reference or extraction into the build context.

pub mod error;
pub mod extract;
pub mod instruction;
pub mod merger;
pub mod plan;

pub use error::{MergeError, MergeResult};
pub use extract::FileExtractor;
pub use merger::{CopyStrategy, MergeOptions, RecipeMerger};
pub use plan::{BuildContext, ExtractedFile, MergePlan};

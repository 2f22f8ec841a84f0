//! Comboflow build pipeline
//!
//! This crate drives the combo image through its lifecycle: it packages the
//! merged recipe into a build context, builds and tags the image through the
//! Docker daemon, smoke-tests each constituent inside the result, and
//! optionally pushes it to a registry. The pipeline itself only talks to the
//! [`engine::BuildEngine`] seam, so tests can run it against a fake engine.

pub mod auth;
pub mod context;
pub mod docker;
pub mod engine;
pub mod error;
pub mod orchestrator;

pub use auth::RegistryAuth;
pub use context::ContextBuilder;
pub use docker::{DockerEngine, init_docker};
pub use engine::BuildEngine;
pub use error::{BuildError, BuildResult};
pub use orchestrator::{Pipeline, PipelineError, PipelineOutcome, PipelineRequest};

//! Gantry Pipeline - Release artifact orchestration
//!
//! Provides the matrix-driven build/package/publish pipeline:
//! - Expands a static platform matrix into independent jobs
//! - Builds a release binary per target via the toolchain
//! - Packages binary + docs into deterministically named tar.gz archives
//! - Uploads each archive as a release asset

pub mod build;
pub mod error;
pub mod job;
pub mod package;
pub mod pipeline;
pub mod report;
pub mod target;

// Re-export key types
pub use build::{BuildConfig, BuildOutput, Builder};
pub use error::{BuildError, MatrixError, PackageError};
pub use job::{JobOutcome, JobReport, JobRunner, Stage};
pub use package::{Archive, PackageStep, Packager};
pub use pipeline::{Pipeline, PipelineConfig, PipelineResult};
pub use report::{RunGate, RunVerdict};
pub use target::{default_matrix, validate_matrix, BuiltinTarget, TargetConfig};

//! Error types for pipeline stages

use std::path::PathBuf;
use thiserror::Error;

/// Build matrix validation errors.
#[derive(Error, Debug)]
pub enum MatrixError {
    /// The configured target list is empty
    #[error("Build matrix is empty")]
    EmptyMatrix,

    /// Two targets share a platform label, which would collide on archive names
    #[error("Duplicate platform label in matrix: {0}")]
    DuplicateLabel(String),
}

/// Errors from the build stage (toolchain/target failure).
#[derive(Error, Debug)]
pub enum BuildError {
    /// Build command override resolved to an empty command
    #[error("Toolchain command for target {0} is empty")]
    EmptyCommand(String),

    /// The toolchain process could not be started
    #[error("Failed to spawn toolchain for {triple}: {source}")]
    Spawn {
        triple: String,
        #[source]
        source: std::io::Error,
    },

    /// The toolchain ran and rejected the build
    #[error("Build for {triple} exited with code {code}: {stderr}")]
    Failed {
        triple: String,
        code: i32,
        stderr: String,
    },

    /// The toolchain exceeded the configured timeout
    #[error("Build for {triple} timed out after {timeout_secs} seconds")]
    TimedOut { triple: String, timeout_secs: u64 },

    /// The toolchain reported success but the binary is not at the expected path
    #[error("Build for {triple} produced no binary at {path}")]
    MissingBinary { triple: String, path: PathBuf },
}

/// Errors from the package stage (filesystem/compression failure).
#[derive(Error, Debug)]
pub enum PackageError {
    /// A packaging input (binary or docs file) is missing
    #[error("Packaging input missing: {0}")]
    MissingInput(PathBuf),

    /// The step sequence finished without producing an archive
    #[error("Package steps produced no archive at {0}")]
    NoArchive(PathBuf),

    /// Filesystem or compression error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

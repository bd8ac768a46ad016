//! Archive assembly for build outputs.
//!
//! Packaging is an ordered sequence of typed steps rather than
//! platform-conditional shell text: create the staging directory, copy
//! the binary and documentation in, compress the directory. Archive
//! names are fully deterministic from product name and platform label so
//! downstream consumers can predict asset names before the pipeline runs.

use crate::build::BuildOutput;
use crate::error::PackageError;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A single typed packaging operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum PackageStep {
    /// Create (or reset) the staging directory.
    MakeStagingDir,

    /// Copy a file into the staging directory under the given name.
    CopyFile { source: PathBuf, dest_name: String },

    /// Compress the staging directory into the archive.
    Compress,
}

/// The compressed, deterministically named bundle of binary + docs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archive {
    /// Archive file name: `{product}-{label}.tar.gz`.
    pub name: String,

    /// Path of the archive on disk.
    pub path: PathBuf,

    /// Archive size in bytes.
    pub size: u64,

    /// SHA-256 checksum of the archive bytes.
    pub checksum: String,
}

/// Assembles staging directories and compresses them into archives.
pub struct Packager {
    product: String,
    out_dir: PathBuf,
}

impl Packager {
    pub fn new(product: &str, out_dir: &Path) -> Self {
        Self {
            product: product.to_string(),
            out_dir: out_dir.to_path_buf(),
        }
    }

    /// Archive file name for a platform label.
    pub fn archive_name(&self, label: &str) -> String {
        format!("{}-{}.tar.gz", self.product, label)
    }

    /// Top-level directory name inside the archive.
    pub fn staging_dir_name(&self, label: &str) -> String {
        format!("{}-{}", self.product, label)
    }

    fn staging_dir(&self, label: &str) -> PathBuf {
        self.out_dir.join(self.staging_dir_name(label))
    }

    fn archive_path(&self, label: &str) -> PathBuf {
        self.out_dir.join(self.archive_name(label))
    }

    /// The standard step sequence: stage the binary and the docs file,
    /// then compress.
    pub fn plan_steps(&self, output: &BuildOutput, docs: &Path, bin_name: &str) -> Vec<PackageStep> {
        let docs_name = docs
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "README.md".to_string());

        vec![
            PackageStep::MakeStagingDir,
            PackageStep::CopyFile {
                source: output.binary_path.clone(),
                dest_name: bin_name.to_string(),
            },
            PackageStep::CopyFile {
                source: docs.to_path_buf(),
                dest_name: docs_name,
            },
            PackageStep::Compress,
        ]
    }

    /// Execute a step sequence for one platform label.
    ///
    /// Fatal to that target's job when an input is missing or the
    /// filesystem denies writes.
    pub fn package(&self, label: &str, steps: &[PackageStep]) -> Result<Archive, PackageError> {
        let staging = self.staging_dir(label);
        let archive_path = self.archive_path(label);

        fs::create_dir_all(&self.out_dir)?;

        for step in steps {
            debug!(label, step = ?step, "Executing package step");
            match step {
                PackageStep::MakeStagingDir => {
                    // Stale staging contents would leak into the archive.
                    if staging.exists() {
                        fs::remove_dir_all(&staging)?;
                    }
                    fs::create_dir_all(&staging)?;
                }
                PackageStep::CopyFile { source, dest_name } => {
                    if !source.is_file() {
                        return Err(PackageError::MissingInput(source.clone()));
                    }
                    if !staging.is_dir() {
                        return Err(PackageError::MissingInput(staging.clone()));
                    }
                    fs::copy(source, staging.join(dest_name))?;
                }
                PackageStep::Compress => {
                    if !staging.is_dir() {
                        return Err(PackageError::MissingInput(staging.clone()));
                    }
                    compress_dir(&staging, &self.staging_dir_name(label), &archive_path)?;
                }
            }
        }

        if !archive_path.is_file() {
            return Err(PackageError::NoArchive(archive_path));
        }

        let size = fs::metadata(&archive_path)?.len();
        let checksum = sha256_file(&archive_path)?;
        let name = self.archive_name(label);

        info!(label, archive = %name, size, "Archive created");

        Ok(Archive {
            name,
            path: archive_path,
            size,
            checksum,
        })
    }
}

/// Compress a staging directory into `archive_path` with `top_level` as
/// the single top-level directory inside the archive.
fn compress_dir(staging: &Path, top_level: &str, archive_path: &Path) -> Result<(), PackageError> {
    let file = fs::File::create(archive_path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(top_level, staging)?;
    let encoder = builder.into_inner()?;
    encoder.finish()?;
    Ok(())
}

/// SHA-256 of a file's bytes, hex-encoded.
fn sha256_file(path: &Path) -> Result<String, PackageError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

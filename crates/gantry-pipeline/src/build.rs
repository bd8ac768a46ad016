//! Toolchain invocation for platform targets.

use crate::error::BuildError;
use crate::target::TargetConfig;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info};

/// Result of a successful build: a binary at a deterministic,
/// target-specific output path.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Platform label the binary was built for.
    pub label: String,

    /// Toolchain triple used for the build.
    pub triple: String,

    /// Path to the release binary.
    pub binary_path: PathBuf,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Builder configuration.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Name of the binary the toolchain produces.
    pub bin_name: String,

    /// Checkout root the toolchain runs in.
    pub workspace_dir: PathBuf,
}

/// Invokes the toolchain for a target and locates the produced binary.
pub struct Builder {
    config: BuildConfig,
}

impl Builder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Deterministic output path for a target's release binary.
    pub fn binary_path(&self, target: &TargetConfig) -> PathBuf {
        self.config
            .workspace_dir
            .join("target")
            .join(&target.triple)
            .join("release")
            .join(&self.config.bin_name)
    }

    /// Toolchain command for a target, honoring any per-target override.
    fn command_for(&self, target: &TargetConfig) -> Vec<String> {
        match &target.build_command {
            Some(command) => command.clone(),
            None => vec![
                "cargo".to_string(),
                "build".to_string(),
                "--release".to_string(),
                "--target".to_string(),
                target.triple.clone(),
            ],
        }
    }

    /// Build a release binary for one target.
    ///
    /// Fatal to that target's job only; sibling targets are unaffected.
    pub async fn build(&self, target: &TargetConfig) -> Result<BuildOutput, BuildError> {
        let start = Instant::now();
        let command = self.command_for(target);

        if command.is_empty() {
            return Err(BuildError::EmptyCommand(target.label.clone()));
        }

        let exe = &command[0];
        let args = &command[1..];

        info!(label = %target.label, triple = %target.triple, "Building target");
        debug!(command = ?command, "Toolchain invocation");

        let child = Command::new(exe)
            .args(args)
            .current_dir(&self.config.workspace_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BuildError::Spawn {
                triple: target.triple.clone(),
                source: e,
            })?;

        let output = if target.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(target.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| BuildError::TimedOut {
                triple: target.triple.clone(),
                timeout_secs: target.timeout_secs,
            })?
            .map_err(|e| BuildError::Spawn {
                triple: target.triple.clone(),
                source: e,
            })?
        } else {
            child.wait_with_output().await.map_err(|e| BuildError::Spawn {
                triple: target.triple.clone(),
                source: e,
            })?
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(BuildError::Failed {
                triple: target.triple.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        let binary_path = self.binary_path(target);
        if !binary_path.is_file() {
            return Err(BuildError::MissingBinary {
                triple: target.triple.clone(),
                path: binary_path,
            });
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(label = %target.label, duration_ms, "Build finished");

        Ok(BuildOutput {
            label: target.label.clone(),
            triple: target.triple.clone(),
            binary_path,
            duration_ms,
        })
    }
}

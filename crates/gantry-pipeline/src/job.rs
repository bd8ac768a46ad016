//! Per-target job execution and reporting.
//!
//! Each job walks `Pending → Building → Packaging → Publishing` and ends
//! `Succeeded` or `Failed(stage, cause)`. No stage is skipped; the first
//! failure terminates the job and later stages do not run. Jobs are
//! isolated: a failure never affects sibling targets.

use crate::build::Builder;
use crate::package::{Archive, Packager};
use crate::target::TargetConfig;
use chrono::{DateTime, Utc};
use gantry_release::{AssetRef, Release, ReleaseHost};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Pipeline stage a job can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pending,
    Building,
    Packaging,
    Publishing,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Pending => "Pending",
            Stage::Building => "Building",
            Stage::Packaging => "Packaging",
            Stage::Publishing => "Publishing",
        };
        write!(f, "{}", name)
    }
}

/// Terminal outcome of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum JobOutcome {
    /// All stages passed. `asset` is `None` for dry runs, which stop
    /// after packaging.
    Succeeded { asset: Option<AssetRef> },

    /// A stage failed; later stages did not run.
    Failed { stage: Stage, cause: String },
}

/// Report for one target's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    /// Platform label.
    pub label: String,

    /// Toolchain triple.
    pub triple: String,

    /// Terminal outcome.
    pub outcome: JobOutcome,

    /// Archive metadata, present when packaging completed.
    pub archive: Option<Archive>,

    /// When the job started.
    pub started_at: DateTime<Utc>,

    /// Total job duration in milliseconds.
    pub duration_ms: u64,
}

impl JobReport {
    /// Whether this job reached `Succeeded`.
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, JobOutcome::Succeeded { .. })
    }

    /// One-line outcome, e.g. `macos: Failed(Building, <cause>)`.
    pub fn summary(&self) -> String {
        match &self.outcome {
            JobOutcome::Succeeded { .. } => format!("{}: Succeeded", self.label),
            JobOutcome::Failed { stage, cause } => {
                format!("{}: Failed({}, {})", self.label, stage, cause)
            }
        }
    }
}

/// Runs the build → package → publish sequence for single targets.
///
/// Holds no mutable state; one instance is shared across all job tasks.
pub struct JobRunner {
    builder: Builder,
    packager: Packager,
    host: Arc<dyn ReleaseHost>,
    readme: PathBuf,
    bin_name: String,
    dry_run: bool,
}

impl JobRunner {
    pub fn new(
        builder: Builder,
        packager: Packager,
        host: Arc<dyn ReleaseHost>,
        readme: PathBuf,
        bin_name: String,
        dry_run: bool,
    ) -> Self {
        Self {
            builder,
            packager,
            host,
            readme,
            bin_name,
            dry_run,
        }
    }

    /// Execute one target's job to its terminal state.
    pub async fn run_job(&self, release: &Release, target: &TargetConfig) -> JobReport {
        let started_at = Utc::now();
        let start = Instant::now();

        info!(label = %target.label, triple = %target.triple, "Job started");

        // Building
        let output = match self.builder.build(target).await {
            Ok(output) => output,
            Err(e) => {
                return failed_report(target, Stage::Building, e.to_string(), None, started_at, start)
            }
        };

        // Packaging, with any platform-specific step sequence honored
        let steps = match &target.package_steps {
            Some(steps) => steps.clone(),
            None => self.packager.plan_steps(&output, &self.readme, &self.bin_name),
        };
        let archive = match self.packager.package(&target.label, &steps) {
            Ok(archive) => archive,
            Err(e) => {
                return failed_report(
                    target,
                    Stage::Packaging,
                    e.to_string(),
                    None,
                    started_at,
                    start,
                )
            }
        };

        // Publishing
        if self.dry_run {
            info!(label = %target.label, archive = %archive.name, "Dry run, skipping publish");
            return JobReport {
                label: target.label.clone(),
                triple: target.triple.clone(),
                outcome: JobOutcome::Succeeded { asset: None },
                archive: Some(archive),
                started_at,
                duration_ms: start.elapsed().as_millis() as u64,
            };
        }

        // Each job resolves the endpoint itself; an idempotent read, safe
        // to repeat from concurrent siblings.
        let endpoint = match self.host.resolve_upload_url(release).await {
            Ok(endpoint) => endpoint,
            Err(e) => {
                return failed_report(
                    target,
                    Stage::Publishing,
                    e.to_string(),
                    Some(archive),
                    started_at,
                    start,
                )
            }
        };

        let bytes = match std::fs::read(&archive.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                return failed_report(
                    target,
                    Stage::Publishing,
                    e.to_string(),
                    Some(archive),
                    started_at,
                    start,
                )
            }
        };

        let asset = match self.host.upload_asset(&endpoint, &archive.name, bytes).await {
            Ok(asset) => asset,
            Err(e) => {
                return failed_report(
                    target,
                    Stage::Publishing,
                    e.to_string(),
                    Some(archive),
                    started_at,
                    start,
                )
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(label = %target.label, asset = %asset.name, duration_ms, "Job succeeded");

        JobReport {
            label: target.label.clone(),
            triple: target.triple.clone(),
            outcome: JobOutcome::Succeeded { asset: Some(asset) },
            archive: Some(archive),
            started_at,
            duration_ms,
        }
    }
}

fn failed_report(
    target: &TargetConfig,
    stage: Stage,
    cause: String,
    archive: Option<Archive>,
    started_at: DateTime<Utc>,
    start: Instant,
) -> JobReport {
    warn!(label = %target.label, %stage, %cause, "Job failed");
    JobReport {
        label: target.label.clone(),
        triple: target.triple.clone(),
        outcome: JobOutcome::Failed { stage, cause },
        archive,
        started_at,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(outcome: JobOutcome) -> JobReport {
        JobReport {
            label: "macos".to_string(),
            triple: "x86_64-apple-darwin".to_string(),
            outcome,
            archive: None,
            started_at: Utc::now(),
            duration_ms: 10,
        }
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Building.to_string(), "Building");
        assert_eq!(Stage::Packaging.to_string(), "Packaging");
        assert_eq!(Stage::Publishing.to_string(), "Publishing");
    }

    #[test]
    fn test_report_succeeded() {
        let report = report_with(JobOutcome::Succeeded { asset: None });
        assert!(report.succeeded());
        assert_eq!(report.summary(), "macos: Succeeded");
    }

    #[test]
    fn test_report_failed_summary() {
        let report = report_with(JobOutcome::Failed {
            stage: Stage::Building,
            cause: "toolchain missing".to_string(),
        });
        assert!(!report.succeeded());
        assert_eq!(
            report.summary(),
            "macos: Failed(Building, toolchain missing)"
        );
    }

    #[test]
    fn test_report_serializes() {
        let report = report_with(JobOutcome::Failed {
            stage: Stage::Publishing,
            cause: "name collision".to_string(),
        });
        let json = serde_json::to_value(&report).expect("serialize failed");
        assert_eq!(json["outcome"]["result"], "failed");
        assert_eq!(json["outcome"]["stage"], "publishing");
    }
}

//! Pipeline orchestration: matrix expansion and job aggregation.

use crate::build::{BuildConfig, Builder};
use crate::error::MatrixError;
use crate::job::{JobOutcome, JobReport, JobRunner, Stage};
use crate::package::Packager;
use crate::target::{validate_matrix, TargetConfig};
use chrono::Utc;
use futures::future::join_all;
use gantry_release::{Release, ReleaseHost};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Static pipeline configuration: the product identity and run policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Product name prefix used in all staging-directory and archive names.
    pub product: String,

    /// Binary name the toolchain produces; defaults to the product name.
    #[serde(default)]
    pub bin_name: Option<String>,

    /// Documentation file bundled into every archive.
    pub readme: PathBuf,

    /// Checkout root the toolchain runs in.
    pub workspace_dir: PathBuf,

    /// Directory where staging directories and archives are written.
    pub out_dir: PathBuf,

    /// Report partial success instead of overall failure when some
    /// targets fail.
    #[serde(default)]
    pub fail_open: bool,

    /// Build and package but skip publishing.
    #[serde(default)]
    pub dry_run: bool,
}

impl PipelineConfig {
    /// Config with conventional defaults for a product name.
    pub fn new(product: &str) -> Self {
        Self {
            product: product.to_string(),
            bin_name: None,
            readme: PathBuf::from("README.md"),
            workspace_dir: PathBuf::from("."),
            out_dir: PathBuf::from("dist"),
            fail_open: false,
            dry_run: false,
        }
    }

    /// Effective binary name.
    pub fn bin_name(&self) -> &str {
        self.bin_name.as_deref().unwrap_or(&self.product)
    }
}

/// Result of a complete pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Identity of this run.
    pub run_id: String,

    /// Overall result; with `fail_open`, partial success still counts.
    pub success: bool,

    /// True when the release was not published and nothing ran.
    pub idle: bool,

    /// Per-target job reports.
    pub jobs: Vec<JobReport>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl PipelineResult {
    /// Number of jobs that succeeded.
    pub fn passed_count(&self) -> usize {
        self.jobs.iter().filter(|j| j.succeeded()).count()
    }

    /// Number of jobs that failed.
    pub fn failed_count(&self) -> usize {
        self.jobs.iter().filter(|j| !j.succeeded()).count()
    }

    /// Labels of failed jobs, sufficient to re-run only those targets.
    pub fn failed_labels(&self) -> Vec<String> {
        self.jobs
            .iter()
            .filter(|j| !j.succeeded())
            .map(|j| j.label.clone())
            .collect()
    }
}

/// Pipeline orchestrator.
pub struct Pipeline;

impl Pipeline {
    /// Run one independent job per enabled target and aggregate outcomes.
    ///
    /// The release is an explicit input: a state other than `published`
    /// yields an idle result with zero builds and zero uploads. Jobs run
    /// in their own tasks with no shared mutable state; a failed job
    /// never cancels its siblings.
    pub async fn run(
        host: Arc<dyn ReleaseHost>,
        config: &PipelineConfig,
        release: &Release,
        targets: Vec<TargetConfig>,
    ) -> Result<PipelineResult, MatrixError> {
        let start = Instant::now();
        let run_id = Uuid::new_v4().to_string();

        validate_matrix(&targets)?;

        if !release.is_published() {
            info!(
                run_id = %run_id,
                release_id = release.id,
                state = ?release.state,
                "Release not published, pipeline idle"
            );
            return Ok(PipelineResult {
                run_id,
                success: true,
                idle: true,
                jobs: Vec::new(),
                duration_ms: start.elapsed().as_millis() as u64,
            });
        }

        let enabled: Vec<TargetConfig> = targets.into_iter().filter(|t| t.enabled).collect();

        info!(
            run_id = %run_id,
            release_id = release.id,
            tag = %release.tag,
            targets = enabled.len(),
            "Starting release pipeline"
        );

        let runner = Arc::new(JobRunner::new(
            Builder::new(BuildConfig {
                bin_name: config.bin_name().to_string(),
                workspace_dir: config.workspace_dir.clone(),
            }),
            Packager::new(&config.product, &config.out_dir),
            host,
            config.readme.clone(),
            config.bin_name().to_string(),
            config.dry_run,
        ));

        let mut meta = Vec::new();
        let mut tasks = Vec::new();
        for target in enabled {
            let runner = runner.clone();
            let release = release.clone();
            meta.push((target.label.clone(), target.triple.clone()));
            tasks.push(tokio::spawn(async move {
                runner.run_job(&release, &target).await
            }));
        }

        let mut jobs = Vec::new();
        for ((label, triple), joined) in meta.into_iter().zip(join_all(tasks).await) {
            match joined {
                Ok(report) => jobs.push(report),
                Err(e) => jobs.push(JobReport {
                    label,
                    triple,
                    outcome: JobOutcome::Failed {
                        stage: Stage::Pending,
                        cause: format!("Job task aborted: {}", e),
                    },
                    archive: None,
                    started_at: Utc::now(),
                    duration_ms: 0,
                }),
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let all_passed = jobs.iter().all(|j| j.succeeded());
        let any_passed = jobs.iter().any(|j| j.succeeded());
        let success = all_passed || (config.fail_open && any_passed);

        if all_passed {
            info!(run_id = %run_id, jobs = jobs.len(), duration_ms, "Pipeline completed");
        } else {
            warn!(
                run_id = %run_id,
                failed = jobs.iter().filter(|j| !j.succeeded()).count(),
                duration_ms,
                "Pipeline finished with failures"
            );
        }

        Ok(PipelineResult {
            run_id,
            success,
            idle: false,
            jobs,
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_release::AssetRef;

    fn report(label: &str, succeeded: bool) -> JobReport {
        JobReport {
            label: label.to_string(),
            triple: format!("{}-triple", label),
            outcome: if succeeded {
                JobOutcome::Succeeded {
                    asset: Some(AssetRef {
                        id: 1,
                        name: format!("app-{}.tar.gz", label),
                        url: "memory://assets/1".to_string(),
                    }),
                }
            } else {
                JobOutcome::Failed {
                    stage: Stage::Building,
                    cause: "boom".to_string(),
                }
            },
            archive: None,
            started_at: Utc::now(),
            duration_ms: 100,
        }
    }

    #[test]
    fn test_pipeline_result_counts() {
        let result = PipelineResult {
            run_id: "run123".to_string(),
            success: true,
            idle: false,
            jobs: vec![report("linux", true), report("macos", true)],
            duration_ms: 300,
        };

        assert_eq!(result.passed_count(), 2);
        assert_eq!(result.failed_count(), 0);
        assert!(result.failed_labels().is_empty());
    }

    #[test]
    fn test_pipeline_result_with_failures() {
        let result = PipelineResult {
            run_id: "run123".to_string(),
            success: false,
            idle: false,
            jobs: vec![report("linux", true), report("macos", false)],
            duration_ms: 300,
        };

        assert_eq!(result.passed_count(), 1);
        assert_eq!(result.failed_count(), 1);
        assert_eq!(result.failed_labels(), vec!["macos"]);
    }

    #[test]
    fn test_pipeline_config_bin_name_defaults_to_product() {
        let config = PipelineConfig::new("cfn-guard-v2");
        assert_eq!(config.bin_name(), "cfn-guard-v2");

        let config = PipelineConfig {
            bin_name: Some("guard".to_string()),
            ..PipelineConfig::new("cfn-guard-v2")
        };
        assert_eq!(config.bin_name(), "guard");
    }
}

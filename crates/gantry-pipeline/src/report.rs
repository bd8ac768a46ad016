//! Run verdict evaluation for pass/fail criteria.

use crate::pipeline::PipelineResult;
use serde::{Deserialize, Serialize};

/// Verdict over a completed pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunVerdict {
    /// Whether every job reached `Succeeded`.
    pub passed: bool,

    /// One entry per failed job (empty if passed), each naming the
    /// label, stage, and cause.
    pub violations: Vec<String>,

    /// Summary message.
    pub message: String,
}

/// Run verdict evaluation rules.
pub struct RunGate;

impl RunGate {
    /// Evaluate whether all jobs in a run passed.
    ///
    /// Violations carry enough detail to re-run only the failed targets.
    pub fn evaluate(result: &PipelineResult) -> RunVerdict {
        if result.idle {
            return RunVerdict {
                passed: true,
                violations: Vec::new(),
                message: "Release not published; nothing to do".to_string(),
            };
        }

        let violations: Vec<String> = result
            .jobs
            .iter()
            .filter(|j| !j.succeeded())
            .map(|j| j.summary())
            .collect();

        let passed = violations.is_empty();
        let message = if passed {
            format!("All {} target(s) succeeded", result.jobs.len())
        } else {
            format!("{} target(s) failed", violations.len())
        };

        RunVerdict {
            passed,
            violations,
            message,
        }
    }
}

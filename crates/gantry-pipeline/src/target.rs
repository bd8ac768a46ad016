//! Platform target definitions and matrix configuration.

use crate::error::MatrixError;
use crate::package::PackageStep;
use serde::{Deserialize, Serialize};

/// Default build timeout; compilations are slow but not unbounded.
pub const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 3600;

/// Builtin platform targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinTarget {
    /// x86_64-unknown-linux-musl
    LinuxMusl,

    /// x86_64-apple-darwin
    MacOs,
}

impl BuiltinTarget {
    /// Platform label used in staging-directory and archive names.
    pub fn label(&self) -> &'static str {
        match self {
            BuiltinTarget::LinuxMusl => "linux",
            BuiltinTarget::MacOs => "macos",
        }
    }

    /// Toolchain target triple.
    pub fn triple(&self) -> &'static str {
        match self {
            BuiltinTarget::LinuxMusl => "x86_64-unknown-linux-musl",
            BuiltinTarget::MacOs => "x86_64-apple-darwin",
        }
    }
}

/// Configuration for a single platform target.
///
/// One instance per supported platform; immutable once the pipeline runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Platform label (unique within the matrix; used in output naming).
    pub label: String,

    /// Toolchain target triple.
    pub triple: String,

    /// Override for the toolchain invocation (first element is the
    /// executable). When absent the builder derives the command from the
    /// triple.
    #[serde(default)]
    pub build_command: Option<Vec<String>>,

    /// Override for the packaging step sequence. When absent the
    /// packager stages the binary and the docs file, then compresses.
    #[serde(default)]
    pub package_steps: Option<Vec<PackageStep>>,

    /// Build timeout in seconds (0 = unlimited).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Whether this target participates in the run.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_timeout() -> u64 {
    DEFAULT_BUILD_TIMEOUT_SECS
}

fn default_enabled() -> bool {
    true
}

impl TargetConfig {
    /// Create a target configuration from a builtin target.
    pub fn from_builtin(target: BuiltinTarget) -> Self {
        Self {
            label: target.label().to_string(),
            triple: target.triple().to_string(),
            build_command: None,
            package_steps: None,
            timeout_secs: DEFAULT_BUILD_TIMEOUT_SECS,
            enabled: true,
        }
    }

    /// Create a custom target configuration.
    pub fn custom(label: &str, triple: &str, build_command: Vec<String>) -> Self {
        Self {
            label: label.to_string(),
            triple: triple.to_string(),
            build_command: Some(build_command),
            package_steps: None,
            timeout_secs: DEFAULT_BUILD_TIMEOUT_SECS,
            enabled: true,
        }
    }

    /// Set a platform-specific packaging step sequence.
    pub fn with_package_steps(mut self, steps: Vec<PackageStep>) -> Self {
        self.package_steps = Some(steps);
        self
    }

    /// Set the build timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Disable this target.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// The default build matrix: one entry per builtin target.
pub fn default_matrix() -> Vec<TargetConfig> {
    vec![
        TargetConfig::from_builtin(BuiltinTarget::LinuxMusl),
        TargetConfig::from_builtin(BuiltinTarget::MacOs),
    ]
}

/// Validate a configured matrix: non-empty, labels unique.
///
/// Unique labels make archive names collision-free across the matrix.
pub fn validate_matrix(targets: &[TargetConfig]) -> Result<(), MatrixError> {
    if targets.is_empty() {
        return Err(MatrixError::EmptyMatrix);
    }

    let mut seen = std::collections::HashSet::new();
    for target in targets {
        if !seen.insert(target.label.as_str()) {
            return Err(MatrixError::DuplicateLabel(target.label.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_target_labels() {
        assert_eq!(BuiltinTarget::LinuxMusl.label(), "linux");
        assert_eq!(BuiltinTarget::MacOs.label(), "macos");
    }

    #[test]
    fn test_builtin_target_triples() {
        assert_eq!(BuiltinTarget::LinuxMusl.triple(), "x86_64-unknown-linux-musl");
        assert_eq!(BuiltinTarget::MacOs.triple(), "x86_64-apple-darwin");
    }

    #[test]
    fn test_target_config_from_builtin() {
        let config = TargetConfig::from_builtin(BuiltinTarget::LinuxMusl);
        assert_eq!(config.label, "linux");
        assert_eq!(config.triple, "x86_64-unknown-linux-musl");
        assert!(config.build_command.is_none());
        assert!(config.enabled);
    }

    #[test]
    fn test_target_config_custom() {
        let config = TargetConfig::custom(
            "freebsd",
            "x86_64-unknown-freebsd",
            vec!["make".to_string(), "release".to_string()],
        );
        assert_eq!(config.label, "freebsd");
        assert!(config.build_command.is_some());
        assert!(config.enabled);
    }

    #[test]
    fn test_target_config_package_steps_override() {
        let steps = vec![PackageStep::MakeStagingDir, PackageStep::Compress];
        let config = TargetConfig::from_builtin(BuiltinTarget::LinuxMusl)
            .with_package_steps(steps.clone());
        assert_eq!(config.package_steps, Some(steps));
    }

    #[test]
    fn test_target_config_disabled() {
        let config = TargetConfig::from_builtin(BuiltinTarget::MacOs).disabled();
        assert!(!config.enabled);
    }

    #[test]
    fn test_default_matrix_labels_unique() {
        let matrix = default_matrix();
        assert!(validate_matrix(&matrix).is_ok());
    }

    #[test]
    fn test_validate_empty_matrix() {
        assert!(matches!(validate_matrix(&[]), Err(MatrixError::EmptyMatrix)));
    }

    #[test]
    fn test_validate_duplicate_labels() {
        let matrix = vec![
            TargetConfig::from_builtin(BuiltinTarget::LinuxMusl),
            TargetConfig::custom("linux", "aarch64-unknown-linux-musl", vec!["true".to_string()]),
        ];
        assert!(matches!(
            validate_matrix(&matrix),
            Err(MatrixError::DuplicateLabel(label)) if label == "linux"
        ));
    }

    #[test]
    fn test_target_config_serde_defaults() {
        let config: TargetConfig = serde_json::from_str(
            r#"{"label": "linux", "triple": "x86_64-unknown-linux-musl"}"#,
        )
        .expect("target config should parse");
        assert!(config.enabled);
        assert!(config.build_command.is_none());
        assert_eq!(config.timeout_secs, DEFAULT_BUILD_TIMEOUT_SECS);
    }
}

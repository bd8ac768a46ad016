//! Matrix manifest loading.

use anyhow::{Context, Result};
use gantry_pipeline::{default_matrix, TargetConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk pipeline manifest: product identity and target matrix.
///
/// Absent fields fall back to conventional defaults so a minimal
/// manifest only names the product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Product name prefix used in all archive names.
    pub product: String,

    /// Binary name the toolchain produces; defaults to the product name.
    #[serde(default)]
    pub bin_name: Option<String>,

    /// Documentation file bundled into every archive.
    #[serde(default = "default_readme")]
    pub readme: PathBuf,

    /// Platform target matrix; builtin targets if omitted.
    #[serde(default = "default_matrix")]
    pub targets: Vec<TargetConfig>,
}

fn default_readme() -> PathBuf {
    PathBuf::from("README.md")
}

impl Default for Manifest {
    fn default() -> Self {
        Manifest {
            product: "gantry".to_string(),
            bin_name: None,
            readme: default_readme(),
            targets: default_matrix(),
        }
    }
}

impl Manifest {
    /// Load a manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {:?}", path))
    }

    /// Load from a path when given, otherwise the builtin defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

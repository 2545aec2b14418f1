//! Kiln.toml configuration parsing
//!
//! Shared configuration used by the checks and simd commands. The file is
//! optional; a project without kiln.toml gets the defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Kiln.toml configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub checks: ChecksSection,
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default)]
    pub simd: SimdSection,
}

/// Checks section
#[derive(Debug, Deserialize)]
pub struct ChecksSection {
    /// Manifest whose default feature block gets toggled, relative to the
    /// project root
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
}

fn default_manifest() -> PathBuf {
    PathBuf::from("vendor/kiln-devtools/Cargo.toml")
}

impl Default for ChecksSection {
    fn default() -> Self {
        ChecksSection {
            manifest: default_manifest(),
        }
    }
}

/// Source scanning section
#[derive(Debug, Default, Deserialize)]
pub struct ScanSection {
    /// Directory names to skip, in addition to hidden directories and
    /// `target`
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// SIMD guard rewriting section
#[derive(Debug, Default, Deserialize)]
pub struct SimdSection {
    /// Subtree whose sources get rewritten (defaults to the whole project)
    pub root: Option<PathBuf>,
}

impl Config {
    /// Load kiln.toml from the project root, falling back to defaults when
    /// the file does not exist.
    pub fn load(project: &Path) -> Result<Self> {
        let path = project.join("kiln.toml");
        if !path.is_file() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse kiln.toml")
    }

    /// Path of the devtools manifest to toggle
    pub fn manifest_path(&self, project: &Path) -> PathBuf {
        project.join(&self.checks.manifest)
    }

    /// Root of the subtree rewritten by simd commands
    pub fn simd_root(&self, project: &Path) -> PathBuf {
        match &self.simd.root {
            Some(root) => project.join(root),
            None => project.to_path_buf(),
        }
    }
}

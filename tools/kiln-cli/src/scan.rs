//! Project source scanning
//!
//! Walks a project tree for Rust sources, skipping hidden directories,
//! `target` and configured excludes, and counts check call sites across
//! files in parallel.

use std::path::{Path, PathBuf};

use anyhow::Result;
use kiln_devtools::checks::groups::{self, GroupCounts};
use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;

/// Collect every `.rs` file under `root`.
pub fn rust_sources(root: &Path, exclude: &[String]) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !skip_dir(entry, exclude))
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some("rs")
        })
        .map(|entry| entry.into_path())
        .collect()
}

fn skip_dir(entry: &DirEntry, exclude: &[String]) -> bool {
    // depth 0 is the root itself, never skipped
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }

    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "target" || exclude.iter().any(|e| *e == name)
}

/// Count check call sites in every source file of the project.
///
/// Sources under the devtools manifest's directory are excluded so the
/// check definitions themselves do not count as call sites. Pass the
/// manifest resolved by [`find_devtools_manifest`] so a moved package is
/// still excluded. Unreadable files log a warning and count as zero.
pub fn count_project(project: &Path, config: &Config, devtools_manifest: &Path) -> GroupCounts {
    let devtools_dir = devtools_manifest.parent().map(PathBuf::from);
    let sources: Vec<PathBuf> = rust_sources(project, &config.scan.exclude)
        .into_iter()
        .filter(|path| match &devtools_dir {
            Some(dir) => !path.starts_with(dir),
            None => true,
        })
        .collect();

    sources
        .par_iter()
        .map(|path| match std::fs::read_to_string(path) {
            Ok(source) => groups::count_in_source(&source),
            Err(error) => {
                tracing::warn!("Skipping unreadable file {}: {}", path.display(), error);
                GroupCounts::default()
            }
        })
        .reduce(GroupCounts::default, |a, b| a + b)
}

/// Locate the kiln-devtools manifest whose features get toggled.
///
/// Tries the configured path first, then searches the tree for a
/// Cargo.toml whose package name is `kiln-devtools`.
pub fn find_devtools_manifest(project: &Path, config: &Config) -> Result<PathBuf> {
    let configured = config.manifest_path(project);
    if configured.is_file() {
        return Ok(configured);
    }

    let found = WalkDir::new(project)
        .into_iter()
        .filter_entry(|entry| !skip_dir(entry, &config.scan.exclude))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == "Cargo.toml")
        .find(|entry| {
            std::fs::read_to_string(entry.path())
                .map(|manifest| manifest.contains("name = \"kiln-devtools\""))
                .unwrap_or(false)
        });

    match found {
        Some(entry) => Ok(entry.into_path()),
        None => anyhow::bail!(
            "'{}' was moved and cannot be found. Enabling or disabling checks is not \
             supported without the kiln-devtools manifest.",
            configured.display()
        ),
    }
}

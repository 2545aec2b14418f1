//! Safety check group management
//!
//! Status, toggling and call counting for the check groups of the vendored
//! kiln-devtools crate. Toggling comments entries of the manifest's default
//! feature list in or out, so a disabled group compiles to nothing while
//! the manifest stays diffable.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use kiln_devtools::checks::groups::{CheckGroup, GROUPS};
use kiln_devtools::patch;

use crate::config::Config;
use crate::scan;
use crate::ProjectArgs;

#[derive(Subcommand)]
pub enum ChecksCommand {
    /// Show every check group with its state and call count
    Status(ProjectArgs),

    /// Enable check groups in the vendored manifest
    Enable(ToggleArgs),

    /// Disable check groups in the vendored manifest
    Disable(ToggleArgs),

    /// Count check call sites per group
    Count(ProjectArgs),
}

/// Arguments for enabling or disabling check groups
#[derive(Debug, Args)]
pub struct ToggleArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Check groups, by feature name (e.g. bounds-checks)
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub groups: Vec<String>,

    /// Toggle every check group
    #[arg(long)]
    pub all: bool,
}

/// Execute a checks subcommand
pub fn execute(command: ChecksCommand) -> Result<()> {
    match command {
        ChecksCommand::Status(args) => status(args),
        ChecksCommand::Enable(args) => toggle(args, true),
        ChecksCommand::Disable(args) => toggle(args, false),
        ChecksCommand::Count(args) => count(args),
    }
}

/// Show group state from the manifest plus call counts from the scan
fn status(args: ProjectArgs) -> Result<()> {
    let config = Config::load(&args.project)?;
    let manifest_path = scan::find_devtools_manifest(&args.project, &config)?;
    let manifest = fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read manifest: {}", manifest_path.display()))?;

    let counts = scan::count_project(&args.project, &config, &manifest_path);

    println!("═══════════════════════════════════════════════════════════");
    println!("Kiln Safety Checks: {}", manifest_path.display());
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("  All Checks ({})", calls(counts.total()));
    println!("───────────────────────────────────────────────────────────");

    for (group, count) in GROUPS.iter().zip(counts.counts) {
        let enabled = feature_enabled(&manifest, &manifest_path, group.feature)?;
        let mark = if enabled {
            "[x]".green()
        } else {
            "[ ]".normal()
        };
        println!("  {} {} ({})", mark, group.title, calls(count));
    }

    Ok(())
}

/// Enable or disable the selected groups in the vendored manifest
fn toggle(args: ToggleArgs, enabled: bool) -> Result<()> {
    let config = Config::load(&args.project.project)?;
    let manifest_path = scan::find_devtools_manifest(&args.project.project, &config)?;
    let manifest = fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read manifest: {}", manifest_path.display()))?;

    let state = if enabled { "enabled" } else { "disabled" };
    let mut patched = manifest;
    let mut changed_any = false;

    for group in selected_groups(&args)? {
        let (next, changed) = feature_set(&patched, &manifest_path, group.feature, enabled)?;
        patched = next;
        changed_any |= changed;

        if changed {
            println!("{} {} {}", "✓".green(), group.title, state);
        } else {
            println!("  {} already {}", group.title, state);
        }
    }

    if changed_any {
        fs::write(&manifest_path, patched)
            .with_context(|| format!("Failed to write manifest: {}", manifest_path.display()))?;
    }

    Ok(())
}

/// Print the per-group call-site table without touching the manifest
fn count(args: ProjectArgs) -> Result<()> {
    let config = Config::load(&args.project)?;

    // counting works without the devtools package; fall back to the
    // configured location for the exclusion
    let manifest_path = scan::find_devtools_manifest(&args.project, &config)
        .unwrap_or_else(|_| config.manifest_path(&args.project));
    let counts = scan::count_project(&args.project, &config, &manifest_path);

    let width = GROUPS
        .iter()
        .map(|group| group.title.len())
        .max()
        .unwrap_or(0);

    println!("CHECK CALL SITES");
    println!("───────────────────────────────────────────────────────────");
    for (group, count) in GROUPS.iter().zip(counts.counts) {
        println!("  {:<width$}  {:>6}", group.title, count);
    }
    println!("  {:<width$}  {:>6}", "All Checks", counts.total());

    Ok(())
}

/// Resolve the group arguments, or every group with `--all`.
fn selected_groups(args: &ToggleArgs) -> Result<Vec<CheckGroup>> {
    if args.all {
        return Ok(GROUPS.to_vec());
    }

    args.groups
        .iter()
        .map(|name| {
            GROUPS
                .iter()
                .copied()
                .find(|group| group.feature == name)
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "Unknown check group '{}'. Valid groups: {}",
                        name,
                        GROUPS
                            .iter()
                            .map(|group| group.feature)
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                })
        })
        .collect()
}

fn feature_enabled(manifest: &str, path: &Path, feature: &str) -> Result<bool> {
    patch::feature_enabled(manifest, feature)
        .with_context(|| format!("Bad feature block in {}", path.display()))
}

fn feature_set(
    manifest: &str,
    path: &Path,
    feature: &str,
    enabled: bool,
) -> Result<(String, bool)> {
    patch::set_feature(manifest, feature, enabled)
        .with_context(|| format!("Bad feature block in {}", path.display()))
}

fn calls(count: u64) -> String {
    if count == 1 {
        format!("{} call", count)
    } else {
        format!("{} calls", count)
    }
}

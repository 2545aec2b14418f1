//! SIMD guard rewriting
//!
//! Kiln SIMD code branches on dispatch guards such as `have_avx2()` and on
//! the constant-folding guard `is_const_known()`. In plain test builds the
//! guards report `false`, so the guarded branches never execute. To test
//! one code path anyway, `set-path` rewrites the guard call sites in the
//! tree: guards up to the chosen tier get negated, every other guard is
//! restored. `release` undoes all overrides.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use kiln_devtools::patch;
use rayon::prelude::*;

use crate::config::Config;
use crate::scan;
use crate::ProjectArgs;

// Guard call sites as spelled in source. The trailing parens keep
// have_sse() from matching inside have_sse2().
const SSE: &str = "have_sse()";
const SSE2: &str = "have_sse2()";
const SSE3: &str = "have_sse3()";
const SSSE3: &str = "have_ssse3()";
const SSE41: &str = "have_sse41()";
const SSE42: &str = "have_sse42()";
const AVX: &str = "have_avx()";
const AVX2: &str = "have_avx2()";
const FMA: &str = "have_fma()";
const BMI1: &str = "have_bmi1()";
const BMI2: &str = "have_bmi2()";
const POPCNT: &str = "have_popcnt()";
const F16C: &str = "have_f16c()";

const CONST_KNOWN: &str = "is_const_known()";

/// Every dispatch guard, for tree-wide restores.
const ALL_GUARDS: [&str; 13] = [
    SSE, SSE2, SSE3, SSSE3, SSE41, SSE42, AVX, AVX2, FMA, BMI1, BMI2, POPCNT, F16C,
];

#[derive(Subcommand)]
pub enum SimdCommand {
    /// Pin every SIMD guard to one dispatch tier
    SetPath(SetPathArgs),

    /// Pin the constant-folding guard
    ConstEval(ProjectArgs),

    /// Toggle the `testing` feature of the project manifest
    Testing(TestingArgs),

    /// Undo every override for a release build
    Release(ProjectArgs),
}

/// Arguments for pinning the dispatch tier
#[derive(Debug, Args)]
pub struct SetPathArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Highest instruction-set tier to activate
    #[arg(value_enum)]
    pub tier: Tier,
}

/// Arguments for toggling the testing feature
#[derive(Debug, Args)]
pub struct TestingArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Desired state
    #[arg(value_enum)]
    pub state: SwitchState,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SwitchState {
    On,
    Off,
}

/// Instruction-set tier of `set-path`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Tier {
    Sse,
    Sse2,
    Sse3,
    Ssse3,
    #[value(name = "sse4.1")]
    Sse41,
    #[value(name = "sse4.2")]
    Sse42,
    Avx,
    Avx2,
}

impl Tier {
    /// Guards negated when pinning to this tier. Each tier includes every
    /// lower one; avx2 additionally pulls the arithmetic extension guards.
    fn chain(self) -> &'static [&'static str] {
        match self {
            Tier::Sse => &[SSE],
            Tier::Sse2 => &[SSE, SSE2],
            Tier::Sse3 => &[SSE, SSE2, SSE3],
            Tier::Ssse3 => &[SSE, SSE2, SSE3, SSSE3],
            Tier::Sse41 => &[SSE, SSE2, SSE3, SSSE3, SSE41],
            Tier::Sse42 => &[SSE, SSE2, SSE3, SSSE3, SSE41, SSE42],
            Tier::Avx => &[SSE, SSE2, SSE3, SSSE3, SSE41, SSE42, AVX],
            Tier::Avx2 => &[
                SSE, SSE2, SSE3, SSSE3, SSE41, SSE42, AVX, AVX2, FMA, BMI1, BMI2, POPCNT, F16C,
            ],
        }
    }

    fn name(self) -> &'static str {
        match self {
            Tier::Sse => "sse",
            Tier::Sse2 => "sse2",
            Tier::Sse3 => "sse3",
            Tier::Ssse3 => "ssse3",
            Tier::Sse41 => "sse4.1",
            Tier::Sse42 => "sse4.2",
            Tier::Avx => "avx",
            Tier::Avx2 => "avx2",
        }
    }
}

/// Execute a simd subcommand
pub fn execute(command: SimdCommand) -> Result<()> {
    match command {
        SimdCommand::SetPath(args) => set_path(args),
        SimdCommand::ConstEval(args) => const_eval(args),
        SimdCommand::Testing(args) => testing(args),
        SimdCommand::Release(args) => release(args),
    }
}

/// Restore every tier guard, then negate the chain of the chosen tier
fn set_path(args: SetPathArgs) -> Result<()> {
    let config = Config::load(&args.project.project)?;
    let root = config.simd_root(&args.project.project);
    let chain = args.tier.chain();

    let patched = rewrite_sources(&root, &config, |source| {
        let mut result = restore_guards(source, &ALL_GUARDS);
        for guard in chain {
            result = patch::negate_token(&result, guard).0;
        }
        result
    })?;

    println!(
        "Pinned the SIMD path to {} in {} file(s)",
        args.tier.name(),
        patched
    );
    Ok(())
}

/// Negate the constant-folding guard tree-wide
fn const_eval(args: ProjectArgs) -> Result<()> {
    let config = Config::load(&args.project)?;
    let root = config.simd_root(&args.project);

    let patched = rewrite_sources(&root, &config, |source| {
        patch::negate_token(source, CONST_KNOWN).0
    })?;

    println!("Pinned the constant-folding guard in {} file(s)", patched);
    Ok(())
}

/// Toggle the `testing` feature in the project's Cargo.toml
fn testing(args: TestingArgs) -> Result<()> {
    let enabled = matches!(args.state, SwitchState::On);
    let manifest_path = args.project.project.join("Cargo.toml");
    let manifest = fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read manifest: {}", manifest_path.display()))?;

    let (patched, changed) = patch::set_feature(&manifest, "testing", enabled)
        .with_context(|| format!("Bad feature block in {}", manifest_path.display()))?;

    if changed {
        fs::write(&manifest_path, patched)
            .with_context(|| format!("Failed to write manifest: {}", manifest_path.display()))?;
        println!(
            "{} the `testing` feature",
            if enabled { "Enabled" } else { "Disabled" }
        );
    } else {
        println!(
            "The `testing` feature is already {}",
            if enabled { "on" } else { "off" }
        );
    }

    Ok(())
}

/// Disable testing and restore every guard
fn release(args: ProjectArgs) -> Result<()> {
    let config = Config::load(&args.project)?;

    // projects without a `testing` feature are fine, skip quietly
    let manifest_path = args.project.join("Cargo.toml");
    if manifest_path.is_file() {
        let manifest = fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read manifest: {}", manifest_path.display()))?;
        match patch::set_feature(&manifest, "testing", false) {
            Ok((patched, true)) => {
                fs::write(&manifest_path, patched).with_context(|| {
                    format!("Failed to write manifest: {}", manifest_path.display())
                })?;
            }
            Ok((_, false)) => {}
            Err(error) => tracing::debug!("No `testing` feature to disable: {}", error),
        }
    }

    let root = config.simd_root(&args.project);
    let restored = rewrite_sources(&root, &config, |source| {
        let result = restore_guards(source, &ALL_GUARDS);
        patch::restore_token(&result, CONST_KNOWN).0
    })?;

    println!("Restored SIMD guards in {} file(s)", restored);
    Ok(())
}

fn restore_guards(source: &str, guards: &[&str]) -> String {
    let mut result = source.to_string();
    for guard in guards {
        result = patch::restore_token(&result, guard).0;
    }
    result
}

/// Patch every Rust source under `root` in parallel, writing back only
/// files whose text changed. Returns the number of files written.
fn rewrite_sources<F>(root: &Path, config: &Config, patch_fn: F) -> Result<usize>
where
    F: Fn(&str) -> String + Sync,
{
    let sources = scan::rust_sources(root, &config.scan.exclude);

    let written: Vec<bool> = sources
        .par_iter()
        .map(|path| {
            let source = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let patched = patch_fn(&source);

            if patched != source {
                fs::write(path, &patched)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                Ok(true)
            } else {
                Ok(false)
            }
        })
        .collect::<Result<_>>()?;

    Ok(written.into_iter().filter(|&wrote| wrote).count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SOURCE: &str = r#"
pub fn widen(values: &[f32]) {
    if have_avx2() {
        wide_avx2(values);
    } else if have_sse2() {
        wide_sse2(values);
    }
    if is_const_known() {
        folded(values);
    }
}
"#;

    fn project(source: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/math.rs"), source).unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[features]\ndefault = [\n    \"testing\",\n]\ntesting = []\n",
        )
        .unwrap();
        dir
    }

    fn project_args(dir: &tempfile::TempDir) -> ProjectArgs {
        ProjectArgs {
            project: PathBuf::from(dir.path()),
        }
    }

    fn read_math(dir: &tempfile::TempDir) -> String {
        fs::read_to_string(dir.path().join("src/math.rs")).unwrap()
    }

    #[test]
    fn test_set_path_negates_the_chain() {
        let dir = project(SOURCE);

        set_path(SetPathArgs {
            project: project_args(&dir),
            tier: Tier::Sse2,
        })
        .unwrap();

        let patched = read_math(&dir);
        assert!(patched.contains("!have_sse2()"));
        assert!(!patched.contains("!have_avx2()"));
        assert!(!patched.contains("!is_const_known()"));
    }

    #[test]
    fn test_set_path_switches_tiers() {
        let dir = project(SOURCE);

        set_path(SetPathArgs {
            project: project_args(&dir),
            tier: Tier::Avx2,
        })
        .unwrap();
        let patched = read_math(&dir);
        assert!(patched.contains("!have_avx2()"));
        assert!(patched.contains("!have_sse2()"));

        set_path(SetPathArgs {
            project: project_args(&dir),
            tier: Tier::Sse2,
        })
        .unwrap();
        let patched = read_math(&dir);
        assert!(!patched.contains("!have_avx2()"));
        assert!(patched.contains("!have_sse2()"));
    }

    #[test]
    fn test_const_eval_spares_tier_guards() {
        let dir = project(SOURCE);

        const_eval(project_args(&dir)).unwrap();

        let patched = read_math(&dir);
        assert!(patched.contains("!is_const_known()"));
        assert!(!patched.contains("!have_avx2()"));
        assert!(!patched.contains("!have_sse2()"));
    }

    #[test]
    fn test_testing_toggles_the_feature() {
        let dir = project(SOURCE);

        testing(TestingArgs {
            project: project_args(&dir),
            state: SwitchState::Off,
        })
        .unwrap();
        let manifest = fs::read_to_string(dir.path().join("Cargo.toml")).unwrap();
        assert!(manifest.contains("# \"testing\""));

        testing(TestingArgs {
            project: project_args(&dir),
            state: SwitchState::On,
        })
        .unwrap();
        let manifest = fs::read_to_string(dir.path().join("Cargo.toml")).unwrap();
        assert!(manifest.contains("\"testing\""));
        assert!(!manifest.contains("# \"testing\""));
    }

    #[test]
    fn test_release_restores_everything() {
        let dir = project(SOURCE);

        set_path(SetPathArgs {
            project: project_args(&dir),
            tier: Tier::Avx2,
        })
        .unwrap();
        const_eval(project_args(&dir)).unwrap();

        release(project_args(&dir)).unwrap();

        assert_eq!(read_math(&dir), SOURCE);
        let manifest = fs::read_to_string(dir.path().join("Cargo.toml")).unwrap();
        assert!(manifest.contains("# \"testing\""));
    }

    #[test]
    fn test_release_is_idempotent() {
        let dir = project(SOURCE);

        release(project_args(&dir)).unwrap();
        release(project_args(&dir)).unwrap();

        assert_eq!(read_math(&dir), SOURCE);
    }
}

//! Integration tests for the kiln binary
//!
//! Each test builds a throwaway project tree, runs the real binary against
//! it and inspects the output plus the files it rewrote.

use std::path::Path;
use std::process::Output;

use tempfile::tempdir;

const DEVTOOLS_MANIFEST: &str = r#"[package]
name = "kiln-devtools"

[features]
default = [
    "bool-checks",
    "null-checks",
    "path-checks",
    "bounds-checks",
    "compare-checks",
    "arith-checks",
    "align-checks",
]
bool-checks = []
null-checks = []
path-checks = []
bounds-checks = []
compare-checks = []
arith-checks = []
align-checks = []
"#;

const GAME_SOURCE: &str = r#"use kiln_devtools::checks;

fn main() {
    checks::is_true(true);
    checks::is_true(true);
    checks::in_bounds(1, 4);
}
"#;

const SIMD_SOURCE: &str = r#"pub fn widen(values: &[f32]) {
    if have_avx2() {
        wide_avx2(values);
    } else if have_sse2() {
        wide_sse2(values);
    }
}
"#;

/// Write the standard fixture project
fn write_fixture(root: &Path) {
    std::fs::create_dir_all(root.join("vendor/kiln-devtools")).expect("Failed to create vendor");
    std::fs::write(root.join("vendor/kiln-devtools/Cargo.toml"), DEVTOOLS_MANIFEST)
        .expect("Failed to write devtools manifest");

    std::fs::create_dir_all(root.join("src")).expect("Failed to create src");
    std::fs::write(root.join("src/game.rs"), GAME_SOURCE).expect("Failed to write game source");
    std::fs::write(root.join("src/math.rs"), SIMD_SOURCE).expect("Failed to write simd source");

    std::fs::write(
        root.join("Cargo.toml"),
        "[package]\nname = \"game\"\n\n[features]\ndefault = [\n    \"testing\",\n]\ntesting = []\n",
    )
    .expect("Failed to write project manifest");
}

/// Run the kiln binary with `--project root`
fn kiln(root: &Path, args: &[&str]) -> Output {
    let mut command = std::process::Command::new(env!("CARGO_BIN_EXE_kiln"));
    command.args(args);
    command.args(["--project", root.to_str().unwrap()]);
    command.output().expect("Failed to run kiln")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_checks_status_lists_groups_with_counts() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_fixture(dir.path());

    let output = kiln(dir.path(), &["checks", "status"]);
    assert!(output.status.success(), "status failed: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("All Checks (3 calls)"), "got: {}", text);
    assert!(text.contains("[x] Boolean Condition Checks (2 calls)"));
    assert!(text.contains("[x] Array Bounds Checks (1 call)"));
    assert!(text.contains("[x] Memory Checks (0 calls)"));
}

#[test]
fn test_checks_disable_and_enable_rewrite_the_manifest() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_fixture(dir.path());
    let manifest_path = dir.path().join("vendor/kiln-devtools/Cargo.toml");

    let output = kiln(dir.path(), &["checks", "disable", "bounds-checks"]);
    assert!(output.status.success(), "disable failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Array Bounds Checks disabled"));

    let manifest = std::fs::read_to_string(&manifest_path).expect("Failed to read manifest");
    assert!(manifest.contains("# \"bounds-checks\""));
    assert!(!manifest.contains("# \"bool-checks\""));

    let output = kiln(dir.path(), &["checks", "status"]);
    assert!(stdout(&output).contains("[ ] Array Bounds Checks"));

    // disabling again changes nothing
    let output = kiln(dir.path(), &["checks", "disable", "bounds-checks"]);
    assert!(stdout(&output).contains("Array Bounds Checks already disabled"));

    let output = kiln(dir.path(), &["checks", "enable", "--all"]);
    assert!(output.status.success(), "enable failed: {}", stderr(&output));

    let manifest = std::fs::read_to_string(&manifest_path).expect("Failed to read manifest");
    assert_eq!(manifest, DEVTOOLS_MANIFEST);
}

#[test]
fn test_checks_count_prints_the_table() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_fixture(dir.path());

    let output = kiln(dir.path(), &["checks", "count"]);
    assert!(output.status.success(), "count failed: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("CHECK CALL SITES"));
    assert!(text.contains("Boolean Condition Checks"));
    assert!(text.contains("All Checks"));
}

#[test]
fn test_checks_unknown_group_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_fixture(dir.path());

    let output = kiln(dir.path(), &["checks", "disable", "speed-checks"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown check group 'speed-checks'"));
}

#[test]
fn test_checks_missing_manifest_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::create_dir_all(dir.path().join("src")).expect("Failed to create src");

    let output = kiln(dir.path(), &["checks", "enable", "--all"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("was moved and cannot be found"));
}

#[test]
fn test_config_redirects_manifest_and_excludes_dirs() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_fixture(dir.path());

    // move the devtools manifest and point kiln.toml at it
    std::fs::create_dir_all(dir.path().join("pkg/devtools")).expect("Failed to create pkg");
    std::fs::rename(
        dir.path().join("vendor/kiln-devtools/Cargo.toml"),
        dir.path().join("pkg/devtools/Cargo.toml"),
    )
    .expect("Failed to move manifest");

    // calls in an excluded directory must not count
    std::fs::create_dir_all(dir.path().join("ignored")).expect("Failed to create ignored");
    std::fs::write(
        dir.path().join("ignored/extra.rs"),
        "fn f() { kiln_devtools::checks::is_true(true); }\n",
    )
    .expect("Failed to write excluded source");

    std::fs::write(
        dir.path().join("kiln.toml"),
        "[checks]\nmanifest = \"pkg/devtools/Cargo.toml\"\n\n[scan]\nexclude = [\"ignored\"]\n",
    )
    .expect("Failed to write kiln.toml");

    let output = kiln(dir.path(), &["checks", "status"]);
    assert!(output.status.success(), "status failed: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("pkg/devtools/Cargo.toml"), "got: {}", text);
    assert!(text.contains("All Checks (3 calls)"), "got: {}", text);
}

#[test]
fn test_checks_status_excludes_moved_devtools_sources() {
    let dir = tempdir().expect("Failed to create temp dir");
    let root = dir.path();

    // the devtools package sits at a searched location, not the configured
    // one, and its own sources contain a call-site-looking string
    std::fs::create_dir_all(root.join("crates/kiln/src")).expect("Failed to create crates");
    std::fs::write(root.join("crates/kiln/Cargo.toml"), DEVTOOLS_MANIFEST)
        .expect("Failed to write devtools manifest");
    std::fs::write(
        root.join("crates/kiln/src/groups.rs"),
        "const SAMPLE: &str = \"kiln_devtools::checks::is_true(true);\";\n",
    )
    .expect("Failed to write devtools source");

    std::fs::create_dir_all(root.join("src")).expect("Failed to create src");
    std::fs::write(root.join("src/game.rs"), GAME_SOURCE).expect("Failed to write game source");

    let output = kiln(root, &["checks", "status"]);
    assert!(output.status.success(), "status failed: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("crates/kiln/Cargo.toml"), "got: {}", text);
    assert!(text.contains("All Checks (3 calls)"), "got: {}", text);
    assert!(text.contains("[x] Boolean Condition Checks (2 calls)"));
}

#[test]
fn test_simd_set_path_then_release_round_trips() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_fixture(dir.path());
    let math_path = dir.path().join("src/math.rs");

    let output = kiln(dir.path(), &["simd", "set-path", "sse2"]);
    assert!(output.status.success(), "set-path failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Pinned the SIMD path to sse2 in 1 file(s)"));

    let patched = std::fs::read_to_string(&math_path).expect("Failed to read source");
    assert!(patched.contains("!have_sse2()"));
    assert!(!patched.contains("!have_avx2()"));

    let output = kiln(dir.path(), &["simd", "set-path", "avx2"]);
    assert!(output.status.success());
    let patched = std::fs::read_to_string(&math_path).expect("Failed to read source");
    assert!(patched.contains("!have_avx2()"));

    let output = kiln(dir.path(), &["simd", "release"]);
    assert!(output.status.success(), "release failed: {}", stderr(&output));

    let restored = std::fs::read_to_string(&math_path).expect("Failed to read source");
    assert_eq!(restored, SIMD_SOURCE);

    let manifest =
        std::fs::read_to_string(dir.path().join("Cargo.toml")).expect("Failed to read manifest");
    assert!(manifest.contains("# \"testing\""));
}

#[test]
fn test_simd_testing_toggle() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_fixture(dir.path());

    let output = kiln(dir.path(), &["simd", "testing", "off"]);
    assert!(output.status.success(), "testing failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Disabled the `testing` feature"));

    let output = kiln(dir.path(), &["simd", "testing", "off"]);
    assert!(stdout(&output).contains("already off"));

    let output = kiln(dir.path(), &["simd", "testing", "on"]);
    assert!(stdout(&output).contains("Enabled the `testing` feature"));
}

//! Text-patch engines behind the `kiln` CLI
//!
//! Pure string surgery: callers read the file, patch the text here, and
//! decide whether to write the result back. Every operation is idempotent
//! and reports whether the text changed.
//!
//! Two engines:
//! - manifest feature toggling: comment an entry of a multi-line
//!   `default = [...]` block in or out
//! - guard rewriting: insert or remove a `!` before every occurrence of a
//!   guard call such as `have_avx2()`

use crate::checks;
use thiserror::Error;

/// Failure modes of the manifest feature toggles.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// The manifest has no `default = [` feature block.
    #[error("no `default = [` feature block found")]
    MissingDefaultBlock,
    /// The feature has no entry in the default feature block.
    #[error("feature `{0}` has no entry in the default feature block")]
    UnknownFeature(String),
}

/// Whether `feature` is enabled in the manifest's default feature list,
/// i.e. present and not commented out.
pub fn feature_enabled(manifest: &str, feature: &str) -> Result<bool, PatchError> {
    let (line_start, entry) = feature_entry(manifest, feature)?;
    Ok(!manifest[line_start..entry].contains('#'))
}

/// Enable or disable `feature` by uncommenting or commenting its entry in
/// the default feature list. Returns the patched text and whether anything
/// changed; already-correct state is left byte-identical.
pub fn set_feature(
    manifest: &str,
    feature: &str,
    enabled: bool,
) -> Result<(String, bool), PatchError> {
    let (line_start, entry) = feature_entry(manifest, feature)?;
    let marker = manifest[line_start..entry].find('#');

    let patched = match (marker, enabled) {
        (None, true) | (Some(_), false) => return Ok((manifest.to_string(), false)),
        (Some(offset), true) => {
            // uncomment: drop the marker and a single following space
            let marker = line_start + offset;
            let rest = &manifest[marker + 1..];
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            format!("{}{}", &manifest[..marker], rest)
        }
        (None, false) => {
            format!("{}# {}", &manifest[..entry], &manifest[entry..])
        }
    };

    Ok((patched, true))
}

/// Locate the quoted entry for `feature` inside the default feature block.
/// Returns the start of its line and the offset of the opening quote.
fn feature_entry(manifest: &str, feature: &str) -> Result<(usize, usize), PatchError> {
    let block = manifest
        .find("default = [")
        .ok_or(PatchError::MissingDefaultBlock)?;
    let block_end = manifest[block..]
        .find(']')
        .map(|i| block + i)
        .unwrap_or(manifest.len());

    let needle = format!("\"{}\"", feature);
    let entry = manifest[block..block_end]
        .find(&needle)
        .map(|i| block + i)
        .ok_or_else(|| PatchError::UnknownFeature(feature.to_string()))?;

    let line_start = manifest[..entry].rfind('\n').map(|i| i + 1).unwrap_or(0);
    Ok((line_start, entry))
}

/// Insert a `!` before every occurrence of `token` that is not already
/// negated, including one at the very start of the text. Returns the
/// patched text and whether anything changed.
pub fn negate_token(source: &str, token: &str) -> (String, bool) {
    let mut result = String::with_capacity(source.len() + 8);
    let mut changed = false;
    let mut copied = 0;

    for (index, _) in source.match_indices(token) {
        if !source[..index].ends_with('!') {
            result.push_str(&source[copied..index]);
            result.push('!');
            copied = index;
            changed = true;
        }
    }
    result.push_str(&source[copied..]);

    (result, changed)
}

/// Remove the `!` before every negated occurrence of `token`. Returns the
/// patched text and whether anything changed.
pub fn restore_token(source: &str, token: &str) -> (String, bool) {
    let negated = format!("!{}", token);
    if !source.contains(&negated) {
        return (source.to_string(), false);
    }

    (source.replace(&negated, token), true)
}

/// Count non-overlapping occurrences of `needle` in `haystack`.
pub fn count_substring(haystack: &str, needle: &str) -> u64 {
    checks::is_false(needle.is_empty());

    haystack.matches(needle).count() as u64
}

//! Check-group metadata and call-site counting
//!
//! [`GROUPS`] is the static description of every check group: its public
//! title, the cargo feature that gates it, and the names of its check
//! functions. The counting here is a text heuristic over source files; it
//! deliberately does not parse Rust.

use std::ops::{Add, AddAssign};

/// Static description of one check group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckGroup {
    /// Human-readable title.
    pub title: &'static str,
    /// Cargo feature of `kiln-devtools` gating the group.
    pub feature: &'static str,
    /// Check functions belonging to the group.
    pub functions: &'static [&'static str],
}

/// Every check group, in the order of the manifest's default feature list.
pub const GROUPS: [CheckGroup; 7] = [
    CheckGroup {
        title: "Boolean Condition Checks",
        feature: "bool-checks",
        functions: &["is_true", "is_false"],
    },
    CheckGroup {
        title: "Null Checks",
        feature: "null-checks",
        functions: &["is_none", "is_some", "is_null", "is_not_null"],
    },
    CheckGroup {
        title: "File Path Checks",
        feature: "path-checks",
        functions: &["file_exists"],
    },
    CheckGroup {
        title: "Array Bounds Checks",
        feature: "bounds-checks",
        functions: &["in_bounds", "valid_subslice", "subslices_disjoint"],
    },
    CheckGroup {
        title: "Comparison Checks",
        feature: "compare-checks",
        functions: &[
            "is_positive",
            "is_negative",
            "non_negative",
            "non_positive",
            "are_equal",
            "are_not_equal",
            "is_between",
            "is_smaller",
            "is_greater",
            "is_smaller_or_equal",
            "is_greater_or_equal",
        ],
    },
    CheckGroup {
        title: "Arithmetic-Logic Checks",
        feature: "arith-checks",
        functions: &["is_safe_bool", "defined_shift"],
    },
    CheckGroup {
        title: "Memory Checks",
        feature: "align-checks",
        functions: &["is_aligned"],
    },
];

/// Per-group call counts, merged across files by addition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupCounts {
    /// One slot per entry of [`GROUPS`], in the same order.
    pub counts: [u64; GROUPS.len()],
}

impl GroupCounts {
    /// Sum over all groups.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl Add for GroupCounts {
    type Output = GroupCounts;

    fn add(mut self, other: GroupCounts) -> GroupCounts {
        self += other;
        self
    }
}

impl AddAssign for GroupCounts {
    fn add_assign(&mut self, other: GroupCounts) {
        for (slot, count) in self.counts.iter_mut().zip(other.counts) {
            *slot += count;
        }
    }
}

/// How check calls are spelled in `source`, judged from its `use` lines:
/// bare names after a glob import, `checks::` after a module import, the
/// full crate path otherwise.
pub fn call_prefix(source: &str) -> &'static str {
    if source.contains("use kiln_devtools::checks::*") {
        ""
    } else if source.contains("use kiln_devtools::checks;") {
        "checks::"
    } else {
        "kiln_devtools::checks::"
    }
}

/// Count the check call sites of every group in one file's text.
///
/// A call site is the file's prefix followed by a check function name and
/// either an argument list or a turbofish. Matches glued to a preceding
/// identifier or `.` are skipped, so `value.is_positive()` does not count.
pub fn count_in_source(source: &str) -> GroupCounts {
    let prefix = call_prefix(source);
    let mut result = GroupCounts::default();

    for (slot, group) in result.counts.iter_mut().zip(GROUPS.iter()) {
        for function in group.functions {
            *slot += count_calls(source, prefix, function);
        }
    }

    result
}

fn count_calls(source: &str, prefix: &str, function: &str) -> u64 {
    let needle = format!("{}{}", prefix, function);
    let mut count = 0;

    for (index, matched) in source.match_indices(&needle) {
        let glued_left = source[..index]
            .chars()
            .next_back()
            .is_some_and(|c| c == '.' || c == '_' || c.is_ascii_alphanumeric());
        let tail = &source[index + matched.len()..];
        let called = tail.starts_with('(') || tail.starts_with("::<");

        if called && !glued_left {
            count += 1;
        }
    }

    count
}

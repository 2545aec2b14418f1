//! Grouped safety checks
//!
//! Every check belongs to one of seven groups, each controlled by a cargo
//! feature of this crate. A group is active only in debug builds with its
//! feature enabled; inactive checks compile to nothing. The `kiln` CLI
//! toggles groups by commenting entries in and out of this crate's default
//! feature list.
//!
//! Checks panic on violation, with the caller's location attached via
//! `#[track_caller]`.

pub mod groups;

use crate::dump;
use std::any::type_name;
use std::fmt;
use std::mem;
use std::path::Path;

// ============================================================================
// Group Activation
// ============================================================================

/// Boolean Condition Checks are active in this build.
pub const BOOL_CHECKS: bool = cfg!(all(debug_assertions, feature = "bool-checks"));
/// Null Checks are active in this build.
pub const NULL_CHECKS: bool = cfg!(all(debug_assertions, feature = "null-checks"));
/// File Path Checks are active in this build.
pub const PATH_CHECKS: bool = cfg!(all(debug_assertions, feature = "path-checks"));
/// Array Bounds Checks are active in this build.
pub const BOUNDS_CHECKS: bool = cfg!(all(debug_assertions, feature = "bounds-checks"));
/// Comparison Checks are active in this build.
pub const COMPARE_CHECKS: bool = cfg!(all(debug_assertions, feature = "compare-checks"));
/// Arithmetic-Logic Checks are active in this build.
pub const ARITH_CHECKS: bool = cfg!(all(debug_assertions, feature = "arith-checks"));
/// Memory Checks are active in this build.
pub const ALIGN_CHECKS: bool = cfg!(all(debug_assertions, feature = "align-checks"));

/// Scalar types with a signed zero, accepted by the sign checks.
pub trait SignedScalar: PartialOrd + fmt::Display + Copy {
    /// Additive identity of the scalar type.
    const ZERO: Self;
}

macro_rules! impl_signed_scalar {
    ($($ty:ty),*) => {
        $(impl SignedScalar for $ty {
            const ZERO: Self = 0 as $ty;
        })*
    };
}

impl_signed_scalar!(i8, i16, i32, i64, i128, isize, f32, f64);

// ============================================================================
// Boolean Condition Checks
// ============================================================================

/// Part of: Boolean Condition Checks
#[inline]
#[track_caller]
pub fn is_true(condition: bool) {
    if BOOL_CHECKS && !condition {
        panic!("Expected 'true'.");
    }
}

/// Part of: Boolean Condition Checks
#[inline]
#[track_caller]
pub fn is_false(condition: bool) {
    if BOOL_CHECKS && condition {
        panic!("Expected 'false'.");
    }
}

// ============================================================================
// Null Checks
// ============================================================================

/// Part of: Null Checks
#[inline]
#[track_caller]
pub fn is_none<T>(value: &Option<T>) {
    if NULL_CHECKS && value.is_some() {
        panic!("Expected 'None'.");
    }
}

/// Part of: Null Checks
#[inline]
#[track_caller]
pub fn is_some<T>(value: &Option<T>) {
    if NULL_CHECKS && value.is_none() {
        panic!("Expected 'Some'.");
    }
}

/// Part of: Null Checks
#[inline]
#[track_caller]
pub fn is_null<T>(ptr: *const T) {
    if NULL_CHECKS && !ptr.is_null() {
        panic!("Expected a null pointer.");
    }
}

/// Part of: Null Checks
#[inline]
#[track_caller]
pub fn is_not_null<T>(ptr: *const T) {
    if NULL_CHECKS && ptr.is_null() {
        panic!("Unexpected null pointer.");
    }
}

// ============================================================================
// File Path Checks
// ============================================================================

/// Part of: File Path Checks
///
/// The path must be non-empty and name an existing file.
#[inline]
#[track_caller]
pub fn file_exists<P: AsRef<Path>>(path: P) {
    if PATH_CHECKS {
        let path = path.as_ref();
        if path.as_os_str().is_empty() || !path.is_file() {
            panic!("File '{}' does not exist.", path.display());
        }
    }
}

// ============================================================================
// Array Bounds Checks
// ============================================================================

/// Part of: Array Bounds Checks
#[inline]
#[track_caller]
pub fn in_bounds(index: usize, len: usize) {
    if BOUNDS_CHECKS && index >= len {
        panic!("{} is out of range (length {} - 1).", index, len);
    }
}

/// Part of: Array Bounds Checks
///
/// The subslice must be non-empty, start in bounds and end at or before
/// `len`.
#[inline]
#[track_caller]
pub fn valid_subslice(start: usize, count: usize, len: usize) {
    if BOUNDS_CHECKS {
        are_not_equal(count, 0);
        in_bounds(start, len);

        let end = start as u128 + count as u128;
        if end > len as u128 {
            panic!(
                "start + count is {}, which is larger than length {}.",
                end, len
            );
        }
    }
}

/// Part of: Array Bounds Checks
#[inline]
#[track_caller]
pub fn subslices_disjoint(first: usize, first_len: usize, second: usize, second_len: usize) {
    if BOUNDS_CHECKS {
        let first_end = first as u128 + first_len as u128;
        let second_end = second as u128 + second_len as u128;

        if first < second {
            if first_end > second as u128 {
                panic!(
                    "Subslice from {} to {} overlaps with subslice from {} to {}.",
                    first,
                    first_end - 1,
                    second,
                    second_end - 1
                );
            }
        } else if second_end > first as u128 {
            panic!(
                "Subslice from {} to {} overlaps with subslice from {} to {}.",
                second,
                second_end - 1,
                first,
                first_end - 1
            );
        }
    }
}

// ============================================================================
// Comparison Checks
// ============================================================================

/// Part of: Comparison Checks
///
/// Remember: zero is neither positive nor negative.
#[inline]
#[track_caller]
pub fn is_positive<T: SignedScalar>(value: T) {
    if COMPARE_CHECKS && value <= T::ZERO {
        panic!("{} was expected to be positive.", value);
    }
}

/// Part of: Comparison Checks
///
/// Remember: zero is neither positive nor negative.
#[inline]
#[track_caller]
pub fn is_negative<T: SignedScalar>(value: T) {
    if COMPARE_CHECKS && value >= T::ZERO {
        panic!("{} was expected to be negative.", value);
    }
}

/// Part of: Comparison Checks
///
/// Remember: zero is neither positive nor negative.
#[inline]
#[track_caller]
pub fn non_negative<T: SignedScalar>(value: T) {
    if COMPARE_CHECKS && value < T::ZERO {
        panic!("{} was expected to be positive or equal to zero.", value);
    }
}

/// Part of: Comparison Checks
///
/// Remember: zero is neither positive nor negative.
#[inline]
#[track_caller]
pub fn non_positive<T: SignedScalar>(value: T) {
    if COMPARE_CHECKS && value > T::ZERO {
        panic!("{} was expected to be negative or equal to zero.", value);
    }
}

/// Part of: Comparison Checks
#[inline]
#[track_caller]
pub fn are_equal<T: PartialEq + fmt::Debug>(a: T, b: T) {
    if COMPARE_CHECKS && a != b {
        panic!("{:?} was expected to be equal to {:?}.", a, b);
    }
}

/// Part of: Comparison Checks
#[inline]
#[track_caller]
pub fn are_not_equal<T: PartialEq + fmt::Debug>(a: T, b: T) {
    if COMPARE_CHECKS && a == b {
        panic!("{:?} was expected not to be equal to {:?}.", a, b);
    }
}

/// Part of: Comparison Checks
///
/// The comparison is inclusive on both ends.
#[inline]
#[track_caller]
pub fn is_between<T: PartialOrd + fmt::Debug>(value: T, min: T, max: T) {
    if COMPARE_CHECKS && (value < min || value > max) {
        panic!("Min: {:?}, Max: {:?}, Value: {:?}.", min, max, value);
    }
}

/// Part of: Comparison Checks
#[inline]
#[track_caller]
pub fn is_smaller<T: PartialOrd + fmt::Debug>(value: T, limit: T) {
    if COMPARE_CHECKS && !(value < limit) {
        panic!("{:?} was expected to be smaller than {:?}.", value, limit);
    }
}

/// Part of: Comparison Checks
#[inline]
#[track_caller]
pub fn is_greater<T: PartialOrd + fmt::Debug>(value: T, limit: T) {
    if COMPARE_CHECKS && !(value > limit) {
        panic!("{:?} was expected to be greater than {:?}.", value, limit);
    }
}

/// Part of: Comparison Checks
#[inline]
#[track_caller]
pub fn is_smaller_or_equal<T: PartialOrd + fmt::Debug>(value: T, limit: T) {
    if COMPARE_CHECKS && value > limit {
        panic!(
            "{:?} was expected to be smaller than or equal to {:?}.",
            value, limit
        );
    }
}

/// Part of: Comparison Checks
#[inline]
#[track_caller]
pub fn is_greater_or_equal<T: PartialOrd + fmt::Debug>(value: T, limit: T) {
    if COMPARE_CHECKS && value < limit {
        panic!(
            "{:?} was expected to be greater than or equal to {:?}.",
            value, limit
        );
    }
}

// ============================================================================
// Arithmetic-Logic Checks
// ============================================================================

/// Part of: Arithmetic-Logic Checks
///
/// A `bool` read from foreign or reinterpreted memory must hold 0 or 1.
#[inline]
#[track_caller]
pub fn is_safe_bool(value: u8) {
    if ARITH_CHECKS && value > 1 {
        panic!(
            "The numerical value of the bool is {} which can lead to undefined behavior.",
            value
        );
    }
}

/// Part of: Arithmetic-Logic Checks
///
/// The shift amount must be smaller than the bit width of `T`.
#[inline]
#[track_caller]
pub fn defined_shift<T>(amount: u32) {
    if ARITH_CHECKS && amount as usize >= mem::size_of::<T>() * 8 {
        panic!(
            "Shifting a {} by {} results in undefined behavior.",
            type_name::<T>(),
            amount
        );
    }
}

// ============================================================================
// Memory Checks
// ============================================================================

/// Part of: Memory Checks
#[inline]
#[track_caller]
pub fn is_aligned<T>(ptr: *const T) {
    if ALIGN_CHECKS {
        let address = ptr as usize;
        let align = mem::align_of::<T>();
        if address % align != 0 {
            panic!(
                "The address {} of a {} with alignment {} is misaligned by {} bytes.",
                dump::hex(&(address as u64), true),
                type_name::<T>(),
                align,
                address % align
            );
        }
    }
}

// ============================================================================
// Always-On
// ============================================================================

/// Marks code that must never execute. Panics unconditionally, in every
/// build.
#[inline]
#[track_caller]
pub fn unreachable_executed() -> ! {
    panic!("Attempted to execute unreachable code.");
}

//! Binary and hexadecimal rendering of values and byte slices
//!
//! Bytes render most-significant-address-first, so little-endian integers
//! read naturally: `0x12345678u32` becomes `"1234 5678"`. Bit strings are
//! spaced per nibble and per byte, hex strings per 16-bit group anchored at
//! the least-significant end.

use bytemuck::NoUninit;
use std::fmt;

/// Render the bits of one byte, most significant first.
///
/// With `spaces`, the nibbles are separated: `"0101 0101"`.
pub fn bits_u8(value: u8, spaces: bool) -> String {
    let mut result = String::with_capacity(9);

    for bit in (0..8).rev() {
        result.push(if value >> bit & 1 == 1 { '1' } else { '0' });
        if spaces && bit == 4 {
            result.push(' ');
        }
    }

    result
}

/// Render one byte as two uppercase hex digits.
pub fn hex_u8(value: u8) -> String {
    format!("{:02X}", value)
}

/// Render the bits of a raw byte slice, highest address first.
pub fn bits_slice(bytes: &[u8], spaces: bool) -> String {
    let mut result = String::with_capacity(bytes.len() * 10);

    for (i, &byte) in bytes.iter().rev().enumerate() {
        if spaces && i != 0 {
            result.push(' ');
        }
        result.push_str(&bits_u8(byte, spaces));
    }

    result
}

/// Render a raw byte slice as hex, highest address first.
///
/// With `spaces`, a separator goes in every 2 bytes, anchored at the
/// least-significant end: 3 bytes render as `"AB CDEF"`.
pub fn hex_slice(bytes: &[u8], spaces: bool) -> String {
    let mut result = String::with_capacity(bytes.len() * 3);

    for (low_index, &byte) in bytes.iter().enumerate().rev() {
        result.push_str(&hex_u8(byte));
        if spaces && low_index != 0 && low_index % 2 == 0 {
            result.push(' ');
        }
    }

    result
}

/// Render the bits of any plain-memory value.
pub fn bits<T: NoUninit>(value: &T, spaces: bool) -> String {
    bits_slice(bytemuck::bytes_of(value), spaces)
}

/// Render any plain-memory value as hex.
pub fn hex<T: NoUninit>(value: &T, spaces: bool) -> String {
    hex_slice(bytemuck::bytes_of(value), spaces)
}

/// Pretty multi-line dump of a value's state.
pub fn state<T: fmt::Debug>(value: &T) -> String {
    format!("{:#?}", value)
}

//! Byte-unit suffix conversion for `/proc` value tokens.
//!
//! `/proc` files report sizes as `<value> <unit>` pairs where the unit is a
//! token like `kB`. Conversion multiplies the per-character ratio of every
//! character in the token: single-letter multipliers K/M/G/T/P (either
//! case) denote binary multiples of 1024, anything else contributes 1.0.
//! `"kB"` therefore resolves to 1024, matching the kernel's spelling.

/// Ratio to multiply a value by to obtain bytes for the given unit token.
///
/// An unrecognized token silently resolves to 1.0; callers treating the
/// result as authoritative should validate their input first.
pub fn ratio_to_bytes(unit: &str) -> f64 {
    unit.chars().map(char_ratio).product()
}

/// Converts a `<value> <unit>` pair to bytes, rounding down.
pub fn to_bytes(value: u64, unit: &str) -> u64 {
    (value as f64 * ratio_to_bytes(unit)) as u64
}

fn char_ratio(c: char) -> f64 {
    match c.to_ascii_uppercase() {
        'K' => 1024.0,
        'M' => 1024.0 * 1024.0,
        'G' => 1024.0 * 1024.0 * 1024.0,
        'T' => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        'P' => 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => 1.0,
    }
}

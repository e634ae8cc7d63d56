//! Key-to-slot placement.
//!
//! Keys are placed with a polynomial rolling hash over their UTF-8 bytes,
//! base 31, reduced modulo the table capacity at every step. The function is
//! pure: the same key and capacity always give the same slot.

/// Multiplier of the rolling hash.
pub const HASH_BASE: u128 = 31;

/// Compute the slot index of `key` in a table with `capacity` slots.
///
/// The result is always in `0..capacity`. `capacity` must be non-zero; the
/// store rejects a zero capacity at construction so this is never reached
/// with 0 from store code.
pub fn slot_index(key: &str, capacity: usize) -> usize {
    debug_assert!(capacity > 0, "slot_index called with zero capacity");
    let modulus = capacity as u128;
    let mut acc: u128 = 0;
    for &b in key.as_bytes() {
        // acc < modulus <= usize::MAX, so 31 * acc + 255 fits in u128.
        acc = (HASH_BASE * acc + u128::from(b)) % modulus;
    }
    acc as usize
}

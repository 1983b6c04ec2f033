//! Deterministic 32-bit string hash behind persona assignment.
//!
//! The hash must agree with every other implementation of the assignment
//! rule, so it is spelled out over UTF-16 code units with explicit 32-bit
//! wraparound and never seeded.

use crate::constants::BLOCK_COUNT;
use crate::design::BlockId;

/// Multiply-by-31 rolling hash with two's-complement wraparound at each step.
#[must_use]
pub fn string_hash(input: &str) -> i32 {
    input.encode_utf16().fold(0_i32, |acc, unit| {
        // (acc << 5) - acc == acc * 31 under 32-bit wraparound
        acc.wrapping_shl(5)
            .wrapping_sub(acc)
            .wrapping_add(i32::from(unit))
    })
}

/// Map a hash onto a block using the non-negative remainder, so negative
/// hashes land in the same `1..=BLOCK_COUNT` range as positive ones.
#[must_use]
pub fn block_for_hash(hash: i32) -> BlockId {
    let slot = hash.rem_euclid(i32::from(BLOCK_COUNT));
    u8::try_from(slot + 1)
        .ok()
        .and_then(BlockId::new)
        .unwrap_or(BlockId::FIRST)
}

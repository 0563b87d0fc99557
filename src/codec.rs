//! Binary codec between feature vectors and unsigned integers.
//!
//! `Plus` is bit 1 and `Minus` is bit 0, the first feature being the most
//! significant bit. The integer gives every generated item a deterministic
//! name: `s` followed by the decimal encoding.

use crate::error::{Result, SynthError};
use crate::feature::Feature;

/// Widest vector the codec can represent.
pub const MAX_WIDTH: usize = 64;

/// Encode a feature vector as an integer, most significant feature first.
///
/// Vectors wider than [`MAX_WIDTH`] keep only their last 64 positions; callers
/// validate arity before sampling so this never happens for generated rows.
///
/// # Examples
///
/// ```
/// use phonosynth::codec::encode;
/// use phonosynth::Feature::{Minus, Plus};
///
/// assert_eq!(encode(&[Plus, Minus, Plus]), 5);
/// assert_eq!(encode(&[Minus, Minus]), 0);
/// ```
pub fn encode(vector: &[Feature]) -> u64 {
    vector
        .iter()
        .fold(0u64, |acc, v| acc.wrapping_shl(1) | v.bit())
}

/// Decode `value` into a vector of `width` features.
///
/// Fails with [`SynthError::Range`] when `value` needs more than `width` bits
/// or when `width` exceeds [`MAX_WIDTH`].
pub fn decode(value: u64, width: usize) -> Result<Vec<Feature>> {
    if width > MAX_WIDTH || (width < MAX_WIDTH && value >> width != 0) {
        return Err(SynthError::Range { value, width });
    }
    Ok((0..width)
        .rev()
        .map(|shift| Feature::from_bit((value >> shift) & 1 == 1))
        .collect())
}

/// Item label derived from a feature vector.
pub fn item_name(vector: &[Feature]) -> String {
    format!("s{}", encode(vector))
}

/// Number of distinct vectors of the given arity, or `None` when it does not
/// fit in a u64 (arity 64 and above).
pub fn vector_space(arity: usize) -> Option<u64> {
    u32::try_from(arity)
        .ok()
        .and_then(|a| 1u64.checked_shl(a))
}

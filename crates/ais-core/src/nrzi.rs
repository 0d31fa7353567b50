//! NRZI line coding
//!
//! A 0 bit toggles the line level, a 1 bit holds it. Both directions start
//! from [`NRZI_INITIAL_LEVEL`]. The decoder can flip every output bit to undo
//! a polarity inversion found during frame sync.

use crate::types::Bit;

/// Line level before the first encoded bit.
pub const NRZI_INITIAL_LEVEL: Bit = 1;

/// Encode bits into line levels.
pub fn nrzi_encode(bits: &[Bit]) -> Vec<Bit> {
    let mut level = NRZI_INITIAL_LEVEL;
    bits.iter()
        .map(|&bit| {
            if bit == 0 {
                level ^= 1;
            }
            level
        })
        .collect()
}

/// Decode line levels; `invert` flips every output bit.
pub fn nrzi_decode(levels: &[Bit], invert: bool) -> Vec<Bit> {
    let flip = invert as Bit;
    let mut prev = NRZI_INITIAL_LEVEL;
    levels
        .iter()
        .map(|&level| {
            let bit = if level != prev { 0 } else { 1 };
            prev = level;
            bit ^ flip
        })
        .collect()
}

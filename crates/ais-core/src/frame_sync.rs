//! Training Sequence Frame Synchronizer
//!
//! Locates the 24-bit `0101...` training sequence near the start of a
//! decoded bit stream, tolerating a few bit errors and either polarity.
//!
//! ## Algorithm
//!
//! 1. For each start position in `0..=search_window` and each polarity,
//!    count matches against the training sequence (Hamming similarity).
//! 2. Candidates with more than `max_errors` mismatches are dropped.
//! 3. The score adds the matches of the following 8 bits against the HDLC
//!    flag, which separates the true start from positions shifted by two
//!    bits inside the periodic training pattern.
//! 4. The first candidate with the highest score wins.
//!
//! ## Example
//!
//! ```rust
//! use ais_core::frame_sync::find_frame_start;
//! use ais_core::types::{HDLC_FLAG, TRAINING_SEQUENCE};
//!
//! let mut bits = vec![1, 1, 0];
//! bits.extend_from_slice(&TRAINING_SEQUENCE);
//! bits.extend_from_slice(&HDLC_FLAG);
//! assert_eq!(find_frame_start(&bits), Some((3, false)));
//! ```

use crate::types::{Bit, HDLC_FLAG, TRAINING_SEQUENCE};

/// Positions searched for the training start
pub const DEFAULT_SEARCH_WINDOW: usize = 40;

/// Training bit errors tolerated
pub const DEFAULT_MAX_ERRORS: usize = 3;

/// A training sequence match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStart {
    /// Bit index of the first training bit
    pub position: usize,
    /// Stream polarity is inverted
    pub inverted: bool,
    /// Mismatched training bits
    pub training_errors: usize,
    /// Training plus flag matches
    pub score: usize,
}

/// Training sequence correlator.
#[derive(Debug, Clone)]
pub struct FrameSync {
    search_window: usize,
    max_errors: usize,
}

impl Default for FrameSync {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_WINDOW, DEFAULT_MAX_ERRORS)
    }
}

impl FrameSync {
    pub fn new(search_window: usize, max_errors: usize) -> Self {
        Self {
            search_window,
            max_errors: max_errors.min(TRAINING_SEQUENCE.len()),
        }
    }

    pub fn search_window(&self) -> usize {
        self.search_window
    }

    pub fn max_errors(&self) -> usize {
        self.max_errors
    }

    pub fn find(&self, bits: &[Bit]) -> Option<FrameStart> {
        let n = TRAINING_SEQUENCE.len();
        let mut best: Option<FrameStart> = None;

        for pos in 0..=self.search_window {
            if pos + n > bits.len() {
                break;
            }
            for inverted in [false, true] {
                let flip = inverted as Bit;
                let matches = |pattern: &[Bit], at: usize| {
                    pattern
                        .iter()
                        .zip(bits.iter().skip(at))
                        .filter(|&(&p, &b)| b ^ flip == p)
                        .count()
                };
                let training = matches(&TRAINING_SEQUENCE, pos);
                if training + self.max_errors < n {
                    continue;
                }
                let score = training + matches(&HDLC_FLAG, pos + n);
                if best.map_or(true, |b| score > b.score) {
                    best = Some(FrameStart {
                        position: pos,
                        inverted,
                        training_errors: n - training,
                        score,
                    });
                }
            }
        }

        match best {
            Some(start) => tracing::debug!(
                position = start.position,
                inverted = start.inverted,
                errors = start.training_errors,
                "training sequence found"
            ),
            None => tracing::trace!("no training sequence in search window"),
        }
        best
    }
}

/// Default search: first 40 positions, up to 3 training errors.
pub fn find_frame_start(bits: &[Bit]) -> Option<(usize, bool)> {
    FrameSync::default().find(bits).map(|s| (s.position, s.inverted))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAIL: [Bit; 12] = [1, 0, 1, 1, 0, 0, 1, 0, 1, 1, 1, 0];

    fn stream(prefix: &[Bit], flips: &[usize]) -> Vec<Bit> {
        let mut training = TRAINING_SEQUENCE.to_vec();
        for &i in flips {
            training[i] ^= 1;
        }
        let mut bits = prefix.to_vec();
        bits.extend(training);
        bits.extend_from_slice(&HDLC_FLAG);
        bits.extend_from_slice(&TAIL);
        bits
    }

    #[test]
    fn test_exact_match() {
        for prefix in [&[][..], &[0, 0, 0, 0][..], &[1, 1, 0, 1, 0][..]] {
            let bits = stream(prefix, &[]);
            let start = FrameSync::default().find(&bits).unwrap();
            assert_eq!(start.position, prefix.len());
            assert!(!start.inverted);
            assert_eq!(start.training_errors, 0);
            assert_eq!(start.score, 32);
        }
    }

    #[test]
    fn test_three_flipped_bits() {
        let prefix = [0, 0, 0, 0];
        for a in 0..24 {
            for b in (a + 1)..24 {
                for c in (b + 1)..24 {
                    let bits = stream(&prefix, &[a, b, c]);
                    assert_eq!(find_frame_start(&bits), Some((4, false)), "flips {} {} {}", a, b, c);
                }
            }
        }
    }

    #[test]
    fn test_inverted_stream() {
        let bits: Vec<Bit> = stream(&[0, 0, 0], &[]).iter().map(|b| b ^ 1).collect();
        assert_eq!(find_frame_start(&bits), Some((3, true)));
    }

    #[test]
    fn test_too_many_errors_fails() {
        // runs of three never line up with the alternating training bits
        let bits: Vec<Bit> = (0..80).map(|i| ((i / 3) % 2) as Bit).collect();
        assert_eq!(find_frame_start(&bits), None);
    }

    #[test]
    fn test_search_window_limit() {
        let bits = stream(&[0; 20], &[]);
        assert!(FrameSync::new(10, 3).find(&bits).is_none());
        assert_eq!(FrameSync::new(20, 3).find(&bits).map(|s| s.position), Some(20));
        assert_eq!(find_frame_start(&stream(&[1; 40], &[])), Some((40, false)));
    }

    #[test]
    fn test_short_input() {
        assert_eq!(find_frame_start(&TRAINING_SEQUENCE[..23]), None);
        assert_eq!(find_frame_start(&TRAINING_SEQUENCE), Some((0, false)));
    }
}

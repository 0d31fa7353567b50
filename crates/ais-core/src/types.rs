//! Core types for the AIS codec and modem
//!
//! This module defines the sample types, the protocol constants shared by the
//! transmit and receive chains, and the crate-wide error type.
//!
//! ## Bits
//!
//! Bit sequences are plain `u8` slices holding `0` or `1`, most significant
//! bit first. This keeps the framing stages (CRC, HDLC stuffing, NRZI) easy to
//! inspect in tests and maps directly onto the wire order of ITU-R M.1371.
//!
//! ## I/Q Samples
//!
//! Complex baseband samples are single precision, matching the `cf32` layout
//! most SDR front ends stream. Phase accumulation and filtering run in `f64`
//! internally and are narrowed only when a sample is emitted.

use num_complex::Complex32;
use serde::{Deserialize, Serialize};

/// A single complex baseband sample.
pub type IqSample = Complex32;

/// A single bit (`0` or `1`).
pub type Bit = u8;

/// AIS symbol rate (bits per second on the VHF link).
pub const SYMBOL_RATE: f64 = 9600.0;

/// Training sequence sent ahead of every frame: `01` repeated twelve times.
pub const TRAINING_SEQUENCE: [Bit; 24] = [
    0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1,
];

/// HDLC start/end flag `01111110`.
pub const HDLC_FLAG: [Bit; 8] = [0, 1, 1, 1, 1, 1, 1, 0];

/// Zero bits appended after the end flag.
pub const BUFFER_BITS: usize = 8;

/// Length of the frame check sequence in bits.
pub const CRC_BITS: usize = 16;

/// Result type for codec and modem operations
pub type Result<T> = std::result::Result<T, AisError>;

/// Errors raised by the codec, the framers and the modem
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AisError {
    #[error("{field} value {value} does not fit in {bits} bits")]
    ValueOutOfRange {
        field: &'static str,
        value: i64,
        bits: usize,
    },

    #[error("invalid character {0:?} for AIS six-bit encoding")]
    InvalidCharacter(char),

    #[error("malformed sentence: {0}")]
    MalformedSentence(String),

    #[error("training sequence not found in search window")]
    FrameSyncFailure,

    #[error("checksum mismatch: expected {expected:#06x}, computed {computed:#06x}")]
    ChecksumMismatch { expected: u16, computed: u16 },

    #[error("message type {msg_type}: expected {expected} bits, got {actual}")]
    StructuralLength {
        msg_type: u8,
        expected: usize,
        actual: usize,
    },

    #[error("message header carries type {actual}, expected {expected}")]
    TypeMismatch { expected: u8, actual: u8 },

    #[error("unsupported message type {0}")]
    UnsupportedMessageType(u8),

    #[error("HDLC framing error: {0}")]
    Framing(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("no signal present")]
    NoSignal,

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AisError {
    fn from(err: std::io::Error) -> Self {
        AisError::Io(err.to_string())
    }
}

/// A buffer of complex baseband samples together with its timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IqSignal {
    /// Complex samples, in order of arrival
    pub samples: Vec<IqSample>,
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Symbol rate in symbols per second
    pub symbol_rate: f64,
}

impl IqSignal {
    /// Wrap samples captured or generated at `sample_rate` on the AIS link.
    pub fn new(samples: Vec<IqSample>, sample_rate: f64) -> Self {
        Self {
            samples,
            sample_rate,
            symbol_rate: SYMBOL_RATE,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples per symbol; fractional for sample rates that are not a
    /// multiple of the symbol rate.
    pub fn samples_per_symbol(&self) -> f64 {
        self.sample_rate / self.symbol_rate
    }

    /// Signal duration in seconds.
    pub fn duration_s(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.samples.len() as f64 / self.sample_rate
        } else {
            0.0
        }
    }

    /// Peak sample magnitude.
    pub fn peak_amplitude(&self) -> f32 {
        self.samples.iter().map(|s| s.norm()).fold(0.0, f32::max)
    }

    /// Mean power of the buffer.
    pub fn average_power(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|s| s.norm_sqr() as f64).sum::<f64>() / self.samples.len() as f64
    }
}

/// Check that a sample rate leaves at least two samples per symbol.
pub fn check_sample_rate(sample_rate: f64) -> Result<f64> {
    if !sample_rate.is_finite() || sample_rate < 2.0 * SYMBOL_RATE {
        return Err(AisError::InvalidParameter(format!(
            "sample rate {} Hz gives fewer than 2 samples per symbol",
            sample_rate
        )));
    }
    Ok(sample_rate / SYMBOL_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_signal_timing() {
        let signal = IqSignal::new(vec![IqSample::new(1.0, 0.0); 960], 96_000.0);
        assert_eq!(signal.len(), 960);
        assert_relative_eq!(signal.samples_per_symbol(), 10.0);
        assert_relative_eq!(signal.duration_s(), 0.01);
        assert_relative_eq!(signal.average_power(), 1.0);
    }

    #[test]
    fn test_check_sample_rate() {
        assert_relative_eq!(check_sample_rate(48_000.0).unwrap(), 5.0);
        assert!(check_sample_rate(19_200.0).is_ok());
        assert!(check_sample_rate(9_600.0).is_err());
        assert!(check_sample_rate(f64::NAN).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = AisError::ValueOutOfRange {
            field: "mmsi",
            value: 1 << 31,
            bits: 30,
        };
        assert!(err.to_string().contains("mmsi"));

        let err = AisError::ChecksumMismatch {
            expected: 0x47,
            computed: 0x5a,
        };
        assert_eq!(err.to_string(), "checksum mismatch: expected 0x0047, computed 0x005a");
    }
}

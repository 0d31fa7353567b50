//! CRC-16 and HDLC Radio Framing
//!
//! AIS frames an encoded message the HDLC way, with a training preamble in
//! front:
//!
//! ```text
//! ┌──────────┬──────────┬───────────────────────────────┬──────────┬────────┐
//! │ training │ 01111110 │ bit-stuffed message ++ FCS    │ 01111110 │ buffer │
//! │ 24 bits  │ 8 bits   │ variable                      │ 8 bits   │ 8 bits │
//! └──────────┴──────────┴───────────────────────────────┴──────────┴────────┘
//! ```
//!
//! The FCS is CRC-16/CCITT (poly 0x1021, init 0xFFFF) computed bit-serially,
//! MSB first, without a final XOR. Stuffing inserts a 0 after every run of
//! five 1s so the flag never appears inside the frame.
//!
//! ## Example
//!
//! ```rust
//! use ais_core::hdlc::{crc16_ccitt, hdlc_destuff, hdlc_stuff, verify_crc};
//!
//! let bits = vec![1, 1, 1, 1, 1, 1, 0, 1];
//! let stuffed = hdlc_stuff(&bits);
//! assert_eq!(stuffed, vec![1, 1, 1, 1, 1, 0, 1, 0, 1]);
//! assert_eq!(hdlc_destuff(&stuffed).unwrap(), bits);
//!
//! let crc = crc16_ccitt(&bits);
//! assert!(verify_crc(&bits, &crc));
//! ```

use crate::types::{AisError, Bit, Result, BUFFER_BITS, HDLC_FLAG, TRAINING_SEQUENCE};

/// CRC-16/CCITT polynomial (normal form)
pub const CRC16_POLY: u16 = 0x1021;

/// Register preset
pub const CRC16_INIT: u16 = 0xFFFF;

/// Bit-serial CRC-16/CCITT register value over `bits`.
pub fn crc16_value(bits: &[Bit]) -> u16 {
    let mut crc = CRC16_INIT;
    for &bit in bits {
        crc ^= ((bit & 1) as u16) << 15;
        crc = if crc & 0x8000 != 0 {
            (crc << 1) ^ CRC16_POLY
        } else {
            crc << 1
        };
    }
    crc
}

/// CRC-16/CCITT of `bits` as 16 bits, MSB first.
pub fn crc16_ccitt(bits: &[Bit]) -> [Bit; 16] {
    let crc = crc16_value(bits);
    let mut out = [0; 16];
    for (i, b) in out.iter_mut().enumerate() {
        *b = ((crc >> (15 - i)) & 1) as Bit;
    }
    out
}

/// True if `crc_bits` is the FCS of `message_bits`.
pub fn verify_crc(message_bits: &[Bit], crc_bits: &[Bit]) -> bool {
    crc_bits.len() == 16 && crc16_ccitt(message_bits)[..] == *crc_bits
}

/// Insert a 0 after every run of five consecutive 1s.
pub fn hdlc_stuff(bits: &[Bit]) -> Vec<Bit> {
    let mut out = Vec::with_capacity(bits.len() + bits.len() / 5);
    let mut ones = 0;
    for &bit in bits {
        out.push(bit);
        if bit == 1 {
            ones += 1;
            if ones == 5 {
                out.push(0);
                ones = 0;
            }
        } else {
            ones = 0;
        }
    }
    out
}

/// Remove stuffed zeros. A 1 where a stuffed 0 is expected is a framing error.
pub fn hdlc_destuff(bits: &[Bit]) -> Result<Vec<Bit>> {
    let mut out = Vec::with_capacity(bits.len());
    let mut ones = 0;
    for (i, &bit) in bits.iter().enumerate() {
        if ones == 5 {
            if bit == 1 {
                return Err(AisError::Framing(format!("six consecutive ones at bit {}", i)));
            }
            ones = 0;
            continue;
        }
        out.push(bit);
        if bit == 1 {
            ones += 1;
        } else {
            ones = 0;
        }
    }
    Ok(out)
}

/// Assemble `training ++ flag ++ stuff(payload ++ crc) ++ flag ++ buffer`.
pub fn build_radio_frame(payload_bits: &[Bit], crc_bits: &[Bit]) -> Vec<Bit> {
    let mut body = Vec::with_capacity(payload_bits.len() + crc_bits.len());
    body.extend_from_slice(payload_bits);
    body.extend_from_slice(crc_bits);
    let stuffed = hdlc_stuff(&body);

    let mut frame = Vec::with_capacity(TRAINING_SEQUENCE.len() + 2 * HDLC_FLAG.len() + stuffed.len() + BUFFER_BITS);
    frame.extend_from_slice(&TRAINING_SEQUENCE);
    frame.extend_from_slice(&HDLC_FLAG);
    frame.extend(stuffed);
    frame.extend_from_slice(&HDLC_FLAG);
    frame.extend(std::iter::repeat(0).take(BUFFER_BITS));
    frame
}

/// Compute the FCS of `payload_bits` and build the radio frame.
pub fn encode_frame(payload_bits: &[Bit]) -> Vec<Bit> {
    build_radio_frame(payload_bits, &crc16_ccitt(payload_bits))
}

/// First index at or after `from` (and no later than `last_start`) where the flag begins.
pub(crate) fn find_flag(bits: &[Bit], from: usize, last_start: usize) -> Option<usize> {
    if bits.len() < HDLC_FLAG.len() {
        return None;
    }
    let last = last_start.min(bits.len() - HDLC_FLAG.len());
    (from..=last).find(|&i| bits[i..i + HDLC_FLAG.len()] == HDLC_FLAG)
}

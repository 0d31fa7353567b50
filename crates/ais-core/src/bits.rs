//! Bit Packing and Six-Bit Armoring
//!
//! AIS messages are fixed-layout bit records. Fields are packed MSB first,
//! signed fields use two's complement at their stored width, and the finished
//! record is carried over NMEA as "armored" six-bit ASCII.
//!
//! Two distinct six-bit tables are in play:
//!
//! | Table           | Range                | Used for                          |
//! |-----------------|----------------------|-----------------------------------|
//! | Payload armor   | `0`–`W`, `` ` ``–`w` | NMEA payload characters           |
//! | Text field      | `@`–`_`, space–`?`   | Names, call signs, destinations   |
//!
//! ## Example
//!
//! ```rust
//! use ais_core::bits::{BitReader, BitVector};
//!
//! let mut bits = BitVector::new();
//! bits.append_uint(1, 6);
//! bits.append_int(-2, 8);
//!
//! let mut reader = BitReader::new(bits.as_slice());
//! assert_eq!(reader.uint(6).unwrap(), 1);
//! assert_eq!(reader.int(8).unwrap(), -2);
//! ```

use crate::types::{AisError, Bit, Result};

/// Growable MSB-first bit sequence used to assemble message records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitVector {
    bits: Vec<Bit>,
}

impl BitVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn as_slice(&self) -> &[Bit] {
        &self.bits
    }

    pub fn into_bits(self) -> Vec<Bit> {
        self.bits
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit as Bit);
    }

    pub fn extend_from_bits(&mut self, bits: &[Bit]) {
        self.bits.extend(bits.iter().map(|&b| b & 1));
    }

    /// Append the low `n_bits` of `value`, MSB first.
    ///
    /// The value is masked to the field width; callers that need a range
    /// check use [`BitVector::append_uint_checked`].
    pub fn append_uint(&mut self, value: u32, n_bits: usize) {
        debug_assert!(n_bits <= 32);
        for i in (0..n_bits).rev() {
            self.bits.push(((value >> i) & 1) as Bit);
        }
    }

    /// Append `value` as an `n_bits` two's-complement field.
    pub fn append_int(&mut self, value: i32, n_bits: usize) {
        let masked = if n_bits >= 32 {
            value as u32
        } else {
            (value as u32) & ((1u32 << n_bits) - 1)
        };
        self.append_uint(masked, n_bits);
    }

    /// Append an unsigned field, rejecting values wider than `n_bits`.
    pub fn append_uint_checked(&mut self, field: &'static str, value: u32, n_bits: usize) -> Result<()> {
        if n_bits < 32 && value >> n_bits != 0 {
            return Err(AisError::ValueOutOfRange {
                field,
                value: value as i64,
                bits: n_bits,
            });
        }
        self.append_uint(value, n_bits);
        Ok(())
    }

    /// Append a signed field, rejecting values outside the two's-complement range.
    pub fn append_int_checked(&mut self, field: &'static str, value: i32, n_bits: usize) -> Result<()> {
        let min = -(1i64 << (n_bits - 1));
        let max = (1i64 << (n_bits - 1)) - 1;
        if (value as i64) < min || (value as i64) > max {
            return Err(AisError::ValueOutOfRange {
                field,
                value: value as i64,
                bits: n_bits,
            });
        }
        self.append_int(value, n_bits);
        Ok(())
    }

    /// Append a text field of exactly `chars` six-bit characters, padding with `@`.
    pub fn append_text(&mut self, field: &'static str, text: &str, chars: usize) -> Result<()> {
        if text.chars().count() > chars {
            return Err(AisError::ValueOutOfRange {
                field,
                value: text.chars().count() as i64,
                bits: chars * 6,
            });
        }
        let bits = encode_text(text, chars)?;
        self.bits.extend_from_slice(&bits);
        Ok(())
    }
}

impl From<Vec<Bit>> for BitVector {
    fn from(bits: Vec<Bit>) -> Self {
        Self { bits }
    }
}

/// Cursor for reading fixed-width fields out of a message record.
///
/// Over-reads report [`AisError::StructuralLength`] against the message type
/// found in the first six bits.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bits: &'a [Bit],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bits: &'a [Bit]) -> Self {
        Self { bits, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bits.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Result<&'a [Bit]> {
        if self.pos + n > self.bits.len() {
            return Err(AisError::StructuralLength {
                msg_type: peek_message_type(self.bits).unwrap_or(0),
                expected: self.pos + n,
                actual: self.bits.len(),
            });
        }
        let slice = &self.bits[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn uint(&mut self, n: usize) -> Result<u32> {
        let slice = self.take(n)?;
        Ok(slice.iter().fold(0u32, |acc, &b| (acc << 1) | (b & 1) as u32))
    }

    /// Read an `n`-bit two's-complement field, sign-extending from bit `n - 1`.
    pub fn int(&mut self, n: usize) -> Result<i32> {
        let raw = self.uint(n)?;
        if n > 0 && n < 32 && (raw >> (n - 1)) & 1 == 1 {
            Ok((raw | (!0u32 << n)) as i32)
        } else {
            Ok(raw as i32)
        }
    }

    pub fn flag(&mut self) -> Result<bool> {
        Ok(self.uint(1)? == 1)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Read `chars` six-bit text characters, trimming `@` padding and trailing spaces.
    pub fn text(&mut self, chars: usize) -> Result<String> {
        let slice = self.take(chars * 6)?;
        Ok(decode_text(slice))
    }
}

/// Message type held in the first six bits of a record, if present.
pub fn peek_message_type(bits: &[Bit]) -> Option<u8> {
    if bits.len() < 6 {
        return None;
    }
    Some(bits[..6].iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1)))
}

/// Map a six-bit value onto its payload armor character.
pub fn sixbit_to_char(v: u8) -> Result<char> {
    match v {
        0..=39 => Ok((v + 48) as char),
        40..=63 => Ok((v + 56) as char),
        _ => Err(AisError::ValueOutOfRange {
            field: "sixbit",
            value: v as i64,
            bits: 6,
        }),
    }
}

/// Six-bit value of a payload armor character.
pub fn sixbit_value(c: char) -> Result<u8> {
    match c as u32 {
        48..=87 => Ok(c as u8 - 48),
        96..=119 => Ok(c as u8 - 56),
        _ => Err(AisError::InvalidCharacter(c)),
    }
}

/// Bits (MSB first) of a payload armor character.
pub fn char_to_sixbit(c: char) -> Result<[Bit; 6]> {
    let v = sixbit_value(c)?;
    let mut out = [0u8; 6];
    for (i, bit) in out.iter_mut().enumerate() {
        *bit = (v >> (5 - i)) & 1;
    }
    Ok(out)
}

/// Pad with zeros to a multiple of six bits, returning the fill count.
pub fn pad_to_six_bit_boundary(bits: &[Bit]) -> (Vec<Bit>, u8) {
    let fill = (6 - bits.len() % 6) % 6;
    let mut padded = Vec::with_capacity(bits.len() + fill);
    padded.extend_from_slice(bits);
    padded.resize(bits.len() + fill, 0);
    (padded, fill as u8)
}

/// Armor a bit record into a payload string and its fill-bit count.
pub fn armor(bits: &[Bit]) -> (String, u8) {
    let (padded, fill) = pad_to_six_bit_boundary(bits);
    let payload = padded
        .chunks(6)
        .map(|chunk| {
            let v = chunk.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1));
            // chunk values are always below 64
            if v < 40 {
                (v + 48) as char
            } else {
                (v + 56) as char
            }
        })
        .collect();
    (payload, fill)
}

/// Recover the bit record from a payload string, dropping `fill` pad bits.
pub fn dearmor(payload: &str, fill: u8) -> Result<Vec<Bit>> {
    if fill > 5 {
        return Err(AisError::MalformedSentence(format!("fill bits {} out of range", fill)));
    }
    let mut bits = Vec::with_capacity(payload.len() * 6);
    for c in payload.chars() {
        bits.extend_from_slice(&char_to_sixbit(c)?);
    }
    let fill = fill as usize;
    if fill > bits.len() {
        return Err(AisError::MalformedSentence(format!(
            "fill bits {} exceed payload length {}",
            fill,
            bits.len()
        )));
    }
    bits.truncate(bits.len() - fill);
    Ok(bits)
}

/// Six-bit value of a text-field character (`@`–`_` → 0–31, space–`?` → 32–63).
///
/// Lower case letters are folded to upper case.
pub fn text_char_to_sixbit(c: char) -> Result<u8> {
    let upper = c.to_ascii_uppercase();
    match upper as u32 {
        64..=95 => Ok(upper as u8 - 64),
        32..=63 => Ok(upper as u8),
        _ => Err(AisError::InvalidCharacter(c)),
    }
}

/// Text-field character for a six-bit value (only the low 6 bits are used).
pub fn sixbit_to_text_char(v: u8) -> char {
    let v = v & 0x3f;
    if v < 32 {
        (v + 64) as char
    } else {
        v as char
    }
}

/// Encode `text` into exactly `chars` six-bit characters, padded with `@`.
pub fn encode_text(text: &str, chars: usize) -> Result<Vec<Bit>> {
    let mut out = BitVector::with_capacity(chars * 6);
    let mut count = 0;
    for c in text.chars().take(chars) {
        out.append_uint(text_char_to_sixbit(c)? as u32, 6);
        count += 1;
    }
    for _ in count..chars {
        out.append_uint(0, 6);
    }
    Ok(out.into_bits())
}

/// Decode six-bit text, stripping `@` padding and trailing spaces.
pub fn decode_text(bits: &[Bit]) -> String {
    let text: String = bits
        .chunks_exact(6)
        .map(|chunk| sixbit_to_text_char(chunk.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1))))
        .collect();
    text.trim_end_matches(|c| c == '@' || c == ' ').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_uint_msb_first() {
        let mut bits = BitVector::new();
        bits.append_uint(0b101, 3);
        bits.append_uint(1, 4);
        assert_eq!(bits.as_slice(), &[1, 0, 1, 0, 0, 0, 1]);
    }

    #[test]
    fn test_append_uint_masks() {
        let mut bits = BitVector::new();
        bits.append_uint(0xff, 4);
        assert_eq!(bits.as_slice(), &[1, 1, 1, 1]);
    }

    #[test]
    fn test_append_int_twos_complement() {
        let mut bits = BitVector::new();
        bits.append_int(-1, 8);
        assert_eq!(bits.as_slice(), &[1; 8]);

        let mut bits = BitVector::new();
        bits.append_int(-128, 8);
        assert_eq!(bits.as_slice(), &[1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_checked_append_rejects_overflow() {
        let mut bits = BitVector::new();
        assert!(matches!(
            bits.append_uint_checked("mmsi", 1 << 30, 30),
            Err(AisError::ValueOutOfRange { field: "mmsi", .. })
        ));
        assert!(bits.append_int_checked("rot", 127, 8).is_ok());
        assert!(bits.append_int_checked("rot", 128, 8).is_err());
        assert!(bits.append_int_checked("rot", -129, 8).is_err());
    }

    #[test]
    fn test_reader_sign_extension() {
        let mut bits = BitVector::new();
        bits.append_int(-108_600_000 / 600, 28);
        bits.append_int(54_600_000, 27);
        let mut reader = BitReader::new(bits.as_slice());
        assert_eq!(reader.int(28).unwrap(), -181_000);
        assert_eq!(reader.int(27).unwrap(), 54_600_000);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_overrun_is_structural_error() {
        let bits = [0, 0, 0, 0, 0, 1, 1, 0];
        let mut reader = BitReader::new(&bits);
        assert_eq!(reader.uint(6).unwrap(), 1);
        match reader.uint(4) {
            Err(AisError::StructuralLength { msg_type, expected, actual }) => {
                assert_eq!(msg_type, 1);
                assert_eq!(expected, 10);
                assert_eq!(actual, 8);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sixbit_symmetry_all_values() {
        for v in 0..64u8 {
            let c = sixbit_to_char(v).unwrap();
            let bits = char_to_sixbit(c).unwrap();
            let back = bits.iter().fold(0u8, |acc, &b| (acc << 1) | b);
            assert_eq!(back, v, "value {} via {:?}", v, c);
        }
        assert!(sixbit_to_char(64).is_err());
    }

    #[test]
    fn test_alphabet_round_trip() {
        let alphabet = "0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVW`abcdefghijklmnopqrstuvw";
        assert_eq!(alphabet.len(), 64);
        for c in alphabet.chars() {
            let v = sixbit_value(c).unwrap();
            assert_eq!(sixbit_to_char(v).unwrap(), c);
        }
    }

    #[test]
    fn test_invalid_armor_characters() {
        for c in ['X', '_', ' ', 'x', '!', '\u{7f}', 'é'] {
            assert_eq!(char_to_sixbit(c), Err(AisError::InvalidCharacter(c)));
        }
    }

    #[test]
    fn test_pad_to_six_bit_boundary() {
        let (padded, fill) = pad_to_six_bit_boundary(&[1; 168]);
        assert_eq!((padded.len(), fill), (168, 0));

        let (padded, fill) = pad_to_six_bit_boundary(&[1; 424]);
        assert_eq!((padded.len(), fill), (426, 2));
        assert_eq!(&padded[424..], &[0, 0]);
    }

    #[test]
    fn test_armor_dearmor() {
        let bits = dearmor("177KQJ5000G?tO`K>RA1wUbN0TKH", 0).unwrap();
        assert_eq!(bits.len(), 168);
        let (payload, fill) = armor(&bits);
        assert_eq!(payload, "177KQJ5000G?tO`K>RA1wUbN0TKH");
        assert_eq!(fill, 0);

        let short = dearmor("1@", 2).unwrap();
        assert_eq!(short.len(), 10);
        assert!(dearmor("1@", 6).is_err());
        assert!(dearmor("1x", 0).is_err());
    }

    #[test]
    fn test_text_fields() {
        let bits = encode_text("Seattle", 20).unwrap();
        assert_eq!(bits.len(), 120);
        assert_eq!(decode_text(&bits), "SEATTLE");

        let bits = encode_text("MT.MITCHELL  ", 20).unwrap();
        assert_eq!(decode_text(&bits), "MT.MITCHELL");

        assert_eq!(text_char_to_sixbit('@').unwrap(), 0);
        assert_eq!(text_char_to_sixbit(' ').unwrap(), 32);
        assert_eq!(text_char_to_sixbit('?').unwrap(), 63);
        assert!(text_char_to_sixbit('~').is_err());
    }

    #[test]
    fn test_append_text_too_long() {
        let mut bits = BitVector::new();
        assert!(bits.append_text("call_sign", "TOOLONGCALL", 7).is_err());
        assert!(bits.append_text("call_sign", "WDA9674", 7).is_ok());
        assert_eq!(bits.len(), 42);
    }
}

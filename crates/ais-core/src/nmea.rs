//! NMEA 0183 AIVDM Sentence Framer
//!
//! Wraps armored AIS payloads in `!AIVDM` sentences and parses them back.
//!
//! ```text
//! !AIVDM,1,1,,A,15MvlfPP1so?Vt@EWFs3Jjht0000,0*4B
//!  │     │ │ │ │ │                            │ └ XOR checksum of the body
//!  │     │ │ │ │ │                            └── fill bits
//!  │     │ │ │ │ └─────────────────────────────── payload
//!  │     │ │ │ └───────────────────────────────── radio channel
//!  │     │ │ └─────────────────────────────────── sequential message id
//!  │     │ └───────────────────────────────────── fragment number
//!  │     └─────────────────────────────────────── fragment count
//!  └───────────────────────────────────────────── talker + sentence type
//! ```
//!
//! Payloads longer than one sentence allows are split with
//! [`encode_sentences`] and joined again by [`SentenceAssembler`].
//!
//! ## Example
//!
//! ```rust
//! use ais_core::nmea::{build_sentence, parse_sentence_checked};
//!
//! let s = build_sentence("15MvlfPP1so?Vt@EWFs3Jjht0000", 0, 'A', 1, 1);
//! assert_eq!(s, "!AIVDM,1,1,,A,15MvlfPP1so?Vt@EWFs3Jjht0000,0*4B");
//!
//! let (payload, fill) = parse_sentence_checked(&s).unwrap();
//! assert_eq!(payload, "15MvlfPP1so?Vt@EWFs3Jjht0000");
//! assert_eq!(fill, 0);
//! ```

use std::collections::HashMap;

use crate::bits::{armor, dearmor};
use crate::types::{AisError, Bit, Result};

/// Sentence types accepted on input.
pub const ACCEPTED_TALKERS: [&str; 3] = ["AIVDM", "BSVDM", "AIVDO"];

/// Payload characters per sentence when splitting long messages.
pub const DEFAULT_MAX_PAYLOAD_CHARS: usize = 60;

/// XOR of every byte of `body` (the text between `!` and `*`).
pub fn compute_checksum(body: &str) -> u8 {
    body.bytes().fold(0u8, |acc, b| acc ^ b)
}

/// Build a single `!AIVDM` sentence without a sequential message id.
pub fn build_sentence(payload: &str, fill: u8, channel: char, msg_count: u8, msg_index: u8) -> String {
    build_fragment(payload, fill, channel, msg_count, msg_index, None)
}

/// Build one fragment, optionally carrying a sequential message id.
pub fn build_fragment(
    payload: &str,
    fill: u8,
    channel: char,
    msg_count: u8,
    msg_index: u8,
    sequence_id: Option<u8>,
) -> String {
    let seq = sequence_id.map(|s| s.to_string()).unwrap_or_default();
    let body = format!(
        "AIVDM,{},{},{},{},{},{}",
        msg_count, msg_index, seq, channel, payload, fill
    );
    format!("!{}*{:02X}", body, compute_checksum(&body))
}

/// Extract `(payload, fill)` from a sentence without verifying the checksum.
pub fn parse_sentence(s: &str) -> Result<(String, u8)> {
    let sentence = NmeaSentence::parse_unchecked(s)?;
    Ok((sentence.payload, sentence.fill_bits))
}

/// Extract `(payload, fill)`, rejecting sentences whose checksum is missing or wrong.
pub fn parse_sentence_checked(s: &str) -> Result<(String, u8)> {
    let sentence = NmeaSentence::parse(s)?;
    Ok((sentence.payload, sentence.fill_bits))
}

/// Structured view of one AIVDM/AIVDO fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NmeaSentence {
    /// Talker and sentence type, e.g. `AIVDM`
    pub talker: String,
    pub fragment_count: u8,
    pub fragment_number: u8,
    pub sequence_id: Option<u8>,
    pub channel: Option<char>,
    pub payload: String,
    pub fill_bits: u8,
}

impl NmeaSentence {
    /// Parse and verify the checksum.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (body, checksum) = split_checksum(s)?;
        let expected = checksum.ok_or_else(|| AisError::MalformedSentence("missing checksum".into()))?;
        let computed = compute_checksum(body) as u16;
        if expected != computed {
            return Err(AisError::ChecksumMismatch { expected, computed });
        }
        Self::parse_body(body)
    }

    /// Parse without checking the checksum field.
    pub fn parse_unchecked(s: &str) -> Result<Self> {
        let (body, _) = split_checksum(s.trim())?;
        Self::parse_body(body)
    }

    fn parse_body(body: &str) -> Result<Self> {
        let fields: Vec<&str> = body.split(',').collect();
        if fields.len() < 7 {
            return Err(AisError::MalformedSentence(format!(
                "expected 7 fields, found {}",
                fields.len()
            )));
        }
        let talker = fields[0];
        if !ACCEPTED_TALKERS.contains(&talker) {
            return Err(AisError::MalformedSentence(format!("unexpected sentence type {}", talker)));
        }

        let number = |name: &str, text: &str| -> Result<u8> {
            text.trim()
                .parse::<u8>()
                .map_err(|_| AisError::MalformedSentence(format!("bad {} field {:?}", name, text)))
        };
        let fragment_count = number("fragment count", fields[1])?;
        let fragment_number = number("fragment number", fields[2])?;
        if fragment_count == 0 || fragment_number == 0 || fragment_number > fragment_count {
            return Err(AisError::MalformedSentence(format!(
                "fragment {} of {}",
                fragment_number, fragment_count
            )));
        }
        let sequence_id = if fields[3].is_empty() {
            None
        } else {
            Some(number("sequence id", fields[3])?)
        };
        let channel = fields[4].chars().next();
        let fill_bits = number("fill", fields[6])?;
        if fill_bits > 5 {
            return Err(AisError::MalformedSentence(format!("fill bits {} out of range", fill_bits)));
        }

        Ok(Self {
            talker: talker.to_string(),
            fragment_count,
            fragment_number,
            sequence_id,
            channel,
            payload: fields[5].to_string(),
            fill_bits,
        })
    }

    pub fn is_single(&self) -> bool {
        self.fragment_count == 1
    }

    /// Render back to sentence text with a fresh checksum.
    pub fn to_sentence(&self) -> String {
        let seq = self.sequence_id.map(|s| s.to_string()).unwrap_or_default();
        let channel = self.channel.map(String::from).unwrap_or_default();
        let body = format!(
            "{},{},{},{},{},{},{}",
            self.talker, self.fragment_count, self.fragment_number, seq, channel, self.payload, self.fill_bits
        );
        format!("!{}*{:02X}", body, compute_checksum(&body))
    }

    /// Message bits of a single-fragment sentence.
    pub fn bits(&self) -> Result<Vec<Bit>> {
        dearmor(&self.payload, self.fill_bits)
    }
}

/// Split `!body*HH` into the body and the parsed checksum, if present.
fn split_checksum(s: &str) -> Result<(&str, Option<u16>)> {
    let rest = s
        .strip_prefix('!')
        .or_else(|| s.strip_prefix('$'))
        .ok_or_else(|| AisError::MalformedSentence("sentence must start with '!'".into()))?;
    match rest.rsplit_once('*') {
        Some((body, tail)) => {
            let hex = tail.trim();
            let value = if hex.len() == 2 {
                u16::from_str_radix(hex, 16).ok()
            } else {
                None
            };
            let value = value.ok_or_else(|| AisError::MalformedSentence(format!("bad checksum field {:?}", tail)))?;
            Ok((body, Some(value)))
        }
        None => Ok((rest, None)),
    }
}

/// Armor `bits` and split them into as many fragments as `max_payload_chars` requires.
///
/// Single-fragment output omits the sequential message id. Fill bits are
/// reported on the last fragment only.
pub fn encode_sentences(bits: &[Bit], channel: char, sequence_id: u8, max_payload_chars: usize) -> Result<Vec<String>> {
    if max_payload_chars == 0 {
        return Err(AisError::InvalidParameter("max_payload_chars must be > 0".into()));
    }
    if sequence_id > 9 {
        return Err(AisError::InvalidParameter(format!("sequence id {} out of range 0-9", sequence_id)));
    }
    let (payload, fill) = armor(bits);
    let chunks: Vec<&str> = if payload.is_empty() {
        vec![""]
    } else {
        payload
            .as_bytes()
            .chunks(max_payload_chars)
            .map(|c| std::str::from_utf8(c).unwrap_or_default())
            .collect()
    };
    if chunks.len() > 9 {
        return Err(AisError::InvalidParameter(format!(
            "payload needs {} fragments, at most 9 allowed",
            chunks.len()
        )));
    }

    let count = chunks.len() as u8;
    let seq = if count > 1 { Some(sequence_id) } else { None };
    Ok(chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let last = i + 1 == chunks.len();
            build_fragment(chunk, if last { fill } else { 0 }, channel, count, i as u8 + 1, seq)
        })
        .collect())
}

/// A payload reassembled from one or more fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPayload {
    pub channel: Option<char>,
    pub payload: String,
    pub fill_bits: u8,
}

impl AssembledPayload {
    pub fn bits(&self) -> Result<Vec<Bit>> {
        dearmor(&self.payload, self.fill_bits)
    }
}

#[derive(Debug)]
struct PartialMessage {
    fragment_count: u8,
    next_fragment: u8,
    payload: String,
}

/// Joins multi-fragment messages keyed by sequence id and channel.
///
/// A fragment that arrives out of order, or disagrees with the count of the
/// partial message it belongs to, discards that partial message.
#[derive(Debug, Default)]
pub struct SentenceAssembler {
    pending: HashMap<(Option<u8>, Option<char>), PartialMessage>,
}

impl SentenceAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of partially assembled messages.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Parse (with checksum verification) and push one line.
    pub fn push_line(&mut self, line: &str) -> Result<Option<AssembledPayload>> {
        let sentence = NmeaSentence::parse(line)?;
        Ok(self.push(sentence))
    }

    /// Push a parsed fragment; returns the payload once the last fragment arrives.
    pub fn push(&mut self, sentence: NmeaSentence) -> Option<AssembledPayload> {
        if sentence.is_single() {
            return Some(AssembledPayload {
                channel: sentence.channel,
                payload: sentence.payload,
                fill_bits: sentence.fill_bits,
            });
        }

        let key = (sentence.sequence_id, sentence.channel);
        if sentence.fragment_number == 1 {
            if self.pending.remove(&key).is_some() {
                tracing::debug!(?key, "discarding incomplete message");
            }
            self.pending.insert(
                key,
                PartialMessage {
                    fragment_count: sentence.fragment_count,
                    next_fragment: 2,
                    payload: sentence.payload,
                },
            );
            return None;
        }

        let partial = match self.pending.get_mut(&key) {
            Some(p) => p,
            None => {
                tracing::debug!(?key, fragment = sentence.fragment_number, "fragment without a start");
                return None;
            }
        };
        if partial.fragment_count != sentence.fragment_count || partial.next_fragment != sentence.fragment_number {
            tracing::debug!(?key, fragment = sentence.fragment_number, "fragment out of sequence");
            self.pending.remove(&key);
            return None;
        }

        partial.payload.push_str(&sentence.payload);
        partial.next_fragment += 1;
        if sentence.fragment_number < sentence.fragment_count {
            return None;
        }
        self.pending.remove(&key).map(|p| AssembledPayload {
            channel: sentence.channel,
            payload: p.payload,
            fill_bits: sentence.fill_bits,
        })
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPE5_PART1: &str = "!AIVDM,2,1,3,B,55P5TL01VIaAL@7WKO@mBplU@<PDhh000000001S;AJ::4A80?4i@E53,0*3E";
    const TYPE5_PART2: &str = "!AIVDM,2,2,3,B,1@0000000000000,2*55";

    #[test]
    fn test_checksum_literals() {
        assert_eq!(compute_checksum("AIVDM,1,1,,B,177KQJ5000G?tO`K>RA1wUbN0TKH,0"), 0x5C);
        assert_eq!(compute_checksum("AIVDM,1,1,,A,13HOI:0P0000VOHLCnHQKwvL05Ip,0"), 0x23);
        assert_eq!(compute_checksum("AIVDM,1,1,,A,B6CdCm0t3`tba35f@V9faHi7kP06,0"), 0x58);
        assert_eq!(compute_checksum("AIVDM,2,2,3,B,1@0000000000000,2"), 0x55);
        assert_eq!(compute_checksum("AIVDM,1,1,,A,15MvlfP000G?n@@K>OW`4?vN0<0=,0"), 0x5A);
    }

    #[test]
    fn test_build_sentence() {
        assert_eq!(
            build_sentence("177KQJ5000G?tO`K>RA1wUbN0TKH", 0, 'B', 1, 1),
            "!AIVDM,1,1,,B,177KQJ5000G?tO`K>RA1wUbN0TKH,0*5C"
        );
        assert_eq!(
            build_fragment("1@0000000000000", 2, 'B', 2, 2, Some(3)),
            TYPE5_PART2
        );
    }

    #[test]
    fn test_parse_sentence_lenient() {
        let (payload, fill) = parse_sentence("!AIVDM,1,1,,A,15MvlfP000G?n@@K>OW`4?vN0<0=,0*47").unwrap();
        assert_eq!(payload, "15MvlfP000G?n@@K>OW`4?vN0<0=");
        assert_eq!(fill, 0);

        let (payload, fill) = parse_sentence("!BSVDM,1,1,,A,13HOI:0P0000VOHLCnHQKwvL05Ip,0").unwrap();
        assert_eq!(payload, "13HOI:0P0000VOHLCnHQKwvL05Ip");
        assert_eq!(fill, 0);
    }

    #[test]
    fn test_parse_sentence_checked_rejects_bad_checksum() {
        assert_eq!(
            parse_sentence_checked("!AIVDM,1,1,,A,15MvlfP000G?n@@K>OW`4?vN0<0=,0*47"),
            Err(AisError::ChecksumMismatch {
                expected: 0x47,
                computed: 0x5A
            })
        );
        assert!(parse_sentence_checked("!AIVDM,1,1,,A,15MvlfP000G?n@@K>OW`4?vN0<0=,0*5A").is_ok());
        assert!(matches!(
            parse_sentence_checked("!AIVDM,1,1,,A,15MvlfP000G?n@@K>OW`4?vN0<0=,0"),
            Err(AisError::MalformedSentence(_))
        ));
    }

    #[test]
    fn test_parse_malformed() {
        for bad in [
            "AIVDM,1,1,,A,15Mvlf,0*00",
            "!GPGGA,1,1,,A,15Mvlf,0",
            "!AIVDM,1,1,,A,15Mvlf",
            "!AIVDM,1,1,,A,15Mvlf,x",
            "!AIVDM,1,1,,A,15Mvlf,7",
            "!AIVDM,1,3,,A,15Mvlf,0",
            "!AIVDM,1,1,,A,15Mvlf,0*Z1",
        ] {
            assert!(
                matches!(parse_sentence(bad), Err(AisError::MalformedSentence(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_structured_parse() {
        let s = NmeaSentence::parse(TYPE5_PART1).unwrap();
        assert_eq!(s.talker, "AIVDM");
        assert_eq!(s.fragment_count, 2);
        assert_eq!(s.fragment_number, 1);
        assert_eq!(s.sequence_id, Some(3));
        assert_eq!(s.channel, Some('B'));
        assert_eq!(s.fill_bits, 0);
        assert_eq!(s.to_sentence(), TYPE5_PART1);
        assert!(!s.is_single());
    }

    #[test]
    fn test_encode_sentences_splits_type5() {
        let mut bits = dearmor("55P5TL01VIaAL@7WKO@mBplU@<PDhh000000001S;AJ::4A80?4i@E53", 0).unwrap();
        bits.extend(dearmor("1@0000000000000", 2).unwrap());
        assert_eq!(bits.len(), 424);

        let sentences = encode_sentences(&bits, 'B', 3, DEFAULT_MAX_PAYLOAD_CHARS).unwrap();
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].starts_with("!AIVDM,2,1,3,B,"));
        assert!(sentences[1].starts_with("!AIVDM,2,2,3,B,"));
        assert!(sentences[0].contains(",0*"));
        assert!(sentences[1].contains(",2*"));

        let mut assembler = SentenceAssembler::new();
        assert_eq!(assembler.push_line(&sentences[0]).unwrap(), None);
        let assembled = assembler.push_line(&sentences[1]).unwrap().unwrap();
        assert_eq!(assembled.bits().unwrap(), bits);
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn test_encode_single_sentence() {
        let bits = dearmor("15MvlfPP1so?Vt@EWFs3Jjht0000", 0).unwrap();
        let sentences = encode_sentences(&bits, 'A', 0, DEFAULT_MAX_PAYLOAD_CHARS).unwrap();
        assert_eq!(sentences, vec!["!AIVDM,1,1,,A,15MvlfPP1so?Vt@EWFs3Jjht0000,0*4B".to_string()]);
        assert!(encode_sentences(&bits, 'A', 10, 60).is_err());
        assert!(encode_sentences(&bits, 'A', 0, 0).is_err());
    }

    #[test]
    fn test_assembler_gpsd_fragments() {
        let mut assembler = SentenceAssembler::new();
        assert!(assembler.push_line(TYPE5_PART1).unwrap().is_none());
        assert_eq!(assembler.pending(), 1);
        let assembled = assembler.push_line(TYPE5_PART2).unwrap().unwrap();
        assert_eq!(assembled.channel, Some('B'));
        assert_eq!(assembled.fill_bits, 2);
        assert_eq!(assembled.bits().unwrap().len(), 424);
    }

    #[test]
    fn test_assembler_drops_out_of_order() {
        let mut assembler = SentenceAssembler::new();
        assert!(assembler.push_line(TYPE5_PART2).unwrap().is_none());
        assert_eq!(assembler.pending(), 0);

        assert!(assembler.push_line(TYPE5_PART1).unwrap().is_none());
        // a restart of the same sequence id replaces the partial message
        assert!(assembler.push_line(TYPE5_PART1).unwrap().is_none());
        assert_eq!(assembler.pending(), 1);
        assert!(assembler.push_line(TYPE5_PART2).unwrap().is_some());
    }

    #[test]
    fn test_assembler_single_passthrough() {
        let mut assembler = SentenceAssembler::new();
        let out = assembler
            .push_line("!AIVDM,1,1,,A,B6CdCm0t3`tba35f@V9faHi7kP06,0*58")
            .unwrap()
            .unwrap();
        assert_eq!(out.payload, "B6CdCm0t3`tba35f@V9faHi7kP06");
        assert_eq!(out.channel, Some('A'));
    }
}

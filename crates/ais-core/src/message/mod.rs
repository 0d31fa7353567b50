//! AIS message codec (ITU-R M.1371-5)
//!
//! Maps typed message records to and from their fixed bit layouts. Field
//! widths are literal constants of the wire format; the codec enforces width
//! and two's-complement sign handling but does no plausibility checking of
//! navigational values.
//!
//! | Type      | Record                     | Bits            |
//! |-----------|----------------------------|-----------------|
//! | 1, 2, 3   | [`PositionReport`]         | 168             |
//! | 4         | [`BaseStationReport`]      | 168             |
//! | 5         | [`StaticVoyageData`]       | 424             |
//! | 18        | [`ClassBPositionReport`]   | 168             |
//! | 21        | [`AidToNavigationReport`]  | 272 + 6·n       |
//! | 24        | [`ClassBStaticData`]       | 168 (A: or 160) |
//!
//! ## Example
//!
//! ```rust
//! use ais_core::message::{AisMessage, PositionReport};
//!
//! let mut report = PositionReport::new(366_982_330);
//! report.speed_over_ground = Some(12.3);
//! report.longitude = Some(-122.4194);
//! report.latitude = Some(37.7749);
//!
//! let msg = AisMessage::PositionReport(report);
//! let bits = msg.encode().unwrap();
//! assert_eq!(bits.len(), 168);
//!
//! let decoded = AisMessage::decode(&bits, 1).unwrap();
//! assert_eq!(decoded, msg);
//! ```

mod aton;
mod base_station;
mod class_b;
mod class_b_static;
pub mod fields;
mod position;
mod static_voyage;

pub use aton::AidToNavigationReport;
pub use base_station::BaseStationReport;
pub use class_b::ClassBPositionReport;
pub use class_b_static::{is_auxiliary_craft, ClassBStaticData, ClassBStaticPart, CraftReference};
pub use fields::{Dimensions, NavigationStatus};
pub use position::PositionReport;
pub use static_voyage::{Eta, StaticVoyageData};

use serde::{Deserialize, Serialize};

use crate::bits::{self, peek_message_type, BitReader, BitVector};
use crate::types::{AisError, Bit, Result};

/// Message record, one variant per supported message family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AisMessage {
    /// Types 1, 2 and 3
    PositionReport(PositionReport),
    /// Type 4
    BaseStationReport(BaseStationReport),
    /// Type 5
    StaticVoyageData(StaticVoyageData),
    /// Type 18
    ClassBPositionReport(ClassBPositionReport),
    /// Type 21
    AidToNavigationReport(AidToNavigationReport),
    /// Type 24
    ClassBStaticData(ClassBStaticData),
}

impl AisMessage {
    pub fn message_type(&self) -> u8 {
        match self {
            AisMessage::PositionReport(m) => m.message_type,
            AisMessage::BaseStationReport(_) => 4,
            AisMessage::StaticVoyageData(_) => 5,
            AisMessage::ClassBPositionReport(_) => 18,
            AisMessage::AidToNavigationReport(_) => 21,
            AisMessage::ClassBStaticData(_) => 24,
        }
    }

    pub fn mmsi(&self) -> u32 {
        match self {
            AisMessage::PositionReport(m) => m.mmsi,
            AisMessage::BaseStationReport(m) => m.mmsi,
            AisMessage::StaticVoyageData(m) => m.mmsi,
            AisMessage::ClassBPositionReport(m) => m.mmsi,
            AisMessage::AidToNavigationReport(m) => m.mmsi,
            AisMessage::ClassBStaticData(m) => m.mmsi,
        }
    }

    pub fn repeat_indicator(&self) -> u8 {
        match self {
            AisMessage::PositionReport(m) => m.repeat_indicator,
            AisMessage::BaseStationReport(m) => m.repeat_indicator,
            AisMessage::StaticVoyageData(m) => m.repeat_indicator,
            AisMessage::ClassBPositionReport(m) => m.repeat_indicator,
            AisMessage::AidToNavigationReport(m) => m.repeat_indicator,
            AisMessage::ClassBStaticData(m) => m.repeat_indicator,
        }
    }

    /// Exact encoded length, before six-bit padding.
    pub fn encoded_len(&self) -> usize {
        match self {
            AisMessage::PositionReport(_) => PositionReport::BITS,
            AisMessage::BaseStationReport(_) => BaseStationReport::BITS,
            AisMessage::StaticVoyageData(_) => StaticVoyageData::BITS,
            AisMessage::ClassBPositionReport(_) => ClassBPositionReport::BITS,
            AisMessage::AidToNavigationReport(m) => m.encoded_len(),
            AisMessage::ClassBStaticData(m) => match m.part {
                ClassBStaticPart::A { .. } => ClassBStaticData::PART_A_BITS,
                ClassBStaticPart::B { .. } => ClassBStaticData::PART_B_BITS,
            },
        }
    }

    /// Encode to the message's bit layout.
    pub fn encode(&self) -> Result<Vec<Bit>> {
        let expected = self.encoded_len();
        let mut w = BitVector::with_capacity(expected);
        match self {
            AisMessage::PositionReport(m) => m.write(&mut w)?,
            AisMessage::BaseStationReport(m) => m.write(&mut w)?,
            AisMessage::StaticVoyageData(m) => m.write(&mut w)?,
            AisMessage::ClassBPositionReport(m) => m.write(&mut w)?,
            AisMessage::AidToNavigationReport(m) => m.write(&mut w)?,
            AisMessage::ClassBStaticData(m) => m.write(&mut w)?,
        }

        if w.len() != expected {
            tracing::error!(
                msg_type = self.message_type(),
                expected,
                actual = w.len(),
                "encoded message has wrong length"
            );
            debug_assert_eq!(w.len(), expected, "codec layout bug");
            return Err(AisError::StructuralLength {
                msg_type: self.message_type(),
                expected,
                actual: w.len(),
            });
        }
        Ok(w.into_bits())
    }

    /// Decode a record of the given message type.
    pub fn decode(bits: &[Bit], msg_type: u8) -> Result<Self> {
        let expected = match msg_type {
            1..=3 => PositionReport::BITS,
            4 => BaseStationReport::BITS,
            5 => StaticVoyageData::BITS,
            18 => ClassBPositionReport::BITS,
            21 => AidToNavigationReport::BITS,
            24 => ClassBStaticData::PART_B_BITS,
            other => return Err(AisError::UnsupportedMessageType(other)),
        };

        let header = peek_message_type(bits).ok_or(AisError::StructuralLength {
            msg_type,
            expected,
            actual: bits.len(),
        })?;
        if header != msg_type {
            return Err(AisError::TypeMismatch {
                expected: msg_type,
                actual: header,
            });
        }

        let length_ok = match msg_type {
            21 => {
                bits.len() >= expected
                    && bits.len() < expected + 6 * (AidToNavigationReport::MAX_EXTENSION_CHARS + 1)
            }
            24 => bits.len() == ClassBStaticData::PART_A_SHORT_BITS || bits.len() == expected,
            _ => bits.len() == expected,
        };
        if !length_ok {
            return Err(AisError::StructuralLength {
                msg_type,
                expected,
                actual: bits.len(),
            });
        }

        let mut r = BitReader::new(bits);
        let msg = match msg_type {
            1..=3 => AisMessage::PositionReport(PositionReport::read(&mut r)?),
            4 => AisMessage::BaseStationReport(BaseStationReport::read(&mut r)?),
            5 => AisMessage::StaticVoyageData(StaticVoyageData::read(&mut r)?),
            18 => AisMessage::ClassBPositionReport(ClassBPositionReport::read(&mut r)?),
            21 => AisMessage::AidToNavigationReport(AidToNavigationReport::read(&mut r)?),
            _ => AisMessage::ClassBStaticData(ClassBStaticData::read(&mut r)?),
        };
        Ok(msg)
    }

    /// Decode a record, taking the message type from its header.
    pub fn from_bits(bits: &[Bit]) -> Result<Self> {
        let msg_type = peek_message_type(bits).ok_or(AisError::StructuralLength {
            msg_type: 0,
            expected: 6,
            actual: bits.len(),
        })?;
        Self::decode(bits, msg_type)
    }

    /// Encode and armor into an NMEA payload string plus fill-bit count.
    pub fn to_payload(&self) -> Result<(String, u8)> {
        Ok(bits::armor(&self.encode()?))
    }

    /// Decode from an armored NMEA payload.
    pub fn from_payload(payload: &str, fill: u8) -> Result<Self> {
        Self::from_bits(&bits::dearmor(payload, fill)?)
    }
}

/// Encode a message to its bit layout.
pub fn encode(msg: &AisMessage) -> Result<Vec<Bit>> {
    msg.encode()
}

/// Decode `bits` as a message of type `msg_type`.
pub fn decode(bits: &[Bit], msg_type: u8) -> Result<AisMessage> {
    AisMessage::decode(bits, msg_type)
}

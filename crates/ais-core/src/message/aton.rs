//! Aid-to-navigation report (message type 21).
//!
//! The fixed part is 272 bits and carries a 20 character name. Names longer
//! than 20 characters continue in an extension of up to 14 six-bit
//! characters appended after the fixed part.

use serde::{Deserialize, Serialize};

use super::fields::{self, Dimensions};
use crate::bits::{decode_text, BitReader, BitVector};
use crate::types::{AisError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AidToNavigationReport {
    pub repeat_indicator: u8,
    pub mmsi: u32,
    /// Aid type code (0 = not specified, 1..=31 per ITU-R M.1371 table 74)
    pub aid_type: u8,
    /// Up to 34 characters including the extension
    pub name: String,
    pub position_accuracy: bool,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub dimensions: Dimensions,
    pub epfd_type: u8,
    pub timestamp: u8,
    pub off_position: bool,
    /// Regional / AtoN status bits
    pub aton_status: u8,
    pub raim: bool,
    pub virtual_aid: bool,
    pub assigned: bool,
}

impl AidToNavigationReport {
    /// Length of the fixed part.
    pub const BITS: usize = 272;
    pub const NAME_CHARS: usize = 20;
    pub const MAX_EXTENSION_CHARS: usize = 14;

    pub fn new(mmsi: u32, name: impl Into<String>) -> Self {
        Self {
            repeat_indicator: 0,
            mmsi,
            aid_type: 0,
            name: name.into(),
            position_accuracy: false,
            longitude: None,
            latitude: None,
            dimensions: Dimensions::default(),
            epfd_type: 0,
            timestamp: fields::TIMESTAMP_NOT_AVAILABLE,
            off_position: false,
            aton_status: 0,
            raim: false,
            virtual_aid: false,
            assigned: false,
        }
    }

    /// Characters carried in the name extension.
    pub fn extension_chars(&self) -> usize {
        self.name.trim_end().chars().count().saturating_sub(Self::NAME_CHARS)
    }

    /// Encoded length including the name extension.
    pub fn encoded_len(&self) -> usize {
        Self::BITS + 6 * self.extension_chars()
    }

    pub(crate) fn write(&self, w: &mut BitVector) -> Result<()> {
        let name = self.name.trim_end();
        let extension = self.extension_chars();
        if extension > Self::MAX_EXTENSION_CHARS {
            return Err(AisError::ValueOutOfRange {
                field: "name",
                value: name.chars().count() as i64,
                bits: (Self::NAME_CHARS + Self::MAX_EXTENSION_CHARS) * 6,
            });
        }
        let head: String = name.chars().take(Self::NAME_CHARS).collect();
        let tail: String = name.chars().skip(Self::NAME_CHARS).collect();

        w.append_uint(21, 6);
        w.append_uint_checked("repeat_indicator", self.repeat_indicator as u32, 2)?;
        w.append_uint_checked("mmsi", self.mmsi, 30)?;
        w.append_uint_checked("aid_type", self.aid_type as u32, 5)?;
        w.append_text("name", &head, Self::NAME_CHARS)?;
        w.push(self.position_accuracy);
        fields::write_position(w, self.longitude, self.latitude)?;
        self.dimensions.write(w)?;
        fields::write_epfd(w, self.epfd_type)?;
        fields::write_timestamp(w, self.timestamp)?;
        w.push(self.off_position);
        w.append_uint(self.aton_status as u32, 8);
        w.push(self.raim);
        w.push(self.virtual_aid);
        w.push(self.assigned);
        w.append_uint(0, 1);
        if extension > 0 {
            w.append_text("name_extension", &tail, extension)?;
        }
        Ok(())
    }

    pub(crate) fn read(r: &mut BitReader<'_>) -> Result<Self> {
        r.skip(6)?;
        let repeat_indicator = r.uint(2)? as u8;
        let mmsi = r.uint(30)?;
        let aid_type = r.uint(5)? as u8;
        let mut name = r.text(Self::NAME_CHARS)?;
        let position_accuracy = r.flag()?;
        let (longitude, latitude) = fields::read_position(r)?;
        let dimensions = Dimensions::read(r)?;
        let epfd_type = r.uint(4)? as u8;
        let timestamp = r.uint(6)? as u8;
        let off_position = r.flag()?;
        let aton_status = r.uint(8)? as u8;
        let raim = r.flag()?;
        let virtual_aid = r.flag()?;
        let assigned = r.flag()?;
        r.skip(1)?;

        // Trailing bits that do not fill a character are padding.
        let extension_chars = (r.remaining() / 6).min(Self::MAX_EXTENSION_CHARS);
        if extension_chars > 0 {
            let mut ext = BitVector::new();
            for _ in 0..extension_chars * 6 {
                ext.push(r.flag()?);
            }
            let ext = decode_text(ext.as_slice());
            if !ext.is_empty() {
                // the fixed part is space padded when an extension follows
                name = format!("{:<width$}{}", name, ext, width = Self::NAME_CHARS);
            }
        }

        Ok(Self {
            repeat_indicator,
            mmsi,
            aid_type,
            name,
            position_accuracy,
            longitude,
            latitude,
            dimensions,
            epfd_type,
            timestamp,
            off_position,
            aton_status,
            raim,
            virtual_aid,
            assigned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(report: &AidToNavigationReport) -> (usize, AidToNavigationReport) {
        let mut w = BitVector::new();
        report.write(&mut w).unwrap();
        let bits = w.into_bits();
        let decoded = AidToNavigationReport::read(&mut BitReader::new(&bits)).unwrap();
        (bits.len(), decoded)
    }

    #[test]
    fn test_short_name_has_no_extension() {
        let mut report = AidToNavigationReport::new(993_672_085, "SF APPROACH LIGHTED");
        report.aid_type = 9;
        report.longitude = Some(-122.6833);
        report.latitude = Some(37.7550);
        report.virtual_aid = true;

        let (len, decoded) = round_trip(&report);
        assert_eq!(len, 272);
        assert_eq!(decoded, report);
    }

    #[test]
    fn test_long_name_uses_extension() {
        let report = AidToNavigationReport::new(993_672_086, "GOLDEN GATE BRIDGE MID SPAN LIGHT");
        assert_eq!(report.extension_chars(), 13);
        assert_eq!(report.encoded_len(), 272 + 78);

        let (len, decoded) = round_trip(&report);
        assert_eq!(len, 350);
        assert_eq!(decoded.name, "GOLDEN GATE BRIDGE MID SPAN LIGHT");
    }

    #[test]
    fn test_extension_with_padding_bits() {
        let report = AidToNavigationReport::new(993_672_087, "NORTH CHANNEL BUOY NO 7");
        let mut w = BitVector::new();
        report.write(&mut w).unwrap();
        // byte alignment padding some senders append
        w.append_uint(0, 4);
        let bits = w.into_bits();
        let decoded = AidToNavigationReport::read(&mut BitReader::new(&bits)).unwrap();
        assert_eq!(decoded.name, "NORTH CHANNEL BUOY NO 7");
    }

    #[test]
    fn test_name_too_long() {
        let report = AidToNavigationReport::new(993_672_088, "X".repeat(35));
        let mut w = BitVector::new();
        assert!(matches!(
            report.write(&mut w),
            Err(AisError::ValueOutOfRange { field: "name", .. })
        ));
    }
}

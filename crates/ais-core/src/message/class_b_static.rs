//! Class B static data report (message type 24), parts A and B.
//!
//! Part A carries the vessel name, part B the ship type, vendor identity,
//! call sign and either the hull dimensions or, for auxiliary craft whose MMSI
//! starts with `98`, the MMSI of the mothership.

use serde::{Deserialize, Serialize};

use super::fields::Dimensions;
use crate::bits::{BitReader, BitVector};
use crate::types::{AisError, Result};

/// True for auxiliary craft MMSIs of the form `98XXXXXXX`.
pub fn is_auxiliary_craft(mmsi: u32) -> bool {
    mmsi / 10_000_000 == 98
}

/// Part B reference field: dimensions, or the mothership of an auxiliary craft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CraftReference {
    Dimensions(Dimensions),
    Mothership(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassBStaticPart {
    A {
        vessel_name: String,
    },
    B {
        ship_type: u8,
        /// Three character manufacturer id
        vendor_id: String,
        unit_model: u8,
        serial_number: u32,
        call_sign: String,
        reference: CraftReference,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBStaticData {
    pub repeat_indicator: u8,
    pub mmsi: u32,
    pub part: ClassBStaticPart,
}

impl ClassBStaticData {
    pub const PART_A_BITS: usize = 168;
    /// Part A length used by pre-1371-4 transmitters, without the spare byte.
    pub const PART_A_SHORT_BITS: usize = 160;
    pub const PART_B_BITS: usize = 168;

    pub fn part_a(mmsi: u32, vessel_name: impl Into<String>) -> Self {
        Self {
            repeat_indicator: 0,
            mmsi,
            part: ClassBStaticPart::A {
                vessel_name: vessel_name.into(),
            },
        }
    }

    pub fn part_number(&self) -> u8 {
        match self.part {
            ClassBStaticPart::A { .. } => 0,
            ClassBStaticPart::B { .. } => 1,
        }
    }

    pub(crate) fn write(&self, w: &mut BitVector) -> Result<()> {
        w.append_uint(24, 6);
        w.append_uint_checked("repeat_indicator", self.repeat_indicator as u32, 2)?;
        w.append_uint_checked("mmsi", self.mmsi, 30)?;
        w.append_uint(self.part_number() as u32, 2);
        match &self.part {
            ClassBStaticPart::A { vessel_name } => {
                w.append_text("vessel_name", vessel_name, 20)?;
                w.append_uint(0, 8);
            }
            ClassBStaticPart::B {
                ship_type,
                vendor_id,
                unit_model,
                serial_number,
                call_sign,
                reference,
            } => {
                let auxiliary = is_auxiliary_craft(self.mmsi);
                if auxiliary != matches!(reference, CraftReference::Mothership(_)) {
                    return Err(AisError::InvalidParameter(format!(
                        "type 24 part B for MMSI {} must carry {}",
                        self.mmsi,
                        if auxiliary { "a mothership MMSI" } else { "dimensions" }
                    )));
                }
                w.append_uint(*ship_type as u32, 8);
                w.append_text("vendor_id", vendor_id, 3)?;
                w.append_uint_checked("unit_model", *unit_model as u32, 4)?;
                w.append_uint_checked("serial_number", *serial_number, 20)?;
                w.append_text("call_sign", call_sign, 7)?;
                match reference {
                    CraftReference::Dimensions(dims) => dims.write(w)?,
                    CraftReference::Mothership(mmsi) => w.append_uint_checked("mothership_mmsi", *mmsi, 30)?,
                }
                w.append_uint(0, 6);
            }
        }
        Ok(())
    }

    /// Decode either part; the reference field of part B is interpreted from the MMSI.
    pub(crate) fn read(r: &mut BitReader<'_>) -> Result<Self> {
        r.skip(6)?;
        let repeat_indicator = r.uint(2)? as u8;
        let mmsi = r.uint(30)?;
        let part_number = r.uint(2)?;

        let part = if part_number == 0 {
            let vessel_name = r.text(20)?;
            // the spare byte is absent on short part A reports
            let spare = r.remaining().min(8);
            r.skip(spare)?;
            ClassBStaticPart::A { vessel_name }
        } else {
            let ship_type = r.uint(8)? as u8;
            let vendor_id = r.text(3)?;
            let unit_model = r.uint(4)? as u8;
            let serial_number = r.uint(20)?;
            let call_sign = r.text(7)?;
            let reference = if is_auxiliary_craft(mmsi) {
                CraftReference::Mothership(r.uint(30)?)
            } else {
                CraftReference::Dimensions(Dimensions::read(r)?)
            };
            r.skip(6)?;
            ClassBStaticPart::B {
                ship_type,
                vendor_id,
                unit_model,
                serial_number,
                call_sign,
                reference,
            }
        };

        Ok(Self {
            repeat_indicator,
            mmsi,
            part,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auxiliary_craft_prefix() {
        assert!(is_auxiliary_craft(983_191_049));
        assert!(!is_auxiliary_craft(338_123_456));
        assert!(!is_auxiliary_craft(9_800_000));
    }

    #[test]
    fn test_part_b_mothership_round_trip() {
        let msg = ClassBStaticData {
            repeat_indicator: 0,
            mmsi: 983_191_049,
            part: ClassBStaticPart::B {
                ship_type: 37,
                vendor_id: "SRT".into(),
                unit_model: 2,
                serial_number: 0x5_4321,
                call_sign: "TENDER1".into(),
                reference: CraftReference::Mothership(338_123_456),
            },
        };
        let mut w = BitVector::new();
        msg.write(&mut w).unwrap();
        assert_eq!(w.len(), ClassBStaticData::PART_B_BITS);
        let decoded = ClassBStaticData::read(&mut BitReader::new(w.as_slice())).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_part_b_reference_must_match_mmsi() {
        let part_b = |mmsi, reference| ClassBStaticData {
            repeat_indicator: 0,
            mmsi,
            part: ClassBStaticPart::B {
                ship_type: 37,
                vendor_id: "SRT".into(),
                unit_model: 2,
                serial_number: 1,
                call_sign: "TENDER1".into(),
                reference,
            },
        };
        let dims = Dimensions {
            to_bow: 5,
            to_stern: 3,
            to_port: 1,
            to_starboard: 1,
        };

        let mut w = BitVector::new();
        let err = part_b(338_123_456, CraftReference::Mothership(338_000_001)).write(&mut w);
        assert!(matches!(err, Err(AisError::InvalidParameter(_))));
        let err = part_b(983_191_049, CraftReference::Dimensions(dims)).write(&mut w);
        assert!(matches!(err, Err(AisError::InvalidParameter(_))));

        let msg = part_b(338_123_456, CraftReference::Dimensions(dims));
        let mut w = BitVector::new();
        msg.write(&mut w).unwrap();
        assert_eq!(ClassBStaticData::read(&mut BitReader::new(w.as_slice())).unwrap(), msg);
    }

    #[test]
    fn test_short_part_a() {
        let msg = ClassBStaticData::part_a(338_123_456, "SEA BREEZE");
        let mut w = BitVector::new();
        msg.write(&mut w).unwrap();
        let bits = &w.as_slice()[..ClassBStaticData::PART_A_SHORT_BITS];
        let decoded = ClassBStaticData::read(&mut BitReader::new(bits)).unwrap();
        assert_eq!(decoded, msg);
    }
}

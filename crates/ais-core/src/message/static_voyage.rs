//! Static and voyage related data (message type 5), 424 bits.

use serde::{Deserialize, Serialize};

use super::fields::{self, Dimensions};
use crate::bits::{BitReader, BitVector};
use crate::types::{AisError, Result};

/// Estimated time of arrival; zero month/day, hour 24 and minute 60 mean "not available".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eta {
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl Default for Eta {
    fn default() -> Self {
        Self {
            month: 0,
            day: 0,
            hour: 24,
            minute: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticVoyageData {
    pub repeat_indicator: u8,
    pub mmsi: u32,
    pub ais_version: u8,
    pub imo_number: u32,
    /// Up to 7 characters
    pub call_sign: String,
    /// Up to 20 characters
    pub vessel_name: String,
    pub ship_type: u8,
    pub dimensions: Dimensions,
    pub epfd_type: u8,
    pub eta: Eta,
    /// Maximum present static draught in metres, 0.1 m resolution
    pub draught: f64,
    /// Up to 20 characters
    pub destination: String,
    /// Data terminal equipment not ready
    pub dte: bool,
}

impl StaticVoyageData {
    pub const BITS: usize = 424;

    pub fn new(mmsi: u32) -> Self {
        Self {
            repeat_indicator: 0,
            mmsi,
            ais_version: 0,
            imo_number: 0,
            call_sign: String::new(),
            vessel_name: String::new(),
            ship_type: 0,
            dimensions: Dimensions::default(),
            epfd_type: 0,
            eta: Eta::default(),
            draught: 0.0,
            destination: String::new(),
            dte: false,
        }
    }

    pub(crate) fn write(&self, w: &mut BitVector) -> Result<()> {
        w.append_uint(5, 6);
        w.append_uint_checked("repeat_indicator", self.repeat_indicator as u32, 2)?;
        w.append_uint_checked("mmsi", self.mmsi, 30)?;
        w.append_uint_checked("ais_version", self.ais_version as u32, 2)?;
        w.append_uint_checked("imo_number", self.imo_number, 30)?;
        w.append_text("call_sign", &self.call_sign, 7)?;
        w.append_text("vessel_name", &self.vessel_name, 20)?;
        w.append_uint(self.ship_type as u32, 8);
        self.dimensions.write(w)?;
        fields::write_epfd(w, self.epfd_type)?;
        w.append_uint_checked("eta_month", self.eta.month as u32, 4)?;
        w.append_uint_checked("eta_day", self.eta.day as u32, 5)?;
        w.append_uint_checked("eta_hour", self.eta.hour as u32, 5)?;
        w.append_uint_checked("eta_minute", self.eta.minute as u32, 6)?;

        let draught = (self.draught * 10.0).round();
        if !(0.0..=255.0).contains(&draught) {
            return Err(AisError::ValueOutOfRange {
                field: "draught",
                value: draught as i64,
                bits: 8,
            });
        }
        w.append_uint(draught as u32, 8);

        w.append_text("destination", &self.destination, 20)?;
        w.push(self.dte);
        w.append_uint(0, 1);
        Ok(())
    }

    pub(crate) fn read(r: &mut BitReader<'_>) -> Result<Self> {
        r.skip(6)?;
        let repeat_indicator = r.uint(2)? as u8;
        let mmsi = r.uint(30)?;
        let ais_version = r.uint(2)? as u8;
        let imo_number = r.uint(30)?;
        let call_sign = r.text(7)?;
        let vessel_name = r.text(20)?;
        let ship_type = r.uint(8)? as u8;
        let dimensions = Dimensions::read(r)?;
        let epfd_type = r.uint(4)? as u8;
        let eta = Eta {
            month: r.uint(4)? as u8,
            day: r.uint(5)? as u8,
            hour: r.uint(5)? as u8,
            minute: r.uint(6)? as u8,
        };
        let draught = r.uint(8)? as f64 / 10.0;
        let destination = r.text(20)?;
        let dte = r.flag()?;
        r.skip(1)?;

        Ok(Self {
            repeat_indicator,
            mmsi,
            ais_version,
            imo_number,
            call_sign,
            vessel_name,
            ship_type,
            dimensions,
            epfd_type,
            eta,
            draught,
            destination,
            dte,
        })
    }
}

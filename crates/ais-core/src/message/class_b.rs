//! Standard Class B position report (message type 18), 168 bits.

use serde::{Deserialize, Serialize};

use super::fields;
use crate::bits::{BitReader, BitVector};
use crate::types::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassBPositionReport {
    pub repeat_indicator: u8,
    pub mmsi: u32,
    /// Regional reserved bits following the MMSI
    pub regional_reserved: u8,
    pub speed_over_ground: Option<f64>,
    pub position_accuracy: bool,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub course_over_ground: Option<f64>,
    pub true_heading: Option<u16>,
    pub timestamp: u8,
    /// Carrier-sense (CS) unit rather than SOTDMA
    pub cs_unit: bool,
    pub display: bool,
    pub dsc: bool,
    /// Can use the whole marine band
    pub band: bool,
    /// Accepts channel management via message 22
    pub msg22: bool,
    pub assigned: bool,
    pub raim: bool,
    /// 20-bit communication state
    pub radio_status: u32,
}

impl ClassBPositionReport {
    pub const BITS: usize = 168;

    pub fn new(mmsi: u32) -> Self {
        Self {
            repeat_indicator: 0,
            mmsi,
            regional_reserved: 0,
            speed_over_ground: None,
            position_accuracy: false,
            longitude: None,
            latitude: None,
            course_over_ground: None,
            true_heading: None,
            timestamp: fields::TIMESTAMP_NOT_AVAILABLE,
            cs_unit: true,
            display: false,
            dsc: false,
            band: true,
            msg22: false,
            assigned: false,
            raim: false,
            radio_status: 0,
        }
    }

    pub(crate) fn write(&self, w: &mut BitVector) -> Result<()> {
        w.append_uint(18, 6);
        w.append_uint_checked("repeat_indicator", self.repeat_indicator as u32, 2)?;
        w.append_uint_checked("mmsi", self.mmsi, 30)?;
        w.append_uint(self.regional_reserved as u32, 8);
        fields::write_speed(w, self.speed_over_ground)?;
        w.push(self.position_accuracy);
        fields::write_position(w, self.longitude, self.latitude)?;
        fields::write_course(w, self.course_over_ground)?;
        fields::write_heading(w, self.true_heading)?;
        fields::write_timestamp(w, self.timestamp)?;
        w.append_uint(0, 2);
        w.push(self.cs_unit);
        w.push(self.display);
        w.push(self.dsc);
        w.push(self.band);
        w.push(self.msg22);
        w.push(self.assigned);
        w.push(self.raim);
        w.append_uint_checked("radio_status", self.radio_status, 20)
    }

    pub(crate) fn read(r: &mut BitReader<'_>) -> Result<Self> {
        r.skip(6)?;
        let repeat_indicator = r.uint(2)? as u8;
        let mmsi = r.uint(30)?;
        let regional_reserved = r.uint(8)? as u8;
        let speed_over_ground = fields::read_speed(r)?;
        let position_accuracy = r.flag()?;
        let (longitude, latitude) = fields::read_position(r)?;
        let course_over_ground = fields::read_course(r)?;
        let true_heading = fields::read_heading(r)?;
        let timestamp = r.uint(6)? as u8;
        r.skip(2)?;

        Ok(Self {
            repeat_indicator,
            mmsi,
            regional_reserved,
            speed_over_ground,
            position_accuracy,
            longitude,
            latitude,
            course_over_ground,
            true_heading,
            timestamp,
            cs_unit: r.flag()?,
            display: r.flag()?,
            dsc: r.flag()?,
            band: r.flag()?,
            msg22: r.flag()?,
            assigned: r.flag()?,
            raim: r.flag()?,
            radio_status: r.uint(20)?,
        })
    }
}

//! Base station report (message type 4), 168 bits.

use serde::{Deserialize, Serialize};

use super::fields;
use crate::bits::{BitReader, BitVector};
use crate::types::Result;

/// UTC time and position broadcast by a base station.
///
/// Zero year/month/day and hour 24, minute 60, second 60 mean "not available".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseStationReport {
    pub repeat_indicator: u8,
    pub mmsi: u32,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub position_accuracy: bool,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub epfd_type: u8,
    pub raim: bool,
    pub radio_status: u32,
}

impl BaseStationReport {
    pub const BITS: usize = 168;

    pub fn new(mmsi: u32) -> Self {
        Self {
            repeat_indicator: 0,
            mmsi,
            year: 0,
            month: 0,
            day: 0,
            hour: 24,
            minute: 60,
            second: 60,
            position_accuracy: false,
            longitude: None,
            latitude: None,
            epfd_type: 0,
            raim: false,
            radio_status: 0,
        }
    }

    pub(crate) fn write(&self, w: &mut BitVector) -> Result<()> {
        w.append_uint(4, 6);
        w.append_uint_checked("repeat_indicator", self.repeat_indicator as u32, 2)?;
        w.append_uint_checked("mmsi", self.mmsi, 30)?;
        w.append_uint_checked("year", self.year as u32, 14)?;
        w.append_uint_checked("month", self.month as u32, 4)?;
        w.append_uint_checked("day", self.day as u32, 5)?;
        w.append_uint_checked("hour", self.hour as u32, 5)?;
        w.append_uint_checked("minute", self.minute as u32, 6)?;
        w.append_uint_checked("second", self.second as u32, 6)?;
        w.push(self.position_accuracy);
        fields::write_position(w, self.longitude, self.latitude)?;
        fields::write_epfd(w, self.epfd_type)?;
        w.append_uint(0, 10);
        w.push(self.raim);
        w.append_uint_checked("radio_status", self.radio_status, 19)
    }

    pub(crate) fn read(r: &mut BitReader<'_>) -> Result<Self> {
        r.skip(6)?;
        let repeat_indicator = r.uint(2)? as u8;
        let mmsi = r.uint(30)?;
        let year = r.uint(14)? as u16;
        let month = r.uint(4)? as u8;
        let day = r.uint(5)? as u8;
        let hour = r.uint(5)? as u8;
        let minute = r.uint(6)? as u8;
        let second = r.uint(6)? as u8;
        let position_accuracy = r.flag()?;
        let (longitude, latitude) = fields::read_position(r)?;
        let epfd_type = r.uint(4)? as u8;
        r.skip(10)?;
        let raim = r.flag()?;
        let radio_status = r.uint(19)?;

        Ok(Self {
            repeat_indicator,
            mmsi,
            year,
            month,
            day,
            hour,
            minute,
            second,
            position_accuracy,
            longitude,
            latitude,
            epfd_type,
            raim,
            radio_status,
        })
    }
}

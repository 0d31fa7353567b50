//! Class A position report (message types 1, 2 and 3), 168 bits.

use serde::{Deserialize, Serialize};

use super::fields::{self, NavigationStatus};
use crate::bits::{BitReader, BitVector};
use crate::types::{AisError, Result};

/// Scheduled (1), assigned (2) or interrogated (3) Class A position report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    /// 1, 2 or 3
    pub message_type: u8,
    pub repeat_indicator: u8,
    pub mmsi: u32,
    pub nav_status: NavigationStatus,
    /// Raw ROT indicator; `None` when not available
    pub rate_of_turn: Option<i8>,
    /// Knots
    pub speed_over_ground: Option<f64>,
    pub position_accuracy: bool,
    /// Degrees east
    pub longitude: Option<f64>,
    /// Degrees north
    pub latitude: Option<f64>,
    /// Degrees true
    pub course_over_ground: Option<f64>,
    pub true_heading: Option<u16>,
    /// UTC second of the fix; 60..=63 are special values
    pub timestamp: u8,
    pub maneuver_indicator: u8,
    pub spare: u8,
    pub raim: bool,
    /// SOTDMA/ITDMA communication state, carried opaquely
    pub radio_status: u32,
}

impl PositionReport {
    pub const BITS: usize = 168;

    /// A type 1 report with every optional field marked "not available".
    pub fn new(mmsi: u32) -> Self {
        Self {
            message_type: 1,
            repeat_indicator: 0,
            mmsi,
            nav_status: NavigationStatus::NotDefined,
            rate_of_turn: None,
            speed_over_ground: None,
            position_accuracy: false,
            longitude: None,
            latitude: None,
            course_over_ground: None,
            true_heading: None,
            timestamp: fields::TIMESTAMP_NOT_AVAILABLE,
            maneuver_indicator: 0,
            spare: 0,
            raim: false,
            radio_status: 0,
        }
    }

    pub(crate) fn write(&self, w: &mut BitVector) -> Result<()> {
        if !(1..=3).contains(&self.message_type) {
            return Err(AisError::UnsupportedMessageType(self.message_type));
        }
        w.append_uint(self.message_type as u32, 6);
        w.append_uint_checked("repeat_indicator", self.repeat_indicator as u32, 2)?;
        w.append_uint_checked("mmsi", self.mmsi, 30)?;
        fields::write_nav_status(w, self.nav_status)?;
        fields::write_rate_of_turn(w, self.rate_of_turn)?;
        fields::write_speed(w, self.speed_over_ground)?;
        w.push(self.position_accuracy);
        fields::write_position(w, self.longitude, self.latitude)?;
        fields::write_course(w, self.course_over_ground)?;
        fields::write_heading(w, self.true_heading)?;
        fields::write_timestamp(w, self.timestamp)?;
        w.append_uint_checked("maneuver_indicator", self.maneuver_indicator as u32, 2)?;
        w.append_uint_checked("spare", self.spare as u32, 3)?;
        w.push(self.raim);
        w.append_uint_checked("radio_status", self.radio_status, 19)
    }

    pub(crate) fn read(r: &mut BitReader<'_>) -> Result<Self> {
        let message_type = r.uint(6)? as u8;
        let repeat_indicator = r.uint(2)? as u8;
        let mmsi = r.uint(30)?;
        let nav_status = NavigationStatus::from_raw(r.uint(4)? as u8);
        let rate_of_turn = fields::read_rate_of_turn(r)?;
        let speed_over_ground = fields::read_speed(r)?;
        let position_accuracy = r.flag()?;
        let (longitude, latitude) = fields::read_position(r)?;
        let course_over_ground = fields::read_course(r)?;
        let true_heading = fields::read_heading(r)?;
        let timestamp = r.uint(6)? as u8;
        let maneuver_indicator = r.uint(2)? as u8;
        let spare = r.uint(3)? as u8;
        let raim = r.flag()?;
        let radio_status = r.uint(19)?;

        Ok(Self {
            message_type,
            repeat_indicator,
            mmsi,
            nav_status,
            rate_of_turn,
            speed_over_ground,
            position_accuracy,
            longitude,
            latitude,
            course_over_ground,
            true_heading,
            timestamp,
            maneuver_indicator,
            spare,
            raim,
            radio_status,
        })
    }
}

//! Ship records from fleet JSON files.
//!
//! A fleet file is either a bare array of records or an object with a
//! `ships` array:
//!
//! ```json
//! [{"mmsi": 366982330, "lat": 37.8, "lon": -122.4, "course": 83.4,
//!   "speed": 12.3, "nav_status": 0, "turn": 0, "heading": 83}]
//! ```
//!
//! Only the fields needed to build messages are read; unknown keys are
//! ignored.

use crate::message::fields::{rot_from_degrees_per_minute, Dimensions, NavigationStatus};
use crate::message::{AisMessage, PositionReport, StaticVoyageData};
use crate::types::{AisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipRecord {
    pub mmsi: u32,
    /// Degrees, north positive
    pub lat: Option<f64>,
    /// Degrees, east positive
    pub lon: Option<f64>,
    /// Course over ground in degrees
    pub course: Option<f64>,
    /// Speed over ground in knots
    pub speed: Option<f64>,
    pub nav_status: u8,
    /// Rate of turn in degrees per minute
    pub turn: Option<f64>,
    pub heading: Option<u16>,
    pub accuracy: bool,
    pub name: Option<String>,
    pub call_sign: Option<String>,
    pub imo: Option<u32>,
    pub ship_type: Option<u8>,
    pub destination: Option<String>,
    pub dimensions: Option<Dimensions>,
    /// Draught in metres
    pub draught: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FleetFile {
    List(Vec<ShipRecord>),
    Wrapped { ships: Vec<ShipRecord> },
}

impl ShipRecord {
    pub fn new(mmsi: u32) -> Self {
        Self {
            mmsi,
            ..Default::default()
        }
    }

    /// Type 1 position report for the current state.
    pub fn to_position_report(&self) -> AisMessage {
        let mut report = PositionReport::new(self.mmsi);
        report.nav_status = NavigationStatus::from_raw(self.nav_status);
        report.rate_of_turn = self.turn.map(rot_from_degrees_per_minute);
        report.speed_over_ground = self.speed;
        report.position_accuracy = self.accuracy;
        report.longitude = self.lon;
        report.latitude = self.lat;
        report.course_over_ground = self.course;
        report.true_heading = self.heading;
        AisMessage::PositionReport(report)
    }

    /// Type 5 static and voyage data, when the record names the vessel.
    pub fn to_static_voyage(&self) -> Option<AisMessage> {
        if self.name.is_none() && self.call_sign.is_none() {
            return None;
        }
        let mut data = StaticVoyageData::new(self.mmsi);
        data.vessel_name = self.name.clone().unwrap_or_default();
        data.call_sign = self.call_sign.clone().unwrap_or_default();
        data.imo_number = self.imo.unwrap_or(0);
        data.ship_type = self.ship_type.unwrap_or(0);
        data.destination = self.destination.clone().unwrap_or_default();
        data.dimensions = self.dimensions.unwrap_or_default();
        data.draught = self.draught.unwrap_or(0.0);
        Some(AisMessage::StaticVoyageData(data))
    }
}

/// Parse fleet JSON.
pub fn parse_fleet(json: &str) -> Result<Vec<ShipRecord>> {
    let fleet: FleetFile =
        serde_json::from_str(json).map_err(|e| AisError::InvalidParameter(format!("fleet JSON: {}", e)))?;
    Ok(match fleet {
        FleetFile::List(ships) | FleetFile::Wrapped { ships } => ships,
    })
}

pub fn load_fleet(path: &Path) -> Result<Vec<ShipRecord>> {
    let json = std::fs::read_to_string(path).map_err(|e| AisError::Io(format!("{}: {}", path.display(), e)))?;
    let ships = parse_fleet(&json)?;
    tracing::debug!(path = %path.display(), ships = ships.len(), "fleet loaded");
    Ok(ships)
}

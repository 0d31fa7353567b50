//! Field quantization shared by the message codecs.
//!
//! Each helper converts between a physical value and the raw integer stored on
//! the wire, mapping the "not available" sentinels of ITU-R M.1371 to `None`.

use serde::{Deserialize, Serialize};

use crate::bits::{BitReader, BitVector};
use crate::types::{AisError, Result};

/// Position resolution: raw units per degree.
pub const POSITION_SCALE: f64 = 600_000.0;
/// Raw longitude meaning "not available" (181°).
pub const LONGITUDE_NOT_AVAILABLE: i32 = 108_600_000;
/// Raw latitude meaning "not available" (91°).
pub const LATITUDE_NOT_AVAILABLE: i32 = 54_600_000;
/// Raw speed meaning "not available".
pub const SPEED_NOT_AVAILABLE: u32 = 1023;
/// Highest raw speed; means 102.2 knots or more.
pub const SPEED_MAX: u32 = 1022;
/// Raw course meaning "not available".
pub const COURSE_NOT_AVAILABLE: u32 = 3600;
/// Raw heading meaning "not available".
pub const HEADING_NOT_AVAILABLE: u32 = 511;
/// Raw rate of turn meaning "not available".
pub const ROT_NOT_AVAILABLE: i32 = -128;
/// Time stamp meaning "not available".
pub const TIMESTAMP_NOT_AVAILABLE: u8 = 60;

fn out_of_range(field: &'static str, value: f64, bits: usize) -> AisError {
    AisError::ValueOutOfRange {
        field,
        value: value.round() as i64,
        bits,
    }
}

fn write_position_axis(
    w: &mut BitVector,
    field: &'static str,
    degrees: Option<f64>,
    sentinel: i32,
    bits: usize,
) -> Result<()> {
    let raw = match degrees {
        None => sentinel,
        Some(deg) => {
            let scaled = (deg * POSITION_SCALE).round();
            let limit = (1i64 << (bits - 1)) as f64;
            if !scaled.is_finite() || scaled < -limit || scaled >= limit {
                return Err(out_of_range(field, scaled, bits));
            }
            scaled as i32
        }
    };
    w.append_int_checked(field, raw, bits)
}

fn read_position_axis(r: &mut BitReader<'_>, sentinel: i32, bits: usize) -> Result<Option<f64>> {
    let raw = r.int(bits)?;
    Ok(if raw == sentinel {
        None
    } else {
        Some(raw as f64 / POSITION_SCALE)
    })
}

/// Write a 28-bit longitude followed by a 27-bit latitude.
pub fn write_position(w: &mut BitVector, longitude: Option<f64>, latitude: Option<f64>) -> Result<()> {
    write_position_axis(w, "longitude", longitude, LONGITUDE_NOT_AVAILABLE, 28)?;
    write_position_axis(w, "latitude", latitude, LATITUDE_NOT_AVAILABLE, 27)
}

pub fn read_position(r: &mut BitReader<'_>) -> Result<(Option<f64>, Option<f64>)> {
    let lon = read_position_axis(r, LONGITUDE_NOT_AVAILABLE, 28)?;
    let lat = read_position_axis(r, LATITUDE_NOT_AVAILABLE, 27)?;
    Ok((lon, lat))
}

/// Speed over ground in knots, 0.1 knot resolution.
pub fn write_speed(w: &mut BitVector, knots: Option<f64>) -> Result<()> {
    let raw = match knots {
        None => SPEED_NOT_AVAILABLE,
        Some(kn) => {
            let scaled = (kn * 10.0).round();
            if !(0.0..=SPEED_MAX as f64).contains(&scaled) {
                return Err(out_of_range("speed_over_ground", scaled, 10));
            }
            scaled as u32
        }
    };
    w.append_uint_checked("speed_over_ground", raw, 10)
}

pub fn read_speed(r: &mut BitReader<'_>) -> Result<Option<f64>> {
    let raw = r.uint(10)?;
    Ok(if raw == SPEED_NOT_AVAILABLE {
        None
    } else {
        Some(raw as f64 / 10.0)
    })
}

/// Course over ground in degrees, 0.1 degree resolution.
pub fn write_course(w: &mut BitVector, degrees: Option<f64>) -> Result<()> {
    let raw = match degrees {
        None => COURSE_NOT_AVAILABLE,
        Some(deg) => {
            let scaled = (deg * 10.0).round();
            if !(0.0..COURSE_NOT_AVAILABLE as f64).contains(&scaled) {
                return Err(out_of_range("course_over_ground", scaled, 12));
            }
            scaled as u32
        }
    };
    w.append_uint_checked("course_over_ground", raw, 12)
}

pub fn read_course(r: &mut BitReader<'_>) -> Result<Option<f64>> {
    let raw = r.uint(12)?;
    Ok(if raw == COURSE_NOT_AVAILABLE {
        None
    } else {
        Some(raw as f64 / 10.0)
    })
}

/// True heading in whole degrees.
pub fn write_heading(w: &mut BitVector, heading: Option<u16>) -> Result<()> {
    let raw = match heading {
        None => HEADING_NOT_AVAILABLE,
        Some(h) if h < 360 => h as u32,
        Some(h) => return Err(out_of_range("true_heading", h as f64, 9)),
    };
    w.append_uint(raw, 9);
    Ok(())
}

/// Wire values 360 through 510 are invalid and read as not available.
pub fn read_heading(r: &mut BitReader<'_>) -> Result<Option<u16>> {
    let raw = r.uint(9)?;
    Ok(if raw >= 360 {
        None
    } else {
        Some(raw as u16)
    })
}

/// Rate of turn indicator as carried on the wire (`None` = -128).
pub fn write_rate_of_turn(w: &mut BitVector, rot: Option<i8>) -> Result<()> {
    match rot {
        None => w.append_int(ROT_NOT_AVAILABLE, 8),
        Some(-128) => return Err(out_of_range("rate_of_turn", -128.0, 8)),
        Some(v) => w.append_int(v as i32, 8),
    }
    Ok(())
}

pub fn read_rate_of_turn(r: &mut BitReader<'_>) -> Result<Option<i8>> {
    let raw = r.int(8)?;
    Ok(if raw == ROT_NOT_AVAILABLE {
        None
    } else {
        Some(raw as i8)
    })
}

/// Convert a turn rate in degrees per minute to the AIS ROT indicator.
///
/// `ROT = 4.733 * sqrt(|rate|)` with the sign of the rate, limited to ±126.
/// Rates beyond ±708 °/min saturate at ±126.
pub fn rot_from_degrees_per_minute(rate: f64) -> i8 {
    let magnitude = (4.733 * rate.abs().sqrt()).round().min(126.0);
    if rate < 0.0 {
        -(magnitude as i8)
    } else {
        magnitude as i8
    }
}

/// Convert an AIS ROT indicator back to degrees per minute.
///
/// Returns `None` for the ±127 "turning, no turn indicator" codes.
pub fn rot_to_degrees_per_minute(rot: i8) -> Option<f64> {
    if rot.unsigned_abs() >= 127 {
        return None;
    }
    let rate = (rot as f64 / 4.733).powi(2);
    Some(if rot < 0 { -rate } else { rate })
}

/// Navigational status (types 1, 2 and 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationStatus {
    UnderWayUsingEngine,
    AtAnchor,
    NotUnderCommand,
    RestrictedManoeuvrability,
    ConstrainedByDraught,
    Moored,
    Aground,
    EngagedInFishing,
    UnderWaySailing,
    /// Codes 9 through 13, reserved for future amendment
    Reserved(u8),
    AisSartActive,
    NotDefined,
}

impl Default for NavigationStatus {
    fn default() -> Self {
        NavigationStatus::NotDefined
    }
}

impl NavigationStatus {
    /// Map a 4-bit code; values above 15 are masked.
    pub fn from_raw(code: u8) -> Self {
        match code & 0x0f {
            0 => Self::UnderWayUsingEngine,
            1 => Self::AtAnchor,
            2 => Self::NotUnderCommand,
            3 => Self::RestrictedManoeuvrability,
            4 => Self::ConstrainedByDraught,
            5 => Self::Moored,
            6 => Self::Aground,
            7 => Self::EngagedInFishing,
            8 => Self::UnderWaySailing,
            14 => Self::AisSartActive,
            15 => Self::NotDefined,
            other => Self::Reserved(other),
        }
    }

    pub fn to_raw(self) -> u8 {
        match self {
            Self::UnderWayUsingEngine => 0,
            Self::AtAnchor => 1,
            Self::NotUnderCommand => 2,
            Self::RestrictedManoeuvrability => 3,
            Self::ConstrainedByDraught => 4,
            Self::Moored => 5,
            Self::Aground => 6,
            Self::EngagedInFishing => 7,
            Self::UnderWaySailing => 8,
            Self::Reserved(code) => code & 0x0f,
            Self::AisSartActive => 14,
            Self::NotDefined => 15,
        }
    }
}

/// Navigational status as its 4-bit code.
///
/// `Reserved` must hold one of the reserved codes 9 through 13.
pub fn write_nav_status(w: &mut BitVector, status: NavigationStatus) -> Result<()> {
    if let NavigationStatus::Reserved(code) = status {
        if !(9..=13).contains(&code) {
            return Err(out_of_range("nav_status", code as f64, 4));
        }
    }
    w.append_uint(status.to_raw() as u32, 4);
    Ok(())
}

/// Reference-point dimensions in metres (bow/stern 9 bits, port/starboard 6 bits).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub to_bow: u16,
    pub to_stern: u16,
    pub to_port: u8,
    pub to_starboard: u8,
}

impl Dimensions {
    pub fn write(&self, w: &mut BitVector) -> Result<()> {
        w.append_uint_checked("to_bow", self.to_bow as u32, 9)?;
        w.append_uint_checked("to_stern", self.to_stern as u32, 9)?;
        w.append_uint_checked("to_port", self.to_port as u32, 6)?;
        w.append_uint_checked("to_starboard", self.to_starboard as u32, 6)
    }

    pub fn read(r: &mut BitReader<'_>) -> Result<Self> {
        Ok(Self {
            to_bow: r.uint(9)? as u16,
            to_stern: r.uint(9)? as u16,
            to_port: r.uint(6)? as u8,
            to_starboard: r.uint(6)? as u8,
        })
    }

    /// Overall length in metres.
    pub fn length(&self) -> u16 {
        self.to_bow + self.to_stern
    }

    /// Overall beam in metres.
    pub fn beam(&self) -> u16 {
        self.to_port as u16 + self.to_starboard as u16
    }
}

/// Write a 4-bit EPFD (position fixing device) type.
pub fn write_epfd(w: &mut BitVector, epfd: u8) -> Result<()> {
    w.append_uint_checked("epfd_type", epfd as u32, 4)
}

/// Write a 6-bit UTC second time stamp (60..=63 carry special meanings).
pub fn write_timestamp(w: &mut BitVector, timestamp: u8) -> Result<()> {
    w.append_uint_checked("timestamp", timestamp as u32, 6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn round_trip_position(lon: Option<f64>, lat: Option<f64>) -> (Option<f64>, Option<f64>) {
        let mut w = BitVector::new();
        write_position(&mut w, lon, lat).unwrap();
        assert_eq!(w.len(), 55);
        read_position(&mut BitReader::new(w.as_slice())).unwrap()
    }

    #[test]
    fn test_position_boundaries_round_trip() {
        for lon in [-9.25, 170.0, -180.0, 180.0, 0.0, -122.4194] {
            let (back, _) = round_trip_position(Some(lon), Some(10.5));
            assert_eq!(back, Some(lon), "longitude {}", lon);
        }
        for lat in [-90.0, 90.0, 37.7749, -0.000002] {
            let (_, back) = round_trip_position(Some(1.0), Some(lat));
            assert_abs_diff_eq!(back.unwrap(), lat, epsilon = 1.0 / POSITION_SCALE);
        }
    }

    #[test]
    fn test_negative_longitude_raw_bits() {
        let mut w = BitVector::new();
        write_position(&mut w, Some(-180.0), Some(0.0)).unwrap();
        // -108_000_000 in 28-bit two's complement
        let raw = w.as_slice()[..28].iter().fold(0u32, |acc, &b| (acc << 1) | b as u32);
        assert_eq!(raw, (1u32 << 28) - 108_000_000);
    }

    #[test]
    fn test_position_not_available() {
        assert_eq!(round_trip_position(None, None), (None, None));
        assert_eq!(round_trip_position(Some(181.0), Some(91.0)), (None, None));
    }

    #[test]
    fn test_position_out_of_width() {
        let mut w = BitVector::new();
        assert!(write_position(&mut w, Some(250.0), Some(0.0)).is_err());
        assert!(write_position(&mut w, Some(0.0), Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_speed_course_heading() {
        let mut w = BitVector::new();
        write_speed(&mut w, Some(12.3)).unwrap();
        write_course(&mut w, Some(359.9)).unwrap();
        write_heading(&mut w, Some(0)).unwrap();
        write_speed(&mut w, None).unwrap();
        write_course(&mut w, None).unwrap();
        write_heading(&mut w, None).unwrap();

        let mut r = BitReader::new(w.as_slice());
        assert_eq!(read_speed(&mut r).unwrap(), Some(12.3));
        assert_eq!(read_course(&mut r).unwrap(), Some(359.9));
        assert_eq!(read_heading(&mut r).unwrap(), Some(0));
        assert_eq!(read_speed(&mut r).unwrap(), None);
        assert_eq!(read_course(&mut r).unwrap(), None);
        assert_eq!(read_heading(&mut r).unwrap(), None);

        assert!(write_speed(&mut w, Some(102.3)).is_err());
        assert!(write_speed(&mut w, Some(-0.5)).is_err());
        assert!(write_course(&mut w, Some(360.0)).is_err());
        assert!(write_heading(&mut w, Some(360)).is_err());
    }

    #[test]
    fn test_invalid_heading_reads_as_unavailable() {
        let mut w = BitVector::new();
        w.append_uint(400, 9);
        w.append_uint(359, 9);
        let mut r = BitReader::new(w.as_slice());
        let heading = read_heading(&mut r).unwrap();
        assert_eq!(heading, None);
        assert_eq!(read_heading(&mut r).unwrap(), Some(359));

        let mut out = BitVector::new();
        write_heading(&mut out, heading).unwrap();
        assert_eq!(out.as_slice()[..9].iter().fold(0u32, |acc, &b| (acc << 1) | b as u32), 511);
    }

    #[test]
    fn test_rate_of_turn_conversion() {
        assert_eq!(rot_from_degrees_per_minute(0.0), 0);
        assert_eq!(rot_from_degrees_per_minute(10.0), 15);
        assert_eq!(rot_from_degrees_per_minute(-10.0), -15);
        assert_eq!(rot_from_degrees_per_minute(5000.0), 126);
        assert_abs_diff_eq!(rot_to_degrees_per_minute(15).unwrap(), 10.04, epsilon = 0.01);
        assert_eq!(rot_to_degrees_per_minute(127), None);
        assert_eq!(rot_to_degrees_per_minute(-127), None);
    }

    #[test]
    fn test_rate_of_turn_wire() {
        let mut w = BitVector::new();
        write_rate_of_turn(&mut w, None).unwrap();
        write_rate_of_turn(&mut w, Some(-127)).unwrap();
        let mut r = BitReader::new(w.as_slice());
        assert_eq!(read_rate_of_turn(&mut r).unwrap(), None);
        assert_eq!(read_rate_of_turn(&mut r).unwrap(), Some(-127));
        assert!(write_rate_of_turn(&mut w, Some(-128)).is_err());
    }

    #[test]
    fn test_navigation_status_codes() {
        for code in 0..16u8 {
            assert_eq!(NavigationStatus::from_raw(code).to_raw(), code);
        }
        assert_eq!(NavigationStatus::from_raw(5), NavigationStatus::Moored);
        assert_eq!(NavigationStatus::from_raw(11), NavigationStatus::Reserved(11));
    }

    #[test]
    fn test_nav_status_write_rejects_assigned_codes_as_reserved() {
        let mut w = BitVector::new();
        write_nav_status(&mut w, NavigationStatus::Reserved(12)).unwrap();
        write_nav_status(&mut w, NavigationStatus::Moored).unwrap();
        let mut r = BitReader::new(w.as_slice());
        assert_eq!(NavigationStatus::from_raw(r.uint(4).unwrap() as u8), NavigationStatus::Reserved(12));
        assert_eq!(NavigationStatus::from_raw(r.uint(4).unwrap() as u8), NavigationStatus::Moored);

        for code in [5, 14, 20] {
            assert!(matches!(
                write_nav_status(&mut w, NavigationStatus::Reserved(code)),
                Err(AisError::ValueOutOfRange { field: "nav_status", .. })
            ));
        }
    }

    #[test]
    fn test_dimensions() {
        let dims = Dimensions {
            to_bow: 90,
            to_stern: 90,
            to_port: 10,
            to_starboard: 10,
        };
        let mut w = BitVector::new();
        dims.write(&mut w).unwrap();
        assert_eq!(w.len(), 30);
        assert_eq!(Dimensions::read(&mut BitReader::new(w.as_slice())).unwrap(), dims);
        assert_eq!(dims.length(), 180);
        assert_eq!(dims.beam(), 20);

        let too_wide = Dimensions {
            to_port: 64,
            ..dims
        };
        assert!(too_wide.write(&mut w).is_err());
    }
}

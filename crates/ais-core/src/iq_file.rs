//! Raw IQ sample files.
//!
//! Interleaved I/Q pairs, little endian, no header. The sample rate is not
//! stored and must be supplied on load.
//!
//! | Format | Bytes/sample | Scaling                  |
//! |--------|--------------|--------------------------|
//! | `cf32` | 8            | as is                    |
//! | `ci16` | 4            | ±32767 full scale        |
//! | `cu8`  | 2            | 127.5 offset (RTL-SDR)   |

use crate::types::{AisError, IqSample, IqSignal, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IqFormat {
    #[default]
    Cf32,
    Ci16,
    Cu8,
}

impl IqFormat {
    pub const fn bytes_per_sample(&self) -> usize {
        match self {
            IqFormat::Cf32 => 8,
            IqFormat::Ci16 => 4,
            IqFormat::Cu8 => 2,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            IqFormat::Cf32 => "cf32",
            IqFormat::Ci16 => "ci16",
            IqFormat::Cu8 => "cu8",
        }
    }

    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }

    fn write_one<W: Write>(&self, w: &mut W, s: IqSample) -> io::Result<()> {
        match self {
            IqFormat::Cf32 => {
                w.write_f32::<LittleEndian>(s.re)?;
                w.write_f32::<LittleEndian>(s.im)
            }
            IqFormat::Ci16 => {
                w.write_i16::<LittleEndian>(to_i16(s.re))?;
                w.write_i16::<LittleEndian>(to_i16(s.im))
            }
            IqFormat::Cu8 => {
                w.write_u8(to_u8(s.re))?;
                w.write_u8(to_u8(s.im))
            }
        }
    }

    fn read_one<R: Read>(&self, r: &mut R) -> io::Result<IqSample> {
        Ok(match self {
            IqFormat::Cf32 => {
                let re = r.read_f32::<LittleEndian>()?;
                IqSample::new(re, r.read_f32::<LittleEndian>()?)
            }
            IqFormat::Ci16 => {
                let re = r.read_i16::<LittleEndian>()? as f32 / 32768.0;
                IqSample::new(re, r.read_i16::<LittleEndian>()? as f32 / 32768.0)
            }
            IqFormat::Cu8 => {
                let re = (r.read_u8()? as f32 - 127.5) / 127.5;
                IqSample::new(re, (r.read_u8()? as f32 - 127.5) / 127.5)
            }
        })
    }
}

impl std::str::FromStr for IqFormat {
    type Err = AisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cf32" | "cf32_le" | "fc32" | "raw" => Ok(IqFormat::Cf32),
            "ci16" | "ci16_le" | "sc16" => Ok(IqFormat::Ci16),
            "cu8" | "rtlsdr" => Ok(IqFormat::Cu8),
            other => Err(AisError::InvalidParameter(format!("unknown IQ format '{}'", other))),
        }
    }
}

impl std::fmt::Display for IqFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn to_i16(v: f32) -> i16 {
    (v * 32767.0).round().clamp(-32768.0, 32767.0) as i16
}

fn to_u8(v: f32) -> u8 {
    ((v + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8
}

fn io_err(e: io::Error) -> AisError {
    AisError::Io(e.to_string())
}

/// Write samples, returning the byte count.
pub fn write_samples<W: Write>(writer: &mut W, samples: &[IqSample], format: IqFormat) -> Result<usize> {
    for &s in samples {
        format.write_one(writer, s).map_err(io_err)?;
    }
    Ok(samples.len() * format.bytes_per_sample())
}

/// Read samples until end of input. A trailing partial sample is an error.
pub fn read_samples<R: Read>(reader: &mut R, format: IqFormat) -> Result<Vec<IqSample>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(io_err)?;
    let width = format.bytes_per_sample();
    if bytes.len() % width != 0 {
        return Err(AisError::Io(format!(
            "{} trailing bytes do not form a {} sample",
            bytes.len() % width,
            format
        )));
    }

    let mut cursor = bytes.as_slice();
    let mut samples = Vec::with_capacity(bytes.len() / width);
    while !cursor.is_empty() {
        samples.push(format.read_one(&mut cursor).map_err(io_err)?);
    }
    Ok(samples)
}

pub fn save(path: &Path, signal: &IqSignal, format: IqFormat) -> Result<()> {
    let file = File::create(path).map_err(|e| AisError::Io(format!("{}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    let bytes = write_samples(&mut writer, &signal.samples, format)?;
    writer.flush().map_err(io_err)?;
    tracing::debug!(path = %path.display(), %format, bytes, "IQ file written");
    Ok(())
}

pub fn load(path: &Path, format: IqFormat, sample_rate: f64) -> Result<IqSignal> {
    let file = File::open(path).map_err(|e| AisError::Io(format!("{}: {}", path.display(), e)))?;
    let samples = read_samples(&mut BufReader::new(file), format)?;
    tracing::debug!(path = %path.display(), %format, samples = samples.len(), "IQ file read");
    Ok(IqSignal::new(samples, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tone(n: usize) -> Vec<IqSample> {
        (0..n)
            .map(|i| {
                let phase = i as f32 * 0.3;
                IqSample::new(0.8 * phase.cos(), 0.8 * phase.sin())
            })
            .collect()
    }

    #[test]
    fn test_format_names() {
        assert_eq!("CF32".parse::<IqFormat>().unwrap(), IqFormat::Cf32);
        assert_eq!("rtlsdr".parse::<IqFormat>().unwrap(), IqFormat::Cu8);
        assert!("cf64".parse::<IqFormat>().is_err());
        assert_eq!(IqFormat::from_path(Path::new("capture.ci16")), Some(IqFormat::Ci16));
        assert_eq!(IqFormat::from_path(Path::new("capture")), None);
    }

    #[test]
    fn test_quantisation_error() {
        let samples = tone(64);
        for (format, tol) in [(IqFormat::Cf32, 0.0), (IqFormat::Ci16, 1e-4), (IqFormat::Cu8, 1e-2)] {
            let mut buf = Vec::new();
            let n = write_samples(&mut buf, &samples, format).unwrap();
            assert_eq!(n, buf.len());
            assert_eq!(buf.len(), 64 * format.bytes_per_sample());

            let back = read_samples(&mut buf.as_slice(), format).unwrap();
            assert_eq!(back.len(), samples.len());
            for (a, b) in samples.iter().zip(&back) {
                assert_abs_diff_eq!(a.re, b.re, epsilon = tol);
                assert_abs_diff_eq!(a.im, b.im, epsilon = tol);
            }
        }
    }

    #[test]
    fn test_ci16_layout() {
        let mut buf = Vec::new();
        write_samples(&mut buf, &[IqSample::new(1.0, -1.0)], IqFormat::Ci16).unwrap();
        assert_eq!(buf, vec![0xff, 0x7f, 0x01, 0x80]);
    }

    #[test]
    fn test_partial_sample_rejected() {
        let bytes = [0u8; 7];
        assert!(matches!(read_samples(&mut &bytes[..], IqFormat::Cf32), Err(AisError::Io(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("burst.cf32");
        let signal = IqSignal::new(tone(500), 48_000.0);

        save(&path, &signal, IqFormat::Cf32).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 4000);

        let loaded = load(&path, IqFormat::Cf32, 48_000.0).unwrap();
        assert_eq!(loaded.samples, signal.samples);
        assert!(load(&dir.path().join("missing.cf32"), IqFormat::Cf32, 48_000.0).is_err());
    }
}

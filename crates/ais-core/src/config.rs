//! # Configuration
//!
//! YAML configuration for the modem: sample rate and modulation, receiver
//! thresholds, NMEA output and logging.
//!
//! ## Search Path
//!
//! [`AisConfig::load`] reads the first file found:
//! 1. the path in the `AIS_CONFIG` environment variable
//! 2. `./ais.yaml`
//! 3. `~/.config/ais/config.yaml` (platform config dir)
//! 4. `/etc/ais/config.yaml`
//!
//! and falls back to defaults when none exists.
//!
//! ## Example
//!
//! ```yaml
//! modem:
//!   sample_rate: 48000
//!   modulation: gmsk
//!   bt_product: 0.4
//!
//! receiver:
//!   min_correlation: 0.55
//!   frequency_corrections_hz: [0, 250, -250]
//!
//! nmea:
//!   channel: B
//! ```

use crate::clock_recovery::{
    ClockRecovery, DEFAULT_ADAPTIVE_WINDOW, DEFAULT_FREQUENCY_CORRECTIONS_HZ, DEFAULT_MIN_CORRELATION,
};
use crate::frame_sync::{FrameSync, DEFAULT_MAX_ERRORS, DEFAULT_SEARCH_WINDOW};
use crate::logging::LogConfig;
use crate::modulator::{
    FskModulator, GmskModulator, Modulation, Modulator, DEFAULT_AMPLITUDE, DEFAULT_BT,
    DEFAULT_FSK_DEVIATION_HZ, DEFAULT_RAMP_S, DEFAULT_SPAN_SYMBOLS,
};
use crate::nmea::DEFAULT_MAX_PAYLOAD_CHARS;
use crate::quadrature_demod::{FmDiscriminator, DEFAULT_ACTIVITY_THRESHOLD_HZ};
use crate::receiver::{Receiver, DEFAULT_FLAG_SEARCH_WINDOW};
use crate::transmitter::Transmitter;
use crate::types::{SYMBOL_RATE, TRAINING_SEQUENCE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "AIS_CONFIG";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("config not found: {0}")]
    NotFound(String),
    #[error("failed to read config: {0}")]
    ReadError(String),
    #[error("failed to parse config: {0}")]
    ParseError(String),
    #[error("invalid config: {0}")]
    ValidationError(String),
}

/// Transmit-side modem settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    /// Sample rate in Hz
    pub sample_rate: f64,
    pub modulation: Modulation,
    /// Gaussian filter BT product
    pub bt_product: f64,
    /// Gaussian filter length in symbols
    pub filter_span_symbols: usize,
    /// 2-FSK tone offset in Hz
    pub fsk_deviation_hz: f64,
    pub amplitude: f64,
    /// Raised-cosine ramp at each end of a burst, in seconds
    pub ramp_duration_s: f64,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            sample_rate: 96_000.0,
            modulation: Modulation::Gmsk,
            bt_product: DEFAULT_BT,
            filter_span_symbols: DEFAULT_SPAN_SYMBOLS,
            fsk_deviation_hz: DEFAULT_FSK_DEVIATION_HZ,
            amplitude: DEFAULT_AMPLITUDE,
            ramp_duration_s: DEFAULT_RAMP_S,
        }
    }
}

/// Receive pipeline thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Minimum frequency spread counted as a signal
    pub activity_threshold_hz: f64,
    /// Moving-average length; derived from samples per symbol when unset
    pub smoothing_taps: Option<usize>,
    /// Minimum |correlation| against the training template
    pub min_correlation: f64,
    /// Residual carrier offsets tried during preamble search
    pub frequency_corrections_hz: Vec<f64>,
    /// Symbols per adaptive slicing window
    pub adaptive_window_symbols: usize,
    /// Bit positions searched for the training sequence
    pub sync_search_window: usize,
    pub max_training_errors: usize,
    /// Bits after the training searched for the start flag
    pub flag_search_window: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            activity_threshold_hz: DEFAULT_ACTIVITY_THRESHOLD_HZ,
            smoothing_taps: None,
            min_correlation: DEFAULT_MIN_CORRELATION,
            frequency_corrections_hz: DEFAULT_FREQUENCY_CORRECTIONS_HZ.to_vec(),
            adaptive_window_symbols: DEFAULT_ADAPTIVE_WINDOW,
            sync_search_window: DEFAULT_SEARCH_WINDOW,
            max_training_errors: DEFAULT_MAX_ERRORS,
            flag_search_window: DEFAULT_FLAG_SEARCH_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NmeaConfig {
    /// VHF channel letter, `A` or `B`
    pub channel: char,
    /// Payload characters per sentence before fragmenting
    pub max_payload_chars: usize,
}

impl Default for NmeaConfig {
    fn default() -> Self {
        Self {
            channel: 'A',
            max_payload_chars: DEFAULT_MAX_PAYLOAD_CHARS,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AisConfig {
    pub modem: ModemConfig,
    pub receiver: ReceiverConfig,
    pub nmea: NmeaConfig,
    pub logging: LogConfig,
}

impl AisConfig {
    /// Load from the first config file on the search path, or defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(format!("{} = {}", CONFIG_ENV, path.display())));
            }
            return Self::load_from(&path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config");
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse and validate a YAML document.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Search path after the environment variable.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./ais.yaml")];
        if let Some(dirs) = directories::ProjectDirs::from("", "", "ais") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }
        paths.push(PathBuf::from("/etc/ais/config.yaml"));
        paths
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::ValidationError(msg));
        let modem = &self.modem;
        let rx = &self.receiver;

        if !modem.sample_rate.is_finite() || modem.sample_rate < 2.0 * SYMBOL_RATE {
            return invalid(format!(
                "sample_rate must give at least 2 samples per symbol (>= {} Hz)",
                2.0 * SYMBOL_RATE
            ));
        }
        if !(modem.bt_product > 0.0) {
            return invalid("bt_product must be positive".into());
        }
        if modem.filter_span_symbols == 0 {
            return invalid("filter_span_symbols must be >= 1".into());
        }
        if !(modem.fsk_deviation_hz > 0.0 && modem.fsk_deviation_hz < modem.sample_rate / 2.0) {
            return invalid("fsk_deviation_hz must lie between 0 and half the sample rate".into());
        }
        if !(modem.amplitude > 0.0 && modem.amplitude <= 1.0) {
            return invalid("amplitude must be in (0, 1]".into());
        }
        if !(modem.ramp_duration_s >= 0.0) {
            return invalid("ramp_duration_s must not be negative".into());
        }

        if !(rx.min_correlation > 0.0 && rx.min_correlation <= 1.0) {
            return invalid("min_correlation must be in (0, 1]".into());
        }
        if !(rx.activity_threshold_hz >= 0.0) {
            return invalid("activity_threshold_hz must not be negative".into());
        }
        if rx.smoothing_taps == Some(0) {
            return invalid("smoothing_taps must be >= 1".into());
        }
        if rx.frequency_corrections_hz.iter().any(|f| !f.is_finite()) {
            return invalid("frequency_corrections_hz must be finite".into());
        }
        if rx.adaptive_window_symbols == 0 {
            return invalid("adaptive_window_symbols must be >= 1".into());
        }
        if rx.max_training_errors >= TRAINING_SEQUENCE.len() {
            return invalid(format!("max_training_errors must be < {}", TRAINING_SEQUENCE.len()));
        }

        if !matches!(self.nmea.channel, 'A' | 'B') {
            return invalid(format!("channel must be A or B, got {:?}", self.nmea.channel));
        }
        if self.nmea.max_payload_chars == 0 {
            return invalid("max_payload_chars must be >= 1".into());
        }
        Ok(())
    }

    pub fn samples_per_symbol(&self) -> f64 {
        self.modem.sample_rate / SYMBOL_RATE
    }

    /// Modulator for the `modem` section.
    pub fn modulator(&self) -> Result<Modulator, ConfigError> {
        self.validate()?;
        let m = &self.modem;
        let modulator = match m.modulation {
            Modulation::Gmsk => GmskModulator::with_params(m.sample_rate, m.bt_product, m.filter_span_symbols)
                .map(|g| Modulator::Gmsk(g.with_amplitude(m.amplitude).with_ramp(m.ramp_duration_s))),
            Modulation::Fsk => FskModulator::with_deviation(m.sample_rate, m.fsk_deviation_hz)
                .map(|f| Modulator::Fsk(f.with_amplitude(m.amplitude).with_ramp(m.ramp_duration_s))),
        };
        modulator.map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Receiver at the modem sample rate.
    pub fn receiver(&self) -> Result<Receiver, ConfigError> {
        self.validate()?;
        let rx = &self.receiver;
        let fs = self.modem.sample_rate;

        let mut discriminator = FmDiscriminator::new(fs).with_activity_threshold(rx.activity_threshold_hz);
        if let Some(taps) = rx.smoothing_taps {
            discriminator = discriminator.with_taps(taps);
        }
        let clock = ClockRecovery::new(self.samples_per_symbol())
            .with_min_correlation(rx.min_correlation)
            .with_frequency_corrections(rx.frequency_corrections_hz.clone())
            .with_adaptive_window(rx.adaptive_window_symbols);

        let receiver = Receiver::new(fs).map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(receiver
            .with_discriminator(discriminator)
            .with_clock_recovery(clock)
            .with_frame_sync(FrameSync::new(rx.sync_search_window, rx.max_training_errors))
            .with_flag_search_window(rx.flag_search_window)
            .with_channel(self.nmea.channel)
            .with_max_payload_chars(self.nmea.max_payload_chars))
    }

    pub fn transmitter(&self) -> Result<Transmitter, ConfigError> {
        Ok(Transmitter::new(self.modulator()?)
            .with_channel(self.nmea.channel)
            .with_max_payload_chars(self.nmea.max_payload_chars))
    }

    /// Annotated defaults for a starting config file.
    pub fn example_yaml() -> String {
        let body = serde_yaml::to_string(&Self::default()).unwrap_or_default();
        format!("# AIS modem configuration\n# Search order: $AIS_CONFIG, ./ais.yaml, ~/.config/ais/config.yaml, /etc/ais/config.yaml\n{}", body)
    }
}

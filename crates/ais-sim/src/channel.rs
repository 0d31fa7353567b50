//! Channel Models for the AIS Link
//!
//! Impairments applied between transmitter and receiver:
//!
//! 1. **Silence padding**: the burst sits inside a longer capture window
//! 2. **Frequency offset**: TX/RX oscillator mismatch, up to a few hundred Hz at VHF
//! 3. **AWGN**: thermal noise, scaled against the burst power
//!
//! Noise covers the whole window, so the padding is noise only. With a seed
//! the output is reproducible.
//!
//! ## Usage
//!
//! ```rust
//! use ais_sim::channel::{Channel, ChannelConfig};
//! use ais_core::types::IqSample;
//!
//! let burst = vec![IqSample::new(0.9, 0.0); 1000];
//! let config = ChannelConfig::with_cfo(25.0, 300.0, 48_000.0).seeded(7);
//! let noisy = Channel::new(config).apply(&burst);
//! assert_eq!(noisy.len(), 1000);
//! ```

use ais_core::types::{IqSample, IqSignal};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelModel {
    /// Padding only, no impairments
    Ideal,
    #[default]
    Awgn,
    /// Carrier offset, then AWGN
    AwgnWithCfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub model: ChannelModel,
    /// SNR against the mean burst power, in dB
    pub snr_db: f64,
    /// Carrier frequency offset in Hz
    pub cfo_hz: f64,
    pub sample_rate: f64,
    /// Noise-only lead-in before the burst, in seconds
    pub leading_silence_s: f64,
    pub trailing_silence_s: f64,
    /// RNG seed; entropy when unset
    pub seed: Option<u64>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            model: ChannelModel::Awgn,
            snr_db: 25.0,
            cfo_hz: 0.0,
            sample_rate: 96_000.0,
            leading_silence_s: 0.0,
            trailing_silence_s: 0.0,
            seed: None,
        }
    }
}

impl ChannelConfig {
    pub fn ideal(sample_rate: f64) -> Self {
        Self {
            model: ChannelModel::Ideal,
            sample_rate,
            ..Default::default()
        }
    }

    pub fn with_snr(snr_db: f64, sample_rate: f64) -> Self {
        Self {
            snr_db,
            sample_rate,
            ..Default::default()
        }
    }

    pub fn with_cfo(snr_db: f64, cfo_hz: f64, sample_rate: f64) -> Self {
        Self {
            model: ChannelModel::AwgnWithCfo,
            snr_db,
            cfo_hz,
            sample_rate,
            ..Default::default()
        }
    }

    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_silence(mut self, leading_s: f64, trailing_s: f64) -> Self {
        self.leading_silence_s = leading_s;
        self.trailing_silence_s = trailing_s;
        self
    }

    /// Samples of lead-in before the burst.
    pub fn leading_samples(&self) -> usize {
        seconds_to_samples(self.leading_silence_s, self.sample_rate)
    }

    pub fn trailing_samples(&self) -> usize {
        seconds_to_samples(self.trailing_silence_s, self.sample_rate)
    }
}

fn seconds_to_samples(seconds: f64, sample_rate: f64) -> usize {
    if seconds > 0.0 && sample_rate > 0.0 {
        (seconds * sample_rate).round() as usize
    } else {
        0
    }
}

/// Mean power per complex sample.
pub fn mean_power(samples: &[IqSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.norm_sqr() as f64).sum::<f64>() / samples.len() as f64
}

/// Channel simulator
#[derive(Debug)]
pub struct Channel {
    config: ChannelConfig,
    rng: StdRng,
    /// Carrier offset phase, carried across calls
    cfo_phase: f64,
}

impl Channel {
    pub fn new(config: ChannelConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            cfo_phase: 0.0,
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        self.cfo_phase = 0.0;
        if let Some(seed) = self.config.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
    }

    /// Pad the burst with silence and apply the channel model.
    pub fn apply(&mut self, burst: &[IqSample]) -> Vec<IqSample> {
        let lead = self.config.leading_samples();
        let trail = self.config.trailing_samples();
        let burst_power = mean_power(burst);

        let mut samples = Vec::with_capacity(lead + burst.len() + trail);
        samples.resize(lead, IqSample::new(0.0, 0.0));
        samples.extend_from_slice(burst);
        samples.resize(lead + burst.len() + trail, IqSample::new(0.0, 0.0));

        match self.config.model {
            ChannelModel::Ideal => {}
            ChannelModel::Awgn => self.add_awgn(&mut samples, burst_power),
            ChannelModel::AwgnWithCfo => {
                self.rotate(&mut samples);
                self.add_awgn(&mut samples, burst_power);
            }
        }
        samples
    }

    /// [`Channel::apply`] on a signal at the configured rate.
    pub fn apply_signal(&mut self, signal: &IqSignal) -> IqSignal {
        if (signal.sample_rate - self.config.sample_rate).abs() > 1e-6 {
            tracing::warn!(
                signal_rate = signal.sample_rate,
                channel_rate = self.config.sample_rate,
                "channel sample rate differs from signal"
            );
        }
        IqSignal::new(self.apply(&signal.samples), signal.sample_rate)
    }

    fn rotate(&mut self, samples: &mut [IqSample]) {
        let step = 2.0 * PI * self.config.cfo_hz / self.config.sample_rate;
        for s in samples.iter_mut() {
            let (sin, cos) = self.cfo_phase.sin_cos();
            *s *= IqSample::new(cos as f32, sin as f32);
            self.cfo_phase = (self.cfo_phase + step) % (2.0 * PI);
        }
    }

    fn add_awgn(&mut self, samples: &mut [IqSample], signal_power: f64) {
        let noise_power = signal_power / 10f64.powf(self.config.snr_db / 10.0);
        // split evenly between I and Q
        let sigma = (noise_power / 2.0).sqrt();
        let normal = match Normal::new(0.0, sigma) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(sigma, error = %e, "invalid noise level, AWGN skipped");
                return;
            }
        };
        for s in samples.iter_mut() {
            let re: f64 = normal.sample(&mut self.rng);
            let im: f64 = normal.sample(&mut self.rng);
            *s += IqSample::new(re as f32, im as f32);
        }
    }
}

/// Signal and noise measured against the clean reference.
#[derive(Debug, Clone)]
pub struct ChannelStats {
    pub signal_power: f64,
    pub noise_power: f64,
    pub measured_snr_db: f64,
}

impl ChannelStats {
    /// Compare a clean burst with the same span of the channel output.
    pub fn compute(clean: &[IqSample], noisy: &[IqSample]) -> Self {
        let n = clean.len().min(noisy.len()).max(1);
        let signal_power = mean_power(clean);
        let noise_power = clean
            .iter()
            .zip(noisy)
            .map(|(c, y)| (y - c).norm_sqr() as f64)
            .sum::<f64>()
            / n as f64;
        Self {
            signal_power,
            noise_power,
            measured_snr_db: 10.0 * (signal_power / noise_power).log10(),
        }
    }
}

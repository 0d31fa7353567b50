//! Quadrature Demodulator (FM Discriminator)
//!
//! Converts complex baseband into instantaneous frequency in Hz:
//!
//! ```text
//! f[n] = arg( x[n] * conj(x[n-1]) ) * fs / 2π
//! ```
//!
//! Before differentiating, the buffer's DC offset is removed and it is scaled
//! to unit power, so the output depends only on the phase trajectory. The
//! result is smoothed with a short centered moving average whose window
//! shrinks at the buffer edges.
//!
//! The standard deviation of the smoothed frequency doubles as an activity
//! measure: a buffer with less than `activity_threshold_hz` of spread holds
//! no modulated carrier and is reported as `None`.
//!
//! ## Example
//!
//! ```rust
//! use ais_core::quadrature_demod::fm_demodulate;
//! use ais_core::types::IqSample;
//!
//! // silence has no frequency content
//! let silence = vec![IqSample::new(0.0, 0.0); 1000];
//! assert!(fm_demodulate(&silence, 48_000.0).is_none());
//! ```

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::types::{IqSample, SYMBOL_RATE};

/// Below this frequency spread a buffer is treated as empty.
pub const DEFAULT_ACTIVITY_THRESHOLD_HZ: f64 = 300.0;

/// Default smoothing length: about half a symbol, odd, at least 3.
pub fn default_smoothing_taps(samples_per_symbol: f64) -> usize {
    (((samples_per_symbol / 2.0) as usize) | 1).max(3)
}

/// FM discriminator with activity detection.
#[derive(Debug, Clone)]
pub struct FmDiscriminator {
    sample_rate: f64,
    taps: usize,
    activity_threshold_hz: f64,
}

impl FmDiscriminator {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            taps: default_smoothing_taps(sample_rate / SYMBOL_RATE),
            activity_threshold_hz: DEFAULT_ACTIVITY_THRESHOLD_HZ,
        }
    }

    /// Moving-average length; forced odd and at least 1.
    pub fn with_taps(mut self, taps: usize) -> Self {
        self.taps = taps.max(1) | 1;
        self
    }

    pub fn with_activity_threshold(mut self, hz: f64) -> Self {
        self.activity_threshold_hz = hz;
        self
    }

    pub fn taps(&self) -> usize {
        self.taps
    }

    pub fn activity_threshold_hz(&self) -> f64 {
        self.activity_threshold_hz
    }

    /// Raw instantaneous frequency without normalization or smoothing.
    ///
    /// The first output sample is 0.
    pub fn discriminate(&self, iq: &[Complex64]) -> Vec<f64> {
        let gain = self.sample_rate / (2.0 * PI);
        let mut out = Vec::with_capacity(iq.len());
        if iq.is_empty() {
            return out;
        }
        out.push(0.0);
        for w in iq.windows(2) {
            out.push((w[1] * w[0].conj()).arg() * gain);
        }
        out
    }

    /// Smoothed instantaneous frequency and its standard deviation.
    ///
    /// Returns `None` for buffers shorter than two samples, without power,
    /// or whose frequency spread is below the activity threshold.
    pub fn demodulate(&self, iq: &[IqSample]) -> Option<(Vec<f32>, f32)> {
        let n = iq.len();
        if n < 2 {
            return None;
        }

        let x: Vec<Complex64> = iq.iter().map(|s| Complex64::new(s.re as f64, s.im as f64)).collect();
        let dc = x.iter().sum::<Complex64>() / n as f64;
        let mut x: Vec<Complex64> = x.into_iter().map(|s| s - dc).collect();
        let power = x.iter().map(|s| s.norm_sqr()).sum::<f64>() / n as f64;
        if power <= 1e-20 {
            tracing::trace!("demodulator input has no power");
            return None;
        }
        let scale = 1.0 / power.sqrt();
        for s in &mut x {
            *s *= scale;
        }

        let freq = self.discriminate(&x);
        let smoothed = moving_average(&freq, self.taps);

        let mean = smoothed.iter().sum::<f64>() / n as f64;
        let spread = (smoothed.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64).sqrt();
        if spread < self.activity_threshold_hz {
            tracing::trace!(spread, threshold = self.activity_threshold_hz, "no signal activity");
            return None;
        }
        tracing::trace!(spread, taps = self.taps, "demodulated");

        Some((smoothed.into_iter().map(|v| v as f32).collect(), spread as f32))
    }
}

/// Centered moving average; the window shrinks near the edges.
fn moving_average(x: &[f64], taps: usize) -> Vec<f64> {
    let n = x.len();
    let half = taps / 2;
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    let mut acc = 0.0;
    for &v in x {
        acc += v;
        prefix.push(acc);
    }
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            (prefix[hi] - prefix[lo]) / (hi - lo) as f64
        })
        .collect()
}

/// Demodulate with the default smoothing and activity threshold.
pub fn fm_demodulate(iq: &[IqSample], sample_rate: f64) -> Option<(Vec<f32>, f32)> {
    FmDiscriminator::new(sample_rate).demodulate(iq)
}

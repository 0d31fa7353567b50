//! Training-Sequence Clock Recovery
//!
//! AIS bursts are short (a few hundred symbols) and begin with a known
//! preamble, so timing is acquired once per burst by correlation instead of
//! with a tracking loop.
//!
//! ## Algorithm
//!
//! 1. The reference is the NRZI line signal of `training ++ flag` mapped to ±1
//!    (32 symbols).
//! 2. For every sample offset `o` the demodulated frequency is sampled at
//!    `o + round(k * sps)`, `k = 0..32`. For each candidate frequency
//!    correction `c` the normalized correlation
//!
//!    ```text
//!    rho = Σ t_k (x_k - c) / sqrt(N * Σ (x_k - c)²)
//!    ```
//!
//!    is computed. The `(o, c)` with the largest `|rho|` wins; its sign gives
//!    the signal polarity.
//! 3. Every symbol from `o` onwards is sampled, corrected, polarity-aligned
//!    and clipped to twice the preamble amplitude so a single spike can not
//!    drag the threshold.
//! 4. Each symbol is sliced against the midpoint of the local positive and
//!    negative means over `±window` symbols.
//!
//! ## Example
//!
//! ```rust
//! use ais_core::clock_recovery::recover_clock;
//!
//! // a flat line correlates with nothing
//! assert!(recover_clock(&vec![0.0f32; 2000], 5.0).is_none());
//! ```

use crate::nrzi::nrzi_encode;
use crate::types::{Bit, HDLC_FLAG, TRAINING_SEQUENCE};

/// Minimum |correlation| accepted as a preamble
pub const DEFAULT_MIN_CORRELATION: f64 = 0.6;

/// Symbols on either side used for the slicing threshold
pub const DEFAULT_ADAPTIVE_WINDOW: usize = 8;

/// Candidate residual carrier offsets, in search order
pub const DEFAULT_FREQUENCY_CORRECTIONS_HZ: [f64; 9] =
    [0.0, 100.0, -100.0, 200.0, -200.0, 300.0, -300.0, 500.0, -500.0];

/// ±1 reference for the line signal of the training sequence and start flag.
pub fn training_template() -> Vec<f64> {
    let mut bits = Vec::with_capacity(TRAINING_SEQUENCE.len() + HDLC_FLAG.len());
    bits.extend_from_slice(&TRAINING_SEQUENCE);
    bits.extend_from_slice(&HDLC_FLAG);
    nrzi_encode(&bits)
        .into_iter()
        .map(|l| if l != 0 { 1.0 } else { -1.0 })
        .collect()
}

/// Result of a successful preamble acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredClock {
    /// Hard symbols (line levels) from the preamble start to the buffer end
    pub symbols: Vec<Bit>,
    /// Sample index of the first preamble symbol
    pub sample_offset: usize,
    /// Frequency correction that maximized the correlation
    pub frequency_correction_hz: f64,
    /// Signed normalized correlation at the chosen alignment
    pub correlation: f64,
}

impl RecoveredClock {
    /// True when the demodulated frequency was negated relative to the template.
    pub fn polarity_inverted(&self) -> bool {
        self.correlation < 0.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Peak {
    rho: f64,
    offset: usize,
    correction: f64,
}

/// Correlating clock recovery.
#[derive(Debug, Clone)]
pub struct ClockRecovery {
    samples_per_symbol: f64,
    min_correlation: f64,
    frequency_corrections_hz: Vec<f64>,
    adaptive_window: usize,
    template: Vec<f64>,
}

impl ClockRecovery {
    pub fn new(samples_per_symbol: f64) -> Self {
        Self {
            samples_per_symbol,
            min_correlation: DEFAULT_MIN_CORRELATION,
            frequency_corrections_hz: DEFAULT_FREQUENCY_CORRECTIONS_HZ.to_vec(),
            adaptive_window: DEFAULT_ADAPTIVE_WINDOW,
            template: training_template(),
        }
    }

    pub fn with_min_correlation(mut self, min_correlation: f64) -> Self {
        self.min_correlation = min_correlation;
        self
    }

    pub fn with_frequency_corrections(mut self, corrections_hz: Vec<f64>) -> Self {
        self.frequency_corrections_hz = corrections_hz;
        self
    }

    pub fn with_adaptive_window(mut self, symbols: usize) -> Self {
        self.adaptive_window = symbols;
        self
    }

    pub fn samples_per_symbol(&self) -> f64 {
        self.samples_per_symbol
    }

    fn symbol_index(&self, offset: usize, k: usize) -> usize {
        offset + (k as f64 * self.samples_per_symbol).round() as usize
    }

    fn search(&self, freq: &[f32]) -> Option<Peak> {
        let n = self.template.len();
        let span = ((n - 1) as f64 * self.samples_per_symbol).round() as usize;
        if freq.len() <= span {
            return None;
        }
        let nf = n as f64;
        let sum_t: f64 = self.template.iter().sum();

        let mut best: Option<Peak> = None;
        for offset in 0..freq.len() - span {
            let (mut stx, mut sx, mut sxx) = (0.0, 0.0, 0.0);
            for (k, t) in self.template.iter().enumerate() {
                let x = freq[self.symbol_index(offset, k)] as f64;
                stx += t * x;
                sx += x;
                sxx += x * x;
            }
            for &c in &self.frequency_corrections_hz {
                let num = stx - c * sum_t;
                let den = sxx - 2.0 * c * sx + nf * c * c;
                if den <= 1e-9 {
                    continue;
                }
                let rho = num / (nf * den).sqrt();
                if best.map_or(true, |b| rho.abs() > b.rho.abs()) {
                    best = Some(Peak {
                        rho,
                        offset,
                        correction: c,
                    });
                }
            }
        }
        best
    }

    /// Acquire the preamble and slice every following symbol.
    pub fn recover(&self, freq: &[f32]) -> Option<RecoveredClock> {
        if self.template.is_empty() || self.samples_per_symbol <= 0.0 {
            return None;
        }
        let peak = self.search(freq)?;
        if !(peak.rho.abs() >= self.min_correlation) {
            tracing::trace!(rho = peak.rho, min = self.min_correlation, "no preamble");
            return None;
        }
        tracing::debug!(
            rho = peak.rho,
            offset = peak.offset,
            correction_hz = peak.correction,
            "preamble acquired"
        );

        let polarity = peak.rho.signum();
        let c = peak.correction;
        let n = self.template.len() as f64;
        let amplitude = self
            .template
            .iter()
            .enumerate()
            .map(|(k, t)| t * (freq[self.symbol_index(peak.offset, k)] as f64 - c))
            .sum::<f64>()
            .abs()
            / n;
        let limit = 2.0 * amplitude;

        let mut values = Vec::new();
        let mut k = 0;
        loop {
            let i = self.symbol_index(peak.offset, k);
            if i >= freq.len() {
                break;
            }
            let v = polarity * (freq[i] as f64 - c);
            values.push(v.clamp(-limit, limit));
            k += 1;
        }

        Some(RecoveredClock {
            symbols: slice_adaptive(&values, self.adaptive_window),
            sample_offset: peak.offset,
            frequency_correction_hz: c,
            correlation: peak.rho,
        })
    }
}

/// Slice each value against the midpoint of the local positive and non-positive means.
fn slice_adaptive(values: &[f64], window: usize) -> Vec<Bit> {
    (0..values.len())
        .map(|k| {
            let lo = k.saturating_sub(window);
            let hi = (k + window + 1).min(values.len());
            let (mut pos_sum, mut pos_n, mut neg_sum, mut neg_n) = (0.0, 0usize, 0.0, 0usize);
            for &v in &values[lo..hi] {
                if v > 0.0 {
                    pos_sum += v;
                    pos_n += 1;
                } else {
                    neg_sum += v;
                    neg_n += 1;
                }
            }
            let threshold = if pos_n > 0 && neg_n > 0 {
                (pos_sum / pos_n as f64 + neg_sum / neg_n as f64) / 2.0
            } else {
                0.0
            };
            (values[k] > threshold) as Bit
        })
        .collect()
}

/// Recover the clock with default correlation threshold and correction grid.
pub fn recover_clock(freq_samples: &[f32], samples_per_symbol: f64) -> Option<RecoveredClock> {
    ClockRecovery::new(samples_per_symbol).recover(freq_samples)
}

//! Spectrum measurements on modulated bursts.
//!
//! A single rectangular-window FFT over the whole burst. The ramps at each
//! end of a transmitted burst keep the edge leakage low enough for
//! occupied-bandwidth figures.

use ais_core::types::IqSample;
use num_complex::Complex64;
use rustfft::FftPlanner;

/// Power spectrum, centred: `(frequency_hz, power)` in ascending frequency.
pub fn power_spectrum(samples: &[IqSample], sample_rate: f64) -> Vec<(f64, f64)> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let mut buffer: Vec<Complex64> = samples
        .iter()
        .map(|s| Complex64::new(s.re as f64, s.im as f64))
        .collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut buffer);

    let half = (n + 1) / 2;
    let bin_hz = sample_rate / n as f64;
    // negative frequencies first
    (half..n)
        .chain(0..half)
        .map(|k| {
            let f = if k < half { k as f64 } else { k as f64 - n as f64 };
            (f * bin_hz, buffer[k].norm_sqr())
        })
        .collect()
}

/// Width of the band holding `fraction` of the total power, with equal
/// power left out on either side.
pub fn occupied_bandwidth(samples: &[IqSample], sample_rate: f64, fraction: f64) -> f64 {
    let spectrum = power_spectrum(samples, sample_rate);
    let total: f64 = spectrum.iter().map(|&(_, p)| p).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let tail = (1.0 - fraction.clamp(0.0, 1.0)) / 2.0 * total;

    let mut acc = 0.0;
    let mut lower = None;
    let mut upper = None;
    for &(f, p) in &spectrum {
        acc += p;
        if lower.is_none() && acc >= tail {
            lower = Some(f);
        }
        if upper.is_none() && acc >= total - tail {
            upper = Some(f);
        }
    }
    match (lower, upper) {
        (Some(lo), Some(hi)) => hi - lo,
        _ => 0.0,
    }
}

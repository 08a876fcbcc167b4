//! Harmonic analysis — direct Fourier decomposition of a wave table.
//!
//! Only magnitudes are kept. Phase is discarded on purpose, so a voice
//! rebuilt from a spectrum shares the table's harmonic balance but not its
//! literal shape.

use std::f64::consts::PI;

/// Upper bound (and default) for the number of analysed harmonics.
pub const MAX_PARTIALS: usize = 32;

/// Resolution used to find the peak of a resynthesised period.
const PEAK_SCAN_POINTS: usize = 2048;

/// Harmonic amplitudes, fundamental first, plus the gain that brings the
/// resynthesised waveform to unit peak.
///
/// Fixed capacity and `Copy`, so it can cross into the render thread
/// without allocating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialSpectrum {
    amplitudes: [f64; MAX_PARTIALS],
    len: usize,
    normalization: f64,
}

impl PartialSpectrum {
    /// Build from raw amplitudes. Extra entries beyond `MAX_PARTIALS` are
    /// dropped; negative or non-finite values are treated as zero.
    pub fn from_amplitudes(values: &[f64]) -> Self {
        let len = values.len().min(MAX_PARTIALS);
        let mut amplitudes = [0.0; MAX_PARTIALS];
        for (dst, &v) in amplitudes.iter_mut().zip(&values[..len]) {
            *dst = if v.is_finite() && v > 0.0 { v } else { 0.0 };
        }
        let mut spectrum = PartialSpectrum {
            amplitudes,
            len,
            normalization: 0.0,
        };
        spectrum.normalization = spectrum.compute_normalization();
        spectrum
    }

    /// A pure sine: fundamental only.
    pub fn fundamental() -> Self {
        PartialSpectrum::from_amplitudes(&[1.0])
    }

    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Amplitude of harmonic `h` (1-based); zero outside the spectrum.
    pub fn harmonic(&self, h: usize) -> f64 {
        if h == 0 || h > self.len {
            0.0
        } else {
            self.amplitudes[h - 1]
        }
    }

    /// Gain that scales the summed partials to a peak of 1.
    pub fn normalization(&self) -> f64 {
        self.normalization
    }

    fn compute_normalization(&self) -> f64 {
        let mut peak = 0.0_f64;
        for i in 0..PEAK_SCAN_POINTS {
            let phase = i as f64 / PEAK_SCAN_POINTS as f64;
            let value: f64 = self
                .amplitudes()
                .iter()
                .enumerate()
                .map(|(idx, a)| a * (2.0 * PI * (idx + 1) as f64 * phase).sin())
                .sum();
            peak = peak.max(value.abs());
        }
        if peak > 1e-12 { 1.0 / peak } else { 0.0 }
    }
}

/// Decompose `samples` into the magnitudes of harmonics `1..=partials`.
///
/// A direct O(N·K) transform; `N` is fixed and `K` small.
///
/// # Panics
/// If `samples` is empty or `partials` is zero or above `MAX_PARTIALS`.
pub fn analyze(samples: &[f32], partials: usize) -> PartialSpectrum {
    assert!(!samples.is_empty(), "cannot analyse an empty table");
    assert!(
        (1..=MAX_PARTIALS).contains(&partials),
        "partial count must be in 1..={MAX_PARTIALS}, got {partials}"
    );

    let n = samples.len() as f64;
    let mut amplitudes = [0.0; MAX_PARTIALS];
    for (idx, amp) in amplitudes.iter_mut().take(partials).enumerate() {
        let harmonic = (idx + 1) as f64;
        let mut real = 0.0;
        let mut imag = 0.0;
        for (i, &s) in samples.iter().enumerate() {
            let angle = 2.0 * PI * harmonic * i as f64 / n;
            real += s as f64 * angle.cos();
            imag += s as f64 * angle.sin();
        }
        *amp = (real * real + imag * imag).sqrt() / n;
    }

    PartialSpectrum::from_amplitudes(&amplitudes[..partials])
}

//! Band-limited additive oscillator driven by a harmonic spectrum.

use std::f64::consts::PI;

use crate::analysis::PartialSpectrum;

/// Sums sine partials at integer multiples of `frequency`.
///
/// Partials at or above Nyquist are skipped, so the output stays
/// band-limited at any pitch. The sum is scaled by the spectrum's
/// normalization so the waveform peaks at 1.
#[derive(Debug, Clone)]
pub struct AdditiveOscillator {
    pub frequency: f64,
    spectrum: PartialSpectrum,
    phase: f64,
    sample_rate: f64,
}

impl AdditiveOscillator {
    pub fn new(spectrum: PartialSpectrum, sample_rate: f64) -> Self {
        AdditiveOscillator {
            frequency: 220.0,
            spectrum,
            phase: 0.0,
            sample_rate,
        }
    }

    pub fn spectrum(&self) -> &PartialSpectrum {
        &self.spectrum
    }

    /// Swap in a new spectrum and restart from phase zero.
    pub fn set_spectrum(&mut self, spectrum: PartialSpectrum) {
        self.spectrum = spectrum;
        self.reset();
    }

    /// Phase increment per sample.
    fn phase_inc(&self) -> f64 {
        self.frequency / self.sample_rate
    }

    /// Highest harmonic that stays below Nyquist.
    fn harmonic_limit(&self) -> usize {
        if self.frequency <= 0.0 {
            return 0;
        }
        let nyquist = self.sample_rate * 0.5;
        let limit = (nyquist / self.frequency).ceil() as usize;
        limit.saturating_sub(1).min(self.spectrum.len())
    }

    /// Generate the next sample.
    pub fn next_sample(&mut self) -> f64 {
        let limit = self.harmonic_limit();
        let theta = 2.0 * PI * self.phase;
        let mut sum = 0.0;
        for (idx, amp) in self.spectrum.amplitudes()[..limit].iter().enumerate() {
            if *amp != 0.0 {
                sum += amp * (theta * (idx + 1) as f64).sin();
            }
        }

        self.phase += self.phase_inc();
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        sum * self.spectrum.normalization()
    }

    /// Reset oscillator phase.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

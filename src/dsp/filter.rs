//! Biquad crossover filters for the equalizer.

use std::f64::consts::PI;

/// Filter response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterType {
    Lowpass,
    Highpass,
}

/// Butterworth Q.
pub const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// A 2nd-order IIR section, Direct Form II Transposed.
///
/// Coefficients from the Audio EQ Cookbook (Robert Bristow-Johnson).
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    pub filter_type: FilterType,
    frequency: f64,
    q: f64,

    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    z1: f64,
    z2: f64,

    sample_rate: f64,
}

impl BiquadFilter {
    pub fn new(filter_type: FilterType, frequency: f64, sample_rate: f64) -> Self {
        let mut f = BiquadFilter {
            filter_type,
            frequency,
            q: BUTTERWORTH_Q,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
            sample_rate,
        };
        f.update_coefficients();
        f
    }

    pub fn lowpass(frequency: f64, sample_rate: f64) -> Self {
        BiquadFilter::new(FilterType::Lowpass, frequency, sample_rate)
    }

    pub fn highpass(frequency: f64, sample_rate: f64) -> Self {
        BiquadFilter::new(FilterType::Highpass, frequency, sample_rate)
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    fn update_coefficients(&mut self) {
        let nyquist = self.sample_rate * 0.5;
        let freq = self.frequency.clamp(1.0, nyquist * 0.99);
        let w0 = 2.0 * PI * freq / self.sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * self.q);

        let a0 = 1.0 + alpha;
        let (b0, b1, b2) = match self.filter_type {
            FilterType::Lowpass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FilterType::Highpass => {
                let b1 = -(1.0 + cos_w0);
                (-b1 / 2.0, b1, -b1 / 2.0)
            }
        };

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = -2.0 * cos_w0 / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    /// Process a single sample through the filter.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    /// Reset filter state.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(f: &mut BiquadFilter, freq: f64, sr: f64) -> f64 {
        let mut max_out = 0.0_f64;
        for i in 0..8820 {
            let input = (2.0 * PI * freq * i as f64 / sr).sin();
            let out = f.process(input);
            if i > 4410 {
                max_out = max_out.max(out.abs());
            }
        }
        max_out
    }

    #[test]
    fn lowpass_passes_dc() {
        let mut f = BiquadFilter::lowpass(100.0, 44100.0);
        let mut output = 0.0;
        for _ in 0..20000 {
            output = f.process(1.0);
        }
        assert!((output - 1.0).abs() < 0.001, "Lowpass should pass DC, got {output}");
    }

    #[test]
    fn highpass_blocks_dc() {
        let mut f = BiquadFilter::highpass(2500.0, 44100.0);
        let mut output = 0.0;
        for _ in 0..1000 {
            output = f.process(1.0);
        }
        assert!(output.abs() < 0.001, "Highpass should block DC, got {output}");
    }

    #[test]
    fn lowpass_attenuates_high_freq() {
        let mut f = BiquadFilter::lowpass(100.0, 44100.0);
        let a = settle(&mut f, 5000.0, 44100.0);
        assert!(a < 0.01, "Lowpass@100Hz should strongly attenuate 5kHz, got {a}");
    }

    #[test]
    fn cutoff_is_minus_three_db() {
        let mut f = BiquadFilter::highpass(2500.0, 44100.0);
        let a = settle(&mut f, 2500.0, 44100.0);
        assert!((a - BUTTERWORTH_Q).abs() < 0.02, "expected ~0.707 at cutoff, got {a}");
    }

    #[test]
    fn filter_output_finite() {
        let mut f = BiquadFilter::lowpass(30000.0, 44100.0);
        for i in 0..10000 {
            let input = if i % 100 == 0 { 1.0 } else { 0.0 };
            let out = f.process(input);
            assert!(out.is_finite(), "Filter output not finite at sample {i}");
        }
    }
}

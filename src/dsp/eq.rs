//! Three-band equalizer with fixed crossovers.
//!
//! The signal is split into low (< 100 Hz), mid (100 Hz – 2.5 kHz) and high
//! (> 2.5 kHz) bands, each band is scaled by its own dB gain, and the bands
//! are summed back together.

use super::filter::BiquadFilter;
use super::gain::db_to_linear;

pub const LOW_CROSSOVER_HZ: f64 = 100.0;
pub const HIGH_CROSSOVER_HZ: f64 = 2500.0;

/// Gain range of each band.
pub const BAND_GAIN_LIMIT_DB: f64 = 12.0;

#[derive(Debug, Clone)]
pub struct ThreeBandEq {
    low_lp: BiquadFilter,
    mid_hp: BiquadFilter,
    mid_lp: BiquadFilter,
    high_hp: BiquadFilter,
    low_gain: f64,
    mid_gain: f64,
    high_gain: f64,
}

impl ThreeBandEq {
    pub fn new(sample_rate: f64) -> Self {
        ThreeBandEq {
            low_lp: BiquadFilter::lowpass(LOW_CROSSOVER_HZ, sample_rate),
            mid_hp: BiquadFilter::highpass(LOW_CROSSOVER_HZ, sample_rate),
            mid_lp: BiquadFilter::lowpass(HIGH_CROSSOVER_HZ, sample_rate),
            high_hp: BiquadFilter::highpass(HIGH_CROSSOVER_HZ, sample_rate),
            low_gain: 1.0,
            mid_gain: 1.0,
            high_gain: 1.0,
        }
    }

    /// Set band gains in dB; each is clamped to ±12 dB.
    pub fn set_gains(&mut self, low_db: f64, mid_db: f64, high_db: f64) {
        let clamp = |db: f64| db_to_linear(db.clamp(-BAND_GAIN_LIMIT_DB, BAND_GAIN_LIMIT_DB));
        self.low_gain = clamp(low_db);
        self.mid_gain = clamp(mid_db);
        self.high_gain = clamp(high_db);
    }

    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let low = self.low_lp.process(input);
        let mid = self.mid_lp.process(self.mid_hp.process(input));
        let high = self.high_hp.process(input);
        low * self.low_gain + mid * self.mid_gain + high * self.high_gain
    }

    pub fn reset(&mut self) {
        self.low_lp.reset();
        self.mid_hp.reset();
        self.mid_lp.reset();
        self.high_hp.reset();
    }
}

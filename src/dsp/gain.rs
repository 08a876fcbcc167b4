//! Decibel gain and sample-accurate gain ramps.
//!
//! −∞ dB is exact silence (linear 0). Ramps interpolate linearly in
//! amplitude between their dB endpoints, so an equal-length crossfade
//! between two uncorrelated voices dips by about 3 dB at its midpoint.

/// Exact silence.
pub const SILENCE_DB: f64 = f64::NEG_INFINITY;

/// Linear gain below which a voice counts as inaudible (−100 dB).
pub const AUDIBLE_FLOOR: f64 = 1e-5;

/// Convert decibels to linear amplitude. −∞ maps to 0.
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    if db == SILENCE_DB {
        0.0
    } else {
        10.0_f64.powf(db / 20.0)
    }
}

/// Convert linear amplitude to decibels. 0 (or less) maps to −∞.
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        SILENCE_DB
    } else {
        20.0 * linear.log10()
    }
}

/// A gain value that can glide to a new target over a fixed number of
/// samples.
#[derive(Debug, Clone)]
pub struct GainRamp {
    current: f64,
    target: f64,
    step: f64,
    remaining: usize,
}

impl GainRamp {
    pub fn new(db: f64) -> Self {
        let linear = db_to_linear(db);
        GainRamp {
            current: linear,
            target: linear,
            step: 0.0,
            remaining: 0,
        }
    }

    /// Jump to `db` immediately, cancelling any ramp in flight.
    pub fn set_db(&mut self, db: f64) {
        let linear = db_to_linear(db);
        self.current = linear;
        self.target = linear;
        self.step = 0.0;
        self.remaining = 0;
    }

    /// Glide from the current value to `db` over `samples` samples.
    ///
    /// Replaces any ramp in flight; the new ramp starts from wherever the
    /// old one had reached.
    pub fn ramp_to_db(&mut self, db: f64, samples: usize) {
        let target = db_to_linear(db);
        if samples == 0 {
            self.set_db(db);
            return;
        }
        self.target = target;
        self.step = (target - self.current) / samples as f64;
        self.remaining = samples;
    }

    /// Advance one sample and return the gain to apply to it.
    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        let value = self.current;
        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = if self.remaining == 0 {
                self.target
            } else {
                self.current + self.step
            };
        }
        value
    }

    /// Current linear gain.
    pub fn value(&self) -> f64 {
        self.current
    }

    /// Current gain in dB.
    pub fn value_db(&self) -> f64 {
        linear_to_db(self.current)
    }

    pub fn is_ramping(&self) -> bool {
        self.remaining > 0
    }

    pub fn is_audible(&self) -> bool {
        self.current > AUDIBLE_FLOOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_conversions() {
        assert_eq!(db_to_linear(0.0), 1.0);
        assert_eq!(db_to_linear(SILENCE_DB), 0.0);
        assert!((db_to_linear(-6.0) - 0.501).abs() < 1e-3);
        assert_eq!(linear_to_db(0.0), SILENCE_DB);
        assert!((linear_to_db(0.5) + 6.0206).abs() < 1e-3);
    }

    #[test]
    fn ramp_reaches_target_exactly() {
        let mut g = GainRamp::new(SILENCE_DB);
        g.ramp_to_db(0.0, 100);
        let mut last = 0.0;
        for _ in 0..100 {
            last = g.next_sample();
        }
        assert!(last < 1.0);
        assert_eq!(g.value(), 1.0);
        assert!(!g.is_ramping());
        assert_eq!(g.next_sample(), 1.0);
    }

    #[test]
    fn ramp_is_linear_in_amplitude() {
        let mut g = GainRamp::new(0.0);
        g.ramp_to_db(SILENCE_DB, 1000);
        for _ in 0..500 {
            g.next_sample();
        }
        assert!((g.value() - 0.5).abs() < 1e-9, "half way should be 0.5, got {}", g.value());
    }

    #[test]
    fn retarget_mid_ramp_starts_from_current() {
        let mut g = GainRamp::new(SILENCE_DB);
        g.ramp_to_db(0.0, 100);
        for _ in 0..50 {
            g.next_sample();
        }
        let mid = g.value();
        g.ramp_to_db(0.0, 100);
        assert!((g.next_sample() - mid).abs() < 1e-12, "retarget must not jump");
    }

    #[test]
    fn silence_is_inaudible() {
        assert!(!GainRamp::new(SILENCE_DB).is_audible());
        assert!(GainRamp::new(-60.0).is_audible());
    }
}

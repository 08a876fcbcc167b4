//! Waveshaping stages: distortion and tanh saturation.

use std::f64::consts::PI;

/// Upper bound of the saturation pre-gain.
pub const MAX_SATURATION_GAIN: f64 = 20.0;

/// Classic WebAudio-style distortion curve.
///
/// `drive` in [0, 1] is scaled to k = 100·drive and fed into
/// `(3 + k)·x·20° / (π + k·|x|)`. Tiny inputs (|x| < 0.001) map to zero.
#[derive(Debug, Clone)]
pub struct Distortion {
    drive: f64,
    k: f64,
}

impl Distortion {
    pub fn new(drive: f64) -> Self {
        let mut d = Distortion { drive: 0.0, k: 0.0 };
        d.set_drive(drive);
        d
    }

    pub fn set_drive(&mut self, drive: f64) {
        self.drive = drive.clamp(0.0, 1.0);
        self.k = self.drive * 100.0;
    }

    pub fn drive(&self) -> f64 {
        self.drive
    }

    #[inline]
    pub fn process(&self, x: f64) -> f64 {
        if x.abs() < 0.001 {
            return 0.0;
        }
        let deg = PI / 180.0;
        (3.0 + self.k) * x * 20.0 * deg / (PI + self.k * x.abs())
    }
}

/// Map a saturation amount in [0, 1] to the pre-gain in [1, 20].
pub fn saturation_gain(amount: f64) -> f64 {
    1.0 + amount.clamp(0.0, 1.0) * (MAX_SATURATION_GAIN - 1.0)
}

/// Pre-gain into a fixed tanh curve. The amount drives the curve harder;
/// the curve itself never changes.
#[derive(Debug, Clone)]
pub struct Saturation {
    gain: f64,
}

impl Saturation {
    pub fn new(amount: f64) -> Self {
        Saturation {
            gain: saturation_gain(amount),
        }
    }

    pub fn set_amount(&mut self, amount: f64) {
        self.gain = saturation_gain(amount);
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    #[inline]
    pub fn process(&self, x: f64) -> f64 {
        (x * self.gain).tanh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturation_mapping_endpoints() {
        assert_eq!(saturation_gain(0.0), 1.0);
        assert_eq!(saturation_gain(1.0), 20.0);
        assert!((saturation_gain(0.5) - 10.5).abs() < 1e-12);
        assert!((saturation_gain(0.25) - 5.75).abs() < 1e-12);
    }

    #[test]
    fn saturation_clamps_out_of_range() {
        assert_eq!(saturation_gain(-1.0), 1.0);
        assert_eq!(saturation_gain(7.0), 20.0);
    }

    #[test]
    fn saturation_is_bounded() {
        let s = Saturation::new(1.0);
        for i in -100..=100 {
            let y = s.process(i as f64 / 10.0);
            assert!(y.abs() <= 1.0, "tanh output out of range: {y}");
        }
        assert!((s.process(0.5) - 10.0_f64.tanh()).abs() < 1e-12);
    }

    #[test]
    fn distortion_curve_at_zero_drive_is_linear() {
        let d = Distortion::new(0.0);
        // k = 0 → 60°/π·x = x/3
        assert!((d.process(0.6) - 0.2).abs() < 1e-12);
        assert!((d.process(-0.3) + 0.1).abs() < 1e-12);
    }

    #[test]
    fn distortion_dead_zone_and_odd_symmetry() {
        let d = Distortion::new(0.7);
        assert_eq!(d.process(0.0005), 0.0);
        for i in 1..50 {
            let x = i as f64 / 50.0;
            assert!((d.process(x) + d.process(-x)).abs() < 1e-12);
        }
    }

    #[test]
    fn more_drive_compresses_more() {
        let soft = Distortion::new(0.1);
        let hard = Distortion::new(1.0);
        let ratio_soft = soft.process(1.0) / soft.process(0.1);
        let ratio_hard = hard.process(1.0) / hard.process(0.1);
        assert!(ratio_hard < ratio_soft, "hard={ratio_hard} soft={ratio_soft}");
    }
}

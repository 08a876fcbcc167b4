//! Static reference waveforms.

use std::f64::consts::PI;

/// Shapes the static generator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticShape {
    Sine,
    Sawtooth,
    Square,
}

/// Generate one period of `shape` over `n` samples, peak 0.5.
///
/// Deterministic and stateless.
pub fn static_waveform(shape: StaticShape, n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let phase = i as f64 / n as f64;
            let value = match shape {
                StaticShape::Sine => (2.0 * PI * phase).sin() * 0.5,
                StaticShape::Sawtooth => phase - 0.5,
                StaticShape::Square => {
                    if (2.0 * PI * phase).sin() > 0.0 {
                        0.5
                    } else {
                        -0.5
                    }
                }
            };
            value as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_quarter_points() {
        let s = static_waveform(StaticShape::Sine, 2048);
        assert_eq!(s.len(), 2048);
        assert!(s[0].abs() < 1e-7);
        assert!((s[512] - 0.5).abs() < 1e-6, "peak at quarter period, got {}", s[512]);
        assert!((s[1536] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn sawtooth_is_linear_ramp() {
        let s = static_waveform(StaticShape::Sawtooth, 2048);
        assert_eq!(s[0], -0.5);
        assert_eq!(s[1024], 0.0);
        assert!(s.windows(2).all(|w| w[1] > w[0]), "ramp must rise monotonically");
        assert!(*s.last().unwrap() < 0.5);
    }

    #[test]
    fn square_two_levels() {
        let s = static_waveform(StaticShape::Square, 2048);
        assert!(s.iter().all(|&v| v == 0.5 || v == -0.5));
        // sin(0) is not positive, so the first sample sits on the low level
        assert_eq!(s[0], -0.5);
        assert_eq!(s[1], 0.5);
        assert_eq!(s[1500], -0.5);
    }

    #[test]
    fn deterministic() {
        assert_eq!(
            static_waveform(StaticShape::Square, 512),
            static_waveform(StaticShape::Square, 512)
        );
    }
}

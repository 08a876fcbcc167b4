//! Reverb — Schroeder/Freeverb-style algorithmic reverb.
//!
//! Parallel damped comb filters followed by series allpass filters. Each
//! comb's feedback is derived from the requested decay time, so the tail
//! falls by 60 dB after `decay` seconds regardless of the comb's length.

/// Shortest decay time (size = 0).
pub const MIN_DECAY_SECONDS: f64 = 0.2;
/// Longest decay time (size = 1).
pub const MAX_DECAY_SECONDS: f64 = 8.0;

/// Map a room size in [0, 1] to a decay time in seconds, 0.2 s to 8.0 s.
pub fn decay_for_size(size: f64) -> f64 {
    MIN_DECAY_SECONDS + size.clamp(0.0, 1.0) * (MAX_DECAY_SECONDS - MIN_DECAY_SECONDS)
}

/// A comb filter delay line with damped feedback.
#[derive(Debug, Clone)]
struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    damp1: f32,
    damp2: f32,
    filterstore: f32,
}

impl CombFilter {
    fn new(size: usize, damp: f32) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
            feedback: 0.0,
            damp1: damp,
            damp2: 1.0 - damp,
            filterstore: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.index];
        self.filterstore = output * self.damp2 + self.filterstore * self.damp1;
        self.buffer[self.index] = input + self.filterstore * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }

    /// Feedback that attenuates by 60 dB over `decay_samples`.
    fn set_decay(&mut self, decay_samples: f64) {
        let loops = decay_samples / self.buffer.len() as f64;
        self.feedback = 10.0_f64.powf(-3.0 / loops.max(1e-6)) as f32;
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.filterstore = 0.0;
    }
}

/// An allpass filter delay line.
#[derive(Debug, Clone)]
struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
}

const ALLPASS_FEEDBACK: f32 = 0.5;

impl AllpassFilter {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let bufout = self.buffer[self.index];
        let output = bufout - input;
        self.buffer[self.index] = input + bufout * ALLPASS_FEEDBACK;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

// Tuning constants (scaled for 44100 Hz sample rate)
const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];
const STEREO_SPREAD: usize = 23;
const DAMPING: f32 = 0.2;
const INPUT_GAIN: f32 = 0.015;

/// A stereo algorithmic reverb with decay time and wet/dry mix.
#[derive(Debug, Clone)]
pub struct Reverb {
    comb_l: Vec<CombFilter>,
    comb_r: Vec<CombFilter>,
    allpass_l: Vec<AllpassFilter>,
    allpass_r: Vec<AllpassFilter>,
    sample_rate: f64,
    decay: f64,
    /// Dry/wet mix (0.0 = fully dry, 1.0 = fully wet).
    mix: f32,
}

impl Reverb {
    pub fn new(sample_rate: f64, decay: f64, mix: f64) -> Self {
        let scale = sample_rate / 44100.0;
        let sized = |t: usize, spread: usize| ((t as f64) * scale) as usize + spread;

        let mut reverb = Self {
            comb_l: COMB_TUNING.iter().map(|&t| CombFilter::new(sized(t, 0), DAMPING)).collect(),
            comb_r: COMB_TUNING
                .iter()
                .map(|&t| CombFilter::new(sized(t, STEREO_SPREAD), DAMPING))
                .collect(),
            allpass_l: ALLPASS_TUNING.iter().map(|&t| AllpassFilter::new(sized(t, 0))).collect(),
            allpass_r: ALLPASS_TUNING
                .iter()
                .map(|&t| AllpassFilter::new(sized(t, STEREO_SPREAD)))
                .collect(),
            sample_rate,
            decay: 0.0,
            mix: 0.0,
        };
        reverb.set_decay(decay);
        reverb.set_mix(mix);
        reverb
    }

    /// Set decay time in seconds, clamped to [0.2, 8.0].
    pub fn set_decay(&mut self, seconds: f64) {
        self.decay = seconds.clamp(MIN_DECAY_SECONDS, MAX_DECAY_SECONDS);
        let decay_samples = self.decay * self.sample_rate;
        for comb in self.comb_l.iter_mut().chain(self.comb_r.iter_mut()) {
            comb.set_decay(decay_samples);
        }
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// Set wet fraction, clamped to [0, 1]. Independent of decay.
    pub fn set_mix(&mut self, mix: f64) {
        self.mix = mix.clamp(0.0, 1.0) as f32;
    }

    pub fn mix(&self) -> f64 {
        self.mix as f64
    }

    /// Process a stereo sample pair, returning the processed output.
    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let input = (left + right) * INPUT_GAIN;

        let mut out_l: f32 = self.comb_l.iter_mut().map(|c| c.process(input)).sum();
        let mut out_r: f32 = self.comb_r.iter_mut().map(|c| c.process(input)).sum();

        for allpass in &mut self.allpass_l {
            out_l = allpass.process(out_l);
        }
        for allpass in &mut self.allpass_r {
            out_r = allpass.process(out_r);
        }

        let mix = self.mix;
        (
            left * (1.0 - mix) + out_l * mix,
            right * (1.0 - mix) + out_r * mix,
        )
    }

    /// Clear all internal buffers.
    pub fn clear(&mut self) {
        for comb in self.comb_l.iter_mut().chain(self.comb_r.iter_mut()) {
            comb.clear();
        }
        for allpass in self.allpass_l.iter_mut().chain(self.allpass_r.iter_mut()) {
            allpass.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tail_peak(reverb: &mut Reverb, from: usize, to: usize) -> f32 {
        reverb.process(1.0, 1.0);
        let mut peak = 0.0f32;
        for i in 1..to {
            let (l, r) = reverb.process(0.0, 0.0);
            if i >= from {
                peak = peak.max(l.abs().max(r.abs()));
            }
        }
        peak
    }

    #[test]
    fn size_maps_linearly_to_decay() {
        assert!((decay_for_size(0.0) - 0.2).abs() < 1e-12);
        assert!((decay_for_size(1.0) - 8.0).abs() < 1e-12);
        assert!((decay_for_size(0.5) - 4.1).abs() < 1e-12);
        assert_eq!(decay_for_size(-2.0), 0.2);
        assert_eq!(decay_for_size(3.0), 8.0);
    }

    #[test]
    fn passthrough_when_dry() {
        let mut reverb = Reverb::new(44100.0, 2.0, 0.0);
        let (out_l, out_r) = reverb.process(0.5, -0.5);
        assert!((out_l - 0.5).abs() < 1e-6);
        assert!((out_r - (-0.5)).abs() < 1e-6);
    }

    #[test]
    fn produces_tail_after_impulse() {
        let mut reverb = Reverb::new(44100.0, 2.0, 1.0);
        let peak = tail_peak(&mut reverb, 1, 5000);
        assert!(peak > 0.001, "Reverb should produce output after impulse");
    }

    #[test]
    fn longer_decay_rings_longer() {
        let mut short = Reverb::new(44100.0, decay_for_size(0.0), 1.0);
        let mut long = Reverb::new(44100.0, decay_for_size(1.0), 1.0);
        let s = tail_peak(&mut short, 22050, 44100);
        let l = tail_peak(&mut long, 22050, 44100);
        assert!(l > s * 10.0, "8 s tail should outlast 0.2 s tail: short={s} long={l}");
    }

    #[test]
    fn comb_feedback_stays_below_one() {
        let reverb = Reverb::new(48000.0, MAX_DECAY_SECONDS, 0.5);
        for comb in reverb.comb_l.iter().chain(reverb.comb_r.iter()) {
            assert!(comb.feedback > 0.0 && comb.feedback < 1.0);
        }
    }

    #[test]
    fn clear_silences_tail() {
        let mut reverb = Reverb::new(44100.0, 4.0, 1.0);
        reverb.process(1.0, 1.0);
        for _ in 0..3000 {
            reverb.process(0.0, 0.0);
        }
        reverb.clear();
        let (l, r) = reverb.process(0.0, 0.0);
        assert_eq!((l, r), (0.0, 0.0));
    }
}

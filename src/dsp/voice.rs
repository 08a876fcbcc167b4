//! Voices — arena-owned oscillator slots with independent gain.
//!
//! The bank owns three fixed slots: `A` and `B` for the pose-driven
//! crossfade pair, and `Single` for static waveforms. Spectra are replaced
//! in place; nothing is allocated after construction.

use crate::analysis::PartialSpectrum;

use super::gain::{GainRamp, SILENCE_DB};
use super::oscillator::AdditiveOscillator;

/// Slot identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceId {
    A,
    B,
    Single,
}

impl VoiceId {
    pub const ALL: [VoiceId; 3] = [VoiceId::A, VoiceId::B, VoiceId::Single];

    fn index(self) -> usize {
        match self {
            VoiceId::A => 0,
            VoiceId::B => 1,
            VoiceId::Single => 2,
        }
    }
}

/// What a slot looked like at the instant its spectrum was replaced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rebuild {
    pub voice: VoiceId,
    /// Gain in dB at the moment of replacement.
    pub gain_db: f64,
    /// Whether the slot was running above the audibility floor.
    pub audible: bool,
}

/// One oscillator shaped by a gain ramp.
#[derive(Debug, Clone)]
pub struct Voice {
    pub oscillator: AdditiveOscillator,
    pub gain: GainRamp,
    running: bool,
}

impl Voice {
    pub fn new(sample_rate: f64) -> Self {
        Voice {
            oscillator: AdditiveOscillator::new(PartialSpectrum::fundamental(), sample_rate),
            gain: GainRamp::new(SILENCE_DB),
            running: false,
        }
    }

    /// Tear down and rebuild with a new spectrum, keeping frequency and gain.
    pub fn replace_spectrum(&mut self, id: VoiceId, spectrum: PartialSpectrum) -> Rebuild {
        let rebuild = Rebuild {
            voice: id,
            gain_db: self.gain.value_db(),
            audible: self.is_audible(),
        };
        self.oscillator.set_spectrum(spectrum);
        rebuild
    }

    pub fn start(&mut self) {
        if !self.running {
            self.oscillator.reset();
            self.running = true;
        }
    }

    /// Stop and silence.
    pub fn stop(&mut self) {
        self.running = false;
        self.gain.set_db(SILENCE_DB);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_audible(&self) -> bool {
        self.running && self.gain.is_audible()
    }

    /// Generate the next sample.
    pub fn next_sample(&mut self) -> f64 {
        if !self.running {
            return 0.0;
        }
        let g = self.gain.next_sample();
        let s = self.oscillator.next_sample();
        s * g
    }
}

/// Fixed arena of the three voice slots.
#[derive(Debug, Clone)]
pub struct VoiceBank {
    slots: [Voice; 3],
}

impl VoiceBank {
    pub fn new(sample_rate: f64, frequency: f64) -> Self {
        let mut bank = VoiceBank {
            slots: [
                Voice::new(sample_rate),
                Voice::new(sample_rate),
                Voice::new(sample_rate),
            ],
        };
        bank.set_frequency(frequency);
        bank
    }

    pub fn voice(&self, id: VoiceId) -> &Voice {
        &self.slots[id.index()]
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> &mut Voice {
        &mut self.slots[id.index()]
    }

    /// All slots share one frequency.
    pub fn set_frequency(&mut self, frequency: f64) {
        for v in self.slots.iter_mut() {
            v.oscillator.frequency = frequency;
        }
    }

    pub fn stop_all(&mut self) {
        for v in self.slots.iter_mut() {
            v.stop();
        }
    }

    pub fn audible_count(&self) -> usize {
        self.slots.iter().filter(|v| v.is_audible()).count()
    }

    /// Sum of all running slots.
    pub fn next_sample(&mut self) -> f64 {
        self.slots.iter_mut().map(Voice::next_sample).sum()
    }
}

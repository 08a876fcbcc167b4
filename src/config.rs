//! Engine configuration.
//!
//! Loaded from JSON (missing fields take their defaults) or built in code.

use serde::{Deserialize, Serialize};

use crate::analysis::MAX_PARTIALS;
use crate::dsp::effects::EffectParams;
use crate::error::EngineError;
use crate::waveform::WaveformMode;

/// Lowest frequency the oscillators accept.
pub const MIN_FREQUENCY_HZ: f64 = 1.0;

/// Supported output sample rates.
pub const MIN_SAMPLE_RATE: f64 = 8000.0;
pub const MAX_SAMPLE_RATE: f64 = 384_000.0;

/// Largest control → render queue.
pub const MAX_QUEUE_CAPACITY: usize = 4096;

/// Longest pose-driven crossfade.
pub const MAX_CROSSFADE_SECONDS: f64 = 60.0;

/// Slowest pose update rate; one table every 100 s.
pub const MIN_UPDATE_RATE_HZ: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: f64,
    /// Initial oscillator frequency in Hz.
    pub frequency: f64,
    /// Number of harmonics kept from each analysed table (1..=32).
    pub partials: usize,
    /// Length of the pose-driven crossfade in seconds.
    pub crossfade_seconds: f64,
    /// Capacity of the control → render command queue.
    pub queue_capacity: usize,
    /// Maximum rate at which poses are turned into new tables.
    pub update_rate_hz: f64,
    /// Waveform mode at start-up.
    pub mode: WaveformMode,
    /// Initial effect settings.
    pub effects: EffectParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            frequency: 220.0,
            partials: MAX_PARTIALS,
            crossfade_seconds: 5.0,
            queue_capacity: 64,
            update_rate_hz: 2.0,
            mode: WaveformMode::Camera,
            effects: EffectParams::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config, then sanitize it.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Copy with every field pulled into a usable range.
    pub fn sanitized(&self) -> Self {
        let defaults = EngineConfig::default();
        let sample_rate = if self.sample_rate.is_finite() && self.sample_rate >= MIN_SAMPLE_RATE {
            self.sample_rate.min(MAX_SAMPLE_RATE)
        } else {
            defaults.sample_rate
        };
        let crossfade_seconds = if self.crossfade_seconds.is_finite() {
            self.crossfade_seconds.clamp(0.0, MAX_CROSSFADE_SECONDS)
        } else {
            defaults.crossfade_seconds
        };
        let update_rate_hz = if self.update_rate_hz.is_finite() && self.update_rate_hz > 0.0 {
            self.update_rate_hz.max(MIN_UPDATE_RATE_HZ)
        } else {
            defaults.update_rate_hz
        };
        EngineConfig {
            sample_rate,
            frequency: clamp_frequency(self.frequency, sample_rate),
            partials: self.partials.clamp(1, MAX_PARTIALS),
            crossfade_seconds,
            queue_capacity: self.queue_capacity.clamp(4, MAX_QUEUE_CAPACITY),
            update_rate_hz,
            mode: self.mode,
            effects: self.effects.sanitized(),
        }
    }

    /// Crossfade length in samples at this sample rate.
    pub fn crossfade_samples(&self) -> usize {
        (self.crossfade_seconds * self.sample_rate).round() as usize
    }
}

/// Clamp a frequency into [1 Hz, Nyquist]. NaN becomes the minimum.
pub fn clamp_frequency(hz: f64, sample_rate: f64) -> f64 {
    if hz.is_nan() {
        MIN_FREQUENCY_HZ
    } else {
        hz.clamp(MIN_FREQUENCY_HZ, sample_rate * 0.5)
    }
}

//! Effects chain — distortion → saturation → 3-band EQ → reverb → volume.
//!
//! `EffectParams` is the control-plane snapshot; `EffectsChain` owns the
//! DSP units on the render side and applies a snapshot whenever a new one
//! arrives.

use serde::{Deserialize, Serialize};

use super::eq::{BAND_GAIN_LIMIT_DB, ThreeBandEq};
use super::gain::db_to_linear;
use super::reverb::{Reverb, decay_for_size};
use super::shaper::{Distortion, Saturation, saturation_gain};

/// Quietest master volume.
pub const MIN_VOLUME_DB: f64 = -60.0;
/// Loudest master volume.
pub const MAX_VOLUME_DB: f64 = 0.0;

/// Per-band equalizer gains in dB.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EqGains {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

/// Reverb controls: room size and wet strength, both in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbParams {
    pub size: f64,
    pub strength: f64,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            size: 0.5,
            strength: 0.3,
        }
    }
}

/// All effect controls. Setters clamp into range and never fail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectParams {
    /// Distortion drive [0, 1].
    pub distortion: f64,
    /// Saturation amount [0, 1].
    pub saturation: f64,
    pub eq: EqGains,
    pub reverb: ReverbParams,
    /// Master volume in dB, [-60, 0].
    pub volume_db: f64,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            distortion: 0.0,
            saturation: 0.0,
            eq: EqGains::default(),
            reverb: ReverbParams::default(),
            volume_db: -9.0,
        }
    }
}

fn unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

fn band(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(-BAND_GAIN_LIMIT_DB, BAND_GAIN_LIMIT_DB)
    }
}

impl EffectParams {
    pub fn set_distortion(&mut self, drive: f64) {
        self.distortion = unit(drive);
    }

    pub fn set_saturation(&mut self, amount: f64) {
        self.saturation = unit(amount);
    }

    pub fn set_eq(&mut self, low: f64, mid: f64, high: f64) {
        self.eq = EqGains {
            low: band(low),
            mid: band(mid),
            high: band(high),
        };
    }

    pub fn set_reverb(&mut self, size: f64, strength: f64) {
        self.reverb = ReverbParams {
            size: unit(size),
            strength: unit(strength),
        };
    }

    pub fn set_volume(&mut self, db: f64) {
        self.volume_db = if db.is_nan() {
            MIN_VOLUME_DB
        } else {
            db.clamp(MIN_VOLUME_DB, MAX_VOLUME_DB)
        };
    }

    /// Pre-gain into the saturation curve.
    pub fn saturation_gain(&self) -> f64 {
        saturation_gain(self.saturation)
    }

    /// Reverb decay time in seconds.
    pub fn reverb_decay(&self) -> f64 {
        decay_for_size(self.reverb.size)
    }

    /// Copy with every field pulled into its documented range.
    pub fn sanitized(&self) -> Self {
        let mut p = *self;
        p.set_distortion(self.distortion);
        p.set_saturation(self.saturation);
        p.set_eq(self.eq.low, self.eq.mid, self.eq.high);
        p.set_reverb(self.reverb.size, self.reverb.strength);
        p.set_volume(self.volume_db);
        p
    }
}

/// The render-side signal path.
#[derive(Debug, Clone)]
pub struct EffectsChain {
    distortion: Distortion,
    saturation: Saturation,
    eq: ThreeBandEq,
    reverb: Reverb,
    volume: f64,
    params: EffectParams,
}

impl EffectsChain {
    pub fn new(sample_rate: f64, params: &EffectParams) -> Self {
        let params = params.sanitized();
        let mut chain = EffectsChain {
            distortion: Distortion::new(params.distortion),
            saturation: Saturation::new(params.saturation),
            eq: ThreeBandEq::new(sample_rate),
            reverb: Reverb::new(sample_rate, params.reverb_decay(), params.reverb.strength),
            volume: db_to_linear(params.volume_db),
            params,
        };
        chain.eq.set_gains(params.eq.low, params.eq.mid, params.eq.high);
        chain
    }

    pub fn params(&self) -> &EffectParams {
        &self.params
    }

    /// Push a new snapshot into the units that changed.
    pub fn apply(&mut self, params: &EffectParams) {
        let params = params.sanitized();
        if params.distortion != self.params.distortion {
            self.distortion.set_drive(params.distortion);
        }
        if params.saturation != self.params.saturation {
            self.saturation.set_amount(params.saturation);
        }
        if params.eq != self.params.eq {
            self.eq.set_gains(params.eq.low, params.eq.mid, params.eq.high);
        }
        if params.reverb.size != self.params.reverb.size {
            self.reverb.set_decay(params.reverb_decay());
        }
        if params.reverb.strength != self.params.reverb.strength {
            self.reverb.set_mix(params.reverb.strength);
        }
        if params.volume_db != self.params.volume_db {
            self.volume = db_to_linear(params.volume_db);
        }
        self.params = params;
    }

    /// Run one mono source sample through the chain, producing a stereo pair.
    #[inline]
    pub fn process(&mut self, input: f64) -> (f32, f32) {
        let x = self.distortion.process(input);
        let x = self.saturation.process(x);
        let x = self.eq.process(x) as f32;
        let (l, r) = self.reverb.process(x, x);
        let v = self.volume as f32;
        (l * v, r * v)
    }

    /// Drop all filter and reverb state.
    pub fn reset(&mut self) {
        self.eq.reset();
        self.reverb.clear();
    }
}

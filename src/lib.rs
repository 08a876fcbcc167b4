pub mod analysis;
pub mod clock;
pub mod config;
pub mod dsp;
pub mod error;
pub mod pitch;
pub mod pose;
pub mod tracker;
pub mod waveform;

use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, ManualClock};
use crate::config::EngineConfig;
use crate::dsp::crossfade::VoiceMode;
use crate::dsp::engine::{AudioEngine, Renderer};
use crate::error::EngineError;
use crate::pose::Pose;
use crate::tracker::WaveTableTracker;
use crate::waveform::{WaveTable, WaveformMode};
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the posewave-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

fn parse_mode(mode: &str) -> Result<WaveformMode, JsValue> {
    WaveformMode::parse(mode)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown waveform mode '{mode}'")))
}

/// WASM-exposed: the 2048-sample table for a waveform mode
/// (`camera`, `sine`, `saw`, `square`).
#[wasm_bindgen]
pub fn waveform_table(mode: &str) -> Result<Vec<f32>, JsValue> {
    Ok(waveform::generate_waveform(parse_mode(mode)?).to_vec())
}

/// WASM-exposed: turn a pose object (`{ keypoints: { left_wrist: {x, y}, ... } }`)
/// into a 2048-sample table.
#[wasm_bindgen]
pub fn pose_wave_table(pose: JsValue) -> Result<Vec<f32>, JsValue> {
    let pose: Pose =
        serde_wasm_bindgen::from_value(pose).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(WaveTable::from_pose(&pose).to_vec())
}

/// WASM-exposed synth: engine, renderer and table tracker in one object,
/// driven from an AudioWorklet.
///
/// The host supplies time through `tick()`; all deferred control work is
/// timed against it.
#[wasm_bindgen]
pub struct PoseSynth {
    engine: AudioEngine,
    renderer: Option<Renderer>,
    tracker: WaveTableTracker,
    clock: ManualClock,
}

#[wasm_bindgen]
impl PoseSynth {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> PoseSynth {
        PoseSynth::with_config(EngineConfig {
            sample_rate,
            ..EngineConfig::default()
        })
    }

    /// Build from a JSON `EngineConfig`; missing fields take defaults.
    pub fn from_config(json: &str) -> Result<PoseSynth, JsValue> {
        let config = EngineConfig::from_json(json).map_err(|e| JsValue::from_str(&format!("{e}")))?;
        Ok(PoseSynth::with_config(config))
    }

    pub fn start(&mut self) -> Result<(), JsValue> {
        self.start_engine().map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    pub fn stop(&mut self) {
        self.engine.stop();
        self.renderer = None;
    }

    pub fn is_started(&self) -> bool {
        self.engine.is_started()
    }

    pub fn set_frequency(&mut self, hz: f64) {
        self.engine.set_frequency(hz);
    }

    /// Set the frequency from a note name and octave, e.g. `("A", 4)`.
    pub fn set_note(&mut self, note: &str, octave: i32) {
        self.engine.set_frequency(pitch::note_to_frequency(note, octave));
    }

    pub fn frequency(&self) -> f64 {
        self.engine.frequency()
    }

    /// Nearest note to the current frequency as `{ note, octave, cents }`,
    /// or `undefined` if there is none.
    pub fn nearest_note(&self) -> Result<JsValue, JsValue> {
        let note = pitch::nearest_note(self.engine.frequency());
        serde_wasm_bindgen::to_value(&note).map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    pub fn set_distortion(&mut self, drive: f64) {
        self.engine.set_distortion(drive);
    }

    pub fn set_saturation(&mut self, amount: f64) {
        self.engine.set_saturation(amount);
    }

    pub fn set_eq(&mut self, low_db: f64, mid_db: f64, high_db: f64) {
        self.engine.set_eq(low_db, mid_db, high_db);
    }

    pub fn set_reverb(&mut self, size: f64, strength: f64) {
        self.engine.set_reverb(size, strength);
    }

    pub fn set_volume(&mut self, db: f64) {
        self.engine.set_volume(db);
    }

    /// Select `camera`, `sine`, `saw` or `square`.
    pub fn set_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode = parse_mode(mode)?;
        self.select_mode(mode).map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    pub fn mode(&self) -> String {
        match self.tracker.mode() {
            WaveformMode::Camera => "camera",
            WaveformMode::Sine => "sine",
            WaveformMode::Sawtooth => "saw",
            WaveformMode::Square => "square",
        }
        .to_string()
    }

    /// Offer a pose object. Returns true if it produced a new table.
    ///
    /// Poses are rate-limited against the time last passed to `tick()`. If
    /// the host never calls `tick()` the clock stays at zero: only the first
    /// pose produces a table and crossfade labels never flip.
    pub fn update_pose(&mut self, pose: JsValue) -> Result<bool, JsValue> {
        let pose: Pose =
            serde_wasm_bindgen::from_value(pose).map_err(|e| JsValue::from_str(&format!("{e}")))?;
        self.offer_pose(&pose).map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    /// Push a raw 2048-sample table.
    pub fn update_table(&mut self, samples: Vec<f32>, pose_driven: bool) -> Result<(), JsValue> {
        self.push_table(samples, pose_driven).map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    /// Advance the control clock to `now_ms` (e.g. `performance.now()`) and
    /// fire any due crossfade flips. Call it at least once per animation
    /// frame; negative or unrepresentable times are ignored.
    pub fn tick(&mut self, now_ms: f64) {
        if let Ok(now) = Duration::try_from_secs_f64(now_ms / 1000.0) {
            self.clock.set(now);
        }
        self.engine.poll();
    }

    /// Render `frames` stereo frames, interleaved L/R.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * 2];
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.render_interleaved(&mut out);
        }
        out
    }

    /// The table currently shaping the sound, for visualisation.
    pub fn latest_table(&self) -> Vec<f32> {
        self.engine
            .latest_table()
            .unwrap_or_else(|| self.tracker.latest())
            .to_vec()
    }
}

impl PoseSynth {
    pub fn with_config(config: EngineConfig) -> PoseSynth {
        let config = config.sanitized();
        let clock = ManualClock::new();
        let tracker = WaveTableTracker::new(config.mode, config.update_rate_hz);
        PoseSynth {
            engine: AudioEngine::with_clock(config, Box::new(clock.clone())),
            renderer: None,
            tracker,
            clock,
        }
    }

    fn start_engine(&mut self) -> Result<(), EngineError> {
        self.renderer = Some(self.engine.start()?);
        // Mode may have been chosen before the engine was running.
        if self.engine.mode() != self.tracker.voice_mode() {
            self.engine.update_wave(self.tracker.latest(), self.tracker.voice_mode())?;
        }
        Ok(())
    }

    fn select_mode(&mut self, mode: WaveformMode) -> Result<(), EngineError> {
        let table = self.tracker.set_mode(mode);
        if !self.engine.is_started() {
            return Ok(());
        }
        match table {
            Some(table) => self.engine.update_wave(table, VoiceMode::Static),
            None => self.engine.set_mode(mode.into()),
        }
    }

    fn offer_pose(&mut self, pose: &Pose) -> Result<bool, EngineError> {
        let Some(table) = self.tracker.on_pose(pose, self.clock.now()) else {
            return Ok(false);
        };
        if self.engine.is_started() {
            self.engine.update_wave(table, VoiceMode::PoseDriven)?;
        }
        Ok(true)
    }

    fn push_table(&mut self, samples: Vec<f32>, pose_driven: bool) -> Result<(), EngineError> {
        let table = Arc::new(WaveTable::from_samples(samples)?);
        let mode = if pose_driven {
            VoiceMode::PoseDriven
        } else {
            VoiceMode::Static
        };
        self.engine.update_wave(table, mode)
    }

    pub fn engine(&self) -> &AudioEngine {
        &self.engine
    }

    pub fn renderer(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::voice::VoiceId;
    use crate::pose::{Keypoint, Landmark};
    use crate::waveform::TABLE_LEN;

    fn arms_pose() -> Pose {
        let coords = [(0.1, 0.5), (0.2, 0.3), (0.35, 0.6), (0.6, 0.2), (0.75, 0.4), (0.9, 0.5)];
        Landmark::ORDER
            .iter()
            .zip(coords)
            .fold(Pose::new(), |pose, (&l, (x, y))| pose.with(l, Keypoint::new(x, y)))
    }

    fn started() -> PoseSynth {
        let mut synth = PoseSynth::with_config(EngineConfig {
            sample_rate: 8000.0,
            crossfade_seconds: 0.1,
            ..EngineConfig::default()
        });
        synth.start_engine().unwrap();
        synth
    }

    #[test]
    fn renders_interleaved_stereo() {
        let mut synth = started();
        let out = synth.render(128);
        assert_eq!(out.len(), 256);
        assert!(out.iter().any(|s| s.abs() > 0.0));
        assert!(out.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn silent_before_start() {
        let mut synth = PoseSynth::new(8000.0);
        assert!(synth.render(64).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn pose_drives_crossfade() {
        let mut synth = started();
        synth.render(128);
        assert!(synth.offer_pose(&arms_pose()).unwrap());
        synth.render(128);
        let rebuild = synth.renderer().unwrap().last_rebuild().unwrap();
        assert_eq!(rebuild.voice, VoiceId::B);
        assert_eq!(synth.latest_table(), WaveTable::from_pose(&arms_pose()).to_vec());
    }

    #[test]
    fn mode_selected_before_start_applies_on_start() {
        let mut synth = PoseSynth::with_config(EngineConfig {
            sample_rate: 8000.0,
            ..EngineConfig::default()
        });
        synth.select_mode(WaveformMode::Square).unwrap();
        synth.start_engine().unwrap();
        assert_eq!(synth.engine().mode(), VoiceMode::Static);
        synth.render(64);
        assert_eq!(synth.renderer().unwrap().voice_gain_db(VoiceId::Single), 0.0);
    }

    #[test]
    fn tick_fires_label_flip() {
        let mut synth = started();
        synth.offer_pose(&arms_pose()).unwrap();
        synth.tick(50.0);
        assert_eq!(synth.engine().active_voice(), VoiceId::A);
        synth.tick(150.0);
        assert_eq!(synth.engine().active_voice(), VoiceId::B);
    }

    #[test]
    fn raw_table_is_validated() {
        let mut synth = started();
        let err = synth.push_table(vec![0.0; 10], true).unwrap_err();
        assert!(matches!(err, EngineError::Table(_)));
        synth.push_table(vec![0.25; TABLE_LEN], false).unwrap();
        assert_eq!(synth.engine().mode(), VoiceMode::Static);
    }

    #[test]
    fn extreme_config_and_times_are_tolerated() {
        let mut synth = PoseSynth::with_config(EngineConfig {
            sample_rate: 8000.0,
            crossfade_seconds: 1e20,
            update_rate_hz: 1e-30,
            ..EngineConfig::default()
        });
        synth.start_engine().unwrap();
        synth.tick(f64::MAX);
        synth.tick(-5.0);
        synth.tick(f64::NAN);
        assert!(synth.offer_pose(&arms_pose()).unwrap());
        assert!(!synth.offer_pose(&arms_pose()).unwrap());
        assert!(synth.render(64).iter().all(|s| s.is_finite()));
    }

    #[test]
    fn poses_without_tick_stop_after_first() {
        let mut synth = started();
        assert!(synth.offer_pose(&arms_pose()).unwrap());
        assert!(!synth.offer_pose(&arms_pose()).unwrap());
        synth.tick(500.0);
        assert!(synth.offer_pose(&arms_pose()).unwrap());
    }

    #[test]
    fn stop_drops_renderer() {
        let mut synth = started();
        synth.stop();
        assert!(!synth.is_started());
        assert!(synth.render(32).iter().all(|&s| s == 0.0));
    }
}

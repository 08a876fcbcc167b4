//! Audio Engine — control handle and real-time render half.
//!
//! `AudioEngine` lives in the control context (UI events, pose updates).
//! `start()` hands back a `Renderer` that the audio callback owns. The two
//! halves share nothing but a bounded command queue: the control side only
//! ever `try_send`s, the render side drains the queue at the start of each
//! quantum, so every command takes effect atomically on a quantum boundary
//! and neither side blocks the other.
//!
//! Spectrum analysis happens on the control side; the render side only
//! copies fixed-size spectra into its voice arena.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};
use tracing::{debug, error, info, warn};

use crate::analysis::{PartialSpectrum, analyze};
use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, clamp_frequency};
use crate::error::EngineError;
use crate::waveform::{WaveTable, generate_waveform};

use super::crossfade::{CrossfadeScheduler, Label, VoiceMode};
use super::effects::{EffectParams, EffectsChain};
use super::gain::SILENCE_DB;
use super::voice::{Rebuild, VoiceBank, VoiceId};

/// Messages from the control side to the renderer.
#[derive(Debug, Clone, Copy)]
enum Command {
    Frequency(f64),
    Effects(EffectParams),
    EnterPoseDriven {
        spectrum: PartialSpectrum,
    },
    EnterStatic {
        spectrum: PartialSpectrum,
    },
    Crossfade {
        rebuild: VoiceId,
        fade_out: VoiceId,
        spectrum: PartialSpectrum,
        samples: usize,
    },
    Replace {
        spectrum: PartialSpectrum,
    },
    Shutdown,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Frequency(_) => "frequency",
            Command::Effects(_) => "effects",
            Command::EnterPoseDriven { .. } => "enter-pose-driven",
            Command::EnterStatic { .. } => "enter-static",
            Command::Crossfade { .. } => "crossfade",
            Command::Replace { .. } => "replace",
            Command::Shutdown => "shutdown",
        }
    }
}

/// Control handle for the synthesis engine.
pub struct AudioEngine {
    config: EngineConfig,
    clock: Box<dyn Clock>,
    commands: Option<Sender<Command>>,
    scheduler: CrossfadeScheduler,
    params: EffectParams,
    frequency: f64,
    spectrum: PartialSpectrum,
    latest_table: Option<Arc<WaveTable>>,
}

impl AudioEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, Box::new(SystemClock::new()))
    }

    /// Create an engine whose deferred flips are timed by `clock`.
    pub fn with_clock(config: EngineConfig, clock: Box<dyn Clock>) -> Self {
        let config = config.sanitized();
        let fade = Duration::try_from_secs_f64(config.crossfade_seconds).unwrap_or_default();
        AudioEngine {
            scheduler: CrossfadeScheduler::new(config.mode.into(), fade),
            params: config.effects,
            frequency: config.frequency,
            spectrum: analyze(&generate_waveform(config.mode), config.partials),
            latest_table: None,
            commands: None,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Bring the engine up and return the render half.
    ///
    /// The renderer starts on the configured mode's default table (a sine
    /// for the pose-driven mode).
    pub fn start(&mut self) -> Result<Renderer, EngineError> {
        if self.commands.is_some() {
            warn!("audio engine already started");
            return Err(EngineError::AlreadyStarted);
        }
        let (tx, rx) = bounded(self.config.queue_capacity);
        let mode = self.scheduler.mode();
        self.scheduler.enter(mode);
        let renderer = Renderer::new(rx, &self.config, mode, self.frequency, &self.params, self.spectrum);
        self.commands = Some(tx);
        info!(
            sample_rate = self.config.sample_rate,
            frequency = self.frequency,
            ?mode,
            "audio engine started"
        );
        Ok(renderer)
    }

    /// Silence and release every voice. The renderer applies the teardown
    /// in one step at its next quantum and outputs silence from then on.
    pub fn stop(&mut self) {
        if let Some(tx) = self.commands.take() {
            // If the queue is full the disconnect below has the same effect.
            let _ = tx.try_send(Command::Shutdown);
            info!("audio engine stopped");
        }
    }

    pub fn is_started(&self) -> bool {
        self.commands.is_some()
    }

    /// Fire any label flips that have come due on the control clock.
    pub fn poll(&mut self) {
        let fired = self.scheduler.poll(self.clock.now());
        if fired > 0 {
            debug!(active = ?self.scheduler.active(), "crossfade label flipped");
        }
    }

    fn send(&self, command: Command) -> Result<(), EngineError> {
        let Some(tx) = &self.commands else {
            return Err(EngineError::NotStarted);
        };
        tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(c) => EngineError::QueueFull { command: c.name() },
            TrySendError::Disconnected(_) => EngineError::RendererGone,
        })
    }

    fn ensure_started(&self, what: &str) -> bool {
        if self.is_started() {
            true
        } else {
            warn!("audio engine not started, skipping {what}");
            false
        }
    }

    /// Set the shared oscillator frequency (Hz, clamped to [1, Nyquist]).
    pub fn set_frequency(&mut self, hz: f64) {
        self.poll();
        if !self.ensure_started("frequency change") {
            return;
        }
        let hz = clamp_frequency(hz, self.config.sample_rate);
        match self.send(Command::Frequency(hz)) {
            Ok(()) => self.frequency = hz,
            Err(e) => warn!(error = %e, "frequency change dropped"),
        }
    }

    fn update_effects(&mut self, what: &str, change: impl FnOnce(&mut EffectParams)) {
        self.poll();
        if !self.ensure_started(what) {
            return;
        }
        let mut next = self.params;
        change(&mut next);
        if next == self.params {
            return;
        }
        match self.send(Command::Effects(next)) {
            Ok(()) => self.params = next,
            Err(e) => warn!(error = %e, "{what} dropped"),
        }
    }

    pub fn set_distortion(&mut self, drive: f64) {
        self.update_effects("distortion change", |p| p.set_distortion(drive));
    }

    pub fn set_saturation(&mut self, amount: f64) {
        self.update_effects("saturation change", |p| p.set_saturation(amount));
    }

    pub fn set_eq(&mut self, low_db: f64, mid_db: f64, high_db: f64) {
        self.update_effects("eq change", |p| p.set_eq(low_db, mid_db, high_db));
    }

    pub fn set_reverb(&mut self, size: f64, strength: f64) {
        self.update_effects("reverb change", |p| p.set_reverb(size, strength));
    }

    pub fn set_volume(&mut self, db: f64) {
        self.update_effects("volume change", |p| p.set_volume(db));
    }

    /// Switch between the dual-voice and single-voice sets.
    ///
    /// The outgoing set is silenced and the incoming one starts at full gain
    /// with the most recent spectrum, in the same render quantum. Any
    /// crossfade in flight is abandoned. Switching to the current mode does
    /// nothing.
    pub fn set_mode(&mut self, mode: VoiceMode) -> Result<(), EngineError> {
        self.poll();
        if !self.ensure_started("mode switch") {
            return Err(EngineError::NotStarted);
        }
        if mode == self.scheduler.mode() {
            return Ok(());
        }
        self.switch_mode(mode, self.spectrum)
    }

    fn switch_mode(&mut self, mode: VoiceMode, spectrum: PartialSpectrum) -> Result<(), EngineError> {
        let command = match mode {
            VoiceMode::PoseDriven => Command::EnterPoseDriven { spectrum },
            VoiceMode::Static => Command::EnterStatic { spectrum },
        };
        self.send(command).inspect_err(|e| error!(error = %e, ?mode, "mode switch failed"))?;
        self.scheduler.enter(mode);
        info!(?mode, "voice mode switched");
        Ok(())
    }

    /// Push a new wave table.
    ///
    /// In pose-driven mode the silent voice is rebuilt with the table's
    /// spectrum and a crossfade begins; in static mode the single voice is
    /// rebuilt at once. A table for the other mode switches mode first.
    ///
    /// On error nothing audible changes.
    pub fn update_wave(&mut self, table: Arc<WaveTable>, mode: VoiceMode) -> Result<(), EngineError> {
        self.poll();
        if !self.ensure_started("waveform update") {
            return Err(EngineError::NotStarted);
        }

        let spectrum = analyze(&table, self.config.partials);

        if mode != self.scheduler.mode() {
            self.switch_mode(mode, spectrum)?;
        } else {
            match mode {
                VoiceMode::PoseDriven => self.crossfade(spectrum)?,
                VoiceMode::Static => {
                    self.send(Command::Replace { spectrum })
                        .inspect_err(|e| error!(error = %e, "waveform update failed"))?;
                    debug!("static voice rebuilt");
                }
            }
        }

        self.spectrum = spectrum;
        self.latest_table = Some(table);
        Ok(())
    }

    fn crossfade(&mut self, spectrum: PartialSpectrum) -> Result<(), EngineError> {
        let plan = self.scheduler.plan();
        if self.scheduler.pending_flips() > 0 {
            warn!(
                voice = ?plan.rebuild,
                "crossfade still running, rebuilding the voice that is fading in"
            );
        }
        self.send(Command::Crossfade {
            rebuild: plan.rebuild,
            fade_out: plan.fade_out,
            spectrum,
            samples: self.config.crossfade_samples(),
        })
        .inspect_err(|e| error!(error = %e, "crossfade failed, keeping current voice"))?;
        self.scheduler.commit(plan, self.clock.now());
        debug!(rebuild = ?plan.rebuild, fade_out = ?plan.fade_out, "crossfade started");
        Ok(())
    }

    /// Most recent table accepted by `update_wave`, for visualisation.
    pub fn latest_table(&self) -> Option<Arc<WaveTable>> {
        self.latest_table.clone()
    }

    /// Voice the control side believes is audible. Only approximate while
    /// a crossfade is running.
    pub fn active_voice(&self) -> VoiceId {
        match self.scheduler.mode() {
            VoiceMode::PoseDriven => self.scheduler.active().voice(),
            VoiceMode::Static => VoiceId::Single,
        }
    }

    pub fn active_label(&self) -> Label {
        self.scheduler.active()
    }

    pub fn mode(&self) -> VoiceMode {
        self.scheduler.mode()
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn effect_params(&self) -> &EffectParams {
        &self.params
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The render half: owns every voice and effect unit.
pub struct Renderer {
    commands: Receiver<Command>,
    voices: VoiceBank,
    effects: EffectsChain,
    mode: VoiceMode,
    running: bool,
    last_rebuild: Option<Rebuild>,
}

impl Renderer {
    fn new(
        commands: Receiver<Command>,
        config: &EngineConfig,
        mode: VoiceMode,
        frequency: f64,
        params: &EffectParams,
        spectrum: PartialSpectrum,
    ) -> Self {
        let mut renderer = Renderer {
            commands,
            voices: VoiceBank::new(config.sample_rate, frequency),
            effects: EffectsChain::new(config.sample_rate, params),
            mode,
            running: true,
            last_rebuild: None,
        };
        renderer.enter(mode, spectrum);
        renderer
    }

    /// Render one quantum into separate left/right buffers.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.drain_commands();
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.next_frame();
        }
    }

    /// Render one quantum of interleaved stereo frames.
    pub fn render_interleaved(&mut self, out: &mut [f32]) {
        self.drain_commands();
        for frame in out.chunks_exact_mut(2) {
            let (l, r) = self.next_frame();
            frame[0] = l;
            frame[1] = r;
        }
    }

    #[inline]
    fn next_frame(&mut self) -> (f32, f32) {
        if !self.running {
            return (0.0, 0.0);
        }
        let source = self.voices.next_sample();
        self.effects.process(source)
    }

    fn drain_commands(&mut self) {
        loop {
            match self.commands.try_recv() {
                Ok(command) => self.apply(command),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.shutdown();
                    break;
                }
            }
        }
    }

    fn apply(&mut self, command: Command) {
        if !self.running {
            return;
        }
        match command {
            Command::Frequency(hz) => self.voices.set_frequency(hz),
            Command::Effects(params) => self.effects.apply(&params),
            Command::EnterPoseDriven { spectrum } => self.enter(VoiceMode::PoseDriven, spectrum),
            Command::EnterStatic { spectrum } => self.enter(VoiceMode::Static, spectrum),
            Command::Crossfade {
                rebuild,
                fade_out,
                spectrum,
                samples,
            } => {
                if self.mode != VoiceMode::PoseDriven {
                    return;
                }
                let target = self.voices.voice_mut(rebuild);
                self.last_rebuild = Some(target.replace_spectrum(rebuild, spectrum));
                target.gain.ramp_to_db(0.0, samples);
                self.voices.voice_mut(fade_out).gain.ramp_to_db(SILENCE_DB, samples);
            }
            Command::Replace { spectrum } => {
                if self.mode != VoiceMode::Static {
                    return;
                }
                let single = self.voices.voice_mut(VoiceId::Single);
                self.last_rebuild = Some(single.replace_spectrum(VoiceId::Single, spectrum));
            }
            Command::Shutdown => self.shutdown(),
        }
    }

    /// Tear down the current voice set and bring up the set for `mode`.
    fn enter(&mut self, mode: VoiceMode, spectrum: PartialSpectrum) {
        self.voices.stop_all();
        let lead = match mode {
            VoiceMode::PoseDriven => {
                // B idles silently, ready to take the next spectrum.
                self.voices.voice_mut(VoiceId::B).start();
                VoiceId::A
            }
            VoiceMode::Static => VoiceId::Single,
        };
        let voice = self.voices.voice_mut(lead);
        voice.replace_spectrum(lead, spectrum);
        voice.gain.set_db(0.0);
        voice.start();
        self.mode = mode;
    }

    fn shutdown(&mut self) {
        if self.running {
            self.voices.stop_all();
            self.effects.reset();
            self.running = false;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> VoiceMode {
        self.mode
    }

    /// Current gain of a voice in dB (−∞ when silent or stopped).
    pub fn voice_gain_db(&self, id: VoiceId) -> f64 {
        let voice = self.voices.voice(id);
        if voice.is_running() {
            voice.gain.value_db()
        } else {
            SILENCE_DB
        }
    }

    pub fn voice_spectrum(&self, id: VoiceId) -> &PartialSpectrum {
        self.voices.voice(id).oscillator.spectrum()
    }

    pub fn audible_voices(&self) -> usize {
        self.voices.audible_count()
    }

    /// State of the most recently rebuilt voice at the instant of rebuild.
    pub fn last_rebuild(&self) -> Option<Rebuild> {
        self.last_rebuild
    }

    pub fn effect_params(&self) -> &EffectParams {
        self.effects.params()
    }
}

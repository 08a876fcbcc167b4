//! Control-side crossfade scheduler for the dual-voice mode.
//!
//! Tracks which of the two pose-driven voices is labelled active and owns
//! the deferred label flips. A flip fires on the control clock, `fade` after
//! its crossfade began, independently of where the render side's gain ramp
//! actually is. Mid-crossfade the label is an approximation of what is
//! audible, not a guarantee.
//!
//! A second update that lands before the first flip fires sees the old
//! labels and therefore rebuilds the voice that is already fading in. The
//! spectrum that voice was fading towards is discarded, not queued.

use std::collections::VecDeque;
use std::time::Duration;

use crate::waveform::WaveformMode;

use super::voice::VoiceId;

/// Operating mode of the voice set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceMode {
    /// Two voices, spectrum swaps crossfade.
    PoseDriven,
    /// One voice, spectrum swaps are immediate.
    Static,
}

impl From<WaveformMode> for VoiceMode {
    fn from(mode: WaveformMode) -> Self {
        if mode.is_pose_driven() {
            VoiceMode::PoseDriven
        } else {
            VoiceMode::Static
        }
    }
}

/// Label of one of the crossfading pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    A,
    B,
}

impl Label {
    pub fn other(self) -> Label {
        match self {
            Label::A => Label::B,
            Label::B => Label::A,
        }
    }

    pub fn voice(self) -> VoiceId {
        match self {
            Label::A => VoiceId::A,
            Label::B => VoiceId::B,
        }
    }
}

/// What a crossfade will do: rebuild one voice, fade the other out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossfadePlan {
    pub rebuild: VoiceId,
    pub fade_out: VoiceId,
    flip_to: Label,
}

#[derive(Debug, Clone, Copy)]
struct PendingFlip {
    due: Duration,
    to: Label,
}

#[derive(Debug)]
pub struct CrossfadeScheduler {
    mode: VoiceMode,
    active: Label,
    pending: VecDeque<PendingFlip>,
    fade: Duration,
}

impl CrossfadeScheduler {
    pub fn new(mode: VoiceMode, fade: Duration) -> Self {
        CrossfadeScheduler {
            mode,
            active: Label::A,
            pending: VecDeque::new(),
            fade,
        }
    }

    pub fn mode(&self) -> VoiceMode {
        self.mode
    }

    pub fn fade(&self) -> Duration {
        self.fade
    }

    /// Label currently considered audible.
    pub fn active(&self) -> Label {
        self.active
    }

    pub fn inactive(&self) -> Label {
        self.active.other()
    }

    pub fn pending_flips(&self) -> usize {
        self.pending.len()
    }

    /// Fire every flip that is due at `now`. Returns how many fired.
    pub fn poll(&mut self, now: Duration) -> usize {
        let mut fired = 0;
        while let Some(flip) = self.pending.front().copied() {
            if flip.due > now {
                break;
            }
            self.pending.pop_front();
            self.active = flip.to;
            fired += 1;
        }
        fired
    }

    /// Plan a crossfade against the labels as they stand right now.
    pub fn plan(&self) -> CrossfadePlan {
        let target = self.inactive();
        CrossfadePlan {
            rebuild: target.voice(),
            fade_out: self.active.voice(),
            flip_to: target,
        }
    }

    /// Record that a planned crossfade started at `now`.
    pub fn commit(&mut self, plan: CrossfadePlan, now: Duration) {
        self.pending.push_back(PendingFlip {
            due: now + self.fade,
            to: plan.flip_to,
        });
    }

    /// Switch mode: labels reset to A active, pending flips are dropped.
    pub fn enter(&mut self, mode: VoiceMode) {
        self.mode = mode;
        self.active = Label::A;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FADE: Duration = Duration::from_secs(5);

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn first_update_rebuilds_b() {
        let s = CrossfadeScheduler::new(VoiceMode::PoseDriven, FADE);
        let plan = s.plan();
        assert_eq!(plan.rebuild, VoiceId::B);
        assert_eq!(plan.fade_out, VoiceId::A);
    }

    #[test]
    fn flip_fires_after_fade() {
        let mut s = CrossfadeScheduler::new(VoiceMode::PoseDriven, FADE);
        s.commit(s.plan(), secs(1.0));
        assert_eq!(s.poll(secs(5.9)), 0);
        assert_eq!(s.active(), Label::A);
        assert_eq!(s.poll(secs(6.0)), 1);
        assert_eq!(s.active(), Label::B);
        assert_eq!(s.plan().rebuild, VoiceId::A);
    }

    #[test]
    fn early_second_update_reuses_fading_in_voice() {
        let mut s = CrossfadeScheduler::new(VoiceMode::PoseDriven, FADE);
        s.commit(s.plan(), secs(0.0));
        s.poll(secs(2.0));
        // flip not fired yet, so B is still the rebuild target
        let second = s.plan();
        assert_eq!(second.rebuild, VoiceId::B);
        s.commit(second, secs(2.0));
        assert_eq!(s.pending_flips(), 2);
        s.poll(secs(5.0));
        assert_eq!(s.active(), Label::B);
        s.poll(secs(7.0));
        assert_eq!(s.active(), Label::B);
        assert_eq!(s.pending_flips(), 0);
    }

    #[test]
    fn entering_mode_discards_flips() {
        let mut s = CrossfadeScheduler::new(VoiceMode::PoseDriven, FADE);
        s.commit(s.plan(), secs(0.0));
        s.enter(VoiceMode::Static);
        assert_eq!(s.mode(), VoiceMode::Static);
        assert_eq!(s.pending_flips(), 0);
        s.poll(secs(10.0));
        assert_eq!(s.active(), Label::A);
    }

    #[test]
    fn waveform_mode_maps_to_voice_mode() {
        assert_eq!(VoiceMode::from(WaveformMode::Camera), VoiceMode::PoseDriven);
        assert_eq!(VoiceMode::from(WaveformMode::Sawtooth), VoiceMode::Static);
    }
}

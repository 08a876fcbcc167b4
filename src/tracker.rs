//! Wave table tracking: turns the selected mode and incoming poses into
//! tables for the engine.
//!
//! Static modes produce their table once, when selected. Camera mode
//! produces a table per pose, at most `update_rate_hz` times a second.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::dsp::crossfade::VoiceMode;
use crate::pose::Pose;
use crate::waveform::{WaveTable, WaveformMode, generate_waveform};

#[derive(Debug, Clone)]
pub struct WaveTableTracker {
    mode: WaveformMode,
    min_interval: Duration,
    last_emit: Option<Duration>,
    latest: Arc<WaveTable>,
}

impl WaveTableTracker {
    pub fn new(mode: WaveformMode, update_rate_hz: f64) -> Self {
        // Zero, negative or NaN rates disable the limit. Rates too slow for
        // a Duration allow a single table.
        let min_interval = if update_rate_hz > 0.0 {
            Duration::try_from_secs_f64(1.0 / update_rate_hz).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        WaveTableTracker {
            mode,
            min_interval,
            last_emit: None,
            latest: Arc::new(generate_waveform(mode)),
        }
    }

    pub fn mode(&self) -> WaveformMode {
        self.mode
    }

    pub fn voice_mode(&self) -> VoiceMode {
        self.mode.into()
    }

    /// Select a waveform mode. Returns the table to push when a static mode
    /// is selected; camera mode waits for the next pose.
    pub fn set_mode(&mut self, mode: WaveformMode) -> Option<Arc<WaveTable>> {
        if mode == self.mode {
            return None;
        }
        self.mode = mode;
        self.last_emit = None;
        debug!(?mode, "waveform mode selected");
        if mode.is_pose_driven() {
            return None;
        }
        self.latest = Arc::new(generate_waveform(mode));
        Some(self.latest.clone())
    }

    /// Offer a pose observed at `now`. Returns a new table if camera mode is
    /// selected and the rate limit allows one.
    pub fn on_pose(&mut self, pose: &Pose, now: Duration) -> Option<Arc<WaveTable>> {
        if !self.mode.is_pose_driven() {
            return None;
        }
        if self
            .last_emit
            .is_some_and(|last| now.saturating_sub(last) < self.min_interval)
        {
            return None;
        }
        self.last_emit = Some(now);
        self.latest = Arc::new(WaveTable::from_pose(pose));
        Some(self.latest.clone())
    }

    /// Most recent table produced, for visualisation.
    pub fn latest(&self) -> Arc<WaveTable> {
        self.latest.clone()
    }
}

//! Waveform tables — one period of a repeating signal, ready for analysis.
//!
//! Tables come from two places: the static generator (sine, sawtooth,
//! square) and the geometry processor, which bends six pose landmarks into a
//! closed, point-symmetric period.

pub mod generator;
pub mod geometry;

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::WaveTableError;
use crate::pose::Pose;

pub use generator::{StaticShape, static_waveform};
pub use geometry::{Point, geometry_samples, pose_polyline};

/// Number of samples in every wave table.
pub const TABLE_LEN: usize = 2048;

/// Peak magnitude of any table sample.
pub const TABLE_PEAK: f32 = 0.5;

/// Waveform selector exposed to the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformMode {
    /// Pose-driven: tables come from the camera landmarks.
    #[default]
    Camera,
    Sine,
    #[serde(rename = "saw")]
    Sawtooth,
    Square,
}

impl WaveformMode {
    /// Whether this mode is fed by pose data (and therefore crossfades).
    pub fn is_pose_driven(self) -> bool {
        self == WaveformMode::Camera
    }

    pub fn parse(s: &str) -> Option<WaveformMode> {
        match s {
            "camera" => Some(WaveformMode::Camera),
            "sine" => Some(WaveformMode::Sine),
            "saw" | "sawtooth" => Some(WaveformMode::Sawtooth),
            "square" => Some(WaveformMode::Square),
            _ => None,
        }
    }
}

/// A fixed-length, immutable table of `TABLE_LEN` samples in [-0.5, 0.5].
#[derive(Debug, Clone, PartialEq)]
pub struct WaveTable {
    samples: Box<[f32]>,
}

impl WaveTable {
    /// Validate and take ownership of raw samples.
    ///
    /// The length must be exactly `TABLE_LEN` and every sample finite.
    /// Samples outside [-0.5, 0.5] are clamped.
    pub fn from_samples(samples: Vec<f32>) -> Result<WaveTable, WaveTableError> {
        if samples.len() != TABLE_LEN {
            return Err(WaveTableError::WrongLength {
                expected: TABLE_LEN,
                found: samples.len(),
            });
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(WaveTableError::NonFinite { index });
        }
        Ok(WaveTable::clamped(samples))
    }

    /// Build from generator output that is already the right length.
    fn clamped(mut samples: Vec<f32>) -> WaveTable {
        debug_assert_eq!(samples.len(), TABLE_LEN);
        for s in samples.iter_mut() {
            *s = s.clamp(-TABLE_PEAK, TABLE_PEAK);
        }
        WaveTable {
            samples: samples.into_boxed_slice(),
        }
    }

    /// The default table: a pure sine.
    pub fn sine() -> WaveTable {
        WaveTable::from_shape(StaticShape::Sine)
    }

    pub fn from_shape(shape: StaticShape) -> WaveTable {
        WaveTable::clamped(static_waveform(shape, TABLE_LEN))
    }

    /// Convert a pose into a table, falling back to a sine when fewer
    /// than six landmarks are present.
    pub fn from_pose(pose: &Pose) -> WaveTable {
        WaveTable::from_points(&pose.ordered_points())
    }

    /// Convert raw landmark points into a table (sine fallback unless
    /// exactly six points are given).
    pub fn from_points(points: &[(f64, f64)]) -> WaveTable {
        WaveTable::clamped(geometry_samples(points, TABLE_LEN))
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.samples.to_vec()
    }
}

impl Deref for WaveTable {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.samples
    }
}

/// Table for a waveform mode. Camera mode yields the default sine until
/// pose data arrives.
pub fn generate_waveform(mode: WaveformMode) -> WaveTable {
    match mode {
        WaveformMode::Sine | WaveformMode::Camera => WaveTable::sine(),
        WaveformMode::Sawtooth => WaveTable::from_shape(StaticShape::Sawtooth),
        WaveformMode::Square => WaveTable::from_shape(StaticShape::Square),
    }
}

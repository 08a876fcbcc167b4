//! Pose input types — the per-frame data supplied by the pose estimator.
//!
//! The estimator itself lives outside this crate. It hands over up to six
//! landmarks per frame; confidence filtering has already happened upstream,
//! so the core only cares whether each landmark is present.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The six upper-body landmarks that shape the waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    LeftShoulder,
    LeftElbow,
    LeftWrist,
    RightWrist,
    RightElbow,
    RightShoulder,
}

impl Landmark {
    /// Lookup order used when collecting points for the waveform.
    ///
    /// This order only decides which keypoints are gathered. The geometry
    /// processor re-sorts the points by x, so the drawn shape is determined
    /// by where the joints are, not by this list.
    pub const ORDER: [Landmark; 6] = [
        Landmark::LeftShoulder,
        Landmark::LeftElbow,
        Landmark::LeftWrist,
        Landmark::RightWrist,
        Landmark::RightElbow,
        Landmark::RightShoulder,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Landmark::LeftShoulder => "left_shoulder",
            Landmark::LeftElbow => "left_elbow",
            Landmark::LeftWrist => "left_wrist",
            Landmark::RightWrist => "right_wrist",
            Landmark::RightElbow => "right_elbow",
            Landmark::RightShoulder => "right_shoulder",
        }
    }

    pub fn from_name(name: &str) -> Option<Landmark> {
        Landmark::ORDER.into_iter().find(|l| l.name() == name)
    }
}

/// A normalized 2D position with the estimator's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_score")]
    pub score: f64,
}

fn default_score() -> f64 {
    1.0
}

impl Keypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Keypoint { x, y, score: 1.0 }
    }
}

/// One frame of pose data. Absent landmarks are simply missing from the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub keypoints: HashMap<Landmark, Keypoint>,
}

impl Pose {
    pub fn new() -> Self {
        Pose::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, landmark: Landmark, keypoint: Keypoint) -> Self {
        self.keypoints.insert(landmark, keypoint);
        self
    }

    pub fn get(&self, landmark: Landmark) -> Option<&Keypoint> {
        self.keypoints.get(&landmark)
    }

    /// Points present for the six landmarks, gathered in `Landmark::ORDER`.
    pub fn ordered_points(&self) -> Vec<(f64, f64)> {
        Landmark::ORDER
            .iter()
            .filter_map(|l| self.keypoints.get(l))
            .map(|kp| (kp.x, kp.y))
            .collect()
    }
}

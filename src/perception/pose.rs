//! Gaze and lean from body landmarks. Estimator backends that produce landmarks
//! (normalized image coordinates) reduce them to a `PoseReading` here.

use super::{GazeState, PoseReading};
use serde::{Deserialize, Serialize};

/// Head yaw magnitude above which gaze counts as sideways.
pub const DEFAULT_YAW_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyLandmarks {
    pub nose: Option<Landmark>,
    pub left_ear: Option<Landmark>,
    pub right_ear: Option<Landmark>,
    pub left_shoulder: Option<Landmark>,
    pub right_shoulder: Option<Landmark>,
}

impl BodyLandmarks {
    /// Ear midpoint minus nose, horizontally. Near zero when facing the camera.
    pub fn head_yaw(&self) -> Option<f64> {
        let (nose, l, r) = (self.nose?, self.left_ear?, self.right_ear?);
        Some((l.x + r.x) / 2.0 - nose.x)
    }

    /// Vertical shoulder asymmetry.
    pub fn lean_score(&self) -> Option<f64> {
        let (l, r) = (self.left_shoulder?, self.right_shoulder?);
        Some((l.y - r.y).abs())
    }

    pub fn to_reading(&self, yaw_threshold: f64) -> PoseReading {
        let gaze_state = match self.head_yaw() {
            Some(yaw) if yaw.abs() > yaw_threshold => GazeState::Sideways,
            Some(_) => GazeState::Center,
            None => GazeState::Unknown,
        };
        PoseReading {
            gaze_state,
            lean_score: self.lean_score(),
        }
    }
}

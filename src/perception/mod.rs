//! Boundary to the perception producers: identity resolution, prohibited-object
//! detection and pose/gaze estimation. Each producer sees one frame at a time and
//! knows nothing about history or the other producers.

mod fallback;
mod labels;
mod pose;
mod registry;

pub use fallback::FallbackResolver;
pub use labels::ProhibitedFilter;
pub use pose::{BodyLandmarks, Landmark, DEFAULT_YAW_THRESHOLD};
pub use registry::{ReferenceRegistry, DEFAULT_MATCH_TOLERANCE};

use crate::error::ProducerError;
use crate::frame::Frame;
use serde::{Deserialize, Serialize};

/// Identity token used when no enrolled student could be attributed.
pub const UNKNOWN_STUDENT: &str = "unknown";

/// Pixel box in (top, right, bottom, left) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Region {
    pub fn full(frame: &Frame) -> Self {
        Self {
            top: 0,
            right: frame.width(),
            bottom: frame.height(),
            left: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    Student(String),
    Unknown,
}

impl Identity {
    pub fn as_str(&self) -> &str {
        match self {
            Identity::Student(id) => id,
            Identity::Unknown => UNKNOWN_STUDENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFace {
    pub region: Region,
    pub identity: Identity,
}

/// Detector box in (x1, y1, x2, y2) corner order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GazeState {
    Center,
    Sideways,
    #[default]
    Unknown,
}

/// Pose/gaze estimate for one frame. `lean_score` is absent when no pose was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseReading {
    pub gaze_state: GazeState,
    pub lean_score: Option<f64>,
}

pub trait IdentityResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Faces found in the frame with their resolved identity. Empty when no one is visible.
    fn identify(&self, frame: &Frame) -> Result<Vec<ResolvedFace>, ProducerError>;

    /// Register a reference image for a student.
    fn enroll(&self, _student_id: &str, _reference: &Frame) -> Result<(), ProducerError> {
        Err(ProducerError::Unavailable {
            producer: self.name(),
            reason: "enrollment not supported".into(),
        })
    }
}

pub trait ObjectDetector: Send + Sync {
    fn name(&self) -> &'static str;
    fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, ProducerError>;
}

pub trait PoseEstimator: Send + Sync {
    fn name(&self) -> &'static str;
    fn analyze(&self, frame: &Frame) -> Result<PoseReading, ProducerError>;
}

/// Placeholder for a producer with no backend wired in. Every call reports
/// `Unavailable`, which the orchestrator degrades to an empty signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl Unconfigured {
    fn unavailable(producer: &'static str) -> ProducerError {
        ProducerError::Unavailable {
            producer,
            reason: "no backend configured".into(),
        }
    }
}

impl IdentityResolver for Unconfigured {
    fn name(&self) -> &'static str {
        "unconfigured-identity"
    }

    fn identify(&self, _frame: &Frame) -> Result<Vec<ResolvedFace>, ProducerError> {
        Err(Self::unavailable(IdentityResolver::name(self)))
    }
}

impl ObjectDetector for Unconfigured {
    fn name(&self) -> &'static str {
        "unconfigured-detector"
    }

    fn detect(&self, _frame: &Frame) -> Result<Vec<Detection>, ProducerError> {
        Err(Self::unavailable(ObjectDetector::name(self)))
    }
}

impl PoseEstimator for Unconfigured {
    fn name(&self) -> &'static str {
        "unconfigured-pose"
    }

    fn analyze(&self, _frame: &Frame) -> Result<PoseReading, ProducerError> {
        Err(Self::unavailable(PoseEstimator::name(self)))
    }
}

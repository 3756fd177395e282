//! Temporal risk fusion: per-event weighted score, per-student sliding window,
//! tier classification of the window mean.

mod engine;
mod score;
mod window;

pub use engine::{FusionEngine, RiskVerdict, StudentRiskSnapshot};
pub use score::score_event;
pub use window::{RiskWindow, WindowEntry};

use crate::config::TierCutpoints;
use crate::error::FusionError;
use crate::perception::GazeState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Longest accepted student identity token.
pub const MAX_STUDENT_ID_LEN: usize = 128;

/// One (student, frame) observation handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskInputEvent {
    pub student_id: String,
    pub detected_labels: BTreeSet<String>,
    pub gaze_state: GazeState,
    pub lean_score: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl RiskInputEvent {
    /// Clean event: no labels, unknown gaze, no pose.
    pub fn new(student_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            student_id: student_id.into(),
            detected_labels: BTreeSet::new(),
            gaze_state: GazeState::Unknown,
            lean_score: None,
            timestamp,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.detected_labels.insert(label.into());
        self
    }

    pub fn with_gaze(mut self, gaze: GazeState) -> Self {
        self.gaze_state = gaze;
        self
    }

    pub fn with_lean(mut self, lean: f64) -> Self {
        self.lean_score = Some(lean);
        self
    }
}

/// Severity tiers, ordered least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    #[serde(rename = "Normal")]
    Normal,
    #[serde(rename = "Mildly Suspicious")]
    MildlySuspicious,
    #[serde(rename = "High Risk")]
    HighRisk,
    #[serde(rename = "Malpractice Confirmed")]
    MalpracticeConfirmed,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Normal => "Normal",
            RiskTier::MildlySuspicious => "Mildly Suspicious",
            RiskTier::HighRisk => "High Risk",
            RiskTier::MalpracticeConfirmed => "Malpractice Confirmed",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TierCutpoints {
    /// Strict comparisons, highest tier first.
    pub fn classify(&self, score: f64) -> RiskTier {
        if score > self.confirmed {
            RiskTier::MalpracticeConfirmed
        } else if score > self.high {
            RiskTier::HighRisk
        } else if score > self.mild {
            RiskTier::MildlySuspicious
        } else {
            RiskTier::Normal
        }
    }
}

/// Non-empty, not all whitespace, no control characters, bounded length.
pub fn validate_identity(student_id: &str) -> Result<(), FusionError> {
    let ok = !student_id.trim().is_empty()
        && student_id.len() <= MAX_STUDENT_ID_LEN
        && !student_id.chars().any(char::is_control);
    if ok {
        Ok(())
    } else {
        Err(FusionError::InvalidIdentity(student_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutpoints_are_strict() {
        let t = TierCutpoints::default();
        assert_eq!(t.classify(0.0), RiskTier::Normal);
        assert_eq!(t.classify(0.1), RiskTier::Normal);
        assert_eq!(t.classify(0.1001), RiskTier::MildlySuspicious);
        assert_eq!(t.classify(0.4), RiskTier::MildlySuspicious);
        assert_eq!(t.classify(0.41), RiskTier::HighRisk);
        assert_eq!(t.classify(0.7), RiskTier::HighRisk);
        assert_eq!(t.classify(0.71), RiskTier::MalpracticeConfirmed);
        assert_eq!(t.classify(3.5), RiskTier::MalpracticeConfirmed);
    }

    #[test]
    fn tier_serializes_as_display_label() {
        let json = serde_json::to_string(&RiskTier::MalpracticeConfirmed).unwrap();
        assert_eq!(json, "\"Malpractice Confirmed\"");
        let back: RiskTier = serde_json::from_str("\"High Risk\"").unwrap();
        assert_eq!(back, RiskTier::HighRisk);
        assert!(RiskTier::Normal < RiskTier::MildlySuspicious);
        assert!(RiskTier::HighRisk < RiskTier::MalpracticeConfirmed);
    }

    #[test]
    fn identity_validation() {
        assert!(validate_identity("student_101").is_ok());
        assert!(validate_identity("unknown").is_ok());
        assert!(validate_identity("").is_err());
        assert!(validate_identity("   ").is_err());
        assert!(validate_identity("bad\nid").is_err());
        assert!(validate_identity(&"x".repeat(MAX_STUDENT_ID_LEN + 1)).is_err());
    }
}

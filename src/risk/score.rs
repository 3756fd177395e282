//! Instantaneous score of a single event, independent of history.

use super::RiskInputEvent;
use crate::config::{FusionConfig, LabelConfig};
use crate::perception::GazeState;

fn any_label_contains(event: &RiskInputEvent, tokens: &[String]) -> bool {
    event
        .detected_labels
        .iter()
        .any(|label| tokens.iter().any(|t| label.contains(t.as_str())))
}

/// Sum of the weights of every signal that fired. Each signal counts once per
/// event no matter how many labels match it; phone and chit stack.
pub fn score_event(event: &RiskInputEvent, fusion: &FusionConfig, labels: &LabelConfig) -> f64 {
    let w = &fusion.weights;
    let mut score = 0.0;
    if any_label_contains(event, &labels.phone_tokens) {
        score += w.phone;
    }
    if any_label_contains(event, &labels.chit_tokens) {
        score += w.chit;
    }
    if event.gaze_state == GazeState::Sideways {
        score += w.gaze;
    }
    if event.lean_score.is_some_and(|lean| lean > fusion.lean_threshold) {
        score += w.pose;
    }
    score
}

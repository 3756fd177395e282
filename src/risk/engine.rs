//! Per-student fusion state. Each student's window sits behind its own mutex, so
//! updates for different students never wait on each other and concurrent
//! updates for one student serialize append + evict + mean as a unit.

use super::{score_event, validate_identity, RiskInputEvent, RiskTier, RiskWindow, WindowEntry};
use crate::config::{FusionConfig, LabelConfig};
use crate::error::FusionError;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of recording one event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskVerdict {
    pub tier: RiskTier,
    /// Mean of the window after this event was appended
    pub score: f64,
    /// Score of this event alone
    pub instantaneous: f64,
    pub window_len: usize,
}

/// Read-only copy of one student's window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRiskSnapshot {
    pub student_id: String,
    pub entries: Vec<WindowEntry>,
    pub aggregate_score: f64,
    pub tier: RiskTier,
}

type Slot = Arc<Mutex<RiskWindow>>;

pub struct FusionEngine {
    fusion: FusionConfig,
    labels: LabelConfig,
    students: DashMap<String, Slot>,
}

impl FusionEngine {
    pub fn new(fusion: FusionConfig, labels: LabelConfig) -> Self {
        Self {
            fusion,
            labels,
            students: DashMap::new(),
        }
    }

    /// Score the event, append it to the student's window (evicting the oldest
    /// entry at capacity) and classify the new window mean.
    ///
    /// Rejected events leave every window untouched.
    pub fn record_and_classify(&self, event: &RiskInputEvent) -> Result<RiskVerdict, FusionError> {
        validate_identity(&event.student_id)?;
        if let Some(lean) = event.lean_score {
            if !lean.is_finite() || lean < 0.0 {
                return Err(FusionError::InvalidSignal {
                    student_id: event.student_id.clone(),
                    reason: format!("lean_score {lean} must be finite and >= 0"),
                });
            }
        }

        let instantaneous = score_event(event, &self.fusion, &self.labels);
        let slot = self.slot(&event.student_id);
        let (score, window_len) = {
            let mut window = slot.lock();
            window.push(event.timestamp, instantaneous);
            (window.mean(), window.len())
        };
        let tier = self.classify(score);

        if tier == RiskTier::Normal {
            debug!(student_id = %event.student_id, instantaneous, score, window_len, "risk recorded");
        } else {
            info!(student_id = %event.student_id, instantaneous, score, window_len, tier = %tier, "elevated risk");
        }

        Ok(RiskVerdict {
            tier,
            score,
            instantaneous,
            window_len,
        })
    }

    /// Pure function of the score.
    pub fn classify(&self, score: f64) -> RiskTier {
        self.fusion.tiers.classify(score)
    }

    pub fn snapshot(&self, student_id: &str) -> Option<StudentRiskSnapshot> {
        let slot = self.students.get(student_id)?.value().clone();
        let window = slot.lock();
        let aggregate_score = window.mean();
        Some(StudentRiskSnapshot {
            student_id: student_id.to_string(),
            entries: window.entries().copied().collect(),
            aggregate_score,
            tier: self.classify(aggregate_score),
        })
    }

    pub fn tracked_students(&self) -> usize {
        self.students.len()
    }

    /// Drop a student's history at the end of their session. Returns whether any
    /// state existed. The engine never drops state on its own.
    pub fn end_session(&self, student_id: &str) -> bool {
        let removed = self.students.remove(student_id).is_some();
        if removed {
            info!(student_id, "session ended; risk history dropped");
        }
        removed
    }

    pub fn fusion_config(&self) -> &FusionConfig {
        &self.fusion
    }

    /// Shard locks are held only long enough to clone the slot handle.
    fn slot(&self, student_id: &str) -> Slot {
        if let Some(slot) = self.students.get(student_id) {
            return slot.value().clone();
        }
        let capacity = self.fusion.window_size;
        self.students
            .entry(student_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(RiskWindow::new(capacity))))
            .value()
            .clone()
    }
}

//! Frame analysis: one frame → identities + frame-global detections/pose → one
//! fusion event per identity.
//!
//! Producers run sequentially (identity, objects, pose) and each failure degrades
//! to an empty signal. Object and pose results are shared by every identity in
//! the frame; they are not spatially associated with faces.

use crate::error::{MonitorError, MonitorResult};
use crate::frame::Frame;
use crate::perception::{
    GazeState, IdentityResolver, ObjectDetector, PoseEstimator, PoseReading, ResolvedFace,
    UNKNOWN_STUDENT,
};
use crate::risk::{validate_identity, FusionEngine, RiskInputEvent, RiskTier, RiskVerdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info_span, warn};
use uuid::Uuid;

/// Per-student line of a frame report. Unscored entries (no resolved identity)
/// carry neither tier nor score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentReport {
    pub student_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_tier: Option<RiskTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub gaze_state: GazeState,
    pub detected_labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame_id: Uuid,
    pub camera_id: String,
    pub students: Vec<StudentReport>,
}

pub struct FrameAnalyzer {
    resolver: Arc<dyn IdentityResolver>,
    detector: Arc<dyn ObjectDetector>,
    pose: Arc<dyn PoseEstimator>,
    engine: Arc<FusionEngine>,
    max_frame_bytes: usize,
}

impl FrameAnalyzer {
    pub fn new(
        resolver: Arc<dyn IdentityResolver>,
        detector: Arc<dyn ObjectDetector>,
        pose: Arc<dyn PoseEstimator>,
        engine: Arc<FusionEngine>,
        max_frame_bytes: usize,
    ) -> Self {
        Self {
            resolver,
            detector,
            pose,
            engine,
            max_frame_bytes,
        }
    }

    pub fn engine(&self) -> &Arc<FusionEngine> {
        &self.engine
    }

    /// Decode then analyze. A frame that fails to decode is the only hard error.
    pub fn analyze_bytes(&self, bytes: &[u8], camera_id: &str) -> MonitorResult<FrameReport> {
        let frame = Frame::decode(bytes, self.max_frame_bytes)?;
        Ok(self.analyze(&frame, camera_id))
    }

    pub fn analyze(&self, frame: &Frame, camera_id: &str) -> FrameReport {
        let frame_id = Uuid::new_v4();
        let span = info_span!("analyze_frame", %frame_id, camera_id);
        let _guard = span.enter();

        let faces = self.identify(frame);
        let detections = match self.detector.detect(frame) {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "object detector failed; no detections for this frame");
                Vec::new()
            }
        };
        let pose = match self.pose.analyze(frame) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "pose estimator failed; no pose for this frame");
                PoseReading::default()
            }
        };
        let labels: BTreeSet<String> = detections.into_iter().map(|d| d.label).collect();

        let students = if faces.is_empty() {
            vec![StudentReport {
                student_id: UNKNOWN_STUDENT.to_string(),
                risk_tier: None,
                score: None,
                gaze_state: pose.gaze_state,
                detected_labels: labels.into_iter().collect(),
            }]
        } else {
            self.score_faces(frame, &faces, &labels, pose)
        };

        debug!(students = students.len(), "frame analyzed");
        FrameReport {
            frame_id,
            camera_id: camera_id.to_string(),
            students,
        }
    }

    /// Decode a reference image and register it with the identity resolver.
    pub fn enroll(&self, student_id: &str, reference: &[u8]) -> MonitorResult<()> {
        validate_identity(student_id)?;
        let frame = Frame::decode(reference, self.max_frame_bytes)?;
        self.resolver
            .enroll(student_id, &frame)
            .map_err(MonitorError::from)
    }

    fn identify(&self, frame: &Frame) -> Vec<ResolvedFace> {
        match self.resolver.identify(frame) {
            Ok(faces) => faces,
            Err(e) => {
                warn!(error = %e, "identity resolver failed; treating frame as unidentified");
                Vec::new()
            }
        }
    }

    /// Each identity commits independently; one rejection never stops the rest.
    fn score_faces(
        &self,
        frame: &Frame,
        faces: &[ResolvedFace],
        labels: &BTreeSet<String>,
        pose: PoseReading,
    ) -> Vec<StudentReport> {
        let mut out = Vec::with_capacity(faces.len());
        for face in faces {
            let student_id = face.identity.as_str();
            let event = RiskInputEvent {
                student_id: student_id.to_string(),
                detected_labels: labels.clone(),
                gaze_state: pose.gaze_state,
                lean_score: pose.lean_score,
                timestamp: frame.captured_at(),
            };
            match self.engine.record_and_classify(&event) {
                Ok(RiskVerdict { tier, score, .. }) => out.push(StudentReport {
                    student_id: student_id.to_string(),
                    risk_tier: Some(tier),
                    score: Some(score),
                    gaze_state: pose.gaze_state,
                    detected_labels: labels.iter().cloned().collect(),
                }),
                Err(e) => warn!(student_id, error = %e, "skipping student for this frame"),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FusionConfig, LabelConfig};
    use crate::error::ProducerError;
    use crate::perception::{BoundingBox, Detection, Identity, Region, Unconfigured};

    struct Faces(Vec<Identity>);

    impl IdentityResolver for Faces {
        fn name(&self) -> &'static str {
            "faces"
        }

        fn identify(&self, frame: &Frame) -> Result<Vec<ResolvedFace>, ProducerError> {
            Ok(self
                .0
                .iter()
                .map(|identity| ResolvedFace {
                    region: Region::full(frame),
                    identity: identity.clone(),
                })
                .collect())
        }
    }

    struct Labels(Vec<&'static str>);

    impl ObjectDetector for Labels {
        fn name(&self) -> &'static str {
            "labels"
        }

        fn detect(&self, _frame: &Frame) -> Result<Vec<Detection>, ProducerError> {
            Ok(self
                .0
                .iter()
                .map(|l| Detection {
                    label: l.to_string(),
                    confidence: 0.9,
                    bbox: BoundingBox { x1: 0, y1: 0, x2: 1, y2: 1 },
                })
                .collect())
        }
    }

    struct Pose(PoseReading);

    impl PoseEstimator for Pose {
        fn name(&self) -> &'static str {
            "pose"
        }

        fn analyze(&self, _frame: &Frame) -> Result<PoseReading, ProducerError> {
            Ok(self.0)
        }
    }

    fn analyzer(
        resolver: impl IdentityResolver + 'static,
        detector: impl ObjectDetector + 'static,
        pose: impl PoseEstimator + 'static,
    ) -> FrameAnalyzer {
        FrameAnalyzer::new(
            Arc::new(resolver),
            Arc::new(detector),
            Arc::new(pose),
            Arc::new(FusionEngine::new(FusionConfig::default(), LabelConfig::default())),
            1 << 20,
        )
    }

    fn student(id: &str) -> Identity {
        Identity::Student(id.to_string())
    }

    #[test]
    fn no_identities_yields_single_unscored_unknown() {
        let a = analyzer(
            Faces(vec![]),
            Labels(vec!["cell phone"]),
            Pose(PoseReading {
                gaze_state: GazeState::Sideways,
                lean_score: None,
            }),
        );
        let report = a.analyze(&Frame::blank(8, 8), "cam_01");
        assert_eq!(report.camera_id, "cam_01");
        assert_eq!(report.students.len(), 1);
        let s = &report.students[0];
        assert_eq!(s.student_id, UNKNOWN_STUDENT);
        assert!(s.risk_tier.is_none() && s.score.is_none());
        assert_eq!(s.gaze_state, GazeState::Sideways);
        assert_eq!(s.detected_labels, vec!["cell phone"]);
        assert_eq!(a.engine().tracked_students(), 0);
    }

    #[test]
    fn resolver_failure_degrades_to_unknown() {
        let a = analyzer(Unconfigured, Labels(vec![]), Pose(PoseReading::default()));
        let report = a.analyze(&Frame::blank(8, 8), "cam_01");
        assert_eq!(report.students.len(), 1);
        assert_eq!(report.students[0].student_id, UNKNOWN_STUDENT);
        assert_eq!(a.engine().tracked_students(), 0);
    }

    #[test]
    fn frame_global_signals_shared_by_every_identity() {
        let a = analyzer(
            Faces(vec![student("s1"), student("s2")]),
            Labels(vec!["cell phone"]),
            Pose(PoseReading::default()),
        );
        let report = a.analyze(&Frame::blank(8, 8), "cam_01");
        let ids: Vec<_> = report.students.iter().map(|s| s.student_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);
        for s in &report.students {
            assert_eq!(s.risk_tier, Some(RiskTier::MalpracticeConfirmed));
            assert_eq!(s.score, Some(1.0));
        }
    }

    #[test]
    fn invalid_identity_skipped_others_processed() {
        let a = analyzer(
            Faces(vec![student("s1"), student(""), student("s3")]),
            Labels(vec![]),
            Pose(PoseReading::default()),
        );
        let report = a.analyze(&Frame::blank(8, 8), "cam_01");
        let ids: Vec<_> = report.students.iter().map(|s| s.student_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s3"]);
        assert_eq!(a.engine().tracked_students(), 2);
    }

    #[test]
    fn invalid_lean_skips_whole_frame_for_scoring() {
        let a = analyzer(
            Faces(vec![student("s1")]),
            Labels(vec![]),
            Pose(PoseReading {
                gaze_state: GazeState::Center,
                lean_score: Some(f64::NAN),
            }),
        );
        assert!(a.analyze(&Frame::blank(8, 8), "cam").students.is_empty());
        assert_eq!(a.engine().tracked_students(), 0);
    }

    #[test]
    fn detector_and_pose_failures_leave_identity_scoring() {
        let a = analyzer(Faces(vec![student("s1")]), Unconfigured, Unconfigured);
        let report = a.analyze(&Frame::blank(8, 8), "cam_01");
        assert_eq!(report.students.len(), 1);
        let s = &report.students[0];
        assert_eq!(s.risk_tier, Some(RiskTier::Normal));
        assert_eq!(s.gaze_state, GazeState::Unknown);
        assert!(s.detected_labels.is_empty());
    }

    #[test]
    fn unmatched_face_scored_under_unknown() {
        let a = analyzer(Faces(vec![Identity::Unknown]), Labels(vec![]), Pose(PoseReading::default()));
        let report = a.analyze(&Frame::blank(8, 8), "cam_01");
        assert_eq!(report.students[0].student_id, UNKNOWN_STUDENT);
        assert!(report.students[0].risk_tier.is_some());
        assert!(a.engine().snapshot(UNKNOWN_STUDENT).is_some());
    }

    #[test]
    fn malformed_bytes_fail_request() {
        let a = analyzer(Faces(vec![student("s1")]), Labels(vec![]), Pose(PoseReading::default()));
        let err = a.analyze_bytes(b"nope", "cam_01").unwrap_err();
        assert!(matches!(err, MonitorError::Frame(_)));
        assert_eq!(a.engine().tracked_students(), 0);
    }

    #[test]
    fn unscored_report_omits_tier_and_score_in_json() {
        let report = StudentReport {
            student_id: UNKNOWN_STUDENT.into(),
            risk_tier: None,
            score: None,
            gaze_state: GazeState::Center,
            detected_labels: vec![],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("risk_tier").is_none());
        assert!(json.get("score").is_none());
        assert_eq!(json["gaze_state"], "Center");
    }
}

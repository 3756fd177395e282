//! JSON log lines: one JSON object per line (ndjson) for ingestion and review.

use crate::orchestrator::{FrameReport, StudentReport};
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// One student verdict from one frame, flattened for log pipelines.
#[derive(Serialize)]
pub struct VerdictLine<'a> {
    pub ts: String,
    pub camera_id: &'a str,
    pub frame_id: String,
    pub student_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_tier: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub gaze_state: crate::perception::GazeState,
    pub detected_labels: &'a [String],
}

impl<'a> VerdictLine<'a> {
    pub fn from_student(report: &'a FrameReport, student: &'a StudentReport) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339(),
            camera_id: &report.camera_id,
            frame_id: report.frame_id.to_string(),
            student_id: &student.student_id,
            risk_tier: student.risk_tier.map(|t| t.as_str()),
            score: student.score,
            gaze_state: student.gaze_state,
            detected_labels: &student.detected_labels,
        }
    }

    /// One line per student in the report.
    pub fn from_report(report: &'a FrameReport) -> Vec<Self> {
        report
            .students
            .iter()
            .map(|s| Self::from_student(report, s))
            .collect()
    }
}

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber: JSON lines (or plain text) to stdout, level from
    /// RUST_LOG or `default_level`. A second call is a no-op.
    pub fn init(json: bool, default_level: &str) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let result = if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stdout);
            tracing_subscriber::registry().with(filter).with(fmt).try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .try_init()
        };
        if result.is_err() {
            tracing::debug!("tracing subscriber already installed");
        }
    }

    /// Emit a single structured line without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(w, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::GazeState;
    use crate::risk::RiskTier;
    use uuid::Uuid;

    #[test]
    fn verdict_lines_are_ndjson() {
        let report = FrameReport {
            frame_id: Uuid::new_v4(),
            camera_id: "cam_01".into(),
            students: vec![
                StudentReport {
                    student_id: "s1".into(),
                    risk_tier: Some(RiskTier::HighRisk),
                    score: Some(0.5),
                    gaze_state: GazeState::Sideways,
                    detected_labels: vec!["paper".into()],
                },
                StudentReport {
                    student_id: "unknown".into(),
                    risk_tier: None,
                    score: None,
                    gaze_state: GazeState::Unknown,
                    detected_labels: vec![],
                },
            ],
        };
        let mut out = Vec::new();
        for line in VerdictLine::from_report(&report) {
            StructuredLogger::emit_json(&line, &mut out);
        }
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["risk_tier"], "High Risk");
        assert_eq!(lines[0]["camera_id"], "cam_01");
        assert!(lines[1].get("risk_tier").is_none());
    }
}

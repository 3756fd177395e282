//! Request handlers. Decoding and analysis are CPU-bound and run on the blocking
//! pool so concurrent cameras do not stall the reactor.

use super::{ApiError, ApiResult, AppState};
use crate::orchestrator::FrameReport;
use crate::risk::StudentRiskSnapshot;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Serialize)]
pub struct StatusResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    tracked_students: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollResponse {
    pub student_id: String,
    pub status: EnrollStatus,
}

struct Upload {
    text: String,
    file: Bytes,
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Pull one text field plus the `file` part out of a multipart form.
async fn read_upload(mut multipart: Multipart, text_field: &'static str) -> ApiResult<Upload> {
    let mut text = None;
    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == text_field {
            text = Some(field.text().await.map_err(multipart_error)?);
        } else if name == "file" {
            file = Some(field.bytes().await.map_err(multipart_error)?);
        }
    }
    let text = text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing form field `{text_field}`")))?;
    let file = file.ok_or_else(|| ApiError::BadRequest("missing form field `file`".into()))?;
    Ok(Upload { text, file })
}

pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "Monitoring System Active",
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        tracked_students: state.analyzer.engine().tracked_students(),
    })
}

pub async fn analyze_frame(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<FrameReport>> {
    let upload = read_upload(multipart, "camera_id").await?;
    let analyzer = Arc::clone(&state.analyzer);
    let report = tokio::task::spawn_blocking(move || {
        analyzer.analyze_bytes(&upload.file, &upload.text)
    })
    .await??;
    Ok(Json(report))
}

/// Producer rejections are reported as `Failed`; malformed input is a 400.
pub async fn enroll(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<EnrollResponse>> {
    let Upload { text: student_id, file } = read_upload(multipart, "student_id").await?;
    let analyzer = Arc::clone(&state.analyzer);
    let id = student_id.clone();
    let outcome = tokio::task::spawn_blocking(move || analyzer.enroll(&id, &file)).await?;
    let status = match outcome {
        Ok(()) => {
            info!(student_id = %student_id, "student enrolled");
            EnrollStatus::Success
        }
        Err(crate::error::MonitorError::Producer(e)) => {
            warn!(student_id = %student_id, error = %e, "enrollment failed");
            EnrollStatus::Failed
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Json(EnrollResponse { student_id, status }))
}

pub async fn student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> ApiResult<Json<StudentRiskSnapshot>> {
    state
        .analyzer
        .engine()
        .snapshot(&student_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no risk history for {student_id}")))
}

pub async fn end_session(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.analyzer.engine().end_session(&student_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("no risk history for {student_id}")))
    }
}

//! Camera uplink: posts frames and enrollment images to the monitor API and
//! decodes the per-student verdicts.

use crate::config::CameraConfig;
use crate::error::UplinkError;
use crate::orchestrator::FrameReport;
use crate::server::EnrollResponse;
use reqwest::blocking::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// File extensions replayed from a frame directory.
const FRAME_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub struct FrameUplink {
    client: reqwest::blocking::Client,
    base_url: String,
    camera_id: String,
}

fn mime_for(file_name: &str) -> &'static str {
    if file_name.ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}

impl FrameUplink {
    pub fn new(config: &CameraConfig) -> Result<Self, UplinkError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            camera_id: config.camera_id.clone(),
        })
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    fn post_form<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T, UplinkError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self.client.post(&url).multipart(form).send()?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().unwrap_or_default();
            return Err(UplinkError::Status { status, body });
        }
        Ok(res.json()?)
    }

    fn file_part(bytes: Vec<u8>, file_name: &str) -> Result<Part, UplinkError> {
        Ok(Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))?)
    }

    /// Submit one encoded frame for analysis.
    pub fn send_frame(&self, bytes: Vec<u8>, file_name: &str) -> Result<FrameReport, UplinkError> {
        let form = Form::new()
            .text("camera_id", self.camera_id.clone())
            .part("file", Self::file_part(bytes, file_name)?);
        let report: FrameReport = self.post_form("/analyze_frame", form)?;
        debug!(frame_id = %report.frame_id, students = report.students.len(), "frame analyzed");
        Ok(report)
    }

    pub fn enroll(&self, student_id: &str, image: &Path) -> Result<EnrollResponse, UplinkError> {
        let bytes = read_frame(image)?;
        let name = image
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("reference.jpg")
            .to_string();
        let form = Form::new()
            .text("student_id", student_id.to_string())
            .part("file", Self::file_part(bytes, &name)?);
        self.post_form("/enroll", form)
    }
}

pub fn read_frame(path: &Path) -> Result<Vec<u8>, UplinkError> {
    std::fs::read(path).map_err(|source| UplinkError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Image files in `dir`, sorted by name. Unreadable entries are skipped.
pub fn frame_files(dir: &Path) -> Result<Vec<PathBuf>, UplinkError> {
    let entries = std::fs::read_dir(dir).map_err(|source| UplinkError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| match e {
            Ok(e) => Some(e.path()),
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

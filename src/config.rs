//! Monitor configuration. Every section falls back to defaults key-by-key, so a
//! deployment file only needs to name what it overrides.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the JSON config file.
pub const CONFIG_PATH_ENV: &str = "PROCTOR_CONFIG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Temporal fusion: window, weights, tier cutpoints
    pub fusion: FusionConfig,
    /// Prohibited-object label matching
    pub labels: LabelConfig,
    /// Reference-image identity matching
    pub identity: IdentityConfig,
    /// HTTP API
    pub server: ServerConfig,
    /// Camera uplink client
    pub camera: CameraConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Sliding window capacity per student (frames)
    pub window_size: usize,
    /// Lean magnitude above which the pose signal fires
    pub lean_threshold: f64,
    pub weights: SignalWeights,
    pub tiers: TierCutpoints,
}

/// Per-signal contribution to the instantaneous score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub phone: f64,
    pub chit: f64,
    pub gaze: f64,
    pub pose: f64,
}

/// Lower bounds (exclusive) of the three elevated tiers; anything at or below
/// `mild` is Normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierCutpoints {
    pub confirmed: f64,
    pub high: f64,
    pub mild: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Substrings marking a label as phone-class
    pub phone_tokens: Vec<String>,
    /// Substrings marking a label as chit/paper-class
    pub chit_tokens: Vec<String>,
    /// Substrings marking a detector label as prohibited
    pub prohibited: Vec<String>,
    /// Detections below this confidence are dropped
    pub min_confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Max Hamming distance (of 64 bits) between frame and reference hashes
    pub match_tolerance: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on an uploaded frame or reference image
    pub max_frame_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Base URL of the monitor API
    pub endpoint: String,
    pub camera_id: String,
    /// Directory of frames to replay; a synthetic frame is sent when unset
    pub frame_dir: Option<PathBuf>,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            window_size: 30,
            lean_threshold: 0.2,
            weights: SignalWeights::default(),
            tiers: TierCutpoints::default(),
        }
    }
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            phone: 1.0,
            chit: 0.8,
            gaze: 0.4,
            pose: 0.3,
        }
    }
}

impl Default for TierCutpoints {
    fn default() -> Self {
        Self {
            confirmed: 0.7,
            high: 0.4,
            mild: 0.1,
        }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            phone_tokens: vec!["phone".to_string()],
            chit_tokens: vec!["chit".to_string(), "paper".to_string()],
            prohibited: vec![
                "cell phone".to_string(),
                "paper".to_string(),
                "chit".to_string(),
            ],
            min_confidence: 0.5,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            match_tolerance: crate::perception::DEFAULT_MATCH_TOLERANCE,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8004,
            max_frame_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8004".to_string(),
            camera_id: "cam_01".to_string(),
            frame_dir: None,
            interval_ms: 1000,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl MonitorConfig {
    /// Path from `PROCTOR_CONFIG_PATH`, or `config.json` in the working directory.
    pub fn default_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.json"))
    }

    /// Load from JSON file if present; otherwise return default.
    /// A file that fails to parse or validate is logged and ignored.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config rejected; using defaults");
                Self::default()
            }
        }
    }

    /// Strict variant of [`MonitorConfig::load`]. A missing file is still not an error.
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let config: MonitorConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.fusion;
        if f.window_size == 0 {
            return Err(ConfigError::Invalid("fusion.window_size must be at least 1".into()));
        }
        if !non_negative(f.lean_threshold) {
            return Err(ConfigError::Invalid(
                "fusion.lean_threshold must be finite and >= 0".into(),
            ));
        }
        let w = &f.weights;
        for (name, value) in [
            ("phone", w.phone),
            ("chit", w.chit),
            ("gaze", w.gaze),
            ("pose", w.pose),
        ] {
            if !non_negative(value) {
                return Err(ConfigError::Invalid(format!(
                    "fusion.weights.{name} must be finite and >= 0"
                )));
            }
        }
        let t = &f.tiers;
        if !(non_negative(t.mild) && t.high > t.mild && t.confirmed > t.high && t.confirmed.is_finite()) {
            return Err(ConfigError::Invalid(
                "fusion.tiers must satisfy confirmed > high > mild >= 0".into(),
            ));
        }
        if self.identity.match_tolerance > 64 {
            return Err(ConfigError::Invalid(
                "identity.match_tolerance must be at most 64".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.labels.min_confidence) {
            return Err(ConfigError::Invalid(
                "labels.min_confidence must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

fn non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

//! Error taxonomy. Producer and per-student errors are recovered by the
//! orchestrator; only frame errors fail a request.

use thiserror::Error;

/// Rejections from the fusion engine. No state is mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FusionError {
    #[error("invalid student identity: {0:?}")]
    InvalidIdentity(String),
    #[error("invalid signal for {student_id}: {reason}")]
    InvalidSignal { student_id: String, reason: String },
}

/// A perception producer could not deliver a result for a frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProducerError {
    #[error("{producer} unavailable: {reason}")]
    Unavailable { producer: &'static str, reason: String },
    #[error("{producer} failed: {reason}")]
    Failed { producer: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("frame is empty")]
    Empty,
    #[error("frame is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("frame could not be decoded: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Fusion(#[from] FusionError),
    #[error(transparent)]
    Producer(#[from] ProducerError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type MonitorResult<T> = Result<T, MonitorError>;

/// Camera-side failures talking to the monitor API.
#[derive(Debug, Error)]
pub enum UplinkError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("reading frame {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Frame(#[from] FrameError),
}

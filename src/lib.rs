//! Proctor Monitor — per-camera exam frame analysis with temporal risk fusion.
//!
//! Modular structure:
//! - [`perception`] — Identity, prohibited-object and pose/gaze producer boundary
//! - [`risk`] — Per-student sliding-window risk fusion engine
//! - [`orchestrator`] — Per-frame fan-out to producers and the engine
//! - [`frame`] — Frame decoding
//! - [`server`] — HTTP API
//! - [`uplink`] — Camera client for the HTTP API
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod error;
pub mod frame;
pub mod perception;
pub mod risk;
pub mod orchestrator;
pub mod server;
pub mod uplink;
pub mod logging;

pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use frame::Frame;
pub use orchestrator::{FrameAnalyzer, FrameReport, StudentReport};
pub use risk::{FusionEngine, RiskInputEvent, RiskTier, RiskVerdict};
pub use logging::StructuredLogger;

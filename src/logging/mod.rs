//! Structured logging setup and ndjson verdict lines.

mod format;

pub use format::{StructuredLogger, VerdictLine};

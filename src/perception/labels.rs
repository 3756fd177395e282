//! Prohibited-object filtering in front of a raw detector.

use super::{Detection, ObjectDetector};
use crate::config::LabelConfig;
use crate::error::ProducerError;
use crate::frame::Frame;

/// Keeps only detections whose label contains a prohibited substring
/// (case-sensitive) and whose confidence clears the configured floor.
pub struct ProhibitedFilter<D> {
    inner: D,
    prohibited: Vec<String>,
    min_confidence: f32,
}

impl<D: ObjectDetector> ProhibitedFilter<D> {
    pub fn new(inner: D, config: &LabelConfig) -> Self {
        Self {
            inner,
            prohibited: config.prohibited.clone(),
            min_confidence: config.min_confidence,
        }
    }

    fn keep(&self, d: &Detection) -> bool {
        d.confidence >= self.min_confidence
            && self
                .prohibited
                .iter()
                .any(|p| d.label.contains(p.as_str()))
    }
}

impl<D: ObjectDetector> ObjectDetector for ProhibitedFilter<D> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, ProducerError> {
        let mut detections = self.inner.detect(frame)?;
        detections.retain(|d| self.keep(d));
        Ok(detections)
    }
}

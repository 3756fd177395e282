//! Ranked identity backends behind one resolver.

use super::{IdentityResolver, ResolvedFace};
use crate::error::ProducerError;
use crate::frame::Frame;
use std::sync::Arc;
use tracing::debug;

pub struct FallbackResolver {
    backends: Vec<Arc<dyn IdentityResolver>>,
}

impl FallbackResolver {
    /// Backends are tried in the given order.
    pub fn new(backends: Vec<Arc<dyn IdentityResolver>>) -> Self {
        Self { backends }
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    fn no_backends(&self) -> ProducerError {
        ProducerError::Unavailable {
            producer: self.name(),
            reason: "no identity backends registered".into(),
        }
    }
}

impl IdentityResolver for FallbackResolver {
    fn name(&self) -> &'static str {
        "fallback-identity"
    }

    /// First backend to answer wins; if all fail the last error is returned.
    fn identify(&self, frame: &Frame) -> Result<Vec<ResolvedFace>, ProducerError> {
        let mut last = None;
        for backend in &self.backends {
            match backend.identify(frame) {
                Ok(faces) => return Ok(faces),
                Err(e) => {
                    debug!(backend = backend.name(), error = %e, "identity backend failed, trying next");
                    last = Some(e);
                }
            }
        }
        Err(last.unwrap_or_else(|| self.no_backends()))
    }

    /// Enrolls into every backend; succeeds if at least one accepted it.
    fn enroll(&self, student_id: &str, reference: &Frame) -> Result<(), ProducerError> {
        let mut accepted = false;
        let mut last = None;
        for backend in &self.backends {
            match backend.enroll(student_id, reference) {
                Ok(()) => accepted = true,
                Err(e) => {
                    debug!(backend = backend.name(), error = %e, "enrollment rejected by backend");
                    last = Some(e);
                }
            }
        }
        if accepted {
            Ok(())
        } else {
            Err(last.unwrap_or_else(|| self.no_backends()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::{Identity, Region, Unconfigured};

    struct Fixed(&'static str);

    impl IdentityResolver for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn identify(&self, frame: &Frame) -> Result<Vec<ResolvedFace>, ProducerError> {
            Ok(vec![ResolvedFace {
                region: Region::full(frame),
                identity: Identity::Student(self.0.to_string()),
            }])
        }

        fn enroll(&self, _student_id: &str, _reference: &Frame) -> Result<(), ProducerError> {
            Ok(())
        }
    }

    #[test]
    fn falls_through_to_first_working_backend() {
        let chain = FallbackResolver::new(vec![
            Arc::new(Unconfigured),
            Arc::new(Fixed("s1")),
            Arc::new(Fixed("s2")),
        ]);
        let faces = chain.identify(&Frame::blank(4, 4)).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].identity.as_str(), "s1");
    }

    #[test]
    fn all_failing_returns_last_error() {
        let chain = FallbackResolver::new(vec![Arc::new(Unconfigured), Arc::new(Unconfigured)]);
        assert!(matches!(
            chain.identify(&Frame::blank(4, 4)),
            Err(ProducerError::Unavailable { .. })
        ));
        let empty = FallbackResolver::new(Vec::new());
        assert!(empty.identify(&Frame::blank(4, 4)).is_err());
    }

    #[test]
    fn enrollment_succeeds_if_any_backend_accepts() {
        let chain = FallbackResolver::new(vec![Arc::new(Unconfigured), Arc::new(Fixed("s1"))]);
        assert!(chain.enroll("s9", &Frame::blank(4, 4)).is_ok());
        let none = FallbackResolver::new(vec![Arc::new(Unconfigured)]);
        assert!(none.enroll("s9", &Frame::blank(4, 4)).is_err());
    }
}

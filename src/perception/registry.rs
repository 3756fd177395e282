//! In-memory enrollment registry matching whole frames against reference images
//! by 64-bit difference hash. Stands in for a face-embedding resolver on
//! single-seat cameras.

use super::{Identity, IdentityResolver, Region, ResolvedFace};
use crate::error::ProducerError;
use crate::frame::Frame;
use image::imageops::{self, FilterType};
use parking_lot::RwLock;

/// Hamming distance (bits of 64) accepted as a match by default.
pub const DEFAULT_MATCH_TOLERANCE: u32 = 12;

struct Reference {
    student_id: String,
    hash: u64,
}

pub struct ReferenceRegistry {
    tolerance: u32,
    references: RwLock<Vec<Reference>>,
}

impl ReferenceRegistry {
    pub fn new(tolerance: u32) -> Self {
        Self {
            tolerance,
            references: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.references.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.read().is_empty()
    }

    pub fn enrolled(&self) -> Vec<String> {
        self.references
            .read()
            .iter()
            .map(|r| r.student_id.clone())
            .collect()
    }
}

impl Default for ReferenceRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_TOLERANCE)
    }
}

/// Row-wise gradient sign over a 9x8 grayscale thumbnail.
fn dhash(frame: &Frame) -> u64 {
    let gray = imageops::grayscale(frame.image());
    let small = imageops::resize(&gray, 9, 8, FilterType::Triangle);
    let mut hash = 0u64;
    for y in 0..8 {
        for x in 0..8 {
            let left = small.get_pixel(x, y)[0];
            let right = small.get_pixel(x + 1, y)[0];
            hash = (hash << 1) | u64::from(left < right);
        }
    }
    hash
}

impl IdentityResolver for ReferenceRegistry {
    fn name(&self) -> &'static str {
        "reference-registry"
    }

    /// Best match within tolerance, or nothing. Ties go to the earliest enrollment.
    fn identify(&self, frame: &Frame) -> Result<Vec<ResolvedFace>, ProducerError> {
        let refs = self.references.read();
        if refs.is_empty() {
            return Ok(Vec::new());
        }
        let hash = dhash(frame);
        let best = refs
            .iter()
            .map(|r| ((r.hash ^ hash).count_ones(), r))
            .filter(|(distance, _)| *distance <= self.tolerance)
            .min_by_key(|(distance, _)| *distance);
        Ok(best
            .map(|(_, r)| ResolvedFace {
                region: Region::full(frame),
                identity: Identity::Student(r.student_id.clone()),
            })
            .into_iter()
            .collect())
    }

    /// Re-enrolling an id replaces its reference.
    fn enroll(&self, student_id: &str, reference: &Frame) -> Result<(), ProducerError> {
        if student_id.trim().is_empty() {
            return Err(ProducerError::Failed {
                producer: self.name(),
                reason: "empty student id".into(),
            });
        }
        let hash = dhash(reference);
        let mut refs = self.references.write();
        match refs.iter_mut().find(|r| r.student_id == student_id) {
            Some(existing) => existing.hash = hash,
            None => refs.push(Reference {
                student_id: student_id.to_string(),
                hash,
            }),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient(horizontal: bool) -> Frame {
        Frame::new(RgbImage::from_fn(90, 80, |x, y| {
            let v = if horizontal { x * 2 } else { y * 3 };
            Rgb([v as u8; 3])
        }))
    }

    #[test]
    fn empty_registry_resolves_nobody() {
        let reg = ReferenceRegistry::default();
        assert!(reg.identify(&gradient(true)).unwrap().is_empty());
    }

    #[test]
    fn matches_enrolled_reference_only() {
        let reg = ReferenceRegistry::default();
        reg.enroll("student_101", &gradient(true)).unwrap();
        let faces = reg.identify(&gradient(true)).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].identity, Identity::Student("student_101".into()));
        // horizontal gradient hashes to all ones; a vertical one to all zeros
        assert!(reg.identify(&gradient(false)).unwrap().is_empty());
    }

    #[test]
    fn re_enroll_replaces_reference() {
        let reg = ReferenceRegistry::default();
        reg.enroll("s1", &gradient(true)).unwrap();
        reg.enroll("s1", &gradient(false)).unwrap();
        assert_eq!(reg.len(), 1);
        assert!(reg.identify(&gradient(true)).unwrap().is_empty());
        assert_eq!(reg.identify(&gradient(false)).unwrap().len(), 1);
    }

    #[test]
    fn blank_id_rejected() {
        let reg = ReferenceRegistry::default();
        assert!(reg.enroll("  ", &gradient(true)).is_err());
        assert!(reg.is_empty());
    }
}

//! Decoded camera frame. Decoding is the only step whose failure fails a whole
//! analysis request.

use crate::error::FrameError;
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use std::io::Cursor;

#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
    captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self::with_timestamp(image, Utc::now())
    }

    pub fn with_timestamp(image: RgbImage, captured_at: DateTime<Utc>) -> Self {
        Self { image, captured_at }
    }

    /// Decode JPEG/PNG (any format `image` can sniff) bytes into an RGB frame.
    pub fn decode(bytes: &[u8], max_bytes: usize) -> Result<Self, FrameError> {
        if bytes.is_empty() {
            return Err(FrameError::Empty);
        }
        if bytes.len() > max_bytes {
            return Err(FrameError::TooLarge {
                size: bytes.len(),
                limit: max_bytes,
            });
        }
        let decoded =
            image::load_from_memory(bytes).map_err(|e| FrameError::Malformed(e.to_string()))?;
        Ok(Self::new(decoded.to_rgb8()))
    }

    /// Black frame, used as the synthetic camera feed.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(RgbImage::new(width, height))
    }

    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, FrameError> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(self.image.clone())
            .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Jpeg(quality))
            .map_err(|e| FrameError::Malformed(e.to_string()))?;
        Ok(buf)
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

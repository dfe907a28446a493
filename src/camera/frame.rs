//! Raw video frames and the cheap analysis the hazard loop needs.

use thiserror::Error;

/// Why a frame could not be read this cycle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("Stream has not decoded a frame yet")]
    NotReady,

    #[error("Stream was released")]
    Released,

    #[error("Frame read failed: {0}")]
    ReadFailed(String),
}

/// One RGB24 frame.
///
/// Always holds exactly `width * height * 3` bytes; the only way in is
/// [`Frame::new`] (checked) or [`Frame::solid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    /// Row-major RGB triples
    pixels: Vec<u8>,
}

impl Frame {
    /// Wrap raw RGB24 bytes, rejecting a buffer that does not match the
    /// dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(FrameError::ReadFailed(format!(
                "expected {} bytes for {}x{} RGB, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Uniform grey frame.
    pub fn solid(width: u32, height: u32, level: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![level; width as usize * height as usize * 3],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Nearest-neighbour resize. Never upscales past the source size.
    pub fn downsample(&self, width: u32, height: u32) -> Frame {
        let width = width.clamp(1, self.width.max(1));
        let height = height.clamp(1, self.height.max(1));
        if self.is_empty() {
            return Frame::solid(0, 0, 0);
        }
        if width == self.width && height == self.height {
            return self.clone();
        }

        let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            let src_y = (y as u64 * self.height as u64 / height as u64) as usize;
            for x in 0..width {
                let src_x = (x as u64 * self.width as u64 / width as u64) as usize;
                let idx = (src_y * self.width as usize + src_x) * 3;
                pixels.extend_from_slice(&self.pixels[idx..idx + 3]);
            }
        }

        Frame {
            width,
            height,
            pixels,
        }
    }

    /// Mean Rec. 601 luma over all pixels, 0.0 - 255.0.
    pub fn mean_luminance(&self) -> f64 {
        let count = self.pixels.len() / 3;
        if count == 0 {
            return 0.0;
        }

        let total: f64 = self
            .pixels
            .chunks_exact(3)
            .map(|px| 0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64)
            .sum();

        total / count as f64
    }
}

//! Camera frame and face region value objects.

use crate::domain::foundation::ValidationError;

/// Bytes per pixel in an RGBA frame.
pub const BYTES_PER_PIXEL: usize = 4;

/// A captured RGBA frame, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Wraps an RGBA pixel buffer, checking it matches the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ValidationError> {
        if width == 0 || height == 0 {
            return Err(ValidationError::invalid_format(
                "frame",
                "dimensions must be non-zero",
            ));
        }
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(ValidationError::invalid_format(
                "frame",
                format!("expected {} bytes, got {}", expected, pixels.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A frame filled with a single colour.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self, ValidationError> {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * BYTES_PER_PIXEL);
        for _ in 0..count {
            pixels.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGB channels of the pixel at (x, y). Caller keeps coordinates in bounds.
    pub fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }

    /// Region covering the whole frame.
    pub fn full_region(&self) -> FaceRegion {
        FaceRegion::new(0, 0, self.width, self.height)
    }

    /// Intersects `region` with the frame bounds; `None` when nothing overlaps.
    pub fn clip(&self, region: &FaceRegion) -> Option<FaceRegion> {
        if region.x >= self.width || region.y >= self.height {
            return None;
        }
        let width = region.width.min(self.width - region.x);
        let height = region.height.min(self.height - region.y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(FaceRegion {
            width,
            height,
            ..region.clone()
        })
    }
}

/// Face bounding box reported by the detector, in pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Head roll derived from landmarks, in degrees, when available.
    pub roll_degrees: Option<f64>,
    /// Detector confidence in [0, 1], when reported.
    pub score: Option<f64>,
}

impl FaceRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            roll_degrees: None,
            score: None,
        }
    }

    pub fn with_roll(mut self, degrees: f64) -> Self {
        self.roll_degrees = Some(degrees);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

//! Video frame data structures and utilities
//!
//! A [`Frame`] is one decoded image from the video stream. Frames are
//! immutable and cheap to clone: the pixels live behind an `Arc`, so the pacer
//! can keep the latest frame around while a processor works on another one.

use crate::error::{OverlayError, Result};
use image::{DynamicImage, RgbaImage};
use std::sync::Arc;
use std::time::Duration;

/// Largest frame side accepted by [`Frame::validate`]
pub const MAX_FRAME_SIDE: u32 = 8192;

/// Pixel dimensions of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameDimensions {
    pub width: u32,
    pub height: u32,
}

impl FrameDimensions {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for FrameDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for FrameDimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// A single decoded video frame
#[derive(Clone)]
pub struct Frame {
    image: Arc<RgbaImage>,
    frame_number: u64,
    timestamp: Duration,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("frame_number", &self.frame_number)
            .field("dimensions", &format_args!("{}", self.dimensions()))
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl Frame {
    /// Create a new frame
    ///
    /// # Arguments
    /// * `image` - The frame image data as RGBA
    /// * `frame_number` - Sequential frame number
    /// * `timestamp` - Frame timestamp in the video
    #[must_use]
    pub fn new(image: RgbaImage, frame_number: u64, timestamp: Duration) -> Self {
        Self {
            image: Arc::new(image),
            frame_number,
            timestamp,
        }
    }

    /// Create frame from `DynamicImage`
    #[must_use]
    pub fn from_dynamic_image(image: &DynamicImage, frame_number: u64, timestamp: Duration) -> Self {
        Self::new(image.to_rgba8(), frame_number, timestamp)
    }

    /// Create a uniformly filled frame, mostly useful for synthetic sources
    #[must_use]
    pub fn solid(width: u32, height: u32, rgba: [u8; 4], frame_number: u64) -> Self {
        let image = RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        Self::new(image, frame_number, Duration::ZERO)
    }

    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[must_use]
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    #[must_use]
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[must_use]
    pub fn dimensions(&self) -> FrameDimensions {
        FrameDimensions::new(self.image.width(), self.image.height())
    }

    /// Whether two handles share the same pixel buffer
    #[must_use]
    pub fn same_pixels(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }

    /// Convert frame to `DynamicImage` for detectors that want one
    #[must_use]
    pub fn to_dynamic_image(&self) -> DynamicImage {
        DynamicImage::ImageRgba8(self.image.as_ref().clone())
    }

    /// Scale the frame so its larger side equals `desired_size`
    ///
    /// Returns a cheap clone when the frame already has that size.
    #[must_use]
    pub fn fit_to_desired_size(&self, desired_size: u32) -> Frame {
        let target = size_for_desired_size(self.width(), self.height(), desired_size);
        if target == self.dimensions() || target.width == 0 || target.height == 0 {
            return self.clone();
        }
        let resized = image::imageops::resize(
            self.image.as_ref(),
            target.width,
            target.height,
            image::imageops::FilterType::Triangle,
        );
        Self::new(resized, self.frame_number, self.timestamp)
    }

    /// Validate frame data integrity
    ///
    /// Rejects empty frames, frames above [`MAX_FRAME_SIDE`] and timestamps
    /// beyond 24 hours.
    pub fn validate(&self) -> Result<()> {
        let FrameDimensions { width, height } = self.dimensions();
        if width == 0 || height == 0 {
            return Err(OverlayError::invalid_config(format!(
                "Invalid frame dimensions: {}x{}",
                width, height
            )));
        }

        if width > MAX_FRAME_SIDE || height > MAX_FRAME_SIDE {
            return Err(OverlayError::invalid_config(format!(
                "Frame dimensions too large: {}x{} (max {}x{})",
                width, height, MAX_FRAME_SIDE, MAX_FRAME_SIDE
            )));
        }

        if self.timestamp.as_secs() > 86400 {
            return Err(OverlayError::invalid_config(format!(
                "Unreasonable timestamp: {:?}",
                self.timestamp
            )));
        }

        Ok(())
    }
}

/// Scale `(width, height)` so the larger side equals `desired_size`
///
/// The other side keeps the aspect ratio and is rounded to the nearest pixel.
/// Square inputs scale on the height.
#[must_use]
pub fn size_for_desired_size(width: u32, height: u32, desired_size: u32) -> FrameDimensions {
    if width > height {
        let w = desired_size;
        let h = ((height as f32 / width as f32) * w as f32).round() as u32;
        FrameDimensions::new(w, h)
    } else {
        let h = desired_size;
        let w = if height == 0 {
            0
        } else {
            ((width as f32 / height as f32) * h as f32).round() as u32
        };
        FrameDimensions::new(w, h)
    }
}

/// Type alias for frame stream
pub type FrameStream = std::pin::Pin<Box<dyn futures::Stream<Item = Result<Frame>> + Send>>;

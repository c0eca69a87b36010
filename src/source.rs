//! Video frames and the external collaborators that produce them.

use crate::{landmarks::LandmarkSet, Result};
use image::RgbaImage;

/// A single RGBA video frame
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbaImage,
    sequence: u64,
}

impl Frame {
    /// Wrap an RGBA image with its position in the stream
    #[must_use]
    pub fn new(image: RgbaImage, sequence: u64) -> Self {
        Self { image, sequence }
    }

    /// Frame width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raw RGBA bytes, row-major
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// The underlying image buffer
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Monotonic frame counter assigned by the source
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// A live video stream.
///
/// `next_frame` may block until a frame is available. An error means the
/// stream is dead and the pipeline must stop.
pub trait FrameSource: Send {
    /// Block until the next frame is available
    ///
    /// # Errors
    ///
    /// Returns an error when the stream has dropped or ended
    fn next_frame(&mut self) -> Result<Frame>;
}

/// The external face-mesh detector.
///
/// Returns `Ok(None)` when no face is found, which is a normal and frequent
/// result. An error means the detector itself has failed.
pub trait LandmarkSource: Send {
    /// Extract landmarks for at most one face
    ///
    /// # Errors
    ///
    /// Returns an error when the detector cannot process frames any more
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_accessors() {
        let frame = Frame::new(RgbaImage::new(4, 3), 7);
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.pixels().len(), 4 * 3 * 4);
        assert_eq!(frame.sequence(), 7);
    }
}

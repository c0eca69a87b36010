//! Capture session: the ordered angles and the still captured for each.

use crate::{alignment::CaptureAngle, Error, Result};
use chrono::{DateTime, Utc};
use image::RgbaImage;

/// A still captured for one angle
#[derive(Debug, Clone)]
pub struct CapturedImage {
    /// Angle the still was taken for
    pub angle: CaptureAngle,
    /// Raw RGBA pixels of the grabbed frame
    pub pixels: RgbaImage,
    /// Encoded still (JPEG)
    pub encoded: Vec<u8>,
    /// Time of capture
    pub captured_at: DateTime<Utc>,
}

/// Where the session stands after recording a still
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionProgress {
    /// Move on to the next angle
    Advanced(CaptureAngle),
    /// Every angle has a still
    Complete,
}

/// Ordered capture session with at most one still per angle
#[derive(Debug, Clone)]
pub struct CaptureSession {
    angles: Vec<CaptureAngle>,
    step: usize,
    images: Vec<Option<CapturedImage>>,
}

impl CaptureSession {
    /// Start a session over `angles`, in order
    #[must_use]
    pub fn new(angles: Vec<CaptureAngle>) -> Self {
        let images = vec![None; angles.len()];
        Self { angles, step: 0, images }
    }

    /// Angle currently being captured, `None` once complete
    #[must_use]
    pub fn current_angle(&self) -> Option<CaptureAngle> {
        self.angles.get(self.step).copied()
    }

    /// Index of the current step
    #[must_use]
    pub fn step_index(&self) -> usize {
        self.step
    }

    /// Required angles in order
    #[must_use]
    pub fn angles(&self) -> &[CaptureAngle] {
        &self.angles
    }

    /// Number of stills captured so far
    #[must_use]
    pub fn captured_count(&self) -> usize {
        self.images.iter().filter(|slot| slot.is_some()).count()
    }

    /// Every required angle has a still
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.images.is_empty() && self.images.iter().all(Option::is_some)
    }

    /// Still captured for `angle`, if any
    #[must_use]
    pub fn image(&self, angle: CaptureAngle) -> Option<&CapturedImage> {
        let index = self.angles.iter().position(|a| *a == angle)?;
        self.images.get(index).and_then(Option::as_ref)
    }

    /// All stills in capture order, once the session is complete
    #[must_use]
    pub fn completed_images(&self) -> Option<Vec<CapturedImage>> {
        self.images.iter().cloned().collect()
    }

    /// Record the still for the current angle and advance.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is already complete, the still is for
    /// a different angle, or the current angle already has a still
    pub fn record(&mut self, image: CapturedImage) -> Result<SessionProgress> {
        let Some(expected) = self.current_angle() else {
            return Err(Error::Session("Session is already complete".to_string()));
        };
        if image.angle != expected {
            return Err(Error::Session(format!(
                "Expected a {expected} still, got {}",
                image.angle
            )));
        }
        let slot = self
            .images
            .get_mut(self.step)
            .ok_or_else(|| Error::Session(format!("No slot for step {}", self.step)))?;
        if slot.is_some() {
            return Err(Error::Session(format!("A {expected} still was already captured")));
        }

        *slot = Some(image);
        self.step += 1;

        Ok(match self.current_angle() {
            Some(next) => SessionProgress::Advanced(next),
            None => SessionProgress::Complete,
        })
    }

    /// Discard every still and start over
    pub fn reset(&mut self) {
        self.step = 0;
        self.images.iter_mut().for_each(|slot| *slot = None);
    }
}

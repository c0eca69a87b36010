//! Per-angle alignment targets for the guided capture.

use crate::{
    config::{CaptureConfig, PoseConfig},
    constants::SCREEN_MIDLINE,
    pose_estimation::HeadPose,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Head orientation required for one capture step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureAngle {
    /// Facing the camera
    Center,
    /// Turned toward the subject's left
    Left,
    /// Turned toward the subject's right
    Right,
}

impl CaptureAngle {
    /// Default capture order
    pub const ALL: [CaptureAngle; 3] = [CaptureAngle::Center, CaptureAngle::Left, CaptureAngle::Right];

    /// Guidance shown while aligning for this angle
    #[must_use]
    pub fn instruction(&self) -> &'static str {
        match self {
            CaptureAngle::Center => "Look straight at the camera",
            CaptureAngle::Left => "Slowly turn your head to the left",
            CaptureAngle::Right => "Slowly turn your head to the right",
        }
    }

    /// Advisory hint shown after a long time without alignment
    #[must_use]
    pub fn hint(&self) -> &'static str {
        match self {
            CaptureAngle::Center => "Center your face in the frame and hold still in even light",
            CaptureAngle::Left => "Keep turning left until the guide turns green, then hold",
            CaptureAngle::Right => "Keep turning right until the guide turns green, then hold",
        }
    }
}

impl fmt::Display for CaptureAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureAngle::Center => "center",
            CaptureAngle::Left => "left",
            CaptureAngle::Right => "right",
        };
        f.write_str(name)
    }
}

/// Target zone for the projected nose tip.
///
/// Center is a band around the midline. Left and right are one-sided: the
/// nose only has to pass the offset line, since the subject turns through the
/// zone rather than holding a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentTarget {
    angle: CaptureAngle,
    center_tolerance: f64,
    side_offset: f64,
    mirrored: bool,
    max_roll_degrees: f64,
}

impl AlignmentTarget {
    /// Build the target for `angle` from configuration
    #[must_use]
    pub fn new(angle: CaptureAngle, capture: &CaptureConfig, pose: &PoseConfig) -> Self {
        Self {
            angle,
            center_tolerance: capture.center_tolerance,
            side_offset: capture.side_offset,
            mirrored: capture.mirrored,
            max_roll_degrees: pose.max_roll_degrees,
        }
    }

    /// Angle this target belongs to
    #[must_use]
    pub fn angle(&self) -> CaptureAngle {
        self.angle
    }

    /// Horizontal screen position of a normalized landmark x
    #[must_use]
    pub fn screen_x(&self, landmark_x: f64) -> f64 {
        if self.mirrored {
            1.0 - landmark_x
        } else {
            landmark_x
        }
    }

    /// Whether the nose tip projects into the zone for this angle
    #[must_use]
    pub fn nose_in_zone(&self, nose_x: f64) -> bool {
        if !nose_x.is_finite() {
            return false;
        }
        let x = self.screen_x(nose_x);
        match self.angle {
            CaptureAngle::Center => (x - SCREEN_MIDLINE).abs() <= self.center_tolerance,
            CaptureAngle::Left => x < SCREEN_MIDLINE - self.side_offset,
            CaptureAngle::Right => x > SCREEN_MIDLINE + self.side_offset,
        }
    }

    /// Raw alignment signal: nose in zone and head not tilted too far
    #[must_use]
    pub fn is_satisfied(&self, nose_x: f64, pose: &HeadPose) -> bool {
        self.nose_in_zone(nose_x) && pose.roll.abs() <= self.max_roll_degrees
    }
}

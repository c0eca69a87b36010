//! Approximate head pose from a handful of face-mesh landmarks.
//!
//! This is not a calibrated `PnP` solve. It projects six landmarks to pixel
//! space and derives angles from simple offsets, so the contract is monotonic
//! response to head movement rather than metric accuracy.

use crate::{
    constants::{MAX_PITCH_DEGREES, MAX_ROLL_DEGREES, MAX_YAW_DEGREES, MIN_DENOMINATOR},
    landmarks::{FacePoint, LandmarkIndexMap, LandmarkPoint, LandmarkSet},
    utils::{finite_or_zero, guard_denominator, safe_cast::positive_dimension},
};
use nalgebra::{center, distance, Point2};
use serde::Serialize;

/// Head orientation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HeadPose {
    /// Rotation about the vertical axis, positive when the nose moves toward
    /// the image's right edge
    pub yaw: f64,
    /// Rotation about the horizontal axis, positive when looking down
    pub pitch: f64,
    /// In-plane tilt of the eye line
    pub roll: f64,
}

impl HeadPose {
    /// Pose reported whenever the input cannot be used
    pub const NEUTRAL: Self = Self {
        yaw: 0.0,
        pitch: 0.0,
        roll: 0.0,
    };

    /// Build a pose, replacing non-finite angles with 0 and clamping each
    /// angle to its valid range
    #[must_use]
    pub fn clamped(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self {
            yaw: finite_or_zero(yaw).clamp(-MAX_YAW_DEGREES, MAX_YAW_DEGREES),
            pitch: finite_or_zero(pitch).clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES),
            roll: finite_or_zero(roll).clamp(-MAX_ROLL_DEGREES, MAX_ROLL_DEGREES),
        }
    }
}

/// Result of a pose estimate on one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoseEstimate {
    /// All required landmarks were present
    Available(HeadPose),
    /// The frame could not be used
    Unavailable,
}

impl PoseEstimate {
    /// The pose, if one was estimated
    #[must_use]
    pub fn pose(&self) -> Option<HeadPose> {
        match self {
            PoseEstimate::Available(pose) => Some(*pose),
            PoseEstimate::Unavailable => None,
        }
    }

    /// The pose, or the neutral pose when unavailable
    #[must_use]
    pub fn unwrap_or_neutral(&self) -> HeadPose {
        self.pose().unwrap_or(HeadPose::NEUTRAL)
    }
}

/// Landmarks required by the estimator, in pixel space
struct PoseLandmarks {
    nose: Point2<f64>,
    chin: Point2<f64>,
    left_eye: Point2<f64>,
    right_eye: Point2<f64>,
    left_mouth: Point2<f64>,
    right_mouth: Point2<f64>,
}

/// Head pose estimator over a fixed landmark index table
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    indices: LandmarkIndexMap,
    min_denominator: f64,
}

impl Default for PoseEstimator {
    fn default() -> Self {
        Self::new(LandmarkIndexMap::default())
    }
}

impl PoseEstimator {
    /// Create an estimator reading landmarks through `indices`
    #[must_use]
    pub fn new(indices: LandmarkIndexMap) -> Self {
        Self {
            indices,
            min_denominator: MIN_DENOMINATOR,
        }
    }

    /// Override the floor applied to every denominator
    #[must_use]
    pub fn with_min_denominator(mut self, min_denominator: f64) -> Self {
        self.min_denominator = min_denominator;
        self
    }

    /// Estimate the head pose, falling back to the neutral pose on bad input.
    ///
    /// Never panics: missing, empty or short landmark sets and non-positive
    /// frame dimensions all yield `HeadPose::NEUTRAL`.
    #[must_use]
    pub fn estimate(&self, landmarks: Option<&LandmarkSet>, frame_width: i32, frame_height: i32) -> HeadPose {
        self.try_estimate(landmarks, frame_width, frame_height).unwrap_or_neutral()
    }

    /// Estimate the head pose, reporting unusable input explicitly
    #[must_use]
    pub fn try_estimate(&self, landmarks: Option<&LandmarkSet>, frame_width: i32, frame_height: i32) -> PoseEstimate {
        let (width, height) = match (positive_dimension(frame_width), positive_dimension(frame_height)) {
            (Ok(_), Ok(_)) => (f64::from(frame_width), f64::from(frame_height)),
            _ => {
                log::debug!("Pose unavailable: invalid frame size {frame_width}x{frame_height}");
                return PoseEstimate::Unavailable;
            }
        };

        let Some(landmarks) = landmarks.filter(|set| !set.is_empty()) else {
            return PoseEstimate::Unavailable;
        };

        let Some(points) = self.collect(landmarks, width, height) else {
            log::debug!(
                "Pose unavailable: {} landmarks, need index {}",
                landmarks.len(),
                self.indices.max_index()
            );
            return PoseEstimate::Unavailable;
        };

        PoseEstimate::Available(self.solve(&points, width))
    }

    fn collect(&self, landmarks: &LandmarkSet, width: f64, height: f64) -> Option<PoseLandmarks> {
        let to_pixel = |p: LandmarkPoint| Point2::new(p.x * width, p.y * height);
        let lookup = |point| self.indices.point(landmarks, point).map(to_pixel);

        Some(PoseLandmarks {
            nose: lookup(FacePoint::NoseTip)?,
            chin: lookup(FacePoint::Chin)?,
            left_eye: lookup(FacePoint::LeftEyeOuter)?,
            right_eye: lookup(FacePoint::RightEyeOuter)?,
            left_mouth: lookup(FacePoint::LeftMouthCorner)?,
            right_mouth: lookup(FacePoint::RightMouthCorner)?,
        })
    }

    fn solve(&self, points: &PoseLandmarks, focal_length: f64) -> HeadPose {
        let eye_mid = center(&points.left_eye, &points.right_eye);
        let mouth_mid = center(&points.left_mouth, &points.right_mouth);

        // Yaw: horizontal nose offset from the eye midpoint over the focal length
        let focal = guard_denominator(focal_length, self.min_denominator);
        let yaw = ((points.nose.x - eye_mid.x) / focal).atan().to_degrees();

        // Pitch: vertical nose offset from the face midline over the eye-to-chin span
        let face_mid = center(&eye_mid, &mouth_mid);
        let face_height = guard_denominator(distance(&eye_mid, &points.chin), self.min_denominator);
        let pitch = (points.nose.y - face_mid.y).atan2(face_height).to_degrees();

        // Roll: angle of the line through both outer eye corners
        let eye_line = points.right_eye - points.left_eye;
        let roll = eye_line.y.atan2(eye_line.x).to_degrees();

        HeadPose::clamped(yaw, pitch, roll)
    }
}

//! Synthetic frame and landmark sources.
//!
//! Stand-ins for a camera and a landmark detector so the pipeline can run
//! end to end without hardware: a geometric face model, a camera producing
//! flat frames, a frame-count script for deterministic tests and a shared
//! subject handle that "follows" the on-screen guidance.

use crate::{
    alignment::CaptureAngle,
    landmarks::{FacePoint, LandmarkIndexMap, LandmarkPoint, LandmarkSet},
    source::{Frame, FrameSource, LandmarkSource},
    Error, Result,
};
use image::{Rgba, RgbaImage};
use nalgebra::{Rotation2, Vector2};
use std::{
    sync::{Arc, Mutex, PoisonError},
    thread,
    time::Duration,
};

/// Head turn used when a simulated subject faces a side angle
pub const SIMULATED_TURN_DEGREES: f64 = 30.0;

/// Geometric face model in normalized image coordinates.
///
/// Yaw shifts the nose and the face midline sideways; positive yaw moves the
/// nose toward the image's right edge. Roll rotates every point about the
/// face center. Nod moves the nose tip down (positive) or up (negative) in
/// units of a tenth of the face width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticFace {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub yaw_degrees: f64,
    pub roll_degrees: f64,
    pub nod: f64,
}

impl Default for SyntheticFace {
    fn default() -> Self {
        Self::frontal()
    }
}

impl SyntheticFace {
    /// A face in the middle of the frame looking straight at the camera
    #[must_use]
    pub const fn frontal() -> Self {
        Self {
            center_x: 0.5,
            center_y: 0.5,
            width: 0.35,
            yaw_degrees: 0.0,
            roll_degrees: 0.0,
            nod: 0.0,
        }
    }

    /// A face turned the way a subject would turn for `angle`
    #[must_use]
    pub fn facing(angle: CaptureAngle, mirrored: bool) -> Self {
        // On a mirrored preview the subject's left is the image's right
        let toward_image_right = if mirrored { 1.0 } else { -1.0 };
        let yaw = match angle {
            CaptureAngle::Center => 0.0,
            CaptureAngle::Left => SIMULATED_TURN_DEGREES * toward_image_right,
            CaptureAngle::Right => -SIMULATED_TURN_DEGREES * toward_image_right,
        };
        Self::frontal().with_yaw(yaw)
    }

    #[must_use]
    pub fn with_center(mut self, x: f64, y: f64) -> Self {
        self.center_x = x;
        self.center_y = y;
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn with_yaw(mut self, degrees: f64) -> Self {
        self.yaw_degrees = degrees;
        self
    }

    #[must_use]
    pub fn with_roll(mut self, degrees: f64) -> Self {
        self.roll_degrees = degrees;
        self
    }

    #[must_use]
    pub fn with_nod(mut self, nod: f64) -> Self {
        self.nod = nod;
        self
    }

    /// Render the model into a full landmark set laid out by `indices`.
    ///
    /// Points the model does not place sit at the face center.
    #[must_use]
    pub fn landmarks(&self, indices: &LandmarkIndexMap) -> LandmarkSet {
        let s = self.width;
        let (sin, cos) = self.yaw_degrees.to_radians().sin_cos();
        let midline = sin * 0.5 * s;
        let rotation = Rotation2::new(self.roll_degrees.to_radians());

        let eye_y = -0.15 * s;
        let mouth_y = 0.2 * s;

        let place = |offset: Vector2<f64>, z: f64| {
            let rotated = rotation * offset;
            LandmarkPoint::new(self.center_x + rotated.x, self.center_y + rotated.y, z)
        };

        let count = indices.point_count.max(indices.max_index() + 1);
        let mut points = vec![place(Vector2::zeros(), 0.0); count];

        let placements = [
            (
                FacePoint::NoseTip,
                Vector2::new(sin * 0.8 * s, (eye_y + mouth_y) / 2.0 + self.nod * 0.1 * s),
                -0.05 * cos,
            ),
            (FacePoint::Chin, Vector2::new(midline, 0.45 * s), 0.0),
            (FacePoint::LeftEyeOuter, Vector2::new(-0.35 * s * cos + midline, eye_y), 0.0),
            (FacePoint::RightEyeOuter, Vector2::new(0.35 * s * cos + midline, eye_y), 0.0),
            (FacePoint::LeftMouthCorner, Vector2::new(-0.2 * s * cos + midline, mouth_y), 0.0),
            (FacePoint::RightMouthCorner, Vector2::new(0.2 * s * cos + midline, mouth_y), 0.0),
            (FacePoint::Forehead, Vector2::new(midline, -0.35 * s), 0.0),
            (FacePoint::LeftCheek, Vector2::new(-0.3 * s * cos + midline, 0.05 * s), 0.0),
            (FacePoint::RightCheek, Vector2::new(0.3 * s * cos + midline, 0.05 * s), 0.0),
        ];

        for (point, offset, z) in placements {
            if let Some(slot) = points.get_mut(indices.index_of(point)) {
                *slot = place(offset, z);
            }
        }

        LandmarkSet::new(points)
    }
}

/// Camera producing flat grey frames
#[derive(Debug, Clone)]
pub struct ScriptedCamera {
    width: u32,
    height: u32,
    level: u8,
    interval: Option<Duration>,
    fail_after: Option<u64>,
    sequence: u64,
}

impl ScriptedCamera {
    /// Frames of `width` x `height` at grey `level`
    #[must_use]
    pub fn new(width: u32, height: u32, level: u8) -> Self {
        Self {
            width,
            height,
            level,
            interval: None,
            fail_after: None,
            sequence: 0,
        }
    }

    /// Block for `interval` before each frame, like a real capture rate
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Drop the stream after `frames` frames
    #[must_use]
    pub fn failing_after(mut self, frames: u64) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// Frames produced so far
    #[must_use]
    pub fn frames_produced(&self) -> u64 {
        self.sequence
    }
}

impl FrameSource for ScriptedCamera {
    fn next_frame(&mut self) -> Result<Frame> {
        if self.fail_after.is_some_and(|limit| self.sequence >= limit) {
            return Err(Error::FrameSource(format!(
                "Camera stream dropped after {} frames",
                self.sequence
            )));
        }
        if let Some(interval) = self.interval {
            thread::sleep(interval);
        }

        let level = self.level;
        let image = RgbaImage::from_pixel(self.width, self.height, Rgba([level, level, level, 255]));
        let frame = Frame::new(image, self.sequence);
        self.sequence += 1;
        Ok(frame)
    }
}

/// One step of a detector script: what to report for `frames` frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptStep {
    /// `None` reports no face
    pub face: Option<SyntheticFace>,
    pub frames: u32,
}

impl ScriptStep {
    #[must_use]
    pub fn face(face: SyntheticFace, frames: u32) -> Self {
        Self { face: Some(face), frames }
    }

    #[must_use]
    pub fn no_face(frames: u32) -> Self {
        Self { face: None, frames }
    }
}

/// Landmark detector replaying a fixed script; the last step repeats forever
#[derive(Debug, Clone)]
pub struct ScriptedDetector {
    indices: LandmarkIndexMap,
    steps: Vec<ScriptStep>,
    step: usize,
    frames_in_step: u32,
}

impl ScriptedDetector {
    /// Replay `steps` in order
    #[must_use]
    pub fn new(indices: LandmarkIndexMap, steps: Vec<ScriptStep>) -> Self {
        Self {
            indices,
            steps,
            step: 0,
            frames_in_step: 0,
        }
    }

    /// Always report the same face
    #[must_use]
    pub fn steady(indices: LandmarkIndexMap, face: SyntheticFace) -> Self {
        Self::new(indices, vec![ScriptStep::face(face, 1)])
    }

    fn current_face(&mut self) -> Option<SyntheticFace> {
        let last = self.steps.len().checked_sub(1)?;
        while self.step < last && self.frames_in_step >= self.steps[self.step].frames {
            self.step += 1;
            self.frames_in_step = 0;
        }
        self.frames_in_step = self.frames_in_step.saturating_add(1);
        self.steps.get(self.step).and_then(|step| step.face)
    }
}

impl LandmarkSource for ScriptedDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Option<LandmarkSet>> {
        Ok(self.current_face().map(|face| face.landmarks(&self.indices)))
    }
}

/// A simulated person in front of the camera, shared between the code
/// playing the person and the detector observing them
#[derive(Debug, Clone, Default)]
pub struct SimulatedSubject {
    face: Arc<Mutex<Option<SyntheticFace>>>,
}

impl SimulatedSubject {
    /// A subject showing `face`, or nobody if `None`
    #[must_use]
    pub fn new(face: Option<SyntheticFace>) -> Self {
        Self {
            face: Arc::new(Mutex::new(face)),
        }
    }

    /// What the subject currently shows the camera
    #[must_use]
    pub fn face(&self) -> Option<SyntheticFace> {
        *self.face.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change what the subject shows the camera
    pub fn set_face(&self, face: Option<SyntheticFace>) {
        *self.face.lock().unwrap_or_else(PoisonError::into_inner) = face;
    }

    /// Turn the way the guidance for `angle` asks
    pub fn turn_to(&self, angle: CaptureAngle, mirrored: bool) {
        log::debug!("Simulated subject turning to {angle}");
        self.set_face(Some(SyntheticFace::facing(angle, mirrored)));
    }

    /// Detector observing this subject
    #[must_use]
    pub fn detector(&self, indices: LandmarkIndexMap) -> SubjectDetector {
        SubjectDetector {
            subject: self.clone(),
            indices,
            fail_after: None,
            calls: 0,
        }
    }
}

/// Landmark detector reporting whatever a [`SimulatedSubject`] shows
#[derive(Debug, Clone)]
pub struct SubjectDetector {
    subject: SimulatedSubject,
    indices: LandmarkIndexMap,
    fail_after: Option<u64>,
    calls: u64,
}

impl SubjectDetector {
    /// Fail every call after `calls` successful detections
    #[must_use]
    pub fn failing_after(mut self, calls: u64) -> Self {
        self.fail_after = Some(calls);
        self
    }
}

impl LandmarkSource for SubjectDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>> {
        if self.fail_after.is_some_and(|limit| self.calls >= limit) {
            return Err(Error::LandmarkSource(format!(
                "Detector failed on frame {}",
                frame.sequence()
            )));
        }
        self.calls += 1;
        Ok(self.subject.face().map(|face| face.landmarks(&self.indices)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alignment::AlignmentTarget,
        config::{CaptureConfig, PoseConfig},
    };

    #[test]
    fn test_landmark_set_covers_map() {
        let map = LandmarkIndexMap::default();
        let set = SyntheticFace::frontal().landmarks(&map);
        assert_eq!(set.len(), map.point_count);
        let nose = map.point(&set, FacePoint::NoseTip).unwrap();
        assert!((nose.x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_facing_lands_in_target_zone() {
        let map = LandmarkIndexMap::default();
        let capture = CaptureConfig::default();
        for angle in CaptureAngle::ALL {
            let set = SyntheticFace::facing(angle, capture.mirrored).landmarks(&map);
            let nose = map.point(&set, FacePoint::NoseTip).unwrap();
            let target = AlignmentTarget::new(angle, &capture, &PoseConfig::default());
            assert!(target.nose_in_zone(nose.x), "{angle} nose at {}", nose.x);
        }
    }

    #[test]
    fn test_camera_fails_after_limit() {
        let mut camera = ScriptedCamera::new(8, 8, 128).failing_after(2);
        assert_eq!(camera.next_frame().unwrap().sequence(), 0);
        assert_eq!(camera.next_frame().unwrap().sequence(), 1);
        assert!(matches!(camera.next_frame(), Err(Error::FrameSource(_))));
        assert_eq!(camera.frames_produced(), 2);
    }

    #[test]
    fn test_script_steps_then_repeats_last() {
        let frame = Frame::new(RgbaImage::new(4, 4), 0);
        let mut detector = ScriptedDetector::new(
            LandmarkIndexMap::default(),
            vec![ScriptStep::no_face(2), ScriptStep::face(SyntheticFace::frontal(), 1)],
        );
        assert!(detector.detect(&frame).unwrap().is_none());
        assert!(detector.detect(&frame).unwrap().is_none());
        for _ in 0..5 {
            assert!(detector.detect(&frame).unwrap().is_some());
        }

        let mut empty = ScriptedDetector::new(LandmarkIndexMap::default(), Vec::new());
        assert!(empty.detect(&frame).unwrap().is_none());
    }

    #[test]
    fn test_subject_detector_follows_subject() {
        let frame = Frame::new(RgbaImage::new(4, 4), 7);
        let subject = SimulatedSubject::new(None);
        let mut detector = subject.detector(LandmarkIndexMap::default()).failing_after(2);
        assert!(detector.detect(&frame).unwrap().is_none());
        subject.turn_to(CaptureAngle::Left, true);
        assert!(detector.detect(&frame).unwrap().is_some());
        assert!(matches!(detector.detect(&frame), Err(Error::LandmarkSource(_))));
    }
}

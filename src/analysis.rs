//! Per-frame analysis: landmarks in, pose and lighting estimates out.

use crate::{
    alignment::AlignmentTarget,
    config::Config,
    landmarks::{FacePoint, LandmarkIndexMap, LandmarkSet},
    lighting::{LightingEstimate, LightingEstimator},
    pose_estimation::{PoseEstimate, PoseEstimator},
    source::Frame,
    stabilizer::RawSignals,
    utils::safe_cast::u32_to_i32,
};
use serde::Serialize;
use std::sync::Arc;

/// Estimates for the face found in a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceMeasurement {
    /// Normalized x of the nose tip, `None` if that landmark was missing
    pub nose_x: Option<f64>,
    /// Head pose
    pub pose: PoseEstimate,
    /// Lighting quality
    pub lighting: LightingEstimate,
}

/// Everything the tick loop needs about the latest processed frame.
///
/// Built in full by the frame loop and published as one value, so a reader
/// never sees estimates from two different frames.
#[derive(Debug, Clone)]
pub struct FrameSample {
    /// The frame the estimates were computed on
    pub frame: Arc<Frame>,
    /// `None` when no face was detected
    pub face: Option<FaceMeasurement>,
}

/// Raw numbers shown on the readiness UI for debugging
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DebugReadout {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
    pub brightness: f64,
    pub standard_deviation: f64,
}

impl FrameSample {
    /// Raw readiness signals against an alignment target
    #[must_use]
    pub fn raw_signals(&self, target: &AlignmentTarget) -> RawSignals {
        let Some(face) = &self.face else {
            return RawSignals::default();
        };

        let alignment = match (face.nose_x, face.pose.pose()) {
            (Some(nose_x), Some(pose)) => target.is_satisfied(nose_x, &pose),
            _ => false,
        };

        RawSignals {
            face: true,
            alignment,
            lighting: face.lighting.is_good(),
        }
    }

    /// Debug numbers for the detected face, if any
    #[must_use]
    pub fn debug_readout(&self) -> Option<DebugReadout> {
        let face = self.face.as_ref()?;
        let pose = face.pose.unwrap_or_neutral();
        let lighting = face.lighting.unwrap_or_bad();
        Some(DebugReadout {
            yaw: pose.yaw,
            pitch: pose.pitch,
            roll: pose.roll,
            brightness: lighting.brightness,
            standard_deviation: lighting.standard_deviation,
        })
    }
}

/// Runs both per-frame estimators over one frame
#[derive(Debug, Clone)]
pub struct FrameAnalyzer {
    indices: LandmarkIndexMap,
    pose: PoseEstimator,
    lighting: LightingEstimator,
}

impl Default for FrameAnalyzer {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl FrameAnalyzer {
    /// Create an analyzer from configuration
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            indices: config.landmarks.clone(),
            pose: PoseEstimator::new(config.landmarks.clone()).with_min_denominator(config.pose.min_denominator),
            lighting: LightingEstimator::new(config.landmarks.clone(), config.lighting.clone()),
        }
    }

    /// Estimate pose and lighting for a frame and its detector output
    #[must_use]
    pub fn analyze(&self, frame: Frame, landmarks: Option<LandmarkSet>) -> FrameSample {
        let frame = Arc::new(frame);
        let face = landmarks
            .filter(|set| !set.is_empty())
            .map(|set| self.measure(&frame, &set));
        FrameSample { frame, face }
    }

    fn measure(&self, frame: &Frame, landmarks: &LandmarkSet) -> FaceMeasurement {
        let (width, height) = match (u32_to_i32(frame.width()), u32_to_i32(frame.height())) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                log::warn!("Frame {} too large to analyze", frame.sequence());
                (0, 0)
            }
        };

        FaceMeasurement {
            nose_x: self.indices.point(landmarks, FacePoint::NoseTip).map(|p| p.x),
            pose: self.pose.try_estimate(Some(landmarks), width, height),
            lighting: self.lighting.assess(frame.pixels(), Some(landmarks), width, height),
        }
    }
}

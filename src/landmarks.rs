//! Face landmark sets and the table naming their semantic indices.

use crate::constants::{
    CHIN_INDEX, DEFAULT_LANDMARK_COUNT, FOREHEAD_INDEX, LEFT_CHEEK_INDEX, LEFT_EYE_OUTER_INDEX,
    LEFT_MOUTH_CORNER_INDEX, NOSE_TIP_INDEX, RIGHT_CHEEK_INDEX, RIGHT_EYE_OUTER_INDEX,
    RIGHT_MOUTH_CORNER_INDEX,
};
use serde::{Deserialize, Serialize};

/// A single landmark in normalized frame coordinates.
///
/// `x` and `y` are in `[0, 1]` relative to the frame, `z` is relative depth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LandmarkPoint {
    /// Horizontal position, 0 = left edge of the frame
    pub x: f64,
    /// Vertical position, 0 = top edge of the frame
    pub y: f64,
    /// Relative depth, negative towards the camera
    pub z: f64,
}

impl LandmarkPoint {
    /// Create a landmark point
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Whether every coordinate is finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One face's landmarks for one frame. Replaced wholesale every frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandmarkSet {
    points: Vec<LandmarkPoint>,
}

impl LandmarkSet {
    /// Wrap the detector output for one face
    #[must_use]
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    /// Number of points in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the set holds no points
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at `index`, or `None` when the set is too short
    #[must_use]
    pub fn get(&self, index: usize) -> Option<LandmarkPoint> {
        self.points.get(index).copied()
    }

    /// All points in detector order
    #[must_use]
    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }
}

impl From<Vec<LandmarkPoint>> for LandmarkSet {
    fn from(points: Vec<LandmarkPoint>) -> Self {
        Self::new(points)
    }
}

/// Semantic points the estimators depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacePoint {
    NoseTip,
    Chin,
    LeftEyeOuter,
    RightEyeOuter,
    LeftMouthCorner,
    RightMouthCorner,
    Forehead,
    LeftCheek,
    RightCheek,
}

/// Index-to-semantic-point table owned by the landmark source contract.
///
/// Substituting a different landmark detector means providing a new table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkIndexMap {
    /// Number of points the detector produces per face
    pub point_count: usize,
    pub nose_tip: usize,
    pub chin: usize,
    pub left_eye_outer: usize,
    pub right_eye_outer: usize,
    pub left_mouth_corner: usize,
    pub right_mouth_corner: usize,
    pub forehead: usize,
    pub left_cheek: usize,
    pub right_cheek: usize,
}

impl Default for LandmarkIndexMap {
    fn default() -> Self {
        Self::face_mesh_468()
    }
}

impl LandmarkIndexMap {
    /// Table for the 468-point face mesh
    #[must_use]
    pub const fn face_mesh_468() -> Self {
        Self {
            point_count: DEFAULT_LANDMARK_COUNT,
            nose_tip: NOSE_TIP_INDEX,
            chin: CHIN_INDEX,
            left_eye_outer: LEFT_EYE_OUTER_INDEX,
            right_eye_outer: RIGHT_EYE_OUTER_INDEX,
            left_mouth_corner: LEFT_MOUTH_CORNER_INDEX,
            right_mouth_corner: RIGHT_MOUTH_CORNER_INDEX,
            forehead: FOREHEAD_INDEX,
            left_cheek: LEFT_CHEEK_INDEX,
            right_cheek: RIGHT_CHEEK_INDEX,
        }
    }

    /// Detector index of a semantic point
    #[must_use]
    pub const fn index_of(&self, point: FacePoint) -> usize {
        match point {
            FacePoint::NoseTip => self.nose_tip,
            FacePoint::Chin => self.chin,
            FacePoint::LeftEyeOuter => self.left_eye_outer,
            FacePoint::RightEyeOuter => self.right_eye_outer,
            FacePoint::LeftMouthCorner => self.left_mouth_corner,
            FacePoint::RightMouthCorner => self.right_mouth_corner,
            FacePoint::Forehead => self.forehead,
            FacePoint::LeftCheek => self.left_cheek,
            FacePoint::RightCheek => self.right_cheek,
        }
    }

    /// Look up a semantic point, `None` when the set is too short or the
    /// point is not finite
    #[must_use]
    pub fn point(&self, landmarks: &LandmarkSet, point: FacePoint) -> Option<LandmarkPoint> {
        landmarks
            .get(self.index_of(point))
            .filter(LandmarkPoint::is_finite)
    }

    /// Largest index referenced by the table
    #[must_use]
    pub fn max_index(&self) -> usize {
        [
            self.nose_tip,
            self.chin,
            self.left_eye_outer,
            self.right_eye_outer,
            self.left_mouth_corner,
            self.right_mouth_corner,
            self.forehead,
            self.left_cheek,
            self.right_cheek,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

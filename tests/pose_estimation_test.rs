//! Head pose estimator contract tests

use face_capture_pipeline::{
    alignment::{AlignmentTarget, CaptureAngle},
    config::{CaptureConfig, PoseConfig},
    landmarks::{FacePoint, LandmarkIndexMap, LandmarkPoint, LandmarkSet},
    pose_estimation::{HeadPose, PoseEstimate, PoseEstimator},
    simulation::SyntheticFace,
};
use proptest::prelude::*;

#[test]
fn test_angles_stay_in_range_for_extreme_faces() {
    let estimator = PoseEstimator::default();
    let map = LandmarkIndexMap::default();
    for yaw in [-89.0, -60.0, 60.0, 89.0] {
        for roll in [-170.0, -45.0, 45.0, 170.0] {
            let face = SyntheticFace::frontal().with_yaw(yaw).with_roll(roll).with_nod(3.0);
            let pose = estimator.estimate(Some(&face.landmarks(&map)), 640, 480);
            assert!(pose.yaw.abs() <= 90.0);
            assert!(pose.pitch.abs() <= 90.0);
            assert!(pose.roll.abs() <= 180.0);
        }
    }
}

#[test]
fn test_out_of_frame_points_are_tolerated() {
    let estimator = PoseEstimator::default();
    let face = SyntheticFace::frontal()
        .with_center(1.2, -0.1)
        .landmarks(&LandmarkIndexMap::default());
    let pose = estimator.estimate(Some(&face), 640, 480);
    assert!(pose.yaw.is_finite());
    assert!(pose.roll.abs() < 1e-6);
}

#[test]
fn test_non_finite_landmark_makes_pose_unavailable() {
    let map = LandmarkIndexMap::default();
    let mut points = SyntheticFace::frontal().landmarks(&map).points().to_vec();
    points[map.index_of(FacePoint::Chin)] = LandmarkPoint::new(f64::NAN, 0.5, 0.0);
    let estimate = PoseEstimator::default().try_estimate(Some(&LandmarkSet::new(points)), 640, 480);
    assert_eq!(estimate, PoseEstimate::Unavailable);
    assert_eq!(estimate.unwrap_or_neutral(), HeadPose::NEUTRAL);
}

#[test]
fn test_custom_index_table() {
    // A detector with a compact ten-point layout
    let map = LandmarkIndexMap {
        point_count: 10,
        nose_tip: 0,
        chin: 1,
        left_eye_outer: 2,
        right_eye_outer: 3,
        left_mouth_corner: 4,
        right_mouth_corner: 5,
        forehead: 6,
        left_cheek: 7,
        right_cheek: 8,
    };
    let face = SyntheticFace::frontal().with_yaw(25.0).landmarks(&map);
    assert_eq!(face.len(), 10);
    let pose = PoseEstimator::new(map).estimate(Some(&face), 640, 480);
    assert!(pose.yaw > 0.0);
}

#[test]
fn test_pose_is_independent_of_face_size() {
    let estimator = PoseEstimator::default();
    let map = LandmarkIndexMap::default();
    let small = estimator.estimate(Some(&SyntheticFace::frontal().with_width(0.2).landmarks(&map)), 640, 480);
    let large = estimator.estimate(Some(&SyntheticFace::frontal().with_width(0.5).landmarks(&map)), 640, 480);
    assert!(small.roll.abs() < 1e-6 && large.roll.abs() < 1e-6);
    assert!(small.pitch.abs() < 1e-6 && large.pitch.abs() < 1e-6);
}

proptest! {
    #[test]
    fn prop_never_panics_and_stays_finite(
        coords in prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0, -1.0f64..1.0), 0..600),
        width in -100i32..2000,
        height in -100i32..2000,
    ) {
        let set = LandmarkSet::new(coords.into_iter().map(|(x, y, z)| LandmarkPoint::new(x, y, z)).collect());
        let pose = PoseEstimator::default().estimate(Some(&set), width, height);
        prop_assert!(pose.yaw.is_finite() && pose.pitch.is_finite() && pose.roll.is_finite());
        prop_assert!(pose.yaw.abs() <= 90.0 && pose.pitch.abs() <= 90.0 && pose.roll.abs() <= 180.0);
    }

    #[test]
    fn prop_left_turn_raises_left_alignment(start in -20.0f64..20.0, step in 0.5f64..20.0) {
        // Turning further toward the subject's left never loses left alignment
        let map = LandmarkIndexMap::default();
        let target = AlignmentTarget::new(CaptureAngle::Left, &CaptureConfig::default(), &PoseConfig::default());
        let nose_x = |yaw: f64| {
            let set = SyntheticFace::frontal().with_yaw(yaw).landmarks(&map);
            map.point(&set, FacePoint::NoseTip).map(|p| p.x).unwrap_or(0.5)
        };
        if target.nose_in_zone(nose_x(start)) {
            prop_assert!(target.nose_in_zone(nose_x(start + step)));
        }
    }
}

//! Benchmarks for the per-frame estimators and the per-tick capture flow

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use face_capture_pipeline::{
    alignment::CaptureAngle,
    analysis::FrameAnalyzer,
    capture::{CaptureFlow, StillEncoder},
    config::Config,
    landmarks::LandmarkIndexMap,
    lighting::LightingEstimator,
    pose_estimation::PoseEstimator,
    simulation::SyntheticFace,
    source::Frame,
    stabilizer::{RawSignals, Stabilizer},
    Result,
};
use image::{Rgba, RgbaImage};

struct NullEncoder;

impl StillEncoder for NullEncoder {
    fn encode(&mut self, _frame: &Frame) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

fn test_frame() -> Frame {
    Frame::new(RgbaImage::from_pixel(640, 480, Rgba([140, 140, 140, 255])), 0)
}

fn benchmark_estimators(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimators");

    let landmarks = SyntheticFace::frontal()
        .with_yaw(12.0)
        .with_roll(4.0)
        .landmarks(&LandmarkIndexMap::default());
    let frame = test_frame();

    let pose_estimator = PoseEstimator::default();
    group.bench_function("pose_468_landmarks", |b| {
        b.iter(|| black_box(pose_estimator.estimate(Some(black_box(&landmarks)), 640, 480)));
    });

    let lighting_estimator = LightingEstimator::default();
    group.bench_function("lighting_640x480", |b| {
        b.iter(|| black_box(lighting_estimator.estimate(black_box(frame.pixels()), Some(&landmarks), 640, 480)));
    });

    let analyzer = FrameAnalyzer::default();
    group.bench_function("analyze_frame", |b| {
        b.iter(|| black_box(analyzer.analyze(frame.clone(), Some(landmarks.clone()))));
    });

    group.finish();
}

fn benchmark_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    group.bench_function("stabilizer_update", |b| {
        let mut stabilizer = Stabilizer::default();
        let mut i = 0u32;
        b.iter(|| {
            i = i.wrapping_add(1);
            let raw = RawSignals {
                face: true,
                alignment: i % 7 != 0,
                lighting: i % 11 != 0,
            };
            black_box(stabilizer.update(raw))
        });
    });

    let config = Config::default();
    let sample = FrameAnalyzer::new(&config).analyze(
        test_frame(),
        Some(SyntheticFace::facing(CaptureAngle::Left, config.capture.mirrored).landmarks(&config.landmarks)),
    );
    group.bench_function("capture_flow_aligning", |b| {
        // The center step never completes with a left-facing subject
        let mut flow = CaptureFlow::new(&config);
        flow.confirm_ready();
        let mut encoder = NullEncoder;
        b.iter(|| black_box(flow.tick(Some(&sample), &mut encoder)));
    });

    group.finish();
}

criterion_group!(benches, benchmark_estimators, benchmark_tick);
criterion_main!(benches);

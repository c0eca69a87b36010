//! Threaded pipeline tests with simulated sources


use face_capture_pipeline::{
    alignment::CaptureAngle,
    capture::{CaptureEvent, CapturePhase, JpegStillEncoder},
    landmarks::LandmarkIndexMap,
    pipeline::{CapturePipeline, PipelineEvent},
    simulation::{ScriptedCamera, ScriptedDetector, ScriptStep, SimulatedSubject, SyntheticFace},
};
use std::{
    thread,
    time::{Duration, Instant},
};
use test_helpers::fast_config;

const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

fn camera() -> ScriptedCamera {
    ScriptedCamera::new(160, 120, 140).with_interval(Duration::from_millis(1))
}

#[test]
fn test_guided_session_completes() {
    let config = fast_config();
    let subject = SimulatedSubject::new(Some(SyntheticFace::frontal()));
    let mut pipeline = CapturePipeline::start(
        &config,
        Box::new(camera()),
        Box::new(subject.detector(LandmarkIndexMap::default())),
        Box::new(JpegStillEncoder::new(80)),
    )
    .unwrap();
    pipeline.confirm_ready().unwrap();

    let mut captured = Vec::new();
    let deadline = Instant::now() + EVENT_TIMEOUT;
    let images = loop {
        assert!(Instant::now() < deadline, "session did not complete");

        if let Some(angle) = pipeline.snapshot().phase.angle() {
            subject.turn_to(angle, config.capture.mirrored);
        }

        match pipeline.next_event_timeout(Duration::from_millis(20)) {
            Some(PipelineEvent::Capture(CaptureEvent::Captured { angle, image })) => {
                assert_eq!(&image.encoded[..2], &[0xff, 0xd8]);
                captured.push(angle);
            }
            Some(PipelineEvent::Capture(CaptureEvent::SessionComplete { images })) => break images,
            Some(PipelineEvent::Capture(CaptureEvent::CaptureFailed { reason, .. })) => {
                panic!("capture failed: {reason}")
            }
            Some(PipelineEvent::Fault(reason)) => panic!("pipeline fault: {reason}"),
            None => {}
        }
    };

    assert_eq!(captured, CaptureAngle::ALL.to_vec());
    assert_eq!(images.len(), 3);

    let snapshot = pipeline.snapshot();
    assert_eq!(snapshot.phase, CapturePhase::Complete);
    assert_eq!(snapshot.captured, 3);
    assert_eq!(snapshot.progress, 100);

    pipeline.stop();
    assert!(!pipeline.is_running());
}

#[test]
fn test_snapshot_exposes_debug_numbers() {
    let config = fast_config();
    let mut pipeline = CapturePipeline::start(
        &config,
        Box::new(camera()),
        Box::new(ScriptedDetector::steady(
            LandmarkIndexMap::default(),
            SyntheticFace::frontal().with_roll(5.0),
        )),
        Box::new(JpegStillEncoder::new(80)),
    )
    .unwrap();

    let deadline = Instant::now() + EVENT_TIMEOUT;
    let debug = loop {
        assert!(Instant::now() < deadline, "no debug readout");
        if let Some(debug) = pipeline.snapshot().debug {
            break debug;
        }
        thread::sleep(Duration::from_millis(5));
    };
    assert!((debug.brightness - 140.0).abs() < 1e-6);
    assert!(debug.roll > 0.0);

    // Nothing moves before the user confirms
    thread::sleep(Duration::from_millis(50));
    assert_eq!(pipeline.snapshot().phase, CapturePhase::AwaitingReady);
    assert!(pipeline.try_next_event().is_none());

    pipeline.stop();
}

#[test]
fn test_camera_failure_stops_pipeline() {
    let config = fast_config();
    let mut pipeline = CapturePipeline::start(
        &config,
        Box::new(camera().failing_after(5)),
        Box::new(ScriptedDetector::steady(LandmarkIndexMap::default(), SyntheticFace::frontal())),
        Box::new(JpegStillEncoder::new(80)),
    )
    .unwrap();

    match pipeline.next_event_timeout(EVENT_TIMEOUT) {
        Some(PipelineEvent::Fault(reason)) => assert!(reason.contains("Frame source")),
        other => panic!("expected a fault, got {other:?}"),
    }

    let deadline = Instant::now() + EVENT_TIMEOUT;
    while pipeline.is_running() {
        assert!(Instant::now() < deadline);
        thread::sleep(Duration::from_millis(5));
    }
    assert!(pipeline.snapshot().fault.is_some());
    assert!(pipeline.confirm_ready().is_err());
    pipeline.stop();
}

#[test]
fn test_detector_failure_stops_pipeline() {
    let config = fast_config();
    let subject = SimulatedSubject::new(Some(SyntheticFace::frontal()));
    let mut pipeline = CapturePipeline::start(
        &config,
        Box::new(camera()),
        Box::new(subject.detector(LandmarkIndexMap::default()).failing_after(3)),
        Box::new(JpegStillEncoder::new(80)),
    )
    .unwrap();

    match pipeline.next_event_timeout(EVENT_TIMEOUT) {
        Some(PipelineEvent::Fault(reason)) => assert!(reason.contains("Landmark source")),
        other => panic!("expected a fault, got {other:?}"),
    }
    pipeline.stop();
}

#[test]
fn test_reset_returns_to_awaiting_ready() {
    let config = fast_config();
    let mut pipeline = CapturePipeline::start(
        &config,
        Box::new(camera()),
        Box::new(ScriptedDetector::new(
            LandmarkIndexMap::default(),
            vec![ScriptStep::no_face(1)],
        )),
        Box::new(JpegStillEncoder::new(80)),
    )
    .unwrap();

    pipeline.confirm_ready().unwrap();
    let deadline = Instant::now() + EVENT_TIMEOUT;
    while pipeline.snapshot().phase == CapturePhase::AwaitingReady {
        assert!(Instant::now() < deadline);
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(pipeline.snapshot().phase, CapturePhase::Aligning(CaptureAngle::Center));

    pipeline.reset().unwrap();
    while pipeline.snapshot().phase != CapturePhase::AwaitingReady {
        assert!(Instant::now() < deadline);
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(pipeline.snapshot().captured, 0);
    assert!(!pipeline.snapshot().signals.face);

    pipeline.stop();
}

#[test]
fn test_stop_is_prompt() {
    let mut config = fast_config();
    // A slow tick must not delay shutdown
    config.stabilizer.tick_period_ms = 1_000;
    let mut pipeline = CapturePipeline::start(
        &config,
        Box::new(camera()),
        Box::new(ScriptedDetector::steady(LandmarkIndexMap::default(), SyntheticFace::frontal())),
        Box::new(JpegStillEncoder::new(80)),
    )
    .unwrap();

    thread::sleep(Duration::from_millis(20));
    let started = Instant::now();
    pipeline.stop();
    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(!pipeline.is_running());

    // Stopping twice is harmless
    pipeline.stop();
}

//! Real-time face alignment and capture-readiness pipeline.
//!
//! The pipeline consumes live video frames and the landmark mesh an external
//! detector extracts from them, and drives a guided multi-angle photo capture:
//! - Head pose (yaw, pitch, roll) from a handful of named landmarks
//! - Lighting quality from the luminance of three facial regions
//! - Hysteresis debouncing of the face, alignment and lighting signals
//! - A capture state machine stepping through center, left and right
//!
//! The landmark detector, the camera and the UI stay outside the crate; they
//! plug in through [`source::FrameSource`], [`source::LandmarkSource`] and the
//! read-only [`pipeline::ReadinessSnapshot`].
//!
//! # Examples
//!
//! ## Per-frame estimates
//!
//! ```
//! use face_capture_pipeline::{
//!     landmarks::LandmarkIndexMap,
//!     lighting::LightingEstimator,
//!     pose_estimation::PoseEstimator,
//!     simulation::SyntheticFace,
//! };
//!
//! let landmarks = SyntheticFace::frontal().with_yaw(20.0).landmarks(&LandmarkIndexMap::default());
//! let pose = PoseEstimator::default().estimate(Some(&landmarks), 640, 480);
//! assert!(pose.yaw > 0.0);
//!
//! let pixels = vec![140u8; 640 * 480 * 4];
//! let lighting = LightingEstimator::default().estimate(&pixels, Some(&landmarks), 640, 480);
//! assert!(lighting.is_good);
//! ```
//!
//! ## Running the pipeline
//!
//! ```no_run
//! use face_capture_pipeline::{
//!     capture::{CaptureEvent, JpegStillEncoder},
//!     config::Config,
//!     pipeline::{CapturePipeline, PipelineEvent},
//!     simulation::{ScriptedCamera, SimulatedSubject, SyntheticFace},
//! };
//! use std::time::Duration;
//!
//! # fn main() -> face_capture_pipeline::Result<()> {
//! let config = Config::default();
//! let subject = SimulatedSubject::new(Some(SyntheticFace::frontal()));
//! let mut pipeline = CapturePipeline::start(
//!     &config,
//!     Box::new(ScriptedCamera::new(640, 480, 140)),
//!     Box::new(subject.detector(config.landmarks.clone())),
//!     Box::new(JpegStillEncoder::new(config.capture.jpeg_quality)),
//! )?;
//!
//! pipeline.confirm_ready()?;
//! while let Some(event) = pipeline.next_event_timeout(Duration::from_secs(10)) {
//!     if let PipelineEvent::Capture(CaptureEvent::Captured { angle, .. }) = &event {
//!         println!("Captured {angle}");
//!     }
//! }
//! pipeline.stop();
//! # Ok(())
//! # }
//! ```

/// Alignment targets for each capture angle
pub mod alignment;

/// Per-frame analysis combining the pose and lighting estimators
pub mod analysis;

/// Capture state machine, stability streak and still encoding
pub mod capture;

/// Configuration management
pub mod config;

/// Constants used throughout the pipeline
pub mod constants;

/// Error types and result handling
pub mod error;

/// Landmark points and the named index table
pub mod landmarks;

/// Lighting quality scoring from facial regions
pub mod lighting;

/// Threaded pipeline controller
pub mod pipeline;

/// Head pose estimation from landmarks
pub mod pose_estimation;

/// Capture session bookkeeping
pub mod session;

/// Synthetic frame and landmark sources
pub mod simulation;

/// Frame type and source traits
pub mod source;

/// Hysteresis debouncing of readiness signals
pub mod stabilizer;

/// Numeric helpers and statistics
pub mod utils;

pub use error::{Error, Result};

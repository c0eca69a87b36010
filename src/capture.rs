//! Capture state machine driven by the stabilizer tick.
//!
//! `AwaitingReady -> Aligning(angle) -> Capturing(angle) -> ... -> Complete`.
//! The user confirms readiness once per session. Each step accumulates a
//! stability streak while every stabilized signal holds; once the streak
//! reaches its threshold the step moves to `Capturing`, takes exactly one
//! still under the capture lock, and advances.

use crate::{
    alignment::{AlignmentTarget, CaptureAngle},
    analysis::FrameSample,
    config::{CaptureConfig, Config, PoseConfig},
    session::{CaptureSession, CapturedImage, SessionProgress},
    source::Frame,
    stabilizer::{RawSignals, StabilizedSignals, Stabilizer},
    Error, Result,
};
use chrono::Utc;
use image::{codecs::jpeg::JpegEncoder, DynamicImage};
use serde::Serialize;

/// Phase of the capture flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "angle", rename_all = "snake_case")]
pub enum CapturePhase {
    /// Waiting for the user to confirm readiness
    AwaitingReady,
    /// Accumulating stability for an angle
    Aligning(CaptureAngle),
    /// Stable; the still is about to be taken
    Capturing(CaptureAngle),
    /// Every angle has a still
    Complete,
}

impl CapturePhase {
    /// Angle of the active step, if any
    #[must_use]
    pub fn angle(&self) -> Option<CaptureAngle> {
        match self {
            CapturePhase::Aligning(angle) | CapturePhase::Capturing(angle) => Some(*angle),
            CapturePhase::AwaitingReady | CapturePhase::Complete => None,
        }
    }
}

/// Outcome emitted by a tick
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// A still was stored for `angle`
    Captured {
        angle: CaptureAngle,
        image: CapturedImage,
    },
    /// Grabbing or encoding the still failed; the step will retry
    CaptureFailed { angle: CaptureAngle, reason: String },
    /// The last still was stored; images are in capture order
    SessionComplete { images: Vec<CapturedImage> },
}

/// Encodes a grabbed frame into a still image
pub trait StillEncoder: Send {
    /// Encode the frame
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be encoded
    fn encode(&mut self, frame: &Frame) -> Result<Vec<u8>>;
}

/// JPEG encoder for captured stills
#[derive(Debug, Clone, Copy)]
pub struct JpegStillEncoder {
    quality: u8,
}

impl JpegStillEncoder {
    /// Create an encoder at `quality` (clamped to 1-100)
    #[must_use]
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl StillEncoder for JpegStillEncoder {
    fn encode(&mut self, frame: &Frame) -> Result<Vec<u8>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(Error::Capture(format!(
                "Cannot encode empty frame {}",
                frame.sequence()
            )));
        }

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgba8(frame.image().clone()).to_rgb8();
        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, self.quality).encode_image(&rgb)?;
        Ok(encoded)
    }
}

/// Stability streak with a forgiveness buffer.
///
/// Good ticks grow the streak up to the threshold. Bad ticks only start
/// eroding it, one step per tick, once they outnumber the forgiveness buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StabilityStreak {
    count: u32,
    bad_ticks: u32,
    threshold: u32,
    forgiveness: u32,
}

impl StabilityStreak {
    /// Create an empty streak
    #[must_use]
    pub fn new(threshold: u32, forgiveness: u32) -> Self {
        Self {
            count: 0,
            bad_ticks: 0,
            threshold: threshold.max(1),
            forgiveness,
        }
    }

    /// Record one tick and return whether the streak is at threshold
    pub fn record(&mut self, good: bool) -> bool {
        if good {
            self.count = (self.count + 1).min(self.threshold);
            self.bad_ticks = 0;
        } else {
            self.bad_ticks = self.bad_ticks.saturating_add(1);
            if self.bad_ticks > self.forgiveness {
                self.count = self.count.saturating_sub(1);
            }
        }
        self.is_ready()
    }

    /// The streak has reached its threshold
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.count >= self.threshold
    }

    /// Current streak length
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Progress toward the threshold, 0-100
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        let percent = u64::from(self.count) * 100 / u64::from(self.threshold);
        u8::try_from(percent.min(100)).unwrap_or(100)
    }

    /// Clear the streak
    pub fn reset(&mut self) {
        self.count = 0;
        self.bad_ticks = 0;
    }
}

/// Capture state machine.
///
/// Only the owner of the tick mutates it; the pipeline controller funnels the
/// user's confirm and reset signals through that same owner.
#[derive(Debug, Clone)]
pub struct CaptureFlow {
    capture: CaptureConfig,
    pose: PoseConfig,
    stabilizer: Stabilizer,
    session: CaptureSession,
    phase: CapturePhase,
    streak: StabilityStreak,
    capture_lock: bool,
    settle_ticks: u32,
    ticks_in_step: u32,
    last_raw: RawSignals,
}

impl Default for CaptureFlow {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl CaptureFlow {
    /// Create a flow awaiting the user's confirmation
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            capture: config.capture.clone(),
            pose: config.pose.clone(),
            stabilizer: Stabilizer::new(&config.stabilizer),
            session: CaptureSession::new(config.capture.angles.clone()),
            phase: CapturePhase::AwaitingReady,
            streak: StabilityStreak::new(config.capture.stability_ticks, config.capture.forgiveness_ticks),
            capture_lock: false,
            settle_ticks: 0,
            ticks_in_step: 0,
            last_raw: RawSignals::default(),
        }
    }

    /// The user confirmed they are ready. Only acts while awaiting readiness.
    pub fn confirm_ready(&mut self) {
        if self.phase != CapturePhase::AwaitingReady {
            log::debug!("Ignoring ready confirmation in phase {:?}", self.phase);
            return;
        }
        match self.session.current_angle() {
            Some(angle) => {
                log::info!("User ready, aligning for {angle}");
                self.begin_step(angle);
            }
            None => {
                log::warn!("Ready confirmed for a session without angles");
                self.phase = CapturePhase::Complete;
            }
        }
    }

    /// Discard the session and every counter, back to awaiting readiness
    pub fn reset(&mut self) {
        log::info!("Capture session reset");
        self.session.reset();
        self.stabilizer.reset();
        self.streak.reset();
        self.capture_lock = false;
        self.settle_ticks = 0;
        self.ticks_in_step = 0;
        self.last_raw = RawSignals::default();
        self.phase = CapturePhase::AwaitingReady;
    }

    /// Advance one stabilizer tick using the latest frame sample
    pub fn tick(&mut self, sample: Option<&FrameSample>, encoder: &mut dyn StillEncoder) -> Vec<CaptureEvent> {
        let angle = match self.phase {
            CapturePhase::Complete => return Vec::new(),
            CapturePhase::AwaitingReady => match self.session.current_angle() {
                Some(angle) => angle,
                None => return Vec::new(),
            },
            CapturePhase::Aligning(angle) | CapturePhase::Capturing(angle) => angle,
        };

        let target = AlignmentTarget::new(angle, &self.capture, &self.pose);
        let raw = sample.map_or_else(RawSignals::default, |s| s.raw_signals(&target));
        self.last_raw = raw;
        let signals = self.stabilizer.update(raw);

        // Feedback only until the user confirms
        if self.phase == CapturePhase::AwaitingReady {
            return Vec::new();
        }

        self.ticks_in_step = self.ticks_in_step.saturating_add(1);
        let ready = self.streak.record(signals.all_ready());

        match self.phase {
            CapturePhase::Aligning(angle) => {
                if !ready || self.capture_lock {
                    return Vec::new();
                }
                log::debug!("Stable for {angle}, capturing");
                self.capture_lock = true;
                self.settle_ticks = 0;
                self.phase = CapturePhase::Capturing(angle);
            }
            CapturePhase::Capturing(angle) => {
                if !ready {
                    log::debug!("Stability lost before capturing {angle}");
                    self.capture_lock = false;
                    self.phase = CapturePhase::Aligning(angle);
                    return Vec::new();
                }
                if !signals.all_ready() {
                    return Vec::new();
                }
                self.settle_ticks += 1;
            }
            CapturePhase::AwaitingReady | CapturePhase::Complete => return Vec::new(),
        }

        if self.settle_ticks < self.capture.capture_delay_ticks {
            return Vec::new();
        }

        self.capture(angle, sample, encoder)
    }

    fn capture(
        &mut self,
        angle: CaptureAngle,
        sample: Option<&FrameSample>,
        encoder: &mut dyn StillEncoder,
    ) -> Vec<CaptureEvent> {
        let image = match Self::grab(angle, sample, encoder) {
            Ok(image) => image,
            Err(e) => return self.fail_capture(angle, &e),
        };

        match self.session.record(image.clone()) {
            Ok(SessionProgress::Advanced(next)) => {
                log::info!("Captured {angle} still, next angle {next}");
                self.begin_step(next);
                vec![CaptureEvent::Captured { angle, image }]
            }
            Ok(SessionProgress::Complete) => {
                log::info!("Captured {angle} still, session complete");
                self.phase = CapturePhase::Complete;
                self.capture_lock = false;
                self.streak.reset();
                let images = self.session.completed_images().unwrap_or_default();
                vec![
                    CaptureEvent::Captured { angle, image },
                    CaptureEvent::SessionComplete { images },
                ]
            }
            Err(e) => self.fail_capture(angle, &e),
        }
    }

    fn grab(angle: CaptureAngle, sample: Option<&FrameSample>, encoder: &mut dyn StillEncoder) -> Result<CapturedImage> {
        let frame = sample
            .map(|s| &s.frame)
            .ok_or_else(|| Error::Capture("No frame available to capture".to_string()))?;
        let encoded = encoder.encode(frame)?;
        Ok(CapturedImage {
            angle,
            pixels: frame.image().clone(),
            encoded,
            captured_at: Utc::now(),
        })
    }

    fn fail_capture(&mut self, angle: CaptureAngle, error: &Error) -> Vec<CaptureEvent> {
        log::warn!("Capture of {angle} failed, retrying: {error}");
        self.capture_lock = false;
        self.settle_ticks = 0;
        self.phase = CapturePhase::Aligning(angle);
        vec![CaptureEvent::CaptureFailed {
            angle,
            reason: error.to_string(),
        }]
    }

    fn begin_step(&mut self, angle: CaptureAngle) {
        self.phase = CapturePhase::Aligning(angle);
        self.stabilizer.reset();
        self.streak.reset();
        self.capture_lock = false;
        self.settle_ticks = 0;
        self.ticks_in_step = 0;
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// The capture session
    #[must_use]
    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Current stabilized signals
    #[must_use]
    pub fn signals(&self) -> StabilizedSignals {
        self.stabilizer.signals()
    }

    /// Raw signals from the latest tick
    #[must_use]
    pub fn raw_signals(&self) -> RawSignals {
        self.last_raw
    }

    /// The hysteresis engine
    #[must_use]
    pub fn stabilizer(&self) -> &Stabilizer {
        &self.stabilizer
    }

    /// The stability streak of the current step
    #[must_use]
    pub fn streak(&self) -> &StabilityStreak {
        &self.streak
    }

    /// Whether a capture is in progress for the current step
    #[must_use]
    pub fn is_capture_locked(&self) -> bool {
        self.capture_lock
    }

    /// Stability progress of the current step, 0-100
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        match self.phase {
            CapturePhase::AwaitingReady => 0,
            CapturePhase::Complete => 100,
            CapturePhase::Aligning(_) | CapturePhase::Capturing(_) => self.streak.progress_percent(),
        }
    }

    /// The current step has gone on long enough to show an advisory hint
    #[must_use]
    pub fn show_hint(&self) -> bool {
        self.phase.angle().is_some() && self.ticks_in_step >= self.capture.hint_after_ticks
    }

    /// Guidance text for the current step
    #[must_use]
    pub fn guidance(&self) -> Option<&'static str> {
        let angle = self.phase.angle()?;
        Some(if self.show_hint() {
            angle.hint()
        } else {
            angle.instruction()
        })
    }
}

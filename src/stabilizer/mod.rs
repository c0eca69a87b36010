//! Flicker-resistant readiness signals.
//!
//! Raw per-frame vision output is noisy: one dropped frame or a momentary
//! twitch must not toggle the UI or the capture trigger. Each monitored
//! signal runs through its own hysteresis gate, and loss of the face forces
//! the dependent signals off.

/// Asymmetric ON/OFF debouncing of a single boolean
pub mod hysteresis;

use crate::config::StabilizerConfig;
use hysteresis::HysteresisGate;
use serde::Serialize;

/// Latest raw readings, one per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSignals {
    /// A face was detected in the latest frame
    pub face: bool,
    /// The pose matches the current alignment target
    pub alignment: bool,
    /// Lighting passed the gate
    pub lighting: bool,
}

/// Debounced readiness signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StabilizedSignals {
    pub face: bool,
    pub alignment: bool,
    pub lighting: bool,
}

impl StabilizedSignals {
    /// All three signals are on
    #[must_use]
    pub fn all_ready(&self) -> bool {
        self.face && self.alignment && self.lighting
    }
}

/// Hysteresis engine for face, alignment and lighting
#[derive(Debug, Clone)]
pub struct Stabilizer {
    face: HysteresisGate,
    alignment: HysteresisGate,
    lighting: HysteresisGate,
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::new(&StabilizerConfig::default())
    }
}

impl Stabilizer {
    /// Create a stabilizer with every signal off
    #[must_use]
    pub fn new(config: &StabilizerConfig) -> Self {
        let gate = || HysteresisGate::new(config.on_threshold, config.off_threshold);
        Self {
            face: gate(),
            alignment: gate(),
            lighting: gate(),
        }
    }

    /// Feed one tick of raw readings
    pub fn update(&mut self, raw: RawSignals) -> StabilizedSignals {
        self.face.apply(raw.face);
        self.alignment.apply(raw.alignment);
        self.lighting.apply(raw.lighting);

        // Pose and lighting mean nothing without a face
        if self.face.is_lost() {
            self.alignment.force_off();
            self.lighting.force_off();
        }

        self.signals()
    }

    /// Current stabilized signals
    #[must_use]
    pub fn signals(&self) -> StabilizedSignals {
        StabilizedSignals {
            face: self.face.is_on(),
            alignment: self.alignment.is_on(),
            lighting: self.lighting.is_on(),
        }
    }

    /// Return every gate to the initial off state
    pub fn reset(&mut self) {
        self.face.reset();
        self.alignment.reset();
        self.lighting.reset();
    }

    /// Gate for face presence
    #[must_use]
    pub fn face_gate(&self) -> &HysteresisGate {
        &self.face
    }

    /// Gate for alignment
    #[must_use]
    pub fn alignment_gate(&self) -> &HysteresisGate {
        &self.alignment
    }

    /// Gate for lighting
    #[must_use]
    pub fn lighting_gate(&self) -> &HysteresisGate {
        &self.lighting
    }
}

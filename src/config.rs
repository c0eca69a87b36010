//! Configuration management for the capture pipeline

use crate::{
    alignment::CaptureAngle,
    constants::{
        DEFAULT_CAPTURE_DELAY_TICKS, DEFAULT_CENTER_TOLERANCE, DEFAULT_FLOOR_SCORE, DEFAULT_FORGIVENESS_TICKS,
        DEFAULT_GOOD_MAX_BRIGHTNESS, DEFAULT_GOOD_MIN_BRIGHTNESS, DEFAULT_HINT_AFTER_TICKS, DEFAULT_JPEG_QUALITY,
        DEFAULT_MAX_ROLL_DEGREES, DEFAULT_OFF_THRESHOLD, DEFAULT_ON_THRESHOLD, DEFAULT_REGION_RADIUS,
        DEFAULT_SIDE_OFFSET, DEFAULT_STABILITY_TICKS, DEFAULT_TICK_PERIOD_MS, MIN_DENOMINATOR,
    },
    landmarks::LandmarkIndexMap,
    lighting::{BrightnessBand, EvennessBand},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Landmark index table of the face-mesh detector
    pub landmarks: LandmarkIndexMap,

    /// Head pose configuration
    pub pose: PoseConfig,

    /// Lighting quality configuration
    pub lighting: LightingConfig,

    /// Hysteresis configuration
    pub stabilizer: StabilizerConfig,

    /// Capture flow configuration
    pub capture: CaptureConfig,
}

/// Head pose parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    /// Largest absolute roll accepted for alignment
    pub max_roll_degrees: f64,

    /// Floor applied to denominators in the pose math
    pub min_denominator: f64,
}

/// Lighting quality parameters.
///
/// The `is_good` gate and the score bands are tuned independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Half side of each square sampling window in pixels
    pub region_radius: i32,

    /// Mean brightness must be strictly above this for `is_good`
    pub good_min_brightness: f64,

    /// Mean brightness must be strictly below this for `is_good`
    pub good_max_brightness: f64,

    /// Brightness bands, narrowest (best) first
    pub brightness_bands: Vec<BrightnessBand>,

    /// Evenness bands, smallest deviation first
    pub evenness_bands: Vec<EvennessBand>,

    /// Score outside every band
    pub floor_score: f64,
}

/// Hysteresis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Consecutive good ticks before a signal turns on
    pub on_threshold: u32,

    /// Consecutive bad ticks before a signal turns off
    pub off_threshold: u32,

    /// Period of the stabilizer and capture tick
    pub tick_period_ms: u64,
}

/// Capture flow parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Angles to capture, in order
    pub angles: Vec<CaptureAngle>,

    /// Stability streak needed before a step is ready
    pub stability_ticks: u32,

    /// Consecutive bad ticks tolerated before the streak decays
    pub forgiveness_ticks: u32,

    /// Ticks spent in the capture state before the still is grabbed
    pub capture_delay_ticks: u32,

    /// Largest nose offset from the midline accepted for the center angle
    pub center_tolerance: f64,

    /// Nose offset from the midline that must be passed for side angles
    pub side_offset: f64,

    /// The preview is mirrored, so screen x is `1 - landmark x`
    pub mirrored: bool,

    /// Ticks without capture before the advisory hint is shown
    pub hint_after_ticks: u32,

    /// JPEG quality of captured stills (1-100)
    pub jpeg_quality: u8,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            max_roll_degrees: DEFAULT_MAX_ROLL_DEGREES,
            min_denominator: MIN_DENOMINATOR,
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            region_radius: DEFAULT_REGION_RADIUS,
            good_min_brightness: DEFAULT_GOOD_MIN_BRIGHTNESS,
            good_max_brightness: DEFAULT_GOOD_MAX_BRIGHTNESS,
            brightness_bands: vec![
                BrightnessBand { min: 100.0, max: 180.0, score: 100.0 },
                BrightnessBand { min: 80.0, max: 200.0, score: 80.0 },
                BrightnessBand { min: 60.0, max: 220.0, score: 60.0 },
                BrightnessBand { min: 40.0, max: 240.0, score: 40.0 },
            ],
            evenness_bands: vec![
                EvennessBand { max_std_dev: 10.0, score: 100.0 },
                EvennessBand { max_std_dev: 20.0, score: 80.0 },
                EvennessBand { max_std_dev: 30.0, score: 60.0 },
                EvennessBand { max_std_dev: 40.0, score: 40.0 },
            ],
            floor_score: DEFAULT_FLOOR_SCORE,
        }
    }
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            on_threshold: DEFAULT_ON_THRESHOLD,
            off_threshold: DEFAULT_OFF_THRESHOLD,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
        }
    }
}

impl StabilizerConfig {
    /// Tick period as a `Duration`
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            angles: CaptureAngle::ALL.to_vec(),
            stability_ticks: DEFAULT_STABILITY_TICKS,
            forgiveness_ticks: DEFAULT_FORGIVENESS_TICKS,
            capture_delay_ticks: DEFAULT_CAPTURE_DELAY_TICKS,
            center_tolerance: DEFAULT_CENTER_TOLERANCE,
            side_offset: DEFAULT_SIDE_OFFSET,
            mirrored: true,
            hint_after_ticks: DEFAULT_HINT_AFTER_TICKS,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| Error::IoError(e.to_string()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Landmark table
        if self.landmarks.max_index() >= self.landmarks.point_count {
            return Err(Error::ConfigError(format!(
                "Landmark index {} out of range for {} points",
                self.landmarks.max_index(),
                self.landmarks.point_count
            )));
        }

        // Pose
        if !(0.0..=180.0).contains(&self.pose.max_roll_degrees) {
            return Err(Error::ConfigError(
                "Max roll must be between 0 and 180 degrees".to_string(),
            ));
        }
        if !(self.pose.min_denominator > 0.0 && self.pose.min_denominator.is_finite()) {
            return Err(Error::ConfigError("Min denominator must be positive".to_string()));
        }

        self.validate_lighting()?;

        // Stabilizer
        if self.stabilizer.on_threshold == 0 || self.stabilizer.off_threshold == 0 {
            return Err(Error::ConfigError(
                "Stabilizer thresholds must be greater than 0".to_string(),
            ));
        }
        if self.stabilizer.on_threshold < self.stabilizer.off_threshold {
            return Err(Error::ConfigError(
                "ON threshold must not be smaller than OFF threshold".to_string(),
            ));
        }
        if self.stabilizer.tick_period_ms == 0 {
            return Err(Error::ConfigError("Tick period must be greater than 0".to_string()));
        }

        // Capture
        if self.capture.angles.is_empty() {
            return Err(Error::ConfigError("At least one capture angle is required".to_string()));
        }
        for (i, angle) in self.capture.angles.iter().enumerate() {
            if self.capture.angles[..i].contains(angle) {
                return Err(Error::ConfigError(format!("Capture angle {angle} listed twice")));
            }
        }
        if self.capture.stability_ticks == 0 {
            return Err(Error::ConfigError(
                "Stability ticks must be greater than 0".to_string(),
            ));
        }
        if !(self.capture.center_tolerance > 0.0 && self.capture.center_tolerance < 0.5) {
            return Err(Error::ConfigError(
                "Center tolerance must be between 0.0 and 0.5".to_string(),
            ));
        }
        if !(self.capture.side_offset >= 0.0 && self.capture.side_offset < 0.5) {
            return Err(Error::ConfigError(
                "Side offset must be between 0.0 and 0.5".to_string(),
            ));
        }
        if !(1..=100).contains(&self.capture.jpeg_quality) {
            return Err(Error::ConfigError(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_lighting(&self) -> Result<()> {
        let lighting = &self.lighting;
        if lighting.region_radius < 0 {
            return Err(Error::ConfigError("Region radius must not be negative".to_string()));
        }
        if lighting.good_min_brightness >= lighting.good_max_brightness {
            return Err(Error::ConfigError(
                "Good brightness minimum must be below the maximum".to_string(),
            ));
        }
        for band in &lighting.brightness_bands {
            if band.min > band.max {
                return Err(Error::ConfigError(format!(
                    "Brightness band {}..{} is inverted",
                    band.min, band.max
                )));
            }
        }
        if lighting
            .evenness_bands
            .windows(2)
            .any(|pair| pair[0].max_std_dev > pair[1].max_std_dev)
        {
            return Err(Error::ConfigError(
                "Evenness bands must be ordered by increasing deviation".to_string(),
            ));
        }
        let scores = lighting
            .brightness_bands
            .iter()
            .map(|b| b.score)
            .chain(lighting.evenness_bands.iter().map(|b| b.score))
            .chain(std::iter::once(lighting.floor_score));
        for score in scores {
            if !(0.0..=100.0).contains(&score) {
                return Err(Error::ConfigError(format!("Score {score} outside 0-100")));
            }
        }
        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Face Capture Pipeline Configuration

# Face-mesh landmark indices
landmarks:
  point_count: 468
  nose_tip: 1
  chin: 152
  left_eye_outer: 33
  right_eye_outer: 263
  left_mouth_corner: 61
  right_mouth_corner: 291
  forehead: 151
  left_cheek: 50
  right_cheek: 280

# Head pose
pose:
  max_roll_degrees: 25.0
  min_denominator: 0.000001

# Lighting quality
lighting:
  region_radius: 10
  good_min_brightness: 40.0
  good_max_brightness: 240.0
  brightness_bands:
    - { min: 100.0, max: 180.0, score: 100.0 }
    - { min: 80.0, max: 200.0, score: 80.0 }
    - { min: 60.0, max: 220.0, score: 60.0 }
    - { min: 40.0, max: 240.0, score: 40.0 }
  evenness_bands:
    - { max_std_dev: 10.0, score: 100.0 }
    - { max_std_dev: 20.0, score: 80.0 }
    - { max_std_dev: 30.0, score: 60.0 }
    - { max_std_dev: 40.0, score: 40.0 }
  floor_score: 20.0

# Signal hysteresis
stabilizer:
  on_threshold: 5
  off_threshold: 3
  tick_period_ms: 100

# Capture flow
capture:
  angles: [center, left, right]
  stability_ticks: 15
  forgiveness_ticks: 2
  capture_delay_ticks: 2
  center_tolerance: 0.05
  side_offset: 0.08
  mirrored: true
  hint_after_ticks: 100
  jpeg_quality: 92
"#;

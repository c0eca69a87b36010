//! Constants used throughout the pipeline

/// Number of points produced per face by the default face mesh
pub const DEFAULT_LANDMARK_COUNT: usize = 468;

/// Default landmark indices for the 468-point face mesh
pub const NOSE_TIP_INDEX: usize = 1;
pub const CHIN_INDEX: usize = 152;
pub const LEFT_EYE_OUTER_INDEX: usize = 33;
pub const RIGHT_EYE_OUTER_INDEX: usize = 263;
pub const LEFT_MOUTH_CORNER_INDEX: usize = 61;
pub const RIGHT_MOUTH_CORNER_INDEX: usize = 291;
pub const FOREHEAD_INDEX: usize = 151;
pub const LEFT_CHEEK_INDEX: usize = 50;
pub const RIGHT_CHEEK_INDEX: usize = 280;

/// Head pose output ranges in degrees
pub const MAX_YAW_DEGREES: f64 = 90.0;
pub const MAX_PITCH_DEGREES: f64 = 90.0;
pub const MAX_ROLL_DEGREES: f64 = 180.0;

/// Floor applied to every denominator in the pose math
pub const MIN_DENOMINATOR: f64 = 1e-6;

/// Roll beyond which a pose is not acceptable for capture
pub const DEFAULT_MAX_ROLL_DEGREES: f64 = 25.0;

/// Luminance weights (ITU-R BT.601)
pub const LUMA_RED: f64 = 0.299;
pub const LUMA_GREEN: f64 = 0.587;
pub const LUMA_BLUE: f64 = 0.114;

/// Half side of the square sampling window around each lighting landmark
pub const DEFAULT_REGION_RADIUS: i32 = 10;

/// Permissive brightness gate for `is_good` (strict bounds)
pub const DEFAULT_GOOD_MIN_BRIGHTNESS: f64 = 40.0;
pub const DEFAULT_GOOD_MAX_BRIGHTNESS: f64 = 240.0;

/// Score for brightness or evenness outside every band
pub const DEFAULT_FLOOR_SCORE: f64 = 20.0;

/// Bytes per pixel of an RGBA buffer
pub const RGBA_CHANNELS: usize = 4;

/// Stabilizer defaults
pub const DEFAULT_ON_THRESHOLD: u32 = 5;
pub const DEFAULT_OFF_THRESHOLD: u32 = 3;
pub const DEFAULT_TICK_PERIOD_MS: u64 = 100;

/// Capture flow defaults (ticks at the stabilizer period)
pub const DEFAULT_STABILITY_TICKS: u32 = 15;
pub const DEFAULT_FORGIVENESS_TICKS: u32 = 2;
pub const DEFAULT_CAPTURE_DELAY_TICKS: u32 = 2;
pub const DEFAULT_HINT_AFTER_TICKS: u32 = 100;

/// Nose target zone in normalized screen coordinates
pub const DEFAULT_CENTER_TOLERANCE: f64 = 0.05;
pub const DEFAULT_SIDE_OFFSET: f64 = 0.08;
pub const SCREEN_MIDLINE: f64 = 0.5;

/// JPEG quality for captured stills
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

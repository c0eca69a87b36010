//! Lighting quality from brightness sampled in fixed facial regions.

use crate::{
    config::LightingConfig,
    constants::{LUMA_BLUE, LUMA_GREEN, LUMA_RED, RGBA_CHANNELS},
    landmarks::{FacePoint, LandmarkIndexMap, LandmarkSet},
    utils::{
        safe_cast::{count_to_f64, f64_to_i32_clamp, positive_dimension},
        stats::Statistics,
    },
};
use serde::{Deserialize, Serialize};

/// Regions sampled for brightness, centered on these landmarks
const SAMPLE_REGIONS: [FacePoint; 3] = [FacePoint::Forehead, FacePoint::LeftCheek, FacePoint::RightCheek];

/// Lighting assessment for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LightingQuality {
    /// Permissive pass/fail gate on mean brightness
    pub is_good: bool,
    /// Mean of the brightness and evenness scores, 0-100
    pub score: f64,
    /// Evenness score across regions, 0-100
    pub evenness: f64,
    /// Mean regional luminance, 0-255
    pub brightness: f64,
    /// Population standard deviation of the regional luminances
    pub standard_deviation: f64,
}

impl LightingQuality {
    /// Result reported whenever the input cannot be used
    pub const BAD: Self = Self {
        is_good: false,
        score: 0.0,
        evenness: 0.0,
        brightness: 0.0,
        standard_deviation: 0.0,
    };
}

/// Result of a lighting assessment on one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightingEstimate {
    /// At least one region could be sampled
    Available(LightingQuality),
    /// The pixel buffer, frame size or landmarks were unusable
    Unavailable,
}

impl LightingEstimate {
    /// The quality record, if one was computed
    #[must_use]
    pub fn quality(&self) -> Option<LightingQuality> {
        match self {
            LightingEstimate::Available(quality) => Some(*quality),
            LightingEstimate::Unavailable => None,
        }
    }

    /// Whether lighting passed the gate
    #[must_use]
    pub fn is_good(&self) -> bool {
        self.quality().is_some_and(|q| q.is_good)
    }

    /// The quality record, or the bad result when unavailable
    #[must_use]
    pub fn unwrap_or_bad(&self) -> LightingQuality {
        self.quality().unwrap_or(LightingQuality::BAD)
    }
}

/// Inclusive brightness range mapped to a score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrightnessBand {
    pub min: f64,
    pub max: f64,
    pub score: f64,
}

/// Upper bound on the regional standard deviation mapped to a score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvennessBand {
    pub max_std_dev: f64,
    pub score: f64,
}

/// Lighting quality estimator
#[derive(Debug, Clone)]
pub struct LightingEstimator {
    indices: LandmarkIndexMap,
    config: LightingConfig,
}

impl Default for LightingEstimator {
    fn default() -> Self {
        Self::new(LandmarkIndexMap::default(), LightingConfig::default())
    }
}

impl LightingEstimator {
    /// Create an estimator sampling regions through `indices`
    #[must_use]
    pub fn new(indices: LandmarkIndexMap, config: LightingConfig) -> Self {
        Self { indices, config }
    }

    /// Assess lighting, falling back to `LightingQuality::BAD` on bad input
    #[must_use]
    pub fn estimate(
        &self,
        pixels: &[u8],
        landmarks: Option<&LandmarkSet>,
        frame_width: i32,
        frame_height: i32,
    ) -> LightingQuality {
        self.assess(pixels, landmarks, frame_width, frame_height).unwrap_or_bad()
    }

    /// Assess lighting from an RGBA buffer, reporting unusable input explicitly
    #[must_use]
    pub fn assess(
        &self,
        pixels: &[u8],
        landmarks: Option<&LandmarkSet>,
        frame_width: i32,
        frame_height: i32,
    ) -> LightingEstimate {
        let (width, height) = match (positive_dimension(frame_width), positive_dimension(frame_height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                log::debug!("Lighting unavailable: invalid frame size {frame_width}x{frame_height}");
                return LightingEstimate::Unavailable;
            }
        };

        let required = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(RGBA_CHANNELS));
        if required.map_or(true, |n| pixels.len() < n) {
            log::debug!(
                "Lighting unavailable: pixel buffer has {} bytes for a {width}x{height} frame",
                pixels.len()
            );
            return LightingEstimate::Unavailable;
        }

        let Some(landmarks) = landmarks.filter(|set| !set.is_empty()) else {
            return LightingEstimate::Unavailable;
        };

        let frame = PixelView { pixels, width, height };
        let mut region_brightness = Vec::with_capacity(SAMPLE_REGIONS.len());
        for region in SAMPLE_REGIONS {
            let Some(point) = self.indices.point(landmarks, region) else {
                log::debug!("Lighting unavailable: landmark for {region:?} missing");
                return LightingEstimate::Unavailable;
            };
            let cx = point.x * f64::from(frame_width);
            let cy = point.y * f64::from(frame_height);
            if let Some(brightness) = frame.region_luminance(cx, cy, self.config.region_radius) {
                region_brightness.push(brightness);
            }
        }

        if region_brightness.is_empty() {
            log::debug!("Lighting unavailable: every sample region fell outside the frame");
            return LightingEstimate::Unavailable;
        }

        LightingEstimate::Available(self.score(&region_brightness))
    }

    /// Score a set of regional brightness values
    #[must_use]
    pub fn score(&self, region_brightness: &[f64]) -> LightingQuality {
        let stats = Statistics::from_samples(region_brightness);
        let brightness_score = self.brightness_score(stats.mean);
        let evenness = self.evenness_score(stats.std_dev);

        LightingQuality {
            is_good: stats.mean > self.config.good_min_brightness && stats.mean < self.config.good_max_brightness,
            score: (brightness_score + evenness) / 2.0,
            evenness,
            brightness: stats.mean,
            standard_deviation: stats.std_dev,
        }
    }

    /// Map mean brightness to 0-100 via the first band that contains it
    #[must_use]
    pub fn brightness_score(&self, brightness: f64) -> f64 {
        self.config
            .brightness_bands
            .iter()
            .find(|band| brightness >= band.min && brightness <= band.max)
            .map_or(self.config.floor_score, |band| band.score)
    }

    /// Map regional standard deviation to 0-100 via the first band it fits under
    #[must_use]
    pub fn evenness_score(&self, std_dev: f64) -> f64 {
        self.config
            .evenness_bands
            .iter()
            .find(|band| std_dev <= band.max_std_dev)
            .map_or(self.config.floor_score, |band| band.score)
    }
}

/// Borrowed RGBA buffer with validated dimensions
struct PixelView<'a> {
    pixels: &'a [u8],
    width: usize,
    height: usize,
}

impl PixelView<'_> {
    /// Mean luminance of the in-bounds pixels of a square window, `None` if
    /// the window lies entirely outside the frame
    fn region_luminance(&self, cx: f64, cy: f64, radius: i32) -> Option<f64> {
        let radius = i64::from(radius.max(0));
        let bound = i32::MAX / 4;
        let cx = i64::from(f64_to_i32_clamp(cx, -bound, bound));
        let cy = i64::from(f64_to_i32_clamp(cy, -bound, bound));

        let max_x = i64::try_from(self.width).ok()? - 1;
        let max_y = i64::try_from(self.height).ok()? - 1;
        let (x0, x1) = ((cx - radius).max(0), (cx + radius).min(max_x));
        let (y0, y1) = ((cy - radius).max(0), (cy + radius).min(max_y));
        if x0 > x1 || y0 > y1 {
            return None;
        }

        let mut total = 0.0;
        let mut count = 0usize;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
                    continue;
                };
                let offset = (y * self.width + x) * RGBA_CHANNELS;
                if let Some(px) = self.pixels.get(offset..offset + 3) {
                    total += luminance(px[0], px[1], px[2]);
                    count += 1;
                }
            }
        }

        (count > 0).then(|| total / count_to_f64(count))
    }
}

/// Perceived luminance of an RGB pixel
#[must_use]
pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    LUMA_RED * f64::from(r) + LUMA_GREEN * f64::from(g) + LUMA_BLUE * f64::from(b)
}

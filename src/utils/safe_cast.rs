//! Safe casting utilities for frame dimensions and pixel coordinates

use crate::{Error, Result};

/// Convert a frame dimension to usize, rejecting zero and negative values
///
/// # Errors
///
/// Returns an error if the dimension is not strictly positive
pub fn positive_dimension(value: i32) -> Result<usize> {
    if value <= 0 {
        return Err(Error::InvalidInput(format!("Frame dimension must be positive, got {value}")));
    }
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Frame dimension {value} does not fit in usize")))
}

/// Safely convert u32 to i32 with overflow checking
///
/// # Errors
///
/// Returns an error if the value exceeds i32::MAX
pub fn u32_to_i32(value: u32) -> Result<i32> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Value {value} too large to fit in i32")))
}

/// Clamp and round f64 to i32 for pixel coordinates
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f64_to_i32_clamp(value: f64, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.round().clamp(f64::from(min), f64::from(max));
    (clamped as i32).clamp(min, max)
}

/// Convert a pixel count to f64 for averaging
#[must_use]
#[allow(clippy::cast_precision_loss)] // Pixel counts stay far below 2^52
pub fn count_to_f64(value: usize) -> f64 {
    value as f64
}

//! Numeric helpers shared by the estimators.

pub mod safe_cast;
pub mod stats;

/// Replace a non-finite value with 0
#[must_use]
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Keep a denominator away from zero while preserving its sign
#[must_use]
pub fn guard_denominator(value: f64, floor: f64) -> f64 {
    let floor = floor.abs().max(f64::MIN_POSITIVE);
    if !value.is_finite() {
        return floor;
    }
    if value.abs() < floor {
        if value.is_sign_negative() {
            -floor
        } else {
            floor
        }
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_or_zero() {
        assert_eq!(finite_or_zero(1.5), 1.5);
        assert_eq!(finite_or_zero(f64::NAN), 0.0);
        assert_eq!(finite_or_zero(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_guard_denominator() {
        assert_eq!(guard_denominator(0.0, 1e-6), 1e-6);
        assert_eq!(guard_denominator(-1e-9, 1e-6), -1e-6);
        assert_eq!(guard_denominator(2.0, 1e-6), 2.0);
        assert_eq!(guard_denominator(f64::NAN, 1e-6), 1e-6);
    }
}

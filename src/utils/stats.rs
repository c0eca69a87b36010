//! Summary statistics over small sample sets.

use super::safe_cast::count_to_f64;

/// Statistical summary of a sample set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// Mean value of the samples
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl Statistics {
    /// Summarize the finite values in `data`.
    ///
    /// Returns all zeros for an empty set. The standard deviation of a single
    /// sample is 0.
    #[must_use]
    pub fn from_samples(data: &[f64]) -> Self {
        let finite: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Self { mean: 0.0, std_dev: 0.0 };
        }

        Self {
            mean: mean(&finite),
            std_dev: population_std_dev(&finite),
        }
    }
}

/// Arithmetic mean, 0 for an empty slice
#[must_use]
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / count_to_f64(data.len())
}

/// Population standard deviation, 0 for fewer than two samples
#[must_use]
pub fn population_std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let mean = mean(data);
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count_to_f64(data.len());
    let std_dev = variance.sqrt();
    if std_dev.is_finite() {
        std_dev
    } else {
        0.0
    }
}

use serde::{Deserialize, Serialize};

/// Running mean and variance (Welford).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningMoments {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningMoments {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one value.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Values pushed so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Arithmetic mean, `0` when empty.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance `<x^2> - <x>^2`, `0` with fewer than two values.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / self.count as f64).max(0.0)
        }
    }

    /// Square root of [`RunningMoments::variance`].
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

impl FromIterator<f64> for RunningMoments {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut moments = Self::new();
        for value in iter {
            moments.push(value);
        }
        moments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_closed_form() {
        let moments: RunningMoments = [1.0, 2.0, 3.0, 4.0].into_iter().collect();
        assert_eq!(moments.count(), 4);
        assert!((moments.mean() - 2.5).abs() < 1e-12);
        assert!((moments.variance() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn constant_input_has_exactly_zero_variance() {
        let moments: RunningMoments = std::iter::repeat(0.1).take(1000).collect();
        assert_eq!(moments.variance(), 0.0);
        assert_eq!(moments.std_dev(), 0.0);
    }
}

use serde::{Deserialize, Serialize};
use toroid_core::errors::ErrorInfo;
use toroid_core::{RandomSource, ToroidError};

use crate::moments::RunningMoments;

/// Default number of bootstrap replicates.
pub const DEFAULT_RESAMPLES: usize = 1000;

/// Resampling error estimator, generic over the derived statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapEstimator {
    resamples: usize,
}

impl BootstrapEstimator {
    /// Estimator drawing `resamples` replicates; zero is rejected.
    pub fn new(resamples: usize) -> Result<Self, ToroidError> {
        if resamples == 0 {
            return Err(ToroidError::Statistics(ErrorInfo::new(
                "zero-resamples",
                "bootstrap needs at least one replicate",
            )));
        }
        Ok(Self { resamples })
    }

    /// Replicates drawn per estimate.
    pub fn resamples(&self) -> usize {
        self.resamples
    }

    /// Standard deviation of `statistic` across resampled copies of `samples`.
    ///
    /// Each replicate draws `samples.len()` indices with replacement. The
    /// replicate buffer is allocated once and reused.
    pub fn estimate<R, F>(
        &self,
        samples: &[f64],
        rng: &mut R,
        statistic: F,
    ) -> Result<f64, ToroidError>
    where
        R: RandomSource + ?Sized,
        F: Fn(&[f64]) -> f64,
    {
        if samples.is_empty() {
            return Err(ToroidError::Statistics(
                ErrorInfo::new("empty-samples", "cannot bootstrap an empty sample sequence")
                    .with_context("resamples", self.resamples.to_string()),
            ));
        }
        let len = samples.len();
        let mut buffer = vec![0.0; len];
        let mut replicates = RunningMoments::new();
        for _ in 0..self.resamples {
            for slot in buffer.iter_mut() {
                *slot = samples[rng.index(len)];
            }
            replicates.push(statistic(&buffer));
        }
        Ok(replicates.std_dev())
    }
}

impl Default for BootstrapEstimator {
    fn default() -> Self {
        Self {
            resamples: DEFAULT_RESAMPLES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observables;
    use toroid_core::RngHandle;

    #[test]
    fn constant_samples_have_zero_error() {
        let samples = vec![3.7; 50];
        let mut rng = RngHandle::from_seed(8);
        for k in [1, 2, 17, 200] {
            let estimator = BootstrapEstimator::new(k).unwrap();
            let error = estimator
                .estimate(&samples, &mut rng, observables::variance)
                .unwrap();
            assert_eq!(error, 0.0);
            let error = estimator
                .estimate(&samples, &mut rng, observables::mean)
                .unwrap();
            assert_eq!(error, 0.0);
        }
    }

    #[test]
    fn empty_samples_and_zero_resamples_fail() {
        assert_eq!(
            BootstrapEstimator::new(0).unwrap_err().code(),
            "zero-resamples"
        );
        let mut rng = RngHandle::from_seed(1);
        let err = BootstrapEstimator::default()
            .estimate(&[], &mut rng, observables::mean)
            .unwrap_err();
        assert_eq!(err.code(), "empty-samples");
    }

    #[test]
    fn error_of_mean_tracks_standard_error() {
        let samples: Vec<f64> = (0..400).map(|i| (i % 2) as f64).collect();
        let mut rng = RngHandle::from_seed(21);
        let error = BootstrapEstimator::new(2000)
            .unwrap()
            .estimate(&samples, &mut rng, observables::mean)
            .unwrap();
        // sigma / sqrt(m) = 0.5 / 20
        assert!((error - 0.025).abs() < 0.005, "error = {error}");
    }
}

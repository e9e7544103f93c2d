use serde::{Deserialize, Serialize};
use toroid_core::errors::ErrorInfo;
use toroid_core::ToroidError;

use crate::observables::{self, EpidemicSnapshot, SpinSnapshot};

/// Burn-in and stride governing which sweeps are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSchedule {
    burn_in: usize,
    stride: usize,
}

impl SampleSchedule {
    /// Builds a schedule; a zero stride is rejected.
    pub fn new(burn_in: usize, stride: usize) -> Result<Self, ToroidError> {
        if stride == 0 {
            return Err(ToroidError::Config(
                ErrorInfo::new("invalid-stride", "sampling stride must be at least one")
                    .with_context("burn_in", burn_in.to_string()),
            ));
        }
        Ok(Self { burn_in, stride })
    }

    /// Whether the state after 0-based sweep `sweep` is sampled.
    #[inline]
    pub fn should_sample(&self, sweep: usize) -> bool {
        sweep >= self.burn_in && (sweep - self.burn_in) % self.stride == 0
    }

    /// Number of samples a run of `sweeps` sweeps records.
    pub fn expected_samples(&self, sweeps: usize) -> usize {
        if sweeps <= self.burn_in {
            0
        } else {
            (sweeps - self.burn_in - 1) / self.stride + 1
        }
    }
}

/// Ordered post-burn-in samples of one run.
#[derive(Debug, Clone)]
pub struct ObservableAccumulator<T> {
    schedule: SampleSchedule,
    samples: Vec<T>,
}

impl<T> ObservableAccumulator<T> {
    /// Empty accumulator following `schedule`.
    pub fn new(schedule: SampleSchedule) -> Self {
        Self {
            schedule,
            samples: Vec::new(),
        }
    }

    /// Records `sample()` if `sweep` is scheduled. Returns whether it did.
    pub fn offer<F>(&mut self, sweep: usize, sample: F) -> bool
    where
        F: FnOnce() -> T,
    {
        if self.schedule.should_sample(sweep) {
            self.samples.push(sample());
            true
        } else {
            false
        }
    }

    /// Samples recorded so far, in sweep order.
    pub fn samples(&self) -> &[T] {
        &self.samples
    }

    /// Number of samples recorded.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing has been sampled yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Hands back the samples, failing if the run never got past burn-in.
    pub fn finish(self) -> Result<Vec<T>, ToroidError> {
        if self.samples.is_empty() {
            return Err(ToroidError::Statistics(
                ErrorInfo::new("no-samples", "run ended before any sample was recorded")
                    .with_context("burn_in", self.schedule.burn_in.to_string())
                    .with_context("stride", self.schedule.stride.to_string())
                    .with_hint("increase sweeps or lower burn_in"),
            ));
        }
        Ok(self.samples)
    }
}

/// Ising statistics over a sample sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinStatistics {
    /// `<M>`.
    pub magnetization: f64,
    /// `<|M|>`.
    pub abs_magnetization: f64,
    /// `<E>`.
    pub energy: f64,
    /// `(<M^2> - <M>^2) / (N^2 T)`.
    pub susceptibility: f64,
    /// `(<E^2> - <E>^2) / (N^2 T^2)`.
    pub heat_capacity: f64,
}

/// Column views of a spin sample sequence.
pub fn spin_columns(samples: &[SpinSnapshot]) -> (Vec<f64>, Vec<f64>) {
    samples
        .iter()
        .map(|sample| (sample.magnetization as f64, sample.energy as f64))
        .unzip()
}

/// Reduces spin samples to the Ising observables.
pub fn spin_statistics(samples: &[SpinSnapshot], cells: usize, temperature: f64) -> SpinStatistics {
    let (magnetizations, energies) = spin_columns(samples);
    let absolute: Vec<f64> = magnetizations.iter().map(|m| m.abs()).collect();
    SpinStatistics {
        magnetization: observables::mean(&magnetizations),
        abs_magnetization: observables::mean(&absolute),
        energy: observables::mean(&energies),
        susceptibility: observables::susceptibility(&magnetizations, cells, temperature),
        heat_capacity: observables::heat_capacity(&energies, cells, temperature),
    }
}

/// SIRS statistics over a sample sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpidemicStatistics {
    /// `<n> / N^2`.
    pub infected_fraction: f64,
    /// `(<n^2> - <n>^2) / N^2`.
    pub infected_variance: f64,
}

/// Infected counts as floats.
pub fn infected_column(samples: &[EpidemicSnapshot]) -> Vec<f64> {
    samples.iter().map(|sample| sample.infected as f64).collect()
}

/// Reduces SIRS samples to the epidemic observables.
pub fn epidemic_statistics(samples: &[EpidemicSnapshot], cells: usize) -> EpidemicStatistics {
    let counts = infected_column(samples);
    EpidemicStatistics {
        infected_fraction: observables::infected_fraction(&counts, cells),
        infected_variance: observables::infected_variance(&counts, cells),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stride_is_rejected() {
        assert_eq!(SampleSchedule::new(100, 0).unwrap_err().code(), "invalid-stride");
    }

    #[test]
    fn schedule_samples_from_burn_in_at_stride() {
        let schedule = SampleSchedule::new(100, 10).unwrap();
        let sampled: Vec<usize> = (0..131).filter(|&s| schedule.should_sample(s)).collect();
        assert_eq!(sampled, vec![100, 110, 120, 130]);
        assert_eq!(schedule.expected_samples(131), 4);
        assert_eq!(schedule.expected_samples(100), 0);
        assert_eq!(schedule.expected_samples(101), 1);
    }

    #[test]
    fn finishing_without_samples_fails() {
        let mut acc = ObservableAccumulator::new(SampleSchedule::new(5, 1).unwrap());
        for sweep in 0..5 {
            assert!(!acc.offer(sweep, || sweep));
        }
        assert!(acc.is_empty());
        assert_eq!(acc.finish().unwrap_err().code(), "no-samples");
    }

    #[test]
    fn spin_statistics_of_frozen_run() {
        let samples = vec![
            SpinSnapshot {
                magnetization: -16,
                energy: -32,
            };
            5
        ];
        let stats = spin_statistics(&samples, 16, 1.0);
        assert_eq!(stats.magnetization, -16.0);
        assert_eq!(stats.abs_magnetization, 16.0);
        assert_eq!(stats.energy, -32.0);
        assert_eq!(stats.susceptibility, 0.0);
        assert_eq!(stats.heat_capacity, 0.0);
    }

    #[test]
    fn epidemic_statistics_normalise_by_cells() {
        let samples: Vec<EpidemicSnapshot> = [10, 30]
            .into_iter()
            .map(|infected| EpidemicSnapshot { infected })
            .collect();
        let stats = epidemic_statistics(&samples, 100);
        assert!((stats.infected_fraction - 0.2).abs() < 1e-12);
        assert!((stats.infected_variance - 1.0).abs() < 1e-12);
    }
}

use proptest::collection::vec;
use proptest::prelude::*;
use toroid_core::RngHandle;

use toroid_mcmc::equilibration::detect;
use toroid_mcmc::observables;
use toroid_mcmc::{BootstrapEstimator, Equilibration, EquilibrationDetector, Observation};

proptest! {
    #[test]
    fn bootstrap_of_constant_samples_is_exactly_zero(
        value in -1.0e6f64..1.0e6,
        len in 1usize..64,
        resamples in 1usize..64,
        seed in any::<u64>(),
    ) {
        let samples = vec![value; len];
        let estimator = BootstrapEstimator::new(resamples).unwrap();
        let mut rng = RngHandle::from_seed(seed);
        let cells = 100;
        let error = estimator
            .estimate(&samples, &mut rng, |s| observables::susceptibility(s, cells, 1.5))
            .unwrap();
        prop_assert_eq!(error, 0.0);
        let error = estimator.estimate(&samples, &mut rng, observables::mean).unwrap();
        prop_assert_eq!(error, 0.0);
    }

    #[test]
    fn bootstrap_error_is_never_negative(
        samples in vec(-100.0f64..100.0, 1..40),
        seed in any::<u64>(),
    ) {
        let estimator = BootstrapEstimator::new(25).unwrap();
        let mut rng = RngHandle::from_seed(seed);
        let error = estimator.estimate(&samples, &mut rng, observables::variance).unwrap();
        prop_assert!(error >= 0.0);
        prop_assert!(error.is_finite());
    }

    #[test]
    fn plateau_is_flagged_at_its_first_sweep(
        prefix in 0usize..60,
        plateau in 1000usize..2000,
        tail in 10usize..30,
    ) {
        // strictly increasing prefix never holds still
        let counts = (1..=prefix).chain(std::iter::repeat(plateau).take(tail + 1));
        let verdict = detect(0, counts);
        prop_assert_eq!(verdict, Some(Equilibration::Equilibrated { time: prefix + 1 }));
    }

    #[test]
    fn restless_sequences_are_never_given_a_time(period in 2usize..9, base in 0usize..500) {
        let counts = (0..).map(|sweep: usize| base + sweep % period);
        let verdict = detect(base, counts);
        prop_assert_eq!(verdict, Some(Equilibration::NotFound { sweeps: 5000 }));
        prop_assert_eq!(verdict.and_then(|v| v.time()), None);
    }
}

#[test]
fn empty_sample_sequence_is_an_error() {
    let mut rng = RngHandle::from_seed(0);
    let err = BootstrapEstimator::default()
        .estimate(&[], &mut rng, observables::variance)
        .unwrap_err();
    assert_eq!(err.code(), "empty-samples");
}

#[test]
fn detector_reports_sweeps_when_settling() {
    let mut detector = EquilibrationDetector::new(40);
    let mut sweeps = 0;
    let time = loop {
        sweeps += 1;
        let count = if sweeps < 25 { 40 + sweeps } else { 99 };
        if let Observation::Done(verdict) = detector.observe(count) {
            break verdict.time();
        }
    };
    assert_eq!(time, Some(25));
    assert_eq!(sweeps, 35);
}

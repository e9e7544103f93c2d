use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of equal counts required.
pub const DEFAULT_WINDOW: usize = 10;
/// Default sweep cap before giving up.
pub const DEFAULT_CAP: usize = 5000;

/// Final verdict of an equilibration search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Equilibration {
    /// The count stabilised; `time` is the sweeps performed minus the window.
    Equilibrated {
        /// Equilibration time in sweeps.
        time: usize,
    },
    /// The cap was reached first.
    NotFound {
        /// Sweeps performed.
        sweeps: usize,
    },
}

impl Equilibration {
    /// Equilibration time, `None` when not found.
    pub fn time(&self) -> Option<usize> {
        match self {
            Equilibration::Equilibrated { time } => Some(*time),
            Equilibration::NotFound { .. } => None,
        }
    }
}

/// Progress after feeding one count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Keep sweeping.
    Pending,
    /// Search finished.
    Done(Equilibration),
}

/// Watches an aggregate count for `window` repeats of the current value.
///
/// The initial count is part of the history. Equilibrium is declared after a
/// sweep whose count equals each of the previous `window` recorded counts;
/// fewer than `window` recorded counts never qualify.
#[derive(Debug, Clone)]
pub struct EquilibrationDetector {
    window: usize,
    cap: usize,
    sweeps: usize,
    history: VecDeque<usize>,
    verdict: Option<Equilibration>,
}

impl EquilibrationDetector {
    /// Detector with the default window and cap.
    pub fn new(initial_count: usize) -> Self {
        Self::with_limits(initial_count, DEFAULT_WINDOW, DEFAULT_CAP)
    }

    /// Detector with an explicit window and cap (both at least one).
    pub fn with_limits(initial_count: usize, window: usize, cap: usize) -> Self {
        let window = window.max(1);
        let mut history = VecDeque::with_capacity(window);
        history.push_back(initial_count);
        Self {
            window,
            cap: cap.max(1),
            sweeps: 0,
            history,
            verdict: None,
        }
    }

    /// Sweeps observed so far.
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    /// Feeds the count measured after the next sweep.
    pub fn observe(&mut self, count: usize) -> Observation {
        if let Some(verdict) = self.verdict {
            return Observation::Done(verdict);
        }
        self.sweeps += 1;
        let settled =
            self.history.len() == self.window && self.history.iter().all(|&prev| prev == count);
        if settled {
            let verdict = Equilibration::Equilibrated {
                time: self.sweeps - self.window,
            };
            self.verdict = Some(verdict);
            return Observation::Done(verdict);
        }
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(count);
        if self.sweeps >= self.cap {
            let verdict = Equilibration::NotFound {
                sweeps: self.sweeps,
            };
            self.verdict = Some(verdict);
            return Observation::Done(verdict);
        }
        Observation::Pending
    }
}

/// Feeds a whole count sequence and returns the verdict, if one was reached.
pub fn detect<I>(initial_count: usize, counts: I) -> Option<Equilibration>
where
    I: IntoIterator<Item = usize>,
{
    let mut detector = EquilibrationDetector::new(initial_count);
    for count in counts {
        if let Observation::Done(verdict) = detector.observe(count) {
            return Some(verdict);
        }
    }
    None
}

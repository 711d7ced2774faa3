//! Run budgets and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::SearchOptions;
use crate::models::{BudgetLimit, RunOutcome};

/// Shared cancellation flag.
///
/// Clones share the same flag; cancelling any clone cancels all of them.
/// The search polls it between placement attempts.
///
/// # Example
///
/// ```
/// use u_timetable::search::CancelToken;
///
/// let token = CancelToken::new();
/// let observer = token.clone();
/// token.cancel();
/// assert!(observer.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Iteration and wall-clock budget of one run.
#[derive(Debug, Clone)]
pub struct Budget {
    max_iterations: u64,
    max_duration: Duration,
    started: Instant,
    iterations: u64,
}

impl Budget {
    /// Starts the clock.
    pub fn start(options: &SearchOptions) -> Self {
        Self {
            max_iterations: options.max_iterations,
            max_duration: options.max_duration(),
            started: Instant::now(),
            iterations: 0,
        }
    }

    /// Counts one placement attempt.
    #[inline]
    pub fn tick(&mut self) {
        self.iterations += 1;
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The limit that has been reached, if any. Iterations are checked first.
    pub fn exhausted(&self) -> Option<BudgetLimit> {
        if self.iterations >= self.max_iterations {
            Some(BudgetLimit::Iterations)
        } else if self.elapsed() >= self.max_duration {
            Some(BudgetLimit::Duration)
        } else {
            None
        }
    }

    /// Why the run must stop now, if it must. Cancellation wins over budgets.
    pub fn should_stop(&self, cancel: &CancelToken) -> Option<RunOutcome> {
        if cancel.is_cancelled() {
            return Some(RunOutcome::Cancelled);
        }
        self.exhausted().map(RunOutcome::BudgetExhausted)
    }
}

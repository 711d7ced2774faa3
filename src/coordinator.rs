//! Per-semester run coordination.
//!
//! A [`RunCoordinator`] owns a bounded worker pool and a table of run states
//! keyed by semester. At most one run per semester is in flight; a second
//! request for the same semester is rejected immediately with
//! [`EngineError::AlreadyRunning`]. Runs for different semesters proceed in
//! parallel, sharing the pool.
//!
//! # State machine
//!
//! ```text
//! Idle ──► Running ──► Completed(result)
//!             │
//!             └──────► Failed(reason)
//! ```
//!
//! `Completed` and `Failed` semesters can be run again; `reset` returns them
//! to `Idle`.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam::channel::{self, Receiver};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{error, info, warn};

use crate::config::{SearchOptions, TimetableConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::{Assignment, RunResult, SemesterSnapshot};
use crate::repair::repair_assignments_with_cancel;
use crate::reschedule::run_incremental_reschedule_with_cancel;
use crate::search::{run_full_schedule_with_cancel, CancelToken};

/// Lifecycle state of a semester's scheduling.
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Idle,
    Running,
    Completed(Arc<RunResult>),
    Failed(String),
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }

    /// The result of the last completed run.
    pub fn result(&self) -> Option<&Arc<RunResult>> {
        match self {
            RunState::Completed(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct RunEntry {
    state: RunState,
    cancel: Option<CancelToken>,
}

#[derive(Debug)]
struct Inner {
    runs: Mutex<HashMap<String, RunEntry>>,
    options: SearchOptions,
}

impl Inner {
    fn set(&self, semester: &str, state: RunState) {
        let mut runs = self.runs.lock();
        runs.insert(
            semester.to_string(),
            RunEntry {
                state,
                cancel: None,
            },
        );
    }
}

/// Marks a semester `Failed` if its run ends without reporting an outcome.
struct RunGuard {
    inner: Arc<Inner>,
    semester: String,
    finished: bool,
}

impl RunGuard {
    fn finish(mut self, outcome: EngineResult<RunResult>) -> EngineResult<Arc<RunResult>> {
        self.finished = true;
        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                self.inner
                    .set(&self.semester, RunState::Completed(Arc::clone(&result)));
                Ok(result)
            }
            Err(err) => {
                self.inner
                    .set(&self.semester, RunState::Failed(err.to_string()));
                Err(err)
            }
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.finished {
            error!(event = "run_aborted", semester = %self.semester);
            self.inner.set(
                &self.semester,
                RunState::Failed("run aborted before completion".into()),
            );
        }
    }
}

/// Handle to a run executing in the background.
#[derive(Debug)]
pub struct RunHandle {
    semester: String,
    cancel: CancelToken,
    receiver: Receiver<EngineResult<Arc<RunResult>>>,
}

impl RunHandle {
    pub fn semester(&self) -> &str {
        &self.semester
    }

    /// Requests cancellation; the run returns a partial result.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Blocks until the run finishes.
    pub fn wait(self) -> EngineResult<Arc<RunResult>> {
        self.receiver
            .recv()
            .map_err(|_| EngineError::Pool(format!("worker for {} disconnected", self.semester)))?
    }
}

/// Coordinates scheduling runs across semesters.
///
/// # Example
///
/// ```
/// use u_timetable::config::TimetableConfig;
/// use u_timetable::coordinator::{RunCoordinator, RunState};
/// use u_timetable::models::{Classroom, SemesterSnapshot, Section};
///
/// let coordinator = RunCoordinator::new(&TimetableConfig::default().with_pool_size(2)).unwrap();
/// let snapshot = SemesterSnapshot::new("2025-1")
///     .with_section(Section::new("S1", "C1", "T1", "G1").with_semester("2025-1"))
///     .with_classroom(Classroom::new("R1", 30))
///     .with_weekly_grid(5, 6);
///
/// let result = coordinator.run_full(&snapshot).unwrap();
/// assert_eq!(result.assignment_count(), 1);
/// assert!(matches!(coordinator.status("2025-1"), RunState::Completed(_)));
/// ```
#[derive(Clone)]
pub struct RunCoordinator {
    inner: Arc<Inner>,
    pool: Arc<ThreadPool>,
}

impl RunCoordinator {
    /// Creates a coordinator with a pool of `config.pool_size` workers.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Pool`] if the configuration is invalid or the
    /// pool cannot be built.
    pub fn new(config: &TimetableConfig) -> EngineResult<Self> {
        config
            .validate()
            .map_err(|e| EngineError::Pool(e.to_string()))?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.pool_size)
            .thread_name(|i| format!("timetable-worker-{i}"))
            .panic_handler(|_| error!(event = "worker_panic"))
            .build()
            .map_err(|e| EngineError::Pool(e.to_string()))?;

        info!(event = "coordinator_start", pool_size = config.pool_size);
        Ok(Self {
            inner: Arc::new(Inner {
                runs: Mutex::new(HashMap::new()),
                options: config.search.clone(),
            }),
            pool: Arc::new(pool),
        })
    }

    /// Search options applied to every run.
    pub fn options(&self) -> &SearchOptions {
        &self.inner.options
    }

    /// Schedules a semester from scratch on the pool, blocking until done.
    ///
    /// # Errors
    ///
    /// [`EngineError::AlreadyRunning`] if the semester has a run in flight;
    /// [`EngineError::InvalidSnapshot`] if validation fails (the semester is
    /// then `Failed`).
    pub fn run_full(&self, snapshot: &SemesterSnapshot) -> EngineResult<Arc<RunResult>> {
        let (guard, cancel) = self.begin(&snapshot.semester)?;
        let options = &self.inner.options;
        let outcome = self
            .pool
            .install(|| run_full_schedule_with_cancel(snapshot, options, &cancel));
        guard.finish(outcome)
    }

    /// Reschedules `targets` of `existing` on the pool, blocking until done.
    pub fn run_incremental(
        &self,
        existing: &RunResult,
        targets: &[String],
        snapshot: &SemesterSnapshot,
    ) -> EngineResult<Arc<RunResult>> {
        let (guard, cancel) = self.begin(&snapshot.semester)?;
        let options = &self.inner.options;
        let outcome = self.pool.install(|| {
            run_incremental_reschedule_with_cancel(existing, targets, snapshot, options, &cancel)
        });
        guard.finish(outcome)
    }

    /// Repairs an edited timetable of the semester on the pool, blocking
    /// until done.
    pub fn run_repair(
        &self,
        assignments: &[Assignment],
        snapshot: &SemesterSnapshot,
    ) -> EngineResult<Arc<RunResult>> {
        let (guard, cancel) = self.begin(&snapshot.semester)?;
        let options = &self.inner.options;
        let outcome = self.pool.install(|| {
            repair_assignments_with_cancel(assignments, snapshot, options, &cancel)
        });
        guard.finish(outcome)
    }

    /// Starts a full run in the background.
    ///
    /// The semester is `Running` as soon as this returns.
    pub fn submit_full(&self, snapshot: SemesterSnapshot) -> EngineResult<RunHandle> {
        let semester = snapshot.semester.clone();
        let (guard, cancel) = self.begin(&semester)?;
        let inner = Arc::clone(&self.inner);
        let token = cancel.clone();
        let (sender, receiver) = channel::bounded(1);

        self.pool.spawn(move || {
            let outcome = run_full_schedule_with_cancel(&snapshot, &inner.options, &token);
            let _ = sender.send(guard.finish(outcome));
        });

        Ok(RunHandle {
            semester,
            cancel,
            receiver,
        })
    }

    /// Starts an incremental run in the background.
    pub fn submit_incremental(
        &self,
        existing: Arc<RunResult>,
        targets: Vec<String>,
        snapshot: SemesterSnapshot,
    ) -> EngineResult<RunHandle> {
        let semester = snapshot.semester.clone();
        let (guard, cancel) = self.begin(&semester)?;
        let inner = Arc::clone(&self.inner);
        let token = cancel.clone();
        let (sender, receiver) = channel::bounded(1);

        self.pool.spawn(move || {
            let outcome = run_incremental_reschedule_with_cancel(
                &existing,
                &targets,
                &snapshot,
                &inner.options,
                &token,
            );
            let _ = sender.send(guard.finish(outcome));
        });

        Ok(RunHandle {
            semester,
            cancel,
            receiver,
        })
    }

    /// Current state of a semester (`Idle` if never run).
    pub fn status(&self, semester: &str) -> RunState {
        self.inner
            .runs
            .lock()
            .get(semester)
            .map_or(RunState::Idle, |entry| entry.state.clone())
    }

    /// Requests cancellation of a semester's in-flight run.
    ///
    /// Returns `false` if nothing is running.
    pub fn cancel(&self, semester: &str) -> bool {
        let runs = self.inner.runs.lock();
        match runs.get(semester).and_then(|entry| entry.cancel.as_ref()) {
            Some(token) => {
                info!(event = "run_cancel_requested", semester);
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Forgets a finished semester, returning it to `Idle`.
    ///
    /// Returns `false` (and changes nothing) while a run is in flight.
    pub fn reset(&self, semester: &str) -> bool {
        let mut runs = self.inner.runs.lock();
        if runs.get(semester).is_some_and(|entry| entry.state.is_running()) {
            return false;
        }
        runs.remove(semester);
        true
    }

    fn begin(&self, semester: &str) -> EngineResult<(RunGuard, CancelToken)> {
        let mut runs = self.inner.runs.lock();
        if runs.get(semester).is_some_and(|entry| entry.state.is_running()) {
            warn!(event = "run_rejected", semester, reason = "already_running");
            return Err(EngineError::AlreadyRunning(semester.to_string()));
        }

        let cancel = CancelToken::new();
        runs.insert(
            semester.to_string(),
            RunEntry {
                state: RunState::Running,
                cancel: Some(cancel.clone()),
            },
        );
        let guard = RunGuard {
            inner: Arc::clone(&self.inner),
            semester: semester.to_string(),
            finished: false,
        };
        Ok((guard, cancel))
    }
}

impl std::fmt::Debug for RunCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunCoordinator")
            .field("pool_size", &self.pool.current_num_threads())
            .field("options", &self.inner.options)
            .finish()
    }
}

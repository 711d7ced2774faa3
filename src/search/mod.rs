//! Timetable search.
//!
//! Places every section of a semester into (classroom, time slot) cells
//! while honoring all hard constraints, ranking alternatives by the soft
//! rules, and degrading gracefully when the problem is over-constrained.
//!
//! # Algorithm
//!
//! `SearchEngine` is a most-constrained-first greedy placer with bounded,
//! chronological backtracking. It never fails: sections it cannot place are
//! reported in the result with a reason.
//!
//! # Termination
//!
//! A run stops when all work is done, when the iteration or wall-clock
//! budget runs out, or when its [`CancelToken`] is cancelled. Early stops
//! still return a consistent partial result.
//!
//! # References
//!
//! - Burke & Petrovic (2002), "Recent research directions in automated
//!   timetabling"
//! - Schaerf (1999), "A survey of automated timetabling"

mod engine;
mod ordering;
mod termination;

pub use engine::{SearchEngine, SearchOutput};
pub use ordering::{order_profiles, SectionProfile};
pub use termination::{Budget, CancelToken};

use std::time::Instant;

use tracing::{info, warn};

use crate::config::SearchOptions;
use crate::error::{EngineError, EngineResult};
use crate::models::{CatalogSummary, RunOutcome, RunResult, SemesterSnapshot};
use crate::validation::validate_snapshot;

/// Schedules a whole semester from scratch.
///
/// # Errors
///
/// Returns [`EngineError::InvalidSnapshot`] if the snapshot fails
/// validation. Over-constrained input is not an error.
///
/// # Example
///
/// ```
/// use u_timetable::config::SearchOptions;
/// use u_timetable::models::{Classroom, Equipment, SemesterSnapshot, Section, UnscheduledReason};
/// use u_timetable::search::run_full_schedule;
///
/// let snapshot = SemesterSnapshot::new("2025-1")
///     .with_section(Section::new("S1", "PHYS", "T1", "G1").with_semester("2025-1"))
///     .with_section(
///         Section::new("S2", "ART", "T2", "G2")
///             .with_semester("2025-1")
///             .with_equipment(Equipment::Projector),
///     )
///     .with_classroom(Classroom::new("R1", 40))
///     .with_weekly_grid(5, 6);
///
/// let result = run_full_schedule(&snapshot, &SearchOptions::default()).unwrap();
/// assert_eq!(result.assignment_count(), 1);
/// assert_eq!(
///     result.unscheduled_entry("S2").map(|u| u.reason),
///     Some(UnscheduledReason::EquipmentMissing)
/// );
/// ```
pub fn run_full_schedule(
    snapshot: &SemesterSnapshot,
    options: &SearchOptions,
) -> EngineResult<RunResult> {
    run_full_schedule_with_cancel(snapshot, options, &CancelToken::new())
}

/// [`run_full_schedule`] that stops early once `cancel` is cancelled.
pub fn run_full_schedule_with_cancel(
    snapshot: &SemesterSnapshot,
    options: &SearchOptions,
    cancel: &CancelToken,
) -> EngineResult<RunResult> {
    if let Err(errors) = validate_snapshot(snapshot) {
        warn!(
            event = "invalid_snapshot",
            semester = %snapshot.semester,
            errors = errors.len(),
        );
        return Err(EngineError::InvalidSnapshot(errors));
    }

    info!(
        event = "run_start",
        semester = %snapshot.semester,
        mode = "full",
        sections = snapshot.sections.len(),
        classrooms = snapshot.classrooms.len(),
        time_slots = snapshot.time_slots.len(),
    );
    let started = Instant::now();

    let output = SearchEngine::new(snapshot, options)
        .with_cancel(cancel.clone())
        .run();

    let result = RunResult {
        semester: snapshot.semester.clone(),
        assignments: output.assignments,
        unscheduled: output.unscheduled,
        outcome: output.outcome,
        stats: output.stats,
        catalog: CatalogSummary::from_snapshot(snapshot),
    };
    log_run_end(&result, started);
    Ok(result)
}

pub(crate) fn log_run_end(result: &RunResult, started: Instant) {
    let duration_ms = started.elapsed().as_millis() as u64;
    if let RunOutcome::BudgetExhausted(limit) = result.outcome {
        warn!(
            event = "budget_exhausted",
            semester = %result.semester,
            ?limit,
            unscheduled = result.unscheduled.len(),
        );
    }
    info!(
        event = "run_end",
        semester = %result.semester,
        outcome = ?result.outcome,
        placed = result.assignments.len(),
        unscheduled = result.unscheduled.len(),
        iterations = result.stats.iterations,
        backtracks = result.stats.backtracks,
        duration_ms,
    );
}

//! Incremental rescheduling.
//!
//! Re-places a subset of sections of an existing result while every other
//! assignment stays exactly where it is.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::SearchOptions;
use crate::error::{EngineError, EngineResult};
use crate::models::{Assignment, CatalogSummary, RunResult, Section, SemesterSnapshot};
use crate::search::{log_run_end, CancelToken, SearchEngine};
use crate::state::ScheduleState;
use crate::validation::{validate_reschedule, ValidationError, ValidationErrorKind};

/// Reschedules `targets` around the rest of `existing`.
///
/// The output lists the untouched assignments first, unchanged and in their
/// original order, followed by the new placements of the targets. Untouched
/// unscheduled entries are carried over. A target that cannot be re-placed
/// is unscheduled; its old assignment is not restored.
///
/// # Errors
///
/// Returns [`EngineError::InvalidSnapshot`] if the snapshot is invalid, a
/// target is unknown, a section of the snapshot is neither a target nor
/// tracked by `existing`, or the untouched assignments reference missing
/// entities or collide with one another.
///
/// # Example
///
/// ```
/// use u_timetable::config::SearchOptions;
/// use u_timetable::models::{Classroom, SemesterSnapshot, Section};
/// use u_timetable::reschedule::run_incremental_reschedule;
/// use u_timetable::search::run_full_schedule;
///
/// let snapshot = SemesterSnapshot::new("2025-1")
///     .with_section(Section::new("S1", "C1", "T1", "G1").with_semester("2025-1"))
///     .with_section(Section::new("S2", "C2", "T2", "G2").with_semester("2025-1"))
///     .with_classroom(Classroom::new("R1", 40))
///     .with_weekly_grid(1, 4);
/// let options = SearchOptions::default();
///
/// let first = run_full_schedule(&snapshot, &options).unwrap();
/// let kept = first.assignments_for_section("S1")[0].clone();
///
/// let second =
///     run_incremental_reschedule(&first, &["S2".to_string()], &snapshot, &options).unwrap();
/// assert_eq!(second.assignments[0], kept);
/// assert_eq!(second.assignment_count(), 2);
/// ```
pub fn run_incremental_reschedule(
    existing: &RunResult,
    targets: &[String],
    snapshot: &SemesterSnapshot,
    options: &SearchOptions,
) -> EngineResult<RunResult> {
    run_incremental_reschedule_with_cancel(existing, targets, snapshot, options, &CancelToken::new())
}

/// [`run_incremental_reschedule`] that stops early once `cancel` is cancelled.
pub fn run_incremental_reschedule_with_cancel(
    existing: &RunResult,
    targets: &[String],
    snapshot: &SemesterSnapshot,
    options: &SearchOptions,
    cancel: &CancelToken,
) -> EngineResult<RunResult> {
    if let Err(errors) = validate_reschedule(existing, targets, snapshot) {
        warn!(
            event = "invalid_snapshot",
            semester = %snapshot.semester,
            errors = errors.len(),
        );
        return Err(EngineError::InvalidSnapshot(errors));
    }

    let target_ids: HashSet<&str> = targets.iter().map(String::as_str).collect();
    let target_sections: Vec<&Section> = snapshot
        .sections
        .iter()
        .filter(|s| target_ids.contains(s.id.as_str()))
        .collect();

    info!(
        event = "run_start",
        semester = %snapshot.semester,
        mode = "incremental",
        sections = target_sections.len(),
        fixed = existing.assignments.len(),
        classrooms = snapshot.classrooms.len(),
        time_slots = snapshot.time_slots.len(),
    );
    let started = Instant::now();

    let fixed: Vec<Assignment> = existing
        .assignments
        .iter()
        .filter(|a| !target_ids.contains(a.section_id.as_str()))
        .cloned()
        .collect();

    let mut state = ScheduleState::for_slots(&snapshot.time_slots);
    for a in &fixed {
        if let Some(section) = snapshot.section(&a.section_id) {
            if let Err(reason) = state.place(a.clone(), section) {
                return Err(EngineError::InvalidSnapshot(vec![ValidationError::new(
                    ValidationErrorKind::ConflictingAssignment,
                    format!(
                        "Kept assignment of '{}' at '{}' cannot be seeded: {:?}",
                        a.section_id, a.time_slot_id, reason
                    ),
                )]));
            }
        }
    }

    let output = SearchEngine::new(snapshot, options)
        .with_cancel(cancel.clone())
        .run_on(state, &target_sections);

    let mut assignments = fixed;
    assignments.extend(output.assignments);

    let mut unscheduled: Vec<_> = existing
        .unscheduled
        .iter()
        .filter(|u| !target_ids.contains(u.section.id.as_str()))
        .cloned()
        .collect();
    unscheduled.extend(output.unscheduled);

    let result = RunResult {
        semester: snapshot.semester.clone(),
        assignments,
        unscheduled,
        outcome: output.outcome,
        stats: output.stats,
        catalog: CatalogSummary::from_snapshot(snapshot),
    };
    log_run_end(&result, started);
    Ok(result)
}

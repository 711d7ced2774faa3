//! Conflict repair for edited timetables.
//!
//! Takes assignments that may contain conflicts (typically a timetable
//! edited by hand after a run), picks the sections that have to move, and
//! re-places them around everything else, which stays exactly where it is.
//!
//! # Choosing what moves
//!
//! Conflicts are resolved teacher clashes first, then classroom clashes,
//! then class group clashes, then single-assignment problems (capacity,
//! type, equipment, availability, unknown references). For a clash between
//! two assignments the section of the later one moves, unless either
//! section already moves. Sections whose period count does not match their
//! assignments (including sections with none) move as well, so the result
//! keeps the all-or-nothing shape of a full run.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::{info, warn};

use crate::config::SearchOptions;
use crate::error::{EngineError, EngineResult};
use crate::inspect::{find_conflicts, Conflict, ConflictKind};
use crate::models::{Assignment, CatalogSummary, RunResult, Section, SemesterSnapshot};
use crate::search::{log_run_end, CancelToken, SearchEngine};
use crate::state::ScheduleState;
use crate::validation::{validate_snapshot, ValidationError, ValidationErrorKind};

fn resolution_rank(kind: ConflictKind) -> u8 {
    match kind {
        ConflictKind::TeacherDoubleBooked => 0,
        ConflictKind::ClassroomDoubleBooked => 1,
        ConflictKind::ClassGroupDoubleBooked => 2,
        _ => 3,
    }
}

/// Sections that must be re-placed to clear every conflict, in the order
/// they were picked.
///
/// Assignments of sections missing from the snapshot are not counted; they
/// cannot be repaired and are dropped by [`repair_assignments`].
///
/// # Example
///
/// ```
/// use u_timetable::models::{Assignment, Classroom, SemesterSnapshot, Section};
/// use u_timetable::repair::sections_to_move;
///
/// let snapshot = SemesterSnapshot::new("2025-1")
///     .with_section(Section::new("S1", "C1", "T1", "G1").with_semester("2025-1"))
///     .with_section(Section::new("S2", "C2", "T1", "G2").with_semester("2025-1"))
///     .with_classroom(Classroom::new("R1", 40))
///     .with_classroom(Classroom::new("R2", 40))
///     .with_weekly_grid(1, 2);
///
/// // Same teacher, same slot: the later section moves.
/// let edited = vec![
///     Assignment::new("S1", "R1", "D1P1"),
///     Assignment::new("S2", "R2", "D1P1"),
/// ];
/// assert_eq!(sections_to_move(&edited, &snapshot), vec!["S2".to_string()]);
/// ```
pub fn sections_to_move(assignments: &[Assignment], snapshot: &SemesterSnapshot) -> Vec<String> {
    let mut conflicts: Vec<Conflict> = find_conflicts(assignments, snapshot);
    conflicts.sort_by_key(|c| resolution_rank(c.kind));

    let mut moving: Vec<String> = Vec::new();
    let mut picked: HashSet<String> = HashSet::new();
    let mut pick = |id: &str, moving: &mut Vec<String>| {
        if snapshot.section(id).is_some() && picked.insert(id.to_string()) {
            moving.push(id.to_string());
        }
    };

    for conflict in &conflicts {
        match conflict.assignments.as_slice() {
            [earlier, later] => {
                let a = &assignments[*earlier].section_id;
                let b = &assignments[*later].section_id;
                if !moving.contains(a) && !moving.contains(b) {
                    pick(b.as_str(), &mut moving);
                }
            }
            [only] => pick(assignments[*only].section_id.as_str(), &mut moving),
            _ => {}
        }
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for a in assignments {
        *counts.entry(a.section_id.as_str()).or_insert(0) += 1;
    }
    for s in &snapshot.sections {
        if counts.get(s.id.as_str()).copied().unwrap_or(0) != s.periods_per_week as usize {
            pick(s.id.as_str(), &mut moving);
        }
    }

    moving
}

/// Clears every conflict in `assignments` by re-placing as few sections as
/// the resolution order allows.
///
/// The output lists the untouched assignments first, unchanged and in their
/// input order, followed by the new placements. Moved sections that no
/// longer fit anywhere are unscheduled. Assignments of sections missing
/// from the snapshot are dropped.
///
/// # Errors
///
/// Returns [`EngineError::InvalidSnapshot`] if the snapshot fails
/// validation.
///
/// # Example
///
/// ```
/// use u_timetable::config::SearchOptions;
/// use u_timetable::inspect::validate_assignments;
/// use u_timetable::models::{Assignment, Classroom, SemesterSnapshot, Section};
/// use u_timetable::repair::repair_assignments;
///
/// let snapshot = SemesterSnapshot::new("2025-1")
///     .with_section(Section::new("S1", "C1", "T1", "G1").with_semester("2025-1"))
///     .with_section(Section::new("S2", "C2", "T2", "G2").with_semester("2025-1"))
///     .with_classroom(Classroom::new("R1", 40))
///     .with_weekly_grid(1, 3);
///
/// let edited = vec![
///     Assignment::new("S1", "R1", "D1P1"),
///     Assignment::new("S2", "R1", "D1P1"),
/// ];
/// let repaired = repair_assignments(&edited, &snapshot, &SearchOptions::default()).unwrap();
/// assert_eq!(repaired.assignments[0], edited[0]);
/// assert!(validate_assignments(&repaired.assignments, &snapshot).is_ok());
/// assert!(repaired.is_complete());
/// ```
pub fn repair_assignments(
    assignments: &[Assignment],
    snapshot: &SemesterSnapshot,
    options: &SearchOptions,
) -> EngineResult<RunResult> {
    repair_assignments_with_cancel(assignments, snapshot, options, &CancelToken::new())
}

/// [`repair_assignments`] that stops early once `cancel` is cancelled.
pub fn repair_assignments_with_cancel(
    assignments: &[Assignment],
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

    let moving = sections_to_move(assignments, snapshot);
    let moving_set: HashSet<&str> = moving.iter().map(String::as_str).collect();

    let mut fixed = Vec::new();
    let mut dropped = 0usize;
    for a in assignments {
        if snapshot.section(&a.section_id).is_none() {
            dropped += 1;
        } else if !moving_set.contains(a.section_id.as_str()) {
            fixed.push(a.clone());
        }
    }
    if dropped > 0 {
        warn!(
            event = "assignments_dropped",
            semester = %snapshot.semester,
            dropped,
            reason = "unknown_section",
        );
    }

    info!(
        event = "run_start",
        semester = %snapshot.semester,
        mode = "repair",
        sections = moving.len(),
        fixed = fixed.len(),
        classrooms = snapshot.classrooms.len(),
        time_slots = snapshot.time_slots.len(),
    );
    let started = Instant::now();

    let mut state = ScheduleState::for_slots(&snapshot.time_slots);
    for a in &fixed {
        if let Some(section) = snapshot.section(&a.section_id) {
            if let Err(reason) = state.place(a.clone(), section) {
                return Err(EngineError::InvalidSnapshot(vec![ValidationError::new(
                    ValidationErrorKind::ConflictingAssignment,
                    format!(
                        "Assignment of '{}' at '{}' still conflicts after repair selection: {:?}",
                        a.section_id, a.time_slot_id, reason
                    ),
                )]));
            }
        }
    }

    let targets: Vec<&Section> = snapshot
        .sections
        .iter()
        .filter(|s| moving_set.contains(s.id.as_str()))
        .collect();
    let output = SearchEngine::new(snapshot, options)
        .with_cancel(cancel.clone())
        .run_on(state, &targets);

    let mut repaired = fixed;
    repaired.extend(output.assignments);

    let result = RunResult {
        semester: snapshot.semester.clone(),
        assignments: repaired,
        unscheduled: output.unscheduled,
        outcome: output.outcome,
        stats: output.stats,
        catalog: CatalogSummary::from_snapshot(snapshot),
    };
    log_run_end(&result, started);
    Ok(result)
}

//! Input validation for scheduling runs.
//!
//! Checks the structural integrity of a semester snapshot before any
//! search starts. Detects:
//! - Empty classroom or time slot catalogs
//! - Duplicate IDs
//! - Out-of-range days, inverted time ranges, zero-period sections
//! - Sections filed under another semester
//! - References to unknown time slots
//!
//! For incremental runs it additionally checks the previous result against
//! the snapshot (unknown targets, dangling references, colliding fixed
//! assignments).
//!
//! All problems are collected; validation never stops at the first one.

use std::collections::HashSet;

use crate::models::{RunResult, SemesterSnapshot};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// No classrooms or no time slots.
    EmptyCatalog,
    /// Two entities share the same ID.
    DuplicateId,
    /// Day of week outside 1..=7.
    InvalidDayOfWeek,
    /// Time slot ends before (or when) it starts.
    InvalidTimeRange,
    /// Section requires zero weekly periods.
    InvalidPeriodCount,
    /// Section or previous result belongs to another semester.
    SemesterMismatch,
    /// An ID points to an entity that does not exist.
    UnknownReference,
    /// Fixed assignments of a previous result double-book a resource.
    ConflictingAssignment,
    /// A section is neither placed nor unscheduled in the previous result,
    /// and is not a reschedule target.
    UntrackedSection,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a semester snapshot.
///
/// Checks:
/// 1. At least one classroom and one time slot
/// 2. No duplicate section, classroom, or time slot IDs
/// 3. Days of week within 1..=7 and start < end for every slot
/// 4. Every section needs at least one weekly period
/// 5. Every section belongs to the snapshot's semester
/// 6. Teacher availability only references known time slots
///
/// A snapshot with zero sections is valid (the run is trivially complete).
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_snapshot(snapshot: &SemesterSnapshot) -> ValidationResult {
    let mut errors = Vec::new();

    if snapshot.classrooms.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyCatalog,
            format!("Semester '{}' has no classrooms", snapshot.semester),
        ));
    }
    if snapshot.time_slots.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyCatalog,
            format!("Semester '{}' has no time slots", snapshot.semester),
        ));
    }

    let mut classroom_ids = HashSet::new();
    for c in &snapshot.classrooms {
        if !classroom_ids.insert(c.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate classroom ID: {}", c.id),
            ));
        }
    }

    let mut slot_ids = HashSet::new();
    for t in &snapshot.time_slots {
        if !slot_ids.insert(t.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate time slot ID: {}", t.id),
            ));
        }
        if !(1..=7).contains(&t.day_of_week) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDayOfWeek,
                format!(
                    "Time slot '{}' has day of week {} (expected 1-7)",
                    t.id, t.day_of_week
                ),
            ));
        }
        if t.start_time >= t.end_time {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTimeRange,
                format!("Time slot '{}' must start before it ends", t.id),
            ));
        }
    }

    let mut section_ids = HashSet::new();
    for s in &snapshot.sections {
        if !section_ids.insert(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate section ID: {}", s.id),
            ));
        }
        if s.periods_per_week == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPeriodCount,
                format!("Section '{}' requires zero weekly periods", s.id),
            ));
        }
        if s.semester != snapshot.semester {
            errors.push(ValidationError::new(
                ValidationErrorKind::SemesterMismatch,
                format!(
                    "Section '{}' belongs to semester '{}', not '{}'",
                    s.id, s.semester, snapshot.semester
                ),
            ));
        }
    }

    for a in &snapshot.teacher_availability {
        for slot in &a.unavailable {
            if !slot_ids.contains(slot.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownReference,
                    format!(
                        "Availability of teacher '{}' references unknown time slot '{}'",
                        a.teacher_id, slot
                    ),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the inputs of an incremental reschedule.
///
/// Runs [`validate_snapshot`] and additionally checks:
/// 1. The previous result belongs to the snapshot's semester
/// 2. Every target section exists in the snapshot
/// 3. Every kept (non-target) assignment references a known section,
///    classroom, and time slot
/// 4. Kept assignments do not double-book a classroom, teacher, or class group
/// 5. Every section of the snapshot is a target or appears in the previous
///    result, placed or unscheduled
pub fn validate_reschedule(
    existing: &RunResult,
    targets: &[String],
    snapshot: &SemesterSnapshot,
) -> ValidationResult {
    let mut errors = match validate_snapshot(snapshot) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if existing.semester != snapshot.semester {
        errors.push(ValidationError::new(
            ValidationErrorKind::SemesterMismatch,
            format!(
                "Previous result belongs to semester '{}', not '{}'",
                existing.semester, snapshot.semester
            ),
        ));
    }

    for target in targets {
        if snapshot.section(target).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownReference,
                format!("Reschedule target '{target}' is not in the snapshot"),
            ));
        }
    }

    let target_set: HashSet<&str> = targets.iter().map(String::as_str).collect();
    let tracked: HashSet<&str> = existing
        .assignments
        .iter()
        .map(|a| a.section_id.as_str())
        .chain(existing.unscheduled.iter().map(|u| u.section.id.as_str()))
        .collect();
    for s in &snapshot.sections {
        if !target_set.contains(s.id.as_str()) && !tracked.contains(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UntrackedSection,
                format!(
                    "Section '{}' is missing from the previous result and is not a target",
                    s.id
                ),
            ));
        }
    }

    let mut rooms = HashSet::new();
    let mut teachers = HashSet::new();
    let mut groups = HashSet::new();

    for a in existing
        .assignments
        .iter()
        .filter(|a| !target_set.contains(a.section_id.as_str()))
    {
        let section = snapshot.section(&a.section_id);
        if section.is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownReference,
                format!("Assignment references unknown section '{}'", a.section_id),
            ));
        }
        if snapshot.classroom(&a.classroom_id).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownReference,
                format!(
                    "Assignment of '{}' references unknown classroom '{}'",
                    a.section_id, a.classroom_id
                ),
            ));
        }
        if snapshot.time_slot(&a.time_slot_id).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownReference,
                format!(
                    "Assignment of '{}' references unknown time slot '{}'",
                    a.section_id, a.time_slot_id
                ),
            ));
        }

        let slot = a.time_slot_id.as_str();
        if !rooms.insert((a.classroom_id.as_str(), slot)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::ConflictingAssignment,
                format!("Classroom '{}' is double-booked at '{}'", a.classroom_id, slot),
            ));
        }
        if let Some(s) = section {
            if !teachers.insert((s.teacher_id.as_str(), slot)) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ConflictingAssignment,
                    format!("Teacher '{}' is double-booked at '{}'", s.teacher_id, slot),
                ));
            }
            if !groups.insert((s.class_group_id.as_str(), slot)) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ConflictingAssignment,
                    format!(
                        "Class group '{}' is double-booked at '{}'",
                        s.class_group_id, slot
                    ),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Constraint checking.
//!
//! Hard constraints decide whether a candidate assignment is allowed at all;
//! soft constraints only rank allowed candidates (see [`soft`]).
//!
//! # Hard constraints (in check order)
//!
//! | Check | Rejection |
//! |-------|-----------|
//! | Seats ≥ students | `CapacityExceeded` |
//! | Room suits course type | `TypeMismatch` |
//! | Room has all required equipment | `EquipmentMissing` |
//! | Teacher available at slot | `TeacherUnavailable` |
//! | Classroom free at slot | `DoubleBookedClassroom` |
//! | Teacher free at slot | `DoubleBookedTeacher` |
//! | Class group free at slot | `DoubleBookedClassGroup` |
//!
//! The double-booking checks go through the state's occupancy lookups, so a
//! state built for a slot catalog also rejects time-overlapping slots.
//!
//! All functions here are pure: they read the state and never modify it.

pub mod soft;

pub use soft::{
    CapacityFit, Compactness, DayIndex, LoadBalance, SoftContext, SoftRule, SoftScorer,
};

use crate::models::{Classroom, RejectionReason, Section, TeacherAvailability, TimeSlot};
use crate::state::ScheduleState;

/// A (section, classroom, time slot) triple under consideration.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub section: &'a Section,
    pub classroom: &'a Classroom,
    pub time_slot: &'a TimeSlot,
    /// The section teacher's exclusion list, if any.
    pub availability: Option<&'a TeacherAvailability>,
}

impl<'a> Candidate<'a> {
    /// Creates a candidate with no teacher exclusions.
    pub fn new(section: &'a Section, classroom: &'a Classroom, time_slot: &'a TimeSlot) -> Self {
        Self {
            section,
            classroom,
            time_slot,
            availability: None,
        }
    }

    /// Attaches the teacher's availability record.
    pub fn with_availability(mut self, availability: Option<&'a TeacherAvailability>) -> Self {
        self.availability = availability;
        self
    }
}

/// Outcome of a hard-constraint check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectionReason),
}

impl Verdict {
    /// Whether the candidate passed.
    #[inline]
    pub fn is_accepted(self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Checks every hard constraint, returning the first failure.
pub fn check(candidate: &Candidate<'_>, state: &ScheduleState) -> Verdict {
    if let Some(reason) = static_failures(candidate.section, candidate.classroom).first() {
        return Verdict::Rejected(*reason);
    }
    if !is_teacher_available(candidate) {
        return Verdict::Rejected(RejectionReason::TeacherUnavailable);
    }
    match exclusivity_failures(candidate, state).first() {
        Some(reason) => Verdict::Rejected(*reason),
        None => Verdict::Accepted,
    }
}

/// Checks every hard constraint, returning all failures (empty = accepted).
pub fn check_all(candidate: &Candidate<'_>, state: &ScheduleState) -> Vec<RejectionReason> {
    let mut reasons = static_failures(candidate.section, candidate.classroom);
    if !is_teacher_available(candidate) {
        reasons.push(RejectionReason::TeacherUnavailable);
    }
    reasons.extend(exclusivity_failures(candidate, state));
    reasons
}

/// Static fit of a classroom for a section: capacity, type, and equipment.
///
/// Independent of time slot and placements, so it can be evaluated once per
/// (section, classroom) pair before search.
pub fn static_failures(section: &Section, classroom: &Classroom) -> Vec<RejectionReason> {
    let mut reasons = Vec::new();
    if !classroom.has_capacity_for(section.max_students) {
        reasons.push(RejectionReason::CapacityExceeded);
    }
    if !classroom.is_suitable_for(section.required_course_type.as_deref()) {
        reasons.push(RejectionReason::TypeMismatch);
    }
    if !classroom.has_equipment(&section.required_equipment) {
        reasons.push(RejectionReason::EquipmentMissing);
    }
    reasons
}

/// Whether the classroom passes every static check for the section.
#[inline]
pub fn static_fit(section: &Section, classroom: &Classroom) -> bool {
    static_failures(section, classroom).is_empty()
}

fn is_teacher_available(candidate: &Candidate<'_>) -> bool {
    candidate
        .availability
        .map_or(true, |a| a.is_available(&candidate.time_slot.id))
}

fn exclusivity_failures(candidate: &Candidate<'_>, state: &ScheduleState) -> Vec<RejectionReason> {
    let slot = candidate.time_slot.id.as_str();
    let mut reasons = Vec::new();
    if state.classroom_occupant(&candidate.classroom.id, slot).is_some() {
        reasons.push(RejectionReason::DoubleBookedClassroom);
    }
    if state
        .teacher_occupant(&candidate.section.teacher_id, slot)
        .is_some()
    {
        reasons.push(RejectionReason::DoubleBookedTeacher);
    }
    if state
        .group_occupant(&candidate.section.class_group_id, slot)
        .is_some()
    {
        reasons.push(RejectionReason::DoubleBookedClassGroup);
    }
    reasons
}

//! Conflict inspection and placement recommendations.
//!
//! Read-only helpers for timetables edited outside the search: finding
//! every conflict in a list of assignments, and suggesting where a section
//! could still go given the current occupancy.

use serde::{Deserialize, Serialize};

use crate::constraints::{check, static_failures, Candidate, Verdict};
use crate::models::{
    Assignment, Classroom, RejectionReason, SemesterSnapshot, Section, TimeSlot,
};
use crate::state::ScheduleState;

/// Category of a timetable conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    ClassroomDoubleBooked,
    TeacherDoubleBooked,
    ClassGroupDoubleBooked,
    CapacityExceeded,
    TypeMismatch,
    EquipmentMissing,
    TeacherUnavailable,
    UnknownReference,
}

impl From<RejectionReason> for ConflictKind {
    fn from(reason: RejectionReason) -> Self {
        match reason {
            RejectionReason::DoubleBookedClassroom => ConflictKind::ClassroomDoubleBooked,
            RejectionReason::DoubleBookedTeacher => ConflictKind::TeacherDoubleBooked,
            RejectionReason::DoubleBookedClassGroup => ConflictKind::ClassGroupDoubleBooked,
            RejectionReason::CapacityExceeded => ConflictKind::CapacityExceeded,
            RejectionReason::TypeMismatch => ConflictKind::TypeMismatch,
            RejectionReason::EquipmentMissing => ConflictKind::EquipmentMissing,
            RejectionReason::TeacherUnavailable => ConflictKind::TeacherUnavailable,
        }
    }
}

/// A conflict found in a list of assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    /// Indexes of the offending assignments (one, or a colliding pair).
    pub assignments: Vec<usize>,
    pub message: String,
}

impl Conflict {
    fn new(kind: ConflictKind, assignments: Vec<usize>, message: String) -> Self {
        Self {
            kind,
            assignments,
            message,
        }
    }
}

/// Finds every conflict in `assignments`.
///
/// Reports, per assignment, unknown references, static violations
/// (capacity, type, equipment) and teacher unavailability; and, per pair,
/// double-booked classrooms, teachers and class groups. Two assignments
/// collide when they share a time slot or their slots overlap in time.
///
/// Conflicts are ordered by the index of the later assignment involved.
pub fn find_conflicts(assignments: &[Assignment], snapshot: &SemesterSnapshot) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    let resolved: Vec<Option<(&Section, &Classroom, &TimeSlot)>> = assignments
        .iter()
        .map(|a| {
            Some((
                snapshot.section(&a.section_id)?,
                snapshot.classroom(&a.classroom_id)?,
                snapshot.time_slot(&a.time_slot_id)?,
            ))
        })
        .collect();

    for (j, a) in assignments.iter().enumerate() {
        let Some((section, room, slot)) = resolved[j] else {
            conflicts.push(Conflict::new(
                ConflictKind::UnknownReference,
                vec![j],
                format!(
                    "Assignment {j} ({} / {} / {}) references an unknown entity",
                    a.section_id, a.classroom_id, a.time_slot_id
                ),
            ));
            continue;
        };

        for reason in static_failures(section, room) {
            conflicts.push(Conflict::new(
                reason.into(),
                vec![j],
                format!("Classroom '{}' cannot host section '{}': {:?}", room.id, section.id, reason),
            ));
        }
        if !snapshot.is_teacher_available(&section.teacher_id, &slot.id) {
            conflicts.push(Conflict::new(
                ConflictKind::TeacherUnavailable,
                vec![j],
                format!("Teacher '{}' is unavailable at '{}'", section.teacher_id, slot.id),
            ));
        }

        for (i, earlier) in resolved.iter().enumerate().take(j) {
            let Some((other, other_room, other_slot)) = *earlier else {
                continue;
            };
            if slot.id != other_slot.id && !slot.overlaps(other_slot) {
                continue;
            }
            if room.id == other_room.id {
                conflicts.push(Conflict::new(
                    ConflictKind::ClassroomDoubleBooked,
                    vec![i, j],
                    format!(
                        "Classroom '{}' is booked by '{}' and '{}' at '{}'",
                        room.id, other.id, section.id, slot.id
                    ),
                ));
            }
            if section.teacher_id == other.teacher_id {
                conflicts.push(Conflict::new(
                    ConflictKind::TeacherDoubleBooked,
                    vec![i, j],
                    format!(
                        "Teacher '{}' teaches '{}' and '{}' at '{}'",
                        section.teacher_id, other.id, section.id, slot.id
                    ),
                ));
            }
            if section.class_group_id == other.class_group_id {
                conflicts.push(Conflict::new(
                    ConflictKind::ClassGroupDoubleBooked,
                    vec![i, j],
                    format!(
                        "Class group '{}' attends '{}' and '{}' at '{}'",
                        section.class_group_id, other.id, section.id, slot.id
                    ),
                ));
            }
        }
    }

    conflicts
}

/// `Ok(())` if `assignments` are conflict-free, otherwise every conflict.
pub fn validate_assignments(
    assignments: &[Assignment],
    snapshot: &SemesterSnapshot,
) -> Result<(), Vec<Conflict>> {
    let conflicts = find_conflicts(assignments, snapshot);
    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(conflicts)
    }
}

/// Builds the occupancy of a list of assignments.
///
/// Slots of the snapshot that overlap in time collide in the returned state.
/// Assignments with unknown sections or that collide with an earlier one
/// are skipped.
pub fn occupancy(assignments: &[Assignment], snapshot: &SemesterSnapshot) -> ScheduleState {
    let mut state = ScheduleState::for_slots(&snapshot.time_slots);
    for a in assignments {
        if let Some(section) = snapshot.section(&a.section_id) {
            let _ = state.place(a.clone(), section);
        }
    }
    state
}

/// Time slots where `section` could be placed now.
///
/// With a classroom, only that classroom is considered; otherwise a slot
/// qualifies if any classroom accepts the section there. Catalog order.
pub fn available_time_slots<'a>(
    section: &Section,
    classroom: Option<&Classroom>,
    state: &ScheduleState,
    snapshot: &'a SemesterSnapshot,
) -> Vec<&'a TimeSlot> {
    let availability = snapshot.availability_for(&section.teacher_id);
    let rooms: Vec<&Classroom> = match classroom {
        Some(room) => vec![room],
        None => snapshot.classrooms.iter().collect(),
    };

    snapshot
        .time_slots
        .iter()
        .filter(|slot| {
            rooms.iter().any(|room| {
                let candidate = Candidate::new(section, room, slot).with_availability(availability);
                check(&candidate, state) == Verdict::Accepted
            })
        })
        .collect()
}

/// Classrooms that accept `section` at `time_slot`, smallest first.
///
/// Ties on capacity are ordered by classroom ID.
pub fn recommended_classrooms<'a>(
    section: &Section,
    time_slot: &TimeSlot,
    state: &ScheduleState,
    snapshot: &'a SemesterSnapshot,
) -> Vec<&'a Classroom> {
    let availability = snapshot.availability_for(&section.teacher_id);
    let mut rooms: Vec<&Classroom> = snapshot
        .classrooms
        .iter()
        .filter(|room| {
            let candidate =
                Candidate::new(section, room, time_slot).with_availability(availability);
            check(&candidate, state).is_accepted()
        })
        .collect();
    rooms.sort_by(|a, b| a.capacity.cmp(&b.capacity).then_with(|| a.id.cmp(&b.id)));
    rooms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Equipment, TeacherAvailability};

    fn snapshot() -> SemesterSnapshot {
        SemesterSnapshot::new("2025-1")
            .with_section(Section::new("S1", "C1", "T1", "G1").with_semester("2025-1").with_students(30))
            .with_section(Section::new("S2", "C2", "T1", "G2").with_semester("2025-1"))
            .with_section(Section::new("S3", "C3", "T3", "G1").with_semester("2025-1"))
            .with_section(
                Section::new("S4", "C4", "T4", "G4")
                    .with_semester("2025-1")
                    .with_equipment(Equipment::Projector),
            )
            .with_classroom(Classroom::new("BIG", 100).with_equipment(Equipment::Projector))
            .with_classroom(Classroom::new("MID", 40))
            .with_classroom(Classroom::new("SMALL", 20))
            .with_weekly_grid(1, 3)
            .with_availability(TeacherAvailability::new("T4").with_unavailable("D1P3"))
    }

    #[test]
    fn test_clean_assignments() {
        let snap = snapshot();
        let assignments = vec![
            Assignment::new("S1", "MID", "D1P1"),
            Assignment::new("S2", "MID", "D1P2"),
            Assignment::new("S4", "BIG", "D1P1"),
        ];
        assert!(validate_assignments(&assignments, &snap).is_ok());
    }

    #[test]
    fn test_pairwise_conflicts() {
        let snap = snapshot();
        let assignments = vec![
            Assignment::new("S1", "MID", "D1P1"),
            Assignment::new("S2", "MID", "D1P1"),
            Assignment::new("S3", "BIG", "D1P1"),
        ];
        let conflicts = validate_assignments(&assignments, &snap).unwrap_err();
        let kinds: Vec<ConflictKind> = conflicts.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ConflictKind::ClassroomDoubleBooked,
                ConflictKind::TeacherDoubleBooked,
                ConflictKind::ClassGroupDoubleBooked,
            ]
        );
        assert_eq!(conflicts[0].assignments, vec![0, 1]);
        assert_eq!(conflicts[2].assignments, vec![0, 2]);
    }

    #[test]
    fn test_overlapping_slots_collide() {
        let snap = snapshot().with_time_slot(TimeSlot::new("ODD", 1, 9, 500, 560));
        let assignments = vec![
            Assignment::new("S1", "MID", "D1P1"),
            Assignment::new("S3", "BIG", "ODD"),
        ];
        let conflicts = find_conflicts(&assignments, &snap);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::ClassGroupDoubleBooked);
    }

    #[test]
    fn test_static_and_reference_conflicts() {
        let snap = snapshot();
        let assignments = vec![
            Assignment::new("S1", "SMALL", "D1P1"),
            Assignment::new("S4", "BIG", "D1P3"),
            Assignment::new("S9", "MID", "D1P2"),
        ];
        let kinds: Vec<ConflictKind> = find_conflicts(&assignments, &snap)
            .into_iter()
            .map(|c| c.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ConflictKind::CapacityExceeded,
                ConflictKind::TeacherUnavailable,
                ConflictKind::UnknownReference,
            ]
        );
    }

    #[test]
    fn test_available_time_slots() {
        let snap = snapshot();
        let state = occupancy(&[Assignment::new("S1", "MID", "D1P1")], &snap);

        // S2 shares T1 with S1, so D1P1 is out.
        let s2 = snap.section("S2").unwrap();
        let ids: Vec<&str> = available_time_slots(s2, None, &state, &snap)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["D1P2", "D1P3"]);

        // S4 needs the projector room and T4 is away at D1P3.
        let s4 = snap.section("S4").unwrap();
        let small = snap.classroom("SMALL").unwrap();
        assert!(available_time_slots(s4, Some(small), &state, &snap).is_empty());
        let ids: Vec<&str> = available_time_slots(s4, None, &state, &snap)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["D1P1", "D1P2"]);
    }

    #[test]
    fn test_recommendations_respect_overlapping_slots() {
        let snap = snapshot().with_time_slot(TimeSlot::new("ODD", 1, 9, 500, 560));
        let state = occupancy(&[Assignment::new("S1", "MID", "D1P1")], &snap);
        let odd = snap.time_slot("ODD").unwrap();

        // ODD overlaps D1P1, so MID and S1's teacher are busy there.
        let s2 = snap.section("S2").unwrap();
        let slots: Vec<&str> = available_time_slots(s2, None, &state, &snap)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert!(!slots.contains(&"ODD"));
        assert!(recommended_classrooms(s2, odd, &state, &snap).is_empty());

        let s4 = snap.section("S4").unwrap();
        let ids: Vec<&str> = recommended_classrooms(s4, odd, &state, &snap)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["BIG"]);
    }

    #[test]
    fn test_recommended_classrooms() {
        let snap = snapshot();
        let state = occupancy(&[Assignment::new("S2", "MID", "D1P1")], &snap);
        let slot = snap.time_slot("D1P1").unwrap();

        let s3 = snap.section("S3").unwrap();
        let ids: Vec<&str> = recommended_classrooms(s3, slot, &state, &snap)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["SMALL", "BIG"]);

        // S1 needs 30 seats; SMALL is too small and MID is taken.
        let s1 = snap.section("S1").unwrap();
        let ids: Vec<&str> = recommended_classrooms(s1, slot, &state, &snap)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["BIG"]);
    }
}

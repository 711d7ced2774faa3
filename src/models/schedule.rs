//! Assignment and run result models.
//!
//! An assignment binds one weekly period of a section to a
//! (classroom, time slot) cell. A run result collects the assignments of one
//! scheduling run together with the sections that could not be placed and why.

use serde::{Deserialize, Serialize};

use super::{Section, SemesterSnapshot};

/// One weekly period of a section placed in a classroom at a time slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    /// Placed section.
    pub section_id: String,
    /// Hosting classroom.
    pub classroom_id: String,
    /// Calendar cell.
    pub time_slot_id: String,
}

impl Assignment {
    /// Creates a new assignment.
    pub fn new(
        section_id: impl Into<String>,
        classroom_id: impl Into<String>,
        time_slot_id: impl Into<String>,
    ) -> Self {
        Self {
            section_id: section_id.into(),
            classroom_id: classroom_id.into(),
            time_slot_id: time_slot_id.into(),
        }
    }
}

/// Why a hard constraint rejected a candidate assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// The classroom is already in use at this slot.
    DoubleBookedClassroom,
    /// The teacher already teaches at this slot.
    DoubleBookedTeacher,
    /// The class group already attends another section at this slot.
    DoubleBookedClassGroup,
    /// The classroom seats fewer than the section's students.
    CapacityExceeded,
    /// The classroom does not suit the section's course type.
    TypeMismatch,
    /// The classroom lacks required equipment.
    EquipmentMissing,
    /// The teacher is unavailable at this slot.
    TeacherUnavailable,
}

impl RejectionReason {
    /// Whether the reason depends only on the section and classroom,
    /// not on the time slot or current placements.
    pub fn is_static(self) -> bool {
        matches!(
            self,
            RejectionReason::CapacityExceeded
                | RejectionReason::TypeMismatch
                | RejectionReason::EquipmentMissing
        )
    }
}

/// Why a section ended up without assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnscheduledReason {
    /// Search (with backtracking) found no conflict-free cell.
    NoFeasibleSlot,
    /// No classroom seats the section.
    CapacityExceeded,
    /// No classroom suits the section's course type.
    TypeMismatch,
    /// No classroom provides the required equipment.
    EquipmentMissing,
    /// The teacher is unavailable in every slot.
    TeacherUnavailable,
    /// The iteration or time budget ran out before the section was placed.
    BudgetExhausted,
    /// The run was cancelled before the section was placed.
    Cancelled,
}

impl From<RejectionReason> for UnscheduledReason {
    fn from(reason: RejectionReason) -> Self {
        match reason {
            RejectionReason::CapacityExceeded => UnscheduledReason::CapacityExceeded,
            RejectionReason::TypeMismatch => UnscheduledReason::TypeMismatch,
            RejectionReason::EquipmentMissing => UnscheduledReason::EquipmentMissing,
            RejectionReason::TeacherUnavailable => UnscheduledReason::TeacherUnavailable,
            RejectionReason::DoubleBookedClassroom
            | RejectionReason::DoubleBookedTeacher
            | RejectionReason::DoubleBookedClassGroup => UnscheduledReason::NoFeasibleSlot,
        }
    }
}

/// A section the run could not place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnscheduledSection {
    /// The section, as supplied in the snapshot.
    pub section: Section,
    /// Reason code.
    pub reason: UnscheduledReason,
}

impl UnscheduledSection {
    /// Creates a new unscheduled entry.
    pub fn new(section: Section, reason: UnscheduledReason) -> Self {
        Self { section, reason }
    }
}

/// Which budget stopped the search early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetLimit {
    Iterations,
    Duration,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every work item was either placed or dropped.
    Completed,
    /// A budget stopped the search; the result is partial.
    BudgetExhausted(BudgetLimit),
    /// A cancellation request stopped the search; the result is partial.
    Cancelled,
}

/// Deterministic search counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Placement attempts.
    pub iterations: u64,
    /// Placements undone to make room for a stuck section.
    pub backtracks: u64,
    /// Successful placements (including ones later undone).
    pub placements: u64,
}

/// Catalog dimensions captured at run time, so statistics can be derived
/// from the result alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    /// Classroom IDs in catalog order.
    pub classroom_ids: Vec<String>,
    /// Time slot IDs in catalog order.
    pub time_slot_ids: Vec<String>,
    /// Number of sections in the snapshot.
    pub section_count: usize,
}

impl CatalogSummary {
    /// Captures the catalog dimensions of a snapshot.
    pub fn from_snapshot(snapshot: &SemesterSnapshot) -> Self {
        Self {
            classroom_ids: snapshot.classrooms.iter().map(|c| c.id.clone()).collect(),
            time_slot_ids: snapshot.time_slots.iter().map(|t| t.id.clone()).collect(),
            section_count: snapshot.sections.len(),
        }
    }
}

/// The output of one scheduling run. Never mutated after it is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Semester key.
    pub semester: String,
    /// Placed weekly periods.
    pub assignments: Vec<Assignment>,
    /// Sections without assignments.
    pub unscheduled: Vec<UnscheduledSection>,
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Search counters.
    pub stats: SearchStats,
    /// Catalog dimensions.
    pub catalog: CatalogSummary,
}

impl RunResult {
    /// Whether every section was placed.
    pub fn is_complete(&self) -> bool {
        self.unscheduled.is_empty() && self.outcome == RunOutcome::Completed
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// All assignments of a section.
    pub fn assignments_for_section(&self, section_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.section_id == section_id)
            .collect()
    }

    /// All assignments hosted by a classroom.
    pub fn assignments_for_classroom(&self, classroom_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.classroom_id == classroom_id)
            .collect()
    }

    /// All assignments at a time slot.
    pub fn assignments_at(&self, time_slot_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.time_slot_id == time_slot_id)
            .collect()
    }

    /// The unscheduled entry of a section, if any.
    pub fn unscheduled_entry(&self, section_id: &str) -> Option<&UnscheduledSection> {
        self.unscheduled.iter().find(|u| u.section.id == section_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> RunResult {
        RunResult {
            semester: "2025-1".into(),
            assignments: vec![
                Assignment::new("S1", "R1", "D1P1"),
                Assignment::new("S1", "R1", "D2P1"),
                Assignment::new("S2", "R2", "D1P1"),
            ],
            unscheduled: vec![UnscheduledSection::new(
                Section::new("S3", "C3", "T3", "G3"),
                UnscheduledReason::NoFeasibleSlot,
            )],
            outcome: RunOutcome::Completed,
            stats: SearchStats::default(),
            catalog: CatalogSummary::default(),
        }
    }

    #[test]
    fn test_queries() {
        let r = sample_result();
        assert_eq!(r.assignment_count(), 3);
        assert_eq!(r.assignments_for_section("S1").len(), 2);
        assert_eq!(r.assignments_for_classroom("R2").len(), 1);
        assert_eq!(r.assignments_at("D1P1").len(), 2);
        assert!(r.unscheduled_entry("S3").is_some());
        assert!(r.unscheduled_entry("S1").is_none());
        assert!(!r.is_complete());
    }

    #[test]
    fn test_rejection_to_unscheduled() {
        assert_eq!(
            UnscheduledReason::from(RejectionReason::EquipmentMissing),
            UnscheduledReason::EquipmentMissing
        );
        assert_eq!(
            UnscheduledReason::from(RejectionReason::DoubleBookedTeacher),
            UnscheduledReason::NoFeasibleSlot
        );
    }

    #[test]
    fn test_static_reasons() {
        assert!(RejectionReason::CapacityExceeded.is_static());
        assert!(RejectionReason::TypeMismatch.is_static());
        assert!(!RejectionReason::TeacherUnavailable.is_static());
        assert!(!RejectionReason::DoubleBookedClassroom.is_static());
    }

    #[test]
    fn test_result_serializes() {
        let r = sample_result();
        let json = serde_json::to_string(&r).unwrap();
        let back: RunResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}

//! Section model.
//!
//! A section is one offering of a course: one teacher, one class group,
//! one semester, and a fixed number of weekly periods. It is the unit the
//! engine places; each weekly period becomes one assignment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Equipment;

/// A course section to be placed on the timetable.
///
/// Immutable for the duration of a scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Unique section identifier.
    pub id: String,
    /// Course this section belongs to.
    pub course_id: String,
    /// Teacher delivering the section.
    pub teacher_id: String,
    /// Cohort attending the section together.
    pub class_group_id: String,
    /// Semester key (e.g., "2025-1").
    pub semester: String,
    /// Number of weekly periods to place.
    pub periods_per_week: u32,
    /// Enrolled (or expected) students.
    pub max_students: u32,
    /// Course type the classroom must support. `None` = any classroom type.
    pub required_course_type: Option<String>,
    /// Equipment the classroom must provide.
    pub required_equipment: BTreeSet<Equipment>,
    /// Scheduling priority (higher = placed earlier among equally scarce sections).
    pub priority: i32,
}

impl Section {
    /// Creates a single-period section with no special requirements.
    pub fn new(
        id: impl Into<String>,
        course_id: impl Into<String>,
        teacher_id: impl Into<String>,
        class_group_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            course_id: course_id.into(),
            teacher_id: teacher_id.into(),
            class_group_id: class_group_id.into(),
            semester: String::new(),
            periods_per_week: 1,
            max_students: 0,
            required_course_type: None,
            required_equipment: BTreeSet::new(),
            priority: 0,
        }
    }

    /// Sets the semester key.
    pub fn with_semester(mut self, semester: impl Into<String>) -> Self {
        self.semester = semester.into();
        self
    }

    /// Sets the number of weekly periods.
    pub fn with_periods(mut self, periods_per_week: u32) -> Self {
        self.periods_per_week = periods_per_week;
        self
    }

    /// Sets the student count.
    pub fn with_students(mut self, max_students: u32) -> Self {
        self.max_students = max_students;
        self
    }

    /// Requires a classroom suitable for the given course type.
    pub fn with_course_type(mut self, course_type: impl Into<String>) -> Self {
        self.required_course_type = Some(course_type.into());
        self
    }

    /// Adds a required equipment tag.
    pub fn with_equipment(mut self, equipment: Equipment) -> Self {
        self.required_equipment.insert(equipment);
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_builder() {
        let s = Section::new("S1", "MATH101", "T1", "G1")
            .with_semester("2025-1")
            .with_periods(3)
            .with_students(40)
            .with_course_type("lab")
            .with_equipment(Equipment::Projector)
            .with_equipment(Equipment::Computer)
            .with_priority(5);

        assert_eq!(s.id, "S1");
        assert_eq!(s.course_id, "MATH101");
        assert_eq!(s.teacher_id, "T1");
        assert_eq!(s.class_group_id, "G1");
        assert_eq!(s.semester, "2025-1");
        assert_eq!(s.periods_per_week, 3);
        assert_eq!(s.max_students, 40);
        assert_eq!(s.required_course_type.as_deref(), Some("lab"));
        assert_eq!(s.required_equipment.len(), 2);
        assert_eq!(s.priority, 5);
    }

    #[test]
    fn test_section_defaults() {
        let s = Section::new("S1", "C1", "T1", "G1");
        assert_eq!(s.periods_per_week, 1);
        assert!(s.required_course_type.is_none());
        assert!(s.required_equipment.is_empty());
    }
}

//! Semester snapshot: the read-only input of a scheduling run.

use serde::{Deserialize, Serialize};

use super::{Classroom, Section, TeacherAvailability, TimeSlot};

/// Everything the engine needs to schedule one semester.
///
/// Supplied by the persistence layer; the engine only borrows it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemesterSnapshot {
    /// Semester key.
    pub semester: String,
    /// Sections to place.
    pub sections: Vec<Section>,
    /// Classroom catalog.
    pub classrooms: Vec<Classroom>,
    /// Weekly time slot catalog.
    pub time_slots: Vec<TimeSlot>,
    /// Teacher exclusion lists (teachers without a record are always available).
    pub teacher_availability: Vec<TeacherAvailability>,
}

impl SemesterSnapshot {
    /// Creates an empty snapshot for a semester.
    pub fn new(semester: impl Into<String>) -> Self {
        Self {
            semester: semester.into(),
            ..Default::default()
        }
    }

    /// Adds a section.
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Adds a classroom.
    pub fn with_classroom(mut self, classroom: Classroom) -> Self {
        self.classrooms.push(classroom);
        self
    }

    /// Adds a time slot.
    pub fn with_time_slot(mut self, time_slot: TimeSlot) -> Self {
        self.time_slots.push(time_slot);
        self
    }

    /// Adds a teacher availability record.
    pub fn with_availability(mut self, availability: TeacherAvailability) -> Self {
        self.teacher_availability.push(availability);
        self
    }

    /// Adds a standard weekly grid of `days` × `periods` slots with IDs `D{day}P{period}`.
    pub fn with_weekly_grid(mut self, days: u8, periods: u8) -> Self {
        for day in 1..=days {
            for period in 1..=periods {
                self.time_slots
                    .push(TimeSlot::standard(format!("D{day}P{period}"), day, period));
            }
        }
        self
    }

    /// Finds a section by ID.
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Finds a classroom by ID.
    pub fn classroom(&self, id: &str) -> Option<&Classroom> {
        self.classrooms.iter().find(|c| c.id == id)
    }

    /// Finds a time slot by ID.
    pub fn time_slot(&self, id: &str) -> Option<&TimeSlot> {
        self.time_slots.iter().find(|t| t.id == id)
    }

    /// Finds the availability record for a teacher.
    pub fn availability_for(&self, teacher_id: &str) -> Option<&TeacherAvailability> {
        self.teacher_availability
            .iter()
            .find(|a| a.teacher_id == teacher_id)
    }

    /// Whether a teacher can teach in a slot (no record = always available).
    pub fn is_teacher_available(&self, teacher_id: &str, time_slot_id: &str) -> bool {
        self.availability_for(teacher_id)
            .map_or(true, |a| a.is_available(time_slot_id))
    }
}

//! Classroom model.
//!
//! Classrooms are the spatial resource of the timetable. Each has a seat
//! capacity, a type, a set of installed equipment, and optionally a list
//! of course types it is reserved for.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Equipment installed in a classroom or required by a section.
///
/// Ordered so equipment sets iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Projector,
    Audio,
    Computer,
    Network,
    AirConditioning,
    Laboratory,
    /// Institution-specific tag.
    Custom(String),
}

/// A classroom that sections can be placed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classroom {
    /// Unique classroom identifier.
    pub id: String,
    /// Human-readable name (e.g., "A-101").
    pub name: String,
    /// Seat count.
    pub capacity: u32,
    /// Classroom classification (e.g., "normal", "laboratory", "lecture_hall").
    pub classroom_type: String,
    /// Course types this room is reserved for. Empty = suits every course type.
    pub suitable_course_types: BTreeSet<String>,
    /// Installed equipment.
    pub equipment: BTreeSet<Equipment>,
    /// Building the room belongs to.
    pub building_id: Option<String>,
}

impl Classroom {
    /// Creates a normal classroom with the given capacity.
    pub fn new(id: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            capacity,
            classroom_type: "normal".to_string(),
            suitable_course_types: BTreeSet::new(),
            equipment: BTreeSet::new(),
            building_id: None,
        }
    }

    /// Sets the classroom name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the classroom type.
    pub fn with_type(mut self, classroom_type: impl Into<String>) -> Self {
        self.classroom_type = classroom_type.into();
        self
    }

    /// Restricts the room to a course type (may be called repeatedly).
    pub fn with_suitable_course_type(mut self, course_type: impl Into<String>) -> Self {
        self.suitable_course_types.insert(course_type.into());
        self
    }

    /// Adds an equipment tag.
    pub fn with_equipment(mut self, equipment: Equipment) -> Self {
        self.equipment.insert(equipment);
        self
    }

    /// Sets the building.
    pub fn with_building(mut self, building_id: impl Into<String>) -> Self {
        self.building_id = Some(building_id.into());
        self
    }

    /// Whether the room can host the given course type.
    ///
    /// `None` (no requirement) always fits; an unrestricted room fits every type.
    pub fn is_suitable_for(&self, course_type: Option<&str>) -> bool {
        match course_type {
            None => true,
            Some(t) => {
                self.suitable_course_types.is_empty() || self.suitable_course_types.contains(t)
            }
        }
    }

    /// Whether the room provides every listed equipment tag.
    pub fn has_equipment(&self, required: &BTreeSet<Equipment>) -> bool {
        required.is_subset(&self.equipment)
    }

    /// Whether the room seats at least `students`.
    #[inline]
    pub fn has_capacity_for(&self, students: u32) -> bool {
        self.capacity >= students
    }
}

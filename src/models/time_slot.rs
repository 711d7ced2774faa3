//! Time slot and teacher availability models.
//!
//! A time slot is one (day, period) cell of the weekly calendar, shared by
//! every classroom in the institution. Times are minutes since midnight.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Part of the day a slot falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    Morning,
    Afternoon,
    Evening,
}

impl SlotType {
    /// Derives the slot type from a start time (minutes since midnight).
    ///
    /// Before 12:00 is morning, before 18:00 afternoon, otherwise evening.
    pub fn from_start(start_minute: u16) -> Self {
        if start_minute < 12 * 60 {
            SlotType::Morning
        } else if start_minute < 18 * 60 {
            SlotType::Afternoon
        } else {
            SlotType::Evening
        }
    }
}

/// A weekly calendar cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Unique slot identifier.
    pub id: String,
    /// Day of week, 1 (Monday) through 7 (Sunday).
    pub day_of_week: u8,
    /// Period number within the day (1-based).
    pub period_number: u8,
    /// Start time (minutes since midnight).
    pub start_time: u16,
    /// End time (minutes since midnight, exclusive).
    pub end_time: u16,
    /// Explicit slot type. `None` = derived from the start time.
    pub slot_type: Option<SlotType>,
}

impl TimeSlot {
    /// Creates a slot with an explicit time range.
    pub fn new(
        id: impl Into<String>,
        day_of_week: u8,
        period_number: u8,
        start_time: u16,
        end_time: u16,
    ) -> Self {
        Self {
            id: id.into(),
            day_of_week,
            period_number,
            start_time,
            end_time,
            slot_type: None,
        }
    }

    /// Creates a 45-minute slot on a standard grid: period 1 starts at 08:00,
    /// periods are 55 minutes apart.
    pub fn standard(id: impl Into<String>, day_of_week: u8, period_number: u8) -> Self {
        let start = 8 * 60 + (period_number.saturating_sub(1) as u16) * 55;
        Self::new(id, day_of_week, period_number, start, start + 45)
    }

    /// Sets an explicit slot type.
    pub fn with_slot_type(mut self, slot_type: SlotType) -> Self {
        self.slot_type = Some(slot_type);
        self
    }

    /// Effective slot type (explicit, or derived from the start time).
    pub fn effective_slot_type(&self) -> SlotType {
        self.slot_type
            .unwrap_or_else(|| SlotType::from_start(self.start_time))
    }

    /// Slot length in minutes (0 for an inverted range).
    #[inline]
    pub fn duration_minutes(&self) -> u16 {
        self.end_time.saturating_sub(self.start_time)
    }

    /// Whether two slots overlap in wall-clock time on the same day.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.day_of_week == other.day_of_week
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }
}

/// Slots a teacher cannot teach in (fixed commitments elsewhere).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherAvailability {
    /// Teacher identifier.
    pub teacher_id: String,
    /// Unavailable time slot IDs.
    pub unavailable: BTreeSet<String>,
}

impl TeacherAvailability {
    /// Creates an availability record with no exclusions.
    pub fn new(teacher_id: impl Into<String>) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            unavailable: BTreeSet::new(),
        }
    }

    /// Marks a slot as unavailable.
    pub fn with_unavailable(mut self, time_slot_id: impl Into<String>) -> Self {
        self.unavailable.insert(time_slot_id.into());
        self
    }

    /// Whether the teacher can teach in the slot.
    #[inline]
    pub fn is_available(&self, time_slot_id: &str) -> bool {
        !self.unavailable.contains(time_slot_id)
    }
}

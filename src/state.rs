//! Working schedule state.
//!
//! Holds the assignments placed so far in three uniqueness indexes:
//! (classroom, slot), (teacher, slot), and (class group, slot). Every key
//! maps to at most one assignment. Placement inserts into all three indexes
//! or none; removal restores them exactly.
//!
//! A state built with [`ScheduleState::for_slots`] also knows which slots
//! overlap in wall-clock time; occupancy of one slot then blocks every slot
//! overlapping it.
//!
//! Also maintains per-classroom and per-slot load counters for the
//! load-balance soft rule, in lockstep with the indexes.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Assignment, RejectionReason, Section, TimeSlot};

type SlotIndex = HashMap<String, HashMap<String, Assignment>>;
type OverlapIndex = HashMap<String, Vec<String>>;

/// Mutable placement state of one scheduling run.
#[derive(Debug, Clone, Default)]
pub struct ScheduleState {
    by_classroom: SlotIndex,
    by_teacher: SlotIndex,
    by_group: SlotIndex,
    classroom_load: HashMap<String, usize>,
    slot_load: HashMap<String, usize>,
    overlaps: Arc<OverlapIndex>,
    len: usize,
}

impl ScheduleState {
    /// Creates an empty state in which slots collide only by ID.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty state for a slot catalog. Distinct slots that
    /// overlap on the same day collide like identical ones.
    pub fn for_slots(time_slots: &[TimeSlot]) -> Self {
        let mut overlaps = OverlapIndex::new();
        for (i, a) in time_slots.iter().enumerate() {
            for b in &time_slots[i + 1..] {
                if a.id != b.id && a.overlaps(b) {
                    overlaps.entry(a.id.clone()).or_default().push(b.id.clone());
                    overlaps.entry(b.id.clone()).or_default().push(a.id.clone());
                }
            }
        }
        Self {
            overlaps: Arc::new(overlaps),
            ..Self::default()
        }
    }

    /// Whether two slots are the same slot or overlap in time.
    pub fn slots_collide(&self, a: &str, b: &str) -> bool {
        a == b
            || self
                .overlaps
                .get(a)
                .is_some_and(|others| others.iter().any(|o| o == b))
    }

    /// Places an assignment for `section`.
    ///
    /// Fails without modifying the state if any index key is already taken;
    /// the error names the first occupied index (classroom, teacher, group).
    pub fn place(&mut self, assignment: Assignment, section: &Section) -> Result<(), RejectionReason> {
        debug_assert_eq!(assignment.section_id, section.id);
        let slot = assignment.time_slot_id.as_str();

        if self.classroom_occupant(&assignment.classroom_id, slot).is_some() {
            return Err(RejectionReason::DoubleBookedClassroom);
        }
        if self.teacher_occupant(&section.teacher_id, slot).is_some() {
            return Err(RejectionReason::DoubleBookedTeacher);
        }
        if self.group_occupant(&section.class_group_id, slot).is_some() {
            return Err(RejectionReason::DoubleBookedClassGroup);
        }

        *self
            .classroom_load
            .entry(assignment.classroom_id.clone())
            .or_insert(0) += 1;
        *self
            .slot_load
            .entry(assignment.time_slot_id.clone())
            .or_insert(0) += 1;

        insert(&mut self.by_teacher, &section.teacher_id, &assignment);
        insert(&mut self.by_group, &section.class_group_id, &assignment);
        insert(&mut self.by_classroom, &assignment.classroom_id, &assignment);
        self.len += 1;
        Ok(())
    }

    /// Removes a previously placed assignment of `section`.
    ///
    /// Returns `false` (and changes nothing) if the assignment is not the
    /// current occupant of its classroom cell.
    pub fn remove(&mut self, assignment: &Assignment, section: &Section) -> bool {
        let slot = assignment.time_slot_id.as_str();
        if lookup(&self.by_classroom, &assignment.classroom_id, slot) != Some(assignment) {
            return false;
        }

        take(&mut self.by_classroom, &assignment.classroom_id, slot);
        take(&mut self.by_teacher, &section.teacher_id, slot);
        take(&mut self.by_group, &section.class_group_id, slot);
        decrement(&mut self.classroom_load, &assignment.classroom_id);
        decrement(&mut self.slot_load, slot);
        self.len -= 1;
        true
    }

    /// Assignment occupying a classroom at a slot or at a slot overlapping it.
    pub fn classroom_occupant(&self, classroom_id: &str, time_slot_id: &str) -> Option<&Assignment> {
        occupant(&self.by_classroom, &self.overlaps, classroom_id, time_slot_id)
    }

    /// Assignment occupying a teacher at a slot or at a slot overlapping it.
    pub fn teacher_occupant(&self, teacher_id: &str, time_slot_id: &str) -> Option<&Assignment> {
        occupant(&self.by_teacher, &self.overlaps, teacher_id, time_slot_id)
    }

    /// Assignment occupying a class group at a slot or at a slot overlapping it.
    pub fn group_occupant(&self, class_group_id: &str, time_slot_id: &str) -> Option<&Assignment> {
        occupant(&self.by_group, &self.overlaps, class_group_id, time_slot_id)
    }

    /// Number of periods placed in a classroom.
    pub fn classroom_load(&self, classroom_id: &str) -> usize {
        self.classroom_load.get(classroom_id).copied().unwrap_or(0)
    }

    /// Number of periods placed at a slot (across all classrooms).
    pub fn slot_load(&self, time_slot_id: &str) -> usize {
        self.slot_load.get(time_slot_id).copied().unwrap_or(0)
    }

    /// Number of placed assignments.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over every placed assignment (unordered).
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.by_classroom.values().flat_map(|cells| cells.values())
    }
}

fn lookup<'a>(index: &'a SlotIndex, key: &str, slot: &str) -> Option<&'a Assignment> {
    index.get(key).and_then(|cells| cells.get(slot))
}

fn occupant<'a>(
    index: &'a SlotIndex,
    overlaps: &OverlapIndex,
    key: &str,
    slot: &str,
) -> Option<&'a Assignment> {
    lookup(index, key, slot).or_else(|| {
        overlaps
            .get(slot)?
            .iter()
            .find_map(|other| lookup(index, key, other))
    })
}

fn insert(index: &mut SlotIndex, key: &str, assignment: &Assignment) {
    index
        .entry(key.to_string())
        .or_default()
        .insert(assignment.time_slot_id.clone(), assignment.clone());
}

fn take(index: &mut SlotIndex, key: &str, slot: &str) {
    if let Some(cells) = index.get_mut(key) {
        cells.remove(slot);
        if cells.is_empty() {
            index.remove(key);
        }
    }
}

fn decrement(counts: &mut HashMap<String, usize>, key: &str) {
    if let Some(n) = counts.get_mut(key) {
        *n -= 1;
        if *n == 0 {
            counts.remove(key);
        }
    }
}

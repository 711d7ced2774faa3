//! Section profiling and most-constrained-first ordering.
//!
//! Before search, each section is reduced to its statically compatible
//! classrooms and the time slots its teacher can teach. The product of the
//! two is the section's *scarcity*; scarce sections are placed first.
//!
//! # Reference
//! Brélaz (1979), "New methods to color the vertices of a graph" (DSATUR:
//! most-constrained vertex first)

use std::cmp::Reverse;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::constraints::static_failures;
use crate::models::{Classroom, SemesterSnapshot, Section, TimeSlot, UnscheduledReason};

/// A section with its candidate domain.
#[derive(Debug, Clone)]
pub struct SectionProfile<'a> {
    pub section: &'a Section,
    /// Classrooms passing capacity, type, and equipment checks (catalog order).
    pub classrooms: Vec<&'a Classroom>,
    /// Time slots the teacher is available in (catalog order).
    pub time_slots: Vec<&'a TimeSlot>,
}

impl<'a> SectionProfile<'a> {
    /// Builds the profile of a section.
    ///
    /// Fails with the reason the section can never be placed when no
    /// classroom fits it or its teacher is unavailable in every slot.
    pub fn build(
        section: &'a Section,
        snapshot: &'a SemesterSnapshot,
    ) -> Result<Self, UnscheduledReason> {
        let mut classrooms = Vec::new();
        let mut closest: Option<(usize, UnscheduledReason)> = None;

        for room in &snapshot.classrooms {
            let failures = static_failures(section, room);
            match failures.first() {
                None => classrooms.push(room),
                Some(&first) => {
                    if closest.map_or(true, |(n, _)| failures.len() < n) {
                        closest = Some((failures.len(), first.into()));
                    }
                }
            }
        }

        if classrooms.is_empty() {
            return Err(closest.map_or(UnscheduledReason::NoFeasibleSlot, |(_, r)| r));
        }

        let time_slots: Vec<&TimeSlot> = snapshot
            .time_slots
            .iter()
            .filter(|t| snapshot.is_teacher_available(&section.teacher_id, &t.id))
            .collect();

        if time_slots.is_empty() {
            return Err(UnscheduledReason::TeacherUnavailable);
        }

        Ok(Self {
            section,
            classrooms,
            time_slots,
        })
    }

    /// Number of (classroom, slot) cells the section could ever use.
    pub fn scarcity(&self) -> usize {
        self.classrooms.len() * self.time_slots.len()
    }

    pub fn has_classroom(&self, classroom_id: &str) -> bool {
        self.classrooms.iter().any(|c| c.id == classroom_id)
    }

    pub fn has_time_slot(&self, time_slot_id: &str) -> bool {
        self.time_slots.iter().any(|t| t.id == time_slot_id)
    }
}

/// Orders profiles by ascending scarcity, then descending priority.
///
/// Without a random source, remaining ties are broken by section ID. With one,
/// the profiles are shuffled first and the stable sort keeps the shuffled
/// order among equal keys.
pub fn order_profiles(profiles: &mut [SectionProfile<'_>], rng: Option<&mut StdRng>) {
    match rng {
        Some(rng) => {
            profiles.shuffle(rng);
            profiles.sort_by_key(|p| (p.scarcity(), Reverse(p.section.priority)));
        }
        None => {
            profiles.sort_by(|a, b| {
                (a.scarcity(), Reverse(a.section.priority), &a.section.id).cmp(&(
                    b.scarcity(),
                    Reverse(b.section.priority),
                    &b.section.id,
                ))
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Equipment, TeacherAvailability};
    use rand::SeedableRng;

    fn snapshot() -> SemesterSnapshot {
        SemesterSnapshot::new("2025-1")
            .with_classroom(Classroom::new("SMALL", 20))
            .with_classroom(Classroom::new("BIG", 100).with_equipment(Equipment::Projector))
            .with_weekly_grid(1, 4)
    }

    #[test]
    fn test_profile_domain() {
        let snap = snapshot().with_availability(TeacherAvailability::new("T1").with_unavailable("D1P1"));
        let s = Section::new("S1", "C", "T1", "G1").with_students(50);
        let p = SectionProfile::build(&s, &snap).unwrap();
        assert_eq!(p.classrooms.len(), 1);
        assert!(p.has_classroom("BIG"));
        assert_eq!(p.time_slots.len(), 3);
        assert!(!p.has_time_slot("D1P1"));
        assert_eq!(p.scarcity(), 3);
    }

    #[test]
    fn test_closest_classroom_reason() {
        let snap = snapshot();
        // SMALL fails capacity + equipment, BIG fails capacity only.
        let s = Section::new("S1", "C", "T1", "G1")
            .with_students(500)
            .with_equipment(Equipment::Projector);
        assert_eq!(
            SectionProfile::build(&s, &snap).unwrap_err(),
            UnscheduledReason::CapacityExceeded
        );

        let s = Section::new("S2", "C", "T1", "G1").with_equipment(Equipment::Computer);
        assert_eq!(
            SectionProfile::build(&s, &snap).unwrap_err(),
            UnscheduledReason::EquipmentMissing
        );
    }

    #[test]
    fn test_teacher_never_available() {
        let mut avail = TeacherAvailability::new("T1");
        for p in 1..=4 {
            avail = avail.with_unavailable(format!("D1P{p}"));
        }
        let snap = snapshot().with_availability(avail);
        let s = Section::new("S1", "C", "T1", "G1");
        assert_eq!(
            SectionProfile::build(&s, &snap).unwrap_err(),
            UnscheduledReason::TeacherUnavailable
        );
    }

    #[test]
    fn test_order_scarcity_priority_id() {
        let snap = snapshot();
        let wide_b = Section::new("B", "C", "T1", "G1");
        let wide_a = Section::new("A", "C", "T2", "G2");
        let urgent = Section::new("Z", "C", "T3", "G3").with_priority(5);
        let narrow = Section::new("N", "C", "T4", "G4").with_students(80);

        let mut profiles: Vec<_> = [&wide_b, &wide_a, &urgent, &narrow]
            .into_iter()
            .map(|s| SectionProfile::build(s, &snap).unwrap())
            .collect();
        order_profiles(&mut profiles, None);

        let ids: Vec<&str> = profiles.iter().map(|p| p.section.id.as_str()).collect();
        assert_eq!(ids, vec!["N", "Z", "A", "B"]);
    }

    #[test]
    fn test_seeded_order_is_reproducible() {
        let snap = snapshot();
        let sections: Vec<Section> = (0..12)
            .map(|i| Section::new(format!("S{i:02}"), "C", format!("T{i}"), format!("G{i}")))
            .collect();

        let order = |seed: u64| -> Vec<String> {
            let mut profiles: Vec<_> = sections
                .iter()
                .map(|s| SectionProfile::build(s, &snap).unwrap())
                .collect();
            let mut rng = StdRng::seed_from_u64(seed);
            order_profiles(&mut profiles, Some(&mut rng));
            profiles.iter().map(|p| p.section.id.clone()).collect()
        };

        assert_eq!(order(42), order(42));
        assert_eq!(order(42).len(), 12);
    }
}

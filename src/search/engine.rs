//! Constrained greedy placement with bounded backtracking.
//!
//! # Algorithm
//!
//! 1. Profile every target section (compatible classrooms, available slots)
//!    and order the profiles most-constrained first.
//! 2. Queue one work item per weekly period.
//! 3. For each item, enumerate (classroom, slot) candidates, keep those the
//!    hard constraints accept, and place the one with the lowest soft score.
//! 4. When an item has no candidate, undo the most recent placement of
//!    another section that blocks one of its candidates, retry the item, and
//!    re-queue the displaced one. A placement is only undone if, one step
//!    ahead, the stuck item then fits and the displaced period still has a
//!    cell left. A section that stays stuck is dropped as a whole.
//!
//! Each cell a section frees by backtracking is remembered, so the same
//! displacement is never repeated and the search always terminates.
//!
//! # Complexity
//! O(p * r * t) per placement attempt where p = periods, r = classrooms,
//! t = time slots.

use std::collections::{HashMap, HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use super::ordering::{order_profiles, SectionProfile};
use super::termination::{Budget, CancelToken};
use crate::config::SearchOptions;
use crate::constraints::{check, Candidate, DayIndex, SoftContext, SoftScorer, Verdict};
use crate::models::{
    Assignment, RunOutcome, SearchStats, Section, SemesterSnapshot, UnscheduledReason,
    UnscheduledSection,
};
use crate::state::ScheduleState;

/// Raw output of a search, before it is wrapped into a run result.
#[derive(Debug, Clone)]
pub struct SearchOutput {
    /// Placed periods in placement order.
    pub assignments: Vec<Assignment>,
    pub unscheduled: Vec<UnscheduledSection>,
    pub outcome: RunOutcome,
    pub stats: SearchStats,
}

#[derive(Debug, Clone, Copy)]
struct WorkItem {
    profile: usize,
    /// Re-queued after its placement was undone.
    displaced: bool,
}

#[derive(Debug, Clone)]
struct Placement {
    profile: usize,
    assignment: Assignment,
}

/// Search engine over one semester snapshot.
///
/// # Example
///
/// ```
/// use u_timetable::config::SearchOptions;
/// use u_timetable::models::{Classroom, SemesterSnapshot, Section};
/// use u_timetable::search::SearchEngine;
///
/// let snapshot = SemesterSnapshot::new("2025-1")
///     .with_section(Section::new("S1", "MATH", "T1", "G1").with_semester("2025-1").with_periods(2))
///     .with_classroom(Classroom::new("R1", 40))
///     .with_weekly_grid(5, 4);
///
/// let options = SearchOptions::default();
/// let output = SearchEngine::new(&snapshot, &options).run();
/// assert_eq!(output.assignments.len(), 2);
/// assert!(output.unscheduled.is_empty());
/// ```
#[derive(Debug)]
pub struct SearchEngine<'a> {
    snapshot: &'a SemesterSnapshot,
    options: &'a SearchOptions,
    scorer: SoftScorer,
    days: DayIndex,
    cancel: CancelToken,
}

impl<'a> SearchEngine<'a> {
    /// Creates an engine with the soft rules weighted per `options`.
    pub fn new(snapshot: &'a SemesterSnapshot, options: &'a SearchOptions) -> Self {
        Self {
            snapshot,
            options,
            scorer: SoftScorer::from_weights(&options.weights),
            days: DayIndex::new(&snapshot.time_slots),
            cancel: CancelToken::new(),
        }
    }

    /// Replaces the soft scorer.
    pub fn with_scorer(mut self, scorer: SoftScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Sets the token polled for cancellation.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Schedules every section of the snapshot from an empty state.
    pub fn run(&self) -> SearchOutput {
        let targets: Vec<&Section> = self.snapshot.sections.iter().collect();
        self.run_on(ScheduleState::for_slots(&self.snapshot.time_slots), &targets)
    }

    /// Schedules `targets` around the assignments already in `state`.
    ///
    /// Assignments in `state` are fixed: they constrain the search but are
    /// never undone and are not part of the output. Build `state` with
    /// [`ScheduleState::for_slots`] so overlapping slots collide.
    pub fn run_on(&self, mut state: ScheduleState, targets: &[&'a Section]) -> SearchOutput {
        let mut budget = Budget::start(self.options);
        let mut rng = self.options.tie_break_seed.map(StdRng::seed_from_u64);
        let mut stats = SearchStats::default();
        let mut unscheduled = Vec::new();

        let mut profiles = Vec::with_capacity(targets.len());
        for &section in targets {
            match SectionProfile::build(section, self.snapshot) {
                Ok(profile) => profiles.push(profile),
                Err(reason) => {
                    debug!(event = "section_unplaceable", section = %section.id, ?reason);
                    unscheduled.push(UnscheduledSection::new(section.clone(), reason));
                }
            }
        }
        order_profiles(&mut profiles, rng.as_mut());

        let mut queue: VecDeque<WorkItem> = profiles
            .iter()
            .enumerate()
            .flat_map(|(i, p)| {
                (0..p.section.periods_per_week).map(move |_| WorkItem {
                    profile: i,
                    displaced: false,
                })
            })
            .collect();

        let mut trail: Vec<Placement> = Vec::new();
        let mut tried: HashMap<usize, HashSet<(String, String)>> = HashMap::new();
        let mut episode_backtracks: u32 = 0;

        let outcome = loop {
            if queue.is_empty() {
                break RunOutcome::Completed;
            }
            if let Some(outcome) = budget.should_stop(&self.cancel) {
                break outcome;
            }
            let Some(item) = queue.pop_front() else {
                break RunOutcome::Completed;
            };
            budget.tick();

            let profile = &profiles[item.profile];
            if let Some(assignment) = self.best_candidate(profile, &state, rng.as_mut()) {
                if state.place(assignment.clone(), profile.section).is_ok() {
                    stats.placements += 1;
                    trail.push(Placement {
                        profile: item.profile,
                        assignment,
                    });
                    continue;
                }
            }

            // Stuck.
            if !item.displaced && !queue.iter().any(|w| w.displaced) {
                episode_backtracks = 0;
            }

            let victim = if episode_backtracks < self.options.max_backtracks {
                self.find_victim(
                    &profiles,
                    item.profile,
                    &trail,
                    tried.get(&item.profile),
                    &mut state,
                )
            } else {
                None
            };

            match victim {
                Some(index) => {
                    let undone = trail.remove(index);
                    let victim_section = profiles[undone.profile].section;
                    state.remove(&undone.assignment, victim_section);
                    debug!(
                        event = "backtrack",
                        stuck = %profile.section.id,
                        displaced = %victim_section.id,
                        classroom = %undone.assignment.classroom_id,
                        time_slot = %undone.assignment.time_slot_id,
                    );
                    tried.entry(item.profile).or_default().insert((
                        undone.assignment.classroom_id.clone(),
                        undone.assignment.time_slot_id.clone(),
                    ));
                    queue.push_front(WorkItem {
                        profile: undone.profile,
                        displaced: true,
                    });
                    queue.push_front(item);
                    stats.backtracks += 1;
                    episode_backtracks += 1;
                }
                None => {
                    debug!(
                        event = "section_dropped",
                        section = %profile.section.id,
                        episode_backtracks,
                    );
                    withdraw(item.profile, &profiles, &mut state, &mut trail, &mut queue);
                    unscheduled.push(UnscheduledSection::new(
                        profile.section.clone(),
                        UnscheduledReason::NoFeasibleSlot,
                    ));
                }
            }
        };

        if outcome != RunOutcome::Completed {
            let reason = match outcome {
                RunOutcome::Cancelled => UnscheduledReason::Cancelled,
                _ => UnscheduledReason::BudgetExhausted,
            };
            let mut unfinished: Vec<usize> = queue.iter().map(|w| w.profile).collect();
            unfinished.sort_unstable();
            unfinished.dedup();
            for index in unfinished {
                withdraw(index, &profiles, &mut state, &mut trail, &mut queue);
                unscheduled.push(UnscheduledSection::new(
                    profiles[index].section.clone(),
                    reason,
                ));
            }
        }

        stats.iterations = budget.iterations();
        SearchOutput {
            assignments: trail.into_iter().map(|p| p.assignment).collect(),
            unscheduled,
            outcome,
            stats,
        }
    }

    /// Lowest-scoring accepted candidate of a section, if any.
    fn best_candidate(
        &self,
        profile: &SectionProfile<'a>,
        state: &ScheduleState,
        rng: Option<&mut StdRng>,
    ) -> Option<Assignment> {
        let availability = self.snapshot.availability_for(&profile.section.teacher_id);
        let context = SoftContext::new(state, &self.days);

        let mut accepted: Vec<(Candidate<'_>, f64)> = Vec::new();
        for &slot in &profile.time_slots {
            for &room in &profile.classrooms {
                let candidate =
                    Candidate::new(profile.section, room, slot).with_availability(availability);
                if check(&candidate, state) == Verdict::Accepted {
                    let score = self.scorer.score(&candidate, &context);
                    accepted.push((candidate, score));
                }
            }
        }

        if let Some(rng) = rng {
            accepted.shuffle(rng);
        }

        let mut best: Option<&(Candidate<'_>, f64)> = None;
        for entry in &accepted {
            if best.map_or(true, |(_, score)| entry.1 < *score) {
                best = Some(entry);
            }
        }
        best.map(|(c, _)| Assignment::new(&c.section.id, &c.classroom.id, &c.time_slot.id))
    }

    /// Whether any candidate of the section is accepted.
    fn has_candidate(&self, profile: &SectionProfile<'a>, state: &ScheduleState) -> bool {
        let availability = self.snapshot.availability_for(&profile.section.teacher_id);
        profile.time_slots.iter().any(|&slot| {
            profile.classrooms.iter().any(|&room| {
                let candidate =
                    Candidate::new(profile.section, room, slot).with_availability(availability);
                check(&candidate, state).is_accepted()
            })
        })
    }

    /// Most recent placement of another section that blocks one of the stuck
    /// section's candidate cells, has not been displaced for it before, and
    /// passes [`Self::displacement_helps`].
    ///
    /// `state` is the same on return as on entry.
    fn find_victim(
        &self,
        profiles: &[SectionProfile<'a>],
        stuck: usize,
        trail: &[Placement],
        tried: Option<&HashSet<(String, String)>>,
        state: &mut ScheduleState,
    ) -> Option<usize> {
        let stuck_profile = &profiles[stuck];
        let stuck_section = stuck_profile.section;

        for (index, placement) in trail.iter().enumerate().rev() {
            if placement.profile == stuck {
                continue;
            }
            let a = &placement.assignment;
            if tried.is_some_and(|t| t.contains(&(a.classroom_id.clone(), a.time_slot_id.clone())))
            {
                continue;
            }
            if !stuck_profile
                .time_slots
                .iter()
                .any(|t| state.slots_collide(&t.id, &a.time_slot_id))
            {
                continue;
            }
            let victim = &profiles[placement.profile];
            let blocks = stuck_profile.has_classroom(&a.classroom_id)
                || victim.section.teacher_id == stuck_section.teacher_id
                || victim.section.class_group_id == stuck_section.class_group_id;
            if blocks && self.displacement_helps(stuck_profile, victim, a, state) {
                return Some(index);
            }
        }
        None
    }

    /// One-step lookahead: with `placed` undone, the stuck section takes its
    /// best cell and the displaced section can still go somewhere.
    fn displacement_helps(
        &self,
        stuck: &SectionProfile<'a>,
        victim: &SectionProfile<'a>,
        placed: &Assignment,
        state: &mut ScheduleState,
    ) -> bool {
        if !state.remove(placed, victim.section) {
            return false;
        }
        let helps = match self.best_candidate(stuck, state, None) {
            Some(taken) => match state.place(taken.clone(), stuck.section) {
                Ok(()) => {
                    let relocatable = self.has_candidate(victim, state);
                    state.remove(&taken, stuck.section);
                    relocatable
                }
                Err(_) => false,
            },
            None => false,
        };
        let restored = state.place(placed.clone(), victim.section);
        debug_assert!(restored.is_ok());
        helps
    }
}

/// Removes every placed and queued period of a section.
fn withdraw(
    profile: usize,
    profiles: &[SectionProfile<'_>],
    state: &mut ScheduleState,
    trail: &mut Vec<Placement>,
    queue: &mut VecDeque<WorkItem>,
) {
    let section = profiles[profile].section;
    trail.retain(|p| {
        if p.profile == profile {
            state.remove(&p.assignment, section);
            false
        } else {
            true
        }
    });
    queue.retain(|w| w.profile != profile);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::SoftRule;
    use crate::inspect::validate_assignments;
    use crate::models::{Classroom, Equipment, TeacherAvailability, TimeSlot};

    fn section(id: &str, teacher: &str, group: &str) -> Section {
        Section::new(id, "C", teacher, group).with_semester("2025-1")
    }

    fn assert_no_double_booking(snapshot: &SemesterSnapshot, assignments: &[Assignment]) {
        let mut rooms = HashSet::new();
        let mut teachers = HashSet::new();
        let mut groups = HashSet::new();
        for a in assignments {
            let s = snapshot.section(&a.section_id).unwrap();
            assert!(rooms.insert((a.classroom_id.clone(), a.time_slot_id.clone())));
            assert!(teachers.insert((s.teacher_id.clone(), a.time_slot_id.clone())));
            assert!(groups.insert((s.class_group_id.clone(), a.time_slot_id.clone())));
        }
    }

    #[test]
    fn test_places_all_periods() {
        let snap = SemesterSnapshot::new("2025-1")
            .with_section(section("S1", "T1", "G1").with_periods(3))
            .with_section(section("S2", "T1", "G2").with_periods(2))
            .with_section(section("S3", "T2", "G1").with_periods(2))
            .with_classroom(Classroom::new("R1", 40))
            .with_classroom(Classroom::new("R2", 40))
            .with_weekly_grid(2, 4);
        let opts = SearchOptions::default();
        let out = SearchEngine::new(&snap, &opts).run();

        assert_eq!(out.outcome, RunOutcome::Completed);
        assert!(out.unscheduled.is_empty());
        assert_eq!(out.assignments.len(), 7);
        assert_eq!(out.stats.iterations, out.stats.placements + out.stats.backtracks);
        assert_no_double_booking(&snap, &out.assignments);
    }

    #[test]
    fn test_overflow_is_no_feasible_slot() {
        let mut snap = SemesterSnapshot::new("2025-1")
            .with_classroom(Classroom::new("R1", 40))
            .with_classroom(Classroom::new("R2", 40))
            .with_weekly_grid(1, 2);
        for i in 0..6 {
            snap = snap.with_section(section(&format!("S{i}"), &format!("T{i}"), &format!("G{i}")));
        }
        let opts = SearchOptions::default();
        let out = SearchEngine::new(&snap, &opts).run();

        assert_eq!(out.outcome, RunOutcome::Completed);
        assert_eq!(out.assignments.len(), 4);
        assert_eq!(out.unscheduled.len(), 2);
        assert!(out
            .unscheduled
            .iter()
            .all(|u| u.reason == UnscheduledReason::NoFeasibleSlot));
        // Every cell is full, so no displacement can help.
        assert_eq!(out.stats.backtracks, 0);
        assert_eq!(out.stats.iterations, 6);
        assert_no_double_booking(&snap, &out.assignments);
    }

    #[test]
    fn test_overlapping_slots_are_not_double_booked() {
        let snap = SemesterSnapshot::new("2025-1")
            .with_section(section("S1", "T1", "G1"))
            .with_section(section("S2", "T1", "G2"))
            .with_classroom(Classroom::new("R1", 40))
            .with_time_slot(TimeSlot::new("MON-A", 1, 1, 480, 570))
            .with_time_slot(TimeSlot::new("MON-B", 1, 2, 525, 615));
        let opts = SearchOptions::default();
        let out = SearchEngine::new(&snap, &opts).run();

        assert_eq!(out.assignments.len(), 1);
        assert_eq!(out.unscheduled.len(), 1);
        assert_eq!(out.unscheduled[0].reason, UnscheduledReason::NoFeasibleSlot);
        assert!(validate_assignments(&out.assignments, &snap).is_ok());
    }

    #[test]
    fn test_custom_scorer_steers_placement() {
        #[derive(Debug)]
        struct LatePeriods;

        impl SoftRule for LatePeriods {
            fn name(&self) -> &'static str {
                "late_periods"
            }

            fn penalty(&self, candidate: &Candidate<'_>, _context: &SoftContext<'_>) -> f64 {
                f64::from(10 - candidate.time_slot.period_number)
            }
        }

        let snap = SemesterSnapshot::new("2025-1")
            .with_section(section("S1", "T1", "G1"))
            .with_classroom(Classroom::new("R1", 40))
            .with_weekly_grid(1, 4);
        let opts = SearchOptions::default();
        let out = SearchEngine::new(&snap, &opts)
            .with_scorer(SoftScorer::new().with_rule(LatePeriods, 1.0))
            .run();

        assert_eq!(out.assignments[0].time_slot_id, "D1P4");
    }

    #[test]
    fn test_backtrack_displaces_blocking_section() {
        // P goes first (id tie-break) and takes D1P1, the only slot Q's
        // teacher can do. Both share a class group, so Q must displace P.
        let snap = SemesterSnapshot::new("2025-1")
            .with_section(section("P", "T1", "G1").with_equipment(Equipment::Projector))
            .with_section(section("Q", "T2", "G1"))
            .with_classroom(Classroom::new("R1", 40).with_equipment(Equipment::Projector))
            .with_classroom(Classroom::new("R2", 40))
            .with_weekly_grid(1, 2)
            .with_availability(TeacherAvailability::new("T2").with_unavailable("D1P2"));
        let opts = SearchOptions::default();
        let out = SearchEngine::new(&snap, &opts).run();

        assert!(out.unscheduled.is_empty());
        assert_eq!(out.stats.backtracks, 1);
        let slot_of = |id: &str| {
            out.assignments
                .iter()
                .find(|a| a.section_id == id)
                .map(|a| a.time_slot_id.clone())
                .unwrap()
        };
        assert_eq!(slot_of("Q"), "D1P1");
        assert_eq!(slot_of("P"), "D1P2");
    }

    #[test]
    fn test_static_reasons_skip_search() {
        let snap = SemesterSnapshot::new("2025-1")
            .with_section(section("BIG", "T1", "G1").with_students(500))
            .with_section(section("LAB", "T2", "G2").with_course_type("lab"))
            .with_classroom(Classroom::new("R1", 40).with_suitable_course_type("lecture"))
            .with_weekly_grid(1, 2);
        let opts = SearchOptions::default();
        let out = SearchEngine::new(&snap, &opts).run();

        assert_eq!(out.stats.iterations, 0);
        assert_eq!(out.unscheduled[0].reason, UnscheduledReason::CapacityExceeded);
        assert_eq!(out.unscheduled[1].reason, UnscheduledReason::TypeMismatch);
    }

    #[test]
    fn test_all_or_nothing_sections() {
        // Two 2-period sections of the same group, only 3 slots: one must go.
        let snap = SemesterSnapshot::new("2025-1")
            .with_section(section("S1", "T1", "G1").with_periods(2))
            .with_section(section("S2", "T2", "G1").with_periods(2))
            .with_classroom(Classroom::new("R1", 40))
            .with_classroom(Classroom::new("R2", 40))
            .with_weekly_grid(1, 3);
        let opts = SearchOptions::default();
        let out = SearchEngine::new(&snap, &opts).run();

        assert_eq!(out.unscheduled.len(), 1);
        assert_eq!(out.assignments.len(), 2);
        let dropped = &out.unscheduled[0].section.id;
        assert!(out.assignments.iter().all(|a| &a.section_id != dropped));
    }

    #[test]
    fn test_zero_backtracks_drops_immediately() {
        let snap = SemesterSnapshot::new("2025-1")
            .with_section(section("S1", "T1", "G1"))
            .with_section(section("S2", "T2", "G2"))
            .with_classroom(Classroom::new("R1", 40))
            .with_weekly_grid(1, 1);
        let opts = SearchOptions::default().with_max_backtracks(0);
        let out = SearchEngine::new(&snap, &opts).run();
        assert_eq!(out.stats.backtracks, 0);
        assert_eq!(out.assignments.len(), 1);
        assert_eq!(out.unscheduled.len(), 1);
    }

    #[test]
    fn test_iteration_budget() {
        let mut snap = SemesterSnapshot::new("2025-1")
            .with_classroom(Classroom::new("R1", 40))
            .with_weekly_grid(5, 6);
        for i in 0..10 {
            snap = snap.with_section(section(&format!("S{i}"), &format!("T{i}"), &format!("G{i}")));
        }
        let opts = SearchOptions::default().with_max_iterations(4);
        let out = SearchEngine::new(&snap, &opts).run();

        assert_eq!(
            out.outcome,
            RunOutcome::BudgetExhausted(crate::models::BudgetLimit::Iterations)
        );
        assert_eq!(out.stats.iterations, 4);
        assert_eq!(out.assignments.len(), 4);
        assert_eq!(out.unscheduled.len(), 6);
        assert!(out
            .unscheduled
            .iter()
            .all(|u| u.reason == UnscheduledReason::BudgetExhausted));
    }

    #[test]
    fn test_cancelled_before_start() {
        let snap = SemesterSnapshot::new("2025-1")
            .with_section(section("S1", "T1", "G1").with_periods(2))
            .with_classroom(Classroom::new("R1", 40))
            .with_weekly_grid(1, 4);
        let opts = SearchOptions::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let out = SearchEngine::new(&snap, &opts).with_cancel(cancel).run();

        assert_eq!(out.outcome, RunOutcome::Cancelled);
        assert!(out.assignments.is_empty());
        assert_eq!(out.unscheduled[0].reason, UnscheduledReason::Cancelled);
    }

    #[test]
    fn test_fixed_assignments_are_respected() {
        let snap = SemesterSnapshot::new("2025-1")
            .with_section(section("OLD", "T1", "G1"))
            .with_section(section("NEW", "T1", "G2"))
            .with_classroom(Classroom::new("R1", 40))
            .with_classroom(Classroom::new("R2", 40))
            .with_weekly_grid(1, 2);

        let mut state = ScheduleState::new();
        state
            .place(Assignment::new("OLD", "R1", "D1P1"), snap.section("OLD").unwrap())
            .unwrap();

        let opts = SearchOptions::default();
        let engine = SearchEngine::new(&snap, &opts);
        let target = snap.section("NEW").unwrap();
        let out = engine.run_on(state, &[target]);

        assert_eq!(out.assignments.len(), 1);
        // Same teacher as the fixed assignment, so not at D1P1.
        assert_eq!(out.assignments[0].time_slot_id, "D1P2");
    }

    #[test]
    fn test_seeded_runs_are_deterministic() {
        let mut snap = SemesterSnapshot::new("2025-1")
            .with_classroom(Classroom::new("R1", 40))
            .with_classroom(Classroom::new("R2", 40))
            .with_classroom(Classroom::new("R3", 40))
            .with_weekly_grid(2, 3);
        for i in 0..20 {
            snap = snap.with_section(section(
                &format!("S{i:02}"),
                &format!("T{}", i % 7),
                &format!("G{}", i % 5),
            ));
        }
        let opts = SearchOptions::default().with_seed(1234);
        let a = SearchEngine::new(&snap, &opts).run();
        let b = SearchEngine::new(&snap, &opts).run();
        assert_eq!(a.assignments, b.assignments);
        assert_eq!(a.unscheduled, b.unscheduled);
        assert_eq!(a.stats, b.stats);
        assert_no_double_booking(&snap, &a.assignments);
    }
}

//! Soft constraints for ranking candidate placements.
//!
//! Soft rules never reject a candidate; they return a non-negative penalty,
//! and the [`SoftScorer`] combines them as a weighted sum.
//!
//! # Score Convention
//! **Lower score = better candidate.** The search engine places the
//! lowest-scoring accepted candidate.
//!
//! # Built-in rules
//!
//! - **Compactness**: gaps in a class group's day
//! - **LoadBalance**: usage of the classroom and the time slot so far
//! - **CapacityFit**: fraction of empty seats

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use super::Candidate;
use crate::config::SoftWeights;
use crate::models::TimeSlot;
use crate::state::ScheduleState;

/// Time slots grouped by day, ordered by period number.
#[derive(Debug, Clone, Default)]
pub struct DayIndex {
    days: BTreeMap<u8, Vec<(u8, String)>>,
}

impl DayIndex {
    /// Builds the index from a slot catalog.
    pub fn new(time_slots: &[TimeSlot]) -> Self {
        let mut days: BTreeMap<u8, Vec<(u8, String)>> = BTreeMap::new();
        for slot in time_slots {
            days.entry(slot.day_of_week)
                .or_default()
                .push((slot.period_number, slot.id.clone()));
        }
        for periods in days.values_mut() {
            periods.sort();
        }
        Self { days }
    }

    /// `(period_number, slot_id)` pairs of a day, in period order.
    pub fn slots_on(&self, day_of_week: u8) -> &[(u8, String)] {
        self.days
            .get(&day_of_week)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Read-only view passed to soft rules.
#[derive(Debug, Clone, Copy)]
pub struct SoftContext<'a> {
    pub state: &'a ScheduleState,
    pub days: &'a DayIndex,
}

impl<'a> SoftContext<'a> {
    pub fn new(state: &'a ScheduleState, days: &'a DayIndex) -> Self {
        Self { state, days }
    }
}

/// A soft constraint.
///
/// # Penalty Convention
/// Penalties are non-negative; **0 = fully preferred**.
pub trait SoftRule: Send + Sync + Debug {
    /// Rule name (e.g., "compactness").
    fn name(&self) -> &'static str;

    /// Penalty of placing the candidate given the current state.
    fn penalty(&self, candidate: &Candidate<'_>, context: &SoftContext<'_>) -> f64;
}

/// Keeps a class group's day contiguous.
///
/// Penalty = number of empty periods between the candidate slot and the
/// nearest period the group already attends that day. A day the group has
/// no classes on yet costs nothing.
#[derive(Debug, Clone, Copy)]
pub struct Compactness;

impl SoftRule for Compactness {
    fn name(&self) -> &'static str {
        "compactness"
    }

    fn penalty(&self, candidate: &Candidate<'_>, context: &SoftContext<'_>) -> f64 {
        let group = candidate.section.class_group_id.as_str();
        let period = candidate.time_slot.period_number;

        context
            .days
            .slots_on(candidate.time_slot.day_of_week)
            .iter()
            .filter(|(_, slot_id)| context.state.group_occupant(group, slot_id).is_some())
            .map(|(p, _)| p.abs_diff(period).saturating_sub(1))
            .min()
            .map_or(0.0, f64::from)
    }
}

/// Prefers classrooms and time slots that have been used least so far.
///
/// Penalty = periods already placed in the classroom + periods already
/// placed at the slot.
#[derive(Debug, Clone, Copy)]
pub struct LoadBalance;

impl SoftRule for LoadBalance {
    fn name(&self) -> &'static str {
        "load_balance"
    }

    fn penalty(&self, candidate: &Candidate<'_>, context: &SoftContext<'_>) -> f64 {
        let room = context.state.classroom_load(&candidate.classroom.id);
        let slot = context.state.slot_load(&candidate.time_slot.id);
        (room + slot) as f64
    }
}

/// Prefers the smallest classroom that seats the section.
///
/// Penalty = empty seats / capacity, in `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct CapacityFit;

impl SoftRule for CapacityFit {
    fn name(&self) -> &'static str {
        "capacity_fit"
    }

    fn penalty(&self, candidate: &Candidate<'_>, _context: &SoftContext<'_>) -> f64 {
        let capacity = candidate.classroom.capacity;
        if capacity == 0 {
            return 0.0;
        }
        let empty = capacity.saturating_sub(candidate.section.max_students);
        f64::from(empty) / f64::from(capacity)
    }
}

#[derive(Clone)]
struct WeightedRule {
    rule: Arc<dyn SoftRule>,
    weight: f64,
}

/// Weighted combination of soft rules.
///
/// # Example
/// ```
/// use u_timetable::constraints::{Compactness, LoadBalance, SoftScorer};
///
/// let scorer = SoftScorer::new()
///     .with_rule(Compactness, 3.0)
///     .with_rule(LoadBalance, 1.0);
/// assert_eq!(scorer.rule_names(), vec!["compactness", "load_balance"]);
/// ```
#[derive(Clone)]
pub struct SoftScorer {
    rules: Vec<WeightedRule>,
}

impl SoftScorer {
    /// Creates a scorer with no rules (every candidate scores 0).
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Creates the built-in rule set with the given weights.
    ///
    /// Rules with a zero weight are left out.
    pub fn from_weights(weights: &SoftWeights) -> Self {
        let mut scorer = Self::new();
        if weights.compactness > 0.0 {
            scorer = scorer.with_rule(Compactness, weights.compactness);
        }
        if weights.load_balance > 0.0 {
            scorer = scorer.with_rule(LoadBalance, weights.load_balance);
        }
        if weights.capacity_fit > 0.0 {
            scorer = scorer.with_rule(CapacityFit, weights.capacity_fit);
        }
        scorer
    }

    /// Adds a weighted rule.
    pub fn with_rule<R: SoftRule + 'static>(mut self, rule: R, weight: f64) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight,
        });
        self
    }

    /// Weighted penalty sum of a candidate.
    pub fn score(&self, candidate: &Candidate<'_>, context: &SoftContext<'_>) -> f64 {
        self.rules
            .iter()
            .map(|wr| wr.rule.penalty(candidate, context) * wr.weight)
            .sum()
    }

    /// Weighted penalty of each rule, by name.
    pub fn breakdown(
        &self,
        candidate: &Candidate<'_>,
        context: &SoftContext<'_>,
    ) -> Vec<(&'static str, f64)> {
        self.rules
            .iter()
            .map(|wr| (wr.rule.name(), wr.rule.penalty(candidate, context) * wr.weight))
            .collect()
    }

    /// Names of the configured rules, in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|wr| wr.rule.name()).collect()
    }
}

impl Default for SoftScorer {
    fn default() -> Self {
        Self::from_weights(&SoftWeights::default())
    }
}

impl Debug for SoftScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftScorer")
            .field(
                "rules",
                &self
                    .rules
                    .iter()
                    .map(|wr| (wr.rule.name(), wr.weight))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, Classroom, Section};

    fn grid() -> Vec<TimeSlot> {
        (1..=6)
            .map(|p| TimeSlot::standard(format!("D1P{p}"), 1, p))
            .chain((1..=6).map(|p| TimeSlot::standard(format!("D2P{p}"), 2, p)))
            .collect()
    }

    #[test]
    fn test_day_index_orders_periods() {
        let mut slots = grid();
        slots.reverse();
        let days = DayIndex::new(&slots);
        let mon: Vec<u8> = days.slots_on(1).iter().map(|(p, _)| *p).collect();
        assert_eq!(mon, vec![1, 2, 3, 4, 5, 6]);
        assert!(days.slots_on(7).is_empty());
    }

    #[test]
    fn test_compactness_penalizes_gaps() {
        let slots = grid();
        let days = DayIndex::new(&slots);
        let mut state = ScheduleState::new();
        let placed = Section::new("S0", "C", "T0", "G1");
        state
            .place(Assignment::new("S0", "R1", "D1P2"), &placed)
            .unwrap();

        let s = Section::new("S1", "C", "T1", "G1");
        let r = Classroom::new("R2", 30);
        let ctx = SoftContext::new(&state, &days);

        let adjacent = Candidate::new(&s, &r, &slots[2]); // D1P3
        let gap_two = Candidate::new(&s, &r, &slots[4]); // D1P5
        let other_day = Candidate::new(&s, &r, &slots[9]); // D2P4

        assert!((Compactness.penalty(&adjacent, &ctx) - 0.0).abs() < 1e-10);
        assert!((Compactness.penalty(&gap_two, &ctx) - 2.0).abs() < 1e-10);
        assert!((Compactness.penalty(&other_day, &ctx) - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_compactness_ignores_other_groups() {
        let slots = grid();
        let days = DayIndex::new(&slots);
        let mut state = ScheduleState::new();
        state
            .place(
                Assignment::new("S0", "R1", "D1P1"),
                &Section::new("S0", "C", "T0", "G9"),
            )
            .unwrap();
        let s = Section::new("S1", "C", "T1", "G1");
        let r = Classroom::new("R2", 30);
        let ctx = SoftContext::new(&state, &days);
        assert!((Compactness.penalty(&Candidate::new(&s, &r, &slots[5]), &ctx)).abs() < 1e-10);
    }

    #[test]
    fn test_load_balance() {
        let slots = grid();
        let days = DayIndex::new(&slots);
        let mut state = ScheduleState::new();
        state
            .place(
                Assignment::new("S0", "R1", "D1P1"),
                &Section::new("S0", "C", "T0", "G0"),
            )
            .unwrap();

        let s = Section::new("S1", "C", "T1", "G1");
        let r1 = Classroom::new("R1", 30);
        let r2 = Classroom::new("R2", 30);
        let ctx = SoftContext::new(&state, &days);

        // R1 used once; D1P1 used once.
        assert!((LoadBalance.penalty(&Candidate::new(&s, &r1, &slots[1]), &ctx) - 1.0).abs() < 1e-10);
        assert!((LoadBalance.penalty(&Candidate::new(&s, &r2, &slots[0]), &ctx) - 1.0).abs() < 1e-10);
        assert!((LoadBalance.penalty(&Candidate::new(&s, &r2, &slots[1]), &ctx)).abs() < 1e-10);
    }

    #[test]
    fn test_capacity_fit() {
        let slots = grid();
        let days = DayIndex::new(&slots);
        let state = ScheduleState::new();
        let ctx = SoftContext::new(&state, &days);
        let s = Section::new("S1", "C", "T1", "G1").with_students(30);

        let tight = Classroom::new("R1", 30);
        let loose = Classroom::new("R2", 120);
        let t = &slots[0];
        assert!((CapacityFit.penalty(&Candidate::new(&s, &tight, t), &ctx)).abs() < 1e-10);
        assert!((CapacityFit.penalty(&Candidate::new(&s, &loose, t), &ctx) - 0.75).abs() < 1e-10);
    }

    #[test]
    fn test_scorer_weighted_sum() {
        let slots = grid();
        let days = DayIndex::new(&slots);
        let state = ScheduleState::new();
        let ctx = SoftContext::new(&state, &days);
        let s = Section::new("S1", "C", "T1", "G1").with_students(30);
        let r = Classroom::new("R1", 60);
        let c = Candidate::new(&s, &r, &slots[0]);

        let scorer = SoftScorer::new().with_rule(CapacityFit, 2.0);
        assert!((scorer.score(&c, &ctx) - 1.0).abs() < 1e-10);
        assert_eq!(scorer.breakdown(&c, &ctx), vec![("capacity_fit", 1.0)]);

        assert!((SoftScorer::new().score(&c, &ctx)).abs() < 1e-10);
    }

    #[test]
    fn test_from_weights_skips_zero() {
        let weights = SoftWeights {
            compactness: 1.0,
            load_balance: 0.0,
            capacity_fit: 0.5,
        };
        let scorer = SoftScorer::from_weights(&weights);
        assert_eq!(scorer.rule_names(), vec!["compactness", "capacity_fit"]);
        assert!(format!("{scorer:?}").contains("compactness"));
    }
}

//! Timetable quality statistics.
//!
//! Derived from a [`RunResult`] alone; the result carries the catalog
//! dimensions needed for utilization.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Classroom utilization | Periods used / time slots available |
//! | Slot demand | Periods placed at the slot (all classrooms) |
//! | Placement rate | Placed sections / all sections (1.0 if none) |
//! | Avg utilization | Mean classroom utilization |
//! | Busiest slot | Slot with the highest demand (catalog order on ties) |

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::labels::{self, Locale};
use crate::models::{RunResult, UnscheduledReason};

/// Why one section is missing from the timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDiagnostic {
    pub section_id: String,
    pub course_id: String,
    pub reason: UnscheduledReason,
    pub message: String,
}

/// Utilization and placement statistics of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationReport {
    /// Per-classroom utilization (0.0..1.0).
    pub classroom_utilization: BTreeMap<String, f64>,
    /// Per-time-slot number of placed periods.
    pub slot_demand: BTreeMap<String, usize>,
    /// Number of unscheduled sections by reason.
    pub unscheduled_by_reason: BTreeMap<UnscheduledReason, usize>,
    /// Fraction of sections with at least one placed period.
    pub placement_rate: f64,
    /// Mean classroom utilization.
    pub avg_utilization: f64,
    /// Time slot with the highest demand, if anything was placed.
    pub busiest_slot: Option<String>,
    /// One entry per unscheduled section.
    pub diagnostics: Vec<SectionDiagnostic>,
}

impl UtilizationReport {
    /// Computes the report with English diagnostics.
    pub fn calculate(result: &RunResult) -> Self {
        Self::calculate_localized(result, Locale::English)
    }

    /// Computes the report with diagnostics in `locale`.
    pub fn calculate_localized(result: &RunResult, locale: Locale) -> Self {
        let slots_available = result.catalog.time_slot_ids.len();

        let mut room_usage: HashMap<&str, usize> = HashMap::new();
        let mut slot_usage: HashMap<&str, usize> = HashMap::new();
        for a in &result.assignments {
            *room_usage.entry(a.classroom_id.as_str()).or_insert(0) += 1;
            *slot_usage.entry(a.time_slot_id.as_str()).or_insert(0) += 1;
        }

        let classroom_utilization: BTreeMap<String, f64> = result
            .catalog
            .classroom_ids
            .iter()
            .map(|id| {
                let used = room_usage.get(id.as_str()).copied().unwrap_or(0);
                let utilization = if slots_available == 0 {
                    0.0
                } else {
                    used as f64 / slots_available as f64
                };
                (id.clone(), utilization)
            })
            .collect();

        let slot_demand: BTreeMap<String, usize> = result
            .catalog
            .time_slot_ids
            .iter()
            .map(|id| (id.clone(), slot_usage.get(id.as_str()).copied().unwrap_or(0)))
            .collect();

        // First maximum in catalog order.
        let mut busiest_slot: Option<(&str, usize)> = None;
        for id in &result.catalog.time_slot_ids {
            let demand = slot_usage.get(id.as_str()).copied().unwrap_or(0);
            if demand > 0 && busiest_slot.map_or(true, |(_, best)| demand > best) {
                busiest_slot = Some((id.as_str(), demand));
            }
        }

        let mut unscheduled_by_reason = BTreeMap::new();
        for u in &result.unscheduled {
            *unscheduled_by_reason.entry(u.reason).or_insert(0) += 1;
        }

        let placed: HashSet<&str> = result
            .assignments
            .iter()
            .map(|a| a.section_id.as_str())
            .collect();
        let placement_rate = if result.catalog.section_count == 0 {
            1.0
        } else {
            (placed.len() as f64 / result.catalog.section_count as f64).min(1.0)
        };

        let avg_utilization = if classroom_utilization.is_empty() {
            0.0
        } else {
            classroom_utilization.values().sum::<f64>() / classroom_utilization.len() as f64
        };

        let diagnostics = result
            .unscheduled
            .iter()
            .map(|u| SectionDiagnostic {
                section_id: u.section.id.clone(),
                course_id: u.section.course_id.clone(),
                reason: u.reason,
                message: format!(
                    "{} ({}): {}",
                    u.section.id,
                    u.section.course_id,
                    labels::unscheduled_reason(u.reason, locale)
                ),
            })
            .collect();

        Self {
            classroom_utilization,
            slot_demand,
            unscheduled_by_reason,
            placement_rate,
            avg_utilization,
            busiest_slot: busiest_slot.map(|(id, _)| id.to_string()),
            diagnostics,
        }
    }

    /// Number of unscheduled sections with the given reason.
    pub fn unscheduled_count(&self, reason: UnscheduledReason) -> usize {
        self.unscheduled_by_reason.get(&reason).copied().unwrap_or(0)
    }

    /// Whether the run meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_placement_rate: f64, min_avg_utilization: f64) -> bool {
        self.placement_rate >= min_placement_rate && self.avg_utilization >= min_avg_utilization
    }
}

/// Computes the statistics of a run.
pub fn get_statistics(result: &RunResult) -> UtilizationReport {
    UtilizationReport::calculate(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Assignment, CatalogSummary, RunOutcome, SearchStats, Section, UnscheduledSection,
    };

    fn result() -> RunResult {
        RunResult {
            semester: "2025-1".into(),
            assignments: vec![
                Assignment::new("S1", "R1", "D1P1"),
                Assignment::new("S1", "R1", "D1P2"),
                Assignment::new("S2", "R2", "D1P1"),
            ],
            unscheduled: vec![UnscheduledSection::new(
                Section::new("S3", "ART", "T3", "G3"),
                UnscheduledReason::EquipmentMissing,
            )],
            outcome: RunOutcome::Completed,
            stats: SearchStats::default(),
            catalog: CatalogSummary {
                classroom_ids: vec!["R1".into(), "R2".into()],
                time_slot_ids: vec!["D1P1".into(), "D1P2".into(), "D1P3".into(), "D1P4".into()],
                section_count: 4,
            },
        }
    }

    #[test]
    fn test_utilization() {
        let report = get_statistics(&result());
        assert!((report.classroom_utilization["R1"] - 0.5).abs() < 1e-10);
        assert!((report.classroom_utilization["R2"] - 0.25).abs() < 1e-10);
        assert!((report.avg_utilization - 0.375).abs() < 1e-10);
    }

    #[test]
    fn test_slot_demand_and_busiest() {
        let report = get_statistics(&result());
        assert_eq!(report.slot_demand["D1P1"], 2);
        assert_eq!(report.slot_demand["D1P4"], 0);
        assert_eq!(report.busiest_slot.as_deref(), Some("D1P1"));
    }

    #[test]
    fn test_placement_rate_and_reasons() {
        let report = get_statistics(&result());
        // S1, S2 placed out of 4 sections.
        assert!((report.placement_rate - 0.5).abs() < 1e-10);
        assert_eq!(report.unscheduled_count(UnscheduledReason::EquipmentMissing), 1);
        assert_eq!(report.unscheduled_count(UnscheduledReason::NoFeasibleSlot), 0);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.starts_with("S3 (ART)"));
    }

    #[test]
    fn test_empty_run() {
        let empty = RunResult {
            semester: "2025-1".into(),
            assignments: Vec::new(),
            unscheduled: Vec::new(),
            outcome: RunOutcome::Completed,
            stats: SearchStats::default(),
            catalog: CatalogSummary::default(),
        };
        let report = get_statistics(&empty);
        assert!((report.placement_rate - 1.0).abs() < 1e-10);
        assert!((report.avg_utilization).abs() < 1e-10);
        assert_eq!(report.busiest_slot, None);
    }

    #[test]
    fn test_meets_thresholds() {
        let report = get_statistics(&result());
        assert!(report.meets_thresholds(0.5, 0.3));
        assert!(!report.meets_thresholds(0.9, 0.3));
        assert!(!report.meets_thresholds(0.5, 0.4));
    }

    #[test]
    fn test_localized_diagnostics() {
        let report = UtilizationReport::calculate_localized(&result(), Locale::Chinese);
        assert!(report.diagnostics[0].message.contains("设备"));
    }
}

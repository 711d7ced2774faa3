//! Course timetabling engine.
//!
//! Assigns every weekly period of every course section in a semester to a
//! (classroom, time slot) cell without double-booking classrooms, teachers
//! or class groups, while respecting capacity, course-type, equipment and
//! teacher-availability constraints. Over-constrained semesters degrade
//! gracefully: whatever cannot be placed is reported with a reason.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Section`, `Classroom`, `TimeSlot`,
//!   `SemesterSnapshot`, `Assignment`, `RunResult`
//! - **`validation`**: Input integrity checks (empty catalogs, duplicate IDs,
//!   dangling references)
//! - **`state`**: Working placement state with O(1) exclusivity lookups
//! - **`constraints`**: Hard checks and weighted soft rules
//! - **`search`**: Greedy placement with bounded backtracking
//! - **`reschedule`**: Incremental re-placement of selected sections
//! - **`repair`**: Conflict repair of edited timetables
//! - **`coordinator`**: Per-semester run state machine on a bounded pool
//! - **`report`**: Utilization and placement statistics
//! - **`inspect`**: Conflict detection and placement recommendations
//! - **`labels`**: Display text for engine codes
//! - **`config`**: Search budgets, weights and pool size (TOML)
//!
//! # Example
//!
//! ```
//! use u_timetable::{get_statistics, run_full_schedule, SearchOptions};
//! use u_timetable::models::{Classroom, SemesterSnapshot, Section};
//!
//! let mut snapshot = SemesterSnapshot::new("2025-1")
//!     .with_classroom(Classroom::new("R1", 40))
//!     .with_classroom(Classroom::new("R2", 60))
//!     .with_weekly_grid(5, 6);
//! for i in 0..8 {
//!     snapshot = snapshot.with_section(
//!         Section::new(format!("S{i}"), "MATH", format!("T{}", i % 3), format!("G{}", i % 4))
//!             .with_semester("2025-1")
//!             .with_periods(3)
//!             .with_students(35),
//!     );
//! }
//!
//! let result = run_full_schedule(&snapshot, &SearchOptions::default()).unwrap();
//! assert!(result.is_complete());
//! assert_eq!(result.assignment_count(), 24);
//!
//! let report = get_statistics(&result);
//! assert!((report.placement_rate - 1.0).abs() < 1e-10);
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A survey of automated timetabling"
//! - Burke & Petrovic (2002), "Recent research directions in automated
//!   timetabling"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

pub mod config;
pub mod constraints;
pub mod coordinator;
pub mod error;
pub mod inspect;
pub mod labels;
pub mod models;
pub mod repair;
pub mod report;
pub mod reschedule;
pub mod search;
pub mod state;
pub mod validation;

pub use config::{ConfigError, SearchOptions, SoftWeights, TimetableConfig};
pub use coordinator::{RunCoordinator, RunHandle, RunState};
pub use error::{EngineError, EngineResult};
pub use repair::repair_assignments;
pub use report::{get_statistics, UtilizationReport};
pub use reschedule::run_incremental_reschedule;
pub use search::{run_full_schedule, CancelToken};

//! Timetabling domain models.
//!
//! Plain value types describing one semester's scheduling problem and
//! the result of solving it. Built once by the persistence collaborator
//! and treated as read-only snapshots by the engine.
//!
//! # Domain Mappings
//!
//! | u-timetable | Campus system | Generic scheduling |
//! |-------------|---------------|--------------------|
//! | Section | Course offering | Task |
//! | Classroom | Room | Resource |
//! | TimeSlot | Period cell | Time bucket |
//! | Assignment | CourseSchedule row | Assignment |

mod classroom;
mod schedule;
mod section;
mod snapshot;
mod time_slot;

pub use classroom::{Classroom, Equipment};
pub use schedule::{
    Assignment, BudgetLimit, CatalogSummary, RejectionReason, RunOutcome, RunResult,
    SearchStats, UnscheduledReason, UnscheduledSection,
};
pub use section::Section;
pub use snapshot::SemesterSnapshot;
pub use time_slot::{SlotType, TeacherAvailability, TimeSlot};

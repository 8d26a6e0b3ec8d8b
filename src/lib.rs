//! Tabula is a SAT-based solver for daily timetables.
//!
//! A [ConfigurationSnapshot] describes the teachers, learners, subjects, locations and policies of a day.
//! The [TimetableEngine] validates it, compiles it into a weighted SAT model, optimizes the model and returns either
//! the lessons of the day, a minimal set of conflicting constraints, or a timeout notice.

#![warn(missing_docs)]

pub mod domain;
pub use domain::ConfigurationErrors;
pub use domain::ConfigurationIssue;
pub use domain::ConfigurationSnapshot;
pub use domain::DomainBuilder;
pub use domain::Policies;
pub use domain::SchedulingDomain;

pub mod encodings;

mod engine;
pub use engine::CategorySummary;
pub use engine::ConflictDescription;
pub use engine::InfeasibilityReport;
pub use engine::SolveError;
pub use engine::SolveResult;
pub use engine::TimetableEngine;

pub mod extraction;
pub use extraction::JsonFileLessonStore;
pub use extraction::Lesson;
pub use extraction::LessonBatch;
pub use extraction::LessonStore;
pub use extraction::MemoryLessonStore;

pub mod io;

pub mod model;

pub mod objective;

pub mod sat;

pub mod solvers;

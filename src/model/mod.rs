//! The constraint model of a timetable.
//!
//! The [ConstraintCompiler] turns the hard rules of a [SchedulingDomain](crate::domain::SchedulingDomain)
//! into a [ConstraintGraph], linking each constraint to the candidate placements it involves.

mod compiler;
pub use compiler::ConstraintCompiler;

mod constraint_graph;
pub use constraint_graph::Constraint;
pub use constraint_graph::ConstraintBody;
pub use constraint_graph::ConstraintGraph;
pub use constraint_graph::ConstraintKind;
pub use constraint_graph::DiagnosticCategory;
pub use constraint_graph::SlotOccupancy;
pub use constraint_graph::SoftCoverage;

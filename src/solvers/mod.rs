//! The SAT-based solving process of timetables.

mod diagnosis;
pub use diagnosis::ConflictCore;
pub use diagnosis::ConflictDiagnoser;

mod driver;
pub use driver::DriverOutcome;
pub use driver::DriverPhase;
pub use driver::SolverDriver;

mod optimizer;
pub use optimizer::ObjectiveOptimizer;
pub use optimizer::OptimizationOutcome;

mod time_budget;
pub use time_budget::TimeBudget;

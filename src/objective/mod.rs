//! The weighted objective function of a timetable.

mod composer;
pub use composer::Objective;
pub use composer::ObjectiveComposer;
pub use composer::ObjectiveTerm;
pub use composer::TermSource;
pub use composer::WEIGHT_SCALE;

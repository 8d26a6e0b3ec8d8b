//! Objects used to encode timetable models into SAT solvers.

mod cardinality;
pub use cardinality::encode_at_least_one;
pub use cardinality::encode_at_most_one;
pub use cardinality::encode_bounds;
pub use cardinality::Counter;

mod cnf_builder;
pub use cnf_builder::CnfBuilder;
pub use cnf_builder::GuardedClause;
pub use cnf_builder::LoadMode;

mod specs;
pub use specs::ConstraintsEncoder;

mod timetable_constraints_encoder;
pub use timetable_constraints_encoder::DefaultTimetableConstraintsEncoder;

mod weighted_sum;
pub use weighted_sum::WeightedSum;

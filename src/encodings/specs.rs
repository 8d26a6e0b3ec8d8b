use super::CnfBuilder;
use crate::{
    model::ConstraintGraph,
    sat::{Assignment, Literal},
};

/// The trait for encoders from constraint graphs to SAT.
pub trait ConstraintsEncoder {
    /// Encodes the constraints of the graph into the CNF builder.
    ///
    /// The builder must be fresh.
    /// The `i`-th constraint of the graph is encoded in the `i`-th constraint group of the builder.
    fn encode_constraints(&self, graph: &ConstraintGraph, builder: &mut CnfBuilder);

    /// Translates back a SAT assignment into the indices of the scheduled candidate placements.
    fn assignment_to_placements(&self, assignment: &Assignment, graph: &ConstraintGraph)
        -> Vec<usize>;

    /// Translates a candidate placement into the literal that represent it.
    fn candidate_to_lit(&self, candidate: usize) -> Literal;
}

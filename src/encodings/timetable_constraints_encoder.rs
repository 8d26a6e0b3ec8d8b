use super::{
    cardinality::{encode_at_least_one, encode_at_most_one, encode_bounds},
    specs::ConstraintsEncoder,
    CnfBuilder,
};
use crate::{
    model::{ConstraintBody, ConstraintGraph},
    sat::{Assignment, Literal},
};

/// The default encoder of timetable constraint graphs.
///
/// Candidate placement `i` is represented by variable `i+2`, since the first variable is reserved by the [CnfBuilder].
#[derive(Default)]
pub struct DefaultTimetableConstraintsEncoder;

impl DefaultTimetableConstraintsEncoder {
    fn lits(&self, candidates: &[usize]) -> Vec<Literal> {
        candidates
            .iter()
            .map(|c| self.candidate_to_lit(*c))
            .collect()
    }

    // the literals stating a slot is occupied; the constant false for slots without candidates
    fn occupancy(&self, builder: &mut CnfBuilder, per_slot: &[Vec<usize>]) -> Vec<Literal> {
        per_slot
            .iter()
            .map(|set| {
                let lits = self.lits(set);
                builder.define_or(&lits)
            })
            .collect()
    }

    fn encode_body(&self, body: &ConstraintBody, builder: &mut CnfBuilder) {
        match body {
            ConstraintBody::AtMostOne(candidates) => {
                encode_at_most_one(builder, &self.lits(candidates))
            }
            ConstraintBody::AtLeastOne(candidates) => {
                encode_at_least_one(builder, &self.lits(candidates))
            }
            ConstraintBody::Bounds {
                candidates,
                min,
                max,
            } => encode_bounds(builder, &self.lits(candidates), *min, *max),
            ConstraintBody::Pinned { options, excluded } => {
                builder.add_assertion(self.lits(options));
                self.lits(excluded)
                    .into_iter()
                    .for_each(|l| builder.add_assertion(vec![l.negate()]));
            }
            ConstraintBody::Contiguous(per_slot) => {
                let occupied = self.occupancy(builder, per_slot);
                let false_lit = builder.false_lit();
                for i in 0..occupied.len() {
                    for k in i + 2..occupied.len() {
                        if occupied[i] == false_lit || occupied[k] == false_lit {
                            continue;
                        }
                        for o in occupied.iter().take(k).skip(i + 1) {
                            let cl = if *o == false_lit {
                                vec![occupied[i].negate(), occupied[k].negate()]
                            } else {
                                vec![occupied[i].negate(), *o, occupied[k].negate()]
                            };
                            builder.add_assertion(cl);
                        }
                    }
                }
            }
            ConstraintBody::NotAdjacent(per_slot) => {
                let occupied = self.occupancy(builder, per_slot);
                let false_lit = builder.false_lit();
                for pair in occupied.windows(2) {
                    if pair[0] != false_lit && pair[1] != false_lit {
                        builder.add_assertion(vec![pair[0].negate(), pair[1].negate()]);
                    }
                }
            }
            ConstraintBody::OneOf(sets) => {
                let used = self.occupancy(builder, sets);
                encode_at_most_one(builder, &used);
            }
        }
    }
}

impl ConstraintsEncoder for DefaultTimetableConstraintsEncoder {
    fn encode_constraints(&self, graph: &ConstraintGraph, builder: &mut CnfBuilder) {
        builder.new_lits(graph.n_candidates());
        for constraint in graph.constraints() {
            builder.open_group();
            self.encode_body(&constraint.body, builder);
            builder.close_group();
        }
    }

    fn assignment_to_placements(
        &self,
        assignment: &Assignment,
        graph: &ConstraintGraph,
    ) -> Vec<usize> {
        (0..graph.n_candidates())
            .filter(|c| assignment.satisfies(self.candidate_to_lit(*c)))
            .collect()
    }

    fn candidate_to_lit(&self, candidate: usize) -> Literal {
        Literal::from(candidate as isize + 2)
    }
}

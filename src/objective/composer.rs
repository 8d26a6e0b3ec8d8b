use crate::{
    domain::{BalanceTarget, Candidate, SchedulingDomain},
    encodings::{CnfBuilder, ConstraintsEncoder, Counter, WeightedSum},
    model::ConstraintGraph,
    sat::{Assignment, Literal},
};
use log::debug;

/// The factor applied to weights before they are rounded to integers.
pub const WEIGHT_SCALE: f64 = 100.0;

const MIN_COVERAGE_PENALTY: f64 = 1000.0;

/// The scoring component an objective term comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
pub enum TermSource {
    /// The weight of a scheduled placement.
    #[strum(serialize = "placement")]
    Placement,
    /// The bonus of two adjacent lessons in a subject.
    #[strum(serialize = "consecutive bonus")]
    Consecutive,
    /// The penalty of a teacher load above the target.
    #[strum(serialize = "teacher balance")]
    Balance,
    /// The penalty of an uncovered subject.
    #[strum(serialize = "coverage penalty")]
    Coverage,
}

/// A weighted literal of the objective function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveTerm {
    /// The component the term comes from.
    pub source: TermSource,
    /// The unscaled weight of the term.
    pub weight: f64,
    /// The literal the weight applies to.
    pub literal: Literal,
}

/// The objective function of a timetable, to be maximized.
///
/// Weights are scaled by [WEIGHT_SCALE] and rounded.
/// Negative terms `w.l` are rewritten as `w + |w|.¬l`, so that the sum encoded in the solver only has positive weights.
#[derive(Debug, Clone)]
pub struct Objective {
    terms: Vec<ObjectiveTerm>,
    offset: i64,
    sum: WeightedSum,
}

impl Objective {
    /// Returns the terms of the objective, before scaling.
    pub fn terms(&self) -> &[ObjectiveTerm] {
        &self.terms
    }

    /// Returns the scaled value of the objective under a model.
    pub fn scaled_value(&self, model: &Assignment) -> i64 {
        self.offset + self.sum.evaluate(model) as i64
    }

    /// Returns the value of the objective under a model.
    pub fn value(&self, model: &Assignment) -> f64 {
        self.scaled_value(model) as f64 / WEIGHT_SCALE
    }

    /// Returns the greatest scaled value the objective may reach.
    pub fn scaled_upper_bound(&self) -> i64 {
        self.offset + self.sum.upper_bound() as i64
    }

    /// Returns the clauses asserting that the scaled value of the objective is at least `value`.
    pub fn at_least_clauses(&self, value: i64) -> Vec<Vec<Literal>> {
        if value <= self.offset {
            return vec![];
        }
        self.sum.at_least_clauses((value - self.offset) as u64)
    }
}

/// Builds the objective function of a timetable from the policies of its domain.
pub struct ObjectiveComposer<'a> {
    domain: &'a SchedulingDomain,
    graph: &'a ConstraintGraph,
    encoder: &'a dyn ConstraintsEncoder,
}

impl<'a> ObjectiveComposer<'a> {
    /// Builds a composer for the given model.
    ///
    /// The encoder must be the one used to encode the constraint graph.
    pub fn new(
        domain: &'a SchedulingDomain,
        graph: &'a ConstraintGraph,
        encoder: &'a dyn ConstraintsEncoder,
    ) -> Self {
        Self {
            domain,
            graph,
            encoder,
        }
    }

    /// Returns the weight of a candidate placement.
    ///
    /// It is made of the base lesson weight and the attendance priority term, multiplied by the group weight for group lessons.
    pub fn placement_weight(&self, candidate: &Candidate) -> f64 {
        let policies = self.domain.policies();
        let learner = &self.domain.learners()[candidate.learner];
        let mut weight = policies.lesson_weight;
        if policies.use_attendance_priority {
            if let Some(subject) = self.domain.subject(candidate.subject) {
                weight += if learner.attendance_in(candidate.subject) < subject.min_percentage {
                    subject.below_weight
                } else {
                    subject.at_or_above_weight
                };
            }
        }
        if learner.kind.is_group() {
            weight *= policies.group_weight;
        }
        weight
    }

    /// Returns the load each teacher is balanced against.
    pub fn balance_target(&self) -> usize {
        let policies = self.domain.policies();
        match policies.balance_target {
            BalanceTarget::Fixed(n) => n,
            BalanceTarget::Mean => {
                let mut with_candidates = vec![false; self.domain.learners().len()];
                let mut teachers = vec![false; self.domain.teachers().len()];
                for c in self.domain.candidates() {
                    with_candidates[c.learner] = true;
                    teachers[c.teacher] = true;
                }
                let min_total: usize = if policies.require_all_subjects {
                    self.domain
                        .learners()
                        .iter()
                        .zip(with_candidates.iter())
                        .filter(|(_, has)| **has)
                        .map(|(l, _)| l.min_lessons)
                        .sum()
                } else {
                    0
                };
                let demand = usize::max(min_total, self.domain.pins().len());
                let n_teachers = teachers.iter().filter(|t| **t).count();
                if n_teachers == 0 {
                    0
                } else {
                    (demand + n_teachers - 1) / n_teachers
                }
            }
        }
    }

    /// Encodes the objective function.
    ///
    /// Only definitional clauses are added to the builder.
    pub fn compose(&self, builder: &mut CnfBuilder) -> Objective {
        let mut terms = vec![];
        self.placement_terms(&mut terms);
        self.consecutive_terms(builder, &mut terms);
        self.balance_terms(builder, &mut terms);
        self.coverage_terms(builder, &mut terms);
        let mut offset = 0;
        let mut scaled = Vec::with_capacity(terms.len());
        for t in terms.iter() {
            let w = (t.weight * WEIGHT_SCALE).round() as i64;
            if w > 0 {
                scaled.push((w as u64, t.literal));
            } else if w < 0 {
                offset += w;
                scaled.push((w.unsigned_abs(), t.literal.negate()));
            }
        }
        let sum = WeightedSum::new(builder, scaled);
        let objective = Objective {
            terms,
            offset,
            sum,
        };
        debug!(
            "objective has {} term(s) over {} bit(s); upper bound is {}",
            objective.terms.len(),
            objective.sum.bits().len(),
            objective.scaled_upper_bound() as f64 / WEIGHT_SCALE
        );
        objective
    }

    fn placement_terms(&self, terms: &mut Vec<ObjectiveTerm>) {
        for (i, c) in self.domain.candidates().iter().enumerate() {
            terms.push(ObjectiveTerm {
                source: TermSource::Placement,
                weight: self.placement_weight(c),
                literal: self.encoder.candidate_to_lit(i),
            });
        }
    }

    fn consecutive_terms(&self, builder: &mut CnfBuilder, terms: &mut Vec<ObjectiveTerm>) {
        let weight = self.domain.policies().consecutive_weight;
        if weight == 0.0 {
            return;
        }
        for occupancy in self.graph.preferred_adjacency() {
            let occupied: Vec<Literal> = occupancy
                .per_slot
                .iter()
                .map(|set| {
                    let lits: Vec<Literal> =
                        set.iter().map(|c| self.encoder.candidate_to_lit(*c)).collect();
                    builder.define_or(&lits)
                })
                .collect();
            for (a, b) in occupancy.adjacent_pairs() {
                let both = builder.define_and(&[occupied[a], occupied[b]]);
                terms.push(ObjectiveTerm {
                    source: TermSource::Consecutive,
                    weight,
                    literal: both,
                });
            }
        }
    }

    fn balance_terms(&self, builder: &mut CnfBuilder, terms: &mut Vec<ObjectiveTerm>) {
        let policies = self.domain.policies();
        if !policies.balance_teacher_load || policies.balance_weight == 0.0 {
            return;
        }
        let target = self.balance_target();
        debug!("teacher balance target is {} lesson(s)", target);
        for ti in 0..self.domain.teachers().len() {
            let lits: Vec<Literal> = self
                .domain
                .candidates()
                .iter()
                .enumerate()
                .filter(|(_, c)| c.teacher == ti)
                .map(|(i, _)| self.encoder.candidate_to_lit(i))
                .collect();
            let cap = usize::min(lits.len(), policies.slots_per_day);
            if target >= cap {
                continue;
            }
            let counter = Counter::new(builder, &lits, cap);
            for j in target + 1..=cap {
                if let Some(excess) = counter.at_least(builder, j) {
                    terms.push(ObjectiveTerm {
                        source: TermSource::Balance,
                        weight: -policies.balance_weight,
                        literal: excess,
                    });
                }
            }
        }
    }

    fn coverage_terms(&self, builder: &mut CnfBuilder, terms: &mut Vec<ObjectiveTerm>) {
        if self.graph.soft_coverage().is_empty() {
            return;
        }
        let others: f64 = terms.iter().map(|t| t.weight.abs()).sum();
        let penalty = f64::max(MIN_COVERAGE_PENALTY, others + 1.0);
        for coverage in self.graph.soft_coverage() {
            let lits: Vec<Literal> = coverage
                .candidates
                .iter()
                .map(|c| self.encoder.candidate_to_lit(*c))
                .collect();
            let covered = builder.define_or(&lits);
            terms.push(ObjectiveTerm {
                source: TermSource::Coverage,
                weight: -penalty,
                literal: covered.negate(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConfigurationSnapshot, DomainBuilder, SubjectId},
        encodings::{DefaultTimetableConstraintsEncoder, LoadMode},
        model::ConstraintCompiler,
        sat::default_solver,
    };

    fn domain(json: &str) -> SchedulingDomain {
        let snapshot = ConfigurationSnapshot::from_json_str(json).unwrap();
        DomainBuilder::new(&snapshot).build().unwrap()
    }

    #[test]
    fn test_attendance_priority_weights() {
        let domain = domain(
            r#"{
                "policies": {"slots_per_day": 1, "use_attendance_priority": true, "require_all_subjects": false},
                "subjects": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
                "teachers": [{"id": 1, "name": "T", "subjects": [1, 2]}],
                "students": [{"id": 1, "name": "S", "subjects": [1, 2]}],
                "attendance": [
                    {"student": 1, "subject": 1, "attended": 1, "scheduled": 2},
                    {"student": 1, "subject": 2, "attended": 9, "scheduled": 10}
                ]
            }"#,
        );
        let graph = ConstraintCompiler::new(&domain).compile();
        let encoder = DefaultTimetableConstraintsEncoder;
        let composer = ObjectiveComposer::new(&domain, &graph, &encoder);
        let weights: Vec<(SubjectId, f64)> = domain
            .candidates()
            .iter()
            .map(|c| (c.subject, composer.placement_weight(c)))
            .collect();
        assert_eq!(vec![(SubjectId(1), 11.0), (SubjectId(2), 1.0)], weights);
    }

    #[test]
    fn test_group_weight() {
        let domain = domain(
            r#"{
                "policies": {"slots_per_day": 1, "group_weight": 3.0},
                "subjects": [{"id": 1, "name": "A"}],
                "teachers": [{"id": 1, "name": "T", "subjects": [1]}],
                "students": [{"id": 1, "name": "S"}],
                "groups": [{"id": 1, "name": "G", "members": [1], "subjects": [1]}]
            }"#,
        );
        let graph = ConstraintCompiler::new(&domain).compile();
        let encoder = DefaultTimetableConstraintsEncoder;
        let composer = ObjectiveComposer::new(&domain, &graph, &encoder);
        assert_eq!(3.0, composer.placement_weight(&domain.candidates()[0]));
    }

    #[test]
    fn test_balance_target() {
        let json = r#"{
            "policies": {"slots_per_day": 4, "balance_teacher_load": true, "min_lessons": 1},
            "subjects": [{"id": 1, "name": "A"}],
            "teachers": [{"id": 1, "name": "T", "subjects": [1]}, {"id": 2, "name": "U", "subjects": [1]}],
            "students": [{"id": 1, "name": "S1", "subjects": [1]}, {"id": 2, "name": "S2", "subjects": [1]}, {"id": 3, "name": "S3", "subjects": [1]}]
        }"#;
        let domain = domain(json);
        let graph = ConstraintCompiler::new(&domain).compile();
        let encoder = DefaultTimetableConstraintsEncoder;
        let composer = ObjectiveComposer::new(&domain, &graph, &encoder);
        assert_eq!(2, composer.balance_target());
        let mut builder = CnfBuilder::new();
        encoder.encode_constraints(&graph, &mut builder);
        let objective = composer.compose(&mut builder);
        assert_eq!(
            4,
            objective
                .terms()
                .iter()
                .filter(|t| t.source == TermSource::Balance)
                .count()
        );
    }

    #[test]
    fn test_coverage_penalty_value() {
        let domain = domain(
            r#"{
                "policies": {"slots_per_day": 1, "require_all_subjects": false},
                "subjects": [{"id": 1, "name": "A"}],
                "teachers": [{"id": 1, "name": "T", "subjects": [1]}],
                "students": [{"id": 1, "name": "S", "subjects": [1]}]
            }"#,
        );
        let graph = ConstraintCompiler::new(&domain).compile();
        let encoder = DefaultTimetableConstraintsEncoder;
        let composer = ObjectiveComposer::new(&domain, &graph, &encoder);
        let mut builder = CnfBuilder::new();
        encoder.encode_constraints(&graph, &mut builder);
        let objective = composer.compose(&mut builder);
        assert_eq!(100, objective.scaled_upper_bound());
        let mut solver = default_solver();
        builder.load_into(solver.as_mut(), LoadMode::Plain);
        let lit = encoder.candidate_to_lit(0);
        let model = solver
            .solve_under_assumptions(&[lit.negate()])
            .unwrap_model()
            .unwrap();
        assert_eq!(-1000.0, objective.value(&model));
        let model = solver
            .solve_under_assumptions(&[lit])
            .unwrap_model()
            .unwrap();
        assert_eq!(1.0, objective.value(&model));
        assert!(objective.at_least_clauses(-200_000).is_empty());
    }
}

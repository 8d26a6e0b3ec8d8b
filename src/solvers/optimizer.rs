use super::TimeBudget;
use crate::{
    objective::{Objective, WEIGHT_SCALE},
    sat::{Assignment, SatSolver, SolvingResult},
};
use log::debug;

/// The outcome of an optimization process.
#[derive(Debug, PartialEq, Eq)]
pub enum OptimizationOutcome {
    /// A model with a proven optimal value.
    Optimal(Assignment),
    /// The best model found before the budget ran out.
    Feasible(Assignment),
    /// No model exists.
    Infeasible,
    /// The budget ran out before any model was found.
    Unknown,
}

/// Maximizes an objective function by a SAT-UNSAT linear search.
///
/// After each model, the solver is asked for a model with a strictly greater value.
/// An unsatisfiable call proves the last model is optimal.
pub struct ObjectiveOptimizer<'a> {
    solver: &'a mut dyn SatSolver,
    objective: &'a Objective,
    budget: TimeBudget,
}

impl<'a> ObjectiveOptimizer<'a> {
    /// Builds an optimizer.
    ///
    /// The solver must already contain the clauses of the model and the objective.
    pub fn new(solver: &'a mut dyn SatSolver, objective: &'a Objective, budget: TimeBudget) -> Self {
        Self {
            solver,
            objective,
            budget,
        }
    }

    /// Runs the search.
    pub fn optimize(self) -> OptimizationOutcome {
        let upper_bound = self.objective.scaled_upper_bound();
        let mut best: Option<Assignment> = None;
        let mut n_models = 0;
        loop {
            if self.budget.is_exhausted() {
                return interrupted(best);
            }
            self.solver.set_time_limit(self.budget.remaining());
            match self.solver.solve() {
                SolvingResult::Satisfiable(model) => {
                    n_models += 1;
                    let value = self.objective.scaled_value(&model);
                    debug!(
                        "model #{} has value {} (upper bound is {})",
                        n_models,
                        value as f64 / WEIGHT_SCALE,
                        upper_bound as f64 / WEIGHT_SCALE
                    );
                    if value >= upper_bound {
                        return OptimizationOutcome::Optimal(model);
                    }
                    self.objective
                        .at_least_clauses(value + 1)
                        .into_iter()
                        .for_each(|cl| self.solver.add_clause(cl));
                    best = Some(model);
                }
                SolvingResult::Unsatisfiable => {
                    return match best {
                        Some(model) => OptimizationOutcome::Optimal(model),
                        None => OptimizationOutcome::Infeasible,
                    }
                }
                SolvingResult::Unknown => return interrupted(best),
            }
        }
    }
}

fn interrupted(best: Option<Assignment>) -> OptimizationOutcome {
    match best {
        Some(model) => {
            debug!("optimization interrupted; keeping the best model found");
            OptimizationOutcome::Feasible(model)
        }
        None => OptimizationOutcome::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConfigurationSnapshot, DomainBuilder, SubjectId},
        encodings::{CnfBuilder, ConstraintsEncoder, DefaultTimetableConstraintsEncoder, LoadMode},
        model::ConstraintCompiler,
        objective::ObjectiveComposer,
        sat::default_solver,
    };
    use std::time::Duration;

    fn optimize(json: &str, budget: TimeBudget) -> (Vec<SubjectId>, Option<f64>, bool) {
        let snapshot = ConfigurationSnapshot::from_json_str(json).unwrap();
        let domain = DomainBuilder::new(&snapshot).build().unwrap();
        let graph = ConstraintCompiler::new(&domain).compile();
        let encoder = DefaultTimetableConstraintsEncoder;
        let mut builder = CnfBuilder::new();
        encoder.encode_constraints(&graph, &mut builder);
        let objective = ObjectiveComposer::new(&domain, &graph, &encoder).compose(&mut builder);
        let mut solver = default_solver();
        builder.load_into(solver.as_mut(), LoadMode::Plain);
        let (model, optimal) =
            match ObjectiveOptimizer::new(solver.as_mut(), &objective, budget).optimize() {
                OptimizationOutcome::Optimal(m) => (Some(m), true),
                OptimizationOutcome::Feasible(m) => (Some(m), false),
                _ => (None, false),
            };
        match model {
            Some(m) => (
                encoder
                    .assignment_to_placements(&m, &graph)
                    .into_iter()
                    .map(|c| domain.candidates()[c].subject)
                    .collect(),
                Some(objective.value(&m)),
                optimal,
            ),
            None => (vec![], None, false),
        }
    }

    const PRIORITY: &str = r#"{
        "policies": {"slots_per_day": 2, "max_lessons": 1, "use_attendance_priority": true, "require_all_subjects": false},
        "subjects": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
        "teachers": [{"id": 1, "name": "T", "subjects": [1, 2]}],
        "students": [{"id": 1, "name": "S", "subjects": [1, 2]}],
        "attendance": [
            {"student": 1, "subject": 1, "attended": 5, "scheduled": 10},
            {"student": 1, "subject": 2, "attended": 9, "scheduled": 10}
        ]
    }"#;

    #[test]
    fn test_prefers_low_attendance_subject() {
        let (subjects, value, optimal) = optimize(PRIORITY, TimeBudget::unbounded());
        assert_eq!(vec![SubjectId(1)], subjects);
        assert_eq!(Some(11.0 - 1000.0), value);
        assert!(optimal);
    }

    #[test]
    fn test_infeasible() {
        let json = r#"{
            "policies": {"slots_per_day": 1, "min_lessons": 1, "max_lessons": 1},
            "subjects": [{"id": 1, "name": "A"}],
            "teachers": [{"id": 1, "name": "T", "subjects": [1]}],
            "students": [{"id": 1, "name": "S1", "subjects": [1]}, {"id": 2, "name": "S2", "subjects": [1]}]
        }"#;
        assert_eq!((vec![], None, false), optimize(json, TimeBudget::unbounded()));
    }

    #[test]
    fn test_exhausted_budget() {
        assert_eq!(
            (vec![], None, false),
            optimize(PRIORITY, TimeBudget::new(Duration::ZERO))
        );
    }
}

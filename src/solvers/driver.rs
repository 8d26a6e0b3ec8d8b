use super::{
    ConflictCore, ConflictDiagnoser, ObjectiveOptimizer, OptimizationOutcome, TimeBudget,
};
use crate::{
    domain::SchedulingDomain,
    encodings::{CnfBuilder, ConstraintsEncoder, DefaultTimetableConstraintsEncoder, LoadMode},
    model::{Constraint, ConstraintCompiler},
    objective::ObjectiveComposer,
    sat::SatSolverFactory,
};
use log::{debug, info};
use std::time::Duration;

/// The phases a solving process goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum DriverPhase {
    /// The constraint model and its encoding are being built.
    #[strum(serialize = "compiling")]
    Compiling,
    /// The SAT solver is searching for an optimal timetable.
    #[strum(serialize = "solving")]
    Solving,
    /// A timetable was found.
    #[strum(serialize = "solved")]
    Solved,
    /// The model is infeasible and conflicting constraints are being searched.
    #[strum(serialize = "diagnosing infeasibility")]
    InfeasibleDiagnosing,
    /// The time budget ran out.
    #[strum(serialize = "timed out")]
    TimedOut,
}

/// The outcome of a solving process.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverOutcome {
    /// A timetable was found.
    Solved {
        /// The indices of the scheduled candidate placements.
        placements: Vec<usize>,
        /// The value of the objective function.
        objective: f64,
        /// Whether the value is proven to be optimal.
        optimal: bool,
    },
    /// No timetable satisfies the hard constraints.
    Infeasible {
        /// The conflicting constraints.
        conflicts: Vec<Constraint>,
        /// Whether the set of conflicting constraints is proven minimal.
        minimal: bool,
    },
    /// The time budget ran out before any timetable was found.
    TimedOut,
}

/// Drives the solving process of a scheduling domain.
///
/// The domain is compiled into a constraint graph, encoded with its objective function,
/// and handed to a SAT solver for optimization.
/// If the model is infeasible, a new solver is used to compute a minimal set of conflicting constraints.
/// The whole process, diagnosis included, is bounded by the time limit.
pub struct SolverDriver<'a> {
    domain: &'a SchedulingDomain,
    solver_factory: &'a dyn SatSolverFactory,
    constraints_encoder: Box<dyn ConstraintsEncoder>,
    time_limit: Option<Duration>,
    phase: DriverPhase,
}

impl<'a> SolverDriver<'a> {
    /// Builds a driver for the given domain.
    ///
    /// A missing time limit means an unbounded process.
    pub fn new(
        domain: &'a SchedulingDomain,
        solver_factory: &'a dyn SatSolverFactory,
        time_limit: Option<Duration>,
    ) -> Self {
        Self {
            domain,
            solver_factory,
            constraints_encoder: Box::new(DefaultTimetableConstraintsEncoder),
            time_limit,
            phase: DriverPhase::Compiling,
        }
    }

    /// Returns the current phase of the process.
    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    fn enter(&mut self, phase: DriverPhase) {
        info!("{} phase: {}", self.solver_factory.name(), phase);
        self.phase = phase;
    }

    /// Runs the solving process.
    pub fn run(&mut self) -> DriverOutcome {
        let budget = match self.time_limit {
            Some(limit) => TimeBudget::new(limit),
            None => TimeBudget::unbounded(),
        };
        self.enter(DriverPhase::Compiling);
        let graph = ConstraintCompiler::new(self.domain).compile();
        let mut builder = CnfBuilder::new();
        self.constraints_encoder
            .encode_constraints(&graph, &mut builder);
        let objective =
            ObjectiveComposer::new(self.domain, &graph, self.constraints_encoder.as_ref())
                .compose(&mut builder);
        info!(
            "model has {} variable(s), {} clause(s) and {} constraint group(s)",
            builder.n_vars(),
            builder.n_clauses(),
            builder.n_groups()
        );
        self.enter(DriverPhase::Solving);
        let mut solver = self.solver_factory.new_solver();
        builder.load_into(solver.as_mut(), LoadMode::Plain);
        let outcome = ObjectiveOptimizer::new(solver.as_mut(), &objective, budget).optimize();
        let (model, optimal) = match outcome {
            OptimizationOutcome::Optimal(model) => (model, true),
            OptimizationOutcome::Feasible(model) => (model, false),
            OptimizationOutcome::Infeasible => {
                self.enter(DriverPhase::InfeasibleDiagnosing);
                let mut solver = self.solver_factory.new_solver();
                builder.load_into(solver.as_mut(), LoadMode::Guarded);
                let ConflictCore { groups, minimal } =
                    ConflictDiagnoser::new(solver.as_mut(), builder.selectors(), budget)
                        .diagnose();
                info!(
                    "found {} {}conflicting constraint(s)",
                    groups.len(),
                    if minimal { "minimally " } else { "" }
                );
                return DriverOutcome::Infeasible {
                    conflicts: groups
                        .into_iter()
                        .map(|g| graph.constraints()[g].clone())
                        .collect(),
                    minimal,
                };
            }
            OptimizationOutcome::Unknown => {
                self.enter(DriverPhase::TimedOut);
                return DriverOutcome::TimedOut;
            }
        };
        self.enter(DriverPhase::Solved);
        let placements = self
            .constraints_encoder
            .assignment_to_placements(&model, &graph);
        let value = objective.value(&model);
        debug!(
            "{} placement(s) scheduled; objective value is {}{}",
            placements.len(),
            value,
            if optimal { " (optimal)" } else { "" }
        );
        DriverOutcome::Solved {
            placements,
            objective: value,
            optimal,
        }
    }
}

use super::{
    sat_solver::{SolvingListener, SolvingResult},
    Assignment, Literal, SatSolver,
};
use cadical::{Callbacks, Solver as CadicalCSolver};
use std::time::{Duration, Instant};

/// Interrupts CaDiCaL once the deadline is over.
struct Deadline(Option<Instant>);

impl Callbacks for Deadline {
    fn terminate(&mut self) -> bool {
        matches!(self.0, Some(d) if Instant::now() >= d)
    }
}

/// A wrapper around the Cadical SAT solver.
pub struct CadicalSolver {
    solver: CadicalCSolver<Deadline>,
    time_limit: Option<Duration>,
    listeners: Vec<Box<dyn SolvingListener>>,
    n_vars: usize,
    n_clauses: usize,
}

impl Default for CadicalSolver {
    fn default() -> Self {
        Self {
            solver: CadicalCSolver::new(),
            time_limit: None,
            listeners: vec![],
            n_vars: 0,
            n_clauses: 0,
        }
    }
}

impl SatSolver for CadicalSolver {
    fn add_clause(&mut self, cl: Vec<Literal>) {
        cl.iter()
            .for_each(|l| self.n_vars = usize::max(self.n_vars, usize::from(l.var())));
        self.solver
            .add_clause(cl.into_iter().map(|l| isize::from(l) as i32));
        self.n_clauses += 1;
    }

    fn solve(&mut self) -> SolvingResult {
        self.solve_under_assumptions(&[])
    }

    fn solve_under_assumptions(&mut self, assumptions: &[Literal]) -> SolvingResult {
        self.listeners
            .iter()
            .for_each(|l| l.solving_start(self.n_vars(), self.n_clauses));
        let deadline = self.time_limit.map(|l| Instant::now() + l);
        self.solver.set_callbacks(Some(Deadline(deadline)));
        let solving_result = match self
            .solver
            .solve_with(assumptions.iter().map(|l| isize::from(*l) as i32))
        {
            Some(true) => {
                let known = self.solver.max_variable() as usize;
                let assignment = Assignment::new(
                    (1..=self.n_vars())
                        .map(|i| {
                            if i <= known {
                                self.solver.value(i as i32)
                            } else {
                                None
                            }
                        })
                        .collect(),
                );
                SolvingResult::Satisfiable(assignment)
            }
            Some(false) => SolvingResult::Unsatisfiable,
            None => SolvingResult::Unknown,
        };
        self.listeners
            .iter()
            .for_each(|l| l.solving_end(&solving_result));
        solving_result
    }

    fn failed_assumptions(&self, assumptions: &[Literal]) -> Option<Vec<Literal>> {
        Some(
            assumptions
                .iter()
                .filter(|l| self.solver.failed(isize::from(**l) as i32))
                .copied()
                .collect(),
        )
    }

    fn set_time_limit(&mut self, limit: Option<Duration>) {
        self.time_limit = limit;
    }

    fn n_vars(&self) -> usize {
        usize::max(self.n_vars, self.solver.max_variable() as usize)
    }

    fn add_listener(&mut self, listener: Box<dyn SolvingListener>) {
        self.listeners.push(listener);
    }

    fn reserve(&mut self, new_max_id: usize) {
        self.n_vars = usize::max(self.n_vars, new_max_id);
    }
}

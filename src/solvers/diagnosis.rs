use super::TimeBudget;
use crate::sat::{Literal, SatSolver, SolvingResult};
use log::{debug, warn};
use std::collections::BTreeMap;

/// A set of constraint groups that cannot hold together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictCore {
    /// The indices of the constraint groups, in increasing order.
    pub groups: Vec<usize>,
    /// Whether removing any group of the core makes the remaining ones consistent.
    pub minimal: bool,
}

enum Check {
    Conflict(Vec<usize>),
    Consistent,
    Unknown,
}

/// Computes a minimal set of conflicting constraint groups.
///
/// Each group is enabled by a selector literal given as an assumption.
/// The first core comes from the failed assumptions when the solver reports them, or is the whole set of groups.
/// It is then minimized by deletion: each group is removed in turn, and put back if the others become consistent.
pub struct ConflictDiagnoser<'a> {
    solver: &'a mut dyn SatSolver,
    selectors: Vec<Literal>,
    groups_by_selector: BTreeMap<Literal, usize>,
    budget: TimeBudget,
    n_calls: usize,
}

impl<'a> ConflictDiagnoser<'a> {
    /// Builds a diagnoser.
    ///
    /// The solver must contain the clauses of the model, each assertion being guarded by the selector of its group.
    pub fn new(solver: &'a mut dyn SatSolver, selectors: Vec<Literal>, budget: TimeBudget) -> Self {
        let groups_by_selector = selectors
            .iter()
            .enumerate()
            .map(|(i, s)| (*s, i))
            .collect();
        Self {
            solver,
            selectors,
            groups_by_selector,
            budget,
            n_calls: 0,
        }
    }

    /// Computes the core.
    ///
    /// If the budget runs out, the smallest core found so far is returned and is not flagged as minimal.
    pub fn diagnose(mut self) -> ConflictCore {
        let all: Vec<usize> = (0..self.selectors.len()).collect();
        let mut core = match self.check(&all) {
            Check::Conflict(core) => core,
            Check::Consistent => {
                warn!("the constraint groups are consistent together; no conflict to diagnose");
                return ConflictCore {
                    groups: vec![],
                    minimal: false,
                };
            }
            Check::Unknown => {
                warn!("time budget exhausted before any conflict was found");
                return ConflictCore {
                    groups: vec![],
                    minimal: false,
                };
            }
        };
        debug!("initial conflict has {} group(s)", core.len());
        let mut i = 0;
        while i < core.len() {
            let without: Vec<usize> = core
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, g)| *g)
                .collect();
            match self.check(&without) {
                Check::Conflict(smaller) => core = smaller,
                Check::Consistent => i += 1,
                Check::Unknown => {
                    warn!(
                        "time budget exhausted while minimizing the conflict ({} group(s) left)",
                        core.len()
                    );
                    return ConflictCore {
                        groups: core,
                        minimal: false,
                    };
                }
            }
        }
        debug!(
            "minimal conflict has {} group(s) ({} solver call(s))",
            core.len(),
            self.n_calls
        );
        ConflictCore {
            groups: core,
            minimal: true,
        }
    }

    fn check(&mut self, groups: &[usize]) -> Check {
        if self.budget.is_exhausted() {
            return Check::Unknown;
        }
        self.n_calls += 1;
        let assumptions: Vec<Literal> = groups.iter().map(|g| self.selectors[*g]).collect();
        self.solver.set_time_limit(self.budget.remaining());
        match self.solver.solve_under_assumptions(&assumptions) {
            SolvingResult::Satisfiable(_) => Check::Consistent,
            SolvingResult::Unknown => Check::Unknown,
            SolvingResult::Unsatisfiable => {
                match self.solver.failed_assumptions(&assumptions) {
                    Some(failed) => {
                        let mut core: Vec<usize> = failed
                            .iter()
                            .filter_map(|l| self.groups_by_selector.get(l).copied())
                            .collect();
                        core.sort_unstable();
                        core.dedup();
                        Check::Conflict(core)
                    }
                    None => Check::Conflict(groups.to_vec()),
                }
            }
        }
    }
}

use crate::sat::{Literal, SatSolver};

/// A clause produced while encoding a model.
///
/// Clauses that assert a constraint carry the index of the constraint group they belong to.
/// Definitional clauses (which only name auxiliary variables) carry no group and are always asserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedClause {
    pub(crate) literals: Vec<Literal>,
    pub(crate) group: Option<usize>,
}

/// How a [CnfBuilder] loads its clauses into a SAT solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Every clause is asserted as is.
    Plain,
    /// Each assertion clause is extended by the negation of its group selector.
    ///
    /// Selector variables are allocated right after the variables of the builder,
    /// in group order.
    Guarded,
}

/// Collects the clauses of a model together with the constraint group they assert.
///
/// Variables are allocated on demand; variable `1` is reserved for the constant `true`.
#[derive(Debug)]
pub struct CnfBuilder {
    n_vars: usize,
    n_groups: usize,
    clauses: Vec<GuardedClause>,
    current_group: Option<usize>,
}

impl Default for CnfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CnfBuilder {
    /// Builds an empty builder.
    pub fn new() -> Self {
        let mut builder = Self {
            n_vars: 1,
            n_groups: 0,
            clauses: vec![],
            current_group: None,
        };
        builder.add_definition(vec![Literal::from(1)]);
        builder
    }

    /// Returns a literal that is always true.
    pub fn true_lit(&self) -> Literal {
        Literal::from(1)
    }

    /// Returns a literal that is always false.
    pub fn false_lit(&self) -> Literal {
        Literal::from(-1)
    }

    /// Allocates a new variable and returns its positive literal.
    pub fn new_lit(&mut self) -> Literal {
        self.n_vars += 1;
        Literal::from(self.n_vars as isize)
    }

    /// Allocates `n` new variables and returns their positive literals.
    pub fn new_lits(&mut self, n: usize) -> Vec<Literal> {
        (0..n).map(|_| self.new_lit()).collect()
    }

    /// Opens a new constraint group; the following assertions belong to it.
    ///
    /// Returns the index of the group.
    pub fn open_group(&mut self) -> usize {
        self.current_group = Some(self.n_groups);
        self.n_groups += 1;
        self.n_groups - 1
    }

    /// Closes the current constraint group.
    pub fn close_group(&mut self) {
        self.current_group = None;
    }

    /// Adds a clause asserting the current constraint group.
    ///
    /// Outside a group, the clause is always asserted.
    pub fn add_assertion(&mut self, cl: Vec<Literal>) {
        self.clauses.push(GuardedClause {
            literals: cl,
            group: self.current_group,
        })
    }

    /// Adds a definitional clause, asserted whatever the enabled groups.
    pub fn add_definition(&mut self, cl: Vec<Literal>) {
        self.clauses.push(GuardedClause {
            literals: cl,
            group: None,
        })
    }

    /// Returns a literal equivalent to the disjunction of the given literals.
    pub fn define_or(&mut self, lits: &[Literal]) -> Literal {
        match lits.len() {
            0 => self.false_lit(),
            1 => lits[0],
            _ => {
                let or = self.new_lit();
                let mut cl = Vec::with_capacity(lits.len() + 1);
                cl.push(or.negate());
                for l in lits {
                    self.add_definition(vec![l.negate(), or]);
                    cl.push(*l);
                }
                self.add_definition(cl);
                or
            }
        }
    }

    /// Returns a literal equivalent to the conjunction of the given literals.
    pub fn define_and(&mut self, lits: &[Literal]) -> Literal {
        match lits.len() {
            0 => self.true_lit(),
            1 => lits[0],
            _ => {
                let and = self.new_lit();
                let mut cl = Vec::with_capacity(lits.len() + 1);
                cl.push(and);
                for l in lits {
                    self.add_definition(vec![and.negate(), *l]);
                    cl.push(l.negate());
                }
                self.add_definition(cl);
                and
            }
        }
    }

    /// Returns the number of variables allocated so far.
    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    /// Returns the number of constraint groups opened so far.
    pub fn n_groups(&self) -> usize {
        self.n_groups
    }

    /// Returns the number of clauses collected so far.
    pub fn n_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Returns the selector literal of a group, as allocated by [LoadMode::Guarded].
    pub fn selector(&self, group: usize) -> Literal {
        Literal::from((self.n_vars + 1 + group) as isize)
    }

    /// Returns the selector literals of all groups, as allocated by [LoadMode::Guarded].
    pub fn selectors(&self) -> Vec<Literal> {
        (0..self.n_groups).map(|g| self.selector(g)).collect()
    }

    /// Loads the clauses into a SAT solver.
    pub fn load_into(&self, solver: &mut dyn SatSolver, mode: LoadMode) {
        match mode {
            LoadMode::Plain => {
                solver.reserve(self.n_vars);
                self.clauses
                    .iter()
                    .for_each(|c| solver.add_clause(c.literals.clone()));
            }
            LoadMode::Guarded => {
                solver.reserve(self.n_vars + self.n_groups);
                self.clauses.iter().for_each(|c| match c.group {
                    Some(g) => {
                        let mut cl = Vec::with_capacity(c.literals.len() + 1);
                        cl.push(self.selector(g).negate());
                        cl.extend_from_slice(&c.literals);
                        solver.add_clause(cl)
                    }
                    None => solver.add_clause(c.literals.clone()),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::{default_solver, SolvingResult};

    #[test]
    fn test_constants() {
        let builder = CnfBuilder::new();
        let mut solver = default_solver();
        builder.load_into(solver.as_mut(), LoadMode::Plain);
        let model = solver.solve().unwrap_model().unwrap();
        assert!(model.satisfies(builder.true_lit()));
        assert!(!model.satisfies(builder.false_lit()));
    }

    #[test]
    fn test_define_or_and() {
        let mut builder = CnfBuilder::new();
        let lits = builder.new_lits(2);
        let or = builder.define_or(&lits);
        let and = builder.define_and(&lits);
        builder.add_definition(vec![or]);
        builder.add_definition(vec![lits[0].negate()]);
        let mut solver = default_solver();
        builder.load_into(solver.as_mut(), LoadMode::Plain);
        let model = solver.solve().unwrap_model().unwrap();
        assert!(model.satisfies(lits[1]));
        assert!(!model.satisfies(and));
    }

    #[test]
    fn test_guarded_groups() {
        let mut builder = CnfBuilder::new();
        let x = builder.new_lit();
        let g0 = builder.open_group();
        builder.add_assertion(vec![x]);
        builder.close_group();
        let g1 = builder.open_group();
        builder.add_assertion(vec![x.negate()]);
        builder.close_group();
        assert_eq!(2, builder.n_groups());
        let mut solver = default_solver();
        builder.load_into(solver.as_mut(), LoadMode::Guarded);
        assert!(solver.solve().unwrap_model().is_some());
        let all = builder.selectors();
        assert_eq!(
            SolvingResult::Unsatisfiable,
            solver.solve_under_assumptions(&all)
        );
        assert!(solver
            .solve_under_assumptions(&[builder.selector(g0)])
            .unwrap_model()
            .is_some());
        assert!(solver
            .solve_under_assumptions(&[builder.selector(g1)])
            .unwrap_model()
            .is_some());
    }

    #[test]
    fn test_empty_assertion_in_group_only_disables_group() {
        let mut builder = CnfBuilder::new();
        let g = builder.open_group();
        builder.add_assertion(vec![]);
        builder.close_group();
        let mut solver = default_solver();
        builder.load_into(solver.as_mut(), LoadMode::Guarded);
        assert!(solver.solve().unwrap_model().is_some());
        assert_eq!(
            SolvingResult::Unsatisfiable,
            solver.solve_under_assumptions(&[builder.selector(g)])
        );
    }
}

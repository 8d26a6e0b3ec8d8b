use super::{cadical_solver::CadicalSolver, external_sat_solver::ExternalSatSolver};
use std::{
    fmt::Display,
    num::{NonZeroIsize, NonZeroUsize},
    time::Duration,
};

/// A variable in a SAT solver.
///
/// A variable is represented by a non-null positive integer.
/// It can be obtained through the [From] trait from an integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(NonZeroUsize);

macro_rules! impl_var_from {
    ($t: ty) => {
        impl From<$t> for Variable {
            fn from(v: $t) -> Self {
                Self(NonZeroUsize::try_from(v as usize).unwrap())
            }
        }
    };
}
impl_var_from!(usize);
impl_var_from!(u64);
impl_var_from!(u32);

macro_rules! impl_var_from_neg {
    ($t: ty) => {
        impl From<$t> for Variable {
            fn from(v: $t) -> Self {
                if v < 0 {
                    panic!("cannot build a variable from a negative integer")
                }
                Self(NonZeroUsize::try_from(v as usize).unwrap())
            }
        }
    };
}
impl_var_from_neg!(isize);
impl_var_from_neg!(i64);
impl_var_from_neg!(i32);

impl From<Variable> for usize {
    fn from(v: Variable) -> Self {
        v.0.into()
    }
}

/// A literal in a SAT solver.
///
/// A literal is represented by a non-null integer.
/// It can be obtained through the [From] trait from a signed integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal(NonZeroIsize);

impl Literal {
    /// Returns the opposite literal.
    pub fn negate(self) -> Self {
        Self::from(-self.0.get())
    }

    /// Returns the variable of this literal.
    pub fn var(&self) -> Variable {
        Variable(self.0.unsigned_abs())
    }

    /// Returns `true` iff this literal is the positive one of its variable.
    pub fn is_positive(&self) -> bool {
        self.0.get() > 0
    }
}

macro_rules! impl_lit_from {
    ($t: ty) => {
        impl From<$t> for Literal {
            fn from(l: $t) -> Self {
                Self(NonZeroIsize::try_from(l as isize).unwrap())
            }
        }
    };
}
impl_lit_from!(isize);
impl_lit_from!(i64);
impl_lit_from!(i32);

impl From<Variable> for Literal {
    fn from(v: Variable) -> Self {
        Self::from(usize::from(v) as isize)
    }
}

impl From<Literal> for isize {
    fn from(l: Literal) -> Self {
        l.0.into()
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builds a clause from a list of integers.
#[macro_export]
macro_rules! clause {
    () => (
        vec![] as Vec<$crate::sat::Literal>
    );
    ($($x:expr),+ $(,)?) => (
        [$($x),+].into_iter().map($crate::sat::Literal::from).collect::<Vec<$crate::sat::Literal>>()
    );
}

/// An assignment of a set of variables.
///
/// Inside the set of variables involved in the assignment, some may be unassigned.
/// This is the reason why accessors to assigned value returns an [Option<bool>].
#[derive(Debug, PartialEq, Eq)]
pub struct Assignment(Vec<Option<bool>>);

impl Assignment {
    pub(crate) fn new(assignment: Vec<Option<bool>>) -> Self {
        Self(assignment)
    }

    /// Returns the value potentially assigned to the variable.
    ///
    /// The result in an [Option].
    /// In case the variable is not assigned (or unknown to the solver), [Option::None] is returned.
    /// Else, [Option::Some] is returned and contains the assigned value.
    pub fn value_of<T>(&self, v: T) -> Option<bool>
    where
        T: Into<Variable>,
    {
        self.0
            .get(usize::from(v.into()) - 1)
            .copied()
            .flatten()
    }

    /// Returns `true` iff the literal is set to true by this assignment.
    ///
    /// Unassigned variables are considered false.
    pub fn satisfies(&self, l: Literal) -> bool {
        match self.value_of(l.var()) {
            Some(b) => b == l.is_positive(),
            None => false,
        }
    }

    /// Returns the number of variables covered by this assignment.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` iff this assignment covers no variable.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The result of a call to a SAT solver.
#[derive(Debug, PartialEq, Eq)]
pub enum SolvingResult {
    /// The problem is satisfiable; a model is given.
    Satisfiable(Assignment),
    /// The problem is unsatisfiable.
    Unsatisfiable,
    /// The solver stopped before reaching a conclusion.
    Unknown,
}

impl SolvingResult {
    /// Returns the underlying model if it exists, or [Option::None].
    ///
    /// # Panics
    ///
    /// If the solving result is set [SolvingResult::Unknown], this function panics.
    pub fn unwrap_model(self) -> Option<Assignment> {
        match self {
            SolvingResult::Satisfiable(assignment) => Some(assignment),
            SolvingResult::Unsatisfiable => None,
            SolvingResult::Unknown => {
                panic!(r#"cannot unwrap solving result when the solver returned "Unknown""#)
            }
        }
    }
}

/// A trait for objects listening to SAT solver calls.
pub trait SolvingListener {
    /// Called when a solving process starts.
    fn solving_start(&self, n_vars: usize, n_clauses: usize);

    /// Called when a solving process ends.
    fn solving_end(&self, result: &SolvingResult);
}

/// A trait for SAT solvers.
pub trait SatSolver {
    /// Adds a clause to this solver.
    fn add_clause(&mut self, cl: Vec<Literal>);

    /// Solves the problem formed by the clauses added so far.
    fn solve(&mut self) -> SolvingResult;

    /// Solves the problem formed by the clauses added so far and the provided assumptions.
    fn solve_under_assumptions(&mut self, assumptions: &[Literal]) -> SolvingResult;

    /// Returns the assumptions involved in the last unsatisfiability proof.
    ///
    /// This function must be called right after a call to [solve_under_assumptions](Self::solve_under_assumptions) that returned [SolvingResult::Unsatisfiable],
    /// with the same assumptions.
    /// Solvers that are not able to report them return [Option::None].
    fn failed_assumptions(&self, _assumptions: &[Literal]) -> Option<Vec<Literal>> {
        None
    }

    /// Sets the time limit applying to the next solving calls.
    ///
    /// When the limit is reached, the solver returns [SolvingResult::Unknown].
    fn set_time_limit(&mut self, limit: Option<Duration>);

    /// Returns the highest variable index known by this solver.
    fn n_vars(&self) -> usize;

    /// Adds a listener to this solver.
    fn add_listener(&mut self, listener: Box<dyn SolvingListener>);

    /// Informs the solver that variables up to `new_max_id` are in use.
    fn reserve(&mut self, new_max_id: usize);
}

/// A factory for SAT solvers.
///
/// Each solving process asks a new solver to the factory, so that no state is shared between two solving processes.
pub trait SatSolverFactory {
    /// Builds a new SAT solver.
    fn new_solver(&self) -> Box<dyn SatSolver>;

    /// Returns a short name for the solvers built by this factory.
    fn name(&self) -> String;
}

/// The type of functions building solving listeners.
pub type SolvingListenerFactoryFn = dyn Fn() -> Box<dyn SolvingListener>;

/// A factory building instances of the default SAT solver (CaDiCaL).
#[derive(Default)]
pub struct DefaultSatSolverFactory {
    listener_factories: Vec<Box<SolvingListenerFactoryFn>>,
}

impl DefaultSatSolverFactory {
    /// Registers a listener that will be added to each new solver.
    pub fn add_solver_listener(&mut self, listener_factory: Box<SolvingListenerFactoryFn>) {
        self.listener_factories.push(listener_factory);
    }
}

impl SatSolverFactory for DefaultSatSolverFactory {
    fn new_solver(&self) -> Box<dyn SatSolver> {
        let mut solver = default_solver();
        self.listener_factories
            .iter()
            .for_each(|f| solver.add_listener(f()));
        solver
    }

    fn name(&self) -> String {
        "cadical".to_string()
    }
}

/// A factory building SAT solvers executed by a system command.
///
/// See [ExternalSatSolver] for the requirements on the command.
pub struct ExternalSatSolverFactory {
    program: String,
    options: Vec<String>,
    listener_factories: Vec<Box<SolvingListenerFactoryFn>>,
}

impl ExternalSatSolverFactory {
    /// Builds a factory for the given program and CLI options.
    pub fn new(program: String, options: Vec<String>) -> Self {
        Self {
            program,
            options,
            listener_factories: vec![],
        }
    }

    /// Registers a listener that will be added to each new solver.
    pub fn add_solver_listener(&mut self, listener_factory: Box<SolvingListenerFactoryFn>) {
        self.listener_factories.push(listener_factory);
    }
}

impl SatSolverFactory for ExternalSatSolverFactory {
    fn new_solver(&self) -> Box<dyn SatSolver> {
        let mut solver: Box<dyn SatSolver> = Box::new(ExternalSatSolver::new(
            self.program.clone(),
            self.options.clone(),
        ));
        self.listener_factories
            .iter()
            .for_each(|f| solver.add_listener(f()));
        solver
    }

    fn name(&self) -> String {
        format!("external ({})", self.program)
    }
}

/// The default SAT solver (CaDiCaL).
pub fn default_solver() -> Box<dyn SatSolver> {
    Box::<CadicalSolver>::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_from_pos() {
        let v = Variable::from(1);
        assert_eq!(1, usize::from(v))
    }

    #[test]
    #[allow(unused_must_use)]
    #[should_panic]
    fn test_var_from_null() {
        Variable::from(0);
    }

    #[test]
    #[allow(unused_must_use)]
    #[should_panic]
    fn test_var_from_neg() {
        Variable::from(-1);
    }

    #[test]
    fn test_lit_from_neg() {
        let l = Literal::from(-1);
        assert_eq!(-1, isize::from(l));
        assert!(!l.is_positive());
        assert_eq!(Variable::from(1), l.var());
    }

    #[test]
    fn test_negate_lit() {
        assert_eq!(Literal::from(-1), Literal::from(1).negate());
        assert_eq!(Literal::from(1), Literal::from(-1).negate());
    }

    #[test]
    fn test_assignment_satisfies() {
        let assignment = Assignment::new(vec![Some(true), Some(false), None]);
        assert!(assignment.satisfies(Literal::from(1)));
        assert!(!assignment.satisfies(Literal::from(-1)));
        assert!(assignment.satisfies(Literal::from(-2)));
        assert!(!assignment.satisfies(Literal::from(3)));
        assert!(!assignment.satisfies(Literal::from(-3)));
        assert!(!assignment.satisfies(Literal::from(8)));
    }

    #[test]
    fn test_solving_result_unwrap_model_none() {
        assert_eq!(None, SolvingResult::Unsatisfiable.unwrap_model());
    }

    #[test]
    #[should_panic]
    fn test_solving_result_unwrap_model_unknown() {
        SolvingResult::Unknown.unwrap_model();
    }

    #[test]
    fn test_default_factory_builds_independent_solvers() {
        let factory = DefaultSatSolverFactory::default();
        let mut s1 = factory.new_solver();
        let mut s2 = factory.new_solver();
        s1.add_clause(clause![1]);
        s1.add_clause(clause![-1]);
        s2.add_clause(clause![1]);
        assert!(s1.solve().unwrap_model().is_none());
        assert!(s2.solve().unwrap_model().is_some());
        assert_eq!("cadical", factory.name());
    }
}

use super::{
    sat_solver::{SolvingListener, SolvingResult},
    Assignment, Literal, SatSolver,
};
use log::error;
use std::{
    io::{BufRead, BufReader, Chain, Cursor, Read},
    time::Duration,
};
use thiserror::Error;

/// The type of functions executing a solver on a DIMACS instance.
///
/// The second parameter is the time limit the solving function should respect.
pub type SolvingFn = dyn Fn(DimacsInstanceRead, Option<Duration>) -> Box<dyn Read>;

/// A reader over a DIMACS instance built by a [BufferedSatSolver].
///
/// Assumptions are written as unit clauses after the regular ones.
pub struct DimacsInstanceRead(Chain<Chain<Cursor<String>, Cursor<String>>, Cursor<String>>);

impl DimacsInstanceRead {
    fn new(n_vars: usize, n_clauses: usize, clauses: String, assumptions: &[Literal]) -> Self {
        let header = format!("p cnf {} {}\n", n_vars, n_clauses + assumptions.len());
        let units: String = assumptions.iter().map(|a| format!("{} 0\n", a)).collect();
        Self(
            Cursor::new(header)
                .chain(Cursor::new(clauses))
                .chain(Cursor::new(units)),
        )
    }
}

impl Read for DimacsInstanceRead {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

/// An error in the output of a DIMACS solver.
#[derive(Debug, Error)]
enum SolverOutputError {
    #[error("multiple status lines")]
    MultipleStatusLines,
    #[error(r#""{0}" is not a literal"#)]
    NotALiteral(String),
    #[error("variable {0} of the value line is out of bounds")]
    VariableOutOfBounds(usize),
    #[error("multiple zeroes on value lines")]
    MultipleZeroes,
    #[error(r#"unexpected line "{0}""#)]
    UnexpectedLine(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn is_comment(line: &str) -> bool {
    line.is_empty() || line == "c" || line.starts_with("c ")
}

/// Reads the `s` and `v` lines of a SAT competition output.
///
/// A satisfiable status without value lines is reported as [SolvingResult::Unknown].
fn parse_solver_output(
    output: Box<dyn Read>,
    n_vars: usize,
) -> Result<SolvingResult, SolverOutputError> {
    let mut satisfiable = None;
    let mut values = vec![None; n_vars];
    let mut has_values = false;
    let mut terminated = false;
    for line in BufReader::new(output).lines() {
        let line = line?;
        if let Some(status) = line.strip_prefix("s ") {
            let sat = match status {
                "SATISFIABLE" => true,
                "UNSATISFIABLE" => false,
                "UNKNOWN" => continue,
                _ => return Err(SolverOutputError::UnexpectedLine(line)),
            };
            if satisfiable.replace(sat).is_some() {
                return Err(SolverOutputError::MultipleStatusLines);
            }
        } else if line == "v" || line.starts_with("v ") {
            has_values = true;
            for word in line.split_ascii_whitespace().skip(1) {
                let lit = word
                    .parse::<isize>()
                    .map_err(|_| SolverOutputError::NotALiteral(word.to_string()))?;
                if lit == 0 {
                    if terminated {
                        return Err(SolverOutputError::MultipleZeroes);
                    }
                    terminated = true;
                    continue;
                }
                let var = lit.unsigned_abs();
                if var > n_vars {
                    return Err(SolverOutputError::VariableOutOfBounds(var));
                }
                values[var - 1] = Some(lit > 0);
            }
        } else if !is_comment(&line) {
            return Err(SolverOutputError::UnexpectedLine(line));
        }
    }
    Ok(match satisfiable {
        Some(true) if has_values => SolvingResult::Satisfiable(Assignment::new(values)),
        Some(false) => SolvingResult::Unsatisfiable,
        _ => SolvingResult::Unknown,
    })
}

/// A SAT solver that stores its clauses as DIMACS text and delegates the solving to a function.
///
/// Such solvers are not able to report failed assumptions.
pub struct BufferedSatSolver {
    n_vars: usize,
    n_clauses: usize,
    clauses: String,
    solving_fn: Box<SolvingFn>,
    time_limit: Option<Duration>,
    listeners: Vec<Box<dyn SolvingListener>>,
}

impl BufferedSatSolver {
    /// Builds a solver delegating each call to the given function.
    pub fn new(solving_fn: Box<SolvingFn>) -> Self {
        Self {
            n_vars: 0,
            n_clauses: 0,
            clauses: String::new(),
            solving_fn,
            time_limit: None,
            listeners: Vec::new(),
        }
    }
}

impl SatSolver for BufferedSatSolver {
    fn add_clause(&mut self, cl: Vec<Literal>) {
        for l in cl {
            self.n_vars = usize::max(self.n_vars, usize::from(l.var()));
            self.clauses.push_str(&l.to_string());
            self.clauses.push(' ');
        }
        self.clauses.push_str("0\n");
        self.n_clauses += 1;
    }

    fn solve(&mut self) -> SolvingResult {
        self.solve_under_assumptions(&[])
    }

    fn solve_under_assumptions(&mut self, assumptions: &[Literal]) -> SolvingResult {
        self.listeners
            .iter()
            .for_each(|l| l.solving_start(self.n_vars, self.n_clauses));
        let instance =
            DimacsInstanceRead::new(self.n_vars, self.n_clauses, self.clauses.clone(), assumptions);
        let output = (self.solving_fn)(instance, self.time_limit);
        let result = parse_solver_output(output, self.n_vars).unwrap_or_else(|e| {
            error!("invalid output of the SAT solver: {}", e);
            SolvingResult::Unknown
        });
        self.listeners.iter().for_each(|l| l.solving_end(&result));
        result
    }

    fn set_time_limit(&mut self, limit: Option<Duration>) {
        self.time_limit = limit;
    }

    fn n_vars(&self) -> usize {
        self.n_vars
    }

    fn add_listener(&mut self, listener: Box<dyn SolvingListener>) {
        self.listeners.push(listener);
    }

    fn reserve(&mut self, new_max_id: usize) {
        self.n_vars = usize::max(self.n_vars, new_max_id);
    }
}

use super::{
    buffered_sat_solver::{BufferedSatSolver, DimacsInstanceRead},
    sat_solver::{SolvingListener, SolvingResult},
    Literal, SatSolver,
};
use log::{error, warn};
use std::{
    io::{Cursor, Read, Write},
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A SAT solver which execution is made by a system command.
///
/// The system command is composed by an executable program, and a potential list of CLI arguments.
///
/// The SAT solver must read from the standard input (if it does not by default, this may be possible with the right CLI arguments).
/// The input and output formats must follow the ones from the SAT competitions.
/// When a time limit is set, the process is killed once it is reached and the result is [SolvingResult::Unknown].
pub struct ExternalSatSolver {
    buffered_sat_solver: BufferedSatSolver,
}

impl ExternalSatSolver {
    /// Builds a new external SAT solver.
    ///
    /// The `program` argument is the path from a directory in execution path to the software to execute.
    /// The `options` parameter is the CLI options to provide to the software under execution.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use tabula::sat::{ExternalSatSolver, Literal, SatSolver};
    /// let mut solver = ExternalSatSolver::new(
    ///     "/home/me/my_solver".to_string(),
    ///     vec!["-i".to_string(), "/dev/stdin".to_string()],
    /// );
    /// solver.add_clause(vec![Literal::from(-1), Literal::from(-2)]);
    /// solver.add_clause(vec![Literal::from(-1), Literal::from(2)]);
    /// let model = solver.solve().unwrap_model().unwrap();
    /// assert_eq!(Some(false), model.value_of(1));
    /// ```
    pub fn new(program: String, options: Vec<String>) -> Self {
        Self {
            buffered_sat_solver: BufferedSatSolver::new(Box::new(move |r, limit| {
                exec_solver(r, &program, &options, limit)
            })),
        }
    }
}

impl SatSolver for ExternalSatSolver {
    fn add_clause(&mut self, cl: Vec<Literal>) {
        self.buffered_sat_solver.add_clause(cl)
    }

    fn solve(&mut self) -> SolvingResult {
        self.buffered_sat_solver.solve()
    }

    fn solve_under_assumptions(&mut self, assumptions: &[Literal]) -> SolvingResult {
        self.buffered_sat_solver
            .solve_under_assumptions(assumptions)
    }

    fn set_time_limit(&mut self, limit: Option<Duration>) {
        self.buffered_sat_solver.set_time_limit(limit)
    }

    fn n_vars(&self) -> usize {
        self.buffered_sat_solver.n_vars()
    }

    fn add_listener(&mut self, listener: Box<dyn SolvingListener>) {
        self.buffered_sat_solver.add_listener(listener);
    }

    fn reserve(&mut self, new_max_id: usize) {
        self.buffered_sat_solver.reserve(new_max_id)
    }
}

fn exec_solver(
    mut reader: DimacsInstanceRead,
    program: &str,
    options: &[String],
    limit: Option<Duration>,
) -> Box<dyn Read> {
    let empty = || -> Box<dyn Read> { Box::new(Cursor::new(Vec::new())) };
    let deadline = limit.map(|l| Instant::now() + l);
    let mut child = match Command::new(program)
        .args(options)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
    {
        Ok(c) => c,
        Err(e) => {
            error!(r#"failed to spawn SAT solver "{}": {}"#, program, e);
            return empty();
        }
    };
    if let Some(mut stdin) = child.stdin.take() {
        thread::spawn(move || {
            let mut buffer = String::new();
            if reader.read_to_string(&mut buffer).is_ok() {
                let _ = stdin.write_all(buffer.as_bytes());
            }
            let _ = stdin.flush();
        });
    }
    let stdout_reader = child.stdout.take().map(|mut stdout| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = stdout.read_to_end(&mut buffer);
            buffer
        })
    });
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => {
                if matches!(deadline, Some(d) if Instant::now() >= d) {
                    warn!(r#"time limit reached; killing SAT solver "{}""#, program);
                    let _ = child.kill();
                    let _ = child.wait();
                    return empty();
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                error!(r#"failed to wait on SAT solver "{}": {}"#, program, e);
                return empty();
            }
        }
    }
    match stdout_reader.map(|h| h.join()) {
        Some(Ok(buffer)) => Box::new(Cursor::new(buffer)),
        _ => empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause;

    fn get_echo_command(content: &str) -> Option<(String, Vec<String>)> {
        if cfg!(target_family = "unix") {
            Some(("echo".to_string(), vec![content.to_string()]))
        } else {
            None
        }
    }

    #[test]
    fn test_solve_output() {
        let (program, options) = match get_echo_command("s SATISFIABLE\nv 1 2 0\n") {
            Some(cmd) => cmd,
            None => return,
        };
        let mut s = ExternalSatSolver::new(program, options);
        s.add_clause(clause![1, 2]);
        let model = s.solve().unwrap_model().unwrap();
        assert!(model.value_of(1).unwrap());
        assert!(model.value_of(2).unwrap());
        assert_eq!(2, s.n_vars());
    }

    #[test]
    fn test_solve_under_assumptions_output() {
        let (program, options) = match get_echo_command("s UNSATISFIABLE\n") {
            Some(cmd) => cmd,
            None => return,
        };
        let mut s = ExternalSatSolver::new(program, options);
        s.add_clause(clause![1, 2]);
        let model = s
            .solve_under_assumptions(&[Literal::from(-1), Literal::from(-2)])
            .unwrap_model();
        assert!(model.is_none());
        assert_eq!(2, s.n_vars());
    }

    #[test]
    fn test_missing_program_is_unknown() {
        let mut s = ExternalSatSolver::new("/nonexistent/tabula-sat".to_string(), vec![]);
        s.add_clause(clause![1, 2]);
        assert_eq!(SolvingResult::Unknown, s.solve());
    }

    #[test]
    fn test_time_limit_kills_solver() {
        if !cfg!(target_family = "unix") {
            return;
        }
        let mut s = ExternalSatSolver::new("sleep".to_string(), vec!["5".to_string()]);
        s.add_clause(clause![1]);
        s.set_time_limit(Some(Duration::from_millis(50)));
        let start = Instant::now();
        assert_eq!(SolvingResult::Unknown, s.solve());
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}

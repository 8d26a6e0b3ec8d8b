use std::time::{Duration, Instant};

/// A wall-clock budget shared by the successive solver calls of a solving process.
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    deadline: Option<Instant>,
}

impl TimeBudget {
    /// Starts a budget of the given duration.
    ///
    /// A duration too large to be represented is considered unbounded.
    pub fn new(limit: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(limit),
        }
    }

    /// Starts an unbounded budget.
    pub fn unbounded() -> Self {
        Self { deadline: None }
    }

    /// Returns the remaining time, or [Option::None] if the budget is unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Returns `true` iff no time remains.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.remaining(), Some(r) if r.is_zero())
    }
}

//! Cardinality constraints based on sequential counters.

use super::CnfBuilder;
use crate::sat::Literal;

const PAIRWISE_AT_MOST_ONE_LIMIT: usize = 6;

/// A sequential counter over a set of literals.
///
/// The counter exposes unary outputs: the `j`-th output is true iff at least `j` input literals are true,
/// for `j` between `1` and the counter capacity.
/// Both directions of the equivalence are encoded, so the outputs can be used in objective functions.
#[derive(Debug, Clone)]
pub struct Counter {
    outputs: Vec<Literal>,
    n_inputs: usize,
}

impl Counter {
    /// Encodes a counter over `lits`, counting up to `cap`.
    ///
    /// All the clauses are definitional.
    pub fn new(builder: &mut CnfBuilder, lits: &[Literal], cap: usize) -> Self {
        let cap = usize::min(cap, lits.len());
        let mut prev: Vec<Literal> = vec![];
        for (i, x) in lits.iter().enumerate() {
            let len = usize::min(i + 1, cap);
            let cur = (1..=len)
                .map(|j| {
                    let a = prev.get(j - 1).copied();
                    let b = if j == 1 { None } else { Some(prev[j - 2]) };
                    define_step(builder, a, *x, b)
                })
                .collect();
            prev = cur;
        }
        Self {
            outputs: prev,
            n_inputs: lits.len(),
        }
    }

    /// Returns a literal which is true iff at least `j` inputs are true.
    ///
    /// Returns [Option::None] if `j` exceeds the capacity of the counter.
    pub fn at_least(&self, builder: &CnfBuilder, j: usize) -> Option<Literal> {
        if j == 0 {
            Some(builder.true_lit())
        } else if j > self.n_inputs {
            Some(builder.false_lit())
        } else {
            self.outputs.get(j - 1).copied()
        }
    }

    /// Returns the number of outputs of this counter.
    pub fn capacity(&self) -> usize {
        self.outputs.len()
    }
}

// s <=> a | (x & b), where a = None stands for false and b = None for true
fn define_step(
    builder: &mut CnfBuilder,
    a: Option<Literal>,
    x: Literal,
    b: Option<Literal>,
) -> Literal {
    match (a, b) {
        (None, None) => x,
        (None, Some(b)) => builder.define_and(&[x, b]),
        (Some(a), None) => builder.define_or(&[a, x]),
        (Some(a), Some(b)) => {
            let s = builder.new_lit();
            builder.add_definition(vec![a.negate(), s]);
            builder.add_definition(vec![x.negate(), b.negate(), s]);
            builder.add_definition(vec![s.negate(), a, x]);
            builder.add_definition(vec![s.negate(), a, b]);
            s
        }
    }
}

/// Asserts that at most one of the literals is true.
pub fn encode_at_most_one(builder: &mut CnfBuilder, lits: &[Literal]) {
    if lits.len() <= 1 {
        return;
    }
    if lits.len() <= PAIRWISE_AT_MOST_ONE_LIMIT {
        for (i, l1) in lits.iter().enumerate() {
            for l2 in lits.iter().skip(i + 1) {
                builder.add_assertion(vec![l1.negate(), l2.negate()]);
            }
        }
    } else {
        let counter = Counter::new(builder, lits, 2);
        let two = counter.outputs[1];
        builder.add_assertion(vec![two.negate()]);
    }
}

/// Asserts that at least one of the literals is true.
pub fn encode_at_least_one(builder: &mut CnfBuilder, lits: &[Literal]) {
    builder.add_assertion(lits.to_vec());
}

/// Asserts that the number of true literals lies in `[min, max]`.
///
/// A missing upper bound means no upper bound.
pub fn encode_bounds(builder: &mut CnfBuilder, lits: &[Literal], min: usize, max: Option<usize>) {
    let n = lits.len();
    let max = max.filter(|m| *m < n);
    if min > n || matches!(max, Some(m) if m < min) {
        builder.add_assertion(vec![]);
        return;
    }
    match max {
        Some(0) => lits
            .iter()
            .for_each(|l| builder.add_assertion(vec![l.negate()])),
        Some(1) => encode_at_most_one(builder, lits),
        _ => {}
    }
    if min == 1 {
        encode_at_least_one(builder, lits);
    }
    let counter_max = max.filter(|m| *m >= 2);
    let counter_min = Some(min).filter(|m| *m >= 2);
    if counter_max.is_none() && counter_min.is_none() {
        return;
    }
    let cap = usize::max(counter_max.map(|m| m + 1).unwrap_or(0), min);
    let counter = Counter::new(builder, lits, cap);
    if let Some(m) = counter_max {
        let over = counter.outputs[m];
        builder.add_assertion(vec![over.negate()]);
    }
    if let Some(m) = counter_min {
        let reached = counter.outputs[m - 1];
        builder.add_assertion(vec![reached]);
    }
}

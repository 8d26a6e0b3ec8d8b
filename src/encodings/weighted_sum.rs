//! Pseudo-boolean sums encoded by adder networks.

use super::CnfBuilder;
use crate::sat::{Assignment, Literal};
use std::collections::VecDeque;

/// A sum of positively weighted literals, encoded as a binary number.
///
/// The bits of the sum are computed by a network of full and half adders.
/// Both directions of each adder are encoded, so that lower bounds on the sum can be asserted.
#[derive(Debug, Clone)]
pub struct WeightedSum {
    terms: Vec<(u64, Literal)>,
    bits: Vec<Literal>,
}

impl WeightedSum {
    /// Encodes the sum of the given terms.
    ///
    /// Terms with a null weight are ignored.
    pub fn new(builder: &mut CnfBuilder, terms: Vec<(u64, Literal)>) -> Self {
        let terms: Vec<(u64, Literal)> = terms.into_iter().filter(|(w, _)| *w > 0).collect();
        let mut columns: Vec<VecDeque<Literal>> = vec![];
        for (w, l) in terms.iter() {
            let mut bit = 0;
            let mut w = *w;
            while w > 0 {
                if w & 1 == 1 {
                    if columns.len() <= bit {
                        columns.resize(bit + 1, VecDeque::new());
                    }
                    columns[bit].push_back(*l);
                }
                w >>= 1;
                bit += 1;
            }
        }
        let mut bits = Vec::with_capacity(columns.len() + 1);
        let mut i = 0;
        while i < columns.len() {
            while columns[i].len() > 1 {
                let (sum, carry) = if columns[i].len() >= 3 {
                    let a = columns[i].pop_front().unwrap_or_else(|| builder.false_lit());
                    let b = columns[i].pop_front().unwrap_or_else(|| builder.false_lit());
                    let c = columns[i].pop_front().unwrap_or_else(|| builder.false_lit());
                    full_adder(builder, a, b, c)
                } else {
                    let a = columns[i].pop_front().unwrap_or_else(|| builder.false_lit());
                    let b = columns[i].pop_front().unwrap_or_else(|| builder.false_lit());
                    half_adder(builder, a, b)
                };
                columns[i].push_back(sum);
                if columns.len() <= i + 1 {
                    columns.push(VecDeque::new());
                }
                columns[i + 1].push_back(carry);
            }
            bits.push(
                columns[i]
                    .pop_front()
                    .unwrap_or_else(|| builder.false_lit()),
            );
            i += 1;
        }
        Self { terms, bits }
    }

    /// Returns the bits of the sum, least significant first.
    pub fn bits(&self) -> &[Literal] {
        &self.bits
    }

    /// Returns the greatest value the sum can reach.
    pub fn upper_bound(&self) -> u64 {
        self.terms.iter().map(|(w, _)| *w).sum()
    }

    /// Computes the value of the sum under a model.
    pub fn evaluate(&self, model: &Assignment) -> u64 {
        self.terms
            .iter()
            .filter(|(_, l)| model.satisfies(*l))
            .map(|(w, _)| *w)
            .sum()
    }

    /// Returns the clauses asserting that the sum is at least `k`.
    ///
    /// For each bit `i` set in `k`, either bit `i` of the sum is set,
    /// or a more significant bit is set in the sum but not in `k`.
    /// An empty clause is returned if `k` cannot be reached.
    pub fn at_least_clauses(&self, k: u64) -> Vec<Vec<Literal>> {
        if k > self.upper_bound() {
            return vec![vec![]];
        }
        let width = 64 - k.leading_zeros() as usize;
        if width > self.bits.len() {
            return vec![vec![]];
        }
        (0..width)
            .filter(|i| (k >> i) & 1 == 1)
            .map(|i| {
                std::iter::once(self.bits[i])
                    .chain(
                        (i + 1..self.bits.len())
                            .filter(|j| *j >= 64 || (k >> j) & 1 == 0)
                            .map(|j| self.bits[j]),
                    )
                    .collect()
            })
            .collect()
    }
}

fn half_adder(builder: &mut CnfBuilder, a: Literal, b: Literal) -> (Literal, Literal) {
    let sum = builder.new_lit();
    builder.add_definition(vec![sum.negate(), a, b]);
    builder.add_definition(vec![sum.negate(), a.negate(), b.negate()]);
    builder.add_definition(vec![sum, a.negate(), b]);
    builder.add_definition(vec![sum, a, b.negate()]);
    let carry = builder.define_and(&[a, b]);
    (sum, carry)
}

fn full_adder(builder: &mut CnfBuilder, a: Literal, b: Literal, c: Literal) -> (Literal, Literal) {
    let sum = builder.new_lit();
    for signs in 0..8u8 {
        let lits = [a, b, c];
        let n_true = (0..3).filter(|i| (signs >> i) & 1 == 1).count();
        let cl: Vec<Literal> = lits
            .iter()
            .enumerate()
            .map(|(i, l)| if (signs >> i) & 1 == 1 { l.negate() } else { *l })
            .chain(std::iter::once(if n_true % 2 == 1 {
                sum
            } else {
                sum.negate()
            }))
            .collect();
        builder.add_definition(cl);
    }
    let carry = builder.new_lit();
    for (x, y) in [(a, b), (a, c), (b, c)] {
        builder.add_definition(vec![x.negate(), y.negate(), carry]);
        builder.add_definition(vec![x, y, carry.negate()]);
    }
    (sum, carry)
}

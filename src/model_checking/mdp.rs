use std::collections::{BTreeSet, VecDeque};

use serde::Deserialize;

use super::error::ModelError;

/// Tolerance for checking that a distribution sums to one.
pub const PROB_SUM_TOLERANCE: f64 = 1e-9;

/// A single entry of a successor distribution: target state `s` with
/// probability `p`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TransitionPair {
    pub s: usize,
    pub p: f64,
}

/// Capability set of an MDP as consumed by the quotient construction.
///
/// States are dense indices `0..num_states()`, choices are dense per-state
/// indices `0..num_choices(s)`. A state with zero choices is a trap.
/// Implementations share the state index space with any model they view,
/// so targets returned by `successors` never need remapping.
pub trait MDP {
    fn num_states(&self) -> usize;

    fn num_choices(&self, s: usize) -> usize;

    /// The successor distribution of choice `c` of state `s`.
    /// Probabilities are in (0, 1] and sum to one.
    fn successors(&self, s: usize, c: usize) -> &[TransitionPair];

    /// True iff every successor of `(s, c)` satisfies the predicate.
    fn all_successors_match<F: Fn(usize) -> bool>(&self, s: usize, c: usize, pred: F) -> bool {
        self.successors(s, c).iter().all(|t| pred(t.s))
    }

    /// True iff some successor of `(s, c)` lies in `set`.
    fn some_successor_in_set(&self, s: usize, c: usize, set: &BTreeSet<usize>) -> bool {
        self.successors(s, c).iter().any(|t| set.contains(&t.s))
    }

    /// States to consider when no explicit restriction is supplied.
    fn reachable_states(&self) -> BTreeSet<usize> {
        (0..self.num_states()).collect()
    }
}

#[derive(Debug, Clone)]
struct ChoiceRow {
    a: String,
    s_prime: Vec<TransitionPair>,
}

/// Explicit sparse MDP: one choice row per nondeterministic action,
/// stored per state in insertion order.
#[derive(Debug, Clone)]
pub struct SparseMDP {
    initial: usize,
    rows: Vec<Vec<ChoiceRow>>,
}

impl SparseMDP {
    pub fn new(num_states: usize, initial: usize) -> SparseMDP {
        SparseMDP {
            initial,
            rows: vec![Vec::new(); num_states],
        }
    }

    /// Append a choice to state `s`, returning its choice index.
    pub fn add_choice(&mut self, s: usize, a: &str, s_prime: Vec<TransitionPair>) -> usize {
        self.rows[s].push(ChoiceRow {
            a: a.to_string(),
            s_prime,
        });
        self.rows[s].len() - 1
    }

    pub fn initial(&self) -> usize {
        self.initial
    }

    /// Action label of choice `c` of state `s`.
    pub fn action(&self, s: usize, c: usize) -> &str {
        &self.rows[s][c].a
    }
}

impl MDP for SparseMDP {
    fn num_states(&self) -> usize {
        self.rows.len()
    }

    fn num_choices(&self, s: usize) -> usize {
        self.rows[s].len()
    }

    fn successors(&self, s: usize, c: usize) -> &[TransitionPair] {
        &self.rows[s][c].s_prime
    }

    fn reachable_states(&self) -> BTreeSet<usize> {
        let mut reachable: BTreeSet<usize> = BTreeSet::new();
        let mut queue: VecDeque<usize> = VecDeque::new();
        reachable.insert(self.initial);
        queue.push_back(self.initial);
        while let Some(s) = queue.pop_front() {
            for row in self.rows[s].iter() {
                for t in row.s_prime.iter() {
                    if reachable.insert(t.s) {
                        queue.push_back(t.s);
                    }
                }
            }
        }
        reachable
    }
}

/// Check the structural contract of an MDP: every choice has a nonempty
/// distribution, probabilities lie in (0, 1], targets are in range and
/// each distribution sums to one.
pub fn validate_model<M: MDP>(model: &M) -> Result<(), ModelError> {
    let n = model.num_states();
    for s in 0..n {
        for c in 0..model.num_choices(s) {
            let succ = model.successors(s, c);
            if succ.is_empty() {
                return Err(ModelError::EmptyDistribution { state: s, choice: c });
            }
            let mut sum = 0.0;
            for t in succ.iter() {
                if t.p <= 0.0 || t.p > 1.0 {
                    return Err(ModelError::InvalidProbability {
                        state: s,
                        choice: c,
                        p: t.p,
                    });
                }
                if t.s >= n {
                    return Err(ModelError::TargetOutOfRange {
                        state: s,
                        choice: c,
                        target: t.s,
                    });
                }
                sum += t.p;
            }
            if (sum - 1.0).abs() > PROB_SUM_TOLERANCE {
                return Err(ModelError::DistributionSum {
                    state: s,
                    choice: c,
                    sum,
                });
            }
        }
    }
    Ok(())
}

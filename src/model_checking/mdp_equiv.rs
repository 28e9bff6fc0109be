use std::collections::{BTreeSet, HashMap};

use super::equiv::EquivalencePartition;
use super::mdp::{TransitionPair, MDP};

/// A (state, choice) pair of the model underneath a quotient view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChoicePair {
    pub state: usize,
    pub choice: usize,
}

/// Quotient view of an MDP under an equivalence partition.
///
/// Non-representative states stay in the index space but become traps.
/// A representative of a collapsed class offers the choices of all class
/// members, enumerated by walking the members in ascending order and each
/// member's choices in ascending order; that walk fixes the quotient
/// choice index. Successor distributions are the inner model's, targets
/// are not remapped.
#[derive(Debug)]
pub struct MDPEquiv<M: MDP> {
    inner: M,
    partition: EquivalencePartition,
    joined: HashMap<usize, Vec<StateChoicePair>>,
    non_representatives: BTreeSet<usize>,
}

impl<M: MDP> MDPEquiv<M> {
    pub fn new(inner: M, partition: EquivalencePartition) -> MDPEquiv<M> {
        let mut joined: HashMap<usize, Vec<StateChoicePair>> = HashMap::new();
        let mut non_representatives: BTreeSet<usize> = BTreeSet::new();
        for i in 0..partition.num_classes() {
            let class = partition.class_at(i);
            if class.len() == 1 {
                // nothing is collapsed, the member keeps its own choices
                continue;
            }
            let representative = partition.representative_at(i);
            let mut choices: Vec<StateChoicePair> = Vec::new();
            for &s in class.iter() {
                for c in 0..inner.num_choices(s) {
                    choices.push(StateChoicePair { state: s, choice: c });
                }
                if s != representative {
                    non_representatives.insert(s);
                }
            }
            joined.insert(representative, choices);
        }
        MDPEquiv {
            inner,
            partition,
            joined,
            non_representatives,
        }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn partition(&self) -> &EquivalencePartition {
        &self.partition
    }

    /// States that were folded into the representative of their class.
    /// They remain in the model as traps.
    pub fn non_representative_states(&self) -> &BTreeSet<usize> {
        &self.non_representatives
    }

    /// The representative that carries the choices (and the computed
    /// value) for `s`.
    pub fn map_to_representative(&self, s: usize) -> usize {
        self.partition.map_to_representative(s)
    }

    /// The inner-model (state, choice) behind quotient choice `c` of
    /// state `s`. Identity for states that were not collapsed.
    pub fn map_to_original(&self, s: usize, c: usize) -> StateChoicePair {
        match self.joined.get(&s) {
            Some(choices) => choices[c],
            None => StateChoicePair { state: s, choice: c },
        }
    }

    /// As `map_to_original`, but `None` when `s` was not collapsed or
    /// `c` is a marker outside the enumerated range.
    pub fn map_to_original_or_none(&self, s: usize, c: usize) -> Option<StateChoicePair> {
        self.joined.get(&s).and_then(|choices| choices.get(c)).copied()
    }
}

impl<M: MDP> MDP for MDPEquiv<M> {
    fn num_states(&self) -> usize {
        self.inner.num_states()
    }

    fn num_choices(&self, s: usize) -> usize {
        if self.non_representatives.contains(&s) {
            return 0;
        }
        match self.joined.get(&s) {
            Some(choices) => choices.len(),
            None => self.inner.num_choices(s),
        }
    }

    fn successors(&self, s: usize, c: usize) -> &[TransitionPair] {
        let mapped = self.map_to_original(s, c);
        self.inner.successors(mapped.state, mapped.choice)
    }

    fn reachable_states(&self) -> BTreeSet<usize> {
        self.inner.reachable_states()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_checking::mdp::SparseMDP;

    /// Class {0, 1, 2} with varying choice counts, state 3 outside.
    fn quotient() -> MDPEquiv<SparseMDP> {
        let mut mdp = SparseMDP::new(4, 0);
        mdp.add_choice(0, "a", vec![TransitionPair { s: 3, p: 1.0 }]);
        mdp.add_choice(1, "b", vec![TransitionPair { s: 3, p: 1.0 }]);
        mdp.add_choice(1, "c", vec![TransitionPair { s: 0, p: 1.0 }]);
        mdp.add_choice(2, "d", vec![TransitionPair { s: 3, p: 1.0 }]);
        mdp.add_choice(3, "e", vec![TransitionPair { s: 3, p: 1.0 }]);
        let partition = EquivalencePartition::new(vec![[0, 1, 2].into_iter().collect()]);
        MDPEquiv::new(mdp, partition)
    }

    #[test]
    fn representative_choices_walk_members_ascending() {
        let q = quotient();
        assert_eq!(q.num_choices(0), 4);
        let expected = [
            StateChoicePair { state: 0, choice: 0 },
            StateChoicePair { state: 1, choice: 0 },
            StateChoicePair { state: 1, choice: 1 },
            StateChoicePair { state: 2, choice: 0 },
        ];
        for (k, pair) in expected.iter().enumerate() {
            assert_eq!(q.map_to_original(0, k), *pair);
        }
    }

    #[test]
    fn non_representatives_are_traps() {
        let q = quotient();
        assert_eq!(q.num_choices(1), 0);
        assert_eq!(q.num_choices(2), 0);
        assert_eq!(
            q.non_representative_states().iter().copied().collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn uncollapsed_states_keep_their_choices() {
        let q = quotient();
        assert_eq!(q.num_choices(3), 1);
        assert_eq!(q.map_to_original(3, 0), StateChoicePair { state: 3, choice: 0 });
        assert_eq!(q.map_to_original_or_none(3, 0), None);
    }

    #[test]
    fn successors_are_not_remapped() {
        let q = quotient();
        // quotient choice 2 of the representative is (1, 1), going to 0
        assert_eq!(q.successors(0, 2), &[TransitionPair { s: 0, p: 1.0 }]);
    }

    #[test]
    fn map_to_original_or_none_rejects_markers() {
        let q = quotient();
        assert_eq!(q.map_to_original_or_none(0, 99), None);
        assert!(q.map_to_original_or_none(0, 3).is_some());
    }

    #[test]
    fn map_to_representative_broadcasts_class_members() {
        let q = quotient();
        assert_eq!(q.map_to_representative(2), 0);
        assert_eq!(q.map_to_representative(3), 3);
    }
}

use std::collections::BTreeSet;

use super::mdp::{TransitionPair, MDP};

/// Read-through view of an MDP with some choices hidden.
///
/// The drop predicate is evaluated exactly once per (state, choice) at
/// construction; the surviving original choice indices are cached per
/// state in ascending order, so view choice `k` of state `s` is original
/// choice `kept[s][k]`. The state index space is shared with the
/// underlying model.
#[derive(Debug)]
pub struct DroppedChoicesMDP<'a, M: MDP> {
    model: &'a M,
    kept: Vec<Vec<usize>>,
}

impl<'a, M: MDP> DroppedChoicesMDP<'a, M> {
    pub fn new<F: FnMut(usize, usize) -> bool>(model: &'a M, mut drop: F) -> DroppedChoicesMDP<'a, M> {
        let mut kept: Vec<Vec<usize>> = Vec::with_capacity(model.num_states());
        for s in 0..model.num_states() {
            let mut row: Vec<usize> = Vec::new();
            for c in 0..model.num_choices(s) {
                if !drop(s, c) {
                    row.push(c);
                }
            }
            kept.push(row);
        }
        DroppedChoicesMDP { model, kept }
    }

    /// The original choice index behind view choice `c` of state `s`.
    pub fn map_choice_to_original(&self, s: usize, c: usize) -> usize {
        self.kept[s][c]
    }

    /// True iff the view left state `s` without any choice.
    pub fn is_trap(&self, s: usize) -> bool {
        self.kept[s].is_empty()
    }

    /// Rewrite a strategy given in view choice indices into original
    /// choice indices. Negative sentinel entries are preserved.
    pub fn lift_strategy(&self, strat: &mut [i32]) {
        for s in 0..self.kept.len() {
            if strat[s] >= 0 {
                strat[s] = self.kept[s][strat[s] as usize] as i32;
            }
        }
    }
}

impl<'a, M: MDP> MDP for DroppedChoicesMDP<'a, M> {
    fn num_states(&self) -> usize {
        self.model.num_states()
    }

    fn num_choices(&self, s: usize) -> usize {
        self.kept[s].len()
    }

    fn successors(&self, s: usize, c: usize) -> &[TransitionPair] {
        self.model.successors(s, self.kept[s][c])
    }

    fn reachable_states(&self) -> BTreeSet<usize> {
        self.model.reachable_states()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_checking::mdp::SparseMDP;
    use crate::model_checking::precomputation::{CHOICE_ARBITRARY, CHOICE_UNKNOWN};

    fn model_with_four_choices() -> SparseMDP {
        let mut mdp = SparseMDP::new(2, 0);
        mdp.add_choice(0, "a", vec![TransitionPair { s: 0, p: 1.0 }]);
        mdp.add_choice(0, "b", vec![TransitionPair { s: 1, p: 1.0 }]);
        mdp.add_choice(0, "c", vec![TransitionPair { s: 0, p: 1.0 }]);
        mdp.add_choice(1, "d", vec![TransitionPair { s: 0, p: 1.0 }]);
        mdp
    }

    #[test]
    fn dropped_choices_are_re_densified() {
        let mdp = model_with_four_choices();
        // drop every even original choice of state 0
        let view = DroppedChoicesMDP::new(&mdp, |s, c| s == 0 && c % 2 == 0);
        assert_eq!(view.num_choices(0), 1);
        assert_eq!(view.map_choice_to_original(0, 0), 1);
        assert_eq!(view.successors(0, 0), &[TransitionPair { s: 1, p: 1.0 }]);
        assert_eq!(view.num_choices(1), 1);
        assert_eq!(view.map_choice_to_original(1, 0), 0);
    }

    #[test]
    fn trap_states_have_no_choices() {
        let mdp = model_with_four_choices();
        let view = DroppedChoicesMDP::new(&mdp, |s, _| s == 1);
        assert!(view.is_trap(1));
        assert!(!view.is_trap(0));
        assert_eq!(view.num_choices(1), 0);
    }

    #[test]
    fn lift_strategy_maps_kept_indices_and_preserves_sentinels() {
        let mdp = model_with_four_choices();
        let view = DroppedChoicesMDP::new(&mdp, |s, c| s == 0 && c == 0);
        let mut strat = vec![1, CHOICE_UNKNOWN];
        view.lift_strategy(&mut strat);
        // view choice 1 of state 0 is original choice 2
        assert_eq!(strat, vec![2, CHOICE_UNKNOWN]);

        let mut strat = vec![CHOICE_ARBITRARY, 0];
        view.lift_strategy(&mut strat);
        assert_eq!(strat, vec![CHOICE_ARBITRARY, 0]);
    }
}

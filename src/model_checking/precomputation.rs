use std::collections::BTreeSet;

use tracing::trace;

use super::mdp::MDP;

/// Scheduler entry: no choice decided yet.
pub const CHOICE_UNKNOWN: i32 = -1;
/// Scheduler entry: every choice is equally good.
pub const CHOICE_ARBITRARY: i32 = -2;

/// States from which some scheduler stays in `remain` without ever
/// entering `avoid`, with probability one.
///
/// Greatest fixed point of `X -> { s in remain \ avoid : exists c with
/// all successors of (s, c) in X }`, starting from `remain \ avoid`.
///
/// When `strat` is supplied, a witness choice is recorded for every state
/// of the result: the first choice whose successors all stay inside the
/// result, or `CHOICE_ARBITRARY` when every choice of the state does.
/// Entries of states outside the result are left untouched.
pub fn prob0e<M: MDP>(
    model: &M,
    remain: &BTreeSet<usize>,
    avoid: &BTreeSet<usize>,
    strat: Option<&mut [i32]>,
) -> BTreeSet<usize> {
    let mut x: BTreeSet<usize> = remain.difference(avoid).copied().collect();
    loop {
        let next: BTreeSet<usize> = x
            .iter()
            .copied()
            .filter(|&s| {
                (0..model.num_choices(s))
                    .any(|c| model.all_successors_match(s, c, |t| x.contains(&t)))
            })
            .collect();
        if next.len() == x.len() {
            break;
        }
        trace!(removed = x.len() - next.len(), "avoid fixpoint step");
        x = next;
    }

    if let Some(strat) = strat {
        for &s in x.iter() {
            let mut witness = CHOICE_ARBITRARY;
            let mut all_qualify = true;
            for c in 0..model.num_choices(s) {
                if model.all_successors_match(s, c, |t| x.contains(&t)) {
                    if witness == CHOICE_ARBITRARY {
                        witness = c as i32;
                    }
                } else {
                    all_qualify = false;
                }
            }
            strat[s] = if all_qualify { CHOICE_ARBITRARY } else { witness };
        }
    }
    x
}

/// States from which some scheduler reaches `goal` with probability one
/// while staying in `remain`.
///
/// Nested fixed point: the outer greatest fixed point shrinks the set `u`
/// of states still considered possible; the inner least fixed point grows
/// from `goal` along choices that stay in `u` and can reach the grown set.
///
/// When `strat` is supplied, the choice of a state is recorded when the
/// state first enters the inner fixed point; entries of `goal` states and
/// of states outside the result are left untouched. Entries written
/// during earlier outer rounds for states that later drop out of the
/// result are not meaningful.
pub fn prob1e<M: MDP>(
    model: &M,
    remain: &BTreeSet<usize>,
    goal: &BTreeSet<usize>,
    mut strat: Option<&mut [i32]>,
) -> BTreeSet<usize> {
    let mut u: BTreeSet<usize> = remain.union(goal).copied().collect();
    loop {
        let mut v: BTreeSet<usize> = goal.iter().copied().filter(|s| u.contains(s)).collect();
        loop {
            let mut added: Vec<usize> = Vec::new();
            for &s in u.iter() {
                if v.contains(&s) {
                    continue;
                }
                for c in 0..model.num_choices(s) {
                    if model.all_successors_match(s, c, |t| u.contains(&t))
                        && model.some_successor_in_set(s, c, &v)
                    {
                        added.push(s);
                        if let Some(strat) = strat.as_deref_mut() {
                            strat[s] = c as i32;
                        }
                        break;
                    }
                }
            }
            if added.is_empty() {
                break;
            }
            for s in added.into_iter() {
                v.insert(s);
            }
        }
        if v.len() == u.len() {
            break;
        }
        trace!(remaining = v.len(), "reach fixpoint outer step");
        u = v;
    }
    u
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_checking::mdp::{SparseMDP, TransitionPair};

    fn tp(s: usize, p: f64) -> TransitionPair {
        TransitionPair { s, p }
    }

    #[test]
    fn prob0e_keeps_the_self_loop_state() {
        // state 0 can loop forever, state 1 must be avoided
        let mut mdp = SparseMDP::new(2, 0);
        mdp.add_choice(0, "loop", vec![tp(0, 1.0)]);
        mdp.add_choice(0, "out", vec![tp(1, 1.0)]);
        let remain: BTreeSet<usize> = [0, 1].into_iter().collect();
        let avoid: BTreeSet<usize> = [1].into_iter().collect();
        let result = prob0e(&mdp, &remain, &avoid, None);
        assert_eq!(result, [0].into_iter().collect());
    }

    #[test]
    fn prob0e_records_witness_choices() {
        let mut mdp = SparseMDP::new(3, 0);
        mdp.add_choice(0, "loop", vec![tp(0, 1.0)]);
        mdp.add_choice(0, "out", vec![tp(2, 1.0)]);
        mdp.add_choice(1, "loop", vec![tp(1, 1.0)]);
        let remain: BTreeSet<usize> = [0, 1, 2].into_iter().collect();
        let avoid: BTreeSet<usize> = [2].into_iter().collect();
        let mut strat = vec![CHOICE_UNKNOWN; 3];
        let result = prob0e(&mdp, &remain, &avoid, Some(&mut strat));
        assert_eq!(result, [0, 1].into_iter().collect());
        // state 0 must pick the loop, state 1 has only safe choices
        assert_eq!(strat[0], 0);
        assert_eq!(strat[1], CHOICE_ARBITRARY);
        assert_eq!(strat[2], CHOICE_UNKNOWN);
    }

    #[test]
    fn prob0e_drains_states_that_cannot_stay() {
        // every path from 0 ends in the avoid state
        let mut mdp = SparseMDP::new(3, 0);
        mdp.add_choice(0, "a", vec![tp(1, 1.0)]);
        mdp.add_choice(1, "b", vec![tp(2, 1.0)]);
        let remain: BTreeSet<usize> = [0, 1, 2].into_iter().collect();
        let avoid: BTreeSet<usize> = [2].into_iter().collect();
        let result = prob0e(&mdp, &remain, &avoid, None);
        assert!(result.is_empty());
    }

    #[test]
    fn prob1e_reaches_along_a_chain() {
        let mut mdp = SparseMDP::new(3, 0);
        mdp.add_choice(0, "a", vec![tp(1, 1.0)]);
        mdp.add_choice(1, "b", vec![tp(2, 1.0)]);
        let remain: BTreeSet<usize> = [0, 1, 2].into_iter().collect();
        let goal: BTreeSet<usize> = [2].into_iter().collect();
        let mut strat = vec![CHOICE_UNKNOWN; 3];
        let result = prob1e(&mdp, &remain, &goal, Some(&mut strat));
        assert_eq!(result, [0, 1, 2].into_iter().collect());
        assert_eq!(strat[0], 0);
        assert_eq!(strat[1], 0);
        assert_eq!(strat[2], CHOICE_UNKNOWN);
    }

    #[test]
    fn prob1e_accepts_probabilistic_retry() {
        // the coin flip at 0 retries until it hits the goal
        let mut mdp = SparseMDP::new(2, 0);
        mdp.add_choice(0, "flip", vec![tp(0, 0.5), tp(1, 0.5)]);
        let remain: BTreeSet<usize> = [0, 1].into_iter().collect();
        let goal: BTreeSet<usize> = [1].into_iter().collect();
        let result = prob1e(&mdp, &remain, &goal, None);
        assert_eq!(result, [0, 1].into_iter().collect());
    }

    #[test]
    fn prob1e_rejects_leaky_choices() {
        // the only choice at 0 can fall into the sink 2
        let mut mdp = SparseMDP::new(3, 0);
        mdp.add_choice(0, "a", vec![tp(1, 0.5), tp(2, 0.5)]);
        let remain: BTreeSet<usize> = [0, 1, 2].into_iter().collect();
        let goal: BTreeSet<usize> = [1].into_iter().collect();
        let result = prob1e(&mdp, &remain, &goal, None);
        assert_eq!(result, [1].into_iter().collect());
    }

    #[test]
    fn prob1e_picks_the_safe_choice() {
        // choice "risky" leaves remain, choice "safe" reaches the goal
        let mut mdp = SparseMDP::new(4, 0);
        mdp.add_choice(0, "risky", vec![tp(3, 1.0)]);
        mdp.add_choice(0, "safe", vec![tp(1, 1.0)]);
        let remain: BTreeSet<usize> = [0, 1].into_iter().collect();
        let goal: BTreeSet<usize> = [1].into_iter().collect();
        let mut strat = vec![CHOICE_UNKNOWN; 4];
        let result = prob1e(&mdp, &remain, &goal, Some(&mut strat));
        assert_eq!(result, [0, 1].into_iter().collect());
        assert_eq!(strat[0], 1);
    }
}

use std::collections::BTreeSet;

use tracing::{debug, instrument};

use super::dropped_mdp::DroppedChoicesMDP;
use super::ec_computer::ECComputer;
use super::equiv::EquivalencePartition;
use super::error::ModelError;
use super::mdp::{validate_model, MDP};
use super::mdp_equiv::{MDPEquiv, StateChoicePair};
use super::precomputation::{prob0e, prob1e, CHOICE_ARBITRARY};
use super::rewards::MDPRewards;

fn positive_reward_choice<R: MDPRewards>(rewards: &R, s: usize, c: usize) -> bool {
    rewards.state_reward(s) > 0.0 || rewards.transition_reward(s, c) > 0.0
}

/// Zero-reward end-component quotient of an MDP.
///
/// The zero-reward maximal end components of the original model, i.e.
/// the components in which a scheduler can stay forever without ever
/// collecting reward, are each collapsed to a single representative
/// state. Choices leading out of a component are preserved on the
/// representative, so expected-reward iteration on the quotient cannot
/// diverge on zero-reward cycles.
///
/// The quotient borrows the original model and rewards and owns every
/// intermediate view; the original is never mutated.
pub struct ZeroRewardECQuotient<'a, M: MDP, R: MDPRewards> {
    quotient: MDPEquiv<DroppedChoicesMDP<'a, M>>,
    zero_rew_mdp: DroppedChoicesMDP<'a, M>,
    rewards: &'a R,
    num_zmecs: usize,
}

impl<'a, M: MDP, R: MDPRewards> ZeroRewardECQuotient<'a, M, R> {
    /// Build the quotient, or `Ok(None)` if the zero-reward fragment of
    /// the model has no end component, in which case the caller keeps
    /// working with the original model.
    ///
    /// `restrict` bounds the search for components; `None` means the
    /// model's reachable states.
    #[instrument(skip_all, level = "debug")]
    pub fn build(
        mdp: &'a M,
        restrict: Option<&BTreeSet<usize>>,
        rewards: &'a R,
    ) -> Result<Option<ZeroRewardECQuotient<'a, M, R>>, ModelError> {
        validate_model(mdp)?;
        let restrict: BTreeSet<usize> = match restrict {
            Some(r) => r.clone(),
            None => mdp.reachable_states(),
        };

        // the zero-reward fragment: drop every positive-reward choice
        let zero_rew_mdp = DroppedChoicesMDP::new(mdp, |s, c| positive_reward_choice(rewards, s, c));

        let mecs = ECComputer::new(&zero_rew_mdp).compute_mec_states(&restrict);
        if mecs.is_empty() {
            debug!("zero-reward fragment has no end components");
            return Ok(None);
        }
        let num_zmecs = mecs.len();
        debug!(num_zmecs, "collapsing zero-reward end components");

        let equiv = EquivalencePartition::new(mecs);

        // drop the zero-reward choices that cannot leave their component;
        // positive-reward choices and leaving choices survive
        let dropped_loops = DroppedChoicesMDP::new(mdp, |s, c| {
            restrict.contains(&s)
                && !positive_reward_choice(rewards, s, c)
                && mdp.all_successors_match(s, c, |t| equiv.same_class(s, t))
        });

        let quotient = MDPEquiv::new(dropped_loops, equiv);

        Ok(Some(ZeroRewardECQuotient {
            quotient,
            zero_rew_mdp,
            rewards,
            num_zmecs,
        }))
    }

    /// The quotient model.
    pub fn model(&self) -> &MDPEquiv<DroppedChoicesMDP<'a, M>> {
        &self.quotient
    }

    /// The reward structure of the quotient model.
    pub fn rewards(&self) -> QuotientRewards<'_, 'a, M, R> {
        QuotientRewards { source: self }
    }

    pub fn number_of_zmecs(&self) -> usize {
        self.num_zmecs
    }

    /// The component partition the quotient was built from.
    pub fn partition(&self) -> &EquivalencePartition {
        self.quotient.partition()
    }

    /// The zero-reward fragment of the original model.
    pub fn zero_reward_fragment(&self) -> &DroppedChoicesMDP<'a, M> {
        &self.zero_rew_mdp
    }

    /// States folded into their component representative; traps in the
    /// quotient model.
    pub fn non_representative_states(&self) -> &BTreeSet<usize> {
        self.quotient.non_representative_states()
    }

    /// Broadcast the value computed for each representative to the other
    /// members of its component, so `soln` reads as a vector over the
    /// original state space.
    pub fn map_results(&self, soln: &mut [f64]) {
        for &s in self.quotient.non_representative_states().iter() {
            soln[s] = soln[self.quotient.map_to_representative(s)];
        }
    }

    /// Rewrite a strategy computed on the quotient into a strategy on the
    /// original model.
    ///
    /// For each component, the choice selected at the representative is
    /// resolved to its original (state, choice); that state becomes the
    /// component's target. The remaining component members receive a
    /// probability-one strategy for reaching a target inside the
    /// zero-reward fragment, which exists for every member by the
    /// component property. Negative sentinel entries at a representative
    /// are preserved, with the representative itself acting as target.
    #[instrument(skip_all, level = "debug")]
    pub fn lift_strategy(&self, strat: &mut [i32]) -> Result<(), ModelError> {
        let partition = self.quotient.partition();
        let mut ecs: BTreeSet<usize> = BTreeSet::new();
        let mut targets: BTreeSet<usize> = BTreeSet::new();

        for i in 0..partition.num_classes() {
            let class = partition.class_at(i);
            let representative = partition.representative_at(i);
            let strat_choice = strat[representative];
            debug!(class = i, representative, strat_choice, "resolving component target");

            let (target_state, target_choice) = if strat_choice < 0 {
                (representative, strat_choice)
            } else {
                if strat_choice as usize >= self.quotient.num_choices(representative) {
                    return Err(ModelError::ChoiceOutOfRange {
                        state: representative,
                        choice: strat_choice,
                    });
                }
                let mapped = self
                    .quotient
                    .map_to_original_or_none(representative, strat_choice as usize)
                    .unwrap_or(StateChoicePair {
                        state: representative,
                        choice: strat_choice as usize,
                    });
                let original = self
                    .quotient
                    .inner()
                    .map_choice_to_original(mapped.state, mapped.choice);
                (mapped.state, original as i32)
            };

            ecs.extend(class.iter().copied());
            targets.insert(target_state);
            strat[target_state] = target_choice;
        }

        // probability-one reaching strategies toward the targets, taking
        // only zero-reward choices
        let certified = prob1e(&self.zero_rew_mdp, &ecs, &targets, Some(&mut *strat));
        for i in 0..partition.num_classes() {
            if let Some(&s) = partition.class_at(i).iter().find(|s| !certified.contains(*s)) {
                return Err(ModelError::UnreachableComponentTarget { class: i, state: s });
            }
        }

        // back from fragment choice indices to original choice indices
        for &s in ecs.iter() {
            if !targets.contains(&s) {
                strat[s] = self.zero_rew_mdp.map_choice_to_original(s, strat[s] as usize) as i32;
            }
        }
        Ok(())
    }
}

/// Reward structure of the quotient model: representatives keep their
/// own state reward, transition rewards follow the quotient choice back
/// to the original (state, choice).
pub struct QuotientRewards<'q, 'a, M: MDP, R: MDPRewards> {
    source: &'q ZeroRewardECQuotient<'a, M, R>,
}

impl<'q, 'a, M: MDP, R: MDPRewards> MDPRewards for QuotientRewards<'q, 'a, M, R> {
    fn state_reward(&self, s: usize) -> f64 {
        self.source.rewards.state_reward(s)
    }

    fn transition_reward(&self, s: usize, c: usize) -> f64 {
        let mapped = self.source.quotient.map_to_original(s, c);
        let original = self
            .source
            .quotient
            .inner()
            .map_choice_to_original(mapped.state, mapped.choice);
        self.source.rewards.transition_reward(mapped.state, original)
    }

    fn has_transition_rewards(&self) -> bool {
        self.source.rewards.has_transition_rewards()
    }
}

/// States that can stay inside the model forever without accumulating
/// reward, i.e. that have a scheduler taking only zero-reward choices
/// indefinitely.
///
/// When `strat` is supplied, the witness choices are recorded in
/// original-model choice indices; `CHOICE_ARBITRARY` entries are patched
/// to a concrete zero-reward choice for states that also have
/// positive-reward choices.
pub fn compute_zero_reward_strategy_states<M: MDP, R: MDPRewards>(
    mdp: &M,
    rewards: &R,
    mut strat: Option<&mut [i32]>,
) -> BTreeSet<usize> {
    let zero_rew_mdp = DroppedChoicesMDP::new(mdp, |s, c| positive_reward_choice(rewards, s, c));

    // states where every choice would collect reward
    let remain: BTreeSet<usize> = (0..mdp.num_states()).collect();
    let traps: BTreeSet<usize> = remain
        .iter()
        .copied()
        .filter(|&s| zero_rew_mdp.is_trap(s))
        .collect();

    let result = prob0e(&zero_rew_mdp, &remain, &traps, strat.as_deref_mut());

    if let Some(strat) = strat {
        for &s in result.iter() {
            if strat[s] == CHOICE_ARBITRARY && zero_rew_mdp.num_choices(s) != mdp.num_choices(s) {
                // choice 0 of the fragment exists, otherwise s would be a trap
                strat[s] = 0;
            }
        }
        zero_rew_mdp.lift_strategy(strat);
    }
    result
}

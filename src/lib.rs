//! Zero-reward end-component quotient construction for Markov decision
//! processes.
//!
//! Expected-reward value iteration diverges on end components in which a
//! scheduler can cycle forever without collecting reward. This crate
//! identifies those zero-reward maximal end components and collapses each
//! one to a single representative state, preserving every choice that
//! leaves its component. The resulting quotient model is what the
//! numerical iteration consumes; afterwards, results are projected back
//! with [`ZeroRewardECQuotient::map_results`] and schedulers with
//! [`ZeroRewardECQuotient::lift_strategy`].
//!
//! Models enter through the [`MDP`] and [`MDPRewards`] capability traits;
//! [`SparseMDP`] and [`SparseRewards`] are the explicit realizations.

pub mod model_checking;

pub use model_checking::dropped_mdp::DroppedChoicesMDP;
pub use model_checking::ec_computer::ECComputer;
pub use model_checking::equiv::EquivalencePartition;
pub use model_checking::error::ModelError;
pub use model_checking::helper_methods::{export_to_dot_file, parse_mdp_json, read_mdp_json};
pub use model_checking::mdp::{validate_model, SparseMDP, TransitionPair, MDP};
pub use model_checking::mdp_equiv::{MDPEquiv, StateChoicePair};
pub use model_checking::precomputation::{prob0e, prob1e, CHOICE_ARBITRARY, CHOICE_UNKNOWN};
pub use model_checking::rewards::{MDPRewards, SparseRewards};
pub use model_checking::zero_reward_quotient::{
    compute_zero_reward_strategy_states, QuotientRewards, ZeroRewardECQuotient,
};

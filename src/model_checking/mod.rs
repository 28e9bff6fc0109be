pub mod dropped_mdp;
pub mod ec_computer;
pub mod equiv;
pub mod error;
pub mod helper_methods;
pub mod mdp;
pub mod mdp_equiv;
pub mod precomputation;
pub mod rewards;
pub mod zero_reward_quotient;

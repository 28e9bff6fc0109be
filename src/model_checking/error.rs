use thiserror::Error;

/// Errors raised by model ingestion, validation and the quotient
/// construction. Nothing is swallowed: every failure carries the state,
/// choice or class index it was detected at.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("choice {choice} of state {state} has an empty distribution")]
    EmptyDistribution { state: usize, choice: usize },

    #[error("probability {p} out of range on choice {choice} of state {state}")]
    InvalidProbability { state: usize, choice: usize, p: f64 },

    #[error("target {target} out of range on choice {choice} of state {state}")]
    TargetOutOfRange {
        state: usize,
        choice: usize,
        target: usize,
    },

    #[error("distribution of choice {choice} of state {state} sums to {sum}, expected 1")]
    DistributionSum { state: usize, choice: usize, sum: f64 },

    #[error("state {state} out of range, model has {num_states} states")]
    StateOutOfRange { state: usize, num_states: usize },

    #[error("transition reward of action {action:?} at state {state} differs between records")]
    NonUniformTransitionReward { state: usize, action: String },

    #[error("choice {choice} out of range for state {state} while lifting a strategy")]
    ChoiceOutOfRange { state: usize, choice: i32 },

    #[error("state {state} of component {class} has no probability-one strategy to the component target")]
    UnreachableComponentTarget { class: usize, state: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

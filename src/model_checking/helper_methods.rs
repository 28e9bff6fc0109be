use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use petgraph::dot::Dot;
use petgraph::Graph;
use serde::Deserialize;

use super::error::ModelError;
use super::mdp::{validate_model, SparseMDP, TransitionPair, MDP};
use super::rewards::SparseRewards;

/// On-disk model record: dense state ids, an initial state, optional
/// per-state rewards and one transition record per (state, action) with
/// a uniform action reward.
#[derive(Debug, Deserialize)]
pub struct MDPRecord {
    pub states: Vec<usize>,
    pub initial: usize,
    #[serde(default)]
    pub state_rewards: Vec<f64>,
    pub transitions: Vec<TransitionRecord>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRecord {
    pub s: usize,
    pub a: String,
    pub s_prime: Vec<TransitionPair>,
    #[serde(default)]
    pub rewards: f64,
}

pub fn read_mdp_json<P: AsRef<Path>>(path: P) -> Result<(SparseMDP, SparseRewards), ModelError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let record: MDPRecord = serde_json::from_reader(reader)?;
    build_model(record)
}

pub fn parse_mdp_json(s: &str) -> Result<(SparseMDP, SparseRewards), ModelError> {
    let record: MDPRecord = serde_json::from_str(s)?;
    build_model(record)
}

fn build_model(record: MDPRecord) -> Result<(SparseMDP, SparseRewards), ModelError> {
    let num_states = record.states.len();
    for &s in record.states.iter() {
        if s >= num_states {
            return Err(ModelError::StateOutOfRange { state: s, num_states });
        }
    }
    if record.initial >= num_states {
        return Err(ModelError::StateOutOfRange {
            state: record.initial,
            num_states,
        });
    }

    let mut mdp = SparseMDP::new(num_states, record.initial);
    let mut rewards = SparseRewards::new(num_states);
    for (s, r) in record.state_rewards.iter().enumerate().take(num_states) {
        rewards.set_state_reward(s, *r);
    }

    // the action reward must be uniform over the successors of a choice,
    // so records repeating a (state, action) may not disagree on it
    let mut seen: HashMap<(usize, String), f64> = HashMap::new();
    for t in record.transitions.into_iter() {
        if t.s >= num_states {
            return Err(ModelError::StateOutOfRange { state: t.s, num_states });
        }
        match seen.get(&(t.s, t.a.clone())).copied() {
            Some(r) if r != t.rewards => {
                return Err(ModelError::NonUniformTransitionReward { state: t.s, action: t.a });
            }
            Some(_) => {}
            None => {
                seen.insert((t.s, t.a.clone()), t.rewards);
            }
        }
        mdp.add_choice(t.s, &t.a, t.s_prime);
        rewards.push_transition_reward(t.s, t.rewards);
    }

    validate_model(&mdp)?;
    Ok((mdp, rewards))
}

/// Write a model view as a graphviz dot file, one node per state and one
/// edge per (choice, successor) labelled `choice:probability`.
pub fn export_to_dot_file<M: MDP, P: AsRef<Path>>(model: &M, path: P) -> Result<(), ModelError> {
    let mut graph: Graph<String, String> = Graph::new();
    let nodes: Vec<_> = (0..model.num_states())
        .map(|s| graph.add_node(format!("{}", s)))
        .collect();
    for s in 0..model.num_states() {
        for c in 0..model.num_choices(s) {
            for t in model.successors(s, c) {
                graph.add_edge(nodes[s], nodes[t.s], format!("{}:{}", c, t.p));
            }
        }
    }
    let dot = format!("{:?}", Dot::new(&graph));
    let mut file = File::create(path)?;
    file.write_all(dot.as_bytes())?;
    Ok(())
}

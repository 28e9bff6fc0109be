use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::trace;

use super::mdp::MDP;

/// Maximal end component decomposition of an MDP restricted to a subset
/// of states.
///
/// Removal loop: decompose the remaining sub-graph into strongly
/// connected components, delete every choice with a successor outside
/// its component, delete every state left without a choice, repeat until
/// nothing changes. The components of the final decomposition are the
/// maximal end components.
pub struct ECComputer<'m, M: MDP> {
    model: &'m M,
}

impl<'m, M: MDP> ECComputer<'m, M> {
    pub fn new(model: &'m M) -> ECComputer<'m, M> {
        ECComputer { model }
    }

    /// The maximal end components of the sub-MDP induced by `restrict`,
    /// as state sets sorted by smallest member. May be empty.
    pub fn compute_mec_states(&self, restrict: &BTreeSet<usize>) -> Vec<BTreeSet<usize>> {
        let model = self.model;
        let mut available: HashMap<usize, BTreeSet<usize>> = HashMap::new();
        for &s in restrict.iter() {
            if s < model.num_states() && model.num_choices(s) > 0 {
                available.insert(s, (0..model.num_choices(s)).collect());
            }
        }
        let mut candidates: BTreeSet<usize> = available.keys().copied().collect();

        loop {
            let mut graph: DiGraph<usize, ()> = DiGraph::new();
            let mut node_of: HashMap<usize, NodeIndex> = HashMap::new();
            for &s in candidates.iter() {
                node_of.insert(s, graph.add_node(s));
            }
            for &s in candidates.iter() {
                for &c in available[&s].iter() {
                    for t in model.successors(s, c) {
                        if let Some(&target) = node_of.get(&t.s) {
                            graph.add_edge(node_of[&s], target, ());
                        }
                    }
                }
            }

            let sccs = kosaraju_scc(&graph);
            let mut scc_of: HashMap<usize, usize> = HashMap::new();
            for (i, scc) in sccs.iter().enumerate() {
                for &node in scc.iter() {
                    scc_of.insert(graph[node], i);
                }
            }

            let mut changed = false;
            for &s in candidates.iter() {
                let home = scc_of[&s];
                let choices = available.get_mut(&s).unwrap();
                let before = choices.len();
                // a choice whose image can escape the component cannot be
                // part of an end component
                choices.retain(|&c| {
                    model.all_successors_match(s, c, |t| scc_of.get(&t) == Some(&home))
                });
                if choices.len() != before {
                    changed = true;
                }
            }

            let stateless: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|s| available[s].is_empty())
                .collect();
            for s in stateless.into_iter() {
                trace!(state = s, "no choices left, removing from candidates");
                candidates.remove(&s);
                available.remove(&s);
                changed = true;
            }

            if !changed {
                return sccs
                    .iter()
                    .map(|scc| scc.iter().map(|&node| graph[node]).collect::<BTreeSet<usize>>())
                    .sorted_by_key(|component| component.iter().next().copied())
                    .collect();
            }
        }
    }
}

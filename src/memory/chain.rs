//! Greedy association walk bounded by the start token's weight.
//!
//! Starting from a token, repeatedly follow the outgoing association whose
//! target has the highest decayed weight, skipping tokens already in the
//! chain. The walk stops when the accumulated target weight reaches the
//! start token's own weight, or when no unvisited target remains.

use super::associations::AssociationGraph;
use super::neuron::Timestamp;
use super::store::NeuronStore;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Builds the association chain for `start`. Always contains at least `start`.
pub fn build_chain(
    start: &str,
    store: &NeuronStore,
    graph: &AssociationGraph,
    now: Timestamp,
    half_life: f64,
) -> Vec<String> {
    let mut chain = vec![start.to_string()];
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = start.to_string();

    let budget = store.weight_of(start, now, half_life);
    let mut accumulated = 0.0;

    while accumulated < budget {
        visited.insert(current.clone());

        let next = graph.edges(&current).and_then(|edges| {
            edges
                .keys()
                .filter(|target| !visited.contains(target.as_str()))
                .map(|target| (target, store.weight_of(target, now, half_life)))
                .max_by(|a, b| {
                    a.1.partial_cmp(&b.1)
                        .unwrap_or(Ordering::Equal)
                        // Lower token wins a tie
                        .then_with(|| b.0.cmp(a.0))
                })
                .map(|(target, weight)| (target.clone(), weight))
        });

        let Some((token, weight)) = next else {
            break;
        };

        accumulated += weight;
        chain.push(token.clone());
        current = token;
    }

    chain
}

use super::store::NeuronStore;
use std::collections::HashMap;

/// Outgoing edges of one token: target -> accumulated weight
pub type Edges = HashMap<String, f64>;

/// Base contribution of one reinforcement before tag overlap is counted
pub const BASE_ASSOCIATION_WEIGHT: f64 = 1.0;

/// Weighted, directed token associations.
///
/// Weights only grow. An edge from a token to itself is never stored.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AssociationGraph {
    edges: HashMap<String, Edges>,
}

impl AssociationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps edges restored from a snapshot, dropping any self-loops
    pub fn from_edges(mut edges: HashMap<String, Edges>) -> Self {
        for (source, targets) in edges.iter_mut() {
            targets.remove(source);
        }
        Self { edges }
    }

    /// Adds one reinforcement from every source to every target.
    ///
    /// The contribution is `1 + shared_tags * tag_weight`, with tags read from
    /// `store` (unknown tokens have none). Every source gets an edge map even if
    /// nothing is added to it. Returns the number of edges touched.
    pub fn reinforce(
        &mut self,
        sources: &[String],
        targets: &[String],
        store: &NeuronStore,
        tag_weight: f64,
    ) -> usize {
        let mut touched = 0;

        for source in sources {
            let source_neuron = store.get(source);
            let edges = self.edges.entry(source.clone()).or_default();

            for target in targets.iter().filter(|t| *t != source) {
                let shared = match (source_neuron, store.get(target)) {
                    (Some(s), Some(t)) => s.common_tags(t),
                    _ => 0,
                };
                let contribution = BASE_ASSOCIATION_WEIGHT + shared as f64 * tag_weight;

                *edges.entry(target.clone()).or_insert(0.0) += contribution;
                touched += 1;
            }
        }

        touched
    }

    /// Outgoing edges of `source`, if it has ever been a source
    pub fn edges(&self, source: &str) -> Option<&Edges> {
        self.edges.get(source)
    }

    /// Weight of `source -> target`, zero when absent
    pub fn weight(&self, source: &str, target: &str) -> f64 {
        self.edges
            .get(source)
            .and_then(|e| e.get(target))
            .copied()
            .unwrap_or(0.0)
    }

    /// Number of tokens with an edge map
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Total number of directed edges
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(HashMap::len).sum()
    }

    pub fn as_map(&self) -> &HashMap<String, Edges> {
        &self.edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reinforce_accumulates() {
        let store = NeuronStore::new();
        let mut graph = AssociationGraph::new();

        graph.reinforce(&tokens(&["a"]), &tokens(&["b", "c"]), &store, 2.0);
        graph.reinforce(&tokens(&["a"]), &tokens(&["b"]), &store, 2.0);

        assert_eq!(graph.weight("a", "b"), 2.0);
        assert_eq!(graph.weight("a", "c"), 1.0);
        assert_eq!(graph.weight("b", "a"), 0.0);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_no_self_loops() {
        let store = NeuronStore::new();
        let mut graph = AssociationGraph::new();

        let all = tokens(&["a", "b", "c"]);
        let touched = graph.reinforce(&all, &all, &store, 2.0);

        assert_eq!(touched, 6);
        for token in &all {
            let edges = graph.edges(token).expect("source has an edge map");
            assert!(!edges.contains_key(token));
        }
    }

    #[test]
    fn test_sources_always_get_an_entry() {
        let store = NeuronStore::new();
        let mut graph = AssociationGraph::new();
        graph.reinforce(&tokens(&["lonely"]), &[], &store, 2.0);
        assert_eq!(graph.len(), 1);
        assert!(graph.edges("lonely").is_some_and(|e| e.is_empty()));
    }

    #[test]
    fn test_shared_tags_boost_weight() {
        let mut store = NeuronStore::new();
        for token in ["sun", "moon", "rock"] {
            store.apply_signal(token, true, 0.0);
        }
        for token in ["sun", "moon"] {
            if let Some(neuron) = store.get_mut(token) {
                neuron.add_tag("sky");
                neuron.add_tag("light");
            }
        }

        let mut graph = AssociationGraph::new();
        graph.reinforce(&tokens(&["sun"]), &tokens(&["moon", "rock"]), &store, 2.0);

        assert_eq!(graph.weight("sun", "moon"), 5.0);
        assert_eq!(graph.weight("sun", "rock"), 1.0);
    }

    #[test]
    fn test_from_edges_strips_self_loops() {
        let mut edges = HashMap::new();
        let mut targets = Edges::new();
        targets.insert("a".to_string(), 3.0);
        targets.insert("b".to_string(), 1.0);
        edges.insert("a".to_string(), targets);

        let graph = AssociationGraph::from_edges(edges);
        assert_eq!(graph.weight("a", "a"), 0.0);
        assert_eq!(graph.weight("a", "b"), 1.0);
    }
}

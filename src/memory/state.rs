use super::associations::AssociationGraph;
use super::chain::build_chain;
use super::neuron::{signal_energy, Timestamp};
use super::recent::RecentSignals;
use super::store::NeuronStore;
use crate::config::MemoryConfig;
use std::fmt;

/// Energy multiple of a token's length at which a chain counts as self-expression
pub const EXPRESSION_FACTOR: f64 = 50.0;

/// Result of feeding one signal
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response {
    pub chain: Vec<String>,
    /// The signal's neuron reached the self-expression threshold
    pub expressive: bool,
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.chain.join(" "))
    }
}

/// Everything the engine mutates per signal
#[derive(Debug, Default)]
pub struct MemoryState {
    pub neurons: NeuronStore,
    pub associations: AssociationGraph,
    pub recent: RecentSignals,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State rebuilt from persisted structures with an empty recent window
    pub fn from_parts(neurons: NeuronStore, associations: AssociationGraph) -> Self {
        Self {
            neurons,
            associations,
            recent: RecentSignals::new(),
        }
    }

    /// Processes one signal at time `now` and returns the resulting chain.
    ///
    /// Order: recent window push and prune, neuron energy update, association
    /// reinforcement from the signal and the recent window towards every other
    /// active neuron, then the chain walk from the signal.
    pub fn process_signal(
        &mut self,
        signal: &str,
        was_output: bool,
        now: Timestamp,
        config: &MemoryConfig,
    ) -> Response {
        let signal = signal.trim();
        if signal.is_empty() {
            return Response::default();
        }

        self.recent.push(signal, now);
        self.recent.prune(now, config.recent_signals_max_age);

        let energy = self.neurons.apply_signal(signal, was_output, now).energy();

        let targets: Vec<String> = self
            .neurons
            .active_tokens(
                now,
                config.energy_half_life,
                config.recent_signals_max_age,
                signal,
            )
            .into_iter()
            .map(|(token, _)| token)
            .collect();

        let mut sources = vec![signal.to_string()];
        sources.extend(self.recent.snapshot().into_iter().filter(|t| t != signal));

        self.associations
            .reinforce(&sources, &targets, &self.neurons, config.tag_weight);

        let chain = build_chain(
            signal,
            &self.neurons,
            &self.associations,
            now,
            config.energy_half_life,
        );

        Response {
            chain,
            expressive: energy >= signal_energy(signal) * EXPRESSION_FACTOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_signal_has_no_associations() {
        let config = MemoryConfig::default();
        let mut state = MemoryState::new();

        let response = state.process_signal("hello", true, 0.0, &config);
        assert_eq!(response.chain, vec!["hello"]);
        assert!(!response.expressive);
        assert_eq!(state.neurons.len(), 1);
        assert_eq!(state.associations.edge_count(), 0);
    }

    #[test]
    fn test_signal_is_trimmed_and_blank_ignored() {
        let config = MemoryConfig::default();
        let mut state = MemoryState::new();

        assert_eq!(state.process_signal("   ", true, 0.0, &config), Response::default());
        assert!(state.neurons.is_empty());
        assert!(state.recent.is_empty());

        state.process_signal("  word \n", true, 0.0, &config);
        assert!(state.neurons.get("word").is_some());
    }

    #[test]
    fn test_expression_threshold() {
        let config = MemoryConfig::default();
        let mut state = MemoryState::new();

        let mut last = Response::default();
        for i in 0..50 {
            last = state.process_signal("x", true, f64::from(i), &config);
        }
        assert!(last.expressive);
    }

    #[test]
    fn test_response_display_joins_chain() {
        let response = Response {
            chain: vec!["a".into(), "b".into()],
            expressive: false,
        };
        assert_eq!(response.to_string(), "a b");
    }

    #[test]
    fn test_input_signals_do_not_create_targets() {
        let config = MemoryConfig::default();
        let mut state = MemoryState::new();

        state.process_signal("quiet", false, 0.0, &config);
        state.process_signal("loud", true, 1.0, &config);

        // "quiet" has negative weight, so nothing points at it
        assert_eq!(state.associations.weight("loud", "quiet"), 0.0);
        assert!(state.associations.edges("quiet").is_some());
    }
}

use super::neuron::{Neuron, Timestamp};
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Minimum decayed weight for a neuron to take part in association updates
pub const ACTIVE_WEIGHT_FLOOR: f64 = 0.1;

/// Creation/update counters since the last reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounters {
    pub created: u64,
    pub updated: u64,
}

/// Token -> neuron mapping with creation and update accounting
#[derive(Debug, Default)]
pub struct NeuronStore {
    neurons: HashMap<String, Neuron>,
    counters: StoreCounters,
}

impl NeuronStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps neurons restored from a snapshot; counters start at zero
    pub fn from_neurons(neurons: HashMap<String, Neuron>) -> Self {
        Self {
            neurons,
            counters: StoreCounters::default(),
        }
    }

    /// Returns the neuron for `token`, creating a zero-energy one on first access
    pub fn get_or_create(&mut self, token: &str, now: Timestamp) -> &mut Neuron {
        match self.neurons.entry(token.to_string()) {
            Entry::Occupied(entry) => {
                self.counters.updated += 1;
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.counters.created += 1;
                entry.insert(Neuron::new(token, now))
            }
        }
    }

    /// Creates or updates `token` and applies one signal to it
    pub fn apply_signal(&mut self, token: &str, was_output: bool, now: Timestamp) -> &Neuron {
        let neuron = self.get_or_create(token, now);
        neuron.apply_signal(was_output, now);
        neuron
    }

    /// Looks up a neuron without creating it
    pub fn get(&self, token: &str) -> Option<&Neuron> {
        self.neurons.get(token)
    }

    pub fn get_mut(&mut self, token: &str) -> Option<&mut Neuron> {
        self.neurons.get_mut(token)
    }

    /// Decayed weight of `token`; an unknown token weighs zero
    pub fn weight_of(&self, token: &str, now: Timestamp, half_life: f64) -> f64 {
        self.neurons
            .get(token)
            .map_or(0.0, |n| n.current_weight_at(now, half_life))
    }

    /// Tokens above the weight floor touched within `max_age`, strongest first.
    ///
    /// Equal weights are ordered by token so the result is reproducible.
    pub fn active_tokens(
        &self,
        now: Timestamp,
        half_life: f64,
        max_age: f64,
        exclude: &str,
    ) -> Vec<(String, f64)> {
        let mut active: Vec<(String, f64)> = self
            .neurons
            .iter()
            .filter(|(key, _)| key.as_str() != exclude)
            .filter(|(_, n)| now - n.last_updated() <= max_age)
            .map(|(key, n)| (key.clone(), n.current_weight_at(now, half_life)))
            .filter(|(_, weight)| *weight > ACTIVE_WEIGHT_FLOOR)
            .collect();

        active.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        active
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    pub fn neurons(&self) -> &HashMap<String, Neuron> {
        &self.neurons
    }

    pub fn counters(&self) -> StoreCounters {
        self.counters
    }

    /// Returns the counters and resets them to zero
    pub fn take_counters(&mut self) -> StoreCounters {
        std::mem::take(&mut self.counters)
    }
}

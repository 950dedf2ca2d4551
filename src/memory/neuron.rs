use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix time in seconds, with sub-second precision.
pub type Timestamp = f64;

/// Current wall-clock time as a [`Timestamp`].
pub fn now_secs() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Energy delta carried by a token: its UTF-8 byte length.
pub fn signal_energy(token: &str) -> f64 {
    token.len() as f64
}

/// A single token's decaying energy record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neuron {
    key: String,
    energy: f64,
    tags: BTreeSet<String>,
    last_updated: Timestamp,
}

impl Neuron {
    /// Creates a zero-energy neuron stamped with `now`
    pub fn new(key: impl Into<String>, now: Timestamp) -> Self {
        Self {
            key: key.into(),
            energy: 0.0,
            tags: BTreeSet::new(),
            last_updated: now,
        }
    }

    /// Rebuilds a neuron from stored fields
    pub fn with_state(
        key: impl Into<String>,
        energy: f64,
        tags: BTreeSet<String>,
        last_updated: Timestamp,
    ) -> Self {
        Self {
            key: key.into(),
            energy,
            tags,
            last_updated,
        }
    }

    // Getters
    pub fn key(&self) -> &str { &self.key }
    pub fn energy(&self) -> f64 { self.energy }
    pub fn tags(&self) -> &BTreeSet<String> { &self.tags }
    pub fn last_updated(&self) -> Timestamp { self.last_updated }

    /// Adds a tag used to strengthen associations with neurons sharing it
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    /// Applies one signal of this token.
    ///
    /// Output signals add the token's byte length to the energy, input-only
    /// signals subtract half of it. Energy is never clamped.
    pub fn apply_signal(&mut self, was_output: bool, now: Timestamp) {
        let delta = signal_energy(&self.key);
        if was_output {
            self.energy += delta;
        } else {
            self.energy -= delta / 2.0;
        }
        self.last_updated = now;
    }

    /// Seconds since the last energy mutation, never negative
    pub fn age_at(&self, now: Timestamp) -> f64 {
        (now - self.last_updated).max(0.0)
    }

    /// Energy decayed by age: `energy * 2^(-age / half_life)`
    pub fn current_weight_at(&self, now: Timestamp, half_life: f64) -> f64 {
        let freshness = (-self.age_at(now) / half_life).exp2();
        self.energy * freshness
    }

    /// Number of tags shared with `other`
    pub fn common_tags(&self, other: &Neuron) -> usize {
        self.tags.intersection(&other.tags).count()
    }
}

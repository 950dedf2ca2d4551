//! Age-bounded queue of recently seen tokens.

use super::neuron::Timestamp;
use std::collections::{HashSet, VecDeque};

/// Recently seen signals in arrival order
#[derive(Debug, Default, Clone)]
pub struct RecentSignals {
    signals: VecDeque<(String, Timestamp)>,
}

impl RecentSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a signal. Callers push in time order.
    pub fn push(&mut self, token: impl Into<String>, now: Timestamp) {
        self.signals.push_back((token.into(), now));
    }

    /// Evicts entries older than `max_age` seconds, returning how many were dropped
    pub fn prune(&mut self, now: Timestamp, max_age: f64) -> usize {
        let mut evicted = 0;
        while let Some((_, seen_at)) = self.signals.front() {
            if now - *seen_at <= max_age {
                break;
            }
            self.signals.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Distinct tokens currently in the window, first occurrence first
    pub fn snapshot(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.signals
            .iter()
            .filter(|(token, _)| seen.insert(token.as_str()))
            .map(|(token, _)| token.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_from_front() {
        let mut recent = RecentSignals::new();
        recent.push("a", 0.0);
        recent.push("b", 5.0);
        recent.push("c", 9.0);

        assert_eq!(recent.prune(10.0, 5.0), 1);
        assert_eq!(recent.snapshot(), vec!["b", "c"]);

        // Exactly max_age old is kept
        assert_eq!(recent.prune(10.0, 5.0), 0);
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_snapshot_is_distinct() {
        let mut recent = RecentSignals::new();
        recent.push("x", 0.0);
        recent.push("y", 1.0);
        recent.push("x", 2.0);
        assert_eq!(recent.snapshot(), vec!["x", "y"]);
        assert_eq!(recent.len(), 3);
    }

    #[test]
    fn test_prune_everything() {
        let mut recent = RecentSignals::new();
        recent.push("a", 0.0);
        recent.push("b", 1.0);
        assert_eq!(recent.prune(100.0, 1.0), 2);
        assert!(recent.is_empty());
        assert!(recent.snapshot().is_empty());
    }
}

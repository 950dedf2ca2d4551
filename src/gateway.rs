use crate::brain::Brain;
use std::sync::Arc;

/// Splits free text into word signals for a [`Brain`]
#[derive(Clone)]
pub struct Gateway {
    brain: Arc<Brain>,
}

impl Gateway {
    pub fn new(brain: Arc<Brain>) -> Self {
        Self { brain }
    }

    pub fn brain(&self) -> &Arc<Brain> {
        &self.brain
    }

    /// Feeds every word as an output signal and joins the chains with `" / "`
    pub fn receive(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|word| self.brain.respond(word, true).to_string())
            .collect::<Vec<_>>()
            .join(" / ")
    }

    /// Feeds every word as an input-only signal
    pub fn observe(&self, text: &str) {
        for word in text.split_whitespace() {
            self.brain.respond(word, false);
        }
    }
}

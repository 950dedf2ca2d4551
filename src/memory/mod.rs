//! In-memory associative engine: neurons, associations, recent signals.

pub mod associations;
pub mod chain;
pub mod neuron;
pub mod recent;
pub mod state;
pub mod store;

pub use associations::AssociationGraph;
pub use chain::build_chain;
pub use neuron::{now_secs, Neuron, Timestamp};
pub use recent::RecentSignals;
pub use state::{MemoryState, Response};
pub use store::{NeuronStore, StoreCounters};

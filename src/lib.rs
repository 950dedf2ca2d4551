//! Toy associative memory: tokens carry decaying energy, co-occurring tokens
//! build weighted associations, and each signal is answered with a greedy
//! chain through those associations. State is snapshotted to disk with a safe
//! copy and rotating backups.

pub mod autosave;
pub mod brain;
pub mod config;
pub mod gateway;
pub mod memory;
pub mod storage;

pub use autosave::{Autosaver, AutosaverHandle};
pub use brain::{Brain, Diagnostics};
pub use config::{ConfigError, MemoryConfig};
pub use gateway::Gateway;
pub use memory::{Neuron, Response};
pub use storage::{LoadOutcome, StorageError};

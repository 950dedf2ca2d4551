//! The memory context: configuration, shared state and persistence.

use crate::config::MemoryConfig;
use crate::memory::neuron::{now_secs, Timestamp};
use crate::memory::state::{MemoryState, Response};
use crate::memory::associations::AssociationGraph;
use crate::memory::store::NeuronStore;
use crate::storage::snapshot::SnapshotRef;
use crate::storage::{LoadOutcome, Persistence, SaveReport, StorageError};
use parking_lot::Mutex;
use std::fmt;
use tracing::{debug, info, warn};

/// Counters reported by the autosaver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    pub neurons: usize,
    pub association_sources: usize,
    pub created: u64,
    pub updated: u64,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "neurons: {} | associations: {} | created: {} | updated: {}",
            self.neurons, self.association_sources, self.created, self.updated
        )
    }
}

/// An associative memory instance.
///
/// All mutation and snapshot reads go through one mutex, so a `Brain` can be
/// shared between the signal path and the autosaver behind an `Arc`.
pub struct Brain {
    config: MemoryConfig,
    state: Mutex<MemoryState>,
    persistence: Persistence,
}

impl Brain {
    /// Opens the memory stored under `config.data_dir`, falling back to an
    /// empty memory when nothing usable is on disk.
    pub fn open(config: MemoryConfig) -> (Self, LoadOutcome) {
        let persistence = Persistence::new(&config);
        let (snapshot, outcome) = persistence.load_on_startup();

        let state = MemoryState::from_parts(
            NeuronStore::from_neurons(snapshot.neurons),
            AssociationGraph::from_edges(snapshot.associations),
        );

        let brain = Self {
            config,
            state: Mutex::new(state),
            persistence,
        };
        (brain, outcome)
    }

    /// Starts empty without reading disk; saves still go to `config.data_dir`
    pub fn fresh(config: MemoryConfig) -> Self {
        Self {
            persistence: Persistence::new(&config),
            state: Mutex::new(MemoryState::new()),
            config,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Feeds one signal at the current time
    pub fn respond(&self, signal: &str, was_output: bool) -> Response {
        self.respond_at(signal, was_output, now_secs())
    }

    /// Feeds one signal at time `now` and returns its association chain
    pub fn respond_at(&self, signal: &str, was_output: bool, now: Timestamp) -> Response {
        let response = self
            .state
            .lock()
            .process_signal(signal, was_output, now, &self.config);

        if response.expressive && !self.config.silent {
            info!(target: "neuromem::expression", "{}", response);
        } else {
            debug!(signal, chain_len = response.chain.len(), "signal processed");
        }
        response
    }

    /// Adds `tag` to an existing neuron. Returns false for unknown tokens.
    pub fn tag(&self, token: &str, tag: &str) -> bool {
        self.state
            .lock()
            .neurons
            .get_mut(token)
            .map_or(false, |neuron| {
                neuron.add_tag(tag);
                true
            })
    }

    /// Runs `f` against the current state under the lock
    pub fn with_state<R>(&self, f: impl FnOnce(&MemoryState) -> R) -> R {
        f(&self.state.lock())
    }

    pub fn neuron_count(&self) -> usize {
        self.state.lock().neurons.len()
    }

    pub fn association_count(&self) -> usize {
        self.state.lock().associations.len()
    }

    /// Encodes the state under the lock, then writes it to disk outside it
    pub fn save(&self) -> Result<SaveReport, StorageError> {
        let (bytes, metrics, neurons) = {
            let state = self.state.lock();
            let view = SnapshotRef {
                neurons: state.neurons.neurons(),
                associations: state.associations.as_map(),
            };
            let (bytes, metrics) = self.persistence.encode(&view)?;
            (bytes, metrics, state.neurons.len())
        };

        let report = self.persistence.write(&bytes, metrics)?;
        info!(neurons, bytes = report.bytes_written, "memory saved");
        Ok(report)
    }

    /// Exact serialized size of the neuron and association maps
    pub fn estimate_size(&self) -> Result<u64, StorageError> {
        let state = self.state.lock();
        SnapshotRef {
            neurons: state.neurons.neurons(),
            associations: state.associations.as_map(),
        }
        .serialized_size()
    }

    /// Whether the serialized state exceeds the configured share of the
    /// memory limit. A failed estimate counts as not exceeded.
    pub fn memory_limit_exceeded(&self) -> bool {
        match self.estimate_size() {
            Ok(bytes) => bytes as f64 > self.config.memory_limit_bytes(),
            Err(e) => {
                warn!(error = %e, "size estimation failed");
                false
            }
        }
    }

    /// Current sizes plus the created/updated counters, which are reset
    pub fn take_diagnostics(&self) -> Diagnostics {
        let mut state = self.state.lock();
        let counters = state.neurons.take_counters();
        Diagnostics {
            neurons: state.neurons.len(),
            association_sources: state.associations.len(),
            created: counters.created,
            updated: counters.updated,
        }
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }
}

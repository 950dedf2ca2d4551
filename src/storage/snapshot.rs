//! On-disk snapshot format.
//!
//! A snapshot file is a bincode-encoded envelope carrying a magic tag, a
//! format version, the compression algorithm, a CRC32 of the uncompressed
//! payload and the (possibly compressed) payload itself. The payload is the
//! bincode encoding of the neuron map followed by the association map.

use super::compression::{CompressionAlgorithm, CompressionMetrics, Compressor};
use super::StorageError;
use crate::memory::associations::Edges;
use crate::memory::neuron::Neuron;
use bincode::{deserialize, serialize, serialized_size};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const SNAPSHOT_MAGIC: [u8; 4] = *b"NMEM";
pub const SNAPSHOT_VERSION: u16 = 1;

/// Owned neuron and association maps read back from disk
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct Snapshot {
    pub neurons: HashMap<String, Neuron>,
    pub associations: HashMap<String, Edges>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty() && self.associations.is_empty()
    }
}

/// Borrowed view serialized with the same layout as [`Snapshot`]
#[derive(Serialize)]
pub struct SnapshotRef<'a> {
    pub neurons: &'a HashMap<String, Neuron>,
    pub associations: &'a HashMap<String, Edges>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEnvelope {
    magic: [u8; 4],
    version: u16,
    compression: CompressionAlgorithm,
    checksum: u32,
    payload: Vec<u8>,
}

impl<'a> SnapshotRef<'a> {
    /// Encodes the snapshot into file bytes
    pub fn encode(
        &self,
        compressor: &Compressor,
    ) -> Result<(Vec<u8>, CompressionMetrics), StorageError> {
        let raw = serialize(self)?;
        let checksum = crc32fast::hash(&raw);
        let (payload, metrics) = compressor.compress(&raw);

        let envelope = SnapshotEnvelope {
            magic: SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION,
            compression: compressor.algorithm(),
            checksum,
            payload,
        };
        Ok((serialize(&envelope)?, metrics))
    }

    /// Exact uncompressed payload size in bytes
    pub fn serialized_size(&self) -> Result<u64, StorageError> {
        Ok(serialized_size(self)?)
    }
}

/// Decodes and verifies file bytes produced by [`SnapshotRef::encode`]
pub fn decode_snapshot(bytes: &[u8]) -> Result<Snapshot, StorageError> {
    let envelope: SnapshotEnvelope = deserialize(bytes)?;

    if envelope.magic != SNAPSHOT_MAGIC {
        return Err(StorageError::BadMagic);
    }
    if envelope.version != SNAPSHOT_VERSION {
        return Err(StorageError::UnsupportedVersion(envelope.version));
    }

    let raw = Compressor::decompress(envelope.compression, &envelope.payload)?;
    let actual = crc32fast::hash(&raw);
    if actual != envelope.checksum {
        return Err(StorageError::ChecksumMismatch {
            expected: envelope.checksum,
            actual,
        });
    }

    Ok(deserialize(&raw)?)
}

/// Reads and decodes a snapshot file
pub fn read_snapshot(path: &Path) -> Result<Snapshot, StorageError> {
    let bytes = fs::read(path)?;
    decode_snapshot(&bytes)
}

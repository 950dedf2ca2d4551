//! Snapshot persistence: atomic canonical file, safe copy and rotating backups.

pub mod backup;
pub mod compression;
pub mod snapshot;

use backup::{BackupManager, BackupReport};
use compression::{CompressionMetrics, Compressor};
use lz4_flex::block::DecompressError;
use parking_lot::Mutex;
use snapshot::{read_snapshot, Snapshot, SnapshotRef};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::MemoryConfig;

pub const DB_FILE_NAME: &str = "memory_db.bin";
pub const SAFE_COPY_FILE_NAME: &str = "memory_db.safe.bin";
pub const BACKUP_DIR_NAME: &str = "backup";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("Decompression error: {0}")]
    Decompression(#[from] DecompressError),
    #[error("Checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("Not a snapshot file")]
    BadMagic,
    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u16),
}

/// Where the startup state came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    RestoredFromSafeCopy,
    RestoredFromBackup,
    Empty,
}

/// Result of a successful save
#[derive(Debug, Clone)]
pub struct SaveReport {
    pub bytes_written: usize,
    pub metrics: CompressionMetrics,
    pub safe_copied: bool,
    pub backup: Option<BackupReport>,
}

/// Owns the snapshot file locations and the backup policy
pub struct Persistence {
    db_file: PathBuf,
    data_dir: PathBuf,
    compressor: Compressor,
    backups: BackupManager,
    // Held for the whole canonical write plus safe copy and backup
    write_lock: Mutex<()>,
}

impl Persistence {
    pub fn new(config: &MemoryConfig) -> Self {
        let data_dir = config.data_dir.clone();
        let db_file = data_dir.join(DB_FILE_NAME);
        let backups = BackupManager::new(
            db_file.clone(),
            data_dir.join(SAFE_COPY_FILE_NAME),
            data_dir.join(BACKUP_DIR_NAME),
            config.max_backups,
        );

        Self {
            db_file,
            data_dir,
            compressor: Compressor::new(config.compression),
            backups,
            write_lock: Mutex::new(()),
        }
    }

    pub fn db_file(&self) -> &Path {
        &self.db_file
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Loads the best available snapshot.
    ///
    /// Tries the canonical file, then the safe copy, then the newest rotating
    /// backup. Every failure is logged and the next source is tried; when all
    /// fail the result is an empty snapshot.
    pub fn load_on_startup(&self) -> (Snapshot, LoadOutcome) {
        let canonical_size = fs::metadata(&self.db_file).map(|m| m.len()).unwrap_or(0);

        if canonical_size == 0 {
            warn!(path = %self.db_file.display(), "snapshot missing or empty, trying safe copy");
        } else {
            match read_snapshot(&self.db_file) {
                Ok(snapshot) => {
                    info!(neurons = snapshot.neurons.len(), "memory loaded from snapshot");
                    return (snapshot, LoadOutcome::Loaded);
                }
                Err(e) => {
                    error!(
                        path = %self.db_file.display(),
                        error = %e,
                        "snapshot unreadable, trying safe copy"
                    );
                }
            }
        }

        match self.backups.restore_from_safe_copy() {
            Ok(Some(snapshot)) => {
                info!(neurons = snapshot.neurons.len(), "memory restored from safe copy");
                return (snapshot, LoadOutcome::RestoredFromSafeCopy);
            }
            Ok(None) => debug!("no safe copy present"),
            Err(e) => warn!(error = %e, "safe copy unreadable"),
        }

        match self.backups.restore_from_latest_backup() {
            Ok(Some(snapshot)) => return (snapshot, LoadOutcome::RestoredFromBackup),
            Ok(None) => debug!("no usable rotating backup"),
            Err(e) => warn!(error = %e, "rotating backups unavailable"),
        }

        warn!("no persisted memory found, starting empty");
        (Snapshot::default(), LoadOutcome::Empty)
    }

    /// Encodes the state into snapshot file bytes
    pub fn encode(
        &self,
        view: &SnapshotRef<'_>,
    ) -> Result<(Vec<u8>, CompressionMetrics), StorageError> {
        view.encode(&self.compressor)
    }

    /// Atomically replaces the canonical file with `bytes`, then refreshes the
    /// safe copy and adds a rotating backup.
    ///
    /// Only the canonical write can fail the call; safe copy and backup
    /// failures are logged and reported as absent in the [`SaveReport`].
    pub fn write(
        &self,
        bytes: &[u8],
        metrics: CompressionMetrics,
    ) -> Result<SaveReport, StorageError> {
        let _guard = self.write_lock.lock();
        fs::create_dir_all(&self.data_dir)?;

        let mut temp = NamedTempFile::new_in(&self.data_dir)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.db_file).map_err(|e| e.error)?;
        debug!(bytes = bytes.len(), ratio = metrics.compression_ratio(), "snapshot written");

        let safe_copied = self.backups.safe_save().unwrap_or_else(|e| {
            error!(error = %e, "safe copy failed");
            false
        });

        let backup = self.backups.create_backup().unwrap_or_else(|e| {
            error!(error = %e, "rotating backup failed");
            None
        });

        Ok(SaveReport {
            bytes_written: bytes.len(),
            metrics,
            safe_copied,
            backup,
        })
    }
}

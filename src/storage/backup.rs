use super::snapshot::{read_snapshot, Snapshot};
use super::StorageError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Canonical files at or below this size are never copied to the safe copy
pub const SAFE_COPY_MIN_BYTES: u64 = 100;

const BACKUP_PREFIX: &str = "memory_backup_";
const BACKUP_SUFFIX: &str = ".db";

/// Outcome of one rotating backup
#[derive(Debug, Clone, PartialEq)]
pub struct BackupReport {
    pub path: PathBuf,
    pub pruned: Vec<PathBuf>,
}

/// Safe copy and rotating backups of the canonical snapshot file
#[derive(Debug, Clone)]
pub struct BackupManager {
    db_file: PathBuf,
    safe_copy: PathBuf,
    backup_dir: PathBuf,
    max_backups: usize,
}

impl BackupManager {
    pub fn new(
        db_file: impl Into<PathBuf>,
        safe_copy: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        max_backups: usize,
    ) -> Self {
        Self {
            db_file: db_file.into(),
            safe_copy: safe_copy.into(),
            backup_dir: backup_dir.into(),
            max_backups,
        }
    }

    pub fn safe_copy_path(&self) -> &Path {
        &self.safe_copy
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Copies the canonical file to the safe copy if it looks like real data.
    ///
    /// Returns whether a copy was made.
    pub fn safe_save(&self) -> Result<bool, StorageError> {
        let size = match fs::metadata(&self.db_file) {
            Ok(meta) => meta.len(),
            Err(_) => return Ok(false),
        };
        if size <= SAFE_COPY_MIN_BYTES {
            debug!(size, "snapshot too small for a safe copy");
            return Ok(false);
        }

        fs::copy(&self.db_file, &self.safe_copy)?;
        debug!(path = %self.safe_copy.display(), "safe copy written");
        Ok(true)
    }

    /// Adds a timestamped copy of the canonical file and prunes the oldest
    /// ones beyond the cap. Returns `None` when there is nothing to back up.
    pub fn create_backup(&self) -> Result<Option<BackupReport>, StorageError> {
        if !self.db_file.exists() {
            return Ok(None);
        }
        fs::create_dir_all(&self.backup_dir)?;

        let existing = self.list_backups()?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        // Stamps strictly increase even when the clock does not
        let stamp = existing
            .last()
            .map_or(now, |(last, _)| now.max(last.saturating_add(1)));

        let path = self.backup_path(stamp);
        fs::copy(&self.db_file, &path)?;

        let pruned = self.prune()?;
        info!(path = %path.display(), pruned = pruned.len(), "backup created");
        Ok(Some(BackupReport { path, pruned }))
    }

    /// Removes the oldest backups until at most `max_backups` remain
    pub fn prune(&self) -> Result<Vec<PathBuf>, StorageError> {
        let backups = self.list_backups()?;
        let excess = backups.len().saturating_sub(self.max_backups);

        let mut removed = Vec::with_capacity(excess);
        for (_, path) in backups.into_iter().take(excess) {
            fs::remove_file(&path)?;
            removed.push(path);
        }
        Ok(removed)
    }

    /// Rotating backups sorted oldest first
    pub fn list_backups(&self) -> Result<Vec<(u128, PathBuf)>, StorageError> {
        let entries = match fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut backups = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if let Some(stamp) = Self::parse_stamp(&path) {
                backups.push((stamp, path));
            }
        }
        backups.sort_by_key(|(stamp, _)| *stamp);
        Ok(backups)
    }

    /// Loads the safe copy, `None` if it does not exist
    pub fn restore_from_safe_copy(&self) -> Result<Option<Snapshot>, StorageError> {
        if !self.safe_copy.exists() {
            return Ok(None);
        }
        read_snapshot(&self.safe_copy).map(Some)
    }

    /// Loads the newest rotating backup that decodes, `None` if none does
    pub fn restore_from_latest_backup(&self) -> Result<Option<Snapshot>, StorageError> {
        for (_, path) in self.list_backups()?.into_iter().rev() {
            match read_snapshot(&path) {
                Ok(snapshot) => {
                    info!(path = %path.display(), "restored from rotating backup");
                    return Ok(Some(snapshot));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "unreadable backup skipped"),
            }
        }
        Ok(None)
    }

    fn backup_path(&self, stamp: u128) -> PathBuf {
        self.backup_dir
            .join(format!("{BACKUP_PREFIX}{stamp}{BACKUP_SUFFIX}"))
    }

    fn parse_stamp(path: &Path) -> Option<u128> {
        path.file_name()?
            .to_str()?
            .strip_prefix(BACKUP_PREFIX)?
            .strip_suffix(BACKUP_SUFFIX)?
            .parse()
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn manager(dir: &Path, max_backups: usize) -> BackupManager {
        BackupManager::new(
            dir.join("memory_db.bin"),
            dir.join("memory_db.safe.bin"),
            dir.join("backup"),
            max_backups,
        )
    }

    #[test]
    fn test_safe_copy_requires_minimum_size() -> Result<(), StorageError> {
        let temp_dir = tempdir()?;
        let backups = manager(temp_dir.path(), 5);

        assert!(!backups.safe_save()?, "no canonical file yet");

        fs::write(temp_dir.path().join("memory_db.bin"), [1u8; 100])?;
        assert!(!backups.safe_save()?);
        assert!(!backups.safe_copy_path().exists());

        fs::write(temp_dir.path().join("memory_db.bin"), [2u8; 101])?;
        assert!(backups.safe_save()?);
        assert_eq!(fs::read(backups.safe_copy_path())?, vec![2u8; 101]);
        Ok(())
    }

    #[test]
    fn test_no_backup_without_canonical_file() -> Result<(), StorageError> {
        let temp_dir = tempdir()?;
        let backups = manager(temp_dir.path(), 5);
        assert_eq!(backups.create_backup()?, None);
        assert!(backups.list_backups()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_rotation_keeps_newest() -> Result<(), StorageError> {
        let temp_dir = tempdir()?;
        let backups = manager(temp_dir.path(), 5);
        let db_file = temp_dir.path().join("memory_db.bin");

        let mut created = Vec::new();
        for i in 0..6u8 {
            fs::write(&db_file, [i; 8])?;
            let report = backups.create_backup()?.expect("canonical file exists");
            created.push(report.path);
        }

        let remaining: Vec<PathBuf> = backups
            .list_backups()?
            .into_iter()
            .map(|(_, path)| path)
            .collect();
        assert_eq!(remaining.len(), 5);
        assert_eq!(remaining, created[1..].to_vec());
        assert!(!created[0].exists());

        // Contents follow the canonical file at backup time
        assert_eq!(fs::read(&remaining[4])?, vec![5u8; 8]);
        Ok(())
    }

    #[test]
    fn test_maximum_stamp_does_not_overflow() -> Result<(), StorageError> {
        let temp_dir = tempdir()?;
        let backups = manager(temp_dir.path(), 5);
        fs::create_dir_all(backups.backup_dir())?;
        fs::write(backups.backup_path(u128::MAX), b"old")?;
        fs::write(temp_dir.path().join("memory_db.bin"), b"data")?;

        let report = backups.create_backup()?.expect("canonical file exists");
        assert_eq!(report.path, backups.backup_path(u128::MAX));
        assert_eq!(fs::read(&report.path)?, b"data".to_vec());
        assert_eq!(backups.list_backups()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_foreign_files_are_ignored() -> Result<(), StorageError> {
        let temp_dir = tempdir()?;
        let backups = manager(temp_dir.path(), 1);
        fs::create_dir_all(backups.backup_dir())?;
        fs::write(backups.backup_dir().join("notes.txt"), b"keep me")?;
        fs::write(temp_dir.path().join("memory_db.bin"), b"data")?;

        backups.create_backup()?;
        backups.create_backup()?;

        assert_eq!(backups.list_backups()?.len(), 1);
        assert!(backups.backup_dir().join("notes.txt").exists());
        Ok(())
    }

    #[test]
    fn test_restore_from_missing_copies() -> Result<(), StorageError> {
        let temp_dir = tempdir()?;
        let backups = manager(temp_dir.path(), 5);
        assert_eq!(backups.restore_from_safe_copy()?, None);
        assert_eq!(backups.restore_from_latest_backup()?, None);
        Ok(())
    }
}

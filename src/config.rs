//! Engine configuration with environment overrides.

use crate::storage::compression::CompressionAlgorithm;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
}

/// Configuration for the associative memory engine
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Pause between background snapshots
    pub autosave_interval: Duration,
    /// Size budget for the serialized snapshot, in megabytes
    pub memory_limit_mb: f64,
    /// Fraction of the budget that triggers the size warning
    pub memory_threshold_fraction: f64,
    /// Extra association weight per shared tag
    pub tag_weight: f64,
    /// Recent-signal and active-neuron age cutoff (seconds)
    pub recent_signals_max_age: f64,
    /// Rotating backups kept on disk
    pub max_backups: usize,
    /// Half-life of neuron energy (seconds)
    pub energy_half_life: f64,
    /// Directory holding the snapshot, safe copy and backups
    pub data_dir: PathBuf,
    /// Suppress self-expression output
    pub silent: bool,
    pub compression: CompressionAlgorithm,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            autosave_interval: Duration::from_secs(10),
            memory_limit_mb: 6000.0,
            memory_threshold_fraction: 0.9,
            tag_weight: 2.0,
            recent_signals_max_age: 6000.0, // 100 minutes
            max_backups: 5,
            energy_half_life: 3600.0,
            data_dir: PathBuf::from("."),
            silent: true,
            compression: CompressionAlgorithm::LZ4,
        }
    }
}

impl MemoryConfig {
    /// Defaults overridden by process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<f64, _>(&lookup, "AUTOSAVE_INTERVAL_SECONDS")? {
            if !(secs > 0.0) {
                return Err(ConfigError::NotPositive("AUTOSAVE_INTERVAL_SECONDS"));
            }
            config.autosave_interval =
                Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidValue {
                    name: "AUTOSAVE_INTERVAL_SECONDS",
                    value: lookup("AUTOSAVE_INTERVAL_SECONDS").unwrap_or_default(),
                })?;
        }
        if let Some(v) = parse_var(&lookup, "MEMORY_LIMIT_MB")? {
            config.memory_limit_mb = v;
        }
        if let Some(v) = parse_var(&lookup, "MEMORY_THRESHOLD_FRACTION")? {
            config.memory_threshold_fraction = v;
        }
        if let Some(v) = parse_var(&lookup, "TAG_WEIGHT")? {
            config.tag_weight = v;
        }
        if let Some(v) = parse_var(&lookup, "RECENT_SIGNALS_MAX_AGE_SECONDS")? {
            config.recent_signals_max_age = v;
        }
        if let Some(v) = parse_var(&lookup, "MAX_BACKUPS")? {
            config.max_backups = v;
        }
        if let Some(v) = parse_var(&lookup, "ENERGY_HALF_LIFE_SECONDS")? {
            config.energy_half_life = v;
        }
        if let Some(dir) = lookup("MEMORY_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("MEMORY_SILENT_MODE") {
            config.silent = parse_flag(&raw).ok_or(ConfigError::InvalidValue {
                name: "MEMORY_SILENT_MODE",
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup("MEMORY_COMPRESSION") {
            config.compression = match raw.trim().to_ascii_lowercase().as_str() {
                "lz4" => CompressionAlgorithm::LZ4,
                "none" => CompressionAlgorithm::None,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "MEMORY_COMPRESSION",
                        value: raw,
                    })
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.autosave_interval.is_zero() {
            return Err(ConfigError::NotPositive("AUTOSAVE_INTERVAL_SECONDS"));
        }
        if !(self.energy_half_life > 0.0) {
            return Err(ConfigError::NotPositive("ENERGY_HALF_LIFE_SECONDS"));
        }
        if self.max_backups == 0 {
            return Err(ConfigError::NotPositive("MAX_BACKUPS"));
        }
        Ok(())
    }

    /// Snapshot size above which the autosaver warns, in bytes
    pub fn memory_limit_bytes(&self) -> f64 {
        self.memory_limit_mb * self.memory_threshold_fraction * 1024.0 * 1024.0
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

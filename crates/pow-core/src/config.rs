//! Mining configuration passed explicitly into each search.

use serde::{Deserialize, Serialize};

use crate::difficulty::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use crate::error::{PowError, Result};
use crate::header::MAX_NONCE;

/// Nonces handed to a worker at a time.
pub const DEFAULT_CHUNK_SIZE: u64 = 4096;

/// Configuration for a mining run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Required leading zero bits.
    pub difficulty: u32,
    /// Exclusive upper bound of the nonce search.
    pub max_nonce: u64,
    /// Worker threads for the parallel miner.
    pub workers: usize,
    /// Nonces per work unit in the parallel miner.
    pub chunk_size: u64,
    /// Observer cadence in nonces; `None` disables progress callbacks.
    pub progress_interval: Option<u64>,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_nonce: MAX_NONCE,
            workers: default_workers(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval: None,
        }
    }
}

impl MiningConfig {
    pub fn with_difficulty(mut self, difficulty: u32) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_max_nonce(mut self, max_nonce: u64) -> Self {
        self.max_nonce = max_nonce;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    /// Reject values no search can run with.
    pub fn validate(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(PowError::InvalidDifficulty(self.difficulty));
        }
        check_max_nonce(self.max_nonce)?;
        if self.workers == 0 {
            return Err(PowError::InvalidInput("workers must be at least 1".into()));
        }
        if self.chunk_size == 0 {
            return Err(PowError::InvalidInput("chunk_size must be at least 1".into()));
        }
        if self.progress_interval == Some(0) {
            return Err(PowError::InvalidInput(
                "progress_interval must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn check_max_nonce(max_nonce: u64) -> Result<()> {
    if max_nonce > MAX_NONCE {
        return Err(PowError::InvalidInput(format!(
            "max_nonce {} exceeds the signed 64-bit nonce range",
            max_nonce
        )));
    }
    Ok(())
}

#[cfg(feature = "parallel")]
fn default_workers() -> usize {
    num_cpus::get()
}

#[cfg(not(feature = "parallel"))]
fn default_workers() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mining_config_default() {
        let config = MiningConfig::default();
        assert_eq!(config.difficulty, 16);
        assert_eq!(config.max_nonce, i64::MAX as u64);
        assert!(config.workers > 0);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.progress_interval, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json_fills_defaults() {
        let config: MiningConfig =
            serde_json::from_str(r#"{ "difficulty": 8, "max_nonce": 100000 }"#).unwrap();
        assert_eq!(config.difficulty, 8);
        assert_eq!(config.max_nonce, 100_000);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = MiningConfig::default();

        assert_eq!(
            base.clone().with_difficulty(257).validate(),
            Err(PowError::InvalidDifficulty(257))
        );
        assert!(matches!(
            base.clone().with_max_nonce(u64::MAX).validate(),
            Err(PowError::InvalidInput(_))
        ));
        assert!(matches!(
            base.clone().with_workers(0).validate(),
            Err(PowError::InvalidInput(_))
        ));
        assert!(matches!(
            base.clone().with_chunk_size(0).validate(),
            Err(PowError::InvalidInput(_))
        ));
        assert!(matches!(
            base.with_progress_interval(0).validate(),
            Err(PowError::InvalidInput(_))
        ));
    }
}

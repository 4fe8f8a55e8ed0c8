//! Independent verification of claimed solutions.

use crate::config::MiningConfig;
use crate::difficulty::{derive_target, hash_meets_target, Target};
use crate::error::{PowError, Result};
use crate::hash::Digest;
use crate::header::{HeaderFields, MAX_NONCE};
use crate::miner::{Miner, ProgressObserver, Solution};

/// Whether `nonce` solves `header` for `target`.
///
/// Uses the same encoding and strict comparison as the miner, so it is
/// true exactly when the miner would have stopped at `nonce`. Nonces above
/// [`MAX_NONCE`] are never searched and never valid.
pub fn validate(header: &HeaderFields, nonce: u64, target: &Target) -> bool {
    nonce <= MAX_NONCE && hash_meets_target(&header.hash(nonce), target)
}

/// A header bound to the target derived from its own difficulty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOfWork {
    header: HeaderFields,
    target: Target,
}

impl ProofOfWork {
    /// Bind `header` to its target; fails on an out-of-range difficulty.
    pub fn new(header: HeaderFields) -> Result<Self> {
        let target = derive_target(header.difficulty)?;
        Ok(ProofOfWork { header, target })
    }

    /// Build a header stamped with the configured difficulty.
    pub fn build(
        prev_block_hash: Option<Digest>,
        content_hash: Digest,
        timestamp: i64,
        config: &MiningConfig,
    ) -> Result<Self> {
        Self::new(HeaderFields {
            prev_block_hash,
            content_hash,
            timestamp,
            difficulty: config.difficulty,
        })
    }

    pub fn header(&self) -> &HeaderFields {
        &self.header
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Mine sequentially up to `config.max_nonce`.
    pub fn run(&self, config: &MiningConfig) -> Result<Solution> {
        config.validate()?;
        Miner::new(&self.header, self.target, config.max_nonce)?.run()
    }

    /// Mine sequentially, reporting to `observer` every
    /// `config.progress_interval` nonces.
    pub fn run_with_observer<'o, O>(&self, config: &MiningConfig, observer: O) -> Result<Solution>
    where
        O: ProgressObserver + 'o,
    {
        config.validate()?;
        let miner = Miner::new(&self.header, self.target, config.max_nonce)?;
        match config.progress_interval {
            Some(interval) => miner.with_observer(interval, observer)?.run(),
            None => miner.run(),
        }
    }

    /// Mine across `config.workers` threads.
    #[cfg(feature = "parallel")]
    pub fn run_parallel(&self, config: &MiningConfig) -> Result<Solution> {
        crate::parallel::ParallelMiner::new(config.clone())?.mine(&self.header, &self.target)
    }

    /// Check a claimed nonce against this header's target.
    pub fn validate(&self, nonce: u64) -> bool {
        validate(&self.header, nonce, &self.target)
    }

    /// Check a claimed solution, including that its digest is the real one.
    pub fn verify_solution(&self, solution: &Solution) -> Result<()> {
        if solution.nonce > MAX_NONCE {
            return Err(PowError::InvalidInput(format!(
                "nonce {} exceeds the signed 64-bit nonce range",
                solution.nonce
            )));
        }
        let hash = self.header.hash(solution.nonce);
        if hash != solution.hash {
            return Err(PowError::InvalidInput(format!(
                "digest for nonce {} does not match the header",
                solution.nonce
            )));
        }
        if !hash_meets_target(&hash, &self.target) {
            return Err(PowError::InvalidInput(format!(
                "nonce {} does not meet difficulty {}",
                solution.nonce,
                self.target.difficulty()
            )));
        }
        Ok(())
    }
}

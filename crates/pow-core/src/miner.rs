//! Sequential nonce search.
//!
//! Nonces are tried in ascending order from `0` while `nonce < max_nonce`;
//! the first digest strictly below the target wins.

use crate::config::check_max_nonce;
use crate::difficulty::{hash_meets_target, Target};
use crate::error::{PowError, Result};
use crate::hash::{count_leading_zeros, hash_to_hex, Digest};
use crate::header::{HeaderEncoder, HeaderFields, MAX_NONCE};

/// A nonce that satisfies the target, with its digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// The winning nonce.
    pub nonce: u64,
    /// Digest of the header with `nonce`.
    pub hash: Digest,
    /// Number of nonces hashed to find it.
    pub attempts: u64,
}

impl Solution {
    /// Hex form of the winning digest.
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }

    /// Leading zero bits of the winning digest; at least the difficulty.
    pub fn leading_zeros(&self) -> u32 {
        count_leading_zeros(&self.hash)
    }
}

/// Receives periodic progress from a running search.
///
/// Called with the current nonce and the lowest digest seen so far. Has no
/// influence on the search result.
pub trait ProgressObserver {
    fn on_progress(&mut self, nonce: u64, best_hash: &Digest);
}

impl<F> ProgressObserver for F
where
    F: FnMut(u64, &Digest),
{
    fn on_progress(&mut self, nonce: u64, best_hash: &Digest) {
        self(nonce, best_hash)
    }
}

/// Where a [`Miner`] is in its search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiningState {
    /// Still scanning; `next_nonce` is the next candidate.
    Searching { next_nonce: u64 },
    /// A nonce met the target. Terminal.
    Found(Solution),
    /// Every nonce below the bound failed. Terminal.
    Exhausted,
}

impl MiningState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MiningState::Searching { .. })
    }
}

struct Progress<'o> {
    interval: u64,
    best: Option<Digest>,
    observer: Box<dyn ProgressObserver + 'o>,
}

/// A single search over `0..max_nonce` for one header and target.
pub struct Miner<'o> {
    encoder: HeaderEncoder,
    target: Target,
    max_nonce: u64,
    state: MiningState,
    progress: Option<Progress<'o>>,
}

impl<'o> Miner<'o> {
    /// Start a fresh search.
    pub fn new(header: &HeaderFields, target: Target, max_nonce: u64) -> Result<Self> {
        check_max_nonce(max_nonce)?;
        Ok(Miner {
            encoder: HeaderEncoder::new(header),
            target,
            max_nonce,
            state: MiningState::Searching { next_nonce: 0 },
            progress: None,
        })
    }

    /// Report progress to `observer` whenever `nonce % interval == 0`.
    pub fn with_observer<O>(mut self, interval: u64, observer: O) -> Result<Self>
    where
        O: ProgressObserver + 'o,
    {
        if interval == 0 {
            return Err(PowError::InvalidInput(
                "progress interval must be at least 1".into(),
            ));
        }
        self.progress = Some(Progress {
            interval,
            best: None,
            observer: Box::new(observer),
        });
        Ok(self)
    }

    pub fn state(&self) -> &MiningState {
        &self.state
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Try one nonce. Does nothing once the state is terminal.
    pub fn step(&mut self) -> &MiningState {
        let nonce = match self.state {
            MiningState::Searching { next_nonce } => next_nonce,
            _ => return &self.state,
        };

        if nonce >= self.max_nonce {
            self.state = MiningState::Exhausted;
            return &self.state;
        }

        let hash = self.encoder.hash(nonce);

        if let Some(progress) = self.progress.as_mut() {
            if progress.best.map_or(true, |best| hash < best) {
                progress.best = Some(hash);
            }
            if nonce % progress.interval == 0 {
                if let Some(best) = progress.best.as_ref() {
                    progress.observer.on_progress(nonce, best);
                }
            }
        }

        self.state = if hash_meets_target(&hash, &self.target) {
            MiningState::Found(Solution {
                nonce,
                hash,
                attempts: nonce + 1,
            })
        } else {
            MiningState::Searching {
                next_nonce: nonce + 1,
            }
        };
        &self.state
    }

    /// Run until the search ends.
    pub fn run(mut self) -> Result<Solution> {
        log::debug!(
            "Mining with target {} (difficulty {}) below nonce {}",
            self.target,
            self.target.difficulty(),
            self.max_nonce
        );

        while !self.step().is_terminal() {}

        match self.state {
            MiningState::Found(solution) => {
                log::debug!(
                    "Found nonce {} after {} attempts: {}",
                    solution.nonce,
                    solution.attempts,
                    solution.hash_hex()
                );
                Ok(solution)
            }
            _ => {
                log::debug!("No solution below nonce {}", self.max_nonce);
                Err(PowError::SearchExhausted {
                    max_nonce: self.max_nonce,
                })
            }
        }
    }
}

/// Find the first nonce in `0..max_nonce` whose digest is below `target`.
///
/// Fails with [`PowError::SearchExhausted`] if none is found, including
/// when `max_nonce` is `0`.
pub fn mine(header: &HeaderFields, target: &Target, max_nonce: u64) -> Result<Solution> {
    Miner::new(header, *target, max_nonce)?.run()
}

/// Scan the half-open range `start..end` for the first winning nonce.
///
/// `attempts` counts nonces hashed within the range. `end` is capped at
/// `MAX_NONCE + 1`; nonces past the signed 64-bit range are never tried.
pub fn mine_range(
    header: &HeaderFields,
    target: &Target,
    start: u64,
    end: u64,
) -> Option<Solution> {
    let end = end.min(MAX_NONCE + 1);
    let mut encoder = HeaderEncoder::new(header);
    scan_range(&mut encoder, target, start, end, |_| true).map(|(nonce, hash)| Solution {
        nonce,
        hash,
        attempts: nonce - start + 1,
    })
}

/// Core loop shared with the parallel workers.
///
/// `keep_going` is consulted before each nonce; returning `false` stops
/// the scan without a result.
pub(crate) fn scan_range<F>(
    encoder: &mut HeaderEncoder,
    target: &Target,
    start: u64,
    end: u64,
    mut keep_going: F,
) -> Option<(u64, Digest)>
where
    F: FnMut(u64) -> bool,
{
    for nonce in start..end {
        if !keep_going(nonce) {
            return None;
        }
        let hash = encoder.hash(nonce);
        if hash_meets_target(&hash, target) {
            return Some((nonce, hash));
        }
    }
    None
}

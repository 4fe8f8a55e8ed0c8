//! Multithreaded nonce search.
//!
//! The range `0..max_nonce` is cut into `chunk_size` pieces handed out in
//! ascending order from a shared cursor. A worker that finds a solution
//! lowers the shared best nonce; nobody scans at or above it afterwards.
//! Every chunk below the final best nonce was claimed and scanned up to
//! it, so the result equals the sequential search over the same range.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crate::config::MiningConfig;
use crate::difficulty::Target;
use crate::error::{PowError, Result};
use crate::header::{HeaderEncoder, HeaderFields};
use crate::miner::{scan_range, Solution};

/// Sentinel for "no solution yet"; above any valid nonce.
const NOT_FOUND: u64 = u64::MAX;

/// State shared by the workers of one search.
struct SearchState<'a> {
    target: &'a Target,
    max_nonce: u64,
    chunk_size: u64,
    next_chunk: AtomicU64,
    best_nonce: AtomicU64,
    hashes: AtomicU64,
    cancel: Option<&'a AtomicBool>,
}

impl SearchState<'_> {
    fn cancelled(&self) -> bool {
        self.cancel.map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    /// Claim the next chunk, or `None` once the range is handed out.
    fn claim_chunk(&self) -> Option<(u64, u64)> {
        let max_nonce = self.max_nonce;
        let chunk_size = self.chunk_size;
        self.next_chunk
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |start| {
                (start < max_nonce).then(|| start.saturating_add(chunk_size).min(max_nonce))
            })
            .ok()
            .map(|start| (start, start.saturating_add(chunk_size).min(max_nonce)))
    }
}

/// Searches one header across several worker threads.
#[derive(Debug, Clone)]
pub struct ParallelMiner {
    config: MiningConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl ParallelMiner {
    /// Create a miner; the configuration is validated up front.
    pub fn new(config: MiningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: None,
        })
    }

    /// Stop the search when `flag` becomes true.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// Number of threads a search over the configured range will use.
    pub fn worker_count(&self) -> usize {
        let max_nonce = self.config.max_nonce;
        if max_nonce == 0 {
            return 0;
        }
        let chunks = (max_nonce - 1) / self.config.chunk_size + 1;
        (self.config.workers as u64).min(chunks) as usize
    }

    /// Find the lowest nonce in `0..max_nonce` meeting `target`.
    ///
    /// `attempts` in the result counts hashes across all workers.
    pub fn mine(&self, header: &HeaderFields, target: &Target) -> Result<Solution> {
        let max_nonce = self.config.max_nonce;
        let workers = self.worker_count();
        if workers == 0 {
            return Err(PowError::SearchExhausted { max_nonce });
        }

        log::debug!(
            "Mining with {} workers, target {} below nonce {} in chunks of {}",
            workers,
            target,
            max_nonce,
            self.config.chunk_size
        );

        let state = SearchState {
            target,
            max_nonce,
            chunk_size: self.config.chunk_size,
            next_chunk: AtomicU64::new(0),
            best_nonce: AtomicU64::new(NOT_FOUND),
            hashes: AtomicU64::new(0),
            cancel: self.cancel.as_deref(),
        };
        let encoder = HeaderEncoder::new(header);

        let failed = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|id| {
                    let state = &state;
                    let encoder = encoder.clone();
                    scope.spawn(move || run_worker(id, encoder, state))
                })
                .collect();

            let mut failed = None;
            for (id, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() {
                    log::warn!("Mining worker {} panicked", id);
                    failed.get_or_insert(id);
                }
            }
            failed
        });

        if let Some(worker) = failed {
            return Err(PowError::WorkerFailed { worker });
        }

        let best = state.best_nonce.load(Ordering::SeqCst);
        let attempts = state.hashes.load(Ordering::SeqCst);
        if best == NOT_FOUND {
            if state.cancelled() {
                log::debug!("Search cancelled after {} hashes", attempts);
                return Err(PowError::Cancelled);
            }
            log::debug!("No solution below nonce {}", max_nonce);
            return Err(PowError::SearchExhausted { max_nonce });
        }

        let solution = Solution {
            nonce: best,
            hash: header.hash(best),
            attempts,
        };
        log::debug!(
            "Found nonce {} after {} hashes: {}",
            solution.nonce,
            solution.attempts,
            solution.hash_hex()
        );
        Ok(solution)
    }
}

fn run_worker(id: usize, mut encoder: HeaderEncoder, state: &SearchState<'_>) {
    let mut hashed = 0u64;

    while !state.cancelled() {
        let Some((start, end)) = state.claim_chunk() else {
            break;
        };
        if start >= state.best_nonce.load(Ordering::SeqCst) {
            break;
        }
        log::trace!("Worker {} scanning nonces {}..{}", id, start, end);

        let found = scan_range(&mut encoder, state.target, start, end, |nonce| {
            let go = nonce < state.best_nonce.load(Ordering::Relaxed) && !state.cancelled();
            if go {
                hashed += 1;
            }
            go
        });

        if let Some((nonce, _)) = found {
            log::trace!("Worker {} found nonce {}", id, nonce);
            state.best_nonce.fetch_min(nonce, Ordering::SeqCst);
        }
    }

    state.hashes.fetch_add(hashed, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::derive_target;
    use crate::miner::mine;
    use crate::validator::validate;
    use std::time::{Duration, Instant};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn config(workers: usize, chunk_size: u64, max_nonce: u64) -> MiningConfig {
        MiningConfig::default()
            .with_workers(workers)
            .with_chunk_size(chunk_size)
            .with_max_nonce(max_nonce)
    }

    #[test]
    fn test_parallel_matches_sequential() {
        init_logger();
        let header = HeaderFields::new([0x5E; 32], [0xC0; 32], 1_700_000_000, 10);
        let target = derive_target(10).unwrap();
        let sequential = mine(&header, &target, 1_000_000).unwrap();

        for (workers, chunk) in [(1, 1), (2, 7), (4, 64), (8, 1000), (3, 1_000_000)] {
            let miner = ParallelMiner::new(config(workers, chunk, 1_000_000)).unwrap();
            let parallel = miner.mine(&header, &target).unwrap();
            assert_eq!(parallel.nonce, sequential.nonce, "{} workers, chunk {}", workers, chunk);
            assert_eq!(parallel.hash, sequential.hash);
            assert!(validate(&header, parallel.nonce, &target));
        }
    }

    #[test]
    fn test_parallel_zero_header_difficulty_4() {
        let header = HeaderFields::new([0u8; 32], [0u8; 32], 0, 4);
        let target = derive_target(4).unwrap();
        let sequential = mine(&header, &target, 100_000).unwrap();

        let miner = ParallelMiner::new(config(4, 16, 100_000)).unwrap();
        let parallel = miner.mine(&header, &target).unwrap();
        assert_eq!(parallel.nonce, sequential.nonce);
    }

    #[test]
    fn test_parallel_exhaustion() {
        let header = HeaderFields::genesis([0x01; 32], 0, 256);
        let target = derive_target(256).unwrap();

        let miner = ParallelMiner::new(config(4, 10, 1000)).unwrap();
        assert_eq!(
            miner.mine(&header, &target),
            Err(PowError::SearchExhausted { max_nonce: 1000 })
        );

        let miner = ParallelMiner::new(config(4, 10, 0)).unwrap();
        assert_eq!(miner.worker_count(), 0);
        assert_eq!(
            miner.mine(&header, &derive_target(0).unwrap()),
            Err(PowError::SearchExhausted { max_nonce: 0 })
        );
    }

    #[test]
    fn test_parallel_respects_max_nonce() {
        let header = HeaderFields::new([0x5E; 32], [0xC0; 32], 1_700_000_000, 10);
        let target = derive_target(10).unwrap();
        let sequential = mine(&header, &target, 1_000_000).unwrap();

        // Stop exactly at the winning nonce: it must not be reported.
        let miner = ParallelMiner::new(config(4, 3, sequential.nonce)).unwrap();
        match miner.mine(&header, &target) {
            Err(PowError::SearchExhausted { max_nonce }) => assert_eq!(max_nonce, sequential.nonce),
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn test_pre_cancelled_search() {
        let header = HeaderFields::genesis([0x01; 32], 0, 256);
        let target = derive_target(256).unwrap();
        let flag = Arc::new(AtomicBool::new(true));

        let miner = ParallelMiner::new(config(2, 100, 1_000_000))
            .unwrap()
            .with_cancel_flag(flag);
        assert_eq!(miner.mine(&header, &target), Err(PowError::Cancelled));
    }

    #[test]
    fn test_cancel_during_search() {
        init_logger();
        let header = HeaderFields::genesis([0x01; 32], 0, 256);
        let target = derive_target(256).unwrap();
        let flag = Arc::new(AtomicBool::new(false));

        let miner = ParallelMiner::new(config(2, 4096, crate::MAX_NONCE))
            .unwrap()
            .with_cancel_flag(Arc::clone(&flag));

        let started = Instant::now();
        let raiser = {
            let flag = Arc::clone(&flag);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                flag.store(true, Ordering::Relaxed);
            })
        };

        let result = miner.mine(&header, &target);
        raiser.join().unwrap();

        assert_eq!(result, Err(PowError::Cancelled));
        assert!(
            started.elapsed() < Duration::from_secs(10),
            "search took {:?} to stop",
            started.elapsed()
        );
    }

    #[test]
    fn test_worker_count_is_capped_by_chunks() {
        assert_eq!(ParallelMiner::new(config(8, 10, 25)).unwrap().worker_count(), 3);
        assert_eq!(ParallelMiner::new(config(2, 10, 25)).unwrap().worker_count(), 2);
        assert_eq!(ParallelMiner::new(config(8, 10, 1)).unwrap().worker_count(), 1);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(matches!(
            ParallelMiner::new(config(0, 10, 100)),
            Err(PowError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_proof_of_work_run_parallel() {
        let config = config(4, 256, 1_000_000).with_difficulty(8);
        let pow = crate::ProofOfWork::build(Some([0x42; 32]), [0x24; 32], 5, &config).unwrap();
        let parallel = pow.run_parallel(&config).unwrap();
        let sequential = pow.run(&config).unwrap();
        assert_eq!(parallel.nonce, sequential.nonce);
        assert!(pow.validate(parallel.nonce));
    }
}

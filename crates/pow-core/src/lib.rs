//! Hashcash-style proof-of-work core.
//!
//! This crate provides pure Rust implementations of:
//! - Difficulty to target conversion (`2^(256 - difficulty)`)
//! - Canonical header encoding for digesting
//! - Sequential and multithreaded nonce search
//! - Validation of claimed solutions
//!
//! Block assembly, storage and transaction handling belong to the caller,
//! which supplies [`HeaderFields`] and consumes the mined [`Solution`].

pub mod config;
pub mod difficulty;
pub mod error;
pub mod hash;
pub mod header;
pub mod miner;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod validator;

pub use config::MiningConfig;
pub use difficulty::{derive_target, hash_meets_target, Target, DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
pub use error::{PowError, Result};
pub use hash::{sha256, Digest};
pub use header::{HeaderEncoder, HeaderFields, MAX_NONCE};
pub use miner::{mine, mine_range, Miner, MiningState, ProgressObserver, Solution};
#[cfg(feature = "parallel")]
pub use parallel::ParallelMiner;
pub use validator::{validate, ProofOfWork};

//! Error types for target derivation, mining and header parsing.

use thiserror::Error;

/// Errors produced by the proof-of-work core.
///
/// A nonce that simply fails the target is not an error: validation
/// reports it as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowError {
    /// Difficulty outside `0..=256`.
    #[error("invalid difficulty {0}: must be between 0 and 256 leading zero bits")]
    InvalidDifficulty(u32),

    /// Every nonce below `max_nonce` was tried without meeting the target.
    #[error("nonce space exhausted: no solution below max nonce {max_nonce}")]
    SearchExhausted { max_nonce: u64 },

    /// Malformed header fields or configuration values.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A parallel worker thread panicked; its share of the range is unscanned.
    #[error("mining worker {worker} panicked")]
    WorkerFailed { worker: usize },

    /// The caller's cancellation flag was raised before a solution was found.
    #[error("search cancelled before a solution was found")]
    Cancelled,
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, PowError>;

//! Difficulty to target conversion and the target comparison rule.
//!
//! A difficulty of `d` asks for `d` leading zero bits in the digest, which is
//! the same as requiring `digest < 2^(256 - d)`. The target needs 257 bits
//! when `d == 0`, so it is kept as a 512-bit integer.

use core::fmt;

use primitive_types::U512;

use crate::error::{PowError, Result};
use crate::hash::{digest_to_u512, Digest};

/// Difficulty used when the caller does not configure one.
pub const DEFAULT_DIFFICULTY: u32 = 16;

/// Highest meaningful difficulty: the digest width in bits.
pub const MAX_DIFFICULTY: u32 = 256;

/// Byte length of [`Target::to_be_bytes`]; `2^256` needs 33 bytes.
pub const TARGET_BYTES: usize = 33;

/// Threshold a digest must fall strictly below.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target {
    value: U512,
    difficulty: u32,
}

impl Target {
    /// Derive the target `2^(256 - difficulty)`.
    pub fn from_difficulty(difficulty: u32) -> Result<Self> {
        if difficulty > MAX_DIFFICULTY {
            return Err(PowError::InvalidDifficulty(difficulty));
        }
        let shift = (MAX_DIFFICULTY - difficulty) as usize;
        Ok(Target {
            value: U512::one() << shift,
            difficulty,
        })
    }

    /// The difficulty this target was derived from.
    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// The threshold as an integer.
    pub fn as_u512(&self) -> U512 {
        self.value
    }

    /// Whether `digest` read as a big-endian integer is strictly below this target.
    #[inline]
    pub fn is_met_by(&self, digest: &Digest) -> bool {
        digest_to_u512(digest) < self.value
    }

    /// Big-endian bytes of the threshold, 33 bytes wide.
    pub fn to_be_bytes(&self) -> [u8; TARGET_BYTES] {
        let mut wide = [0u8; 64];
        self.value.to_big_endian(&mut wide);
        let mut out = [0u8; TARGET_BYTES];
        out.copy_from_slice(&wide[64 - TARGET_BYTES..]);
        out
    }
}

impl Default for Target {
    fn default() -> Self {
        Target {
            value: U512::one() << ((MAX_DIFFICULTY - DEFAULT_DIFFICULTY) as usize),
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_be_bytes()))
    }
}

/// Convert a difficulty into its target threshold.
///
/// Fails with [`PowError::InvalidDifficulty`] above 256.
pub fn derive_target(difficulty: u32) -> Result<Target> {
    Target::from_difficulty(difficulty)
}

/// Check if a digest meets the target (digest < target, strictly).
///
/// Mining and validation both decide through this function.
#[inline]
pub fn hash_meets_target(digest: &Digest, target: &Target) -> bool {
    target.is_met_by(digest)
}

//! Header fields and their canonical byte encoding.
//!
//! Layout, no separators:
//!
//! | field               | bytes   | encoding          |
//! |---------------------|---------|-------------------|
//! | previous digest     | 0 or 32 | raw               |
//! | content digest      | 32      | raw               |
//! | timestamp           | 8       | big-endian `i64`  |
//! | difficulty          | 8       | big-endian `i64`  |
//! | nonce               | 8       | big-endian `i64`  |

use serde::{Deserialize, Serialize};

use crate::error::{PowError, Result};
use crate::hash::{sha256, Digest, DIGEST_SIZE};

/// Width of each integer field in the encoding.
pub const INT_FIELD_SIZE: usize = 8;

/// Largest nonce that fits the signed 64-bit nonce field.
pub const MAX_NONCE: u64 = i64::MAX as u64;

/// Header content supplied by the block builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFields {
    /// Digest of the previous block; `None` for a genesis header.
    pub prev_block_hash: Option<Digest>,
    /// Opaque digest summarizing the block payload.
    pub content_hash: Digest,
    /// Block timestamp (Unix seconds).
    pub timestamp: i64,
    /// Required leading zero bits.
    pub difficulty: u32,
}

impl HeaderFields {
    /// Create header fields from typed digests.
    pub fn new(
        prev_block_hash: Digest,
        content_hash: Digest,
        timestamp: i64,
        difficulty: u32,
    ) -> Self {
        HeaderFields {
            prev_block_hash: Some(prev_block_hash),
            content_hash,
            timestamp,
            difficulty,
        }
    }

    /// Header of a block with no predecessor.
    pub fn genesis(content_hash: Digest, timestamp: i64, difficulty: u32) -> Self {
        HeaderFields {
            prev_block_hash: None,
            content_hash,
            timestamp,
            difficulty,
        }
    }

    /// Build header fields from raw byte slices.
    ///
    /// `prev_block_hash` must be empty (genesis) or 32 bytes, and
    /// `content_hash` must be 32 bytes.
    pub fn from_slices(
        prev_block_hash: &[u8],
        content_hash: &[u8],
        timestamp: i64,
        difficulty: u32,
    ) -> Result<Self> {
        let prev_block_hash = match prev_block_hash.len() {
            0 => None,
            DIGEST_SIZE => Some(to_digest(prev_block_hash)),
            n => {
                return Err(PowError::InvalidInput(format!(
                    "previous block digest must be 0 or {} bytes, got {}",
                    DIGEST_SIZE, n
                )))
            }
        };

        if content_hash.len() != DIGEST_SIZE {
            return Err(PowError::InvalidInput(format!(
                "content digest must be {} bytes, got {}",
                DIGEST_SIZE,
                content_hash.len()
            )));
        }

        Ok(HeaderFields {
            prev_block_hash,
            content_hash: to_digest(content_hash),
            timestamp,
            difficulty,
        })
    }

    /// Build header fields from hex-encoded digests.
    pub fn from_hex(
        prev_block_hash_hex: &str,
        content_hash_hex: &str,
        timestamp: i64,
        difficulty: u32,
    ) -> Result<Self> {
        let prev = hex::decode(prev_block_hash_hex).map_err(|e| {
            PowError::InvalidInput(format!("previous block digest is not hex: {}", e))
        })?;
        let content = hex::decode(content_hash_hex)
            .map_err(|e| PowError::InvalidInput(format!("content digest is not hex: {}", e)))?;
        Self::from_slices(&prev, &content, timestamp, difficulty)
    }

    /// Length of the encoding without the trailing nonce.
    pub fn prefix_len(&self) -> usize {
        let prev = if self.prev_block_hash.is_some() { DIGEST_SIZE } else { 0 };
        prev + DIGEST_SIZE + 2 * INT_FIELD_SIZE
    }

    /// Length of the full encoding.
    pub fn encoded_len(&self) -> usize {
        self.prefix_len() + INT_FIELD_SIZE
    }

    /// Serialize the header without the nonce.
    /// Used for efficient mining where only the nonce changes.
    pub fn encode_without_nonce(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        if let Some(prev) = &self.prev_block_hash {
            out.extend_from_slice(prev);
        }
        out.extend_from_slice(&self.content_hash);
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&i64::from(self.difficulty).to_be_bytes());
        out
    }

    /// Canonical bytes of the header with `nonce`.
    pub fn encode(&self, nonce: u64) -> Vec<u8> {
        let mut out = self.encode_without_nonce();
        out.extend_from_slice(&nonce.to_be_bytes());
        out
    }

    /// Digest of the header with `nonce`.
    pub fn hash(&self, nonce: u64) -> Digest {
        sha256(&self.encode(nonce))
    }
}

fn to_digest(bytes: &[u8]) -> Digest {
    let mut digest = [0u8; DIGEST_SIZE];
    digest.copy_from_slice(bytes);
    digest
}

/// Reusable encoding buffer for a fixed header.
///
/// Holds the nonce-less prefix once and rewrites only the trailing nonce
/// bytes per attempt. Produces the same bytes as [`HeaderFields::encode`].
#[derive(Debug, Clone)]
pub struct HeaderEncoder {
    buf: Vec<u8>,
    nonce_offset: usize,
}

impl HeaderEncoder {
    /// Prepare an encoder for `header`.
    pub fn new(header: &HeaderFields) -> Self {
        let mut buf = header.encode_without_nonce();
        let nonce_offset = buf.len();
        buf.extend_from_slice(&[0u8; INT_FIELD_SIZE]);
        HeaderEncoder { buf, nonce_offset }
    }

    /// Encoded bytes for `nonce`.
    #[inline]
    pub fn with_nonce(&mut self, nonce: u64) -> &[u8] {
        self.buf[self.nonce_offset..].copy_from_slice(&nonce.to_be_bytes());
        &self.buf
    }

    /// Digest of the header with `nonce`.
    #[inline]
    pub fn hash(&mut self, nonce: u64) -> Digest {
        sha256(self.with_nonce(nonce))
    }
}

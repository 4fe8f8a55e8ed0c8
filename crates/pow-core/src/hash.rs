//! SHA-256 digests and their integer view.

use primitive_types::U512;
use sha2::{Digest as _, Sha256};

/// Size of a digest in bytes.
pub const DIGEST_SIZE: usize = 32;

/// A SHA-256 output, read as a big-endian unsigned integer when compared.
pub type Digest = [u8; DIGEST_SIZE];

/// Single SHA-256 hash.
#[inline]
pub fn sha256(data: &[u8]) -> Digest {
    let hash = Sha256::digest(data);
    let mut result = [0u8; DIGEST_SIZE];
    result.copy_from_slice(&hash);
    result
}

/// Interpret a digest as a big-endian unsigned integer.
///
/// Widened to 512 bits so it can be compared against a target of `2^256`.
#[inline]
pub fn digest_to_u512(digest: &Digest) -> U512 {
    U512::from_big_endian(digest)
}

/// Hex form of a digest, most significant byte first.
pub fn hash_to_hex(digest: &Digest) -> String {
    hex::encode(digest)
}

/// Count leading zero bits of a digest in big-endian order.
pub fn count_leading_zeros(digest: &Digest) -> u32 {
    let mut zeros = 0u32;
    for byte in digest.iter() {
        if *byte == 0 {
            zeros += 8;
        } else {
            zeros += byte.leading_zeros();
            break;
        }
    }
    zeros
}

//! Hashing utilities.
//!
//! Every hash in the protocol is SHA3-256 over a plain concatenation of its
//! inputs. Domain separators are appended as the last input:
//!
//! ```text
//! h     = SHA3-256(S)
//! tweak = SHA3-256(h || "claw-stealth-v1") mod ℓ
//! K     = SHA3-256(S || "claw-encrypt-v1")
//! ```

use sha3::{Digest, Sha3_256};

use claw_core::constants::HASH_SIZE;

/// Computes SHA3-256 of a single input.
pub fn sha3_256(input: &[u8]) -> [u8; HASH_SIZE] {
    Sha3_256::digest(input).into()
}

/// Computes SHA3-256 over the concatenation of `inputs`, in order.
///
/// No length prefixes are added; callers rely on fixed-size inputs.
pub fn sha3_256_concat(inputs: &[&[u8]]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha3_256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

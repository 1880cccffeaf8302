//! Keccak-256 MAC for keystore integrity verification
//!
//! The MAC is computed over: derived_key[16..32] || ciphertext
//! This binds the tag both to the password-derived key and to the exact
//! ciphertext, so a wrong password and a tampered file fail the same way.
//! The split point and the concatenation order are fixed by the file format.

use alloy_primitives::keccak256;
use zeroize::Zeroize;

use super::error::{KeystoreError, KeystoreResult};

/// MAC length in bytes
pub const MAC_LENGTH: usize = 32;

/// Derived key range used as MAC key
const MAC_KEY_RANGE: std::ops::Range<usize> = 16..32;

/// Compute MAC over derived_key[16..32] || ciphertext
///
/// # Arguments
///
/// * `derived_key` - Key derived from the password, at least 32 bytes
/// * `ciphertext` - The encrypted secret
pub fn compute_mac(derived_key: &[u8], ciphertext: &[u8]) -> KeystoreResult<[u8; MAC_LENGTH]> {
    if derived_key.len() < MAC_KEY_RANGE.end {
        return Err(KeystoreError::InvalidKdfParams(format!(
            "derived key must be at least {} bytes, got {}",
            MAC_KEY_RANGE.end,
            derived_key.len()
        )));
    }

    let mut preimage = Vec::with_capacity(MAC_KEY_RANGE.len() + ciphertext.len());
    preimage.extend_from_slice(&derived_key[MAC_KEY_RANGE]);
    preimage.extend_from_slice(ciphertext);
    let mac = keccak256(&preimage).0;

    // preimage holds half of the derived key
    preimage.zeroize();

    Ok(mac)
}

/// Verify a stored MAC
///
/// # Returns
///
/// `Ok(())` if the MAC matches, `Err(InvalidPassword)` otherwise
pub fn verify_mac(derived_key: &[u8], ciphertext: &[u8], expected: &[u8]) -> KeystoreResult<()> {
    let computed = compute_mac(derived_key, ciphertext)?;

    if constant_time_eq(&computed, expected) {
        Ok(())
    } else {
        Err(KeystoreError::InvalidPassword)
    }
}

/// Constant-time comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

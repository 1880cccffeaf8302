//! Address derivation capability
//!
//! Computing the address of a private key needs elliptic-curve arithmetic,
//! which the keystore does not do itself. Callers pass an [`AddressDeriver`]
//! explicitly; [`Secp256k1AddressDeriver`] is the EVM implementation and
//! tests can substitute a closure.

use alloy_primitives::keccak256;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use walletvault_types::Address;

use crate::keystore::{KeystoreError, KeystoreResult, PRIVATE_KEY_LENGTH};

/// Maps a raw private key to its account address
pub trait AddressDeriver {
    /// Derive the address of `private_key`
    fn derive_address(&self, private_key: &[u8]) -> KeystoreResult<Address>;
}

impl<F> AddressDeriver for F
where
    F: Fn(&[u8]) -> KeystoreResult<Address>,
{
    fn derive_address(&self, private_key: &[u8]) -> KeystoreResult<Address> {
        self(private_key)
    }
}

/// EVM address derivation: keccak256(uncompressed_pubkey[1..])[12..]
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1AddressDeriver;

impl AddressDeriver for Secp256k1AddressDeriver {
    fn derive_address(&self, private_key: &[u8]) -> KeystoreResult<Address> {
        if private_key.len() != PRIVATE_KEY_LENGTH {
            return Err(KeystoreError::InvalidSecretLength {
                expected: PRIVATE_KEY_LENGTH,
                actual: private_key.len(),
            });
        }
        let secret =
            SecretKey::from_slice(private_key).map_err(|_| KeystoreError::InvalidPrivateKey)?;

        let uncompressed = secret.public_key().to_encoded_point(false);
        // Skip the 0x04 prefix byte
        let hash = keccak256(&uncompressed.as_bytes()[1..]);
        Ok(Address::from_slice(&hash[12..])?)
    }
}

//! Key Derivation Function (KDF) dispatch
//!
//! The KDF name and its parameter object are parsed together into a [`Kdf`]
//! variant when the keystore is loaded, so an unknown algorithm is rejected
//! before any password is tried. Only scrypt is supported.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{validate_scrypt_costs, KdfConfig};
use super::error::{KeystoreError, KeystoreResult};
use crate::secure::SecretBytes;

/// Name of the scrypt KDF in keystore files
pub const SCRYPT: &str = "scrypt";

/// scrypt parameters as stored under `kdfparams`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScryptParams {
    /// Derived key length in bytes
    pub dklen: u32,
    /// CPU/memory cost parameter (must be power of 2)
    pub n: u32,
    /// Parallelization parameter
    pub p: u32,
    /// Block size parameter
    pub r: u32,
    /// Salt
    #[serde(with = "super::hex_serde")]
    pub salt: Vec<u8>,
}

impl ScryptParams {
    /// Validate the parameters
    pub fn validate(&self) -> KeystoreResult<()> {
        validate_scrypt_costs(self.n, self.r, self.p, self.dklen)
    }
}

/// Key derivation function with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kdf {
    /// scrypt
    Scrypt(ScryptParams),
}

impl Kdf {
    /// Build a scrypt KDF from a cost profile and a salt
    pub fn scrypt(config: &KdfConfig, salt: Vec<u8>) -> Self {
        Kdf::Scrypt(ScryptParams {
            dklen: config.dklen,
            n: config.n,
            p: config.p,
            r: config.r,
            salt,
        })
    }

    /// Parse the `kdf` name and `kdfparams` object of a keystore
    pub fn from_parts(name: &str, params: serde_json::Value) -> KeystoreResult<Self> {
        match name {
            SCRYPT => {
                let params: ScryptParams = serde_json::from_value(params)
                    .map_err(|e| KeystoreError::InvalidKdfParams(e.to_string()))?;
                params.validate()?;
                Ok(Kdf::Scrypt(params))
            }
            other => Err(KeystoreError::UnsupportedKdf(other.to_string())),
        }
    }

    /// Name written to the `kdf` field
    pub fn name(&self) -> &'static str {
        match self {
            Kdf::Scrypt(_) => SCRYPT,
        }
    }

    /// Parameters written to the `kdfparams` field
    pub fn params_json(&self) -> KeystoreResult<serde_json::Value> {
        match self {
            Kdf::Scrypt(params) => Ok(serde_json::to_value(params)?),
        }
    }

    /// Derived key length in bytes
    pub fn dklen(&self) -> usize {
        match self {
            Kdf::Scrypt(params) => params.dklen as usize,
        }
    }

    /// Derive a key from the given password
    ///
    /// A wrong password still produces a key; it is caught by the MAC check.
    pub fn derive_key(&self, password: &str) -> KeystoreResult<SecretBytes> {
        match self {
            Kdf::Scrypt(params) => scrypt_derive_key(
                password,
                &params.salt,
                params.n,
                params.r,
                params.p,
                params.dklen as usize,
            ),
        }
    }
}

/// Derive a key using scrypt KDF
///
/// # Arguments
///
/// * `password` - User password
/// * `salt` - Salt bytes
/// * `n` - CPU/memory cost parameter (must be power of 2)
/// * `r` - Block size parameter
/// * `p` - Parallelization parameter
/// * `dklen` - Desired key length in bytes
pub fn scrypt_derive_key(
    password: &str,
    salt: &[u8],
    n: u32,
    r: u32,
    p: u32,
    dklen: usize,
) -> KeystoreResult<SecretBytes> {
    if n < 2 || !n.is_power_of_two() {
        return Err(KeystoreError::InvalidKdfParams(format!(
            "n must be a power of 2 greater than 1, got {}",
            n
        )));
    }
    let log_n = n.trailing_zeros() as u8;

    let params = scrypt::Params::new(log_n, r, p, dklen)
        .map_err(|e| KeystoreError::InvalidKdfParams(e.to_string()))?;

    debug!(n, r, p, dklen, "Deriving scrypt key");

    let mut output = vec![0u8; dklen];
    scrypt::scrypt(password.as_bytes(), salt, &params, &mut output)
        .map_err(|e| KeystoreError::KdfError(e.to_string()))?;

    Ok(secrecy::SecretBox::new(Box::new(output)))
}

/// Generate a random salt
pub fn generate_salt<R: RngCore + CryptoRng>(rng: &mut R, len: usize) -> Vec<u8> {
    let mut salt = vec![0u8; len];
    rng.fill_bytes(&mut salt);
    salt
}

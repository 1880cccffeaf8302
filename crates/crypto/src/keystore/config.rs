//! Keystore configuration
//!
//! Scrypt cost profiles and the defaults used when creating new keystores.
//! Both structs deserialize with `#[serde(default)]`, so a host application
//! can embed them in its own config file and override single fields.

use serde::{Deserialize, Serialize};

use super::cipher::CipherKind;
use super::error::{KeystoreError, KeystoreResult};

/// Minimum derived key length: 16 bytes cipher key + 16 bytes MAC key
pub const MIN_DKLEN: u32 = 32;

/// Default salt length in bytes
pub const DEFAULT_SALT_LENGTH: usize = 32;

/// Scrypt cost profile used for newly encrypted keystores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    /// CPU/memory cost (power of two)
    pub n: u32,
    /// Block size
    pub r: u32,
    /// Parallelization
    pub p: u32,
    /// Derived key length in bytes
    pub dklen: u32,
    /// Random salt length in bytes
    pub salt_len: usize,
}

impl KdfConfig {
    /// Standard profile, n = 2^18
    pub const fn standard() -> Self {
        Self {
            n: 262144,
            r: 8,
            p: 1,
            dklen: MIN_DKLEN,
            salt_len: DEFAULT_SALT_LENGTH,
        }
    }

    /// Light profile for constrained devices, n = 2^12
    pub const fn light() -> Self {
        Self {
            n: 4096,
            r: 8,
            p: 6,
            dklen: MIN_DKLEN,
            salt_len: DEFAULT_SALT_LENGTH,
        }
    }

    /// Validate the parameters
    pub fn validate(&self) -> KeystoreResult<()> {
        validate_scrypt_costs(self.n, self.r, self.p, self.dklen)?;
        if self.salt_len == 0 {
            return Err(KeystoreError::InvalidKdfParams(
                "salt length must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Shared scrypt cost validation, used for both config and parsed keystores
pub(crate) fn validate_scrypt_costs(n: u32, r: u32, p: u32, dklen: u32) -> KeystoreResult<()> {
    if dklen < MIN_DKLEN {
        return Err(KeystoreError::InvalidKdfParams(format!(
            "dklen must be at least {}, got {}",
            MIN_DKLEN, dklen
        )));
    }
    if n < 2 || !n.is_power_of_two() {
        return Err(KeystoreError::InvalidKdfParams(format!(
            "n must be a power of 2 greater than 1, got {}",
            n
        )));
    }
    if r == 0 {
        return Err(KeystoreError::InvalidKdfParams(
            "r must be positive".to_string(),
        ));
    }
    if p == 0 {
        return Err(KeystoreError::InvalidKdfParams(
            "p must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Defaults applied by [`KeystoreBuilder`](super::KeystoreBuilder)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystoreConfig {
    /// Scrypt profile
    pub kdf: KdfConfig,
    /// Cipher for new keystores
    pub cipher: CipherKind,
}

//! AES-128 cipher dispatch for keystore encryption
//!
//! Supports AES-128-CTR (any length) and AES-128-CBC without padding, where
//! the input must already be a multiple of the block size. Only the first 16
//! bytes of the derived key are used as the AES key.

use aes::Aes128;
use cipher::block_padding::NoPadding;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::error::{KeystoreError, KeystoreResult};
use crate::secure::SecretBytes;

/// IV (initialization vector) length for AES-128
pub const IV_LENGTH: usize = 16;

/// AES-128 key length
pub const AES_KEY_LENGTH: usize = 16;

/// AES block size
pub const BLOCK_SIZE: usize = 16;

type Aes128Ctr = Ctr128BE<Aes128>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Cipher algorithm without its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CipherKind {
    /// AES-128 in counter mode
    #[default]
    #[serde(rename = "aes-128-ctr")]
    Aes128Ctr,
    /// AES-128 in CBC mode, no padding
    #[serde(rename = "aes-128-cbc")]
    Aes128Cbc,
}

impl CipherKind {
    /// Name used in keystore files
    pub fn name(&self) -> &'static str {
        match self {
            CipherKind::Aes128Ctr => "aes-128-ctr",
            CipherKind::Aes128Cbc => "aes-128-cbc",
        }
    }

    /// Parse a keystore cipher name
    pub fn from_name(name: &str) -> KeystoreResult<Self> {
        match name {
            "aes-128-ctr" => Ok(CipherKind::Aes128Ctr),
            "aes-128-cbc" => Ok(CipherKind::Aes128Cbc),
            other => Err(KeystoreError::UnsupportedCipher(other.to_string())),
        }
    }

    /// Attach an IV
    pub fn with_iv(self, iv: [u8; IV_LENGTH]) -> Cipher {
        match self {
            CipherKind::Aes128Ctr => Cipher::Aes128Ctr { iv },
            CipherKind::Aes128Cbc => Cipher::Aes128Cbc { iv },
        }
    }
}

/// Cipher algorithm with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cipher {
    /// AES-128-CTR
    Aes128Ctr {
        /// Initial counter block
        iv: [u8; IV_LENGTH],
    },
    /// AES-128-CBC
    Aes128Cbc {
        /// Initialization vector
        iv: [u8; IV_LENGTH],
    },
}

impl Cipher {
    /// Parse the `cipher` name and the hex `cipherparams.iv` of a keystore
    pub fn from_parts(name: &str, iv_hex: &str) -> KeystoreResult<Self> {
        let kind = CipherKind::from_name(name)?;
        let digits = iv_hex.strip_prefix("0x").unwrap_or(iv_hex);
        let iv_bytes = hex::decode(digits)
            .map_err(|e| KeystoreError::InvalidCipher(format!("invalid IV hex: {}", e)))?;
        let iv: [u8; IV_LENGTH] = iv_bytes.as_slice().try_into().map_err(|_| {
            KeystoreError::InvalidCipher(format!(
                "IV must be {} bytes, got {}",
                IV_LENGTH,
                iv_bytes.len()
            ))
        })?;
        Ok(kind.with_iv(iv))
    }

    /// Algorithm of this cipher
    pub fn kind(&self) -> CipherKind {
        match self {
            Cipher::Aes128Ctr { .. } => CipherKind::Aes128Ctr,
            Cipher::Aes128Cbc { .. } => CipherKind::Aes128Cbc,
        }
    }

    /// Name used in keystore files
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// IV bytes
    pub fn iv(&self) -> &[u8; IV_LENGTH] {
        match self {
            Cipher::Aes128Ctr { iv } | Cipher::Aes128Cbc { iv } => iv,
        }
    }

    /// Encrypt `plaintext` with the first 16 bytes of `derived_key`
    pub fn encrypt(&self, derived_key: &[u8], plaintext: &[u8]) -> KeystoreResult<Vec<u8>> {
        let key = aes_key(derived_key)?;
        let mut buffer = plaintext.to_vec();

        match self {
            Cipher::Aes128Ctr { iv } => {
                let mut cipher = Aes128Ctr::new(&(*key).into(), &(*iv).into());
                cipher.apply_keystream(&mut buffer);
            }
            Cipher::Aes128Cbc { iv } => {
                check_block_aligned(buffer.len())?;
                let len = buffer.len();
                Aes128CbcEnc::new(&(*key).into(), &(*iv).into())
                    .encrypt_padded_mut::<NoPadding>(&mut buffer, len)
                    .map_err(|e| KeystoreError::InvalidCipher(e.to_string()))?;
            }
        }

        Ok(buffer)
    }

    /// Decrypt `ciphertext` with the first 16 bytes of `derived_key`
    pub fn decrypt(&self, derived_key: &[u8], ciphertext: &[u8]) -> KeystoreResult<SecretBytes> {
        let key = aes_key(derived_key)?;
        let mut buffer = ciphertext.to_vec();

        match self {
            Cipher::Aes128Ctr { iv } => {
                let mut cipher = Aes128Ctr::new(&(*key).into(), &(*iv).into());
                cipher.apply_keystream(&mut buffer);
            }
            Cipher::Aes128Cbc { iv } => {
                check_block_aligned(buffer.len())?;
                Aes128CbcDec::new(&(*key).into(), &(*iv).into())
                    .decrypt_padded_mut::<NoPadding>(&mut buffer)
                    .map_err(|e| KeystoreError::InvalidCipher(e.to_string()))?;
            }
        }

        Ok(secrecy::SecretBox::new(Box::new(buffer)))
    }
}

fn aes_key(derived_key: &[u8]) -> KeystoreResult<Zeroizing<[u8; AES_KEY_LENGTH]>> {
    if derived_key.len() < AES_KEY_LENGTH {
        return Err(KeystoreError::InvalidCipher(format!(
            "key must be at least {} bytes, got {}",
            AES_KEY_LENGTH,
            derived_key.len()
        )));
    }

    let mut key = Zeroizing::new([0u8; AES_KEY_LENGTH]);
    key.copy_from_slice(&derived_key[..AES_KEY_LENGTH]);
    Ok(key)
}

fn check_block_aligned(len: usize) -> KeystoreResult<()> {
    if len % BLOCK_SIZE != 0 {
        return Err(KeystoreError::InvalidCipher(format!(
            "aes-128-cbc input must be a multiple of {} bytes, got {}",
            BLOCK_SIZE, len
        )));
    }
    Ok(())
}

/// Generate a random IV
pub fn generate_iv<R: RngCore + CryptoRng>(rng: &mut R) -> [u8; IV_LENGTH] {
    let mut iv = [0u8; IV_LENGTH];
    rng.fill_bytes(&mut iv);
    iv
}

//! Keystore error types

use thiserror::Error;
use walletvault_types::{AddressError, UnsupportedCoin};

use super::envelope::WalletKind;

/// Errors that can occur during keystore operations
#[derive(Error, Debug)]
pub enum KeystoreError {
    /// MAC verification failed: wrong password or tampered ciphertext
    #[error("invalid password: MAC verification failed")]
    InvalidPassword,

    /// Unsupported KDF function
    #[error("unsupported KDF function: {0}")]
    UnsupportedKdf(String),

    /// Unsupported cipher function
    #[error("unsupported cipher function: {0}")]
    UnsupportedCipher(String),

    /// Coin identifier not in the registry
    #[error(transparent)]
    UnsupportedCoin(#[from] UnsupportedCoin),

    /// Keystore format version other than 3
    #[error("unsupported keystore version: expected 3, got {0}")]
    UnsupportedVersion(u32),

    /// Cipher parameters have the wrong shape (IV length, block alignment, key length)
    #[error("invalid cipher parameters: {0}")]
    InvalidCipher(String),

    /// Mnemonic cannot be stored as ASCII bytes
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Invalid KDF parameters
    #[error("invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    /// Stored MAC has the wrong length
    #[error("invalid MAC: expected {expected} bytes, got {actual}")]
    InvalidMac { expected: usize, actual: usize },

    /// Neither `crypto` nor `Crypto` present in the document
    #[error("keystore has no crypto section")]
    MissingCrypto,

    /// Key derivation failed
    #[error("key derivation failed: {0}")]
    KdfError(String),

    /// Private key is not a valid curve scalar
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// Invalid secret length
    #[error("invalid secret length: expected {expected}, got {actual}")]
    InvalidSecretLength { expected: usize, actual: usize },

    /// Secret was decrypted as the wrong wallet kind
    #[error("wrong wallet kind: keystore holds a {actual}, not a {expected}")]
    WrongWalletKind {
        expected: WalletKind,
        actual: WalletKind,
    },

    /// Account already recorded in the keystore
    #[error("account already exists: {0}")]
    AccountExists(String),

    /// Account not recorded in the keystore
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// Required builder input missing
    #[error("missing keystore input: {0}")]
    MissingInput(&'static str),

    /// Invalid address
    #[error("invalid address: {0}")]
    Address(#[from] AddressError),

    /// Invalid hex encoding
    #[error("invalid hex encoding: {0}")]
    HexError(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl KeystoreError {
    /// Whether asking the user for the password again can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, KeystoreError::InvalidPassword)
    }
}

/// Result type for keystore operations
pub type KeystoreResult<T> = Result<T, KeystoreError>;

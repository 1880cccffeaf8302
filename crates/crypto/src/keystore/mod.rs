//! Version 3 password-encrypted wallet keystore
//!
//! This module stores a raw private key or a mnemonic phrase encrypted in a
//! JSON envelope compatible with the Web3 Secret Storage format:
//!
//! - Password-based key derivation using scrypt
//! - AES-128-CTR or AES-128-CBC symmetric encryption
//! - Keccak-256 MAC over derived_key[16..32] || ciphertext
//! - Wallet metadata: kind, coin, cached address, accounts
//!
//! # Security Properties
//!
//! - Secrets are encrypted at rest with a user password
//! - scrypt makes brute-force attacks expensive
//! - The MAC is checked before decryption; a wrong password and a tampered
//!   file both surface as [`KeystoreError::InvalidPassword`]
//! - Derived keys and plaintext are returned in zeroize-on-drop containers
//!
//! # Example
//!
//! ```rust,ignore
//! use walletvault_crypto::keystore::{Keystore, KeystoreBuilder};
//!
//! let keystore = Keystore::encrypt_private_key(
//!     &private_key,
//!     "my-strong-password",
//!     CoinType::Ethereum,
//!     &Secp256k1AddressDeriver,
//! )?;
//! let json = keystore.to_json_pretty()?;
//!
//! let loaded = Keystore::from_json(&json)?;
//! let secret = loaded.decrypt("my-strong-password")?;
//! ```

mod cipher;
mod config;
mod decode;
mod envelope;
mod error;
mod hex_serde;
mod kdf;
mod mac;

pub use cipher::{generate_iv, Cipher, CipherKind, AES_KEY_LENGTH, BLOCK_SIZE, IV_LENGTH};
pub use config::{KdfConfig, KeystoreConfig, DEFAULT_SALT_LENGTH, MIN_DKLEN};
pub use decode::{RawCipherParams, RawCrypto, RawKeystore};
pub use envelope::{
    CryptoSection, Keystore, KeystoreBuilder, WalletKind, KEYSTORE_VERSION, PRIVATE_KEY_LENGTH,
};
pub use error::{KeystoreError, KeystoreResult};
pub use kdf::{generate_salt, scrypt_derive_key, Kdf, ScryptParams, SCRYPT};
pub use mac::{compute_mac, verify_mac, MAC_LENGTH};

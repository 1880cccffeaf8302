//! Password-encrypted wallet keystore for WalletVault
//!
//! This crate provides:
//! - Version 3 JSON keystore encoding and decoding
//! - scrypt key derivation with configurable cost profiles
//! - AES-128-CTR and AES-128-CBC encryption
//! - Keccak-256 MAC verification
//! - Private-key and mnemonic wallets with account metadata
//! - secp256k1 address derivation for EVM accounts

pub mod deriver;
pub mod keystore;
pub mod secure;

// Keystore exports
pub use keystore::{
    compute_mac, verify_mac, Cipher, CipherKind, CryptoSection, Kdf, KdfConfig, Keystore,
    KeystoreBuilder, KeystoreConfig, KeystoreError, KeystoreResult, ScryptParams, WalletKind,
};

// Address derivation exports
pub use deriver::{AddressDeriver, Secp256k1AddressDeriver};

// Secure memory exports
pub use secure::{ExposeSecret, SecretBytes, SecretString};

// Value types used throughout the keystore API
pub use walletvault_types::{Account, Address, CoinType};

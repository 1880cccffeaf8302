//! Core value types for the WalletVault keystore.
//!
//! This crate provides the 20-byte account [`Address`] with its EIP-55
//! checksum codec, the SLIP-44 [`CoinType`] registry and the [`Account`]
//! records stored alongside an encrypted keystore.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod account;
pub mod address;
pub mod coin;

pub use account::Account;
pub use address::{
    compute_checksum, is_burn, is_valid_checksum, Address, AddressError, ADDRESS_HEX_LENGTH,
    ADDRESS_LENGTH,
};
pub use coin::{CoinType, UnsupportedCoin};

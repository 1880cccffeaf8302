//! Account records attached to a keystore

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::coin::CoinType;

/// An address together with the derivation path it was produced from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account address
    pub address: Address,
    /// BIP-44 derivation path, e.g. `m/44'/60'/0'/0/0`
    pub derivation_path: String,
}

impl Account {
    /// Create a new account record
    pub fn new(address: Address, derivation_path: impl Into<String>) -> Self {
        Self {
            address,
            derivation_path: derivation_path.into(),
        }
    }

    /// Account at the first address index of `coin`
    pub fn first_for_coin(address: Address, coin: CoinType) -> Self {
        Self::new(address, coin.default_derivation_path())
    }
}

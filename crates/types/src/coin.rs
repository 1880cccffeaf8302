//! SLIP-44 coin types for chains that use 20-byte account addresses

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coin identifier not in the registry
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unsupported coin type: {0}")]
pub struct UnsupportedCoin(pub u32);

/// Chain / coin type, keyed by its SLIP-44 registration number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum CoinType {
    /// Ethereum (60)
    #[default]
    Ethereum,
    /// Ethereum Classic (61)
    EthereumClassic,
    /// POA Network (178)
    Poa,
    /// Callisto (820)
    Callisto,
    /// TomoChain (889)
    Tomo,
    /// ThunderCore (1001)
    Thunder,
    /// GoChain (6060)
    GoChain,
    /// Wanchain (5718350)
    Wanchain,
}

impl CoinType {
    /// Every registered coin
    pub const ALL: [CoinType; 8] = [
        CoinType::Ethereum,
        CoinType::EthereumClassic,
        CoinType::Poa,
        CoinType::Callisto,
        CoinType::Tomo,
        CoinType::Thunder,
        CoinType::GoChain,
        CoinType::Wanchain,
    ];

    /// SLIP-44 coin number
    pub fn slip44(&self) -> u32 {
        match self {
            CoinType::Ethereum => 60,
            CoinType::EthereumClassic => 61,
            CoinType::Poa => 178,
            CoinType::Callisto => 820,
            CoinType::Tomo => 889,
            CoinType::Thunder => 1001,
            CoinType::GoChain => 6060,
            CoinType::Wanchain => 5718350,
        }
    }

    /// Human-readable chain name
    pub fn name(&self) -> &'static str {
        match self {
            CoinType::Ethereum => "Ethereum",
            CoinType::EthereumClassic => "Ethereum Classic",
            CoinType::Poa => "POA Network",
            CoinType::Callisto => "Callisto",
            CoinType::Tomo => "TomoChain",
            CoinType::Thunder => "ThunderCore",
            CoinType::GoChain => "GoChain",
            CoinType::Wanchain => "Wanchain",
        }
    }

    /// BIP-44 path for the given address index: `m/44'/<coin>'/0'/0/<index>`
    pub fn derivation_path(&self, index: u32) -> String {
        format!("m/44'/{}'/0'/0/{}", self.slip44(), index)
    }

    /// BIP-44 path of the first address
    pub fn default_derivation_path(&self) -> String {
        self.derivation_path(0)
    }
}

impl TryFrom<u32> for CoinType {
    type Error = UnsupportedCoin;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        CoinType::ALL
            .into_iter()
            .find(|coin| coin.slip44() == id)
            .ok_or(UnsupportedCoin(id))
    }
}

impl From<CoinType> for u32 {
    fn from(coin: CoinType) -> Self {
        coin.slip44()
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slip44_roundtrip() {
        for coin in CoinType::ALL {
            assert_eq!(CoinType::try_from(coin.slip44()), Ok(coin));
        }
    }

    #[test]
    fn test_unknown_coin() {
        assert_eq!(CoinType::try_from(0), Err(UnsupportedCoin(0)));
        assert_eq!(CoinType::try_from(9999), Err(UnsupportedCoin(9999)));
    }

    #[test]
    fn test_default_derivation_path() {
        assert_eq!(CoinType::default(), CoinType::Ethereum);
        assert_eq!(
            CoinType::Ethereum.default_derivation_path(),
            "m/44'/60'/0'/0/0"
        );
        assert_eq!(
            CoinType::Wanchain.derivation_path(3),
            "m/44'/5718350'/0'/0/3"
        );
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&CoinType::EthereumClassic).unwrap();
        assert_eq!(json, "61");

        let coin: CoinType = serde_json::from_str("820").unwrap();
        assert_eq!(coin, CoinType::Callisto);

        assert!(serde_json::from_str::<CoinType>("12345").is_err());
    }
}

//! JSON encoding of the keystore envelope
//!
//! Decoding runs as an ordered pipeline over a loosely typed [`RawKeystore`]:
//!
//! 1. version must be 3
//! 2. crypto section from `crypto`, falling back to `Crypto`
//! 3. KDF, cipher, ciphertext and MAC parsed into typed values
//! 4. wallet kind from `type`, defaulting to private key
//! 5. coin from `coin`, rejecting unknown ids
//! 6. cached address, parsed leniently
//! 7. accounts from `activeAccounts`, or one synthesized from the address
//!
//! Each stage is a separate function so every fallback can be tested alone.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, trace};
use walletvault_types::{Account, Address, CoinType};

use super::cipher::Cipher;
use super::envelope::{CryptoSection, Keystore, WalletKind, KEYSTORE_VERSION};
use super::error::{KeystoreError, KeystoreResult};
use super::kdf::Kdf;
use super::mac::MAC_LENGTH;

/// Envelope as it appears on disk, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawKeystore {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto: Option<RawCrypto>,
    #[serde(rename = "Crypto", default, skip_serializing)]
    pub crypto_alt: Option<RawCrypto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_accounts: Vec<Account>,
}

/// Crypto section as it appears on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCrypto {
    pub cipher: String,
    pub cipherparams: RawCipherParams,
    pub ciphertext: String,
    pub kdf: String,
    pub kdfparams: serde_json::Value,
    pub mac: String,
}

/// `cipherparams` object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCipherParams {
    pub iv: String,
}

impl Keystore {
    /// Parse a keystore from JSON
    pub fn from_json(json: &str) -> KeystoreResult<Self> {
        let raw: RawKeystore = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> KeystoreResult<String> {
        Ok(serde_json::to_string(&RawKeystore::try_from(self)?)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> KeystoreResult<String> {
        Ok(serde_json::to_string_pretty(&RawKeystore::try_from(self)?)?)
    }
}

impl TryFrom<RawKeystore> for Keystore {
    type Error = KeystoreError;

    fn try_from(raw: RawKeystore) -> KeystoreResult<Self> {
        check_version(raw.version)?;
        let crypto = parse_crypto(resolve_crypto(raw.crypto, raw.crypto_alt)?)?;
        let kind = resolve_kind(raw.kind.as_deref());
        let coin = resolve_coin(raw.coin)?;
        let address = parse_address(raw.address.as_deref())?;
        let accounts = resolve_accounts(raw.active_accounts, address.as_ref(), coin);

        Ok(Keystore {
            id: raw.id,
            kind,
            coin,
            address,
            crypto,
            accounts,
        })
    }
}

impl TryFrom<&Keystore> for RawKeystore {
    type Error = KeystoreError;

    fn try_from(keystore: &Keystore) -> KeystoreResult<Self> {
        let crypto = &keystore.crypto;
        Ok(RawKeystore {
            version: KEYSTORE_VERSION,
            id: keystore.id.clone(),
            address: keystore.address.as_ref().map(|a| a.to_string()),
            kind: Some(keystore.kind.as_str().to_string()),
            coin: keystore.coin.map(u32::from),
            crypto: Some(RawCrypto {
                cipher: crypto.cipher.name().to_string(),
                cipherparams: RawCipherParams {
                    iv: hex::encode(crypto.cipher.iv()),
                },
                ciphertext: hex::encode(&crypto.ciphertext),
                kdf: crypto.kdf.name().to_string(),
                kdfparams: crypto.kdf.params_json()?,
                mac: hex::encode(crypto.mac),
            }),
            crypto_alt: None,
            active_accounts: keystore.accounts.clone(),
        })
    }
}

impl Serialize for Keystore {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        RawKeystore::try_from(self)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Keystore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawKeystore::deserialize(deserializer)?;
        Keystore::try_from(raw).map_err(serde::de::Error::custom)
    }
}

pub(crate) fn check_version(version: u32) -> KeystoreResult<()> {
    if version != KEYSTORE_VERSION {
        return Err(KeystoreError::UnsupportedVersion(version));
    }
    Ok(())
}

/// `crypto` wins over `Crypto` when both are present
pub(crate) fn resolve_crypto(
    primary: Option<RawCrypto>,
    alternate: Option<RawCrypto>,
) -> KeystoreResult<RawCrypto> {
    match (primary, alternate) {
        (Some(crypto), _) => Ok(crypto),
        (None, Some(crypto)) => {
            debug!("Using alternate `Crypto` section");
            Ok(crypto)
        }
        (None, None) => Err(KeystoreError::MissingCrypto),
    }
}

pub(crate) fn parse_crypto(raw: RawCrypto) -> KeystoreResult<CryptoSection> {
    let kdf = Kdf::from_parts(&raw.kdf, raw.kdfparams)?;
    let cipher = Cipher::from_parts(&raw.cipher, &raw.cipherparams.iv)?;
    let ciphertext = decode_hex("ciphertext", &raw.ciphertext)?;

    let mac_bytes = decode_hex("mac", &raw.mac)?;
    let mac: [u8; MAC_LENGTH] = mac_bytes.as_slice().try_into().map_err(|_| {
        KeystoreError::InvalidMac {
            expected: MAC_LENGTH,
            actual: mac_bytes.len(),
        }
    })?;

    Ok(CryptoSection {
        kdf,
        cipher,
        ciphertext,
        mac,
    })
}

/// Absent or unrecognized tags mean a raw private key
pub(crate) fn resolve_kind(tag: Option<&str>) -> WalletKind {
    match tag.and_then(WalletKind::from_tag) {
        Some(kind) => kind,
        None => {
            trace!(?tag, "Defaulting wallet kind to private key");
            WalletKind::PrivateKey
        }
    }
}

pub(crate) fn resolve_coin(coin: Option<u32>) -> KeystoreResult<Option<CoinType>> {
    coin.map(CoinType::try_from)
        .transpose()
        .map_err(KeystoreError::from)
}

/// Stored addresses are taken as-is: any case, no burn check
pub(crate) fn parse_address(address: Option<&str>) -> KeystoreResult<Option<Address>> {
    match address {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => Ok(Some(Address::from_hex_no_burn_check(s)?)),
    }
}

/// An address without any recorded account yields one account at the first
/// index of the configured coin, or of Ethereum when none is configured
pub(crate) fn resolve_accounts(
    accounts: Vec<Account>,
    address: Option<&Address>,
    coin: Option<CoinType>,
) -> Vec<Account> {
    if !accounts.is_empty() {
        return accounts;
    }
    match address {
        Some(address) => {
            let coin = coin.unwrap_or_default();
            debug!(%address, %coin, "Synthesizing default account");
            vec![Account::first_for_coin(address.clone(), coin)]
        }
        None => Vec::new(),
    }
}

fn decode_hex(field: &str, value: &str) -> KeystoreResult<Vec<u8>> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits)
        .map_err(|e| KeystoreError::HexError(format!("invalid {} hex: {}", field, e)))
}

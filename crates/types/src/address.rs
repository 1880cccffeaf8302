//! 20-byte account address with EIP-55 mixed-case checksum encoding
//!
//! The checksum string is computed exactly once, when the address is built,
//! and cached alongside the raw bytes. Equality and hashing only look at the
//! raw bytes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use alloy_primitives::keccak256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Address length in bytes
pub const ADDRESS_LENGTH: usize = 20;

/// Length of the `0x`-prefixed hex form
pub const ADDRESS_HEX_LENGTH: usize = 2 + 2 * ADDRESS_LENGTH;

/// Errors raised while constructing an [`Address`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Raw input did not contain exactly 20 bytes
    #[error("invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),

    /// All 20 bytes are identical
    #[error("burn address rejected: every byte is 0x{0:02x}")]
    BurnAddress(u8),

    /// Input was not valid hex
    #[error("invalid address hex: {0}")]
    InvalidHex(String),

    /// Input was not in its checksummed form
    #[error("address checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Checksummed form recomputed from the decoded bytes
        expected: String,
        /// The string that was supplied
        actual: String,
    },
}

/// Compute the EIP-55 checksum form of a 20-byte address.
///
/// Letters in the lowercase hex encoding are upper-cased when the nibble at
/// the same position of `keccak256(lowercase_hex)` is 8 or above. The result
/// carries a `0x` prefix.
pub fn compute_checksum(bytes: &[u8; ADDRESS_LENGTH]) -> String {
    let lower = hex::encode(bytes);
    let hash = hex::encode(keccak256(lower.as_bytes()));

    let mut out = String::with_capacity(ADDRESS_HEX_LENGTH);
    out.push_str("0x");
    for (c, h) in lower.chars().zip(hash.chars()) {
        let nibble = h.to_digit(16).unwrap_or(0);
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Check that `s` is exactly the checksummed form of the address it encodes.
///
/// Burn patterns never validate, matching [`Address::from_checksummed`].
pub fn is_valid_checksum(s: &str) -> bool {
    match decode_hex(s) {
        Ok(bytes) => !is_burn(&bytes) && compute_checksum(&bytes) == s,
        Err(_) => false,
    }
}

/// Whether `bytes` is the degenerate all-identical-byte pattern.
///
/// This only catches the obvious cases (all zero, all `0xff`, ...), not every
/// address that is conventionally used as a burn sink.
pub fn is_burn(bytes: &[u8; ADDRESS_LENGTH]) -> bool {
    bytes.iter().all(|b| *b == bytes[0])
}

/// Decode an optionally `0x`-prefixed hex string of any case into 20 bytes.
fn decode_hex(s: &str) -> Result<[u8; ADDRESS_LENGTH], AddressError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let decoded = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
    let len = decoded.len();
    decoded
        .try_into()
        .map_err(|_| AddressError::InvalidLength(len))
}

/// A 20-byte account address
#[derive(Clone)]
pub struct Address {
    bytes: [u8; ADDRESS_LENGTH],
    checksummed: String,
}

impl Address {
    /// Build from raw bytes, rejecting the burn pattern
    pub fn new(bytes: [u8; ADDRESS_LENGTH]) -> Result<Self, AddressError> {
        if is_burn(&bytes) {
            return Err(AddressError::BurnAddress(bytes[0]));
        }
        Ok(Self::from_raw(bytes))
    }

    /// Build from a byte slice that must be exactly 20 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        let arr: [u8; ADDRESS_LENGTH] = bytes
            .try_into()
            .map_err(|_| AddressError::InvalidLength(bytes.len()))?;
        Self::new(arr)
    }

    /// Parse a string that must already be in checksummed form
    pub fn from_checksummed(s: &str) -> Result<Self, AddressError> {
        let address = Self::new(decode_hex(s)?)?;
        if address.checksummed != s {
            return Err(AddressError::ChecksumMismatch {
                expected: address.checksummed,
                actual: s.to_string(),
            });
        }
        Ok(address)
    }

    /// Parse hex of any case, with or without `0x`; the burn check still applies
    pub fn from_hex_unchecked(s: &str) -> Result<Self, AddressError> {
        Self::new(decode_hex(s)?)
    }

    /// Parse hex of any case and skip the burn check.
    ///
    /// Used for addresses read back from files written by other tools, where
    /// rejecting a stored value would make the whole file unreadable.
    pub fn from_hex_no_burn_check(s: &str) -> Result<Self, AddressError> {
        Ok(Self::from_raw(decode_hex(s)?))
    }

    fn from_raw(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self {
            checksummed: compute_checksum(&bytes),
            bytes,
        }
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.bytes
    }

    /// Raw bytes as a slice
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Cached EIP-55 form, `0x`-prefixed
    pub fn checksummed(&self) -> &str {
        &self.checksummed
    }

    /// Lowercase hex without prefix
    pub fn to_lowercase_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl TryFrom<[u8; ADDRESS_LENGTH]> for Address {
    type Error = AddressError;

    fn try_from(bytes: [u8; ADDRESS_LENGTH]) -> Result<Self, Self::Error> {
        Self::new(bytes)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_checksummed(s)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.checksummed)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.checksummed)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.checksummed)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex_no_burn_check(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    // Mixed-case vectors from EIP-55
    const VECTORS: &[&str] = &[
        "0x52908400098527886E0F7030069857D2E4169EE7",
        "0x8617E340B3D01FA5F11F306F4090FD50E238070D",
        "0xde709f2102306220921060314715629080e2fb77",
        "0x27b1fdb04752bbc536007a920d24acb045561c26",
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn test_compute_checksum_vectors() {
        for vector in VECTORS {
            let bytes = decode_hex(vector).unwrap();
            assert_eq!(&compute_checksum(&bytes), vector);
            assert!(is_valid_checksum(vector));
        }
    }

    #[test]
    fn test_checksum_rejects_flipped_case() {
        for vector in VECTORS {
            for (i, c) in vector.char_indices().skip(2) {
                if !c.is_ascii_alphabetic() {
                    continue;
                }
                let mut flipped = vector.to_string();
                let replacement = if c.is_ascii_uppercase() {
                    c.to_ascii_lowercase()
                } else {
                    c.to_ascii_uppercase()
                };
                flipped.replace_range(i..i + 1, &replacement.to_string());
                assert!(!is_valid_checksum(&flipped), "{flipped} should not validate");
            }
        }
    }

    #[test]
    fn test_checksum_requires_prefix_and_length() {
        assert!(!is_valid_checksum("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        assert!(!is_valid_checksum("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeA"));
        assert!(!is_valid_checksum("0xzzAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
    }

    #[test]
    fn test_checksum_rejects_burn_pattern() {
        let zero = format!("0x{}", "00".repeat(20));
        assert_eq!(compute_checksum(&[0x00; 20]), zero);
        assert!(!is_valid_checksum(&zero));

        let ones = compute_checksum(&[0xFF; 20]);
        assert!(!is_valid_checksum(&ones));
        assert_eq!(
            Address::from_checksummed(&ones).unwrap_err(),
            AddressError::BurnAddress(0xFF)
        );
    }

    #[test]
    fn test_burn_rejected() {
        assert_eq!(
            Address::new([0x00; 20]).unwrap_err(),
            AddressError::BurnAddress(0x00)
        );
        assert_eq!(
            Address::new([0xFF; 20]).unwrap_err(),
            AddressError::BurnAddress(0xFF)
        );
        assert!(Address::from_hex_unchecked(&format!("0x{}", "11".repeat(20))).is_err());
    }

    #[test]
    fn test_no_burn_check_path_accepts_zero() {
        let zero = Address::from_hex_no_burn_check(&"00".repeat(20)).unwrap();
        assert_eq!(zero.as_bytes(), &[0u8; 20]);
        assert_eq!(
            zero.checksummed(),
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_from_slice_length() {
        assert_eq!(
            Address::from_slice(&[1u8; 19]).unwrap_err(),
            AddressError::InvalidLength(19)
        );
        assert_eq!(
            Address::from_slice(&[1u8; 21]).unwrap_err(),
            AddressError::InvalidLength(21)
        );
    }

    #[test]
    fn test_from_checksummed() {
        let address = Address::from_checksummed(VECTORS[4]).unwrap();
        assert_eq!(address.to_string(), VECTORS[4]);

        let lower = VECTORS[4].to_lowercase();
        assert!(matches!(
            Address::from_checksummed(&lower),
            Err(AddressError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_unchecked_accepts_any_case() {
        let upper = format!("0X{}", VECTORS[5][2..].to_uppercase());
        let address = Address::from_hex_unchecked(&upper).unwrap();
        assert_eq!(address.checksummed(), VECTORS[5]);

        let bare = VECTORS[5][2..].to_lowercase();
        assert_eq!(Address::from_hex_unchecked(&bare).unwrap(), address);
    }

    #[test]
    fn test_equality_and_hash_use_bytes() {
        let a = Address::from_hex_unchecked(&VECTORS[6].to_lowercase()).unwrap();
        let b: Address = VECTORS[6].parse().unwrap();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_serde_roundtrip() {
        let address: Address = VECTORS[7].parse().unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", VECTORS[7]));

        let lowercase = format!("\"{}\"", VECTORS[7].to_lowercase());
        let parsed: Address = serde_json::from_str(&lowercase).unwrap();
        assert_eq!(parsed, address);
        assert_eq!(parsed.checksummed(), VECTORS[7]);
    }
}

//! Keystore envelope and its encrypt/decrypt orchestration
//!
//! A [`Keystore`] combines the KDF, cipher and MAC modules with the wallet
//! metadata (kind, coin, address, accounts). Decryption runs
//! KDF → MAC check → cipher and never mutates the envelope; encryption always
//! produces a fresh value with a new salt, IV and id.

use std::fmt;

use rand::{CryptoRng, RngCore};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;
use walletvault_types::{Account, Address, CoinType};
use zeroize::Zeroizing;

use super::cipher::{generate_iv, Cipher, CipherKind};
use super::config::{KdfConfig, KeystoreConfig};
use super::error::{KeystoreError, KeystoreResult};
use super::kdf::{generate_salt, Kdf};
use super::mac::{compute_mac, verify_mac, MAC_LENGTH};
use crate::deriver::AddressDeriver;
use crate::secure::{SecretBytes, SecretString};

/// Keystore format version
pub const KEYSTORE_VERSION: u32 = 3;

/// Raw private key length
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// What the encrypted secret is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WalletKind {
    /// Raw 32-byte private key
    #[default]
    #[serde(rename = "private-key")]
    PrivateKey,
    /// ASCII mnemonic phrase of a hierarchical deterministic wallet
    #[serde(rename = "mnemonic")]
    Mnemonic,
}

impl WalletKind {
    /// Tag written to the `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKind::PrivateKey => "private-key",
            WalletKind::Mnemonic => "mnemonic",
        }
    }

    /// Parse a `type` tag, `None` when unrecognized
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "private-key" => Some(WalletKind::PrivateKey),
            "mnemonic" => Some(WalletKind::Mnemonic),
            _ => None,
        }
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletKind::PrivateKey => write!(f, "private key"),
            WalletKind::Mnemonic => write!(f, "mnemonic"),
        }
    }
}

/// Everything needed to reproduce a decryption, short of the password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoSection {
    /// Key derivation function and parameters
    pub kdf: Kdf,
    /// Cipher and IV
    pub cipher: Cipher,
    /// Encrypted secret
    pub ciphertext: Vec<u8>,
    /// Keccak-256 MAC over derived_key[16..32] || ciphertext
    pub mac: [u8; MAC_LENGTH],
}

/// Password-encrypted wallet keystore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keystore {
    pub(crate) id: Option<String>,
    pub(crate) kind: WalletKind,
    pub(crate) coin: Option<CoinType>,
    pub(crate) address: Option<Address>,
    pub(crate) crypto: CryptoSection,
    pub(crate) accounts: Vec<Account>,
}

impl Keystore {
    /// Encrypt an arbitrary secret with default settings
    ///
    /// # Arguments
    ///
    /// * `password` - The password to derive the encryption key from
    /// * `plaintext` - The secret bytes to encrypt
    pub fn encrypt(password: &str, plaintext: &[u8]) -> KeystoreResult<Self> {
        KeystoreBuilder::new()
            .secret(plaintext)
            .password(password)
            .build()
    }

    /// Encrypt a raw private key and record its address
    ///
    /// The address is computed by `deriver` and a single account at the
    /// coin's first derivation index is recorded.
    pub fn encrypt_private_key(
        private_key: &[u8],
        password: &str,
        coin: CoinType,
        deriver: &dyn AddressDeriver,
    ) -> KeystoreResult<Self> {
        if private_key.len() != PRIVATE_KEY_LENGTH {
            return Err(KeystoreError::InvalidSecretLength {
                expected: PRIVATE_KEY_LENGTH,
                actual: private_key.len(),
            });
        }
        let address = deriver.derive_address(private_key)?;

        KeystoreBuilder::new()
            .secret(private_key)
            .password(password)
            .kind(WalletKind::PrivateKey)
            .coin(coin)
            .address(address)
            .build()
    }

    /// Encrypt a mnemonic phrase; it must be non-empty ASCII
    pub fn encrypt_mnemonic(mnemonic: &str, password: &str, coin: CoinType) -> KeystoreResult<Self> {
        validate_mnemonic(mnemonic)?;

        KeystoreBuilder::new()
            .secret(mnemonic.as_bytes())
            .password(password)
            .kind(WalletKind::Mnemonic)
            .coin(coin)
            .build()
    }

    /// Decrypt the keystore and return the secret
    ///
    /// Fails with [`KeystoreError::InvalidPassword`] when the MAC does not
    /// match, which covers both a wrong password and a corrupted ciphertext.
    pub fn decrypt(&self, password: &str) -> KeystoreResult<SecretBytes> {
        let derived_key = self.crypto.kdf.derive_key(password)?;
        let dk_bytes = derived_key.expose_secret();

        // Verify MAC before decrypting
        if let Err(err) = verify_mac(dk_bytes, &self.crypto.ciphertext, &self.crypto.mac) {
            debug!(id = ?self.id, "Keystore MAC verification failed");
            return Err(err);
        }

        self.crypto.cipher.decrypt(dk_bytes, &self.crypto.ciphertext)
    }

    /// Decrypt a private-key keystore
    pub fn decrypt_private_key(&self, password: &str) -> KeystoreResult<SecretBytes> {
        self.expect_kind(WalletKind::PrivateKey)?;
        let secret = self.decrypt(password)?;

        let len = secret.expose_secret().len();
        if len != PRIVATE_KEY_LENGTH {
            return Err(KeystoreError::InvalidSecretLength {
                expected: PRIVATE_KEY_LENGTH,
                actual: len,
            });
        }
        Ok(secret)
    }

    /// Decrypt a mnemonic keystore
    pub fn decrypt_mnemonic(&self, password: &str) -> KeystoreResult<SecretString> {
        self.expect_kind(WalletKind::Mnemonic)?;
        let secret = self.decrypt(password)?;

        let bytes = secret.expose_secret();
        if !bytes.is_ascii() {
            return Err(KeystoreError::InvalidMnemonic(
                "decrypted phrase is not ASCII".to_string(),
            ));
        }
        let phrase: String = bytes.iter().map(|b| char::from(*b)).collect();
        Ok(phrase.into())
    }

    /// Re-encrypt under a new password with a fresh salt and IV
    ///
    /// Cost parameters, cipher, id, kind, coin, address and accounts are kept.
    pub fn change_password(&self, old_password: &str, new_password: &str) -> KeystoreResult<Self> {
        let secret = self.decrypt(old_password)?;

        let kdf = match &self.crypto.kdf {
            Kdf::Scrypt(params) => KdfConfig {
                n: params.n,
                r: params.r,
                p: params.p,
                dklen: params.dklen,
                salt_len: params.salt.len().max(1),
            },
        };

        let mut builder = KeystoreBuilder::new()
            .secret(secret.expose_secret())
            .password(new_password)
            .kind(self.kind)
            .kdf_config(kdf)
            .cipher(self.crypto.cipher.kind())
            .accounts(self.accounts.clone());
        if let Some(id) = &self.id {
            builder = builder.id(id);
        }
        if let Some(coin) = self.coin {
            builder = builder.coin(coin);
        }
        if let Some(address) = &self.address {
            builder = builder.address(address.clone());
        }
        builder.build()
    }

    fn expect_kind(&self, expected: WalletKind) -> KeystoreResult<()> {
        if self.kind != expected {
            return Err(KeystoreError::WrongWalletKind {
                expected,
                actual: self.kind,
            });
        }
        Ok(())
    }

    /// Format version, always 3
    pub fn version(&self) -> u32 {
        KEYSTORE_VERSION
    }

    /// Stable identifier
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Wallet kind
    pub fn kind(&self) -> WalletKind {
        self.kind
    }

    /// Configured coin, if any
    pub fn coin(&self) -> Option<CoinType> {
        self.coin
    }

    /// Cached address, if any
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// KDF, cipher, ciphertext and MAC
    pub fn crypto(&self) -> &CryptoSection {
        &self.crypto
    }

    /// Recorded accounts
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Look up an account by address
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.iter().find(|a| &a.address == address)
    }

    /// Record a new account
    pub fn add_account(&mut self, account: Account) -> KeystoreResult<()> {
        if self.account(&account.address).is_some() {
            return Err(KeystoreError::AccountExists(account.address.to_string()));
        }
        self.accounts.push(account);
        Ok(())
    }

    /// Remove an account by address
    pub fn remove_account(&mut self, address: &Address) -> KeystoreResult<Account> {
        let index = self
            .accounts
            .iter()
            .position(|a| &a.address == address)
            .ok_or_else(|| KeystoreError::AccountNotFound(address.to_string()))?;
        Ok(self.accounts.remove(index))
    }
}

fn validate_mnemonic(mnemonic: &str) -> KeystoreResult<()> {
    if mnemonic.trim().is_empty() {
        return Err(KeystoreError::InvalidMnemonic("phrase is empty".to_string()));
    }
    if !mnemonic.is_ascii() {
        return Err(KeystoreError::InvalidMnemonic(
            "phrase contains non-ASCII characters".to_string(),
        ));
    }
    Ok(())
}

/// Builder for creating [`Keystore`] instances
#[derive(Default)]
pub struct KeystoreBuilder {
    secret: Option<Zeroizing<Vec<u8>>>,
    password: Option<Zeroizing<String>>,
    kind: WalletKind,
    coin: Option<CoinType>,
    address: Option<Address>,
    accounts: Vec<Account>,
    id: Option<String>,
    config: KeystoreConfig,
}

impl KeystoreBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the secret to encrypt
    pub fn secret(mut self, secret: &[u8]) -> Self {
        self.secret = Some(Zeroizing::new(secret.to_vec()));
        self
    }

    /// Set the password for key derivation
    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(Zeroizing::new(password.to_string()));
        self
    }

    /// Set the wallet kind (default: private key)
    pub fn kind(mut self, kind: WalletKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the coin type
    pub fn coin(mut self, coin: CoinType) -> Self {
        self.coin = Some(coin);
        self
    }

    /// Set the cached address
    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Set the account list
    pub fn accounts(mut self, accounts: Vec<Account>) -> Self {
        self.accounts = accounts;
        self
    }

    /// Set a custom id (normally a random UUID)
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Replace the KDF and cipher defaults
    pub fn config(mut self, config: KeystoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the scrypt cost profile
    pub fn kdf_config(mut self, kdf: KdfConfig) -> Self {
        self.config.kdf = kdf;
        self
    }

    /// Set the cipher
    pub fn cipher(mut self, cipher: CipherKind) -> Self {
        self.config.cipher = cipher;
        self
    }

    /// Build the keystore using the thread-local RNG
    pub fn build(self) -> KeystoreResult<Keystore> {
        self.build_with_rng(&mut rand::thread_rng())
    }

    /// Build the keystore drawing salt, IV and id from `rng`
    pub fn build_with_rng<R: RngCore + CryptoRng>(self, rng: &mut R) -> KeystoreResult<Keystore> {
        let secret = self.secret.ok_or(KeystoreError::MissingInput("secret"))?;
        let password = self
            .password
            .ok_or(KeystoreError::MissingInput("password"))?;
        self.config.kdf.validate()?;

        let salt = generate_salt(rng, self.config.kdf.salt_len);
        let iv = generate_iv(rng);

        let kdf = Kdf::scrypt(&self.config.kdf, salt);
        let derived_key = kdf.derive_key(&password)?;
        let dk_bytes = derived_key.expose_secret();

        // Encrypt with bytes 0..16, MAC with bytes 16..32
        let cipher = self.config.cipher.with_iv(iv);
        let ciphertext = cipher.encrypt(dk_bytes, &secret)?;
        let mac = compute_mac(dk_bytes, &ciphertext)?;

        let id = self.id.unwrap_or_else(|| random_uuid(rng));

        let mut accounts = self.accounts;
        if accounts.is_empty() {
            if let Some(address) = &self.address {
                accounts.push(Account::first_for_coin(
                    address.clone(),
                    self.coin.unwrap_or_default(),
                ));
            }
        }

        debug!(%id, kind = %self.kind, cipher = cipher.name(), "Created keystore");

        Ok(Keystore {
            id: Some(id),
            kind: self.kind,
            coin: self.coin,
            address: self.address,
            crypto: CryptoSection {
                kdf,
                cipher,
                ciphertext,
                mac,
            },
            accounts,
        })
    }
}

fn random_uuid<R: RngCore + CryptoRng>(rng: &mut R) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .hyphenated()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tracing_test::traced_test;

    fn light() -> KeystoreBuilder {
        KeystoreBuilder::new().kdf_config(KdfConfig::light())
    }

    fn stub_address() -> Address {
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".parse().unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let secret = [0xAB; 32];
        let keystore = light()
            .secret(&secret)
            .password("test-password-123")
            .build()
            .unwrap();

        assert_eq!(keystore.version(), KEYSTORE_VERSION);
        assert_eq!(keystore.kind(), WalletKind::PrivateKey);

        let decrypted = keystore.decrypt("test-password-123").unwrap();
        assert_eq!(decrypted.expose_secret(), &secret);
    }

    #[test]
    fn test_wrong_password_fails() {
        let keystore = light()
            .secret(&[0xCD; 32])
            .password("correct-password")
            .build()
            .unwrap();

        let err = keystore.decrypt("wrong-password").unwrap_err();
        assert!(matches!(err, KeystoreError::InvalidPassword));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_cbc_roundtrip() {
        let secret = [0x42; 32];
        let keystore = light()
            .secret(&secret)
            .password("pw")
            .cipher(CipherKind::Aes128Cbc)
            .build()
            .unwrap();

        assert_eq!(keystore.crypto().cipher.kind(), CipherKind::Aes128Cbc);
        assert_eq!(keystore.decrypt("pw").unwrap().expose_secret(), &secret);
    }

    #[test]
    fn test_cbc_rejects_unaligned_secret() {
        let result = light()
            .secret(b"not a block multiple")
            .password("pw")
            .cipher(CipherKind::Aes128Cbc)
            .build();
        assert!(matches!(result, Err(KeystoreError::InvalidCipher(_))));
    }

    #[test]
    fn test_builder_requires_inputs() {
        assert!(matches!(
            light().password("pw").build(),
            Err(KeystoreError::MissingInput("secret"))
        ));
        assert!(matches!(
            light().secret(&[1; 32]).build(),
            Err(KeystoreError::MissingInput("password"))
        ));
    }

    #[test]
    fn test_build_with_seeded_rng_is_deterministic() {
        let build = || {
            light()
                .secret(&[7; 32])
                .password("pw")
                .build_with_rng(&mut StdRng::seed_from_u64(42))
                .unwrap()
        };
        let a = build();
        let b = build();
        assert_eq!(a, b);
        assert!(uuid::Uuid::parse_str(a.id().unwrap()).is_ok());
    }

    #[test]
    fn test_id_uniqueness_and_custom_id() {
        let a = light().secret(&[1; 32]).password("pw").build().unwrap();
        let b = light().secret(&[1; 32]).password("pw").build().unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.crypto().ciphertext, b.crypto().ciphertext);

        let custom = "12345678-1234-5678-1234-567812345678";
        let c = light()
            .secret(&[1; 32])
            .password("pw")
            .id(custom)
            .build()
            .unwrap();
        assert_eq!(c.id(), Some(custom));
    }

    #[test]
    fn test_address_synthesizes_account() {
        let keystore = light()
            .secret(&[3; 32])
            .password("pw")
            .address(stub_address())
            .coin(CoinType::EthereumClassic)
            .build()
            .unwrap();

        assert_eq!(keystore.accounts().len(), 1);
        assert_eq!(keystore.accounts()[0].address, stub_address());
        assert_eq!(keystore.accounts()[0].derivation_path, "m/44'/61'/0'/0/0");
    }

    #[test]
    fn test_mnemonic_validation() {
        assert!(matches!(
            validate_mnemonic("   "),
            Err(KeystoreError::InvalidMnemonic(_))
        ));
        assert!(matches!(
            validate_mnemonic("abandon über ability"),
            Err(KeystoreError::InvalidMnemonic(_))
        ));
        assert!(validate_mnemonic("abandon ability able").is_ok());
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let keystore = light()
            .secret(b"abandon ability able")
            .password("pw")
            .kind(WalletKind::Mnemonic)
            .build()
            .unwrap();

        assert!(matches!(
            keystore.decrypt_private_key("pw"),
            Err(KeystoreError::WrongWalletKind {
                expected: WalletKind::PrivateKey,
                actual: WalletKind::Mnemonic,
            })
        ));
        let phrase = keystore.decrypt_mnemonic("pw").unwrap();
        assert_eq!(phrase.expose_secret(), "abandon ability able");
    }

    #[test]
    fn test_account_management() {
        let mut keystore = light().secret(&[9; 32]).password("pw").build().unwrap();
        assert!(keystore.accounts().is_empty());

        let account = Account::first_for_coin(stub_address(), CoinType::Ethereum);
        keystore.add_account(account.clone()).unwrap();
        assert!(matches!(
            keystore.add_account(account.clone()),
            Err(KeystoreError::AccountExists(_))
        ));
        assert_eq!(keystore.account(&stub_address()), Some(&account));

        assert_eq!(keystore.remove_account(&stub_address()).unwrap(), account);
        assert!(matches!(
            keystore.remove_account(&stub_address()),
            Err(KeystoreError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_change_password() {
        let secret = [0x5C; 32];
        let keystore = light()
            .secret(&secret)
            .password("old")
            .address(stub_address())
            .coin(CoinType::Poa)
            .build()
            .unwrap();

        let updated = keystore.change_password("old", "new").unwrap();
        assert_eq!(updated.id(), keystore.id());
        assert_eq!(updated.address(), keystore.address());
        assert_eq!(updated.accounts(), keystore.accounts());
        assert_eq!(updated.coin(), Some(CoinType::Poa));
        assert_ne!(updated.crypto().mac, keystore.crypto().mac);

        assert!(matches!(
            updated.decrypt("old"),
            Err(KeystoreError::InvalidPassword)
        ));
        assert_eq!(updated.decrypt("new").unwrap().expose_secret(), &secret);

        assert!(matches!(
            keystore.change_password("bad", "new"),
            Err(KeystoreError::InvalidPassword)
        ));
    }

    #[test]
    #[traced_test]
    fn test_mac_failure_logged_without_secrets() {
        let keystore = light()
            .secret(&[0x77; 32])
            .password("hunter2-correct")
            .build()
            .unwrap();

        assert!(keystore.decrypt("hunter2-wrong").is_err());
        assert!(logs_contain("Keystore MAC verification failed"));
        assert!(!logs_contain("hunter2"));
    }
}

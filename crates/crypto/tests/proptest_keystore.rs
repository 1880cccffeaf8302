//! Property-based tests for keystore encryption
//!
//! Uses a cheap scrypt profile so each case stays fast.

use proptest::prelude::*;
use walletvault_crypto::keystore::{KdfConfig, KeystoreBuilder};
use walletvault_crypto::{CipherKind, ExposeSecret, Keystore, KeystoreError, WalletKind};

fn cheap_kdf() -> KdfConfig {
    KdfConfig {
        n: 1024,
        r: 8,
        p: 1,
        ..KdfConfig::light()
    }
}

fn cipher_kind() -> impl Strategy<Value = CipherKind> {
    prop_oneof![Just(CipherKind::Aes128Ctr), Just(CipherKind::Aes128Cbc)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))] // Reduced cases due to slow scrypt

    /// Property: encrypt, serialize, parse, decrypt returns the original secret
    #[test]
    fn prop_roundtrip_through_json(
        blocks in prop::collection::vec(any::<[u8; 16]>(), 1..4),
        password in "[ -~]{0,24}",
        kind in cipher_kind(),
    ) {
        let secret: Vec<u8> = blocks.concat();
        let keystore = KeystoreBuilder::new()
            .kdf_config(cheap_kdf())
            .cipher(kind)
            .secret(&secret)
            .password(&password)
            .build()
            .unwrap();

        let restored = Keystore::from_json(&keystore.to_json().unwrap()).unwrap();
        prop_assert_eq!(&restored, &keystore);
        let decrypted = restored.decrypt(&password).unwrap();
        prop_assert_eq!(decrypted.expose_secret(), &secret);
    }

    /// Property: ASCII phrases of any length survive a CTR mnemonic keystore
    #[test]
    fn prop_mnemonic_roundtrip_any_length(
        phrase in "[a-z][ -~]{0,239}",
        password in "[ -~]{0,24}",
    ) {
        let keystore = KeystoreBuilder::new()
            .kdf_config(cheap_kdf())
            .cipher(CipherKind::Aes128Ctr)
            .kind(WalletKind::Mnemonic)
            .secret(phrase.as_bytes())
            .password(&password)
            .build()
            .unwrap();
        prop_assert_eq!(keystore.crypto().ciphertext.len(), phrase.len());

        let restored = Keystore::from_json(&keystore.to_json().unwrap()).unwrap();
        prop_assert_eq!(restored.kind(), WalletKind::Mnemonic);
        let decrypted = restored.decrypt_mnemonic(&password).unwrap();
        prop_assert_eq!(decrypted.expose_secret(), phrase.as_str());
    }

    /// Property: any other password fails with InvalidPassword
    #[test]
    fn prop_wrong_password_rejected(
        secret in prop::collection::vec(any::<u8>(), 1..64),
        password in "[a-z]{1,16}",
        suffix in "[A-Z0-9]{1,4}",
    ) {
        let keystore = KeystoreBuilder::new()
            .kdf_config(cheap_kdf())
            .secret(&secret)
            .password(&password)
            .build()
            .unwrap();

        let wrong = format!("{}{}", password, suffix);
        prop_assert!(matches!(
            keystore.decrypt(&wrong),
            Err(KeystoreError::InvalidPassword)
        ));
    }
}

//! Secret containers for derived keys and decrypted plaintext
//!
//! Both aliases wrap `secrecy::SecretBox`, which zeroizes its contents on
//! drop and prints `[REDACTED]` in `Debug` output. The inner value is only
//! reachable through `expose_secret()`.

pub use secrecy::ExposeSecret;

/// Secret byte buffer, zeroized on drop
///
/// # Example
///
/// ```rust
/// use walletvault_crypto::secure::{ExposeSecret, SecretBytes};
///
/// let secret = SecretBytes::new(Box::new(vec![1, 2, 3, 4]));
/// assert_eq!(secret.expose_secret(), &vec![1, 2, 3, 4]);
/// ```
pub type SecretBytes = secrecy::SecretBox<Vec<u8>>;

/// Secret string, zeroized on drop
pub type SecretString = secrecy::SecretString;

//! Secrets management for groundwork
//!
//! Everything between a plaintext [`groundwork_core::Secret`] and the
//! ciphertext persisted in a checkpoint:
//!
//! - [`Encrypter`] / [`Decrypter`]: async crypto backends, with bulk calls
//! - [`SecretsManager`] / [`SecretsProvider`]: per-stack crypto ownership and
//!   the factory that rebuilds it from persisted state
//! - [`SecretCache`]: identity-keyed plaintext/ciphertext reuse within one
//!   update
//! - [`BatchEncrypter`] / [`BatchDecrypter`]: buffered bulk crypto for
//!   serialize and deserialize passes
//!
//! ## Leak prevention
//!
//! Ciphertext is reused only for the same secret identity with unchanged
//! plaintext. Two distinct secrets holding equal plaintext always produce
//! independent ciphertexts, so persisted state never reveals their equality.

pub mod batch;
pub mod cache;
pub mod crypter;
pub mod error;
pub mod manager;
pub mod testing;

pub use batch::{BatchDecrypter, BatchEncrypter, CachingDecrypter, CryptoSlot, DEFAULT_MAX_BATCH};
pub use cache::SecretCache;
pub use crypter::{Decrypter, Encrypter, ErrorCrypter, NopCrypter, PanicCrypter};
pub use error::{Result, SecretsError};
pub use manager::{
    Base64SecretsManager, DefaultSecretsProvider, SecretsManager, SecretsProvider,
    BASE64_SECRETS_TYPE,
};

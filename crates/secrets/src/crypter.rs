//! Encrypter and decrypter traits
//!
//! Crypto backends are typically network round trips (a cloud KMS, a managed
//! service), so both traits are async; dropping the returned future cancels
//! the in-flight call. The bulk methods exist so backends that support
//! batched calls can encrypt or decrypt many values in one round trip; the
//! defaults fall back to sequential single calls.

use async_trait::async_trait;

use crate::error::{Result, SecretsError};

/// Encrypts plaintext into ciphertext.
#[async_trait]
pub trait Encrypter: Send + Sync {
    /// Encrypt a single plaintext.
    async fn encrypt(&self, plaintext: &str) -> Result<String>;

    /// Encrypt many plaintexts, returning ciphertexts in input order.
    async fn batch_encrypt(&self, plaintexts: &[String]) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(plaintexts.len());
        for plaintext in plaintexts {
            out.push(self.encrypt(plaintext).await?);
        }
        Ok(out)
    }
}

/// Decrypts ciphertext back into plaintext.
#[async_trait]
pub trait Decrypter: Send + Sync {
    /// Decrypt a single ciphertext.
    async fn decrypt(&self, ciphertext: &str) -> Result<String>;

    /// Decrypt many ciphertexts, returning plaintexts in input order.
    async fn batch_decrypt(&self, ciphertexts: &[String]) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(ciphertexts.len());
        for ciphertext in ciphertexts {
            out.push(self.decrypt(ciphertext).await?);
        }
        Ok(out)
    }
}

/// Crypter that passes values through unchanged.
///
/// Used for nested secrets, whose plaintext is re-encrypted as part of the
/// enclosing secret, and anywhere encryption is intentionally disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopCrypter;

#[async_trait]
impl Encrypter for NopCrypter {
    async fn encrypt(&self, plaintext: &str) -> Result<String> {
        Ok(plaintext.to_string())
    }
}

#[async_trait]
impl Decrypter for NopCrypter {
    async fn decrypt(&self, ciphertext: &str) -> Result<String> {
        Ok(ciphertext.to_string())
    }
}

/// Crypter that fails every call with [`SecretsError::MissingSecretsManager`].
///
/// Stands in when no manager is configured: plain values still flow, but the
/// first secret that actually needs crypto surfaces the configuration error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorCrypter;

#[async_trait]
impl Encrypter for ErrorCrypter {
    async fn encrypt(&self, _plaintext: &str) -> Result<String> {
        Err(SecretsError::MissingSecretsManager)
    }
}

#[async_trait]
impl Decrypter for ErrorCrypter {
    async fn decrypt(&self, _ciphertext: &str) -> Result<String> {
        Err(SecretsError::MissingSecretsManager)
    }
}

/// Crypter that panics on any call. Test helper for paths that must never
/// touch crypto.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicCrypter;

#[async_trait]
impl Encrypter for PanicCrypter {
    async fn encrypt(&self, _plaintext: &str) -> Result<String> {
        panic!("encrypt was called on a PanicCrypter");
    }
}

#[async_trait]
impl Decrypter for PanicCrypter {
    async fn decrypt(&self, _ciphertext: &str) -> Result<String> {
        panic!("decrypt was called on a PanicCrypter");
    }
}

//! Test support: instrumented crypters
//!
//! [`CountingCrypter`] is a deterministic in-process backend that counts
//! every call, so tests can assert exactly how much work reached the backend
//! (cache hits and batching both show up as fewer calls). Each encryption
//! produces a unique ciphertext, so equal plaintexts encrypted separately
//! never collide.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::crypter::{Decrypter, Encrypter};
use crate::error::{Result, SecretsError};
use crate::manager::SecretsManager;

/// Crypter that counts calls and mints unique ciphertexts.
///
/// Ciphertext format is `"{n}:{plaintext}"` where `n` is a per-instance
/// counter, so decryption just strips the prefix.
#[derive(Debug, Default)]
pub struct CountingCrypter {
    encrypts: AtomicUsize,
    encrypt_batches: AtomicUsize,
    decrypts: AtomicUsize,
    decrypt_batches: AtomicUsize,
}

impl CountingCrypter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total plaintexts encrypted, across single and bulk calls.
    pub fn encrypt_count(&self) -> usize {
        self.encrypts.load(Ordering::SeqCst)
    }

    /// Bulk encrypt calls made.
    pub fn batch_count(&self) -> usize {
        self.encrypt_batches.load(Ordering::SeqCst)
    }

    /// Single decrypt calls made.
    pub fn decrypt_count(&self) -> usize {
        self.decrypts.load(Ordering::SeqCst)
    }

    /// Bulk decrypt calls made.
    pub fn decrypt_batch_count(&self) -> usize {
        self.decrypt_batches.load(Ordering::SeqCst)
    }

    fn mint(&self, plaintext: &str) -> String {
        let n = self.encrypts.fetch_add(1, Ordering::SeqCst);
        format!("{n}:{plaintext}")
    }

    fn strip(ciphertext: &str) -> Result<String> {
        match ciphertext.split_once(':') {
            Some((_, plaintext)) => Ok(plaintext.to_string()),
            None => Err(SecretsError::Decrypt(format!(
                "unrecognized test ciphertext {ciphertext:?}"
            ))),
        }
    }
}

#[async_trait]
impl Encrypter for CountingCrypter {
    async fn encrypt(&self, plaintext: &str) -> Result<String> {
        Ok(self.mint(plaintext))
    }

    async fn batch_encrypt(&self, plaintexts: &[String]) -> Result<Vec<String>> {
        self.encrypt_batches.fetch_add(1, Ordering::SeqCst);
        Ok(plaintexts.iter().map(|p| self.mint(p)).collect())
    }
}

#[async_trait]
impl Decrypter for CountingCrypter {
    async fn decrypt(&self, ciphertext: &str) -> Result<String> {
        self.decrypts.fetch_add(1, Ordering::SeqCst);
        Self::strip(ciphertext)
    }

    async fn batch_decrypt(&self, ciphertexts: &[String]) -> Result<Vec<String>> {
        self.decrypt_batches.fetch_add(1, Ordering::SeqCst);
        ciphertexts.iter().map(|c| Self::strip(c)).collect()
    }
}

/// Full [`SecretsManager`] backed by a [`CountingCrypter`].
#[derive(Debug, Default)]
pub struct CountingSecretsManager {
    crypter: CountingCrypter,
}

impl CountingSecretsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn crypter(&self) -> &CountingCrypter {
        &self.crypter
    }
}

impl SecretsManager for CountingSecretsManager {
    fn type_tag(&self) -> &str {
        "counting"
    }

    fn state(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    fn encrypter(&self) -> &dyn Encrypter {
        &self.crypter
    }

    fn decrypter(&self) -> &dyn Decrypter {
        &self.crypter
    }
}

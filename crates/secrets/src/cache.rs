//! Bidirectional secret cache
//!
//! Maps `(SecretId, plaintext) -> ciphertext` for serialize passes and
//! `ciphertext -> plaintext` for deserialize passes. One cache is scoped to a
//! single update (or explicitly shared across that update's repeated
//! serialize passes); it is never global.
//!
//! The forward lookup is keyed by secret identity AND plaintext: ciphertext
//! is reused only for the same logical secret whose plaintext has not
//! changed. Two distinct secrets holding equal plaintext never share an
//! entry, so the persisted file never reveals that they are equal.

use std::collections::HashMap;

use parking_lot::RwLock;

use groundwork_core::SecretId;

#[derive(Debug, Clone)]
struct CacheEntry {
    plaintext: String,
    ciphertext: String,
}

#[derive(Debug, Default)]
struct Inner {
    by_secret: HashMap<SecretId, CacheEntry>,
    by_ciphertext: HashMap<String, String>,
}

/// Bidirectional plaintext/ciphertext cache for one update.
#[derive(Debug)]
pub struct SecretCache {
    // None disables all caching: every lookup misses, every write drops.
    inner: Option<RwLock<Inner>>,
}

impl SecretCache {
    /// An empty, active cache.
    pub fn new() -> Self {
        SecretCache {
            inner: Some(RwLock::new(Inner::default())),
        }
    }

    /// A cache that remembers nothing. Used when plaintext is deliberately
    /// shown and caching ciphertext would be wrong.
    pub fn disabled() -> Self {
        SecretCache { inner: None }
    }

    /// Record a known `(plaintext, ciphertext)` pair for a secret identity.
    /// Populates both directions.
    pub fn write(&self, id: SecretId, plaintext: &str, ciphertext: &str) {
        if let Some(lock) = &self.inner {
            let mut inner = lock.write();
            inner.by_secret.insert(
                id,
                CacheEntry {
                    plaintext: plaintext.to_string(),
                    ciphertext: ciphertext.to_string(),
                },
            );
            inner
                .by_ciphertext
                .insert(ciphertext.to_string(), plaintext.to_string());
        }
    }

    /// Ciphertext for this identity, but only if the plaintext is unchanged.
    pub fn lookup_ciphertext(&self, id: SecretId, plaintext: &str) -> Option<String> {
        let lock = self.inner.as_ref()?;
        let inner = lock.read();
        let entry = inner.by_secret.get(&id)?;
        if entry.plaintext == plaintext {
            Some(entry.ciphertext.clone())
        } else {
            None
        }
    }

    /// Plaintext previously decrypted or encrypted from this ciphertext.
    pub fn lookup_plaintext(&self, ciphertext: &str) -> Option<String> {
        let lock = self.inner.as_ref()?;
        lock.read().by_ciphertext.get(ciphertext).cloned()
    }
}

impl Default for SecretCache {
    fn default() -> Self {
        SecretCache::new()
    }
}

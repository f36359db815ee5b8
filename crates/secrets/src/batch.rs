//! Batched encryption and decryption
//!
//! Crypto backends charge per round trip, so serialize and deserialize passes
//! buffer their work and send it in bulk:
//!
//! - [`BatchEncrypter`] collects `(identity, plaintext, slot)` work items
//!   during a serialize pass. Cache hits resolve immediately; the rest flush
//!   to the backend in one bulk call, automatically when the buffer fills and
//!   finally on [`BatchEncrypter::complete`]. `complete` consumes the batch,
//!   so enqueueing after completion is impossible.
//! - [`CachingDecrypter`] wraps a backend decrypter with a
//!   ciphertext→plaintext map for one deserialize pass.
//! - [`BatchDecrypter`] is the prefetch half: enqueue every ciphertext found
//!   in a document, complete once, and subsequent per-value decrypts against
//!   the caching decrypter all hit the map.
//!
//! Results land in [`CryptoSlot`]s, shared cells the caller embeds wherever
//! the output belongs. A slot is unresolved until its batch flushes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use groundwork_core::SecretId;

use crate::cache::SecretCache;
use crate::crypter::{Decrypter, Encrypter};
use crate::error::{Result, SecretsError};

/// Buffer size at which a batch flushes on its own.
pub const DEFAULT_MAX_BATCH: usize = 1000;

/// A shared cell that receives one crypto result when its batch flushes.
#[derive(Debug, Clone, Default)]
pub struct CryptoSlot(Arc<Mutex<Option<String>>>);

impl CryptoSlot {
    pub fn new() -> Self {
        CryptoSlot::default()
    }

    /// Store the result. Called by the batch on flush.
    pub fn fill(&self, value: String) {
        *self.0.lock() = Some(value);
    }

    /// The result, or `None` while still unresolved.
    pub fn get(&self) -> Option<String> {
        self.0.lock().clone()
    }
}

struct PendingEncrypt {
    source: SecretId,
    plaintext: String,
    target: CryptoSlot,
}

/// Collects encryption work for one serialize pass.
pub struct BatchEncrypter<'a> {
    encrypter: &'a dyn Encrypter,
    cache: &'a SecretCache,
    pending: Vec<PendingEncrypt>,
    max_batch: usize,
}

impl<'a> BatchEncrypter<'a> {
    pub fn new(encrypter: &'a dyn Encrypter, cache: &'a SecretCache) -> Self {
        Self::with_max_batch(encrypter, cache, DEFAULT_MAX_BATCH)
    }

    pub fn with_max_batch(
        encrypter: &'a dyn Encrypter,
        cache: &'a SecretCache,
        max_batch: usize,
    ) -> Self {
        debug_assert!(max_batch > 0);
        BatchEncrypter {
            encrypter,
            cache,
            pending: Vec::new(),
            max_batch,
        }
    }

    /// Queue one plaintext for encryption into `target`.
    ///
    /// A cache hit (same identity, unchanged plaintext) fills the slot
    /// immediately without touching the backend. Otherwise the item is
    /// buffered; when the buffer is already full the batch flushes first, so
    /// no more than `max_batch` items are ever sent at once.
    pub async fn enqueue(
        &mut self,
        source: SecretId,
        plaintext: String,
        target: CryptoSlot,
    ) -> Result<()> {
        if let Some(ciphertext) = self.cache.lookup_ciphertext(source, &plaintext) {
            target.fill(ciphertext);
            return Ok(());
        }
        if self.pending.len() >= self.max_batch {
            self.flush().await?;
        }
        self.pending.push(PendingEncrypt {
            source,
            plaintext,
            target,
        });
        Ok(())
    }

    /// Flush the remainder. Consumes the batch: after completion every slot
    /// enqueued against it is resolved, and no further work can be queued.
    pub async fn complete(mut self) -> Result<()> {
        self.flush().await
    }

    async fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.pending);
        let plaintexts: Vec<String> = pending.iter().map(|p| p.plaintext.clone()).collect();
        let ciphertexts = self.encrypter.batch_encrypt(&plaintexts).await?;
        if ciphertexts.len() != pending.len() {
            return Err(SecretsError::Encrypt(format!(
                "backend returned {} ciphertexts for {} plaintexts",
                ciphertexts.len(),
                pending.len()
            )));
        }
        tracing::debug!(count = pending.len(), "flushed encryption batch");
        for (item, ciphertext) in pending.into_iter().zip(ciphertexts) {
            self.cache.write(item.source, &item.plaintext, &ciphertext);
            item.target.fill(ciphertext);
        }
        Ok(())
    }
}

/// Wraps a backend decrypter with a ciphertext→plaintext map for one
/// deserialize pass.
pub struct CachingDecrypter<'a> {
    decrypter: &'a dyn Decrypter,
    known: Mutex<HashMap<String, String>>,
}

impl<'a> CachingDecrypter<'a> {
    pub fn new(decrypter: &'a dyn Decrypter) -> Self {
        CachingDecrypter {
            decrypter,
            known: Mutex::new(HashMap::new()),
        }
    }

    /// Plaintext already learned for this ciphertext, if any.
    pub fn lookup(&self, ciphertext: &str) -> Option<String> {
        self.known.lock().get(ciphertext).cloned()
    }
}

#[async_trait::async_trait]
impl Decrypter for CachingDecrypter<'_> {
    async fn decrypt(&self, ciphertext: &str) -> Result<String> {
        if let Some(plaintext) = self.lookup(ciphertext) {
            return Ok(plaintext);
        }
        let plaintext = self.decrypter.decrypt(ciphertext).await?;
        self.known
            .lock()
            .insert(ciphertext.to_string(), plaintext.clone());
        Ok(plaintext)
    }

    /// Decrypt many ciphertexts with at most one backend round trip: cached
    /// entries are served from the map, the rest (deduplicated) go out in a
    /// single bulk call.
    async fn batch_decrypt(&self, ciphertexts: &[String]) -> Result<Vec<String>> {
        let mut to_decrypt: Vec<String> = Vec::new();
        {
            let known = self.known.lock();
            let mut seen: HashMap<&str, ()> = HashMap::new();
            for ciphertext in ciphertexts {
                if !known.contains_key(ciphertext)
                    && seen.insert(ciphertext.as_str(), ()).is_none()
                {
                    to_decrypt.push(ciphertext.clone());
                }
            }
        }
        if !to_decrypt.is_empty() {
            let plaintexts = self.decrypter.batch_decrypt(&to_decrypt).await?;
            if plaintexts.len() != to_decrypt.len() {
                return Err(SecretsError::Decrypt(format!(
                    "backend returned {} plaintexts for {} ciphertexts",
                    plaintexts.len(),
                    to_decrypt.len()
                )));
            }
            let mut known = self.known.lock();
            for (ciphertext, plaintext) in to_decrypt.into_iter().zip(plaintexts) {
                known.insert(ciphertext, plaintext);
            }
        }
        let known = self.known.lock();
        let mut out = Vec::with_capacity(ciphertexts.len());
        for ciphertext in ciphertexts {
            match known.get(ciphertext) {
                Some(plaintext) => out.push(plaintext.clone()),
                None => {
                    return Err(SecretsError::Decrypt(
                        "backend dropped a ciphertext from the batch".to_string(),
                    ))
                }
            }
        }
        Ok(out)
    }
}

struct PendingDecrypt {
    ciphertext: String,
    target: CryptoSlot,
}

/// Collects decryption work for one deserialize pass.
///
/// Mirror image of [`BatchEncrypter`]: enqueue resolves from the caching
/// decrypter's map when possible, the buffer flushes when full and on
/// [`BatchDecrypter::complete`], and completion consumes the batch.
pub struct BatchDecrypter<'a> {
    decrypter: &'a CachingDecrypter<'a>,
    pending: Vec<PendingDecrypt>,
    max_batch: usize,
}

impl<'a> BatchDecrypter<'a> {
    pub fn new(decrypter: &'a CachingDecrypter<'a>) -> Self {
        Self::with_max_batch(decrypter, DEFAULT_MAX_BATCH)
    }

    pub fn with_max_batch(decrypter: &'a CachingDecrypter<'a>, max_batch: usize) -> Self {
        debug_assert!(max_batch > 0);
        BatchDecrypter {
            decrypter,
            pending: Vec::new(),
            max_batch,
        }
    }

    /// Queue one ciphertext for decryption into `target`.
    pub async fn enqueue(&mut self, ciphertext: String, target: CryptoSlot) -> Result<()> {
        if let Some(plaintext) = self.decrypter.lookup(&ciphertext) {
            target.fill(plaintext);
            return Ok(());
        }
        if self.pending.len() >= self.max_batch {
            self.flush().await?;
        }
        self.pending.push(PendingDecrypt { ciphertext, target });
        Ok(())
    }

    /// Flush the remainder and consume the batch.
    pub async fn complete(mut self) -> Result<()> {
        self.flush().await
    }

    async fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.pending);
        let ciphertexts: Vec<String> = pending.iter().map(|p| p.ciphertext.clone()).collect();
        let plaintexts = self.decrypter.batch_decrypt(&ciphertexts).await?;
        tracing::debug!(count = pending.len(), "flushed decryption batch");
        for (item, plaintext) in pending.into_iter().zip(plaintexts) {
            item.target.fill(plaintext);
        }
        Ok(())
    }
}

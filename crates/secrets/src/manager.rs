//! Secrets managers and providers
//!
//! A [`SecretsManager`] owns the crypto for one stack: it exposes an
//! encrypter and decrypter, plus the type tag and opaque state persisted in
//! checkpoints so the same manager can be rebuilt on load. A
//! [`SecretsProvider`] is the factory that performs that rebuild.
//!
//! The only built-in manager is [`Base64SecretsManager`]: an obfuscation-only
//! backend used in tests and local workflows. Real deployments plug in KMS or
//! passphrase managers through the same traits.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::crypter::{Decrypter, Encrypter};
use crate::error::{Result, SecretsError};

/// Owns the crypto for one stack.
pub trait SecretsManager: Send + Sync {
    /// Type tag persisted in checkpoints, e.g. `"b64"`.
    fn type_tag(&self) -> &str;

    /// Opaque state persisted alongside the type tag; everything a
    /// [`SecretsProvider`] needs to rebuild this manager.
    fn state(&self) -> serde_json::Value;

    /// The encrypter for serialize passes.
    fn encrypter(&self) -> &dyn Encrypter;

    /// The decrypter for deserialize passes.
    fn decrypter(&self) -> &dyn Decrypter;
}

/// Rebuilds a [`SecretsManager`] from its persisted type tag and state.
pub trait SecretsProvider: Send + Sync {
    fn of_type(&self, ty: &str, state: &serde_json::Value) -> Result<Arc<dyn SecretsManager>>;
}

/// Type tag of the base64 manager.
pub const BASE64_SECRETS_TYPE: &str = "b64";

/// Obfuscation-only secrets manager: base64 is not encryption.
///
/// Exists so tests and local-only workflows can exercise the full secrets
/// path without a real key service.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64SecretsManager;

impl SecretsManager for Base64SecretsManager {
    fn type_tag(&self) -> &str {
        BASE64_SECRETS_TYPE
    }

    fn state(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    fn encrypter(&self) -> &dyn Encrypter {
        self
    }

    fn decrypter(&self) -> &dyn Decrypter {
        self
    }
}

#[async_trait]
impl Encrypter for Base64SecretsManager {
    async fn encrypt(&self, plaintext: &str) -> Result<String> {
        Ok(BASE64.encode(plaintext.as_bytes()))
    }
}

#[async_trait]
impl Decrypter for Base64SecretsManager {
    async fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let bytes = BASE64
            .decode(ciphertext)
            .map_err(|e| SecretsError::Decrypt(format!("invalid base64: {e}")))?;
        String::from_utf8(bytes).map_err(|e| SecretsError::Decrypt(format!("invalid utf-8: {e}")))
    }
}

/// Provider that knows the built-in manager types.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSecretsProvider;

impl SecretsProvider for DefaultSecretsProvider {
    fn of_type(&self, ty: &str, _state: &serde_json::Value) -> Result<Arc<dyn SecretsManager>> {
        match ty {
            BASE64_SECRETS_TYPE => Ok(Arc::new(Base64SecretsManager)),
            other => Err(SecretsError::UnknownProviderType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_base64_round_trip() {
        let manager = Base64SecretsManager;
        let ct = manager.encrypter().encrypt("hello").await.unwrap();
        assert_eq!(ct, "aGVsbG8=");
        let pt = manager.decrypter().decrypt(&ct).await.unwrap();
        assert_eq!(pt, "hello");
    }

    #[tokio::test]
    async fn test_base64_rejects_garbage() {
        let manager = Base64SecretsManager;
        assert!(matches!(
            manager.decrypter().decrypt("!!! not base64 !!!").await,
            Err(SecretsError::Decrypt(_))
        ));
    }

    #[test]
    fn test_default_provider_builds_base64() {
        let provider = DefaultSecretsProvider;
        let manager = provider
            .of_type(BASE64_SECRETS_TYPE, &serde_json::Value::Null)
            .unwrap();
        assert_eq!(manager.type_tag(), "b64");
        assert!(manager.state().is_null());
    }

    #[test]
    fn test_default_provider_rejects_unknown_type() {
        let provider = DefaultSecretsProvider;
        let err = provider
            .of_type("vault", &serde_json::Value::Null)
            .err()
            .unwrap();
        assert!(matches!(err, SecretsError::UnknownProviderType(t) if t == "vault"));
    }
}

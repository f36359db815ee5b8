//! Error types for secrets management
//!
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.

use thiserror::Error;

/// Result type alias for secrets operations
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Error types for secrets managers and crypters
#[derive(Debug, Error)]
pub enum SecretsError {
    /// No secrets manager is available to decrypt persisted ciphertext
    #[error("snapshot contains encrypted values but no secrets manager is available to decrypt them")]
    MissingSecretsManager,

    /// No factory registered for the persisted manager type
    #[error("no known secrets provider for type {0:?}")]
    UnknownProviderType(String),

    /// The persisted manager state could not be used to rebuild the manager
    #[error("invalid secrets manager state for type {ty:?}: {reason}")]
    InvalidState {
        /// Manager type tag
        ty: String,
        /// What was wrong with the state
        reason: String,
    },

    /// Encryption backend failure
    #[error("encrypt failed: {0}")]
    Encrypt(String),

    /// Decryption backend failure
    #[error("decrypt failed: {0}")]
    Decrypt(String),
}

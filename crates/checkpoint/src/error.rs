//! Error types for checkpoint serialization
//!
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations. The three resource validation messages are a stable
//! contract: tooling matches on them.

use thiserror::Error;

use groundwork_secrets::SecretsError;

/// Result type alias for checkpoint operations
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Error types for deployment and checkpoint codecs
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Persisted resource has no URN
    #[error("resource missing required 'urn' field")]
    ResourceMissingUrn,

    /// Persisted resource has no type token
    #[error("resource '{0}' missing required 'type' field")]
    ResourceMissingType(String),

    /// Component resources never carry a provider-assigned id
    #[error("resource '{0}' has 'custom' false but non-empty ID")]
    NonCustomResourceWithId(String),

    /// Document version is newer than anything this engine understands
    #[error("deployment schema version {0} is newer than the newest supported version; please update the engine")]
    TooNew(i64),

    /// Document version predates the oldest supported migration
    #[error("deployment schema version {0} is older than the oldest supported version")]
    TooOld(i64),

    /// Document declares capabilities this engine does not implement
    #[error("deployment requires unsupported features: {}", .0.join(", "))]
    UnsupportedFeatures(Vec<String>),

    /// Secret wire object with neither or both of ciphertext/plaintext
    #[error("malformed secret value: exactly one of 'ciphertext' or 'plaintext' must be present")]
    MalformedSecret,

    /// Property object carries a signature this engine does not recognize
    #[error("unrecognized signature '{0}' in property map")]
    UnrecognizedSignature(String),

    /// Resource reference wire object is missing or corrupt
    #[error("malformed resource reference: {0}")]
    MalformedResourceReference(String),

    /// Asset wire object is missing its source
    #[error("malformed asset: {0}")]
    MalformedAsset(String),

    /// Archive wire object has missing or corrupt members
    #[error("malformed archive: {0}")]
    MalformedArchive(String),

    /// A secret's ciphertext slot was read before its batch completed
    #[error("secret ciphertext is unresolved; the encryption batch was not completed")]
    UnresolvedSecret,

    /// Context wrapper for property-level failures during resource decode
    #[error("resource '{urn}' property '{property}': {source}")]
    Property {
        /// URN of the resource being decoded
        urn: String,
        /// Property key that failed
        property: String,
        /// Underlying failure
        #[source]
        source: Box<CheckpointError>,
    },

    /// Secrets manager or crypto backend failure
    #[error(transparent)]
    Secrets(#[from] SecretsError),

    /// JSON (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CheckpointError {
    fn from(e: serde_json::Error) -> Self {
        CheckpointError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_are_exact() {
        assert_eq!(
            CheckpointError::ResourceMissingUrn.to_string(),
            "resource missing required 'urn' field"
        );
        assert_eq!(
            CheckpointError::ResourceMissingType("urn:x".to_string()).to_string(),
            "resource 'urn:x' missing required 'type' field"
        );
        assert_eq!(
            CheckpointError::NonCustomResourceWithId("urn:x".to_string()).to_string(),
            "resource 'urn:x' has 'custom' false but non-empty ID"
        );
    }

    #[test]
    fn test_unsupported_features_names_offenders() {
        let err =
            CheckpointError::UnsupportedFeatures(vec!["views".to_string(), "laser".to_string()]);
        let msg = err.to_string();
        assert!(msg.contains("views"));
        assert!(msg.contains("laser"));
    }

    #[test]
    fn test_property_context_chains() {
        let err = CheckpointError::Property {
            urn: "urn:x".to_string(),
            property: "password".to_string(),
            source: Box::new(CheckpointError::MalformedSecret),
        };
        let msg = err.to_string();
        assert!(msg.contains("urn:x"));
        assert!(msg.contains("password"));
    }

    #[test]
    fn test_secrets_error_is_transparent() {
        let err: CheckpointError = SecretsError::MissingSecretsManager.into();
        assert!(err.to_string().contains("no secrets manager"));
    }
}

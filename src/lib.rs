//! Groundwork: durable state for an infrastructure-as-code deployment engine
//!
//! Facade crate re-exporting the workspace members:
//! - `groundwork-core`: the in-memory data model (property values, secrets,
//!   assets, resource records)
//! - `groundwork-secrets`: secrets managers, caching, batched crypto
//! - `groundwork-checkpoint`: the versioned checkpoint wire format
//!
//! ```no_run
//! use std::sync::Arc;
//! use groundwork::{
//!     serialize_checkpoint, Base64SecretsManager, Manifest, PropertyValue, ResourceRecord,
//!     Snapshot, Urn,
//! };
//!
//! # async fn example() -> groundwork::checkpoint::Result<()> {
//! let mut record = ResourceRecord {
//!     urn: Urn::new("urn:gw:dev::app::aws:s3/bucket:Bucket::media"),
//!     ty: "aws:s3/bucket:Bucket".to_string(),
//!     custom: true,
//!     id: "media-4fca2a".to_string(),
//!     ..Default::default()
//! };
//! record.inputs.insert(
//!     "accessKey".to_string(),
//!     PropertyValue::secret(PropertyValue::String("hunter2".to_string())),
//! );
//! let snapshot = Snapshot::new(
//!     Manifest::new("v0.1.0", vec![]),
//!     Some(Arc::new(Base64SecretsManager)),
//!     vec![record],
//!     vec![],
//! );
//! let envelope = serialize_checkpoint("dev", &snapshot, false).await?;
//! let bytes = serde_json::to_vec_pretty(&envelope);
//! # Ok(())
//! # }
//! ```

pub use groundwork_checkpoint as checkpoint;
pub use groundwork_core as model;
pub use groundwork_secrets as secrets;

pub use groundwork_core::{
    Archive, ArchiveMember, ArchiveSource, Asset, AssetSource, CustomTimeouts, Manifest,
    Operation, OperationType, PluginInfo, PropertyMap, PropertyValue, ResourceRecord,
    ResourceReference, Secret, SecretId, Urn,
};

pub use groundwork_secrets::{
    Base64SecretsManager, BatchDecrypter, BatchEncrypter, CachingDecrypter, CryptoSlot,
    Decrypter, DefaultSecretsProvider, Encrypter, ErrorCrypter, NopCrypter, SecretCache,
    SecretsError, SecretsManager, SecretsProvider,
};

pub use groundwork_checkpoint::{
    deserialize_checkpoint, deserialize_deployment, deserialize_untyped_deployment,
    serialize_checkpoint, serialize_checkpoint_with_cache, serialize_deployment,
    serialize_untyped_deployment, CheckpointError, Snapshot,
};

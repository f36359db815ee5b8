//! Versioned checkpoint serialization for groundwork
//!
//! This crate turns an in-memory [`Snapshot`] into the persisted, versioned,
//! partially-encrypted checkpoint document and back:
//!
//! - [`property`]: one property value ⇄ its JSON wire form (signature
//!   objects for secrets, assets, archives, resource references; sentinels
//!   for computed and non-finite values)
//! - [`resource`]: one resource record ⇄ [`apitype::ResourceV3`]
//! - [`deployment`]: whole snapshots, feature gating, bulk crypto passes
//! - [`checkpoint`]: the version envelope, legacy formats, and migration
//! - [`apitype`]: the frozen wire shapes themselves
//! - [`migrate`]: pure upgrade steps between frozen shapes
//!
//! ## Compatibility rules
//!
//! Old state must always load; new state must fail loudly on old engines.
//! Reading migrates forward step by step and never writes anything older
//! than the current version; unknown versions and unknown feature names are
//! terminal errors.

pub mod apitype;
pub mod checkpoint;
pub mod deployment;
pub mod error;
pub mod migrate;
pub mod property;
pub mod resource;

pub use checkpoint::{
    deserialize_checkpoint, deserialize_checkpoint_with_cache, serialize_checkpoint,
    serialize_checkpoint_with_cache, unmarshal_versioned_checkpoint_to_latest,
    untyped_deployment_from_checkpoint,
};
pub use deployment::{
    deserialize_deployment, deserialize_deployment_with_cache, deserialize_untyped_deployment,
    deserialize_untyped_deployment_with_cache, required_features, serialize_deployment,
    serialize_deployment_with_cache, serialize_untyped_deployment, validate_features, Snapshot,
};
pub use error::{CheckpointError, Result};
pub use property::{deserialize_property_value, serialize_property_value, Serialized};
pub use resource::{
    deserialize_operation, deserialize_properties, deserialize_resource, serialize_operation,
    serialize_properties, serialize_resource,
};

//! Core data model for the groundwork deployment engine
//!
//! This crate defines the in-memory representation of deployment state:
//! - [`PropertyValue`] / [`PropertyMap`]: the tagged union carried in resource
//!   inputs and outputs
//! - [`Secret`] / [`SecretId`]: plaintext values marked for encryption, with a
//!   stable per-instance identity
//! - [`Asset`] / [`Archive`]: content-addressed file-like values
//! - [`ResourceRecord`]: one resource's full durable state
//! - [`Manifest`] / [`Operation`]: deployment metadata and in-flight work
//!
//! Everything here is plain data. Wire encoding lives in
//! `groundwork-checkpoint`; encryption lives in `groundwork-secrets`.

pub mod asset;
pub mod resource;
pub mod value;

pub use asset::{Archive, ArchiveMember, ArchiveSource, Asset, AssetSource};
pub use resource::{
    CustomTimeouts, Manifest, Operation, OperationType, PluginInfo, ResourceRecord, Urn,
};
pub use value::{property_maps_deep_equal, PropertyMap, PropertyValue, ResourceReference, Secret, SecretId};

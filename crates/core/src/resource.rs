//! Resource state records
//!
//! This module defines:
//! - Urn: the stable logical identity of a resource
//! - ResourceRecord: one resource's full durable state
//! - Operation / OperationType: in-flight work interrupted mid-deployment
//! - Manifest / PluginInfo: metadata about the run that produced a snapshot
//! - CustomTimeouts: per-resource create/update/delete timeout overrides
//!
//! ## Invariants
//!
//! - Every record has a non-empty URN and type.
//! - Only custom resources carry a provider-assigned id; component resources
//!   never do. The checkpoint decoder enforces both.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::asset::sha256_hex;
use crate::value::PropertyMap;

/// Uniform resource name: the stable logical identity of a resource.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Urn(String);

impl Urn {
    pub fn new(s: impl Into<String>) -> Self {
        Urn(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Urn {
    fn from(s: &str) -> Self {
        Urn(s.to_string())
    }
}

impl From<String> for Urn {
    fn from(s: String) -> Self {
        Urn(s)
    }
}

/// Per-resource timeout overrides, in seconds. Zero means "use the default".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CustomTimeouts {
    pub create: f64,
    pub update: f64,
    pub delete: f64,
}

impl CustomTimeouts {
    /// True when every field is zero; all-zero timeouts are not persisted.
    pub fn is_zero(&self) -> bool {
        self.create == 0.0 && self.update == 0.0 && self.delete == 0.0
    }
}

/// One resource's full durable state.
///
/// Field meanings follow the deployment engine's state model; everything the
/// engine needs to resume, refresh, or delete the resource lives here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceRecord {
    /// Stable logical identity. Never empty.
    pub urn: Urn,
    /// Resource type token. Never empty.
    pub ty: String,
    /// True for provider-managed resources; false for components.
    pub custom: bool,
    /// Marked for deletion but not yet deleted.
    pub delete: bool,
    /// Provider-assigned id. Empty for components and not-yet-created
    /// customs.
    pub id: String,
    /// Input properties.
    pub inputs: PropertyMap,
    /// Output properties.
    pub outputs: PropertyMap,
    /// Parent resource, if any.
    pub parent: Option<Urn>,
    /// Protected resources refuse deletion.
    pub protect: bool,
    /// True when the resource is read from, not managed by, the provider.
    pub external: bool,
    /// URNs this resource depends on.
    pub dependencies: Vec<Urn>,
    /// Errors recorded during a failed initialization.
    pub init_errors: Vec<String>,
    /// Provider reference that manages this resource.
    pub provider: String,
    /// Per-input-property dependency lists.
    pub property_dependencies: BTreeMap<String, Vec<Urn>>,
    /// Scheduled for replacement on the next deployment.
    pub pending_replacement: bool,
    /// Output property names to treat as secret in addition to any the
    /// provider flagged.
    pub additional_secret_outputs: Vec<String>,
    /// Previous URNs this resource was known by.
    pub aliases: Vec<Urn>,
    /// Timeout overrides; persisted only when non-zero.
    pub custom_timeouts: Option<CustomTimeouts>,
    /// Id used to import the resource, when it was imported.
    pub import_id: String,
    /// Leave the remote resource in place when removed from state.
    pub retain_on_delete: bool,
    /// Deleting this resource implicitly deletes the record.
    pub deleted_with: Option<Urn>,
    /// Source location that registered the resource.
    pub source_position: String,
    /// Lifecycle hook bindings, keyed by hook point.
    pub resource_hooks: BTreeMap<String, Vec<String>>,
    /// Refresh this resource before applying updates.
    pub refresh_before_update: bool,
    /// Marked tainted: replace on the next deployment.
    pub taint: bool,
    /// For view resources, the URN of the resource they are a view of.
    pub view_of: Option<Urn>,
}

impl ResourceRecord {
    /// Structural equality with `NaN == NaN` in property values; the
    /// round-trip comparison for snapshots.
    pub fn deep_equals(&self, other: &Self) -> bool {
        let mut a = self.clone();
        let mut b = other.clone();
        let (ai, ao) = (std::mem::take(&mut a.inputs), std::mem::take(&mut a.outputs));
        let (bi, bo) = (std::mem::take(&mut b.inputs), std::mem::take(&mut b.outputs));
        a == b
            && crate::value::property_maps_deep_equal(&ai, &bi)
            && crate::value::property_maps_deep_equal(&ao, &bo)
    }
}

/// Kind of an in-flight operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Creating,
    Updating,
    Deleting,
    Reading,
    Importing,
}

/// An operation that was in flight when a deployment was interrupted.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub resource: ResourceRecord,
    pub kind: OperationType,
}

/// A plugin that participated in producing a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
}

/// Metadata about the deployment run that produced a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    /// When the run happened.
    pub time: DateTime<Utc>,
    /// Integrity tag derived from the engine version.
    pub magic: String,
    /// Engine version that produced the snapshot.
    pub version: String,
    /// Plugins that participated.
    pub plugins: Vec<PluginInfo>,
}

impl Manifest {
    /// Manifest for a run happening now, with the magic derived from the
    /// version.
    pub fn new(version: impl Into<String>, plugins: Vec<PluginInfo>) -> Self {
        let version = version.into();
        let magic = Self::magic_for(&version);
        Manifest {
            time: Utc::now(),
            magic,
            version,
            plugins,
        }
    }

    /// The integrity tag for a given engine version.
    pub fn magic_for(version: &str) -> String {
        sha256_hex(version.as_bytes())
    }
}

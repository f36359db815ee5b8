//! Persisted wire shapes
//!
//! Every struct here is a historical on-disk format. Field names and the
//! signature constants are a byte-for-byte contract with existing state
//! files: never change them, only add optional fields to the newest version
//! or introduce a new versioned struct plus a migration.
//!
//! Versioning works by suffix: `ResourceV1` is frozen forever, `ResourceV2`
//! supersedes it, and `migrate` knows how to upgrade. The envelope
//! ([`VersionedCheckpoint`]) records which version the payload uses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use groundwork_core::OperationType;

use crate::property::Serialized;

// ============================================================================
// Signature constants (frozen)
// ============================================================================

/// Key marking a JSON object as a typed wire value rather than a plain map.
pub const SIG_KEY: &str = "4dabf18193072939515e22adb298388d";

/// Signature of an encrypted (or shown-plaintext) secret object.
pub const SECRET_SIG: &str = "1b47061264138c4ac30d75fd1eb44270";

/// Signature of a resource reference object.
pub const RESOURCE_REFERENCE_SIG: &str = "5cf8f73096256a8f31e491e813e4eb8e";

/// Signature of an asset object.
pub const ASSET_SIG: &str = "c44067f5952c0a294b673a41bacd8c17";

/// Signature of an archive object.
pub const ARCHIVE_SIG: &str = "0def7320c3a5731c473e5ecbe6d01bc7";

/// String standing in for a value that is still being computed.
pub const COMPUTED_VALUE_SENTINEL: &str = "04da6b54-80e4-46f7-96ec-b56ff0331ba9";

/// String sentinels for IEEE-754 values JSON cannot represent.
pub const NAN_SENTINEL: &str = "NaN";
pub const POS_INFINITY_SENTINEL: &str = "Infinity";
pub const NEG_INFINITY_SENTINEL: &str = "-Infinity";

// ============================================================================
// Schema versions and feature gates
// ============================================================================

/// Oldest deployment schema version migrations can still upgrade.
pub const DEPLOYMENT_SCHEMA_VERSION_OLDEST_SUPPORTED: i64 = 1;

/// Version written when no gated feature is in use.
pub const DEPLOYMENT_SCHEMA_VERSION_CURRENT: i64 = 3;

/// Newest version this engine understands. Written only when a gated
/// feature is in use, together with the feature list.
pub const DEPLOYMENT_SCHEMA_VERSION_LATEST: i64 = 4;

/// Features that force a v4 document when present.
pub const FEATURE_REFRESH_BEFORE_UPDATE: &str = "refreshBeforeUpdate";
pub const FEATURE_VIEWS: &str = "views";
pub const FEATURE_HOOKS: &str = "hooks";
pub const FEATURE_TAINTS: &str = "taints";

/// Every feature name this engine implements.
pub const KNOWN_FEATURES: [&str; 4] = [
    FEATURE_REFRESH_BEFORE_UPDATE,
    FEATURE_VIEWS,
    FEATURE_HOOKS,
    FEATURE_TAINTS,
];

fn is_false(b: &bool) -> bool {
    !*b
}

// ============================================================================
// Manifest
// ============================================================================

/// Metadata about the run that produced a deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestV1 {
    pub time: DateTime<Utc>,
    pub magic: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<PluginInfoV1>,
}

/// One plugin that participated in a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfoV1 {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
}

// ============================================================================
// Resources
// ============================================================================

/// First resource shape. Frozen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceV1 {
    pub urn: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub custom: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub delete: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, serde_json::Value>,
    /// Default input values; dropped in V2 and later.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub protect: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

/// Second resource shape: adds external reads, provider references, and
/// initialization errors; drops defaults. Frozen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceV2 {
    pub urn: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub custom: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub delete: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub protect: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub external: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_errors: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider: String,
}

/// Current resource shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceV3 {
    pub urn: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub custom: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub delete: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, Serialized>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Serialized>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub protect: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub external: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_errors: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub property_dependencies: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub pending_replacement: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_secret_outputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_timeouts: Option<CustomTimeoutsV1>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub import_id: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub retain_on_delete: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deleted_with: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_position: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_hooks: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub refresh_before_update: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub taint: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub view_of: String,
}

/// Per-resource timeout overrides, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTimeoutsV1 {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub create: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub update: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub delete: f64,
}

fn is_zero(n: &f64) -> bool {
    *n == 0.0
}

// ============================================================================
// Pending operations
// ============================================================================

/// First pending-operation shape. Frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationV1 {
    pub resource: ResourceV2,
    #[serde(rename = "type")]
    pub kind: OperationType,
}

/// Current pending-operation shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationV2 {
    pub resource: ResourceV3,
    #[serde(rename = "type")]
    pub kind: OperationType,
}

// ============================================================================
// Deployments
// ============================================================================

/// First deployment shape. Frozen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentV1 {
    pub manifest: ManifestV1,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceV1>,
}

/// Second deployment shape: adds pending operations. Frozen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentV2 {
    pub manifest: ManifestV1,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceV2>,
    #[serde(
        rename = "pending_operations",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub pending_operations: Vec<OperationV1>,
}

/// Current deployment shape: adds the secrets manager descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentV3 {
    pub manifest: ManifestV1,
    #[serde(
        rename = "secrets_providers",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub secrets_providers: Option<SecretsProvidersV1>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceV3>,
    #[serde(
        rename = "pending_operations",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub pending_operations: Vec<OperationV2>,
}

/// Descriptor of the secrets manager that encrypted a deployment's secrets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretsProvidersV1 {
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub state: serde_json::Value,
}

/// A deployment whose body has not been decoded yet, with enough metadata to
/// pick the right decoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UntypedDeployment {
    #[serde(default, skip_serializing_if = "version_is_zero")]
    pub version: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default)]
    pub deployment: serde_json::Value,
}

fn version_is_zero(v: &i64) -> bool {
    *v == 0
}

// ============================================================================
// Checkpoints
// ============================================================================

/// First checkpoint shape: the pre-envelope format. Frozen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointV1 {
    pub stack: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<DeploymentV1>,
}

/// Second checkpoint shape. Frozen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointV2 {
    pub stack: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<DeploymentV2>,
}

/// Current checkpoint shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointV3 {
    pub stack: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<DeploymentV3>,
}

/// The version envelope wrapped around every persisted checkpoint.
///
/// A document with no version field at all is the legacy pre-envelope
/// format: the whole document is a [`CheckpointV1`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedCheckpoint {
    #[serde(default, skip_serializing_if = "version_is_zero")]
    pub version: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default)]
    pub checkpoint: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_constants_are_frozen() {
        assert_eq!(SIG_KEY, "4dabf18193072939515e22adb298388d");
        assert_eq!(SECRET_SIG, "1b47061264138c4ac30d75fd1eb44270");
        assert_eq!(RESOURCE_REFERENCE_SIG, "5cf8f73096256a8f31e491e813e4eb8e");
        assert_eq!(ASSET_SIG, "c44067f5952c0a294b673a41bacd8c17");
        assert_eq!(ARCHIVE_SIG, "0def7320c3a5731c473e5ecbe6d01bc7");
        assert_eq!(
            COMPUTED_VALUE_SENTINEL,
            "04da6b54-80e4-46f7-96ec-b56ff0331ba9"
        );
    }

    #[test]
    fn test_resource_v3_omits_defaults() {
        let res = ResourceV3 {
            urn: "urn:x".to_string(),
            ty: "t".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&res).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2, "only urn and type should be present: {obj:?}");
        assert_eq!(obj["urn"], "urn:x");
        assert_eq!(obj["type"], "t");
    }

    #[test]
    fn test_versioned_checkpoint_missing_version_is_zero() {
        let vc: VersionedCheckpoint =
            serde_json::from_str(r#"{"stack": "dev", "latest": null}"#).unwrap();
        assert_eq!(vc.version, 0);
        assert!(vc.checkpoint.is_null());
    }

    #[test]
    fn test_untyped_deployment_round_trip() {
        let untyped = UntypedDeployment {
            version: 4,
            features: vec!["views".to_string()],
            deployment: serde_json::json!({"manifest": {}}),
        };
        let json = serde_json::to_string(&untyped).unwrap();
        let back: UntypedDeployment = serde_json::from_str(&json).unwrap();
        assert_eq!(back.version, 4);
        assert_eq!(back.features, vec!["views"]);
    }

    #[test]
    fn test_custom_timeouts_omit_zero_fields() {
        let t = CustomTimeoutsV1 {
            create: 60.0,
            ..Default::default()
        };
        let json = serde_json::to_value(t).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 1);
    }
}

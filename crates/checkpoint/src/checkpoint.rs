//! Checkpoint envelope
//!
//! A checkpoint is a stack name plus its latest deployment, wrapped in a
//! [`VersionedCheckpoint`] envelope that records the schema version and any
//! gated features. Loading accepts every version from the legacy
//! pre-envelope format through the current one, upgrading step by step;
//! versions outside that range fail with terminal errors rather than a
//! guess.

use serde_json::Value;

use groundwork_secrets::{SecretCache, SecretsProvider};

use crate::apitype::{
    CheckpointV1, CheckpointV2, CheckpointV3, UntypedDeployment, VersionedCheckpoint,
    DEPLOYMENT_SCHEMA_VERSION_CURRENT, DEPLOYMENT_SCHEMA_VERSION_LATEST,
};
use crate::deployment::{
    deserialize_deployment_with_cache, required_features, serialize_deployment_with_cache,
    validate_features, Snapshot,
};
use crate::error::{CheckpointError, Result};
use crate::migrate;

// One frozen checkpoint shape, upgraded a step at a time until it is
// current. A table of pure steps, not a hierarchy.
enum AnyCheckpoint {
    V1(CheckpointV1),
    V2(CheckpointV2),
    V3(CheckpointV3),
}

impl AnyCheckpoint {
    fn upgrade(self) -> AnyCheckpoint {
        match self {
            AnyCheckpoint::V1(c) => AnyCheckpoint::V2(migrate::checkpoint_v1_to_v2(c)),
            AnyCheckpoint::V2(c) => AnyCheckpoint::V3(migrate::checkpoint_v2_to_v3(c)),
            current @ AnyCheckpoint::V3(_) => current,
        }
    }

    fn into_latest(mut self) -> CheckpointV3 {
        loop {
            match self {
                AnyCheckpoint::V3(c) => return c,
                older => self = older.upgrade(),
            }
        }
    }
}

/// Serialize a stack's snapshot into a version-tagged checkpoint envelope.
pub async fn serialize_checkpoint(
    stack: &str,
    snapshot: &Snapshot,
    show_secrets: bool,
) -> Result<VersionedCheckpoint> {
    let cache = SecretCache::new();
    serialize_checkpoint_with_cache(stack, snapshot, &cache, show_secrets).await
}

/// [`serialize_checkpoint`] with an explicit secret cache shared across the
/// update's passes.
pub async fn serialize_checkpoint_with_cache(
    stack: &str,
    snapshot: &Snapshot,
    cache: &SecretCache,
    show_secrets: bool,
) -> Result<VersionedCheckpoint> {
    let deployment = serialize_deployment_with_cache(snapshot, cache, show_secrets).await?;
    let features = required_features(&snapshot.resources);
    let version = if features.is_empty() {
        DEPLOYMENT_SCHEMA_VERSION_CURRENT
    } else {
        DEPLOYMENT_SCHEMA_VERSION_LATEST
    };
    let checkpoint = CheckpointV3 {
        stack: stack.to_string(),
        latest: Some(deployment),
    };
    Ok(VersionedCheckpoint {
        version,
        features,
        checkpoint: serde_json::to_value(&checkpoint)?,
    })
}

/// Parse persisted checkpoint bytes at any supported version and upgrade to
/// the current shape, returning the features the document declared.
///
/// Bytes with no version envelope at all are the legacy pre-envelope format
/// and parse directly as [`CheckpointV1`].
pub fn unmarshal_versioned_checkpoint_to_latest(
    bytes: &[u8],
) -> Result<(CheckpointV3, Vec<String>)> {
    let envelope: VersionedCheckpoint = serde_json::from_slice(bytes)?;
    if envelope.version > DEPLOYMENT_SCHEMA_VERSION_LATEST {
        return Err(CheckpointError::TooNew(envelope.version));
    }
    if envelope.version < 0 {
        return Err(CheckpointError::TooOld(envelope.version));
    }
    validate_features(&envelope.features)?;

    let any = match envelope.version {
        0 => {
            // Legacy: the whole document is the checkpoint.
            tracing::debug!("reading legacy unversioned checkpoint");
            AnyCheckpoint::V1(serde_json::from_slice(bytes)?)
        }
        1 => AnyCheckpoint::V1(serde_json::from_value(envelope.checkpoint)?),
        2 => AnyCheckpoint::V2(serde_json::from_value(envelope.checkpoint)?),
        _ => AnyCheckpoint::V3(serde_json::from_value(envelope.checkpoint)?),
    };
    Ok((any.into_latest(), envelope.features))
}

/// Load a checkpoint from bytes: parse, upgrade, and decode the deployment.
///
/// Returns the stack name and its snapshot; a stack that has never deployed
/// has no snapshot.
pub async fn deserialize_checkpoint(
    bytes: &[u8],
    provider: &dyn SecretsProvider,
) -> Result<(String, Option<Snapshot>)> {
    let cache = SecretCache::new();
    deserialize_checkpoint_with_cache(bytes, provider, &cache).await
}

/// [`deserialize_checkpoint`] with an explicit secret cache.
pub async fn deserialize_checkpoint_with_cache(
    bytes: &[u8],
    provider: &dyn SecretsProvider,
    cache: &SecretCache,
) -> Result<(String, Option<Snapshot>)> {
    let (checkpoint, _features) = unmarshal_versioned_checkpoint_to_latest(bytes)?;
    let snapshot = match &checkpoint.latest {
        Some(deployment) => {
            Some(deserialize_deployment_with_cache(deployment, provider, cache).await?)
        }
        None => None,
    };
    Ok((checkpoint.stack, snapshot))
}

/// Extract the untyped deployment from a checkpoint envelope, preserving the
/// version and features so deployment-level code can dispatch on them.
pub fn untyped_deployment_from_checkpoint(
    envelope: &VersionedCheckpoint,
) -> Result<Option<UntypedDeployment>> {
    let latest = match &envelope.checkpoint {
        Value::Object(map) => map.get("latest").cloned(),
        _ => None,
    };
    Ok(latest.filter(|v| !v.is_null()).map(|deployment| UntypedDeployment {
        version: envelope.version,
        features: envelope.features.clone(),
        deployment,
    }))
}

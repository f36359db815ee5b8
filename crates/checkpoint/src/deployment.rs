//! Deployment codec
//!
//! Translates a whole [`Snapshot`] to and from the persisted deployment
//! document. One serialize pass shares one encryption batch across every
//! resource and pending operation, completed before the document is
//! rendered. One deserialize pass prefetches every ciphertext in the
//! document through a single bulk decrypt before decoding values.
//!
//! ## Versions
//!
//! Documents are written at version 3 unless a gated feature is in use, in
//! which case the version is 4 and the feature names ride alongside. On
//! read, versions older than the current are migrated forward; unknown
//! features and out-of-range versions fail closed.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use groundwork_core::{Manifest, Operation, PluginInfo, ResourceRecord};
use groundwork_secrets::{
    BatchDecrypter, BatchEncrypter, CachingDecrypter, CryptoSlot, Decrypter, Encrypter,
    ErrorCrypter, SecretCache, SecretsManager, SecretsProvider,
};

use crate::apitype::{
    DeploymentV1, DeploymentV2, DeploymentV3, ManifestV1, PluginInfoV1, SecretsProvidersV1,
    UntypedDeployment, DEPLOYMENT_SCHEMA_VERSION_CURRENT, DEPLOYMENT_SCHEMA_VERSION_LATEST,
    DEPLOYMENT_SCHEMA_VERSION_OLDEST_SUPPORTED, FEATURE_HOOKS, FEATURE_REFRESH_BEFORE_UPDATE,
    FEATURE_TAINTS, FEATURE_VIEWS, KNOWN_FEATURES, SECRET_SIG, SIG_KEY,
};
use crate::error::{CheckpointError, Result};
use crate::migrate;
use crate::resource::{
    deserialize_operation, deserialize_resource, serialize_operation, serialize_resource,
};

/// The full in-memory state of one stack.
pub struct Snapshot {
    /// Metadata about the run that produced this state.
    pub manifest: Manifest,
    /// Manager that encrypts this stack's secrets, if one is configured.
    pub secrets_manager: Option<Arc<dyn SecretsManager>>,
    /// Every resource, in dependency order.
    pub resources: Vec<ResourceRecord>,
    /// Operations that were in flight when the last deployment stopped.
    pub pending_operations: Vec<Operation>,
}

impl Snapshot {
    pub fn new(
        manifest: Manifest,
        secrets_manager: Option<Arc<dyn SecretsManager>>,
        resources: Vec<ResourceRecord>,
        pending_operations: Vec<Operation>,
    ) -> Self {
        Snapshot {
            manifest,
            secrets_manager,
            resources,
            pending_operations,
        }
    }

    /// Structural equality with `NaN == NaN` in property values; the
    /// round-trip comparison. Ignores the secrets manager.
    pub fn deep_equals(&self, other: &Self) -> bool {
        self.manifest == other.manifest
            && self.resources.len() == other.resources.len()
            && self
                .resources
                .iter()
                .zip(&other.resources)
                .all(|(a, b)| a.deep_equals(b))
            && self.pending_operations.len() == other.pending_operations.len()
            && self
                .pending_operations
                .iter()
                .zip(&other.pending_operations)
                .all(|(a, b)| a.kind == b.kind && a.resource.deep_equals(&b.resource))
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("manifest", &self.manifest)
            .field("resources", &self.resources.len())
            .field("pending_operations", &self.pending_operations.len())
            .field("has_secrets_manager", &self.secrets_manager.is_some())
            .finish()
    }
}

fn serialize_manifest(manifest: &Manifest) -> ManifestV1 {
    ManifestV1 {
        time: manifest.time,
        magic: manifest.magic.clone(),
        version: manifest.version.clone(),
        plugins: manifest
            .plugins
            .iter()
            .map(|p| PluginInfoV1 {
                name: p.name.clone(),
                path: p.path.clone(),
                kind: p.kind.clone(),
                version: p.version.clone(),
            })
            .collect(),
    }
}

fn deserialize_manifest(raw: &ManifestV1) -> Manifest {
    Manifest {
        time: raw.time,
        magic: raw.magic.clone(),
        version: raw.version.clone(),
        plugins: raw
            .plugins
            .iter()
            .map(|p| PluginInfo {
                name: p.name.clone(),
                path: p.path.clone(),
                kind: p.kind.clone(),
                version: p.version.clone(),
            })
            .collect(),
    }
}

/// Feature names the given resources actually use, in a stable order.
pub fn required_features(resources: &[ResourceRecord]) -> Vec<String> {
    let mut features = Vec::new();
    if resources.iter().any(|r| r.refresh_before_update) {
        features.push(FEATURE_REFRESH_BEFORE_UPDATE.to_string());
    }
    if resources.iter().any(|r| r.view_of.is_some()) {
        features.push(FEATURE_VIEWS.to_string());
    }
    if resources.iter().any(|r| !r.resource_hooks.is_empty()) {
        features.push(FEATURE_HOOKS.to_string());
    }
    if resources.iter().any(|r| r.taint) {
        features.push(FEATURE_TAINTS.to_string());
    }
    features
}

/// Fail closed on any feature name this engine does not implement.
pub fn validate_features(features: &[String]) -> Result<()> {
    let unknown: Vec<String> = features
        .iter()
        .filter(|f| !KNOWN_FEATURES.contains(&f.as_str()))
        .cloned()
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(CheckpointError::UnsupportedFeatures(unknown))
    }
}

/// Serialize a snapshot with a fresh, pass-local secret cache.
pub async fn serialize_deployment(snapshot: &Snapshot, show_secrets: bool) -> Result<DeploymentV3> {
    let cache = SecretCache::new();
    serialize_deployment_with_cache(snapshot, &cache, show_secrets).await
}

/// Serialize a snapshot, reusing `cache` for secret crypto.
///
/// Passing the same cache across an update's repeated serialize passes (and
/// the deserialize that loaded the snapshot) means unchanged secrets keep
/// their ciphertext instead of re-encrypting every pass.
pub async fn serialize_deployment_with_cache(
    snapshot: &Snapshot,
    cache: &SecretCache,
    show_secrets: bool,
) -> Result<DeploymentV3> {
    // With no manager, plain values still serialize; the first secret that
    // actually needs crypto surfaces the configuration error at flush time.
    let missing = ErrorCrypter;
    let encrypter: &dyn Encrypter = match &snapshot.secrets_manager {
        Some(manager) => manager.encrypter(),
        None => &missing,
    };
    // Shown plaintext must never populate the ciphertext cache.
    let disabled;
    let cache = if show_secrets {
        disabled = SecretCache::disabled();
        &disabled
    } else {
        cache
    };

    let mut batch = BatchEncrypter::new(encrypter, cache);
    let mut resources = Vec::with_capacity(snapshot.resources.len());
    for record in &snapshot.resources {
        resources.push(serialize_resource(record, &mut batch, show_secrets).await?);
    }
    let mut pending_operations = Vec::with_capacity(snapshot.pending_operations.len());
    for operation in &snapshot.pending_operations {
        pending_operations.push(serialize_operation(operation, &mut batch, show_secrets).await?);
    }
    batch.complete().await?;

    tracing::debug!(
        resources = resources.len(),
        pending = pending_operations.len(),
        "serialized deployment"
    );

    Ok(DeploymentV3 {
        manifest: serialize_manifest(&snapshot.manifest),
        secrets_providers: snapshot.secrets_manager.as_ref().map(|m| SecretsProvidersV1 {
            type_tag: m.type_tag().to_string(),
            state: m.state(),
        }),
        resources,
        pending_operations,
    })
}

/// Serialize a snapshot into the version-tagged untyped form, bumping to v4
/// when gated features are in use.
pub async fn serialize_untyped_deployment(
    snapshot: &Snapshot,
    cache: &SecretCache,
    show_secrets: bool,
) -> Result<UntypedDeployment> {
    let deployment = serialize_deployment_with_cache(snapshot, cache, show_secrets).await?;
    let features = required_features(&snapshot.resources);
    let version = if features.is_empty() {
        DEPLOYMENT_SCHEMA_VERSION_CURRENT
    } else {
        DEPLOYMENT_SCHEMA_VERSION_LATEST
    };
    Ok(UntypedDeployment {
        version,
        features,
        deployment: serde_json::to_value(&deployment)?,
    })
}

// Walk a raw document collecting every secret object's ciphertext, so the
// whole pass decrypts in one bulk call. Other signature objects carry no
// secrets and are not descended into.
fn collect_ciphertexts(raw: &Value, out: &mut Vec<String>) {
    match raw {
        Value::Array(items) => {
            for item in items {
                collect_ciphertexts(item, out);
            }
        }
        Value::Object(map) => match map.get(SIG_KEY).and_then(Value::as_str) {
            Some(SECRET_SIG) => {
                if let Some(ct) = map.get("ciphertext").and_then(Value::as_str) {
                    out.push(ct.to_string());
                }
            }
            Some(_) => {}
            None => {
                for value in map.values() {
                    collect_ciphertexts(value, out);
                }
            }
        },
        _ => {}
    }
}

/// Deserialize a current-version deployment with a fresh secret cache.
pub async fn deserialize_deployment(
    deployment: &DeploymentV3,
    provider: &dyn SecretsProvider,
) -> Result<Snapshot> {
    let cache = SecretCache::new();
    deserialize_deployment_with_cache(deployment, provider, &cache).await
}

/// Deserialize a current-version deployment, recording decrypted pairs in
/// `cache` so later serialize passes can reuse ciphertext.
pub async fn deserialize_deployment_with_cache(
    deployment: &DeploymentV3,
    provider: &dyn SecretsProvider,
    cache: &SecretCache,
) -> Result<Snapshot> {
    let secrets_manager = match &deployment.secrets_providers {
        Some(descriptor) => Some(provider.of_type(&descriptor.type_tag, &descriptor.state)?),
        None => None,
    };

    // Prefetch: one bulk decrypt covering every ciphertext in the document.
    let mut ciphertexts = Vec::new();
    for resource in &deployment.resources {
        for value in resource.inputs.values().chain(resource.outputs.values()) {
            collect_ciphertexts(&value.to_value()?, &mut ciphertexts);
        }
    }
    for operation in &deployment.pending_operations {
        let resource = &operation.resource;
        for value in resource.inputs.values().chain(resource.outputs.values()) {
            collect_ciphertexts(&value.to_value()?, &mut ciphertexts);
        }
    }
    // Pairs already learned by this update's cache need no backend call.
    ciphertexts.retain(|ct| cache.lookup_plaintext(ct).is_none());
    if !ciphertexts.is_empty() && secrets_manager.is_none() {
        return Err(groundwork_secrets::SecretsError::MissingSecretsManager.into());
    }

    let missing = ErrorCrypter;
    let backend: &dyn Decrypter = match &secrets_manager {
        Some(manager) => manager.decrypter(),
        None => &missing,
    };
    let caching = CachingDecrypter::new(backend);
    if !ciphertexts.is_empty() {
        tracing::debug!(count = ciphertexts.len(), "prefetching secret decryption");
        let mut batch = BatchDecrypter::new(&caching);
        for ciphertext in ciphertexts {
            batch.enqueue(ciphertext, CryptoSlot::new()).await?;
        }
        batch.complete().await?;
    }

    let mut resources = Vec::with_capacity(deployment.resources.len());
    for raw in &deployment.resources {
        resources.push(deserialize_resource(raw, &caching, cache).await?);
    }
    let mut pending_operations = Vec::with_capacity(deployment.pending_operations.len());
    for raw in &deployment.pending_operations {
        pending_operations.push(deserialize_operation(raw, &caching, cache).await?);
    }

    Ok(Snapshot {
        manifest: deserialize_manifest(&deployment.manifest),
        secrets_manager,
        resources,
        pending_operations,
    })
}

/// Decode an untyped deployment at any supported version, migrating old
/// documents forward.
pub async fn deserialize_untyped_deployment(
    untyped: &UntypedDeployment,
    provider: &dyn SecretsProvider,
) -> Result<Snapshot> {
    let cache = SecretCache::new();
    deserialize_untyped_deployment_with_cache(untyped, provider, &cache).await
}

/// [`deserialize_untyped_deployment`] with an explicit secret cache.
pub async fn deserialize_untyped_deployment_with_cache(
    untyped: &UntypedDeployment,
    provider: &dyn SecretsProvider,
    cache: &SecretCache,
) -> Result<Snapshot> {
    if untyped.version > DEPLOYMENT_SCHEMA_VERSION_LATEST {
        return Err(CheckpointError::TooNew(untyped.version));
    }
    if untyped.version < DEPLOYMENT_SCHEMA_VERSION_OLDEST_SUPPORTED {
        return Err(CheckpointError::TooOld(untyped.version));
    }
    validate_features(&untyped.features)?;

    let deployment = match untyped.version {
        1 => {
            let v1: DeploymentV1 = serde_json::from_value(untyped.deployment.clone())?;
            migrate::deployment_v2_to_v3(migrate::deployment_v1_to_v2(v1))
        }
        2 => {
            let v2: DeploymentV2 = serde_json::from_value(untyped.deployment.clone())?;
            migrate::deployment_v2_to_v3(v2)
        }
        _ => serde_json::from_value(untyped.deployment.clone())?,
    };
    deserialize_deployment_with_cache(&deployment, provider, cache).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwork_core::{PropertyMap, PropertyValue, Urn};
    use groundwork_secrets::testing::CountingSecretsManager;
    use groundwork_secrets::{DefaultSecretsProvider, SecretsError};
    use serde_json::json;
    use std::sync::Arc;

    struct CountingProvider(Arc<CountingSecretsManager>);

    impl SecretsProvider for CountingProvider {
        fn of_type(
            &self,
            ty: &str,
            _state: &Value,
        ) -> groundwork_secrets::Result<Arc<dyn SecretsManager>> {
            match ty {
                "counting" => Ok(self.0.clone()),
                other => Err(SecretsError::UnknownProviderType(other.to_string())),
            }
        }
    }

    fn record(urn: &str, inputs: PropertyMap) -> ResourceRecord {
        ResourceRecord {
            urn: Urn::new(urn),
            ty: "test:mod:typ".to_string(),
            custom: true,
            id: "id".to_string(),
            inputs,
            ..Default::default()
        }
    }

    fn snapshot_with_secrets(manager: Arc<CountingSecretsManager>) -> Snapshot {
        let mut inputs = PropertyMap::new();
        inputs.insert(
            "password".to_string(),
            PropertyValue::secret(PropertyValue::String("hunter2".to_string())),
        );
        inputs.insert(
            "token".to_string(),
            PropertyValue::secret(PropertyValue::String("tok".to_string())),
        );
        Snapshot::new(
            Manifest::new("v0.1.0", vec![]),
            Some(manager),
            vec![record("urn:gw:dev::p::test:mod:typ::a", inputs)],
            vec![],
        )
    }

    #[tokio::test]
    async fn test_round_trip_restores_snapshot() {
        let manager = Arc::new(CountingSecretsManager::new());
        let snapshot = snapshot_with_secrets(manager.clone());
        let deployment = serialize_deployment(&snapshot, false).await.unwrap();

        let provider = CountingProvider(manager);
        let back = deserialize_deployment(&deployment, &provider).await.unwrap();
        assert!(back.deep_equals(&snapshot));
        assert_eq!(
            back.secrets_manager.as_ref().map(|m| m.type_tag().to_string()),
            Some("counting".to_string())
        );
    }

    #[tokio::test]
    async fn test_one_batch_per_serialize_pass() {
        let manager = Arc::new(CountingSecretsManager::new());
        let snapshot = snapshot_with_secrets(manager.clone());
        serialize_deployment(&snapshot, false).await.unwrap();
        // Two secrets, one flush
        assert_eq!(manager.crypter().encrypt_count(), 2);
        assert_eq!(manager.crypter().batch_count(), 1);
    }

    #[tokio::test]
    async fn test_shared_cache_skips_reencryption() {
        let manager = Arc::new(CountingSecretsManager::new());
        let snapshot = snapshot_with_secrets(manager.clone());
        let cache = SecretCache::new();
        let first = serialize_deployment_with_cache(&snapshot, &cache, false)
            .await
            .unwrap();
        let second = serialize_deployment_with_cache(&snapshot, &cache, false)
            .await
            .unwrap();
        assert_eq!(manager.crypter().encrypt_count(), 2);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_deserialize_prefetches_in_one_bulk_call() {
        let manager = Arc::new(CountingSecretsManager::new());
        let snapshot = snapshot_with_secrets(manager.clone());
        let deployment = serialize_deployment(&snapshot, false).await.unwrap();

        let provider = CountingProvider(manager.clone());
        deserialize_deployment(&deployment, &provider).await.unwrap();
        assert_eq!(manager.crypter().decrypt_batch_count(), 1);
        assert_eq!(manager.crypter().decrypt_count(), 0);
    }

    #[tokio::test]
    async fn test_reload_then_save_reuses_ciphertext() {
        let manager = Arc::new(CountingSecretsManager::new());
        let snapshot = snapshot_with_secrets(manager.clone());
        let deployment = serialize_deployment(&snapshot, false).await.unwrap();
        assert_eq!(manager.crypter().encrypt_count(), 2);

        let provider = CountingProvider(manager.clone());
        let cache = SecretCache::new();
        let loaded = deserialize_deployment_with_cache(&deployment, &provider, &cache)
            .await
            .unwrap();
        let saved = serialize_deployment_with_cache(&loaded, &cache, false)
            .await
            .unwrap();
        // Unchanged secrets keep their ciphertext
        assert_eq!(manager.crypter().encrypt_count(), 2);
        assert_eq!(
            serde_json::to_value(&deployment).unwrap(),
            serde_json::to_value(&saved).unwrap()
        );
    }

    #[tokio::test]
    async fn test_shared_cache_skips_decryption_on_reload() {
        let manager = Arc::new(CountingSecretsManager::new());
        let snapshot = snapshot_with_secrets(manager.clone());
        let deployment = serialize_deployment(&snapshot, false).await.unwrap();

        let provider = CountingProvider(manager.clone());
        let cache = SecretCache::new();
        deserialize_deployment_with_cache(&deployment, &provider, &cache)
            .await
            .unwrap();
        deserialize_deployment_with_cache(&deployment, &provider, &cache)
            .await
            .unwrap();
        // The second pass is served entirely from the shared cache
        assert_eq!(manager.crypter().decrypt_batch_count(), 1);
        assert_eq!(manager.crypter().decrypt_count(), 0);
    }

    #[tokio::test]
    async fn test_secrets_without_manager_fails_on_serialize() {
        let mut inputs = PropertyMap::new();
        inputs.insert(
            "pw".to_string(),
            PropertyValue::secret(PropertyValue::String("x".to_string())),
        );
        let snapshot = Snapshot::new(
            Manifest::new("v0.1.0", vec![]),
            None,
            vec![record("urn:gw:dev::p::t::a", inputs)],
            vec![],
        );
        let err = serialize_deployment(&snapshot, false).await.unwrap_err();
        assert!(err.to_string().contains("no secrets manager"));
    }

    #[tokio::test]
    async fn test_plain_snapshot_without_manager_is_fine() {
        let mut inputs = PropertyMap::new();
        inputs.insert("n".to_string(), PropertyValue::Number(1.0));
        let snapshot = Snapshot::new(
            Manifest::new("v0.1.0", vec![]),
            None,
            vec![record("urn:gw:dev::p::t::a", inputs)],
            vec![],
        );
        let deployment = serialize_deployment(&snapshot, false).await.unwrap();
        assert!(deployment.secrets_providers.is_none());

        let back = deserialize_deployment(&deployment, &DefaultSecretsProvider)
            .await
            .unwrap();
        assert!(back.deep_equals(&snapshot));
    }

    #[tokio::test]
    async fn test_ciphertext_without_manager_fails_on_deserialize() {
        let mut deployment = DeploymentV3 {
            manifest: serialize_manifest(&Manifest::new("v0.1.0", vec![])),
            ..Default::default()
        };
        let mut inputs = std::collections::BTreeMap::new();
        inputs.insert(
            "pw".to_string(),
            crate::property::Serialized::Value(json!({
                SIG_KEY: SECRET_SIG,
                "ciphertext": "0:x",
            })),
        );
        deployment.resources.push(crate::apitype::ResourceV3 {
            urn: "urn:x::r".to_string(),
            ty: "t".to_string(),
            custom: true,
            inputs,
            ..Default::default()
        });

        let err = deserialize_deployment(&deployment, &DefaultSecretsProvider)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no secrets manager"));
    }

    #[tokio::test]
    async fn test_show_secrets_emits_plaintext_and_caches_nothing() {
        let manager = Arc::new(CountingSecretsManager::new());
        let snapshot = snapshot_with_secrets(manager.clone());
        let cache = SecretCache::new();
        let deployment = serialize_deployment_with_cache(&snapshot, &cache, true)
            .await
            .unwrap();
        assert_eq!(manager.crypter().encrypt_count(), 0);

        let raw = serde_json::to_value(&deployment).unwrap();
        let password = &raw["resources"][0]["inputs"]["password"];
        assert_eq!(password[SIG_KEY], SECRET_SIG);
        assert!(password.get("plaintext").is_some());
    }

    #[test]
    fn test_required_features() {
        let mut plain = record("urn:x::a", PropertyMap::new());
        plain.custom = true;
        assert!(required_features(&[plain.clone()]).is_empty());

        let mut tainted = plain.clone();
        tainted.taint = true;
        let mut viewed = plain.clone();
        viewed.view_of = Some(Urn::new("urn:x::b"));
        let features = required_features(&[tainted, viewed]);
        assert_eq!(features, vec!["views".to_string(), "taints".to_string()]);
    }

    #[tokio::test]
    async fn test_feature_use_bumps_version_to_latest() {
        let manager = Arc::new(CountingSecretsManager::new());
        let mut snapshot = snapshot_with_secrets(manager);
        let cache = SecretCache::new();
        let untyped = serialize_untyped_deployment(&snapshot, &cache, false)
            .await
            .unwrap();
        assert_eq!(untyped.version, DEPLOYMENT_SCHEMA_VERSION_CURRENT);
        assert!(untyped.features.is_empty());

        snapshot.resources[0].refresh_before_update = true;
        let untyped = serialize_untyped_deployment(&snapshot, &cache, false)
            .await
            .unwrap();
        assert_eq!(untyped.version, DEPLOYMENT_SCHEMA_VERSION_LATEST);
        assert_eq!(untyped.features, vec!["refreshBeforeUpdate".to_string()]);
    }

    #[tokio::test]
    async fn test_too_new_and_too_old_versions_fail() {
        let untyped = UntypedDeployment {
            version: DEPLOYMENT_SCHEMA_VERSION_LATEST + 1,
            ..Default::default()
        };
        let err = deserialize_untyped_deployment(&untyped, &DefaultSecretsProvider)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::TooNew(v) if v == 5));

        let untyped = UntypedDeployment {
            version: DEPLOYMENT_SCHEMA_VERSION_OLDEST_SUPPORTED - 1,
            ..Default::default()
        };
        let err = deserialize_untyped_deployment(&untyped, &DefaultSecretsProvider)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::TooOld(v) if v == 0));
    }

    #[tokio::test]
    async fn test_unknown_feature_fails_closed() {
        let untyped = UntypedDeployment {
            version: DEPLOYMENT_SCHEMA_VERSION_LATEST,
            features: vec!["views".to_string(), "quantum".to_string()],
            deployment: json!({"manifest": {"time": "2024-01-01T00:00:00Z", "magic": "", "version": ""}}),
        };
        let err = deserialize_untyped_deployment(&untyped, &DefaultSecretsProvider)
            .await
            .unwrap_err();
        match err {
            CheckpointError::UnsupportedFeatures(names) => {
                assert_eq!(names, vec!["quantum".to_string()]);
            }
            other => panic!("expected UnsupportedFeatures, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_old_versions_migrate_forward() {
        let v1 = json!({
            "manifest": {"time": "2020-01-01T00:00:00Z", "magic": "m", "version": "v0.0.1"},
            "resources": [{
                "urn": "urn:gw:dev::p::t::old",
                "type": "t",
                "custom": true,
                "id": "i-old",
                "inputs": {"n": 1.0},
                "defaults": {"ignored": true},
            }],
        });
        let untyped = UntypedDeployment {
            version: 1,
            features: vec![],
            deployment: v1,
        };
        let snapshot = deserialize_untyped_deployment(&untyped, &DefaultSecretsProvider)
            .await
            .unwrap();
        assert_eq!(snapshot.resources.len(), 1);
        let resource = &snapshot.resources[0];
        assert_eq!(resource.urn.as_str(), "urn:gw:dev::p::t::old");
        assert_eq!(resource.id, "i-old");
        assert!(!resource.external);
        assert_eq!(
            resource.inputs.get("n"),
            Some(&PropertyValue::Number(1.0))
        );
    }
}

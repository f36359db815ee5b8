//! Resource codec
//!
//! Field-for-field translation between the in-memory [`ResourceRecord`] and
//! the persisted [`ResourceV3`]. Serialization defers secret crypto to the
//! pass's batch; deserialization validates the record before decoding any
//! property (non-empty URN, non-empty type, no id on components) and wraps
//! property failures with the URN and key that failed.

use std::collections::BTreeMap;

use groundwork_core::{
    CustomTimeouts, Operation, PropertyMap, ResourceRecord, Urn,
};
use groundwork_secrets::{BatchEncrypter, Decrypter, SecretCache};

use crate::apitype::{CustomTimeoutsV1, OperationV2, ResourceV3};
use crate::error::{CheckpointError, Result};
use crate::property::{deserialize_property_value, serialize_property_value, Serialized};

/// Serialize a property map, queueing secret crypto on `encrypter`.
pub async fn serialize_properties(
    map: &PropertyMap,
    encrypter: &mut BatchEncrypter<'_>,
    show_secrets: bool,
) -> Result<BTreeMap<String, Serialized>> {
    let mut out = BTreeMap::new();
    for (key, value) in map {
        out.insert(
            key.clone(),
            serialize_property_value(value, &mut *encrypter, show_secrets).await?,
        );
    }
    Ok(out)
}

/// Serialize one resource record. Secret slots resolve when the pass's batch
/// completes.
pub async fn serialize_resource(
    record: &ResourceRecord,
    encrypter: &mut BatchEncrypter<'_>,
    show_secrets: bool,
) -> Result<ResourceV3> {
    Ok(ResourceV3 {
        urn: record.urn.to_string(),
        custom: record.custom,
        delete: record.delete,
        id: record.id.clone(),
        ty: record.ty.clone(),
        inputs: serialize_properties(&record.inputs, &mut *encrypter, show_secrets).await?,
        outputs: serialize_properties(&record.outputs, &mut *encrypter, show_secrets).await?,
        parent: record
            .parent
            .as_ref()
            .map(Urn::to_string)
            .unwrap_or_default(),
        protect: record.protect,
        external: record.external,
        dependencies: record.dependencies.iter().map(Urn::to_string).collect(),
        init_errors: record.init_errors.clone(),
        provider: record.provider.clone(),
        property_dependencies: record
            .property_dependencies
            .iter()
            .map(|(k, deps)| (k.clone(), deps.iter().map(Urn::to_string).collect()))
            .collect(),
        pending_replacement: record.pending_replacement,
        additional_secret_outputs: record.additional_secret_outputs.clone(),
        aliases: record.aliases.iter().map(Urn::to_string).collect(),
        // All-zero timeouts carry no information; leave them out.
        custom_timeouts: record
            .custom_timeouts
            .filter(|t| !t.is_zero())
            .map(|t| CustomTimeoutsV1 {
                create: t.create,
                update: t.update,
                delete: t.delete,
            }),
        import_id: record.import_id.clone(),
        retain_on_delete: record.retain_on_delete,
        deleted_with: record
            .deleted_with
            .as_ref()
            .map(Urn::to_string)
            .unwrap_or_default(),
        source_position: record.source_position.clone(),
        resource_hooks: record.resource_hooks.clone(),
        refresh_before_update: record.refresh_before_update,
        taint: record.taint,
        view_of: record
            .view_of
            .as_ref()
            .map(Urn::to_string)
            .unwrap_or_default(),
    })
}

/// Serialize one pending operation.
pub async fn serialize_operation(
    operation: &Operation,
    encrypter: &mut BatchEncrypter<'_>,
    show_secrets: bool,
) -> Result<OperationV2> {
    Ok(OperationV2 {
        resource: serialize_resource(&operation.resource, encrypter, show_secrets).await?,
        kind: operation.kind,
    })
}

/// Deserialize a persisted property map, wrapping failures with the owning
/// URN and property key.
pub async fn deserialize_properties(
    urn: &str,
    raw: &BTreeMap<String, Serialized>,
    decrypter: &dyn Decrypter,
    cache: &SecretCache,
) -> Result<PropertyMap> {
    let mut out = PropertyMap::new();
    for (key, value) in raw {
        let raw_value = value.to_value()?;
        let decoded = deserialize_property_value(&raw_value, decrypter, cache)
            .await
            .map_err(|e| CheckpointError::Property {
                urn: urn.to_string(),
                property: key.clone(),
                source: Box::new(e),
            })?;
        out.insert(key.clone(), decoded);
    }
    Ok(out)
}

fn non_empty_urn(s: &str) -> Option<Urn> {
    if s.is_empty() {
        None
    } else {
        Some(Urn::new(s))
    }
}

/// Deserialize one persisted resource, validating before decoding.
///
/// Validation order is fixed: missing URN, then missing type, then an id on
/// a non-custom resource. The messages are a stable contract.
pub async fn deserialize_resource(
    raw: &ResourceV3,
    decrypter: &dyn Decrypter,
    cache: &SecretCache,
) -> Result<ResourceRecord> {
    if raw.urn.is_empty() {
        return Err(CheckpointError::ResourceMissingUrn);
    }
    if raw.ty.is_empty() {
        return Err(CheckpointError::ResourceMissingType(raw.urn.clone()));
    }
    if !raw.custom && !raw.id.is_empty() {
        return Err(CheckpointError::NonCustomResourceWithId(raw.urn.clone()));
    }

    Ok(ResourceRecord {
        urn: Urn::new(&raw.urn),
        ty: raw.ty.clone(),
        custom: raw.custom,
        delete: raw.delete,
        id: raw.id.clone(),
        inputs: deserialize_properties(&raw.urn, &raw.inputs, decrypter, cache).await?,
        outputs: deserialize_properties(&raw.urn, &raw.outputs, decrypter, cache).await?,
        parent: non_empty_urn(&raw.parent),
        protect: raw.protect,
        external: raw.external,
        dependencies: raw.dependencies.iter().map(Urn::new).collect(),
        init_errors: raw.init_errors.clone(),
        provider: raw.provider.clone(),
        property_dependencies: raw
            .property_dependencies
            .iter()
            .map(|(k, deps)| (k.clone(), deps.iter().map(Urn::new).collect()))
            .collect(),
        pending_replacement: raw.pending_replacement,
        additional_secret_outputs: raw.additional_secret_outputs.clone(),
        aliases: raw.aliases.iter().map(Urn::new).collect(),
        custom_timeouts: raw.custom_timeouts.filter(|t| {
            !CustomTimeouts {
                create: t.create,
                update: t.update,
                delete: t.delete,
            }
            .is_zero()
        }).map(|t| CustomTimeouts {
            create: t.create,
            update: t.update,
            delete: t.delete,
        }),
        import_id: raw.import_id.clone(),
        retain_on_delete: raw.retain_on_delete,
        deleted_with: non_empty_urn(&raw.deleted_with),
        source_position: raw.source_position.clone(),
        resource_hooks: raw.resource_hooks.clone(),
        refresh_before_update: raw.refresh_before_update,
        taint: raw.taint,
        view_of: non_empty_urn(&raw.view_of),
    })
}

/// Deserialize one persisted pending operation.
pub async fn deserialize_operation(
    raw: &OperationV2,
    decrypter: &dyn Decrypter,
    cache: &SecretCache,
) -> Result<Operation> {
    Ok(Operation {
        resource: deserialize_resource(&raw.resource, decrypter, cache).await?,
        kind: raw.kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwork_core::PropertyValue;
    use groundwork_secrets::NopCrypter;

    fn sample_record() -> ResourceRecord {
        let mut inputs = PropertyMap::new();
        inputs.insert("size".to_string(), PropertyValue::Number(4.0));
        let mut record = ResourceRecord {
            urn: Urn::new("urn:gw:dev::proj::aws:ec2/instance:Instance::web"),
            ty: "aws:ec2/instance:Instance".to_string(),
            custom: true,
            id: "i-0abc".to_string(),
            inputs,
            provider: "urn:gw:dev::proj::gw:providers:aws::default::uuid".to_string(),
            ..Default::default()
        };
        record
            .dependencies
            .push(Urn::new("urn:gw:dev::proj::aws:s3/bucket:Bucket::b"));
        record
    }

    async fn encode(record: &ResourceRecord) -> ResourceV3 {
        let nop = NopCrypter;
        let cache = SecretCache::disabled();
        let mut batch = BatchEncrypter::new(&nop, &cache);
        let raw = serialize_resource(record, &mut batch, false).await.unwrap();
        batch.complete().await.unwrap();
        raw
    }

    #[tokio::test]
    async fn test_resource_round_trip() {
        let record = sample_record();
        let raw = encode(&record).await;
        let cache = SecretCache::new();
        let back = deserialize_resource(&raw, &NopCrypter, &cache).await.unwrap();
        assert!(back.deep_equals(&record));
    }

    #[tokio::test]
    async fn test_missing_urn_is_rejected_first() {
        let raw = ResourceV3::default();
        let cache = SecretCache::new();
        let err = deserialize_resource(&raw, &NopCrypter, &cache)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "resource missing required 'urn' field");
    }

    #[tokio::test]
    async fn test_missing_type_is_rejected() {
        let raw = ResourceV3 {
            urn: "urn:x::r".to_string(),
            ..Default::default()
        };
        let cache = SecretCache::new();
        let err = deserialize_resource(&raw, &NopCrypter, &cache)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "resource 'urn:x::r' missing required 'type' field"
        );
    }

    #[tokio::test]
    async fn test_component_with_id_is_rejected() {
        let raw = ResourceV3 {
            urn: "urn:x::r".to_string(),
            ty: "t".to_string(),
            custom: false,
            id: "i-123".to_string(),
            ..Default::default()
        };
        let cache = SecretCache::new();
        let err = deserialize_resource(&raw, &NopCrypter, &cache)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "resource 'urn:x::r' has 'custom' false but non-empty ID"
        );
    }

    #[tokio::test]
    async fn test_custom_with_empty_id_is_fine() {
        // A custom resource not yet created has no id
        let raw = ResourceV3 {
            urn: "urn:x::r".to_string(),
            ty: "t".to_string(),
            custom: true,
            ..Default::default()
        };
        let cache = SecretCache::new();
        let back = deserialize_resource(&raw, &NopCrypter, &cache).await.unwrap();
        assert!(back.custom);
        assert!(back.id.is_empty());
    }

    #[tokio::test]
    async fn test_zero_timeouts_are_dropped() {
        let mut record = sample_record();
        record.custom_timeouts = Some(CustomTimeouts::default());
        let raw = encode(&record).await;
        assert!(raw.custom_timeouts.is_none());

        record.custom_timeouts = Some(CustomTimeouts {
            create: 300.0,
            ..Default::default()
        });
        let raw = encode(&record).await;
        assert_eq!(raw.custom_timeouts.unwrap().create, 300.0);
    }

    #[tokio::test]
    async fn test_property_errors_carry_context() {
        let mut inputs = BTreeMap::new();
        inputs.insert(
            "broken".to_string(),
            Serialized::Value(serde_json::json!({
                crate::apitype::SIG_KEY: "ffffffffffffffffffffffffffffffff"
            })),
        );
        let raw = ResourceV3 {
            urn: "urn:x::r".to_string(),
            ty: "t".to_string(),
            custom: true,
            inputs,
            ..Default::default()
        };
        let cache = SecretCache::new();
        let err = deserialize_resource(&raw, &NopCrypter, &cache)
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("urn:x::r"));
        assert!(msg.contains("broken"));
    }
}

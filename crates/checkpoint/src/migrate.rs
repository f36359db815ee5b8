//! Version migrations
//!
//! Pure upgrade functions from each frozen wire shape to its successor.
//! Fields that did not exist in the older shape get the empty/default value;
//! fields the newer shape dropped (V1 `defaults`) are discarded. There is no
//! downgrade path: migration is monotonic, and loading old state then saving
//! writes the current version.

use std::collections::BTreeMap;

use crate::apitype::{
    CheckpointV1, CheckpointV2, CheckpointV3, DeploymentV1, DeploymentV2, DeploymentV3,
    OperationV1, OperationV2, ResourceV1, ResourceV2, ResourceV3,
};
use crate::property::Serialized;

pub fn resource_v1_to_v2(old: ResourceV1) -> ResourceV2 {
    ResourceV2 {
        urn: old.urn,
        custom: old.custom,
        delete: old.delete,
        id: old.id,
        ty: old.ty,
        inputs: old.inputs,
        // `defaults` is dropped: engines stopped distinguishing defaulted
        // inputs long ago.
        outputs: old.outputs,
        parent: old.parent,
        protect: old.protect,
        external: false,
        dependencies: old.dependencies,
        init_errors: Vec::new(),
        provider: String::new(),
    }
}

fn wrap_properties(
    raw: BTreeMap<String, serde_json::Value>,
) -> BTreeMap<String, Serialized> {
    raw.into_iter()
        .map(|(k, v)| (k, Serialized::Value(v)))
        .collect()
}

pub fn resource_v2_to_v3(old: ResourceV2) -> ResourceV3 {
    ResourceV3 {
        urn: old.urn,
        custom: old.custom,
        delete: old.delete,
        id: old.id,
        ty: old.ty,
        inputs: wrap_properties(old.inputs),
        outputs: wrap_properties(old.outputs),
        parent: old.parent,
        protect: old.protect,
        external: old.external,
        dependencies: old.dependencies,
        init_errors: old.init_errors,
        provider: old.provider,
        ..Default::default()
    }
}

pub fn operation_v1_to_v2(old: OperationV1) -> OperationV2 {
    OperationV2 {
        resource: resource_v2_to_v3(old.resource),
        kind: old.kind,
    }
}

pub fn deployment_v1_to_v2(old: DeploymentV1) -> DeploymentV2 {
    DeploymentV2 {
        manifest: old.manifest,
        resources: old.resources.into_iter().map(resource_v1_to_v2).collect(),
        pending_operations: Vec::new(),
    }
}

pub fn deployment_v2_to_v3(old: DeploymentV2) -> DeploymentV3 {
    DeploymentV3 {
        manifest: old.manifest,
        secrets_providers: None,
        resources: old.resources.into_iter().map(resource_v2_to_v3).collect(),
        pending_operations: old
            .pending_operations
            .into_iter()
            .map(operation_v1_to_v2)
            .collect(),
    }
}

pub fn checkpoint_v1_to_v2(old: CheckpointV1) -> CheckpointV2 {
    CheckpointV2 {
        stack: old.stack,
        latest: old.latest.map(deployment_v1_to_v2),
    }
}

pub fn checkpoint_v2_to_v3(old: CheckpointV2) -> CheckpointV3 {
    CheckpointV3 {
        stack: old.stack,
        latest: old.latest.map(deployment_v2_to_v3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn old_resource() -> ResourceV1 {
        let mut inputs = BTreeMap::new();
        inputs.insert("n".to_string(), json!(1));
        let mut defaults = BTreeMap::new();
        defaults.insert("region".to_string(), json!("us-west-2"));
        ResourceV1 {
            urn: "urn:gw:dev::p::t::r".to_string(),
            custom: true,
            id: "i-1".to_string(),
            ty: "t".to_string(),
            inputs,
            defaults,
            ..Default::default()
        }
    }

    #[test]
    fn test_v1_to_v2_drops_defaults_and_synthesizes_new_fields() {
        let new = resource_v1_to_v2(old_resource());
        assert_eq!(new.urn, "urn:gw:dev::p::t::r");
        assert_eq!(new.inputs["n"], json!(1));
        assert!(!new.external);
        assert!(new.init_errors.is_empty());
        assert!(new.provider.is_empty());
    }

    #[test]
    fn test_v2_to_v3_wraps_properties() {
        let v3 = resource_v2_to_v3(resource_v1_to_v2(old_resource()));
        assert!(v3.inputs.contains_key("n"));
        assert!(v3.property_dependencies.is_empty());
        assert!(v3.custom_timeouts.is_none());
        assert!(!v3.refresh_before_update);
    }

    #[test]
    fn test_deployment_chain_preserves_manifest_and_counts() {
        let v1 = DeploymentV1 {
            manifest: crate::apitype::ManifestV1 {
                magic: "m".to_string(),
                version: "v0.0.1".to_string(),
                ..Default::default()
            },
            resources: vec![old_resource(), old_resource()],
        };
        let v3 = deployment_v2_to_v3(deployment_v1_to_v2(v1));
        assert_eq!(v3.manifest.version, "v0.0.1");
        assert_eq!(v3.resources.len(), 2);
        assert!(v3.secrets_providers.is_none());
        assert!(v3.pending_operations.is_empty());
    }

    #[test]
    fn test_checkpoint_chain() {
        let v1 = CheckpointV1 {
            stack: "dev".to_string(),
            latest: Some(DeploymentV1 {
                manifest: Default::default(),
                resources: vec![old_resource()],
            }),
        };
        let v3 = checkpoint_v2_to_v3(checkpoint_v1_to_v2(v1));
        assert_eq!(v3.stack, "dev");
        assert_eq!(v3.latest.unwrap().resources.len(), 1);
    }

    #[test]
    fn test_empty_checkpoint_migrates() {
        let v1 = CheckpointV1 {
            stack: "empty".to_string(),
            latest: None,
        };
        let v3 = checkpoint_v2_to_v3(checkpoint_v1_to_v2(v1));
        assert!(v3.latest.is_none());
    }
}

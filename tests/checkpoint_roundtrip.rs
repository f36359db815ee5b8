//! End-to-end checkpoint round trips through the public facade.

use std::collections::BTreeMap;
use std::sync::Arc;

use groundwork::{
    deserialize_checkpoint, serialize_checkpoint, Archive, ArchiveMember, Asset,
    Base64SecretsManager, CustomTimeouts, DefaultSecretsProvider, Manifest, Operation,
    OperationType, PropertyMap, PropertyValue, ResourceRecord, ResourceReference, Snapshot, Urn,
};

fn full_snapshot() -> Snapshot {
    let mut inputs = PropertyMap::new();
    inputs.insert("nan".to_string(), PropertyValue::Number(f64::NAN));
    inputs.insert("posInf".to_string(), PropertyValue::Number(f64::INFINITY));
    inputs.insert(
        "negInf".to_string(),
        PropertyValue::Number(f64::NEG_INFINITY),
    );
    inputs.insert("count".to_string(), PropertyValue::Number(3.0));
    inputs.insert(
        "config".to_string(),
        PropertyValue::Asset(Asset::from_text("alpha beta gamma")),
    );
    let mut members = BTreeMap::new();
    members.insert(
        "config.json".to_string(),
        ArchiveMember::Asset(Asset::from_text("{}")),
    );
    inputs.insert(
        "bundle".to_string(),
        PropertyValue::Archive(Archive::from_assets(members)),
    );
    inputs.insert(
        "parentRef".to_string(),
        PropertyValue::ResourceReference(ResourceReference::component(
            "urn:gw:dev::app::pkg:index:Component::parent",
            "2.0.0",
        )),
    );
    inputs.insert(
        "dbRef".to_string(),
        PropertyValue::ResourceReference(ResourceReference::custom(
            "urn:gw:dev::app::pkg:index:Db::db",
            "db-123",
            "2.0.0",
        )),
    );
    inputs.insert(
        "password".to_string(),
        PropertyValue::secret(PropertyValue::String("there".to_string())),
    );
    inputs.insert(
        "pending".to_string(),
        PropertyValue::computed(PropertyValue::String(String::new())),
    );

    let mut outputs = PropertyMap::new();
    outputs.insert(
        "endpoint".to_string(),
        PropertyValue::String("https://example.com".to_string()),
    );

    let web = ResourceRecord {
        urn: Urn::new("urn:gw:dev::app::pkg:index:Server::web"),
        ty: "pkg:index:Server".to_string(),
        custom: true,
        id: "srv-1".to_string(),
        inputs,
        outputs,
        protect: true,
        custom_timeouts: Some(CustomTimeouts {
            create: 300.0,
            ..Default::default()
        }),
        ..Default::default()
    };
    let parent = ResourceRecord {
        urn: Urn::new("urn:gw:dev::app::pkg:index:Component::parent"),
        ty: "pkg:index:Component".to_string(),
        ..Default::default()
    };
    let in_flight = ResourceRecord {
        urn: Urn::new("urn:gw:dev::app::pkg:index:Server::spare"),
        ty: "pkg:index:Server".to_string(),
        custom: true,
        ..Default::default()
    };

    Snapshot::new(
        Manifest::new("v0.1.0", vec![]),
        Some(Arc::new(Base64SecretsManager)),
        vec![parent, web],
        vec![Operation {
            resource: in_flight,
            kind: OperationType::Creating,
        }],
    )
}

#[tokio::test]
async fn round_trip_preserves_everything() {
    let snapshot = full_snapshot();
    let envelope = serialize_checkpoint("dev", &snapshot, false).await.unwrap();
    let bytes = serde_json::to_vec(&envelope).unwrap();

    let (stack, loaded) = deserialize_checkpoint(&bytes, &DefaultSecretsProvider)
        .await
        .unwrap();
    assert_eq!(stack, "dev");
    let loaded = loaded.unwrap();
    assert!(loaded.deep_equals(&snapshot));
    // The computed placeholder decodes as a computed empty string
    assert_eq!(
        loaded.resources[1].inputs.get("pending"),
        Some(&PropertyValue::computed(PropertyValue::String(String::new())))
    );
}

#[tokio::test]
async fn serialization_is_deterministic() {
    let snapshot = full_snapshot();
    let cache = groundwork::SecretCache::new();
    let a = groundwork::serialize_checkpoint_with_cache("dev", &snapshot, &cache, false)
        .await
        .unwrap();
    let b = groundwork::serialize_checkpoint_with_cache("dev", &snapshot, &cache, false)
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[tokio::test]
async fn base64_secret_is_readable_on_the_wire() {
    let snapshot = full_snapshot();
    let envelope = serialize_checkpoint("dev", &snapshot, false).await.unwrap();
    let raw = serde_json::to_value(&envelope).unwrap();

    let password = &raw["checkpoint"]["latest"]["resources"][1]["inputs"]["password"];
    let ciphertext = password["ciphertext"].as_str().unwrap();
    // The b64 manager only obfuscates: the ciphertext is the base64 of the
    // marshaled element, here the JSON string "there".
    use base64::Engine as _;
    let plaintext = base64::engine::general_purpose::STANDARD
        .decode(ciphertext)
        .unwrap();
    assert_eq!(plaintext, b"\"there\"");
}

#[tokio::test]
async fn secret_properties_never_leak_plaintext() {
    let snapshot = full_snapshot();
    let envelope = serialize_checkpoint("dev", &snapshot, false).await.unwrap();
    let text = serde_json::to_string(&envelope).unwrap();
    assert!(!text.contains("there"), "plaintext leaked into checkpoint");
}

#[tokio::test]
async fn show_secrets_round_trips_without_a_decrypter() {
    let snapshot = full_snapshot();
    let envelope = serialize_checkpoint("dev", &snapshot, true).await.unwrap();
    let text = serde_json::to_string(&envelope).unwrap();
    assert!(text.contains("there"));

    // Plaintext secrets decode without any crypto
    let bytes = text.into_bytes();
    let (_, loaded) = deserialize_checkpoint(&bytes, &DefaultSecretsProvider)
        .await
        .unwrap();
    assert!(loaded.unwrap().deep_equals(&snapshot));
}

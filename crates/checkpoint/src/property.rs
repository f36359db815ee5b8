//! Property value codec
//!
//! Turns a [`PropertyValue`] into its persisted JSON form and back. Plain
//! values map straight through; typed values (secrets, assets, archives,
//! resource references, computed placeholders) become signature objects: a
//! JSON object whose [`SIG_KEY`] entry names the type.
//!
//! ## Deferred ciphertext
//!
//! Serialization never performs crypto inline. A secret serializes to a
//! [`Serialized::Secret`] holding a [`CryptoSlot`]; the plaintext is queued
//! on the pass's [`BatchEncrypter`] and the slot is filled when the batch
//! flushes. Rendering the tree to JSON before completing the batch is an
//! error, not a panic.
//!
//! ## Non-finite numbers
//!
//! JSON has no NaN or infinities, so they persist as the string sentinels
//! `"NaN"`, `"Infinity"`, `"-Infinity"` and decode back to numbers. Like the
//! computed-value sentinel, this makes those exact strings ambiguous with
//! real string data; the trade is accepted and documented here.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use groundwork_core::{
    Archive, ArchiveMember, ArchiveSource, Asset, AssetSource, PropertyMap, PropertyValue,
    ResourceReference, Secret, Urn,
};
use groundwork_secrets::{
    BatchEncrypter, CryptoSlot, Decrypter, NopCrypter, SecretCache,
};

use crate::apitype::{
    ARCHIVE_SIG, ASSET_SIG, COMPUTED_VALUE_SENTINEL, NAN_SENTINEL, NEG_INFINITY_SENTINEL,
    POS_INFINITY_SENTINEL, RESOURCE_REFERENCE_SIG, SECRET_SIG, SIG_KEY,
};
use crate::error::{CheckpointError, Result};

/// A serialized property tree.
///
/// Everything except secrets is final JSON; secrets hold a slot that is
/// resolved when the pass's encryption batch completes.
#[derive(Debug, Clone)]
pub enum Serialized {
    /// Final JSON (plain values, assets, references, sentinels).
    Value(Value),
    /// Array with possibly-unresolved children.
    Array(Vec<Serialized>),
    /// Object with possibly-unresolved children.
    Object(BTreeMap<String, Serialized>),
    /// A secret: exactly one of `plaintext` (shown secrets) or `ciphertext`
    /// (slot filled by the encryption batch) is set.
    Secret {
        ciphertext: Option<CryptoSlot>,
        plaintext: Option<String>,
    },
}

impl Serialized {
    /// Render to plain JSON, failing if any secret slot is unresolved.
    pub fn to_value(&self) -> Result<Value> {
        match self {
            Serialized::Value(v) => Ok(v.clone()),
            Serialized::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.to_value()?);
                }
                Ok(Value::Array(out))
            }
            Serialized::Object(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map {
                    out.insert(k.clone(), v.to_value()?);
                }
                Ok(Value::Object(out))
            }
            Serialized::Secret {
                ciphertext,
                plaintext,
            } => {
                let mut out = serde_json::Map::new();
                out.insert(SIG_KEY.to_string(), Value::String(SECRET_SIG.to_string()));
                if let Some(pt) = plaintext {
                    out.insert("plaintext".to_string(), Value::String(pt.clone()));
                } else {
                    let slot = ciphertext.as_ref().ok_or(CheckpointError::MalformedSecret)?;
                    let ct = slot.get().ok_or(CheckpointError::UnresolvedSecret)?;
                    out.insert("ciphertext".to_string(), Value::String(ct));
                }
                Ok(Value::Object(out))
            }
        }
    }
}

impl Serialize for Serialized {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Serialized::Value(v) => v.serialize(serializer),
            Serialized::Array(items) => serializer.collect_seq(items),
            Serialized::Object(map) => serializer.collect_map(map),
            Serialized::Secret {
                ciphertext,
                plaintext,
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(SIG_KEY, SECRET_SIG)?;
                if let Some(pt) = plaintext {
                    map.serialize_entry("plaintext", pt)?;
                } else {
                    let ct = ciphertext
                        .as_ref()
                        .and_then(|slot| slot.get())
                        .ok_or_else(|| {
                            S::Error::custom(
                                "secret ciphertext is unresolved; the encryption batch was not completed",
                            )
                        })?;
                    map.serialize_entry("ciphertext", &ct)?;
                }
                map.end()
            }
        }
    }
}

// Deserialization never sees unresolved slots: persisted documents are plain
// JSON by the time they are read back.
impl<'de> Deserialize<'de> for Serialized {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Serialized::Value(Value::deserialize(deserializer)?))
    }
}

fn serialize_number(n: f64) -> Value {
    if n.is_nan() {
        Value::String(NAN_SENTINEL.to_string())
    } else if n == f64::INFINITY {
        Value::String(POS_INFINITY_SENTINEL.to_string())
    } else if n == f64::NEG_INFINITY {
        Value::String(NEG_INFINITY_SENTINEL.to_string())
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn serialize_asset(asset: &Asset) -> Value {
    let mut out = serde_json::Map::new();
    out.insert(SIG_KEY.to_string(), Value::String(ASSET_SIG.to_string()));
    if !asset.hash.is_empty() {
        out.insert("hash".to_string(), Value::String(asset.hash.clone()));
    }
    let (key, val) = match &asset.source {
        AssetSource::Text(t) => ("text", t),
        AssetSource::Path(p) => ("path", p),
        AssetSource::Uri(u) => ("uri", u),
    };
    out.insert(key.to_string(), Value::String(val.clone()));
    Value::Object(out)
}

fn serialize_archive(archive: &Archive) -> Value {
    let mut out = serde_json::Map::new();
    out.insert(SIG_KEY.to_string(), Value::String(ARCHIVE_SIG.to_string()));
    if !archive.hash.is_empty() {
        out.insert("hash".to_string(), Value::String(archive.hash.clone()));
    }
    match &archive.source {
        ArchiveSource::Assets(members) => {
            let mut assets = serde_json::Map::new();
            for (name, member) in members {
                let encoded = match member {
                    ArchiveMember::Asset(a) => serialize_asset(a),
                    ArchiveMember::Archive(a) => serialize_archive(a),
                };
                assets.insert(name.clone(), encoded);
            }
            out.insert("assets".to_string(), Value::Object(assets));
        }
        ArchiveSource::Path(p) => {
            out.insert("path".to_string(), Value::String(p.clone()));
        }
        ArchiveSource::Uri(u) => {
            out.insert("uri".to_string(), Value::String(u.clone()));
        }
    }
    Value::Object(out)
}

fn serialize_resource_reference(reference: &ResourceReference) -> Value {
    let mut out = serde_json::Map::new();
    out.insert(
        SIG_KEY.to_string(),
        Value::String(RESOURCE_REFERENCE_SIG.to_string()),
    );
    out.insert(
        "urn".to_string(),
        Value::String(reference.urn.as_str().to_string()),
    );
    // An empty id is meaningful (a custom resource whose id is not yet
    // known); only component references omit the field entirely.
    if let Some(id) = &reference.id {
        out.insert("id".to_string(), Value::String(id.clone()));
    }
    out.insert(
        "packageVersion".to_string(),
        Value::String(reference.package_version.clone()),
    );
    Value::Object(out)
}

/// Serialize one property value.
///
/// Secrets are queued on `encrypter`; their slots resolve when the batch
/// completes. With `show_secrets` the plaintext is stored instead (still
/// inside a secret signature object, so secretness survives a round trip).
pub fn serialize_property_value<'a, 'b: 'a>(
    value: &'a PropertyValue,
    encrypter: &'a mut BatchEncrypter<'b>,
    show_secrets: bool,
) -> BoxFuture<'a, Result<Serialized>> {
    Box::pin(async move {
        match value {
            PropertyValue::Null => Ok(Serialized::Value(Value::Null)),
            PropertyValue::Bool(b) => Ok(Serialized::Value(Value::Bool(*b))),
            PropertyValue::Number(n) => Ok(Serialized::Value(serialize_number(*n))),
            PropertyValue::String(s) => Ok(Serialized::Value(Value::String(s.clone()))),
            PropertyValue::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(serialize_property_value(item, &mut *encrypter, show_secrets).await?);
                }
                Ok(Serialized::Array(out))
            }
            PropertyValue::Object(map) => {
                let mut out = BTreeMap::new();
                for (k, v) in map {
                    out.insert(
                        k.clone(),
                        serialize_property_value(v, &mut *encrypter, show_secrets).await?,
                    );
                }
                Ok(Serialized::Object(out))
            }
            // The placeholder, not the partial value, is persisted.
            PropertyValue::Computed(_) => Ok(Serialized::Value(Value::String(
                COMPUTED_VALUE_SENTINEL.to_string(),
            ))),
            PropertyValue::Asset(a) => Ok(Serialized::Value(serialize_asset(a))),
            PropertyValue::Archive(a) => Ok(Serialized::Value(serialize_archive(a))),
            PropertyValue::ResourceReference(r) => {
                Ok(Serialized::Value(serialize_resource_reference(r)))
            }
            PropertyValue::Secret(secret) => {
                serialize_secret(secret, encrypter, show_secrets).await
            }
        }
    })
}

async fn serialize_secret(
    secret: &Secret,
    encrypter: &mut BatchEncrypter<'_>,
    show_secrets: bool,
) -> Result<Serialized> {
    // The element is serialized with a pass-through batch: nested secrets
    // stay marked but their plaintext rides inside the enclosing secret's
    // ciphertext, encrypted exactly once. The disabled cache keeps these
    // pass-through "ciphertexts" out of the real cache.
    let nop = NopCrypter;
    let nop_cache = SecretCache::disabled();
    let mut nop_batch = BatchEncrypter::new(&nop, &nop_cache);
    let element = serialize_property_value(&secret.element, &mut nop_batch, show_secrets).await?;
    nop_batch.complete().await?;
    let plaintext = serde_json::to_string(&element.to_value()?)?;

    if show_secrets {
        Ok(Serialized::Secret {
            ciphertext: None,
            plaintext: Some(plaintext),
        })
    } else {
        let slot = CryptoSlot::new();
        encrypter
            .enqueue(secret.id(), plaintext, slot.clone())
            .await?;
        Ok(Serialized::Secret {
            ciphertext: Some(slot),
            plaintext: None,
        })
    }
}

fn deserialize_number(n: &serde_json::Number) -> Result<PropertyValue> {
    n.as_f64()
        .map(PropertyValue::Number)
        .ok_or_else(|| CheckpointError::Serialization(format!("number out of range: {n}")))
}

fn deserialize_asset(map: &serde_json::Map<String, Value>) -> Result<Asset> {
    let hash = map
        .get("hash")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let source = if let Some(text) = map.get("text").and_then(Value::as_str) {
        AssetSource::Text(text.to_string())
    } else if let Some(path) = map.get("path").and_then(Value::as_str) {
        AssetSource::Path(path.to_string())
    } else if let Some(uri) = map.get("uri").and_then(Value::as_str) {
        AssetSource::Uri(uri.to_string())
    } else {
        return Err(CheckpointError::MalformedAsset(
            "missing one of 'text', 'path', or 'uri'".to_string(),
        ));
    };
    Ok(Asset { hash, source })
}

fn deserialize_archive(map: &serde_json::Map<String, Value>) -> Result<Archive> {
    let hash = map
        .get("hash")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let source = if let Some(assets) = map.get("assets") {
        let assets = assets.as_object().ok_or_else(|| {
            CheckpointError::MalformedArchive("'assets' is not an object".to_string())
        })?;
        let mut members = BTreeMap::new();
        for (name, raw) in assets {
            let obj = raw.as_object().ok_or_else(|| {
                CheckpointError::MalformedArchive(format!("member '{name}' is not an object"))
            })?;
            let member = match obj.get(SIG_KEY).and_then(Value::as_str) {
                Some(ASSET_SIG) => ArchiveMember::Asset(deserialize_asset(obj)?),
                Some(ARCHIVE_SIG) => ArchiveMember::Archive(deserialize_archive(obj)?),
                _ => {
                    return Err(CheckpointError::MalformedArchive(format!(
                        "member '{name}' is neither an asset nor an archive"
                    )))
                }
            };
            members.insert(name.clone(), member);
        }
        ArchiveSource::Assets(members)
    } else if let Some(path) = map.get("path").and_then(Value::as_str) {
        ArchiveSource::Path(path.to_string())
    } else if let Some(uri) = map.get("uri").and_then(Value::as_str) {
        ArchiveSource::Uri(uri.to_string())
    } else {
        return Err(CheckpointError::MalformedArchive(
            "missing one of 'assets', 'path', or 'uri'".to_string(),
        ));
    };
    Ok(Archive { hash, source })
}

// Old writers serialized the reference id as a marshaled property value
// instead of a plain string. Read-side shim only; writers emit plain
// strings.
fn deserialize_reference_id(raw: Option<&Value>) -> Result<Option<String>> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Object(legacy)) => match legacy.get("V") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            // A marshaled unknown: keep the reference, id not yet known.
            Some(Value::Object(_)) => Ok(Some(String::new())),
            Some(other) => Err(CheckpointError::MalformedResourceReference(format!(
                "legacy id has unexpected shape: {other}"
            ))),
        },
        Some(other) => Err(CheckpointError::MalformedResourceReference(format!(
            "id has unexpected shape: {other}"
        ))),
    }
}

fn deserialize_resource_reference(
    map: &serde_json::Map<String, Value>,
) -> Result<ResourceReference> {
    let urn = map
        .get("urn")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CheckpointError::MalformedResourceReference("missing 'urn'".to_string())
        })?;
    let package_version = map
        .get("packageVersion")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(ResourceReference {
        urn: Urn::new(urn),
        id: deserialize_reference_id(map.get("id"))?,
        package_version,
    })
}

/// Deserialize one persisted property value.
///
/// Secret ciphertext goes through `decrypter`; decrypted pairs are recorded
/// in `cache` so a later serialize of the same (unchanged) secret reuses the
/// ciphertext instead of re-encrypting. Pairs the cache already knows are
/// served without touching the decrypter at all.
pub fn deserialize_property_value<'a>(
    raw: &'a Value,
    decrypter: &'a dyn Decrypter,
    cache: &'a SecretCache,
) -> BoxFuture<'a, Result<PropertyValue>> {
    Box::pin(async move {
        match raw {
            Value::Null => Ok(PropertyValue::Null),
            Value::Bool(b) => Ok(PropertyValue::Bool(*b)),
            Value::Number(n) => deserialize_number(n),
            Value::String(s) => Ok(match s.as_str() {
                // The sentinel erased the partial value; decode as a computed
                // empty string.
                COMPUTED_VALUE_SENTINEL => {
                    PropertyValue::computed(PropertyValue::String(String::new()))
                }
                NAN_SENTINEL => PropertyValue::Number(f64::NAN),
                POS_INFINITY_SENTINEL => PropertyValue::Number(f64::INFINITY),
                NEG_INFINITY_SENTINEL => PropertyValue::Number(f64::NEG_INFINITY),
                _ => PropertyValue::String(s.clone()),
            }),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(deserialize_property_value(item, decrypter, cache).await?);
                }
                Ok(PropertyValue::Array(out))
            }
            Value::Object(map) => match map.get(SIG_KEY).and_then(Value::as_str) {
                None => {
                    let mut out = PropertyMap::new();
                    for (k, v) in map {
                        out.insert(
                            k.clone(),
                            deserialize_property_value(v, decrypter, cache).await?,
                        );
                    }
                    Ok(PropertyValue::Object(out))
                }
                Some(ASSET_SIG) => Ok(PropertyValue::Asset(deserialize_asset(map)?)),
                Some(ARCHIVE_SIG) => Ok(PropertyValue::Archive(deserialize_archive(map)?)),
                Some(RESOURCE_REFERENCE_SIG) => Ok(PropertyValue::ResourceReference(
                    deserialize_resource_reference(map)?,
                )),
                Some(SECRET_SIG) => deserialize_secret(map, decrypter, cache).await,
                Some(other) => Err(CheckpointError::UnrecognizedSignature(other.to_string())),
            },
        }
    })
}

async fn deserialize_secret(
    map: &serde_json::Map<String, Value>,
    decrypter: &dyn Decrypter,
    cache: &SecretCache,
) -> Result<PropertyValue> {
    let ciphertext = map.get("ciphertext").and_then(Value::as_str);
    let shown = map.get("plaintext").and_then(Value::as_str);
    let (plaintext, ciphertext) = match (ciphertext, shown) {
        (Some(ct), None) => {
            // Pairs this update has already seen need no backend call.
            let plaintext = match cache.lookup_plaintext(ct) {
                Some(known) => known,
                None => decrypter.decrypt(ct).await?,
            };
            (plaintext, Some(ct))
        }
        (None, Some(pt)) => (pt.to_string(), None),
        _ => return Err(CheckpointError::MalformedSecret),
    };

    let element_raw: Value = serde_json::from_str(&plaintext)?;
    // Nested values need no crypto: the plaintext above already contains
    // them decrypted. The disabled cache keeps their pass-through pairs out
    // of the real cache.
    let nop = NopCrypter;
    let nop_cache = SecretCache::disabled();
    let element = deserialize_property_value(&element_raw, &nop, &nop_cache).await?;

    let secret = Secret::new(element);
    if let Some(ct) = ciphertext {
        cache.write(secret.id(), &plaintext, ct);
    }
    Ok(PropertyValue::Secret(Box::new(secret)))
}

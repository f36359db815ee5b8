//! Property values for groundwork
//!
//! This module defines:
//! - PropertyValue: the tagged union carried in resource inputs and outputs
//! - PropertyMap: a key-sorted map of property values
//! - Secret / SecretId: plaintext marked for encryption, with stable identity
//! - ResourceReference: a pointer from one resource's properties to another
//!
//! ## Equality
//!
//! `PartialEq` follows IEEE-754 for numbers (`NaN != NaN`), and ignores
//! secret identity: two secrets with equal elements compare equal even though
//! they encrypt independently. [`PropertyValue::deep_equals`] is the
//! round-trip comparison used by snapshot code: it treats `NaN == NaN`, so a
//! value that survived serialization compares equal to the original.
//!
//! ## Secret identity
//!
//! Every `Secret` is stamped with a process-unique [`SecretId`] at
//! construction. Clones share the id; a re-wrapped plaintext gets a fresh one.
//! The encryption cache is keyed by `(SecretId, plaintext)`, so ciphertext is
//! only ever reused for the same logical secret with unchanged plaintext.
//! Distinct secrets holding equal plaintext always encrypt separately.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::asset::{Archive, Asset};
use crate::resource::Urn;

/// A key-sorted map of property values.
///
/// `BTreeMap` keeps keys ordered, so serializing the same map twice produces
/// byte-identical output.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

static NEXT_SECRET_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of one secret instance.
///
/// Allocated from a process-global counter when the secret is constructed.
/// Never reused, never derived from the plaintext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretId(u64);

impl SecretId {
    fn fresh() -> Self {
        SecretId(NEXT_SECRET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A property value whose plaintext must never be persisted unencrypted.
#[derive(Debug, Clone)]
pub struct Secret {
    id: SecretId,
    /// The wrapped plaintext value. May itself contain nested secrets.
    pub element: PropertyValue,
}

impl Secret {
    /// Wrap a value as a secret, stamping it with a fresh identity.
    pub fn new(element: PropertyValue) -> Self {
        Secret {
            id: SecretId::fresh(),
            element,
        }
    }

    /// The identity assigned at construction. Clones share it.
    pub fn id(&self) -> SecretId {
        self.id
    }
}

// Equality ignores identity: the id exists for cache keying, not comparison.
impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.element == other.element
    }
}

/// A reference from one resource's properties to another resource.
///
/// Component references carry no id. Custom references carry `Some(id)`,
/// where the empty string means the id is not yet known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    /// URN of the referenced resource.
    pub urn: Urn,
    /// `None` for component resources; `Some` for custom resources.
    pub id: Option<String>,
    /// Version of the package that produced the referenced resource.
    pub package_version: String,
}

impl ResourceReference {
    /// Reference to a component resource (no id).
    pub fn component(urn: impl Into<Urn>, package_version: impl Into<String>) -> Self {
        ResourceReference {
            urn: urn.into(),
            id: None,
            package_version: package_version.into(),
        }
    }

    /// Reference to a custom resource. An empty id means "not yet known".
    pub fn custom(
        urn: impl Into<Urn>,
        id: impl Into<String>,
        package_version: impl Into<String>,
    ) -> Self {
        ResourceReference {
            urn: urn.into(),
            id: Some(id.into()),
            package_version: package_version.into(),
        }
    }
}

/// The tagged union carried in resource inputs and outputs.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit floating point (IEEE-754). NaN and infinities are legal.
    Number(f64),
    /// UTF-8 string
    String(String),
    /// Array of values
    Array(Vec<PropertyValue>),
    /// Object with sorted string keys
    Object(PropertyMap),
    /// Content-addressed file-like value
    Asset(Asset),
    /// Content-addressed collection of assets
    Archive(Archive),
    /// Plaintext that must be encrypted before persisting
    Secret(Box<Secret>),
    /// Reference to another resource
    ResourceReference(ResourceReference),
    /// A value not yet known (still being computed by the engine)
    Computed(Box<PropertyValue>),
}

impl PropertyValue {
    /// Wrap a value as a secret with a fresh identity.
    pub fn secret(element: PropertyValue) -> Self {
        PropertyValue::Secret(Box::new(Secret::new(element)))
    }

    /// Mark a value as not yet known.
    pub fn computed(element: PropertyValue) -> Self {
        PropertyValue::Computed(Box::new(element))
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "Null",
            PropertyValue::Bool(_) => "Bool",
            PropertyValue::Number(_) => "Number",
            PropertyValue::String(_) => "String",
            PropertyValue::Array(_) => "Array",
            PropertyValue::Object(_) => "Object",
            PropertyValue::Asset(_) => "Asset",
            PropertyValue::Archive(_) => "Archive",
            PropertyValue::Secret(_) => "Secret",
            PropertyValue::ResourceReference(_) => "ResourceReference",
            PropertyValue::Computed(_) => "Computed",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Check if this is a secret value
    pub fn is_secret(&self) -> bool {
        matches!(self, PropertyValue::Secret(_))
    }

    /// Check if this is a computed (not yet known) value
    pub fn is_computed(&self) -> bool {
        matches!(self, PropertyValue::Computed(_))
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as f64 if this is a Number value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &[PropertyValue] if this is an Array value
    pub fn as_array(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get as &PropertyMap if this is an Object value
    pub fn as_object(&self) -> Option<&PropertyMap> {
        match self {
            PropertyValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get the wrapped secret if this is a Secret value
    pub fn as_secret(&self) -> Option<&Secret> {
        match self {
            PropertyValue::Secret(s) => Some(s),
            _ => None,
        }
    }

    /// True if this value, or any value nested inside it, is a secret.
    pub fn contains_secrets(&self) -> bool {
        match self {
            PropertyValue::Secret(_) => true,
            PropertyValue::Array(items) => items.iter().any(|v| v.contains_secrets()),
            PropertyValue::Object(map) => map.values().any(|v| v.contains_secrets()),
            PropertyValue::Computed(inner) => inner.contains_secrets(),
            _ => false,
        }
    }

    /// Structural equality with `NaN == NaN`.
    ///
    /// This is the comparison used after a serialize/deserialize round trip,
    /// where non-finite numbers must survive.
    pub fn deep_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::Number(a), PropertyValue::Number(b)) => {
                a == b || (a.is_nan() && b.is_nan())
            }
            (PropertyValue::Array(a), PropertyValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.deep_equals(y))
            }
            (PropertyValue::Object(a), PropertyValue::Object(b)) => property_maps_deep_equal(a, b),
            (PropertyValue::Secret(a), PropertyValue::Secret(b)) => {
                a.element.deep_equals(&b.element)
            }
            (PropertyValue::Computed(a), PropertyValue::Computed(b)) => a.deep_equals(b),
            _ => self == other,
        }
    }
}

/// Deep equality over whole property maps; see [`PropertyValue::deep_equals`].
pub fn property_maps_deep_equal(a: &PropertyMap, b: &PropertyMap) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|((ka, va), (kb, vb))| ka == kb && va.deep_equals(vb))
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        PropertyValue::Number(n as f64)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(a: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(a)
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(o: PropertyMap) -> Self {
        PropertyValue::Object(o)
    }
}

impl From<Asset> for PropertyValue {
    fn from(a: Asset) -> Self {
        PropertyValue::Asset(a)
    }
}

impl From<Archive> for PropertyValue {
    fn from(a: Archive) -> Self {
        PropertyValue::Archive(a)
    }
}

impl From<ResourceReference> for PropertyValue {
    fn from(r: ResourceReference) -> Self {
        PropertyValue::ResourceReference(r)
    }
}

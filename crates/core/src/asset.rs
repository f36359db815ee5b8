//! Assets and archives
//!
//! File-like values carried in resource properties. An asset is a single blob
//! (literal text, a local path, or a URI); an archive is a named collection of
//! assets and nested archives (or itself a path/URI).
//!
//! Content hashes are lowercase hex SHA-256. Only literal sources (text,
//! in-memory asset maps) are hashed eagerly; path and URI sources are resolved
//! by the engine at deployment time and may carry an empty hash until then.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Where an asset's contents come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// Literal contents.
    Text(String),
    /// Path to a local file.
    Path(String),
    /// URI to fetch the contents from.
    Uri(String),
}

/// A single content-addressed blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Lowercase hex SHA-256 of the contents. Empty until resolved for
    /// path/URI sources.
    pub hash: String,
    /// Where the contents come from.
    pub source: AssetSource,
}

impl Asset {
    /// Asset from literal text, hashed immediately.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Asset {
            hash: sha256_hex(text.as_bytes()),
            source: AssetSource::Text(text),
        }
    }

    /// Asset backed by a local file. The hash stays empty until the engine
    /// resolves the file.
    pub fn from_path(path: impl Into<String>) -> Self {
        Asset {
            hash: String::new(),
            source: AssetSource::Path(path.into()),
        }
    }

    /// Asset backed by a URI. The hash stays empty until the engine fetches
    /// the contents.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Asset {
            hash: String::new(),
            source: AssetSource::Uri(uri.into()),
        }
    }
}

/// One entry of an in-memory archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveMember {
    /// A leaf asset.
    Asset(Asset),
    /// A nested archive.
    Archive(Archive),
}

/// Where an archive's contents come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    /// In-memory map of member name to asset or nested archive.
    Assets(BTreeMap<String, ArchiveMember>),
    /// Path to a local archive file or directory.
    Path(String),
    /// URI to fetch the archive from.
    Uri(String),
}

/// A content-addressed collection of assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    /// Lowercase hex SHA-256 over the member hashes, in member-name order.
    /// Empty until resolved for path/URI sources.
    pub hash: String,
    /// Where the contents come from.
    pub source: ArchiveSource,
}

impl Archive {
    /// Archive from an in-memory member map, hashed immediately.
    ///
    /// The hash covers each member's name and hash in sorted name order, so
    /// it is stable across serialization.
    pub fn from_assets(members: BTreeMap<String, ArchiveMember>) -> Self {
        let mut hasher = Sha256::new();
        for (name, member) in &members {
            hasher.update(name.as_bytes());
            let member_hash = match member {
                ArchiveMember::Asset(a) => &a.hash,
                ArchiveMember::Archive(a) => &a.hash,
            };
            hasher.update(member_hash.as_bytes());
        }
        let digest = hasher.finalize();
        let mut hash = String::with_capacity(digest.len() * 2);
        for byte in digest {
            hash.push_str(&format!("{:02x}", byte));
        }
        Archive {
            hash,
            source: ArchiveSource::Assets(members),
        }
    }

    /// Archive backed by a local path; hash stays empty until resolved.
    pub fn from_path(path: impl Into<String>) -> Self {
        Archive {
            hash: String::new(),
            source: ArchiveSource::Path(path.into()),
        }
    }

    /// Archive backed by a URI; hash stays empty until resolved.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Archive {
            hash: String::new(),
            source: ArchiveSource::Uri(uri.into()),
        }
    }
}

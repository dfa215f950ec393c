use std::fmt;

use bson::{Bson, Document};
use serde::Deserialize;

/// First four bytes of every archive, little-endian.
pub const MAGIC_NUMBER: u32 = 0x8199_e26d;

/// Closes the prelude and every body block.
pub(crate) const TERMINATOR: u32 = 0xffff_ffff;

// The smallest valid BSON document is the empty one: length prefix plus trailing null.
pub(crate) const MIN_RECORD_SIZE: u32 = 5;
pub(crate) const MAX_RECORD_SIZE: u32 = 16 * 1024 * 1024 + 16 * 1024;

/// A `(database, collection)` pair identifying one collection's byte stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new<D: Into<String>, C: Into<String>>(database: D, collection: C) -> Namespace {
        Namespace {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// The empty namespace marks the end of the archive body.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.database.is_empty() && self.collection.is_empty()
    }

    /// Name of the file this namespace is extracted to, e.g. `juju.machines.bson`.
    pub fn file_name(&self) -> String {
        format!("{}.{}.bson", self.database, self.collection)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// The archive-wide header document.
///
/// Its content is not validated beyond being a decodable document; the
/// accessors cover the fields mongodump writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveHeader(pub(crate) Document);

impl ArchiveHeader {
    #[inline(always)]
    pub fn document(&self) -> &Document {
        &self.0
    }

    pub fn version(&self) -> Option<&str> {
        self.0.get_str("version").ok()
    }

    pub fn server_version(&self) -> Option<&str> {
        self.0.get_str("server_version").ok()
    }

    pub fn tool_version(&self) -> Option<&str> {
        self.0.get_str("tool_version").ok()
    }

    pub fn concurrent_collections(&self) -> Option<i32> {
        self.0.get_i32("concurrent_collections").ok()
    }
}

/// Describes one collection stored in the archive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectionMetadata {
    #[serde(rename = "db")]
    pub database: String,

    pub collection: String,

    /// Collection options and indexes. Passed through unread.
    #[serde(default)]
    pub metadata: Bson,

    /// A hint for the size of the collection data. Do not trust in absolute terms.
    #[serde(default)]
    pub size: Option<i64>,

    /// `collection`, `view` or `timeseries` when present.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl CollectionMetadata {
    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.database.as_str(), self.collection.as_str())
    }

    pub fn size_hint(&self) -> Option<u64> {
        self.size.and_then(|size| u64::try_from(size).ok())
    }
}

/// Opens every block of the archive body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NamespaceHeader {
    #[serde(rename = "db")]
    pub(crate) database: String,

    pub(crate) collection: String,

    #[serde(default, rename = "EOF")]
    pub(crate) eof: bool,

    /// CRC-64 of every payload byte of the namespace; meaningful on `EOF` headers.
    #[serde(default, rename = "CRC")]
    pub(crate) crc: i64,
}

impl NamespaceHeader {
    pub(crate) fn namespace(&self) -> Namespace {
        Namespace::new(self.database.as_str(), self.collection.as_str())
    }

    #[inline(always)]
    pub(crate) fn crc(&self) -> u64 {
        self.crc as u64
    }
}

use std::path::PathBuf;

use crate::Namespace;

pub type Result<T> = std::result::Result<T, Error>;

/// The archive is not laid out the way a mongodump archive must be.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Not a mongodump archive (magic number {0:#010x}).")]
    BadMagic(u32),

    #[error("Invalid record size: {0} bytes.")]
    InvalidRecordSize(u32),

    #[error("Corrupt record: missing trailing null byte.")]
    CorruptRecord,

    #[error("Could not decode {1} record.")]
    Decode(#[source] bson::de::Error, &'static str),

    #[error("Archive has no header record.")]
    MissingHeader,

    #[error("Namespace declared twice: '{0}'")]
    DuplicateNamespace(Namespace),

    #[error("Collection declared with an empty database and collection name.")]
    EmptyNamespace,
}

/// The archive body does not follow the chunk protocol.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Chunk for a namespace not declared in the prelude: '{0}'")]
    UnknownNamespace(Namespace),

    #[error("Chunk for a namespace after its end marker: '{0}'")]
    NamespaceClosed(Namespace),

    #[error("Payload follows the end marker of namespace '{0}'")]
    PayloadAfterEof(Namespace),

    #[error("Payload follows the end of the archive body")]
    PayloadAfterEnd,

    #[error("Terminator found where a chunk header was expected")]
    UnexpectedTerminator,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Archive ended unexpectedly{}", unfinished_suffix(.unfinished))]
    TruncatedArchive { unfinished: Vec<Namespace> },

    #[error("Writing namespace '{namespace}' failed")]
    SinkIo {
        namespace: Namespace,
        #[source]
        source: std::io::Error,
    },

    #[error("Checksum mismatch for namespace '{namespace}': archive says {expected:#018x}, computed {actual:#018x}")]
    ChecksumMismatch {
        namespace: Namespace,
        expected: u64,
        actual: u64,
    },

    #[error("Reading archive failed")]
    Read(#[source] std::io::Error),

    #[error("Failed to open archive. Path: '{}'", .1.display())]
    Open(#[source] std::io::Error, PathBuf),

    #[error("Creating output directory failed. Path: '{}'", .1.display())]
    CreateDir(#[source] std::io::Error, PathBuf),
}

impl Error {
    pub(crate) fn truncated() -> Error {
        Error::TruncatedArchive { unfinished: vec![] }
    }

    /// Maps a read failure, treating a premature end of stream as truncation.
    pub(crate) fn from_read(e: std::io::Error) -> Error {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::truncated()
        } else {
            Error::Read(e)
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::TruncatedArchive { .. })
    }
}

fn unfinished_suffix(unfinished: &[Namespace]) -> String {
    if unfinished.is_empty() {
        return String::new();
    }
    let names = unfinished
        .iter()
        .map(|ns| ns.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("; unfinished namespaces: {}", names)
}

//! Reader for mongodump-style archives.
//!
//! Use [ArchiveReader][ArchiveReader] to read the prelude of an archive and
//! demultiplex its body into one [Sink][Sink] per collection.

mod de;
mod demux;
mod error;
pub mod hashing;
mod header;
mod parse;
mod reader;
mod select;
mod sink;

#[cfg(test)]
mod test_util;

pub use de::{Frame, RecordReader};
pub use demux::{CollectionReport, Demux, DemuxOptions, DemuxReport};
pub use error::{Error, FormatError, ProtocolError, Result};
pub use header::{ArchiveHeader, CollectionMetadata, Namespace, MAGIC_NUMBER};
pub use parse::{read_prelude, Prelude, PreludeRecord, PreludeRecords};
pub use reader::{ArchiveReader, ExtractStats, ExtractedFile};
pub use select::{DatabaseFilter, SelectAll, Selector};
pub use sink::{ChecksummedSink, MutedSink, Sink};

#[doc(hidden)]
pub use bson;

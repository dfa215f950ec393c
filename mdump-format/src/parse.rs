//! The archive prelude: magic number, header and collection metadata.

use std::collections::HashSet;
use std::io::Read;

use crate::de::{decode, Frame, RecordReader};
use crate::error::{FormatError, Result};
use crate::header::{ArchiveHeader, CollectionMetadata, Namespace, MAGIC_NUMBER};
use crate::Error;

/// A decoded prelude record.
#[derive(Debug, Clone, PartialEq)]
pub enum PreludeRecord {
    Header(ArchiveHeader),
    Collection(CollectionMetadata),
}

/// Lazily decodes the records of the prelude.
///
/// The first record is always the header, every following one is collection
/// metadata, and iteration ends at the prelude terminator. The iterator is
/// one-shot: after it yields `None` or an error, it yields `None` forever.
pub struct PreludeRecords<'a, R> {
    reader: &'a mut RecordReader<R>,
    seen_header: bool,
    done: bool,
}

impl<'a, R: Read> PreludeRecords<'a, R> {
    /// Checks the magic number and positions the reader on the first record.
    pub fn new(reader: &'a mut RecordReader<R>) -> Result<PreludeRecords<'a, R>> {
        let magic = reader.read_magic()?;
        if magic != MAGIC_NUMBER {
            return Err(FormatError::BadMagic(magic).into());
        }

        Ok(PreludeRecords {
            reader,
            seen_header: false,
            done: false,
        })
    }

    fn read_next(&mut self) -> Result<Option<PreludeRecord>> {
        let frame = self.reader.read_frame()?.ok_or_else(Error::truncated)?;

        match frame {
            Frame::Terminator if !self.seen_header => Err(FormatError::MissingHeader.into()),
            Frame::Terminator => Ok(None),
            Frame::Record(bytes) if !self.seen_header => {
                self.seen_header = true;
                let header = ArchiveHeader(decode(&bytes, "header")?);
                Ok(Some(PreludeRecord::Header(header)))
            }
            Frame::Record(bytes) => {
                let meta: CollectionMetadata = decode(&bytes, "collection metadata")?;
                tracing::debug!(namespace = %meta.namespace(), "read collection metadata");
                Ok(Some(PreludeRecord::Collection(meta)))
            }
        }
    }
}

impl<R: Read> Iterator for PreludeRecords<'_, R> {
    type Item = Result<PreludeRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.read_next();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result.transpose()
    }
}

/// Everything the prelude declares about the archive.
#[derive(Debug, Clone, Default)]
pub struct Prelude {
    pub(crate) header: ArchiveHeader,
    pub(crate) collections: Vec<CollectionMetadata>,
}

impl Prelude {
    #[inline(always)]
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Collection metadata in declaration order.
    #[inline(always)]
    pub fn collections(&self) -> &[CollectionMetadata] {
        &self.collections
    }

    pub fn namespaces(&self) -> impl Iterator<Item = Namespace> + '_ {
        self.collections.iter().map(|c| c.namespace())
    }
}

/// Reads the whole prelude, rejecting namespaces declared more than once.
pub fn read_prelude<R: Read>(reader: &mut RecordReader<R>) -> Result<Prelude> {
    let mut header = None;
    let mut collections = Vec::new();
    let mut seen = HashSet::new();

    for record in PreludeRecords::new(reader)? {
        match record? {
            PreludeRecord::Header(h) => header = Some(h),
            PreludeRecord::Collection(meta) => {
                let namespace = meta.namespace();
                if namespace.is_empty() {
                    return Err(FormatError::EmptyNamespace.into());
                }
                if !seen.insert(namespace.clone()) {
                    return Err(FormatError::DuplicateNamespace(namespace).into());
                }
                collections.push(meta);
            }
        }
    }

    let header = header.ok_or(FormatError::MissingHeader)?;
    tracing::debug!(
        collections = collections.len(),
        end = format_args!("{:#x}", reader.position()),
        "read prelude"
    );

    Ok(Prelude {
        header,
        collections,
    })
}

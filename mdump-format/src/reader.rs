use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use crate::de::RecordReader;
use crate::demux::{Demux, DemuxOptions, DemuxReport};
use crate::error::{Error, Result};
use crate::header::{ArchiveHeader, CollectionMetadata, Namespace};
use crate::parse::{read_prelude, Prelude};
use crate::select::Selector;
use crate::sink::{ChecksummedSink, Sink};

/// One collection written out by [`ArchiveReader::extract_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub namespace: Namespace,
    pub path: PathBuf,
    pub bytes: u64,
    pub checksum: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: Vec<ExtractedFile>,
    pub collections_skipped: usize,
}

impl ExtractStats {
    pub fn bytes_written(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }

    fn from_report(dest: &Path, report: DemuxReport) -> ExtractStats {
        let mut stats = ExtractStats::default();
        for collection in report.collections {
            if collection.muted {
                stats.collections_skipped += 1;
                continue;
            }
            stats.files.push(ExtractedFile {
                path: dest.join(collection.namespace.file_name()),
                namespace: collection.namespace,
                bytes: collection.bytes,
                checksum: collection.checksum.unwrap_or_default(),
            });
        }
        stats
    }
}

/// Reads an archive: the prelude on construction, the body on demand.
#[derive(Debug)]
pub struct ArchiveReader<R> {
    records: RecordReader<BufReader<R>>,
    prelude: Prelude,
}

impl ArchiveReader<File> {
    /// Opens an archive file and reads its prelude; errors if it is not an archive.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<ArchiveReader<File>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::Open(e, path.to_path_buf()))?;
        ArchiveReader::new(file)
    }
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(inner: R) -> Result<ArchiveReader<R>> {
        let mut records = RecordReader::new(BufReader::new(inner));
        let prelude = read_prelude(&mut records)?;
        Ok(ArchiveReader { records, prelude })
    }

    #[inline(always)]
    pub fn prelude(&self) -> &Prelude {
        &self.prelude
    }

    #[inline(always)]
    pub fn header(&self) -> &ArchiveHeader {
        self.prelude.header()
    }

    #[inline(always)]
    pub fn collections(&self) -> &[CollectionMetadata] {
        self.prelude.collections()
    }

    /// Streams the body, asking `handler` for the sink of each declared collection.
    ///
    /// The handler runs once per collection, in declaration order, before any
    /// body bytes are read. Returning `None` mutes the collection.
    pub fn demux<F>(self, mut handler: F, options: DemuxOptions) -> Result<DemuxReport>
    where
        F: FnMut(&CollectionMetadata) -> io::Result<Option<Box<dyn Sink>>>,
    {
        let ArchiveReader { records, prelude } = self;
        let mut demux = Demux::with_options(records, options);

        for meta in prelude.collections() {
            let namespace = meta.namespace();
            let registered = match handler(meta) {
                Ok(Some(sink)) => demux.open(namespace, sink),
                Ok(None) => demux.mute(namespace),
                Err(source) => Err(Error::SinkIo { namespace, source }),
            };
            if let Err(e) = registered {
                demux.abort();
                return Err(e);
            }
        }

        demux.run()
    }

    /// Writes every selected collection to `<dest>/<database>.<collection>.bson`.
    pub fn extract_all<P, S>(
        self,
        dest: P,
        selector: S,
        options: DemuxOptions,
    ) -> Result<ExtractStats>
    where
        P: AsRef<Path>,
        S: Selector,
    {
        let dest = dest.as_ref();
        std::fs::create_dir_all(dest).map_err(|e| Error::CreateDir(e, dest.to_path_buf()))?;

        let report = self.demux(
            |meta| {
                if !selector.select(meta) {
                    return Ok(None);
                }
                let path = output_path(dest, &meta.namespace())?;
                tracing::info!(path = %path.display(), "writing");
                let file = File::create(&path)?;
                Ok(Some(Box::new(ChecksummedSink::new(BufWriter::new(file))) as Box<dyn Sink>))
            },
            options,
        )?;

        Ok(ExtractStats::from_report(dest, report))
    }
}

/// Refuses namespaces that would escape the output directory.
fn output_path(dest: &Path, namespace: &Namespace) -> io::Result<PathBuf> {
    let file_name = namespace.file_name();
    let unsafe_part = |part: &str| part.is_empty() || part.contains(&['/', '\\', '\0'][..]);
    if unsafe_part(&namespace.database) || unsafe_part(&namespace.collection) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("namespace cannot be used as a file name: '{}'", namespace),
        ));
    }
    Ok(dest.join(file_name))
}

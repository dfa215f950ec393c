//! Routes the interleaved archive body to per-namespace sinks.

use std::collections::HashMap;
use std::io::Read;

use crate::de::{decode, Frame, RecordReader};
use crate::error::{Error, FormatError, ProtocolError, Result};
use crate::header::{Namespace, NamespaceHeader};
use crate::sink::{write_chunk, MutedSink, Sink};

#[derive(Debug, Clone, Copy)]
pub struct DemuxOptions {
    /// Compare each sink's checksum with the `CRC` of its end marker.
    pub verify_checksums: bool,
}

impl Default for DemuxOptions {
    fn default() -> Self {
        DemuxOptions {
            verify_checksums: true,
        }
    }
}

/// What happened to one declared namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    pub namespace: Namespace,
    /// No sink was registered; the bytes were discarded.
    pub muted: bool,
    pub chunks: u64,
    pub bytes: u64,
    pub checksum: Option<u64>,
}

/// Per-namespace results of a completed run, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemuxReport {
    pub collections: Vec<CollectionReport>,
}

impl DemuxReport {
    pub fn get(&self, namespace: &Namespace) -> Option<&CollectionReport> {
        self.collections.iter().find(|c| &c.namespace == namespace)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionReport> {
        self.collections.iter()
    }
}

struct Output {
    namespace: Namespace,
    sink: Box<dyn Sink>,
    muted: bool,
    chunks: u64,
    bytes: u64,
    done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingChunkHeader,
    StreamingPayload(usize),
    ArchiveDone,
}

/// The body demultiplexer.
///
/// Sinks are registered with [`open`](Demux::open) or [`mute`](Demux::mute)
/// before [`run`](Demux::run) consumes the demultiplexer, so the set of
/// namespaces is fixed once streaming starts.
pub struct Demux<R> {
    input: RecordReader<R>,
    options: DemuxOptions,
    index: HashMap<Namespace, usize>,
    outputs: Vec<Output>,
}

impl<R: Read> Demux<R> {
    pub fn new(input: RecordReader<R>) -> Demux<R> {
        Demux::with_options(input, DemuxOptions::default())
    }

    pub fn with_options(input: RecordReader<R>, options: DemuxOptions) -> Demux<R> {
        Demux {
            input,
            options,
            index: HashMap::new(),
            outputs: Vec::new(),
        }
    }

    /// Registers the sink receiving the bytes of `namespace`.
    pub fn open(&mut self, namespace: Namespace, sink: Box<dyn Sink>) -> Result<()> {
        self.register(namespace, sink, false)
    }

    /// Registers a namespace whose bytes are read and discarded.
    pub fn mute(&mut self, namespace: Namespace) -> Result<()> {
        self.register(namespace, Box::new(MutedSink), true)
    }

    fn register(&mut self, namespace: Namespace, sink: Box<dyn Sink>, muted: bool) -> Result<()> {
        // Reserved for the end block.
        if namespace.is_empty() {
            return Err(FormatError::EmptyNamespace.into());
        }
        if self.index.contains_key(&namespace) {
            return Err(FormatError::DuplicateNamespace(namespace).into());
        }
        self.index.insert(namespace.clone(), self.outputs.len());
        self.outputs.push(Output {
            namespace,
            sink,
            muted,
            chunks: 0,
            bytes: 0,
            done: false,
        });
        Ok(())
    }

    /// Streams the body to completion.
    ///
    /// On failure every sink that is still open is closed before the error is
    /// returned, so partial outputs are flushed.
    pub fn run(mut self) -> Result<DemuxReport> {
        match self.run_inner() {
            Ok(()) => Ok(self.into_report()),
            Err(mut e) => {
                let pending = self.pending();
                self.abort();
                if let Error::TruncatedArchive { unfinished } = &mut e {
                    if unfinished.is_empty() {
                        *unfinished = pending;
                    }
                }
                Err(e)
            }
        }
    }

    /// Closes every sink that has not seen its end marker, ignoring failures.
    pub fn abort(&mut self) {
        for output in self.outputs.iter_mut().filter(|o| !o.done) {
            output.done = true;
            if let Err(e) = output.sink.close() {
                tracing::warn!(namespace = %output.namespace, error = %e, "closing sink failed");
            }
        }
    }

    fn run_inner(&mut self) -> Result<()> {
        let mut state = State::AwaitingChunkHeader;
        while state != State::ArchiveDone {
            state = self.step(state)?;
        }

        let unfinished = self.pending();
        if !unfinished.is_empty() {
            return Err(Error::TruncatedArchive { unfinished });
        }

        tracing::debug!(
            end = format_args!("{:#x}", self.input.position()),
            namespaces = self.outputs.len(),
            "archive body complete"
        );
        Ok(())
    }

    fn step(&mut self, state: State) -> Result<State> {
        match state {
            State::AwaitingChunkHeader => match self.input.read_frame()? {
                // mongodump ends the body at a block boundary without an end marker.
                None => Ok(State::ArchiveDone),
                Some(Frame::Terminator) => Err(ProtocolError::UnexpectedTerminator.into()),
                Some(Frame::Record(bytes)) => {
                    let header: NamespaceHeader = decode(&bytes, "namespace header")?;
                    self.on_header(header)
                }
            },
            State::StreamingPayload(slot) => match self.input.read_frame()? {
                None => Err(Error::truncated()),
                Some(Frame::Terminator) => Ok(State::AwaitingChunkHeader),
                Some(Frame::Record(bytes)) => {
                    self.write(slot, &bytes)?;
                    Ok(State::StreamingPayload(slot))
                }
            },
            State::ArchiveDone => Ok(State::ArchiveDone),
        }
    }

    fn on_header(&mut self, header: NamespaceHeader) -> Result<State> {
        let namespace = header.namespace();
        if namespace.is_empty() {
            self.expect_terminator(ProtocolError::PayloadAfterEnd)?;
            return Ok(State::ArchiveDone);
        }

        let slot = match self.index.get(&namespace) {
            Some(&slot) => slot,
            None => return Err(ProtocolError::UnknownNamespace(namespace).into()),
        };
        if self.outputs[slot].done {
            return Err(ProtocolError::NamespaceClosed(namespace).into());
        }

        if header.eof {
            self.expect_terminator(ProtocolError::PayloadAfterEof(namespace))?;
            self.finish(slot, header.crc())?;
            Ok(State::AwaitingChunkHeader)
        } else {
            Ok(State::StreamingPayload(slot))
        }
    }

    fn expect_terminator(&mut self, otherwise: ProtocolError) -> Result<()> {
        match self.input.read_frame()? {
            Some(Frame::Terminator) => Ok(()),
            Some(Frame::Record(_)) => Err(otherwise.into()),
            None => Err(Error::truncated()),
        }
    }

    fn write(&mut self, slot: usize, chunk: &[u8]) -> Result<()> {
        let output = &mut self.outputs[slot];
        write_chunk(output.sink.as_mut(), chunk).map_err(|source| Error::SinkIo {
            namespace: output.namespace.clone(),
            source,
        })?;
        output.chunks += 1;
        output.bytes += chunk.len() as u64;
        tracing::trace!(namespace = %output.namespace, bytes = chunk.len(), "routed chunk");
        Ok(())
    }

    fn finish(&mut self, slot: usize, expected: u64) -> Result<()> {
        let verify = self.options.verify_checksums;
        let output = &mut self.outputs[slot];

        if let Some(actual) = output.sink.checksum() {
            if verify && actual != expected {
                return Err(Error::ChecksumMismatch {
                    namespace: output.namespace.clone(),
                    expected,
                    actual,
                });
            }
        }

        output.done = true;
        output.sink.close().map_err(|source| Error::SinkIo {
            namespace: output.namespace.clone(),
            source,
        })?;

        tracing::debug!(
            namespace = %output.namespace,
            chunks = output.chunks,
            bytes = output.bytes,
            muted = output.muted,
            "namespace complete"
        );
        Ok(())
    }

    fn pending(&self) -> Vec<Namespace> {
        self.outputs
            .iter()
            .filter(|o| !o.done)
            .map(|o| o.namespace.clone())
            .collect()
    }

    fn into_report(self) -> DemuxReport {
        let collections = self
            .outputs
            .into_iter()
            .map(|o| CollectionReport {
                checksum: o.sink.checksum(),
                namespace: o.namespace,
                muted: o.muted,
                chunks: o.chunks,
                bytes: o.bytes,
            })
            .collect();
        DemuxReport { collections }
    }
}

//! Per-collection outputs for the demultiplexer.

use std::io::{self, ErrorKind, Write};

use crate::hashing::HashingWriter;

/// Receives the payload bytes of one namespace.
///
/// `close` is called exactly once, after the namespace's final chunk.
pub trait Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn close(&mut self) -> io::Result<()>;

    /// The checksum of everything written so far, if this sink computes one.
    fn checksum(&self) -> Option<u64> {
        None
    }
}

/// Writes a whole chunk, retrying short writes.
pub(crate) fn write_chunk(sink: &mut dyn Sink, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match sink.write(buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    "failed to write whole chunk",
                ))
            }
            Ok(n) => buf = &buf[n..],
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Discards everything written to it.
#[derive(Debug, Default, Clone, Copy)]
pub struct MutedSink;

impl Sink for MutedSink {
    #[inline(always)]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    #[inline(always)]
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
enum State<W> {
    Open(HashingWriter<W>),
    Closed { checksum: u64, bytes_written: u64 },
}

/// Writes through to a durable writer while accumulating a CRC-64.
#[derive(Debug)]
pub struct ChecksummedSink<W> {
    state: State<W>,
}

impl<W: Write> ChecksummedSink<W> {
    pub fn new(writer: W) -> ChecksummedSink<W> {
        ChecksummedSink {
            state: State::Open(HashingWriter::new(writer)),
        }
    }

    pub fn bytes_written(&self) -> u64 {
        match &self.state {
            State::Open(writer) => writer.bytes_written(),
            State::Closed { bytes_written, .. } => *bytes_written,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed { .. })
    }

    fn sum64(&self) -> u64 {
        match &self.state {
            State::Open(writer) => writer.sum64(),
            State::Closed { checksum, .. } => *checksum,
        }
    }
}

impl<W: Write> Sink for ChecksummedSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.state {
            State::Open(writer) => writer.write(buf),
            State::Closed { .. } => Err(io::Error::new(
                ErrorKind::BrokenPipe,
                "write to a closed sink",
            )),
        }
    }

    /// Flushes and drops the durable writer.
    ///
    /// # Panics
    ///
    /// Panics if the sink was already closed.
    fn close(&mut self) -> io::Result<()> {
        let closed = State::Closed {
            checksum: self.sum64(),
            bytes_written: self.bytes_written(),
        };
        match std::mem::replace(&mut self.state, closed) {
            State::Open(writer) => {
                let mut inner = writer.into_inner();
                inner.flush()
            }
            State::Closed { .. } => panic!("ChecksummedSink closed twice"),
        }
    }

    fn checksum(&self) -> Option<u64> {
        Some(self.sum64())
    }
}

//! Record framing: length-prefixed BSON records and block terminators.

use std::io::{ErrorKind, Read};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use serde::de::DeserializeOwned;

use crate::error::{Error, FormatError, Result};
use crate::header::{MAX_RECORD_SIZE, MIN_RECORD_SIZE, TERMINATOR};

/// One unit of framing read off the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete record, including its own four-byte length prefix.
    Record(Vec<u8>),
    Terminator,
}

/// Reads frames from an archive stream, keeping track of the byte offset.
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> RecordReader<R> {
        RecordReader { inner, position: 0 }
    }

    /// Number of bytes consumed from the stream so far.
    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_magic(&mut self) -> Result<u32> {
        let magic = self
            .inner
            .read_u32::<LittleEndian>()
            .map_err(Error::from_read)?;
        self.position += 4;
        tracing::debug!(magic = format_args!("{:#010x}", magic), "read magic number");
        Ok(magic)
    }

    /// Reads the next frame.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly before the first byte of
    /// a frame. An end of stream anywhere inside a frame is a truncation.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        let start = self.position;
        let mut prefix = [0u8; 4];
        if !self.read_prefix(&mut prefix)? {
            tracing::debug!(offset = format_args!("{:#x}", start), "end of stream");
            return Ok(None);
        }

        let size = LittleEndian::read_u32(&prefix);
        if size == TERMINATOR {
            tracing::debug!(offset = format_args!("{:#x}", start), "read terminator");
            return Ok(Some(Frame::Terminator));
        }

        if !(MIN_RECORD_SIZE..=MAX_RECORD_SIZE).contains(&size) {
            return Err(FormatError::InvalidRecordSize(size).into());
        }

        let mut buf = vec![0u8; size as usize];
        buf[..4].copy_from_slice(&prefix);
        self.inner
            .read_exact(&mut buf[4..])
            .map_err(Error::from_read)?;
        self.position += u64::from(size) - 4;

        if buf[buf.len() - 1] != 0 {
            return Err(FormatError::CorruptRecord.into());
        }

        tracing::debug!(
            start = format_args!("{:#x}", start),
            end = format_args!("{:#x}", self.position),
            bytes = size,
            "read record"
        );
        Ok(Some(Frame::Record(buf)))
    }

    fn read_prefix(&mut self, buf: &mut [u8; 4]) -> Result<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => return Err(Error::truncated()),
                Ok(n) => {
                    filled += n;
                    self.position += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Read(e)),
            }
        }
        Ok(true)
    }
}

/// Decodes a record with the BSON codec. `what` names the record in errors.
pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8], what: &'static str) -> Result<T> {
    bson::from_slice(bytes).map_err(|e| FormatError::Decode(e, what).into())
}

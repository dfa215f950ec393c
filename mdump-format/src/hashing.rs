//! Hashing wrapper for computing a CRC-64 while writing.

use std::fmt;
use std::io::{Result, Write};

use crc::{Crc, Digest, CRC_64_XZ};

/// CRC-64 with the ECMA-182 polynomial, reflected, as used by archive `CRC` fields.
pub static CRC_64: Crc<u64> = Crc::<u64>::new(&CRC_64_XZ);

/// Checksum of a complete byte slice.
pub fn checksum(bytes: &[u8]) -> u64 {
    CRC_64.checksum(bytes)
}

/// A running CRC-64 accumulator.
#[derive(Clone)]
pub struct Crc64 {
    digest: Digest<'static, u64>,
}

impl Crc64 {
    pub fn new() -> Self {
        Self {
            digest: CRC_64.digest(),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
    }

    /// The checksum of everything seen so far. Does not reset the accumulator.
    pub fn sum64(&self) -> u64 {
        self.digest.clone().finalize()
    }
}

impl Default for Crc64 {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Crc64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Crc64")
            .field(&format_args!("{:#018x}", self.sum64()))
            .finish()
    }
}

/// A writer wrapper that computes a CRC-64 while data is written through it.
///
/// Only the bytes the inner writer accepts are hashed.
#[derive(Debug)]
pub struct HashingWriter<W> {
    inner: W,
    hasher: Crc64,
    bytes_written: u64,
}

impl<W> HashingWriter<W> {
    /// Create a new hashing writer wrapping the given writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Crc64::new(),
            bytes_written: 0,
        }
    }

    /// Get the total number of bytes written through this writer.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn sum64(&self) -> u64 {
        self.hasher.sum64()
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Get the inner writer back.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.inner.write(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.bytes_written += n as u64;
        }
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

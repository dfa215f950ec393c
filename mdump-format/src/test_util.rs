use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use bson::{doc, Document};

use crate::hashing::checksum;
use crate::header::{MAGIC_NUMBER, TERMINATOR};
use crate::sink::Sink;

pub(crate) fn payload(document: Document) -> Vec<u8> {
    bson::to_vec(&document).unwrap()
}

/// Assembles archive bytes for tests.
pub(crate) struct ArchiveBuilder {
    buf: Vec<u8>,
}

impl ArchiveBuilder {
    pub(crate) fn new() -> Self {
        Self::with_magic(MAGIC_NUMBER)
    }

    pub(crate) fn with_magic(magic: u32) -> Self {
        ArchiveBuilder {
            buf: magic.to_le_bytes().to_vec(),
        }
    }

    /// Starts directly with body blocks, no magic or prelude.
    pub(crate) fn body() -> Self {
        ArchiveBuilder { buf: Vec::new() }
    }

    pub(crate) fn record(mut self, document: Document) -> Self {
        self.buf.extend_from_slice(&payload(document));
        self
    }

    pub(crate) fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub(crate) fn terminator(mut self) -> Self {
        self.buf.extend_from_slice(&TERMINATOR.to_le_bytes());
        self
    }

    pub(crate) fn header(self, document: Document) -> Self {
        self.record(document)
    }

    pub(crate) fn collection(self, db: &str, collection: &str) -> Self {
        self.record(doc! { "db": db, "collection": collection, "metadata": "", "size": 0_i32 })
    }

    pub(crate) fn end_prelude(self) -> Self {
        self.terminator()
    }

    pub(crate) fn header_record(self, db: &str, collection: &str, eof: bool, crc: u64) -> Self {
        let crc = crc as i64;
        self.record(doc! { "db": db, "collection": collection, "EOF": eof, "CRC": crc })
    }

    pub(crate) fn block(mut self, db: &str, collection: &str, payloads: &[&[u8]]) -> Self {
        self = self.header_record(db, collection, false, 0);
        for p in payloads {
            self = self.raw(p);
        }
        self.terminator()
    }

    pub(crate) fn eof(self, db: &str, collection: &str, crc: u64) -> Self {
        self.header_record(db, collection, true, crc).terminator()
    }

    pub(crate) fn end(self) -> Self {
        self.header_record("", "", false, 0).terminator()
    }

    pub(crate) fn build(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Default)]
struct Shared {
    data: Vec<u8>,
    closes: usize,
    failing: bool,
}

/// A sink whose state stays observable after it is handed to a demultiplexer.
#[derive(Clone, Default)]
pub(crate) struct SharedSink(Rc<RefCell<Shared>>);

impl SharedSink {
    pub(crate) fn failing() -> Self {
        let sink = SharedSink::default();
        sink.0.borrow_mut().failing = true;
        sink
    }

    pub(crate) fn data(&self) -> Vec<u8> {
        self.0.borrow().data.clone()
    }

    pub(crate) fn closes(&self) -> usize {
        self.0.borrow().closes
    }
}

impl Sink for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut shared = self.0.borrow_mut();
        if shared.failing {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        shared.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn close(&mut self) -> io::Result<()> {
        self.0.borrow_mut().closes += 1;
        Ok(())
    }

    fn checksum(&self) -> Option<u64> {
        Some(checksum(&self.0.borrow().data))
    }
}

//! Archive assembly helpers shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use mdump_format::bson::{doc, Document};
use mdump_format::hashing::checksum;
use mdump_format::MAGIC_NUMBER;

const TERMINATOR: [u8; 4] = [0xff; 4];

pub fn payload(document: Document) -> Vec<u8> {
    mdump_format::bson::to_vec(&document).unwrap()
}

/// One collection of a test archive and the payload records of its blocks.
pub struct Collection {
    pub db: &'static str,
    pub name: &'static str,
    pub blocks: Vec<Vec<Vec<u8>>>,
}

impl Collection {
    pub fn new(db: &'static str, name: &'static str) -> Self {
        Collection {
            db,
            name,
            blocks: vec![],
        }
    }

    pub fn block(mut self, payloads: Vec<Vec<u8>>) -> Self {
        self.blocks.push(payloads);
        self
    }

    /// Every payload byte of the collection, in stream order.
    pub fn bytes(&self) -> Vec<u8> {
        self.blocks.iter().flatten().flatten().copied().collect()
    }
}

fn record(buf: &mut Vec<u8>, document: Document) {
    buf.extend_from_slice(&payload(document));
}

fn ns_header(buf: &mut Vec<u8>, db: &str, collection: &str, eof: bool, crc: u64) {
    let crc = crc as i64;
    record(
        buf,
        doc! { "db": db, "collection": collection, "EOF": eof, "CRC": crc },
    );
}

/// Magic number, header and the metadata of `collections`.
pub fn prelude(collections: &[Collection]) -> Vec<u8> {
    let mut buf = MAGIC_NUMBER.to_le_bytes().to_vec();
    record(
        &mut buf,
        doc! {
            "concurrent_collections": 4_i32,
            "version": "0.1",
            "server_version": "4.4.18",
            "tool_version": "100.6.1",
        },
    );
    for c in collections {
        let metadata = format!("{{\"collectionName\":\"{}\",\"indexes\":[]}}", c.name);
        record(
            &mut buf,
            doc! {
                "db": c.db,
                "collection": c.name,
                "metadata": metadata,
                "size": 0_i32,
                "type": "collection",
            },
        );
    }
    buf.extend_from_slice(&TERMINATOR);
    buf
}

/// Body blocks of all collections, interleaved round-robin, each collection
/// closed with a correct CRC, followed by the end block.
pub fn body(collections: &[Collection]) -> Vec<u8> {
    let mut buf = Vec::new();
    let rounds = collections.iter().map(|c| c.blocks.len()).max().unwrap_or(0);
    for round in 0..rounds {
        for c in collections {
            if let Some(block) = c.blocks.get(round) {
                ns_header(&mut buf, c.db, c.name, false, 0);
                for p in block {
                    buf.extend_from_slice(p);
                }
                buf.extend_from_slice(&TERMINATOR);
            }
        }
    }

    for c in collections {
        ns_header(&mut buf, c.db, c.name, true, checksum(&c.bytes()));
        buf.extend_from_slice(&TERMINATOR);
    }

    ns_header(&mut buf, "", "", false, 0);
    buf.extend_from_slice(&TERMINATOR);
    buf
}

pub fn archive(collections: &[Collection]) -> Vec<u8> {
    let mut buf = prelude(collections);
    buf.extend_from_slice(&body(collections));
    buf
}

pub fn position_of(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .unwrap()
}

pub fn write_archive(dir: &Path, bytes: &[u8]) -> PathBuf {
    let path = dir.join("dump.archive");
    std::fs::write(&path, bytes).unwrap();
    path
}

/// File names in `dir`, sorted, excluding the archive itself.
pub fn output_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".bson"))
        .collect();
    names.sort();
    names
}

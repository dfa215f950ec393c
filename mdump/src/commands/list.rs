use mdump_format::bson::{Bson, Document};
use mdump_format::{ArchiveReader, CollectionMetadata};
use serde::Serialize;

use crate::cli::ListArgs;
use crate::error::{Error, Result};
use crate::util::format_size_hint;

#[derive(Serialize)]
struct JsonListing {
    header: serde_json::Value,
    collections: Vec<JsonCollection>,
}

#[derive(Serialize)]
struct JsonCollection {
    namespace: String,
    db: String,
    collection: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    metadata: serde_json::Value,
}

impl From<&CollectionMetadata> for JsonCollection {
    fn from(meta: &CollectionMetadata) -> Self {
        JsonCollection {
            namespace: meta.namespace().to_string(),
            db: meta.database.clone(),
            collection: meta.collection.clone(),
            kind: meta.kind.clone(),
            size: meta.size_hint(),
            metadata: meta.metadata.clone().into_relaxed_extjson(),
        }
    }
}

pub fn run(args: ListArgs) -> Result<()> {
    let reader = ArchiveReader::open(&args.archive).map_err(|source| Error::OpenArchive {
        path: args.archive.clone(),
        source,
    })?;

    if args.json {
        list_json(reader.header().document(), reader.collections())
    } else {
        list_compact(&args, &reader)
    }
}

fn list_compact<R: std::io::Read>(args: &ListArgs, reader: &ArchiveReader<R>) -> Result<()> {
    let header = reader.header();
    let field = |v: Option<&str>| v.unwrap_or("-").to_string();

    println!("Archive: {}", args.archive.display());
    println!("Format version: {}", field(header.version()));
    println!("Server version: {}", field(header.server_version()));
    println!("Tool version:   {}", field(header.tool_version()));
    println!();

    println!("{:>12}  {:10}  Namespace", "Size", "Type");
    println!("{}", "-".repeat(60));
    for meta in reader.collections() {
        println!(
            "{:>12}  {:10}  {}",
            format_size_hint(meta.size_hint()),
            meta.kind.as_deref().unwrap_or("collection"),
            meta.namespace()
        );
    }
    println!("{}", "-".repeat(60));
    println!("{} collections", reader.collections().len());

    Ok(())
}

fn list_json(header: &Document, collections: &[CollectionMetadata]) -> Result<()> {
    let listing = JsonListing {
        header: Bson::Document(header.clone()).into_relaxed_extjson(),
        collections: collections.iter().map(JsonCollection::from).collect(),
    };
    let json = serde_json::to_string_pretty(&listing).map_err(|source| Error::Json { source })?;
    println!("{}", json);
    Ok(())
}

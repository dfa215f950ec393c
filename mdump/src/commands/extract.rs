use mdump_format::{ArchiveReader, DatabaseFilter, DemuxOptions, ExtractStats, Selector};

use crate::cli::ExtractArgs;
use crate::error::{Error, Result};
use crate::util::{format_checksum, format_size};

pub fn run(args: ExtractArgs) -> Result<()> {
    let reader = ArchiveReader::open(&args.archive).map_err(|source| Error::OpenArchive {
        path: args.archive.clone(),
        source,
    })?;

    let output_path = match args.output {
        Some(path) => path,
        None => std::env::current_dir().map_err(|source| Error::CurrentDir { source })?,
    };

    let filter = DatabaseFilter::new(args.databases.iter().cloned());
    if !filter.is_empty() && !reader.collections().iter().any(|meta| filter.select(meta)) {
        tracing::warn!(databases = ?args.databases, "no collection in the selected databases");
    }

    let options = DemuxOptions {
        verify_checksums: !args.no_checksum,
    };

    let stats: ExtractStats = reader
        .extract_all(&output_path, filter, options)
        .map_err(|source| Error::extract(args.archive.clone(), source))?;

    if !args.quiet {
        for file in &stats.files {
            println!(
                "{:>12}  {}  {}",
                format_size(file.bytes),
                format_checksum(file.checksum),
                file.path.display()
            );
        }
        println!(
            "Extracted {} collections ({}, {} skipped) to {}",
            stats.files.len(),
            format_size(stats.bytes_written()),
            stats.collections_skipped,
            output_path.display()
        );
    }

    Ok(())
}

use std::path::PathBuf;

use miette::Diagnostic;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum Error {
    #[error("Cannot open archive `{}`", .path.display())]
    #[diagnostic(help("Is this an uncompressed `mongodump --archive` file?"))]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: mdump_format::Error,
    },

    #[error("Cannot extract archive `{}`", .path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: mdump_format::Error,
    },

    #[error("Checksum verification failed for `{namespace}`")]
    #[diagnostic(help("Rerun with --no-checksum to keep the extracted bytes anyway"))]
    Checksum {
        namespace: mdump_format::Namespace,
        #[source]
        source: mdump_format::Error,
    },

    #[error("Cannot determine current directory")]
    #[diagnostic(help("Pass an output directory with -d/--dir"))]
    CurrentDir {
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot serialize listing")]
    Json {
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn extract(path: PathBuf, source: mdump_format::Error) -> Error {
        let mismatch = match &source {
            mdump_format::Error::ChecksumMismatch { namespace, .. } => Some(namespace.clone()),
            _ => None,
        };
        match mismatch {
            Some(namespace) => Error::Checksum { namespace, source },
            None => Error::Extract { path, source },
        }
    }
}

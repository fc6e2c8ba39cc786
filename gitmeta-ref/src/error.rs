use std::path::PathBuf;

/// The taxonomy every failure in this crate is classified into: a syntactic/structural
/// problem (`InvalidData`), a filesystem failure that isn't a recoverable absence
/// (`Io`), a recognized-but-unsupported feature (`NotSupported`), or a bound being
/// exceeded (`RecursionExceeded`, used here for a symbolic-ref resolution cycle).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("an I/O error occurred while reading {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {message}")]
    InvalidData { path: PathBuf, message: String },
    #[error("{0}")]
    NotSupported(String),
    #[error("cycle detected while resolving symbolic reference {name}")]
    Cycle { name: String },
}

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no git repository found above {0}")]
    NotFound(PathBuf),
    #[error("{path}: {message}")]
    InvalidFormat { path: PathBuf, message: String },
    #[error("{path}: {message}")]
    InvalidPath { path: PathBuf, message: String },
    #[error("an I/O error occurred while reading {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: repository format version {version} is not supported")]
    UnsupportedFormatVersion { path: PathBuf, version: i64 },
    #[error("{path}: unsupported extensions.{name}")]
    UnsupportedExtension { path: PathBuf, name: String },
}

impl From<gitmeta_config::Error> for Error {
    fn from(source: gitmeta_config::Error) -> Self {
        Error::InvalidFormat { path: PathBuf::new(), message: source.to_string() }
    }
}

//! Loose reference files: one file per ref under `<common_dir>/refs/...`, or the repository's
//! `HEAD` file directly under the git directory.
use std::path::Path;

use crate::error::Error;

/// The storage backend a repository's refs live in, as selected by `extensions.refstorage`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ReferenceStorageFormat {
    LooseFiles,
    RefTable,
}

impl ReferenceStorageFormat {
    /// `extensions.refstorage` is absent for the ordinary loose/packed-refs layout; any other
    /// value than `"reftable"` is a format this reader doesn't know and is fatal.
    pub fn from_extension_value(value: Option<&[u8]>) -> Result<Self, Error> {
        match value {
            None => Ok(ReferenceStorageFormat::LooseFiles),
            Some(v) if v == b"reftable" => Ok(ReferenceStorageFormat::RefTable),
            Some(v) => Err(Error::NotSupported(format!(
                "unsupported extensions.refstorage value {:?}",
                String::from_utf8_lossy(v)
            ))),
        }
    }
}

/// The raw contents of a single loose ref file, trimmed of trailing ASCII whitespace.
///
/// Returns `None` if the file does not exist or its path is not a valid loose-ref location
/// (e.g. a path component collides with a regular file) - both cases fall back to
/// packed-refs/reftable rather than being treated as fatal. Other I/O errors propagate.
pub fn read(path: &Path) -> Result<Option<Vec<u8>>, Error> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(trim_trailing_ascii_whitespace(bytes))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) if is_not_a_directory(&e) => Ok(None),
        Err(source) => Err(Error::Io { path: path.to_owned(), source }),
    }
}

#[cfg(unix)]
fn is_not_a_directory(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(libc_not_a_directory())
}

#[cfg(unix)]
fn libc_not_a_directory() -> i32 {
    20
}

#[cfg(not(unix))]
fn is_not_a_directory(_e: &std::io::Error) -> bool {
    false
}

fn trim_trailing_ascii_whitespace(mut bytes: Vec<u8>) -> Vec<u8> {
    while matches!(bytes.last(), Some(b) if b.is_ascii_whitespace()) {
        bytes.pop();
    }
    bytes
}

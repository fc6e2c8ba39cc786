//! The `core.repositoryformatversion` / `extensions.*` compatibility gate every repository
//! open must pass before its refs, config, or working tree are trusted.
use std::convert::TryFrom;
use std::path::Path;

use gitmeta_config::{value::Integer, File, VariableKey};

use crate::error::Error;

const KNOWN_EXTENSIONS: &[&[u8]] =
    &[b"noop", b"preciousobjects", b"partialclone", b"worktreeconfig", b"refstorage", b"objectformat", b"relativeworktrees"];

/// Validate `core.repositoryformatversion` and, for version 1, every `extensions.*` key.
pub fn check(config: &File, common_dir: &Path) -> Result<(), Error> {
    let key = VariableKey::new("core", "repositoryformatversion");
    let version = match config.get(&key) {
        Some(raw) => parse_version(raw.as_ref(), common_dir)?,
        None => 0,
    };

    if version > 1 {
        return Err(Error::UnsupportedFormatVersion { path: common_dir.to_owned(), version });
    }

    if version == 1 {
        for (key, _value) in config.entries_in_section(b"extensions", None) {
            if !KNOWN_EXTENSIONS.contains(&key.name.as_slice()) {
                return Err(Error::UnsupportedExtension {
                    path: common_dir.to_owned(),
                    name: String::from_utf8_lossy(key.name.as_slice()).into_owned(),
                });
            }
        }
    }

    Ok(())
}

fn parse_version(raw: &[u8], common_dir: &Path) -> Result<i64, Error> {
    let integer = Integer::try_from(raw)
        .map_err(|_| Error::InvalidFormat { path: common_dir.to_owned(), message: "core.repositoryformatversion is not a valid integer".into() })?;
    integer.to_decimal().ok_or_else(|| Error::InvalidFormat {
        path: common_dir.to_owned(),
        message: "core.repositoryformatversion overflows".into(),
    })
}

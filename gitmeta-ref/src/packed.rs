//! The `packed-refs` text format: one table-of-contents file covering many refs, with an
//! optional following peeled (dereferenced tag) line for each entry.
use std::collections::HashMap;
use std::path::Path;

use gitmeta_hash::{ObjectId, ObjectNameFormat};

use crate::error::Error;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PackedRef {
    pub target: ObjectId,
    pub peeled: Option<ObjectId>,
}

#[derive(Debug, Default)]
pub struct PackedRefs {
    refs: HashMap<Vec<u8>, PackedRef>,
}

impl PackedRefs {
    pub fn get(&self, name: &[u8]) -> Option<&PackedRef> {
        self.refs.get(name)
    }

    /// Parse a `packed-refs` file's contents.
    ///
    /// A zero-byte file is a valid, empty map. A non-empty file must start with a
    /// `# pack-refs with:` header line or the whole file is rejected. Peeled (`^`-prefixed)
    /// lines attach to the ref line immediately above them; the first occurrence of a ref name
    /// wins if the file somehow repeats one.
    pub fn parse(bytes: &[u8], hash_format: ObjectNameFormat, path: &Path) -> Result<Self, Error> {
        if bytes.is_empty() {
            return Ok(PackedRefs::default());
        }

        let invalid = |message: String| Error::InvalidData { path: path.to_owned(), message };

        let mut lines = bytes.split(|&b| b == b'\n').peekable();
        let first = lines.next().unwrap_or(b"");
        if !first.starts_with(b"# pack-refs with:") {
            return Err(invalid("packed-refs file is missing its header line".into()));
        }

        let mut refs: HashMap<Vec<u8>, PackedRef> = HashMap::new();
        let mut last_name: Option<Vec<u8>> = None;

        for line in lines {
            let line = strip_trailing_cr(line);
            if line.is_empty() {
                continue;
            }
            if line[0] == b'#' {
                continue;
            }
            if line[0] == b'^' {
                let hex = &line[1..];
                let peeled = ObjectId::from_bytes(hash_format, &decode_hex(hex, hash_format, path)?)
                    .map_err(|e| invalid(e.to_string()))?;
                if let Some(name) = &last_name {
                    if let Some(entry) = refs.get_mut(name.as_slice()) {
                        entry.peeled = Some(peeled);
                    }
                }
                continue;
            }

            let mut fields = line.splitn(3, |&b| b == b' ');
            let hex = fields.next().unwrap_or(b"");
            let rest = fields.next().unwrap_or(b"");
            if fields.next().is_some() {
                // A third whitespace-separated token makes the whole line invalid; skip it
                // without touching `last_name` so a following peeled line doesn't attach here.
                last_name = None;
                continue;
            }
            if rest.is_empty() || !rest.starts_with(b"refs/") {
                last_name = None;
                continue;
            }
            let object_id =
                ObjectId::from_bytes(hash_format, &decode_hex(hex, hash_format, path)?).map_err(|e| invalid(e.to_string()))?;

            if refs.contains_key(rest) {
                last_name = None;
                continue;
            }
            refs.insert(rest.to_vec(), PackedRef { target: object_id, peeled: None });
            last_name = Some(rest.to_vec());
        }

        Ok(PackedRefs { refs })
    }
}

fn strip_trailing_cr(line: &[u8]) -> &[u8] {
    if line.last() == Some(&b'\r') {
        &line[..line.len() - 1]
    } else {
        line
    }
}

fn decode_hex(hex: &[u8], hash_format: ObjectNameFormat, path: &Path) -> Result<Vec<u8>, Error> {
    if hex.len() != hash_format.len_in_hex() || !hex.iter().all(u8::is_ascii_hexdigit) {
        return Err(Error::InvalidData {
            path: path.to_owned(),
            message: "packed-refs entry has a malformed object name".into(),
        });
    }
    let text = std::str::from_utf8(hex)
        .map_err(|_| Error::InvalidData { path: path.to_owned(), message: "packed-refs object name is not ASCII".into() })?;
    let object = ObjectId::from_hex(text)
        .map_err(|e| Error::InvalidData { path: path.to_owned(), message: e.to_string() })?;
    Ok(object.as_bytes().to_vec())
}

//! Object names: the lowercase-hex digests git uses to identify blobs, trees, commits and tags.
//!
//! This crate only models the *name*, not the object graph behind it - no decoding of commits,
//! trees, or packfiles happens here or anywhere else in this workspace.
#![deny(rust_2018_idioms)]

use quick_error::quick_error;

/// The hash algorithm a repository's objects and reftable are keyed by.
///
/// `extensions.refstorage`/`core.repositoryformatversion` select this; a version-1 repository
/// without `extensions.objectformat` is always [`Sha1`][ObjectNameFormat::Sha1].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ObjectNameFormat {
    /// 20-byte SHA-1 digests, 40 hex characters.
    Sha1,
    /// 32-byte SHA-256 digests, 64 hex characters.
    Sha256,
}

impl ObjectNameFormat {
    /// The raw digest length in bytes.
    pub fn len_in_bytes(&self) -> usize {
        match self {
            ObjectNameFormat::Sha1 => 20,
            ObjectNameFormat::Sha256 => 32,
        }
    }

    /// The digest length when hex-encoded.
    pub fn len_in_hex(&self) -> usize {
        self.len_in_bytes() * 2
    }

    /// Map the `hash_id` field of a reftable header (`"sha1"` or `"s256"`) to a format.
    pub fn from_reftable_hash_id(id: u32) -> Option<Self> {
        match id {
            0x73686131 => Some(ObjectNameFormat::Sha1),  // "sha1"
            0x73323536 => Some(ObjectNameFormat::Sha256), // "s256"
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectNameFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ObjectNameFormat::Sha1 => "SHA-1",
            ObjectNameFormat::Sha256 => "SHA-256",
        })
    }
}

quick_error! {
    /// The error returned when an object name fails to parse from hex or raw bytes.
    #[derive(Debug, PartialEq)]
    #[allow(missing_docs)]
    pub enum Error {
        InvalidHexLength(len: usize) {
            display("An object name must be 40 (SHA-1) or 64 (SHA-256) hex characters long, got {}", len)
        }
        InvalidHexCharacter(c: char, index: usize) {
            display("Invalid hex character '{}' at position {}", c, index)
        }
        InvalidByteLength(len: usize) {
            display("An object name must be 20 (SHA-1) or 32 (SHA-256) bytes long, got {}", len)
        }
    }
}

/// An owned object name: a fixed-size digest tagged with the [`ObjectNameFormat`] that produced it.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ObjectId {
    /// A SHA-1 digest.
    Sha1([u8; 20]),
    /// A SHA-256 digest.
    Sha256([u8; 32]),
}

impl ObjectId {
    /// The all-zero id for `format`, used as a deletion/unset sentinel the way git uses it in
    /// reflogs and ref-transaction old-values.
    pub fn null(format: ObjectNameFormat) -> Self {
        match format {
            ObjectNameFormat::Sha1 => ObjectId::Sha1([0; 20]),
            ObjectNameFormat::Sha256 => ObjectId::Sha256([0; 32]),
        }
    }

    /// The format this id was produced with.
    pub fn format(&self) -> ObjectNameFormat {
        match self {
            ObjectId::Sha1(_) => ObjectNameFormat::Sha1,
            ObjectId::Sha256(_) => ObjectNameFormat::Sha256,
        }
    }

    /// Borrow the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ObjectId::Sha1(b) => &b[..],
            ObjectId::Sha256(b) => &b[..],
        }
    }

    /// True if every byte is zero - the value git code uses in place of "no object".
    pub fn is_null(&self) -> bool {
        self.as_bytes().iter().all(|&b| b == 0)
    }

    /// Parse `bytes` as a raw (non-hex) digest of `format`'s expected length.
    pub fn from_bytes(format: ObjectNameFormat, bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != format.len_in_bytes() {
            return Err(Error::InvalidByteLength(bytes.len()));
        }
        Ok(match format {
            ObjectNameFormat::Sha1 => {
                let mut buf = [0; 20];
                buf.copy_from_slice(bytes);
                ObjectId::Sha1(buf)
            }
            ObjectNameFormat::Sha256 => {
                let mut buf = [0; 32];
                buf.copy_from_slice(bytes);
                ObjectId::Sha256(buf)
            }
        })
    }

    /// Parse a lowercase (or mixed-case) hex object name, inferring the format from its length.
    pub fn from_hex(hex_str: &str) -> Result<Self, Error> {
        let format = match hex_str.len() {
            40 => ObjectNameFormat::Sha1,
            64 => ObjectNameFormat::Sha256,
            other => return Err(Error::InvalidHexLength(other)),
        };
        let bytes = hex::decode(hex_str).map_err(|e| match e {
            hex::FromHexError::InvalidHexCharacter { c, index } => Error::InvalidHexCharacter(c, index),
            hex::FromHexError::OddLength => Error::InvalidHexLength(hex_str.len()),
            hex::FromHexError::InvalidStringLength => Error::InvalidHexLength(hex_str.len()),
        })?;
        ObjectId::from_bytes(format, &bytes)
    }

    /// Render as lowercase hex, the form git always displays object names in.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

/// True if `s` is a syntactically valid lowercase-hex object name of either supported length.
pub fn is_object_name(s: &[u8]) -> bool {
    matches!(s.len(), 40 | 64) && s.iter().all(|b| b.is_ascii_hexdigit())
}

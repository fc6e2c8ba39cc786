//! The reftable file header and footer: the fixed-size framing that wraps the block stream.
use std::path::Path;

use gitmeta_hash::ObjectNameFormat;

use crate::error::Error;
use crate::reftable::varint::Cursor;

const MAGIC: &[u8; 4] = b"REFT";

/// The header every reftable file starts with, and that the footer carries a copy of.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Header {
    pub version: u8,
    pub block_size: u32,
    pub min_update_index: u64,
    pub max_update_index: u64,
    pub hash_format: ObjectNameFormat,
}

impl Header {
    /// 24 bytes for version 1 (no hash id field), 28 for version 2.
    pub fn size_in_bytes(&self) -> usize {
        match self.version {
            1 => 24,
            _ => 28,
        }
    }

    pub fn parse(cursor: &mut Cursor<'_>, path: &Path) -> Result<Self, Error> {
        let magic = cursor.read_bytes(4)?;
        if magic != MAGIC {
            return Err(Error::InvalidData { path: path.to_owned(), message: "reftable magic mismatch".into() });
        }
        let version = cursor.read_u8()?;
        if version != 1 && version != 2 {
            return Err(Error::InvalidData {
                path: path.to_owned(),
                message: format!("unsupported reftable version {version}"),
            });
        }
        let block_size = cursor.read_u24()?;
        let min_update_index = cursor.read_u64()?;
        let max_update_index = cursor.read_u64()?;
        let hash_format = if version == 2 {
            let hash_id = cursor.read_u32()?;
            ObjectNameFormat::from_reftable_hash_id(hash_id).ok_or_else(|| Error::InvalidData {
                path: path.to_owned(),
                message: format!("unsupported reftable hash id 0x{hash_id:08x}"),
            })?
        } else {
            ObjectNameFormat::Sha1
        };
        Ok(Header { version, block_size, min_update_index, max_update_index, hash_format })
    }
}

/// The five block-start positions recorded in the footer, each `0` if the section is absent.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct Footer {
    pub ref_index_position: u64,
    pub obj_position: u64,
    pub obj_index_position: u64,
    pub log_position: u64,
    pub log_index_position: u64,
}

/// Parse the header and footer of a whole reftable file, validating the footer's CRC-32 and
/// its `ref_index_position` bound. Returns the header, footer, and the byte offset the first
/// ref block starts at (immediately after the header).
pub fn parse_file(bytes: &[u8], path: &Path) -> Result<(Header, Footer, usize), Error> {
    let mut head_cursor = Cursor::new(bytes, path);
    let header = Header::parse(&mut head_cursor, path)?;
    let first_block_start = head_cursor.position();

    let footer_len = header.size_in_bytes() + 44;
    let file_len = bytes.len();
    let footer_start = file_len.checked_sub(footer_len).ok_or_else(|| Error::InvalidData {
        path: path.to_owned(),
        message: "reftable file is shorter than its footer".into(),
    })?;

    let crc_start = file_len - 4;
    let expected_crc = u32::from_be_bytes(
        bytes[crc_start..file_len].try_into().map_err(|_| Error::InvalidData {
            path: path.to_owned(),
            message: "truncated reftable footer CRC".into(),
        })?,
    );
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&bytes[footer_start..crc_start]);
    if hasher.finalize() != expected_crc {
        return Err(Error::InvalidData { path: path.to_owned(), message: "reftable footer CRC mismatch".into() });
    }

    let mut footer_cursor = Cursor::new(bytes, path);
    footer_cursor.seek(footer_start);
    let footer_header = Header::parse(&mut footer_cursor, path)?;
    if footer_header != header {
        return Err(Error::InvalidData {
            path: path.to_owned(),
            message: "reftable footer header copy does not match the file header".into(),
        });
    }

    let ref_index_position = footer_cursor.read_u64()?;
    let obj_position = footer_cursor.read_u64()?;
    let obj_index_position = footer_cursor.read_u64()?;
    let log_position = footer_cursor.read_u64()?;
    let log_index_position = footer_cursor.read_u64()?;

    if ref_index_position > file_len as u64 {
        return Err(Error::InvalidData {
            path: path.to_owned(),
            message: "reftable ref_index_position points past the end of the file".into(),
        });
    }

    Ok((
        header,
        Footer { ref_index_position, obj_position, obj_index_position, log_position, log_index_position },
        first_block_start,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_file(version: u8, hash_format: ObjectNameFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        buf.push(version);
        buf.extend_from_slice(&[0, 0x10, 0]); // block_size = 4096
        buf.extend_from_slice(&0u64.to_be_bytes());
        buf.extend_from_slice(&7u64.to_be_bytes());
        if version == 2 {
            let id: u32 = match hash_format {
                ObjectNameFormat::Sha1 => 0x73686131,
                ObjectNameFormat::Sha256 => 0x73323536,
            };
            buf.extend_from_slice(&id.to_be_bytes());
        }
        let header_copy = buf.clone();
        buf.extend_from_slice(&header_copy);
        for _ in 0..5 {
            buf.extend_from_slice(&0u64.to_be_bytes());
        }
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&buf[header_copy.len()..]);
        buf.extend_from_slice(&hasher.finalize().to_be_bytes());
        buf
    }

    #[test]
    fn parses_a_version_one_header_and_footer() {
        let bytes = build_file(1, ObjectNameFormat::Sha1);
        let path = Path::new("tables/0000000000000001-0000000000000001.ref");
        let (header, footer, first_block) = parse_file(&bytes, path).unwrap();
        assert_eq!(header.version, 1);
        assert_eq!(header.block_size, 0x1000);
        assert_eq!(header.hash_format, ObjectNameFormat::Sha1);
        assert_eq!(footer.ref_index_position, 0);
        assert_eq!(first_block, 24);
    }

    #[test]
    fn parses_a_version_two_header_with_sha256() {
        let bytes = build_file(2, ObjectNameFormat::Sha256);
        let path = Path::new("table.ref");
        let (header, _footer, first_block) = parse_file(&bytes, path).unwrap();
        assert_eq!(header.version, 2);
        assert_eq!(header.hash_format, ObjectNameFormat::Sha256);
        assert_eq!(first_block, 28);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = build_file(1, ObjectNameFormat::Sha1);
        bytes[0] = b'X';
        assert!(parse_file(&bytes, Path::new("t")).is_err());
    }

    #[test]
    fn rejects_corrupted_footer_crc() {
        let mut bytes = build_file(1, ObjectNameFormat::Sha1);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(parse_file(&bytes, Path::new("t")).is_err());
    }

    #[test]
    fn rejects_unsupported_version() {
        let bytes = build_file(3, ObjectNameFormat::Sha1);
        assert!(parse_file(&bytes, Path::new("t")).is_err());
    }
}

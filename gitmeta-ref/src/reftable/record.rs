//! Decoding of individual ref and index records from a reftable block.
//!
//! Every record is prefix-compressed against the previous record's name within the same
//! block: `prefix_length` bytes are shared with `prior_name`, and only the remaining
//! `suffix_length` bytes are stored.
use bstr::BString;

use gitmeta_hash::{ObjectId, ObjectNameFormat};

use crate::error::Error;
use crate::reftable::varint::Cursor;

/// What a ref record's name currently points at.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RefValue {
    /// The ref is absent - a tombstone recorded by an incremental table in the stack.
    Deletion,
    /// Points directly at an object.
    Object(ObjectId),
    /// Points at an object and also carries its peeled (dereferenced-tag) value.
    ObjectWithPeeled { value: ObjectId, peeled: ObjectId },
    /// A symbolic reference to another full ref name.
    Symbolic(String),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RefRecord {
    pub name: BString,
    pub value: RefValue,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IndexRecord {
    pub name: BString,
    pub block_position: u64,
}

fn reconstruct_name(
    cursor: &mut Cursor<'_>,
    prior_name: &BString,
    prefix_length: usize,
    suffix_length: usize,
    path: &std::path::Path,
) -> Result<BString, Error> {
    if prefix_length > prior_name.len() {
        return Err(Error::InvalidData {
            path: path.to_owned(),
            message: "reftable record prefix_length exceeds the previous record's name".into(),
        });
    }
    let suffix = cursor.read_bytes(suffix_length)?;
    std::str::from_utf8(suffix).map_err(|_| Error::InvalidData {
        path: path.to_owned(),
        message: "reftable record name suffix is not valid UTF-8".into(),
    })?;
    let mut name = prior_name[..prefix_length].to_vec();
    name.extend_from_slice(suffix);
    Ok(BString::from(name))
}

/// Decode one ref record. `prior_name` is updated in place to the decoded record's name so the
/// next call in the same block can prefix-compress against it.
pub fn decode_ref_record(
    cursor: &mut Cursor<'_>,
    prior_name: &mut BString,
    hash_format: ObjectNameFormat,
    path: &std::path::Path,
) -> Result<RefRecord, Error> {
    let prefix_length = cursor.read_varint()? as usize;
    let suffix_and_type = cursor.read_varint()?;
    let suffix_length = (suffix_and_type >> 3) as usize;
    let value_type = (suffix_and_type & 0x7) as u8;

    let name = reconstruct_name(cursor, prior_name, prefix_length, suffix_length, path)?;
    let _update_index_delta = cursor.read_varint()?;

    let value = match value_type {
        0 => RefValue::Deletion,
        1 => {
            let bytes = cursor.read_bytes(hash_format.len_in_bytes())?;
            RefValue::Object(ObjectId::from_bytes(hash_format, bytes).map_err(|e| Error::InvalidData {
                path: path.to_owned(),
                message: e.to_string(),
            })?)
        }
        2 => {
            let len = hash_format.len_in_bytes();
            let value_bytes = cursor.read_bytes(len)?.to_vec();
            let peeled_bytes = cursor.read_bytes(len)?;
            let value = ObjectId::from_bytes(hash_format, &value_bytes)
                .map_err(|e| Error::InvalidData { path: path.to_owned(), message: e.to_string() })?;
            let peeled = ObjectId::from_bytes(hash_format, peeled_bytes)
                .map_err(|e| Error::InvalidData { path: path.to_owned(), message: e.to_string() })?;
            RefValue::ObjectWithPeeled { value, peeled }
        }
        3 => {
            let len = cursor.read_varint()? as usize;
            let bytes = cursor.read_bytes(len)?;
            let target = std::str::from_utf8(bytes)
                .map_err(|_| Error::InvalidData {
                    path: path.to_owned(),
                    message: "symbolic reftable target is not valid UTF-8".into(),
                })?
                .to_owned();
            RefValue::Symbolic(target)
        }
        other => {
            return Err(Error::InvalidData {
                path: path.to_owned(),
                message: format!("unrecognized reftable ref value type {other}"),
            })
        }
    };

    *prior_name = name.clone();
    Ok(RefRecord { name, value })
}

/// Decode one index record. Index records never carry an `update_index_delta`, and their
/// `value_type` must be `0`.
pub fn decode_index_record(cursor: &mut Cursor<'_>, prior_name: &mut BString, path: &std::path::Path) -> Result<IndexRecord, Error> {
    let prefix_length = cursor.read_varint()? as usize;
    let suffix_and_type = cursor.read_varint()?;
    let suffix_length = (suffix_and_type >> 3) as usize;
    let value_type = (suffix_and_type & 0x7) as u8;
    if value_type != 0 {
        return Err(Error::InvalidData {
            path: path.to_owned(),
            message: format!("reftable index record has non-zero value type {value_type}"),
        });
    }

    let name = reconstruct_name(cursor, prior_name, prefix_length, suffix_length, path)?;
    let block_position = cursor.read_varint()?;

    *prior_name = name.clone();
    Ok(IndexRecord { name, block_position })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn varint_bytes(mut value: u64) -> Vec<u8> {
        let mut groups = vec![(value & 0x7f) as u8];
        value >>= 7;
        while value > 0 {
            value -= 1;
            groups.push(0x80 | (value & 0x7f) as u8);
            value >>= 7;
        }
        groups.reverse();
        groups
    }

    #[test]
    fn decodes_a_full_name_object_record() {
        let mut buf = Vec::new();
        buf.extend(varint_bytes(0)); // prefix_length
        let suffix = b"refs/heads/main";
        buf.extend(varint_bytes(((suffix.len() as u64) << 3) | 1)); // suffix_length<<3 | value_type=object
        buf.extend_from_slice(suffix);
        buf.extend(varint_bytes(0)); // update_index_delta
        buf.extend_from_slice(&[0x11; 20]);

        let path = Path::new("t");
        let mut cursor = Cursor::new(&buf, &path);
        let mut prior = BString::from("");
        let record = decode_ref_record(&mut cursor, &mut prior, ObjectNameFormat::Sha1, &path).unwrap();
        assert_eq!(record.name, BString::from("refs/heads/main"));
        assert_eq!(record.value, RefValue::Object(ObjectId::from_bytes(ObjectNameFormat::Sha1, &[0x11; 20]).unwrap()));
        assert_eq!(prior, BString::from("refs/heads/main"));
    }

    #[test]
    fn decodes_a_prefix_compressed_deletion_record() {
        let prior_name = BString::from("refs/heads/main");
        let mut buf = Vec::new();
        buf.extend(varint_bytes(11)); // shares "refs/heads/"
        let suffix = b"topic";
        buf.extend(varint_bytes(((suffix.len() as u64) << 3) | 0));
        buf.extend_from_slice(suffix);
        buf.extend(varint_bytes(0));

        let path = Path::new("t");
        let mut cursor = Cursor::new(&buf, &path);
        let mut prior = prior_name;
        let record = decode_ref_record(&mut cursor, &mut prior, ObjectNameFormat::Sha1, &path).unwrap();
        assert_eq!(record.name, BString::from("refs/heads/topic"));
        assert_eq!(record.value, RefValue::Deletion);
    }

    #[test]
    fn decodes_a_symbolic_record() {
        let mut buf = Vec::new();
        buf.extend(varint_bytes(0));
        let suffix = b"HEAD";
        buf.extend(varint_bytes(((suffix.len() as u64) << 3) | 3));
        buf.extend_from_slice(suffix);
        buf.extend(varint_bytes(0));
        let target = b"refs/heads/main";
        buf.extend(varint_bytes(target.len() as u64));
        buf.extend_from_slice(target);

        let path = Path::new("t");
        let mut cursor = Cursor::new(&buf, &path);
        let mut prior = BString::from("");
        let record = decode_ref_record(&mut cursor, &mut prior, ObjectNameFormat::Sha1, &path).unwrap();
        assert_eq!(record.value, RefValue::Symbolic("refs/heads/main".to_owned()));
    }

    #[test]
    fn decodes_an_index_record() {
        let mut buf = Vec::new();
        buf.extend(varint_bytes(0));
        let suffix = b"refs/heads/main";
        buf.extend(varint_bytes((suffix.len() as u64) << 3));
        buf.extend_from_slice(suffix);
        buf.extend(varint_bytes(4096));

        let path = Path::new("t");
        let mut cursor = Cursor::new(&buf, &path);
        let mut prior = BString::from("");
        let record = decode_index_record(&mut cursor, &mut prior, &path).unwrap();
        assert_eq!(record.name, BString::from("refs/heads/main"));
        assert_eq!(record.block_position, 4096);
    }

    #[test]
    fn rejects_index_record_with_nonzero_value_type() {
        let mut buf = Vec::new();
        buf.extend(varint_bytes(0));
        buf.extend(varint_bytes((4u64 << 3) | 1));
        buf.extend_from_slice(b"name");
        buf.extend(varint_bytes(0));

        let path = Path::new("t");
        let mut cursor = Cursor::new(&buf, &path);
        let mut prior = BString::from("");
        assert!(decode_index_record(&mut cursor, &mut prior, &path).is_err());
    }
}

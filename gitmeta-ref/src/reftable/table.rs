//! A single reftable file: header, footer, and the lookup that walks the ref-index (if
//! present) or falls back to a sequential scan of the ref blocks.
use std::path::{Path, PathBuf};

use gitmeta_hash::ObjectNameFormat;

use crate::error::Error;
use crate::reftable::block::{self, Block};
use crate::reftable::format::{self, Footer, Header};
use crate::reftable::record::RefRecord;

pub struct Table {
    path: PathBuf,
    bytes: Vec<u8>,
    header: Header,
    footer: Footer,
    first_block_start: usize,
}

impl Table {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let bytes = std::fs::read(path).map_err(|source| Error::Io { path: path.to_owned(), source })?;
        let (header, footer, first_block_start) = format::parse_file(&bytes, path)?;
        Ok(Table { path: path.to_owned(), bytes, header, footer, first_block_start })
    }

    pub fn hash_format(&self) -> ObjectNameFormat {
        self.header.hash_format
    }

    pub fn min_update_index(&self) -> u64 {
        self.header.min_update_index
    }

    pub fn max_update_index(&self) -> u64 {
        self.header.max_update_index
    }

    /// Look up `name`, returning `None` if it is absent from this table. A [`RefValue::Deletion`][
    /// crate::reftable::record::RefValue::Deletion] result is itself meaningful - the caller
    /// (the stack) treats it as a tombstone that shadows older tables.
    pub fn find(&self, name: &[u8]) -> Result<Option<RefRecord>, Error> {
        if self.footer.ref_index_position != 0 {
            self.find_via_index(name)
        } else {
            self.find_via_scan(name)
        }
    }

    fn find_via_index(&self, name: &[u8]) -> Result<Option<RefRecord>, Error> {
        let mut position = self.footer.ref_index_position as usize;
        loop {
            let (block, _end) = Block::parse(&self.bytes, position, &self.path)?;
            match block.block_type {
                block::INDEX_BLOCK => {
                    let entry = block.find_index(name, &self.path)?;
                    match entry {
                        Some(entry) => position = entry.block_position as usize,
                        None => return Ok(None),
                    }
                }
                block::REF_BLOCK => return block.find_ref(name, self.hash_format(), &self.path),
                other => {
                    return Err(Error::InvalidData {
                        path: self.path.clone(),
                        message: format!("unexpected reftable block type 0x{other:02x} while descending the ref index"),
                    })
                }
            }
        }
    }

    fn find_via_scan(&self, name: &[u8]) -> Result<Option<RefRecord>, Error> {
        let scan_end = self.scan_limit();
        let mut position = self.first_block_start;
        while position < scan_end {
            let (block, end) = Block::parse(&self.bytes, position, &self.path)?;
            if block.block_type != block::REF_BLOCK {
                break;
            }
            if let Some(record) = block.find_ref(name, self.hash_format(), &self.path)? {
                return Ok(Some(record));
            }
            position = if self.header.block_size != 0 {
                position + self.header.block_size as usize
            } else {
                end
            };
        }
        Ok(None)
    }

    /// Where the ref-block stream ends: the first non-zero footer position records the start
    /// of whatever section follows the ref blocks.
    fn scan_limit(&self) -> usize {
        [self.footer.ref_index_position, self.footer.obj_position, self.footer.log_position]
            .into_iter()
            .filter(|&p| p != 0)
            .map(|p| p as usize)
            .min()
            .unwrap_or_else(|| self.bytes.len().saturating_sub(self.header.size_in_bytes() + 44))
    }
}

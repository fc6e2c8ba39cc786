//! `reftable/tables.list`: the ordered set of tables making up a repository's reference store.
//!
//! Tables are listed oldest-first on disk; a lookup walks them newest-first so the most recent
//! write (including a deletion tombstone) always wins.
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::reftable::record::{RefRecord, RefValue};
use crate::reftable::table::Table;

pub struct Stack {
    reftable_dir: PathBuf,
    table_names: Vec<String>,
}

impl Stack {
    /// Read `<git_dir>/reftable/tables.list` and remember the table file names it lists, in
    /// the order they appear (oldest first).
    pub fn open(git_dir: &Path) -> Result<Self, Error> {
        let reftable_dir = git_dir.join("reftable");
        let list_path = reftable_dir.join("tables.list");
        let contents = std::fs::read_to_string(&list_path).map_err(|source| Error::Io { path: list_path.clone(), source })?;
        let table_names = contents.lines().map(str::trim).filter(|line| !line.is_empty()).map(str::to_owned).collect();
        Ok(Stack { reftable_dir, table_names })
    }

    /// Resolve `name` against the stack, most recent table first. A deletion tombstone in a
    /// newer table shadows any value an older table has for the same name.
    pub fn find(&self, name: &[u8]) -> Result<Option<RefRecord>, Error> {
        for table_name in self.table_names.iter().rev() {
            let table = Table::open(&self.reftable_dir.join(table_name))?;
            if let Some(record) = table.find(name)? {
                return Ok(match record.value {
                    RefValue::Deletion => None,
                    _ => Some(record),
                });
            }
        }
        Ok(None)
    }
}

use std::path::PathBuf;

use bstr::{BStr, BString};

use crate::key::VariableKey;

/// Where a given config value came from, for diagnostics and for `core.worktree`-style
/// decisions that care about which tier won.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Source {
    ProgramData,
    System,
    Xdg,
    Global,
    Local,
    /// Reached through an `include.path` or `includeIf.<cond>.path` directive in some other
    /// file; carries the resolved path of the included file itself.
    Include(PathBuf),
}

/// A single value as stored in a [`File`]: its bytes plus where it came from.
#[derive(Clone, Debug)]
pub struct ValueEntry {
    pub value: BString,
    pub source: Source,
}

/// The fully merged view of every config file read for a repository: a multi-map from
/// [`VariableKey`] to the ordered list of values assigned to it, in the order the files that
/// defined them were read. Later values shadow earlier ones for single-valued lookups but
/// all of them remain visible via [`File::get_all`].
#[derive(Clone, Debug, Default)]
pub struct File {
    values: Vec<(VariableKey, ValueEntry)>,
}

impl File {
    pub fn new() -> Self {
        File::default()
    }

    /// Append one value for `key`, recording where it came from.
    pub fn push(&mut self, key: VariableKey, value: BString, source: Source) {
        self.values.push((key, ValueEntry { value, source }));
    }

    /// The last (highest-priority) value assigned to `key`, if any.
    pub fn get(&self, key: &VariableKey) -> Option<&BStr> {
        self.values.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.value.as_ref())
    }

    /// Every value assigned to `key`, in the order they were read.
    pub fn get_all<'a>(&'a self, key: &'a VariableKey) -> impl Iterator<Item = &'a BStr> + 'a {
        self.values.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.value.as_ref())
    }

    /// Every entry whose section (and, if given, subsection) matches; used to enumerate
    /// e.g. all `submodule "*"` blocks without knowing their names up front.
    pub fn entries_in_section<'a>(
        &'a self,
        section: &'a [u8],
        subsection: Option<&'a [u8]>,
    ) -> impl Iterator<Item = (&'a VariableKey, &'a BStr)> + 'a {
        self.values.iter().filter_map(move |(k, v)| {
            let section_matches = k.section.as_slice() == section;
            let subsection_matches = subsection.map_or(true, |s| k.subsection.as_slice() == s);
            (section_matches && subsection_matches).then(|| (k, v.value.as_ref()))
        })
    }

    /// Distinct subsection names that occur under `section`, in first-seen order; used to
    /// discover e.g. every submodule name without the caller enumerating candidates.
    pub fn subsections_of<'a>(&'a self, section: &'a [u8]) -> Vec<&'a BStr> {
        let mut seen = Vec::new();
        for (k, _) in &self.values {
            if k.section.as_slice() == section && !k.subsection.is_empty() {
                let sub = k.subsection.as_ref();
                if !seen.contains(&sub) {
                    seen.push(sub);
                }
            }
        }
        seen
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

//! A reader for git's `.gitignore` tree: hierarchical pattern groups with negation,
//! directory-only and anchored patterns, and `.git`-is-always-ignored semantics.
#![deny(rust_2018_idioms)]

pub mod group;
pub mod pattern;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use bstr::{BStr, BString, ByteSlice};

pub use group::PatternGroup;
pub use pattern::{Flags, Pattern};

/// Matches paths under a working directory against the `.gitignore` tree rooted there, plus
/// an optional `core.excludesFile` / `info/exclude` root group.
///
/// Every cache here (`groups`, `dir_state`) is a plain [`RefCell`], matching the rest of the
/// workspace's rule that a single `Matcher` is used from one thread at a time; build a
/// separate instance per thread if you need parallelism.
pub struct Matcher {
    working_dir: PathBuf,
    ignore_case: bool,
    root_group: Option<Rc<PatternGroup>>,
    groups: RefCell<HashMap<PathBuf, Option<Rc<PatternGroup>>>>,
    dir_state: RefCell<HashMap<PathBuf, bool>>,
}

impl Matcher {
    /// Build a matcher for `working_dir`. `excludes_file` and `info_exclude` are the
    /// already-resolved, already-interpolated paths for `core.excludesFile` and
    /// `<common_dir>/info/exclude`; either may be absent. Per the resolved precedence,
    /// `info/exclude` is the closer (overriding) group and `excludes_file` the one beneath it.
    pub fn new(
        working_dir: PathBuf,
        ignore_case: bool,
        excludes_file: Option<&Path>,
        info_exclude: Option<&Path>,
    ) -> Self {
        let root_posix = gitmeta_path::into_bstr(&working_dir).into_owned();
        let excludes_group = excludes_file.and_then(|p| group::load(p, root_posix.clone(), None));
        let info_group = info_exclude.and_then(|p| group::load(p, root_posix, excludes_group.clone()));
        let root_group = info_group.or(excludes_group);

        Matcher {
            working_dir,
            ignore_case,
            root_group,
            groups: RefCell::new(HashMap::new()),
            dir_state: RefCell::new(HashMap::new()),
        }
    }

    /// Classify `full_path` (an absolute, normalized, native path). Returns `None` if the
    /// path lies outside the working directory.
    pub fn classify(&self, full_path: &Path) -> Option<bool> {
        let span = gitmeta_trace::detail!("ignore::classify", path = %full_path.display());
        span.in_scope(|| self.classify_inner(full_path))
    }

    fn classify_inner(&self, full_path: &Path) -> Option<bool> {
        if full_path == self.working_dir {
            return Some(false);
        }
        if !full_path.starts_with(&self.working_dir) {
            return None;
        }
        let is_dir = full_path.is_dir();
        if self.basename_is_dot_git(full_path) {
            return Some(true);
        }
        let parent = full_path.parent().unwrap_or(&self.working_dir);
        if self.directory_is_ignored(parent) {
            return Some(true);
        }
        Some(self.matches_patterns(full_path, is_dir))
    }

    fn directory_is_ignored(&self, dir: &Path) -> bool {
        if dir == self.working_dir || !dir.starts_with(&self.working_dir) {
            return false;
        }
        if let Some(&cached) = self.dir_state.borrow().get(dir) {
            return cached;
        }
        let ignored = if self.basename_is_dot_git(dir) {
            true
        } else {
            let parent = dir.parent().unwrap_or(&self.working_dir);
            self.directory_is_ignored(parent) || self.matches_patterns(dir, true)
        };
        self.dir_state.borrow_mut().insert(dir.to_owned(), ignored);
        ignored
    }

    fn basename_is_dot_git(&self, path: &Path) -> bool {
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => {
                if self.ignore_case {
                    name.eq_ignore_ascii_case(".git")
                } else {
                    name == ".git"
                }
            }
            None => false,
        }
    }

    fn matches_patterns(&self, full_path: &Path, is_dir: bool) -> bool {
        let containing_dir = full_path.parent().unwrap_or(&self.working_dir);
        let group = self.group_for(containing_dir);
        let chain = group::chain(&group);

        let full_posix = gitmeta_path::into_bstr(full_path).into_owned();
        let basename_posix: BString = full_path
            .file_name()
            .map(|n| gitmeta_path::into_bstr(Path::new(n)).into_owned())
            .unwrap_or_default();

        let options = gitmeta_glob::Options::new().ignore_case(self.ignore_case);
        let mut state = false;
        for group in &chain {
            for pattern in &group.patterns {
                if pattern.flags.contains(Flags::DIRECTORY_ONLY) && !is_dir {
                    continue;
                }
                let candidate: &BStr = if pattern.flags.contains(Flags::ANCHORED) {
                    relative_to(full_posix.as_ref(), group.containing_dir_posix.as_ref())
                } else {
                    basename_posix.as_ref()
                };
                if gitmeta_glob::matches(pattern.glob.as_slice(), candidate.as_ref(), options) {
                    state = !pattern.flags.contains(Flags::NEGATIVE);
                }
            }
        }
        state
    }

    fn group_for(&self, dir: &Path) -> Option<Rc<PatternGroup>> {
        if let Some(cached) = self.groups.borrow().get(dir) {
            return cached.clone();
        }
        let parent_group = if dir == self.working_dir || !dir.starts_with(&self.working_dir) {
            self.root_group.clone()
        } else {
            self.group_for(dir.parent().unwrap_or(&self.working_dir))
        };
        let containing_dir_posix = gitmeta_path::into_bstr(dir).into_owned();
        let own = group::load(&dir.join(".gitignore"), containing_dir_posix, parent_group);
        self.groups.borrow_mut().insert(dir.to_owned(), own.clone());
        own
    }
}

fn relative_to<'a>(full_posix: &'a BStr, containing_dir_posix: &BStr) -> &'a BStr {
    let mut prefix = containing_dir_posix.to_vec();
    if prefix.last() != Some(&b'/') {
        prefix.push(b'/');
    }
    full_posix.strip_prefix(prefix.as_slice()).map(BStr::new).unwrap_or(full_posix)
}

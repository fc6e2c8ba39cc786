use std::path::Path;
use std::rc::Rc;

use bstr::BString;

use crate::pattern::{self, Pattern};

/// One directory's worth of `.gitignore` patterns, chained to the group above it.
///
/// Never holds an empty pattern list: a directory whose `.gitignore` is missing or contains
/// no effective patterns contributes no node at all, and callers see straight through to its
/// parent (see [`load`]).
#[derive(Debug)]
pub struct PatternGroup {
    pub containing_dir_posix: BString,
    pub patterns: Vec<Pattern>,
    pub parent: Option<Rc<PatternGroup>>,
}

/// Load the pattern group for a single file (a `.gitignore`, `core.excludesFile`, or
/// `info/exclude`), coalescing to `parent` when the file is absent or has no effective lines.
pub fn load(path: &Path, containing_dir_posix: BString, parent: Option<Rc<PatternGroup>>) -> Option<Rc<PatternGroup>> {
    let bytes = std::fs::read(path).ok()?;
    let patterns: Vec<Pattern> = bytes.split(|&b| b == b'\n').filter_map(pattern::parse).collect();
    if patterns.is_empty() {
        return parent;
    }
    Some(Rc::new(PatternGroup { containing_dir_posix, patterns, parent }))
}

/// Flatten a group chain into outermost-first order, the order classification applies
/// patterns in so that patterns closer to the target override patterns further away.
pub fn chain(group: &Option<Rc<PatternGroup>>) -> Vec<Rc<PatternGroup>> {
    let mut out = Vec::new();
    let mut current = group.clone();
    while let Some(g) = current {
        current = g.parent.clone();
        out.push(g);
    }
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_coalesces_to_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let parent = Rc::new(PatternGroup {
            containing_dir_posix: BString::from("/root"),
            patterns: vec![pattern::parse(b"*.log").unwrap()],
            parent: None,
        });
        let result = load(&tmp.path().join(".gitignore"), BString::from("/root/child"), Some(parent.clone()));
        assert!(Rc::ptr_eq(&result.unwrap(), &parent));
    }

    #[test]
    fn file_with_only_comments_coalesces_to_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".gitignore");
        std::fs::File::create(&path).unwrap().write_all(b"# just a comment\n").unwrap();
        let result = load(&path, BString::from("/root"), None);
        assert!(result.is_none());
    }

    #[test]
    fn chain_orders_outermost_first() {
        let root = Rc::new(PatternGroup {
            containing_dir_posix: BString::from("/root"),
            patterns: vec![pattern::parse(b"a").unwrap()],
            parent: None,
        });
        let child = Rc::new(PatternGroup {
            containing_dir_posix: BString::from("/root/child"),
            patterns: vec![pattern::parse(b"b").unwrap()],
            parent: Some(root.clone()),
        });
        let names: Vec<_> = chain(&Some(child)).into_iter().map(|g| g.containing_dir_posix.clone()).collect();
        assert_eq!(names, vec![BString::from("/root"), BString::from("/root/child")]);
    }
}

//! Resolves a reference name (or `HEAD`) down to the object id it ultimately points at,
//! following symbolic references across whichever storage backend the repository uses.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use gitmeta_hash::{ObjectId, ObjectNameFormat};

use crate::error::Error;
use crate::loose::{self, ReferenceStorageFormat};
use crate::packed::PackedRefs;
use crate::reftable::{RefValue, Stack};

/// What a single hop of reference resolution found.
enum Hop {
    Object(ObjectId),
    Symbolic(Vec<u8>),
    Missing,
}

enum Backend {
    Loose { common_dir: PathBuf, packed: Option<PackedRefs> },
    RefTable { stack: Stack },
}

impl Backend {
    fn lookup(&self, name: &[u8], hash_format: ObjectNameFormat) -> Result<Hop, Error> {
        match self {
            Backend::Loose { common_dir, packed } => {
                let path = common_dir.join(String::from_utf8_lossy(name).as_ref());
                if let Some(contents) = loose::read(&path)? {
                    return Ok(parse_loose_contents(&contents));
                }
                if let Some(packed) = packed {
                    if let Some(entry) = packed.get(name) {
                        return Ok(Hop::Object(entry.target.clone()));
                    }
                }
                let _ = hash_format;
                Ok(Hop::Missing)
            }
            Backend::RefTable { stack } => match stack.find(name)? {
                None => Ok(Hop::Missing),
                Some(record) => Ok(match record.value {
                    RefValue::Deletion => Hop::Missing,
                    RefValue::Object(id) => Hop::Object(id),
                    RefValue::ObjectWithPeeled { value, .. } => Hop::Object(value),
                    RefValue::Symbolic(target) => Hop::Symbolic(target.into_bytes()),
                }),
            },
        }
    }
}

fn parse_loose_contents(contents: &[u8]) -> Hop {
    if let Some(target) = contents.strip_prefix(b"ref: ") {
        Hop::Symbolic(target.to_vec())
    } else if let Ok(text) = std::str::from_utf8(contents) {
        match ObjectId::from_hex(text) {
            Ok(id) => Hop::Object(id),
            Err(_) => Hop::Missing,
        }
    } else {
        Hop::Missing
    }
}

/// Resolves references within a single repository (one `common_dir`/`git_dir` pair).
pub struct RefResolver {
    git_dir: PathBuf,
    hash_format: ObjectNameFormat,
    backend: Backend,
}

impl RefResolver {
    /// Build a resolver for loose + packed-refs storage.
    pub fn loose(common_dir: &Path, git_dir: &Path, hash_format: ObjectNameFormat) -> Result<Self, Error> {
        let packed_refs_path = common_dir.join("packed-refs");
        let packed = match std::fs::read(&packed_refs_path) {
            Ok(bytes) => Some(PackedRefs::parse(&bytes, hash_format, &packed_refs_path)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => return Err(Error::Io { path: packed_refs_path, source }),
        };
        Ok(RefResolver {
            git_dir: git_dir.to_owned(),
            hash_format,
            backend: Backend::Loose { common_dir: common_dir.to_owned(), packed },
        })
    }

    /// Build a resolver for `reftable` storage.
    pub fn reftable(git_dir: &Path) -> Result<Self, Error> {
        let stack = Stack::open(git_dir)?;
        Ok(RefResolver { git_dir: git_dir.to_owned(), hash_format: ObjectNameFormat::Sha1, backend: Backend::RefTable { stack } })
    }

    /// Choose a resolver for `git_dir`/`common_dir` based on the already-parsed
    /// `extensions.refstorage` value.
    pub fn for_repository(
        common_dir: &Path,
        git_dir: &Path,
        storage_format: ReferenceStorageFormat,
        hash_format: ObjectNameFormat,
    ) -> Result<Self, Error> {
        match storage_format {
            ReferenceStorageFormat::LooseFiles => RefResolver::loose(common_dir, git_dir, hash_format),
            ReferenceStorageFormat::RefTable => RefResolver::reftable(git_dir),
        }
    }

    /// Resolve `HEAD` to the object it currently points at, or `None` for an unborn branch.
    pub fn head(&self) -> Result<Option<ObjectId>, Error> {
        let first = match &self.backend {
            Backend::Loose { .. } => {
                let head_path = self.git_dir.join("HEAD");
                match loose::read(&head_path)? {
                    Some(contents) => parse_loose_contents(&contents),
                    None => Hop::Missing,
                }
            }
            Backend::RefTable { stack } => match stack.find(b"HEAD")? {
                None => Hop::Missing,
                Some(record) => match record.value {
                    RefValue::Deletion => Hop::Missing,
                    RefValue::Object(id) => Hop::Object(id),
                    RefValue::ObjectWithPeeled { value, .. } => Hop::Object(value),
                    RefValue::Symbolic(target) => Hop::Symbolic(target.into_bytes()),
                },
            },
        };
        self.follow(first, "HEAD".to_owned())
    }

    /// Resolve a fully-qualified ref name (e.g. `refs/heads/main`) to the object it points at.
    pub fn resolve(&self, name: &[u8]) -> Result<Option<ObjectId>, Error> {
        let hop = self.backend.lookup(name, self.hash_format)?;
        self.follow(hop, String::from_utf8_lossy(name).into_owned())
    }

    fn follow(&self, first: Hop, first_name: String) -> Result<Option<ObjectId>, Error> {
        let mut visited = HashSet::new();
        visited.insert(first_name.clone());
        let mut current = first;
        let mut current_name = first_name;
        loop {
            match current {
                Hop::Missing => return Ok(None),
                Hop::Object(id) => return Ok(Some(id)),
                Hop::Symbolic(target) => {
                    use bstr::ByteSlice;
                    if !target.starts_with(b"refs/") || gitmeta_validate::refname(target.as_bstr()).is_err() {
                        return Err(Error::InvalidData {
                            path: self.git_dir.clone(),
                            message: format!(
                                "symbolic reference {current_name} points at {:?}, which is not a valid refs/ name",
                                String::from_utf8_lossy(&target)
                            ),
                        });
                    }
                    let target_name = String::from_utf8_lossy(&target).into_owned();
                    if !visited.insert(target_name.clone()) {
                        return Err(Error::Cycle { name: target_name });
                    }
                    current = self.backend.lookup(&target, self.hash_format)?;
                    current_name = target_name;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, contents: &str) {
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn resolves_head_through_one_symbolic_hop() {
        let tmp = tempfile::tempdir().unwrap();
        let git_dir = tmp.path();
        std::fs::create_dir_all(git_dir.join("refs/heads")).unwrap();
        write(&git_dir.join("HEAD"), "ref: refs/heads/main\n");
        write(&git_dir.join("refs/heads/main"), &format!("{}\n", "a".repeat(40)));

        let resolver = RefResolver::loose(git_dir, git_dir, ObjectNameFormat::Sha1).unwrap();
        let id = resolver.head().unwrap().unwrap();
        assert_eq!(id.to_hex(), "a".repeat(40));
    }

    #[test]
    fn unborn_branch_resolves_to_none() {
        let tmp = tempfile::tempdir().unwrap();
        let git_dir = tmp.path();
        write(&git_dir.join("HEAD"), "ref: refs/heads/main\n");

        let resolver = RefResolver::loose(git_dir, git_dir, ObjectNameFormat::Sha1).unwrap();
        assert!(resolver.head().unwrap().is_none());
    }

    #[test]
    fn a_self_referential_symbolic_ref_is_a_cycle_error() {
        let tmp = tempfile::tempdir().unwrap();
        let git_dir = tmp.path();
        std::fs::create_dir_all(git_dir.join("refs/heads")).unwrap();
        write(&git_dir.join("refs/heads/a"), "ref: refs/heads/b\n");
        write(&git_dir.join("refs/heads/b"), "ref: refs/heads/a\n");

        let resolver = RefResolver::loose(git_dir, git_dir, ObjectNameFormat::Sha1).unwrap();
        assert!(matches!(resolver.resolve(b"refs/heads/a"), Err(Error::Cycle { .. })));
    }

    #[test]
    fn falls_back_to_packed_refs_when_the_loose_file_is_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let git_dir = tmp.path();
        write(
            &git_dir.join("packed-refs"),
            &format!("# pack-refs with: peeled\n{} refs/heads/main\n", "b".repeat(40)),
        );

        let resolver = RefResolver::loose(git_dir, git_dir, ObjectNameFormat::Sha1).unwrap();
        let id = resolver.resolve(b"refs/heads/main").unwrap().unwrap();
        assert_eq!(id.to_hex(), "b".repeat(40));
    }
}

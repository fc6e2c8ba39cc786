//! Enumerates `[submodule "<name>"]` blocks in `.gitmodules`, resolving each entry's checkout
//! location and, if it's actually checked out, its own `HEAD` commit.
use std::path::{Path, PathBuf};

use bstr::{BString, ByteSlice};

use gitmeta_hash::ObjectId;

use crate::error::Error;
use crate::{hash_format_of, storage_format_of};

/// One entry from `.gitmodules`.
#[derive(Debug, Clone)]
pub struct Submodule {
    pub name: String,
    pub relative_path_posix: BString,
    pub full_path_native: PathBuf,
    pub url: Option<String>,
    pub head_commit: Option<ObjectId>,
}

/// Parse `working_dir/.gitmodules` and resolve every submodule it names. A submodule with no
/// non-empty `path`, or whose checkout or git directory can't be located, is silently skipped -
/// it contributes no source files either way.
pub(crate) fn enumerate(working_dir: &Path) -> Result<Vec<Submodule>, Error> {
    let gitmodules_path = working_dir.join(".gitmodules");
    let bytes = match std::fs::read(&gitmodules_path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(gitmeta_discover::Error::Io { path: gitmodules_path, source }.into()),
    };
    let entries = gitmeta_config::parse::parse(&bytes).map_err(|e| gitmeta_config::Error::InvalidData {
        path: gitmodules_path.clone(),
        line: e.line,
        message: e.message,
    })?;

    let mut file = gitmeta_config::File::new();
    for entry in entries {
        let key = gitmeta_config::VariableKey::with_subsection(entry.section, entry.subsection, entry.name);
        file.push(key, entry.value, gitmeta_config::Source::Local);
    }

    let mut submodules = Vec::new();
    for subsection in file.subsections_of(b"submodule") {
        if let Some(submodule) = resolve_one(&file, subsection, working_dir) {
            submodules.push(submodule);
        }
    }
    Ok(submodules)
}

fn resolve_one(file: &gitmeta_config::File, subsection: &bstr::BStr, working_dir: &Path) -> Option<Submodule> {
    let name = subsection.to_str_lossy().into_owned();

    let path_key = gitmeta_config::VariableKey::with_subsection("submodule", subsection.to_owned(), "path");
    let relative_path_posix = match file.get(&path_key) {
        Some(value) if !value.is_empty() => value.to_owned(),
        _ => {
            gitmeta_trace::warn!("submodule {:?} has no non-empty path, skipping", name);
            return None;
        }
    };

    let url_key = gitmeta_config::VariableKey::with_subsection("submodule", subsection.to_owned(), "url");
    let url = file.get(&url_key).map(|v| v.to_str_lossy().into_owned());

    let relative_native = gitmeta_path::from_bstr(relative_path_posix.as_bstr());
    let joined = working_dir.join(relative_native.as_ref());
    let full_path_native = match gitmeta_path::realpath(&joined) {
        Ok(path) => path,
        Err(_) => {
            gitmeta_trace::warn!("submodule {:?} has no checked-out working copy at {}", name, joined.display());
            return None;
        }
    };

    let head_commit = match resolve_head(&full_path_native) {
        Ok(head) => head,
        Err(_) => {
            gitmeta_trace::warn!("submodule {:?} has no locatable git directory", name);
            return None;
        }
    };

    Some(Submodule { name, relative_path_posix, full_path_native, url, head_commit })
}

fn resolve_head(full_path: &Path) -> Result<Option<ObjectId>, Error> {
    let location = gitmeta_discover::open_from_parent(full_path)?;
    let env = gitmeta_config::Environment::capture();
    let config = gitmeta_config::load(&location.common_dir, &location.git_dir, &env)?;
    gitmeta_discover::format_gate::check(&config, &location.common_dir)?;

    let hash_format = hash_format_of(&config)?;
    let storage_format = storage_format_of(&config)?;
    let resolver = gitmeta_ref::RefResolver::for_repository(&location.common_dir, &location.git_dir, storage_format, hash_format)?;
    Ok(resolver.head()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_repo(dir: &Path) {
        std::fs::create_dir_all(dir.join(".git").join("refs").join("heads")).unwrap();
        std::fs::write(dir.join(".git").join("HEAD"), "ref: refs/heads/main\n").unwrap();
        std::fs::write(dir.join(".git").join("refs").join("heads").join("main"), format!("{}\n", "c".repeat(40))).unwrap();
    }

    #[test]
    fn missing_gitmodules_yields_no_submodules() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(enumerate(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn a_checked_out_submodule_resolves_its_head() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(".gitmodules"),
            "[submodule \"lib\"]\n\tpath = vendor/lib\n\turl = https://example.invalid/lib.git\n",
        )
        .unwrap();
        let lib_dir = tmp.path().join("vendor").join("lib");
        std::fs::create_dir_all(&lib_dir).unwrap();
        init_repo(&lib_dir);

        let submodules = enumerate(tmp.path()).unwrap();
        assert_eq!(submodules.len(), 1);
        assert_eq!(submodules[0].name, "lib");
        assert_eq!(submodules[0].url.as_deref(), Some("https://example.invalid/lib.git"));
        assert_eq!(submodules[0].head_commit.as_ref().unwrap().to_hex(), "c".repeat(40));
    }

    #[test]
    fn a_submodule_with_no_path_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(".gitmodules"), "[submodule \"lib\"]\n\turl = https://example.invalid/lib.git\n").unwrap();
        assert!(enumerate(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn an_uninitialized_submodule_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(".gitmodules"), "[submodule \"lib\"]\n\tpath = vendor/lib\n").unwrap();
        assert!(enumerate(tmp.path()).unwrap().is_empty());
    }
}

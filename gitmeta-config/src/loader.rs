//! The hierarchical loader: walks the five config tiers in priority order, expanding
//! `include.path` and `includeIf.<condition>.path` directives as it encounters them.
use std::path::{Path, PathBuf};

use bstr::{BStr, ByteSlice};

use crate::environment::Environment;
use crate::file::{File, Source};
use crate::key::VariableKey;
use crate::parse;

const MAX_INCLUDE_DEPTH: usize = 10;

/// Everything that can go wrong while locating, reading, or parsing the config chain.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("an I/O error occurred while reading {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: {message}")]
    InvalidData { path: PathBuf, line: usize, message: String },
    #[error("{0}")]
    NotSupported(String),
    #[error("include recursion exceeded {} levels while including {path}", MAX_INCLUDE_DEPTH)]
    RecursionExceeded { path: PathBuf },
}

/// Load the full hierarchical config for a repository whose common directory is `common_dir`
/// and whose git directory (used to evaluate `includeIf gitdir:` conditions) is `git_dir`.
///
/// Tiers are read in the fixed priority order PROGRAMDATA, system, XDG, global, local; each
/// later tier's values shadow earlier ones for [`File::get`] while remaining visible through
/// [`File::get_all`]. A tier whose file does not exist is skipped silently.
pub fn load(common_dir: &Path, git_dir: &Path, env: &Environment) -> Result<File, Error> {
    let span = gitmeta_trace::coarse!("config::load");
    span.in_scope(|| load_inner(common_dir, git_dir, env))
}

fn load_inner(common_dir: &Path, git_dir: &Path, env: &Environment) -> Result<File, Error> {
    let mut file = File::new();
    let git_dir_pattern = gitmeta_path::with_trailing_slash(git_dir.to_owned());
    let git_dir_pattern = gitmeta_path::into_bstr(&git_dir_pattern).into_owned();

    if let Some(programdata) = &env.programdata {
        load_file(&programdata.join("git").join("config"), Source::ProgramData, env, &git_dir_pattern, 0, &mut file)?;
    }
    load_file(&system_config_path(env), Source::System, env, &git_dir_pattern, 0, &mut file)?;
    if let Some(xdg_dir) = env.xdg_config_git_dir() {
        load_file(&xdg_dir.join("config"), Source::Xdg, env, &git_dir_pattern, 0, &mut file)?;
    }
    if let Some(home) = &env.home {
        load_file(&home.join(".gitconfig"), Source::Global, env, &git_dir_pattern, 0, &mut file)?;
    }
    load_file(&common_dir.join("config"), Source::Local, env, &git_dir_pattern, 0, &mut file)?;
    Ok(file)
}

/// The directory holding `gitconfig` for the system tier: normally `/etc`, but on the rare
/// setup where a `mingw64/etc` sibling exists alongside it (an MSYS2 / Git-for-Windows
/// layout), that sibling takes over.
fn system_config_path(_env: &Environment) -> PathBuf {
    let etc = system_etc_dir();
    let mingw_override = etc.join("..").join("mingw64").join("etc");
    let dir = if mingw_override.is_dir() { mingw_override } else { etc };
    dir.join("gitconfig")
}

#[cfg(unix)]
fn system_etc_dir() -> PathBuf {
    PathBuf::from("/etc")
}

#[cfg(windows)]
fn system_etc_dir() -> PathBuf {
    PathBuf::from("C:\\ProgramData\\Git")
}

fn load_file(
    path: &Path,
    source: Source,
    env: &Environment,
    git_dir_pattern: &BStr,
    depth: usize,
    file: &mut File,
) -> Result<(), Error> {
    let span = gitmeta_trace::detail!("config::load_file", path = %path.display(), depth);
    span.in_scope(|| load_file_inner(path, source, env, git_dir_pattern, depth, file))
}

fn load_file_inner(
    path: &Path,
    source: Source,
    env: &Environment,
    git_dir_pattern: &BStr,
    depth: usize,
    file: &mut File,
) -> Result<(), Error> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(Error::RecursionExceeded { path: path.to_owned() });
    }
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            gitmeta_trace::warn!("config tier {:?} has no file at {}", source, path.display());
            return Ok(());
        }
        Err(e) => return Err(Error::Io { path: path.to_owned(), source: e }),
    };
    let bytes = strip_bom(&bytes);
    let entries = parse::parse(bytes).map_err(|e| Error::InvalidData {
        path: path.to_owned(),
        line: e.line,
        message: e.message,
    })?;

    let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
    for entry in entries {
        let is_include = entry.section.as_slice() == b"include" && entry.subsection.is_empty() && entry.name.as_slice() == b"path";
        let is_include_if =
            entry.section.as_slice() == b"includeif" && !entry.subsection.is_empty() && entry.name.as_slice() == b"path";

        if is_include {
            let included = expand_include_path(entry.value.as_ref(), config_dir, env)?;
            load_file(&included, Source::Include(included.clone()), env, git_dir_pattern, depth + 1, file)?;
        } else if is_include_if {
            if includeif_matches(entry.subsection.as_ref(), config_dir, git_dir_pattern, env)? {
                let included = expand_include_path(entry.value.as_ref(), config_dir, env)?;
                load_file(&included, Source::Include(included.clone()), env, git_dir_pattern, depth + 1, file)?;
            }
        } else {
            let key = VariableKey::with_subsection(entry.section, entry.subsection, entry.name);
            file.push(key, entry.value, source.clone());
        }
    }
    Ok(())
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    match unicode_bom::Bom::from(bytes) {
        unicode_bom::Bom::Null => bytes,
        bom => &bytes[bom.len()..],
    }
}

fn expand_include_path(raw: &BStr, config_dir: &Path, env: &Environment) -> Result<PathBuf, Error> {
    if let Some(rest) = raw.strip_prefix(b"~/") {
        let home = env
            .home
            .clone()
            .ok_or_else(|| Error::NotSupported("HOME must be set to expand a '~/' include path".into()))?;
        join_native(&home, rest.as_ref())
    } else if let Some(rest) = raw.strip_prefix(b"./") {
        join_native(config_dir, rest.as_ref())
    } else {
        join_native(config_dir, raw)
    }
}

fn join_native(base: &Path, rel: &BStr) -> Result<PathBuf, Error> {
    let native = gitmeta_path::from_bstr(rel);
    gitmeta_path::normalize(native.into_owned(), base)
        .ok_or_else(|| Error::NotSupported(format!("include path escapes the filesystem root: {}", rel)))
}

fn expand_includeif_pattern(raw: &BStr, config_dir: &Path, env: &Environment) -> Result<bstr::BString, Error> {
    let mut pattern: bstr::BString = if let Some(rest) = raw.strip_prefix(b"~/") {
        let home = env
            .home
            .clone()
            .ok_or_else(|| Error::NotSupported("HOME must be set to expand a '~/' includeIf pattern".into()))?;
        gitmeta_path::into_bstr(join_native(&home, rest.as_ref())?).into_owned()
    } else if let Some(rest) = raw.strip_prefix(b"./") {
        gitmeta_path::into_bstr(join_native(config_dir, rest.as_ref())?).into_owned()
    } else if raw.first() == Some(&b'/') {
        raw.to_owned()
    } else {
        let mut s = bstr::BString::from("**/");
        s.extend_from_slice(raw);
        s
    };
    if pattern.last() == Some(&b'/') {
        pattern.extend_from_slice(b"**");
    }
    Ok(pattern)
}

fn includeif_matches(subsection: &BStr, config_dir: &Path, git_dir_pattern: &BStr, env: &Environment) -> Result<bool, Error> {
    let (ignore_case, raw_pattern) = if let Some(rest) = subsection.strip_prefix(b"gitdir/i:") {
        (true, rest)
    } else if let Some(rest) = subsection.strip_prefix(b"gitdir:") {
        (false, rest)
    } else {
        return Ok(false);
    };
    let pattern = expand_includeif_pattern(raw_pattern.as_ref(), config_dir, env)?;
    let options = gitmeta_glob::Options::default()
        .wildcard_crosses_separator(true)
        .ignore_case(ignore_case);
    Ok(gitmeta_glob::matches(pattern.as_slice(), git_dir_pattern.as_ref(), options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::File::create(&path).unwrap().write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn local_tier_overrides_global_tier() {
        let tmp = tempfile::tempdir().unwrap();
        let home = tmp.path().join("home");
        std::fs::create_dir_all(&home).unwrap();
        write(&home, ".gitconfig", "[core]\n\tbare = false\n");
        let common_dir = tmp.path().join("repo").join(".git");
        std::fs::create_dir_all(&common_dir).unwrap();
        write(&common_dir, "config", "[core]\n\tbare = true\n");

        let env = Environment {
            home: Some(home),
            xdg_config_home: None,
            programdata: None,
            path: None,
        };
        let config = load(&common_dir, &common_dir, &env).unwrap();
        let key = VariableKey::new("core", "bare");
        assert_eq!(config.get(&key).unwrap(), "true");
        assert_eq!(config.get_all(&key).collect::<Vec<_>>(), vec!["false", "true"]);
    }

    #[test]
    fn plain_include_pulls_in_values_from_the_included_file() {
        let tmp = tempfile::tempdir().unwrap();
        let common_dir = tmp.path().join(".git");
        std::fs::create_dir_all(&common_dir).unwrap();
        write(tmp.path(), "extra.config", "[user]\n\tname = Included\n");
        write(&common_dir, "config", "[include]\n\tpath = ../extra.config\n");

        let env = Environment::default();
        let config = load(&common_dir, &common_dir, &env).unwrap();
        assert_eq!(config.get(&VariableKey::new("user", "name")).unwrap(), "Included");
    }

    #[test]
    fn include_missing_path_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let common_dir = tmp.path().join(".git");
        std::fs::create_dir_all(&common_dir).unwrap();
        write(&common_dir, "config", "[include]\n\tpath = /does/not/exist.config\n");

        let env = Environment::default();
        assert!(load(&common_dir, &common_dir, &env).is_ok());
    }

    #[test]
    fn includeif_gitdir_matches_repository_location() {
        let tmp = tempfile::tempdir().unwrap();
        let common_dir = tmp.path().join("work").join(".git");
        std::fs::create_dir_all(&common_dir).unwrap();
        write(tmp.path(), "work.config", "[user]\n\tname = Work\n");
        write(
            &common_dir,
            "config",
            "[includeIf \"gitdir:**/work/**\"]\n\tpath = ../../work.config\n",
        );

        let env = Environment::default();
        let config = load(&common_dir, &common_dir, &env).unwrap();
        assert_eq!(config.get(&VariableKey::new("user", "name")).unwrap(), "Work");
    }

    #[test]
    fn includeif_gitdir_case_insensitive_variant_ignores_case() {
        let tmp = tempfile::tempdir().unwrap();
        let common_dir = tmp.path().join("WORK").join(".git");
        std::fs::create_dir_all(&common_dir).unwrap();
        write(tmp.path(), "work.config", "[user]\n\tname = Work\n");
        write(
            &common_dir,
            "config",
            "[includeIf \"gitdir/i:**/work/**\"]\n\tpath = ../../work.config\n",
        );

        let env = Environment::default();
        let config = load(&common_dir, &common_dir, &env).unwrap();
        assert_eq!(config.get(&VariableKey::new("user", "name")).unwrap(), "Work");
    }
}

//! Locates a git repository by walking up from a starting path, the way `git rev-parse
//! --git-dir` does: look for a `.git` directory, a `.git` file redirecting elsewhere, or a
//! directory that is itself a git directory (a bare repository).
#![deny(rust_2018_idioms)]

pub mod error;
pub mod format_gate;

use std::path::{Path, PathBuf};

pub use error::Error;

/// The result of locating a repository: where its git directory and (if any) working
/// directory live, plus the directory its refs and objects are actually stored in.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Location {
    pub git_dir: PathBuf,
    pub common_dir: PathBuf,
    pub working_dir: Option<PathBuf>,
}

/// Walk from `canonicalize(start)` toward the filesystem root looking for a repository.
pub fn locate(start: &Path) -> Result<Location, Error> {
    let start = gitmeta_path::realpath(start).map_err(|source| Error::Io { path: start.to_owned(), source })?;

    let mut current = start.clone();
    loop {
        let dot_git = current.join(".git");

        if dot_git.is_dir() {
            return finish(dot_git, Some(current));
        }

        if dot_git.is_file() {
            let target = read_gitdir_file(&dot_git)?;
            let target = if target.is_absolute() { target } else { current.join(&target) };
            let git_dir = gitmeta_path::realpath(&target).map_err(|source| Error::Io { path: target.clone(), source })?;
            return finish(git_dir, Some(current));
        }

        if is_git_dir(&current) {
            return finish(current, None);
        }

        match current.parent() {
            Some(parent) => current = parent.to_owned(),
            None => return Err(Error::NotFound(start)),
        }
    }
}

/// Open a known git directory directly, without walking.
pub fn open(git_dir: &Path) -> Result<Location, Error> {
    let git_dir = gitmeta_path::realpath(git_dir).map_err(|source| Error::Io { path: git_dir.to_owned(), source })?;
    if !is_git_dir(&git_dir) {
        return Err(Error::InvalidFormat { path: git_dir, message: "missing HEAD".into() });
    }
    let working_dir = git_dir.parent().filter(|parent| parent.join(".git") == git_dir).map(Path::to_owned);
    finish(git_dir, working_dir)
}

/// Open the git directory belonging to `work_tree` directly, the way a submodule is opened:
/// look at `work_tree/.git` only, never walking past it toward the filesystem root.
pub fn open_from_parent(work_tree: &Path) -> Result<Location, Error> {
    let dot_git = work_tree.join(".git");
    if dot_git.is_dir() {
        return finish(dot_git, Some(work_tree.to_owned()));
    }
    if dot_git.is_file() {
        let target = read_gitdir_file(&dot_git)?;
        let target = if target.is_absolute() { target } else { work_tree.join(&target) };
        let git_dir = gitmeta_path::realpath(&target).map_err(|source| Error::Io { path: target.clone(), source })?;
        return finish(git_dir, Some(work_tree.to_owned()));
    }
    Err(Error::NotFound(work_tree.to_owned()))
}

fn finish(git_dir: PathBuf, working_dir: Option<PathBuf>) -> Result<Location, Error> {
    let common_dir = resolve_common_dir(&git_dir)?;
    Ok(Location { git_dir, common_dir, working_dir })
}

/// A directory is a valid git directory iff it contains `HEAD`.
fn is_git_dir(dir: &Path) -> bool {
    dir.join("HEAD").is_file()
}

fn read_gitdir_file(path: &Path) -> Result<PathBuf, Error> {
    let contents = std::fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_owned(), source })?;
    let line = contents.lines().next().unwrap_or("");
    match line.strip_prefix("gitdir: ") {
        Some(rest) => Ok(PathBuf::from(rest.trim_end())),
        None => Err(Error::InvalidFormat { path: path.to_owned(), message: "expected a line starting with \"gitdir: \"".into() }),
    }
}

fn resolve_common_dir(git_dir: &Path) -> Result<PathBuf, Error> {
    let commondir_file = git_dir.join("commondir");
    let common_dir = match std::fs::read_to_string(&commondir_file) {
        Ok(contents) => {
            let relative = PathBuf::from(contents.trim());
            let joined = if relative.is_absolute() { relative } else { git_dir.join(relative) };
            gitmeta_path::realpath(&joined).map_err(|source| Error::Io { path: joined, source })?
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => git_dir.to_owned(),
        Err(source) => return Err(Error::Io { path: commondir_file, source }),
    };
    if !common_dir.is_dir() {
        return Err(Error::InvalidFormat { path: common_dir, message: "resolved common directory does not exist".into() });
    }
    Ok(common_dir)
}

/// Apply a `core.worktree` override to an already-located repository: resolve it relative to
/// `git_dir` and replace `working_dir`.
pub fn apply_worktree_override(location: &mut Location, worktree: &[u8]) -> Result<(), Error> {
    let text = std::str::from_utf8(worktree)
        .map_err(|_| Error::InvalidPath { path: location.git_dir.clone(), message: "core.worktree is not valid UTF-8".into() })?;
    let candidate = PathBuf::from(text);
    let joined = if candidate.is_absolute() { candidate } else { location.git_dir.join(candidate) };
    let resolved = gitmeta_path::normalize(joined, &location.git_dir)
        .ok_or_else(|| Error::InvalidPath { path: location.git_dir.clone(), message: "core.worktree escapes the filesystem root".into() })?;
    location.working_dir = Some(resolved);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn init_repo(dir: &Path) {
        fs::create_dir_all(dir.join(".git")).unwrap();
        fs::write(dir.join(".git").join("HEAD"), "ref: refs/heads/main\n").unwrap();
    }

    #[test]
    fn finds_a_dot_git_directory_from_a_nested_subdirectory() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());
        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let location = locate(&nested).unwrap();
        assert_eq!(location.git_dir, gitmeta_path::realpath(tmp.path().join(".git")).unwrap());
        assert_eq!(location.working_dir, Some(gitmeta_path::realpath(tmp.path()).unwrap()));
    }

    #[test]
    fn follows_a_gitdir_redirect_file() {
        let tmp = tempfile::tempdir().unwrap();
        let real_git_dir = tmp.path().join("real-git-dir");
        fs::create_dir_all(&real_git_dir).unwrap();
        fs::write(real_git_dir.join("HEAD"), "ref: refs/heads/main\n").unwrap();

        let worktree = tmp.path().join("worktree");
        fs::create_dir_all(&worktree).unwrap();
        fs::write(worktree.join(".git"), format!("gitdir: {}\n", real_git_dir.display())).unwrap();

        let location = locate(&worktree).unwrap();
        assert_eq!(location.git_dir, gitmeta_path::realpath(&real_git_dir).unwrap());
    }

    #[test]
    fn recognizes_a_bare_repository() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("HEAD"), "ref: refs/heads/main\n").unwrap();

        let location = locate(tmp.path()).unwrap();
        assert!(location.working_dir.is_none());
    }

    #[test]
    fn resolves_common_dir_via_commondir_file() {
        let tmp = tempfile::tempdir().unwrap();
        let main_git_dir = tmp.path().join("main.git");
        fs::create_dir_all(&main_git_dir).unwrap();
        fs::write(main_git_dir.join("HEAD"), "ref: refs/heads/main\n").unwrap();

        let linked_git_dir = tmp.path().join("linked.git");
        fs::create_dir_all(&linked_git_dir).unwrap();
        fs::write(linked_git_dir.join("HEAD"), "ref: refs/heads/feature\n").unwrap();
        fs::write(linked_git_dir.join("commondir"), format!("{}\n", main_git_dir.display())).unwrap();

        let location = open(&linked_git_dir).unwrap();
        assert_eq!(location.common_dir, gitmeta_path::realpath(&main_git_dir).unwrap());
    }

    #[test]
    fn a_nonexistent_starting_path_fails_to_canonicalize() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(locate(&tmp.path().join("nothing-here")), Err(Error::Io { .. })));
    }

    #[test]
    fn open_from_parent_follows_a_redirect_without_walking_past_it() {
        let tmp = tempfile::tempdir().unwrap();
        let modules_dir = tmp.path().join("modules").join("lib");
        fs::create_dir_all(&modules_dir).unwrap();
        fs::write(modules_dir.join("HEAD"), "ref: refs/heads/main\n").unwrap();

        let work_tree = tmp.path().join("lib");
        fs::create_dir_all(&work_tree).unwrap();
        fs::write(work_tree.join(".git"), format!("gitdir: {}\n", modules_dir.display())).unwrap();

        let location = open_from_parent(&work_tree).unwrap();
        assert_eq!(location.git_dir, gitmeta_path::realpath(&modules_dir).unwrap());
    }

    #[test]
    fn open_from_parent_reports_not_found_when_no_dot_git_is_present() {
        let tmp = tempfile::tempdir().unwrap();
        let work_tree = tmp.path().join("plain-dir");
        fs::create_dir_all(&work_tree).unwrap();
        assert!(matches!(open_from_parent(&work_tree), Err(Error::NotFound(_))));
    }
}

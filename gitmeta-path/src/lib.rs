//! Conversions between native, OS-specific paths and the posix-slash byte strings that
//! `git` uses internally for configuration keys, ref names, and ignore patterns.
//!
//! Nothing here touches the filesystem except [`realpath()`], which is the one place the
//! rest of the workspace asks the OS to resolve symlinks and relative components.
#![deny(rust_2018_idioms)]

use std::{
    borrow::Cow,
    path::{Component, Path, PathBuf},
};

use bstr::{BStr, BString, ByteSlice};

/// The error produced when a path cannot be represented as valid UTF-8 but was required to be.
#[derive(Debug, thiserror::Error)]
#[error("Could not convert path to UTF-8: {}", .path)]
pub struct Utf8Error {
    /// A display-safe, lossy rendering of the offending path.
    pub path: String,
}

/// Convert `path` to a `/`-separated byte string, leaving the bytes themselves untouched
/// on platforms where the native separator already is `/`.
pub fn into_bstr(path: impl AsRef<Path>) -> Cow<'static, BStr> {
    let bytes = to_os_bytes(path.as_ref());
    Cow::Owned(to_slash(bytes.as_ref()).to_owned())
}

/// As [`into_bstr()`], but fails if `path` isn't valid UTF-8.
pub fn try_into_bstr(path: impl AsRef<Path>) -> Result<Cow<'static, BStr>, Utf8Error> {
    let path = path.as_ref();
    path.to_str().ok_or_else(|| Utf8Error {
        path: path.to_string_lossy().into_owned(),
    })?;
    Ok(into_bstr(path))
}

/// Convert a `/`-separated byte string into a native [`PathBuf`], translating `/` into
/// `std::path::MAIN_SEPARATOR` where the two differ.
pub fn from_bstr(path: impl AsRef<BStr>) -> Cow<'static, Path> {
    let path = path.as_ref();
    #[cfg(windows)]
    {
        let native = path.replace(b"/", b"\\");
        Cow::Owned(PathBuf::from(native.to_str_lossy().into_owned()))
    }
    #[cfg(not(windows))]
    {
        Cow::Owned(Path::new(path.to_str_lossy().as_ref()).to_owned())
    }
}

/// Like [`from_bstr()`], but fails if `path` isn't valid UTF-8.
pub fn try_from_bstr(path: impl AsRef<BStr>) -> Result<Cow<'static, Path>, Utf8Error> {
    let path = path.as_ref();
    path.to_str().map_err(|_| Utf8Error {
        path: path.to_str_lossy().into_owned(),
    })?;
    Ok(from_bstr(path))
}

fn to_os_bytes(path: &Path) -> Cow<'_, [u8]> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        Cow::Borrowed(path.as_os_str().as_bytes())
    }
    #[cfg(not(unix))]
    {
        Cow::Owned(path.to_string_lossy().into_owned().into_bytes())
    }
}

/// Replace backslashes with forward slashes; used to turn native Windows paths into the
/// posix form git uses for comparisons against `gitdir:` patterns and ignore rules.
pub fn to_slash(path: &[u8]) -> BString {
    if path.contains(&b'\\') {
        path.iter()
            .map(|&b| if b == b'\\' { b'/' } else { b })
            .collect::<Vec<u8>>()
            .into()
    } else {
        path.to_vec().into()
    }
}

/// Returns true if `path` has a trailing `/` (or `\` on Windows).
pub fn has_trailing_slash(path: &Path) -> bool {
    let s = path.as_os_str();
    let bytes = to_os_bytes(Path::new(s));
    bytes.last() == Some(&b'/') || bytes.last() == Some(&b'\\')
}

/// Append a trailing separator to `path` if it doesn't already have one.
pub fn with_trailing_slash(mut path: PathBuf) -> PathBuf {
    if !has_trailing_slash(&path) {
        let mut s = path.into_os_string();
        s.push(std::path::MAIN_SEPARATOR.to_string());
        path = PathBuf::from(s);
    }
    path
}

/// Remove a single trailing separator from `path`, if present.
pub fn strip_trailing_slash(path: &Path) -> Cow<'_, Path> {
    let s = path.as_os_str().to_string_lossy();
    if s.ends_with('/') || s.ends_with('\\') {
        Cow::Owned(PathBuf::from(s[..s.len() - 1].to_string()))
    } else {
        Cow::Borrowed(path)
    }
}

/// True if `path` is absolute in the platform-native sense.
pub fn is_absolute(path: &Path) -> bool {
    path.is_absolute()
}

/// Resolve `path` to an absolute, symlink-free form by consulting the filesystem.
///
/// This is the only function in this crate that performs I/O; every other conversion is
/// pure byte manipulation.
pub fn realpath(path: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    std::fs::canonicalize(path.as_ref())
}

/// Lexically normalize `path`: resolve `.` and `..` components and, if `path` is relative,
/// join it onto `cwd` first. Returns `None` if a `..` would escape past the root.
///
/// Unlike [`realpath()`] this never touches the filesystem and never resolves symlinks,
/// which is required when normalizing paths that may not exist yet (config include paths,
/// `core.worktree` values before the target is known to exist).
pub fn normalize(path: PathBuf, cwd: &Path) -> Option<PathBuf> {
    let joined = if path.is_absolute() { path } else { cwd.join(path) };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) | Component::Normal(_) => out.push(component),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_slash_converts_backslashes() {
        assert_eq!(to_slash(b"a\\b\\c"), BString::from("a/b/c"));
        assert_eq!(to_slash(b"a/b"), BString::from("a/b"));
    }

    #[test]
    fn normalize_resolves_dot_dot() {
        let cwd = Path::new("/tmp/work");
        assert_eq!(
            normalize(PathBuf::from("a/../b"), cwd),
            Some(PathBuf::from("/tmp/work/b"))
        );
        assert_eq!(normalize(PathBuf::from("./a"), cwd), Some(PathBuf::from("/tmp/work/a")));
        assert_eq!(normalize(PathBuf::from("/abs/../x"), cwd), Some(PathBuf::from("/x")));
    }

    #[test]
    fn normalize_rejects_escaping_dot_dot() {
        assert_eq!(normalize(PathBuf::from("../../x"), Path::new("/")), None);
    }

    #[test]
    fn trailing_slash_helpers_roundtrip() {
        let p = with_trailing_slash(PathBuf::from("/a/b"));
        assert!(has_trailing_slash(&p));
    }
}

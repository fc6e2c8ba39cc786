///
pub mod name {
    use quick_error::quick_error;

    quick_error! {
        /// The error returned by [`super::name()`].
        #[allow(missing_docs)]
        #[derive(Debug)]
        pub enum Error {
            Empty {
                display("Tag names must not be empty")
            }
            StartsWithDot {
                display("A ref or component of it must not start with a '.'")
            }
            EndsWithDot {
                display("A ref must not end with a '.'")
            }
            DoubleDot {
                display("A ref must not contain '..' as it may be mistaken for a range")
            }
            Control(byte: u8) {
                display("A ref must not contain ASCII control characters or spaces, found byte {}", byte)
            }
            Pattern(byte: char) {
                display("A ref must not contain '{}'", byte)
            }
            EndsWithLock {
                display("A ref must not end with '.lock' as that suffix is reserved for lockfiles")
            }
            AtOpenBrace {
                display("A ref must not contain the sequence '@{{'")
            }
            OnlyAt {
                display("A ref must not be the single character '@'")
            }
            Backslash {
                display("A ref must not contain a backslash '\\'")
            }
        }
    }
}

use bstr::BStr;

const FORBIDDEN_PATTERN_BYTES: &[u8] = b"~^:?*[";

/// Validate that `path` follows the rules `git check-ref-format` applies to tag and component
/// names: no empty or dot-leading/trailing components, no doubled dots, no control characters,
/// none of `~^:?*[`, no component ending in `.lock`, no `@{`, not the bare string `@`, and no
/// backslash.
pub fn name(path: &BStr) -> Result<&BStr, name::Error> {
    if path.is_empty() {
        return Err(name::Error::Empty);
    }
    if path.as_ref() == b"@" {
        return Err(name::Error::OnlyAt);
    }
    if path.windows(2).any(|w| w == b"@{") {
        return Err(name::Error::AtOpenBrace);
    }
    if path.contains(&b'\\') {
        return Err(name::Error::Backslash);
    }
    if path.windows(2).any(|w| w == b"..") {
        return Err(name::Error::DoubleDot);
    }
    for &byte in path.iter() {
        if byte < 0x20 || byte == 0x7f || byte == b' ' {
            return Err(name::Error::Control(byte));
        }
        if FORBIDDEN_PATTERN_BYTES.contains(&byte) {
            return Err(name::Error::Pattern(byte as char));
        }
    }
    for component in path.split(|&b| b == b'/') {
        if component.first() == Some(&b'.') {
            return Err(name::Error::StartsWithDot);
        }
        if component.ends_with(b".lock") {
            return Err(name::Error::EndsWithLock);
        }
    }
    if path.ends_with(b".") {
        return Err(name::Error::EndsWithDot);
    }
    Ok(path)
}

use bitflags::bitflags;
use bstr::BString;

bitflags! {
    /// Flags a single `.gitignore` line carries once parsed.
    #[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
    #[derive(Default)]
    pub struct Flags: u8 {
        /// A leading `!` — a match un-ignores rather than ignores.
        const NEGATIVE = 1 << 0;
        /// A trailing `/` — only applies when the candidate is a directory.
        const DIRECTORY_ONLY = 1 << 1;
        /// An internal `/` — matched against the path relative to the group's directory
        /// rather than against the bare basename.
        const ANCHORED = 1 << 2;
    }
}

/// A single parsed `.gitignore` line: the glob to match plus its flags.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Pattern {
    pub glob: BString,
    pub flags: Flags,
}

/// Parse one line of a `.gitignore` file, returning `None` for blank lines, comments, and
/// lines that reduce to an empty pattern after flag stripping.
pub fn parse(line: &[u8]) -> Option<Pattern> {
    let line = strip_trailing_cr(line);
    if line.is_empty() || line[0] == b'#' {
        return None;
    }
    let line = trim_trailing_unescaped_spaces(line);
    if line.is_empty() {
        return None;
    }

    let mut flags = Flags::empty();
    let mut bytes = line;
    if bytes[0] == b'!' {
        flags |= Flags::NEGATIVE;
        bytes = &bytes[1..];
    }
    if bytes.is_empty() {
        return None;
    }

    let mut bytes = bytes.to_vec();
    if bytes.last() == Some(&b'/') {
        flags |= Flags::DIRECTORY_ONLY;
        bytes.pop();
    }
    if bytes.is_empty() {
        return None;
    }

    if bytes.len() > 1 && bytes[..bytes.len() - 1].contains(&b'/') {
        flags |= Flags::ANCHORED;
    }
    if bytes.first() == Some(&b'/') {
        bytes.remove(0);
    }
    if bytes.is_empty() {
        return None;
    }

    let glob = unescape(&bytes);
    if glob.is_empty() {
        return None;
    }
    Some(Pattern { glob: glob.into(), flags })
}

fn strip_trailing_cr(line: &[u8]) -> &[u8] {
    if line.last() == Some(&b'\r') {
        &line[..line.len() - 1]
    } else {
        line
    }
}

fn trim_trailing_unescaped_spaces(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && line[end - 1] == b' ' {
        let mut backslashes = 0;
        let mut i = end - 1;
        while i > 0 && line[i - 1] == b'\\' {
            backslashes += 1;
            i -= 1;
        }
        if backslashes % 2 == 1 {
            break;
        }
        end -= 1;
    }
    &line[..end]
}

fn unescape(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            out.push(bytes[i + 1]);
            i += 2;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_and_blank_lines_are_skipped() {
        assert!(parse(b"# comment").is_none());
        assert!(parse(b"").is_none());
        assert!(parse(b"   ").is_none());
    }

    #[test]
    fn leading_bang_sets_negative_and_is_consumed() {
        let p = parse(b"!build").unwrap();
        assert!(p.flags.contains(Flags::NEGATIVE));
        assert_eq!(p.glob, BString::from("build"));
    }

    #[test]
    fn trailing_slash_sets_directory_only_and_is_consumed() {
        let p = parse(b"build/").unwrap();
        assert!(p.flags.contains(Flags::DIRECTORY_ONLY));
        assert_eq!(p.glob, BString::from("build"));
    }

    #[test]
    fn internal_slash_sets_anchored_and_strips_one_leading_slash() {
        let p = parse(b"/src/generated").unwrap();
        assert!(p.flags.contains(Flags::ANCHORED));
        assert_eq!(p.glob, BString::from("src/generated"));
    }

    #[test]
    fn bare_basename_pattern_is_not_anchored() {
        let p = parse(b"*.o").unwrap();
        assert!(!p.flags.contains(Flags::ANCHORED));
    }

    #[test]
    fn trailing_unescaped_space_is_trimmed_but_escaped_space_survives() {
        let p = parse(b"foo ").unwrap();
        assert_eq!(p.glob, BString::from("foo"));
        let p = parse(b"foo\\ ").unwrap();
        assert_eq!(p.glob, BString::from("foo "));
    }

    #[test]
    fn trailing_lone_backslash_is_literal() {
        let p = parse(b"foo\\").unwrap();
        assert_eq!(p.glob, BString::from("foo\\"));
    }
}

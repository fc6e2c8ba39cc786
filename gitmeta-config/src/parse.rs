//! The byte-level tokenizer for git's config file grammar: section headers, subsections,
//! variable names and values, comments, and line-continuation.
use std::fmt;

use bstr::BString;

/// A single `name = value` occurrence, attributed to the section/subsection active when it
/// was read and the 1-based source line it started on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawEntry {
    pub section: BString,
    pub subsection: BString,
    pub name: BString,
    pub value: BString,
    pub line: usize,
}

/// A syntax error raised while tokenizing a single config file.
#[derive(Debug)]
pub struct Error {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for Error {}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Scanner { bytes, pos: 0, line: 1 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        } else if b == b'\r' && self.peek() != Some(b'\n') {
            self.line += 1;
        }
        Some(b)
    }

    fn fatal(&self, message: impl Into<String>) -> Error {
        Error { line: self.line, message: message.into() }
    }
}

fn is_hspace(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Parse a whole config file into its flat sequence of variable occurrences.
///
/// Section context (`[section "sub"]` / `[section.sub]`) is tracked across the file and
/// stamped onto every entry that follows, exactly as git reads it: there is no nesting, just
/// a "currently active" section that switches at each header line.
pub fn parse(input: &[u8]) -> Result<Vec<RawEntry>, Error> {
    let mut scanner = Scanner::new(input);
    let mut entries = Vec::new();
    let mut section = BString::from("");
    let mut subsection = BString::from("");

    loop {
        while matches!(scanner.peek(), Some(b) if b.is_ascii_whitespace()) {
            scanner.bump();
        }
        match scanner.peek() {
            None => break,
            Some(b';') | Some(b'#') => {
                while !matches!(scanner.peek(), None | Some(b'\n')) {
                    scanner.bump();
                }
            }
            Some(b'[') => {
                scanner.bump();
                let (s, sub) = parse_section(&mut scanner)?;
                section = s;
                subsection = sub;
            }
            Some(_) => {
                let line = scanner.line;
                let (name, value) = parse_variable(&mut scanner)?;
                entries.push(RawEntry {
                    section: section.clone(),
                    subsection: subsection.clone(),
                    name,
                    value,
                    line,
                });
            }
        }
    }
    Ok(entries)
}

fn parse_section(scanner: &mut Scanner<'_>) -> Result<(BString, BString), Error> {
    let mut token = Vec::new();
    loop {
        match scanner.peek() {
            Some(b) if b.is_ascii_alphanumeric() || b == b'-' || b == b'.' => {
                token.push(b.to_ascii_lowercase());
                scanner.bump();
            }
            _ => break,
        }
    }
    if token.is_empty() {
        return Err(scanner.fatal("empty section name"));
    }
    let dot_idx = token.iter().position(|&b| b == b'.');
    let (section, dot_remainder) = match dot_idx {
        Some(i) => (token[..i].to_vec(), Some(token[i + 1..].to_vec())),
        None => (token.clone(), None),
    };

    match scanner.peek() {
        Some(b']') => {
            scanner.bump();
            Ok((section.into(), dot_remainder.unwrap_or_default().into()))
        }
        Some(b) if b.is_ascii_whitespace() => {
            while matches!(scanner.peek(), Some(b) if is_hspace(b)) {
                scanner.bump();
            }
            let quoted = parse_quoted_subsection(scanner)?;
            match scanner.bump() {
                Some(b']') => {}
                _ => return Err(scanner.fatal("expected ']' immediately after quoted subsection")),
            }
            let subsection = match dot_remainder {
                Some(mut rem) => {
                    rem.push(b'.');
                    rem.extend_from_slice(&quoted);
                    rem
                }
                None => quoted,
            };
            Ok((section.into(), subsection.into()))
        }
        _ => Err(scanner.fatal("malformed section header")),
    }
}

fn parse_quoted_subsection(scanner: &mut Scanner<'_>) -> Result<Vec<u8>, Error> {
    match scanner.bump() {
        Some(b'"') => {}
        _ => return Err(scanner.fatal("expected '\"' to start subsection name")),
    }
    let mut buf = Vec::new();
    loop {
        match scanner.bump() {
            None => return Err(scanner.fatal("unexpected end of file inside subsection name")),
            Some(b'"') => break,
            Some(b'\\') => match scanner.bump() {
                None => return Err(scanner.fatal("unexpected end of file after '\\' in subsection name")),
                Some(c) => buf.push(c),
            },
            Some(b) => buf.push(b),
        }
    }
    Ok(buf)
}

fn parse_variable(scanner: &mut Scanner<'_>) -> Result<(BString, BString), Error> {
    match scanner.peek() {
        Some(b) if b.is_ascii_alphabetic() => {}
        _ => return Err(scanner.fatal("variable name must start with an ASCII letter")),
    }
    let mut name = Vec::new();
    loop {
        match scanner.peek() {
            Some(b) if b.is_ascii_alphanumeric() || b == b'-' => {
                name.push(b.to_ascii_lowercase());
                scanner.bump();
            }
            _ => break,
        }
    }
    if name.is_empty() {
        return Err(scanner.fatal("empty variable name"));
    }

    while matches!(scanner.peek(), Some(b) if is_hspace(b)) {
        scanner.bump();
    }

    let value = match scanner.peek() {
        None | Some(b'\n') | Some(b'\r') | Some(b';') | Some(b'#') => BString::from("true"),
        Some(b'=') => {
            scanner.bump();
            while matches!(scanner.peek(), Some(b) if is_hspace(b)) {
                scanner.bump();
            }
            read_value(scanner)?
        }
        Some(other) => {
            return Err(scanner.fatal(format!("expected '=' after variable name, found {:?}", other as char)))
        }
    };
    Ok((name.into(), value))
}

fn read_value(scanner: &mut Scanner<'_>) -> Result<BString, Error> {
    let mut buf: Vec<u8> = Vec::new();
    let mut trimmable: Vec<bool> = Vec::new();
    let mut in_quotes = false;

    loop {
        match scanner.peek() {
            None => {
                if in_quotes {
                    return Err(scanner.fatal("unexpected end of file inside quoted value"));
                }
                break;
            }
            Some(b'\n') | Some(b'\r') if !in_quotes => break,
            Some(b';') | Some(b'#') if !in_quotes => break,
            Some(b'"') => {
                in_quotes = !in_quotes;
                scanner.bump();
            }
            Some(b'\\') => {
                scanner.bump();
                match scanner.peek() {
                    Some(b'n') => {
                        buf.push(b'\n');
                        trimmable.push(false);
                        scanner.bump();
                    }
                    Some(b't') => {
                        buf.push(b'\t');
                        trimmable.push(false);
                        scanner.bump();
                    }
                    Some(b'\\') => {
                        buf.push(b'\\');
                        trimmable.push(false);
                        scanner.bump();
                    }
                    Some(b'"') => {
                        buf.push(b'"');
                        trimmable.push(false);
                        scanner.bump();
                    }
                    Some(b'\r') => {
                        scanner.bump();
                        if scanner.peek() == Some(b'\n') {
                            scanner.bump();
                        }
                    }
                    Some(b'\n') => {
                        scanner.bump();
                    }
                    None => return Err(scanner.fatal("trailing '\\' at end of file")),
                    Some(other) => {
                        return Err(scanner.fatal(format!("invalid escape sequence '\\{}'", other as char)))
                    }
                }
            }
            Some(b) => {
                let trim = !in_quotes && is_hspace(b);
                buf.push(b);
                trimmable.push(trim);
                scanner.bump();
            }
        }
    }

    while trimmable.last() == Some(&true) {
        trimmable.pop();
        buf.pop();
    }
    Ok(buf.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(s: &str) -> Vec<RawEntry> {
        parse(s.as_bytes()).expect("parses")
    }

    #[test]
    fn bare_name_means_true() {
        let entries = parse_ok("[core]\n\tbare\n");
        assert_eq!(entries[0].value, BString::from("true"));
    }

    #[test]
    fn quoted_section_with_dotted_prefix_concatenates() {
        let entries = parse_ok("[foo.bar \"Sub\"]\n\tx = 1\n");
        assert_eq!(entries[0].section, BString::from("foo"));
        assert_eq!(entries[0].subsection, BString::from("bar.Sub"));
    }

    #[test]
    fn plain_dotted_section_splits_at_first_dot() {
        let entries = parse_ok("[foo.bar]\n\tx = 1\n");
        assert_eq!(entries[0].section, BString::from("foo"));
        assert_eq!(entries[0].subsection, BString::from("bar"));
    }

    #[test]
    fn subsection_is_case_preserved_but_section_lowercased() {
        let entries = parse_ok("[Submodule \"Name\"]\n\tpath = a\n");
        assert_eq!(entries[0].section, BString::from("submodule"));
        assert_eq!(entries[0].subsection, BString::from("Name"));
    }

    #[test]
    fn escapes_produce_control_characters() {
        let entries = parse_ok("[core]\n\teditor = \"a\\nb\\tc\"\n");
        assert_eq!(entries[0].value, BString::from("a\nb\tc"));
    }

    #[test]
    fn continuation_joins_lines_without_inserting_a_newline() {
        let entries = parse_ok("[core]\n\tx = a\\\nb\n");
        assert_eq!(entries[0].value, BString::from("ab"));
    }

    #[test]
    fn trailing_unescaped_whitespace_is_stripped_but_quoted_is_kept() {
        let entries = parse_ok("[core]\n\tx = a   \n\ty = \"a   \"\n");
        assert_eq!(entries[0].value, BString::from("a"));
        assert_eq!(entries[1].value, BString::from("a   "));
    }

    #[test]
    fn comment_after_value_is_not_included() {
        let entries = parse_ok("[core]\n\tx = a ; comment\n");
        assert_eq!(entries[0].value, BString::from("a"));
    }

    #[test]
    fn rejects_unterminated_quote() {
        assert!(parse("[core]\n\tx = \"a\n".as_bytes()).is_err());
    }

    #[test]
    fn rejects_variable_name_starting_with_digit() {
        assert!(parse("[core]\n\t1x = a\n".as_bytes()).is_err());
    }

    #[test]
    fn line_numbers_advance_across_lone_cr_and_crlf() {
        let entries = parse_ok("[core]\r\n\tx = 1\r\n\ty = 2\n");
        assert_eq!(entries[0].line, 2);
        assert_eq!(entries[1].line, 3);
    }
}

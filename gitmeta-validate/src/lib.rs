//! Validation of the names `gitmeta-ref` resolves and `gitmeta-config` reads: tags, branches,
//! and full reference paths, following the same rules `git check-ref-format` enforces.
#![deny(rust_2018_idioms)]

pub mod reference;
pub mod tag;

/// Validate a complete reference name, see [`reference::name()`].
pub use reference::name as refname;
/// Validate a tag name or a single ref-path component, see [`tag::name()`].
pub use tag::name as tagname;

#[cfg(test)]
mod tests {
    use bstr::ByteSlice;

    #[test]
    fn accepts_common_branch_and_tag_names() {
        assert!(super::refname(b"refs/heads/main".as_bstr()).is_ok());
        assert!(super::refname(b"HEAD".as_bstr()).is_ok());
        assert!(super::tagname(b"v1.2.3".as_bstr()).is_ok());
    }

    #[test]
    fn rejects_known_bad_shapes() {
        assert!(super::refname(b"/refs/heads/main".as_bstr()).is_err());
        assert!(super::refname(b"refs//heads/main".as_bstr()).is_err());
        assert!(super::refname(b"refs/heads/./main".as_bstr()).is_err());
        assert!(super::refname(b"not-all-caps".as_bstr()).is_err());
        assert!(super::tagname(b"bad..name".as_bstr()).is_err());
        assert!(super::tagname(b"ends.lock".as_bstr()).is_err());
        assert!(super::tagname(b".leading-dot".as_bstr()).is_err());
        assert!(super::tagname(b"has space".as_bstr()).is_err());
        assert!(super::tagname(b"@".as_bstr()).is_err());
        assert!(super::tagname(b"has@{at".as_bstr()).is_err());
    }
}

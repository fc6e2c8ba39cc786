use bstr::BString;

/// Identifies a config variable by `(section, subsection, name)`.
///
/// `section` and `name` are stored already ASCII-lowercased by the tokenizer, so equality and
/// hashing here are plain byte comparisons; `subsection` is kept exactly as written and compared
/// case-sensitively, per git's own rules. An empty `subsection` denotes the unqualified section.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct VariableKey {
    /// The lower-cased section name, e.g. `core` or `includeif`.
    pub section: BString,
    /// The case-sensitive subsection, or empty for the unqualified section.
    pub subsection: BString,
    /// The lower-cased variable name.
    pub name: BString,
}

impl VariableKey {
    /// Build a key for the unqualified section (empty subsection).
    pub fn new(section: impl Into<BString>, name: impl Into<BString>) -> Self {
        VariableKey {
            section: section.into(),
            subsection: BString::from(""),
            name: name.into(),
        }
    }

    /// Build a key scoped to a subsection, e.g. `submodule "name".path`.
    pub fn with_subsection(section: impl Into<BString>, subsection: impl Into<BString>, name: impl Into<BString>) -> Self {
        VariableKey {
            section: section.into(),
            subsection: subsection.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_keys_hash_equal() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let a = VariableKey::new("core", "bare");
        let b = VariableKey::new("core", "bare");
        assert_eq!(a, b);

        let mut ha = DefaultHasher::new();
        a.hash(&mut ha);
        let mut hb = DefaultHasher::new();
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }

    #[test]
    fn subsection_is_case_sensitive() {
        let a = VariableKey::with_subsection("includeif", "gitdir:/tmp/", "path");
        let b = VariableKey::with_subsection("includeif", "GitDir:/tmp/", "path");
        assert_ne!(a, b);
    }
}

//! Lexical rules for identifiers in the target language.
//!
//! The language's exported/unexported visibility rule is derived from
//! name casing: an identifier is exported iff its first character is an
//! uppercase letter (the same convention Go, and the teacher's
//! SysML/KerML-derived naming rules, use for their respective visibility
//! conventions).

/// Returns `true` if `name` is a syntactically valid identifier: starts
/// with a letter or underscore, continues with letters/digits/underscores,
/// and is non-empty. Unicode identifiers are accepted via `unicode-ident`'s
/// XID classification, matching the parser's own lexer rules.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(unicode_ident::is_xid_start(first) || first == '_') {
        return false;
    }
    chars.all(|c| unicode_ident::is_xid_continue(c) || c == '_')
}

/// Returns `true` if `name` is exported under the initial-uppercase
/// convention.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_identifiers() {
        assert!(is_valid_identifier("Foo"));
        assert!(is_valid_identifier("_foo123"));
        assert!(!is_valid_identifier("1foo"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("foo-bar"));
    }

    #[test]
    fn exported_by_case() {
        assert!(is_exported("Add"));
        assert!(!is_exported("add"));
        assert!(!is_exported("_Add"));
    }
}

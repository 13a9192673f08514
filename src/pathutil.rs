//! Small string helpers shared by path construction and payload scanning.
//!
//! Paths are slash-separated sequences of optionally module-qualified
//! segments (`mod-name:node-name`). The same qualifier syntax appears inside
//! payload values, so the prefix scan here backs both the path-driven and the
//! payload-driven module discovery.

use std::collections::BTreeSet;

/// Split a path into its slash-separated segments, dropping empties so
/// leading slashes and accidental doubles do not produce phantom segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Split one segment into `(qualifier, name)`. The qualifier is the text
/// before the first `:`; segments without a `:` have no qualifier.
pub fn split_qualifier(segment: &str) -> (Option<&str>, &str) {
    match segment.split_once(':') {
        Some((prefix, rest)) if !prefix.is_empty() => (Some(prefix), rest),
        _ => (None, segment),
    }
}

/// Collect every module qualifier appearing in `text`.
///
/// The text is segmented on whitespace and slashes; each token containing a
/// `:` contributes the part before its first occurrence. Used for path
/// strings (`a:top/b:leaf`) and for payload values that embed qualified
/// identifiers (`"mod-b:value mod-c:other"`).
pub fn module_prefixes(text: &str) -> BTreeSet<String> {
    let mut prefixes = BTreeSet::new();
    for token in text.split(|c: char| c.is_whitespace() || c == '/') {
        if let (Some(prefix), _) = split_qualifier(token) {
            prefixes.insert(prefix.to_string());
        }
    }
    prefixes
}

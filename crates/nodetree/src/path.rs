//! Dotted path handling
//!
//! A path is a `.`-separated sequence of components. Components are matched
//! against node names by exact length and content; a path never contains an
//! empty component.

use crate::error::{Result, TreeError};

/// Path separator between components.
pub const SEPARATOR: char = '.';

/// Maximum number of link hops followed while resolving a single path.
pub const MAX_LINK_HOPS: usize = 32;

/// Split a path into components, rejecting empty paths and empty
/// components (leading, trailing or doubled separators).
///
/// # Errors
///
/// Returns [`TreeError::Assertion`] for an empty path or component.
pub fn components(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Err(TreeError::Assertion("Unable to use empty path".into()));
    }
    let parts: Vec<&str> = path.split(SEPARATOR).collect();
    if parts.iter().any(|c| c.is_empty()) {
        return Err(TreeError::Assertion(format!(
            "Unable to use empty component in {}",
            path
        )));
    }
    Ok(parts)
}

/// Whether `path` is non-empty and has no empty components.
pub fn is_valid(path: &str) -> bool {
    !path.is_empty() && path.split(SEPARATOR).all(|c| !c.is_empty())
}

/// Join a prefix and a name; an empty prefix yields the name alone.
pub fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        prefix.to_string()
    } else {
        format!("{}{}{}", prefix, SEPARATOR, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components_split() {
        assert_eq!(components("a.b.c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(components("single").unwrap(), vec!["single"]);
    }

    #[test]
    fn test_components_reject_empty() {
        for bad in ["", ".a", "a.", "a..b", "."] {
            let err = components(bad).unwrap_err();
            assert!(matches!(err, TreeError::Assertion(_)), "{:?}", bad);
            assert!(!is_valid(bad));
        }
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a", "b"), "a.b");
        assert_eq!(join("a.b", ""), "a.b");
    }
}

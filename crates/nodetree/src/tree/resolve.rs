//! Read-side path resolution

use crate::node::{Attributes, NodeId};
use crate::path::{MAX_LINK_HOPS, SEPARATOR};
use crate::view::NodeRef;

use super::Tree;

impl Tree {
    /// Resolve `path` relative to the node `at`.
    ///
    /// Each component is matched against the current level's children in
    /// sibling order; the first exact match wins. Links met along the way
    /// (including on the final component) are followed from the root.
    /// Returns `None` on the first unmatched component, for an empty path
    /// or component, for a stale `at`, or when a link chain exceeds
    /// [`MAX_LINK_HOPS`].
    pub fn lookup(&self, at: NodeId, path: &str) -> Option<NodeId> {
        self.walk(at, path, true)
    }

    /// Resolve like [`lookup`](Self::lookup), optionally leaving a link on
    /// the final component unfollowed.
    pub(crate) fn walk(&self, at: NodeId, path: &str, follow_final: bool) -> Option<NodeId> {
        if path.is_empty() {
            return None;
        }
        self.get(at)?;

        // Components still to match, next one on top
        let mut pending: Vec<&str> = path.rsplit(SEPARATOR).collect();
        let mut cursor = at;
        let mut hops = 0;

        while let Some(component) = pending.pop() {
            let found = self.find_child(cursor, component)?;
            let link = self.get(found)?.link.as_deref();
            match link {
                Some(target) if follow_final || !pending.is_empty() => {
                    hops += 1;
                    if hops > MAX_LINK_HOPS {
                        return None;
                    }
                    pending.extend(target.rsplit(SEPARATOR));
                    cursor = self.root;
                }
                _ => cursor = found,
            }
        }
        Some(cursor)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Root-scoped readers
    // ═══════════════════════════════════════════════════════════════════

    /// Resolve `path` from the root to a node view.
    pub fn get_obj(&self, path: &str) -> Option<NodeRef<'_>> {
        self.root_node().get_obj(path)
    }

    /// First child of the node at `path`.
    pub fn get_child(&self, path: &str) -> Option<NodeRef<'_>> {
        self.root_node().get_child(path)
    }

    /// Value at `path`, or `default` when the path is missing or valueless.
    ///
    /// The result borrows from the tree (or from `default`), so the tree
    /// cannot be mutated while it is held.
    pub fn get_value<'a>(&'a self, path: &str, default: &'a str) -> &'a str {
        self.root_node().get_value(path, default)
    }

    /// Value at `path`, if there is one.
    pub fn find_value(&self, path: &str) -> Option<&str> {
        self.root_node().find_value(path)
    }

    /// Integer value at `path`, parsed permissively; `default` only when the
    /// path is missing or valueless.
    pub fn get_int_value(&self, path: &str, default: i64) -> i64 {
        self.root_node().get_int_value(path, default)
    }

    /// Freshly allocated copy of the value at `path`, else of `default`.
    pub fn get_copy(&self, path: &str, default: Option<&str>) -> Option<String> {
        self.root_node().get_copy(path, default)
    }

    /// Attributes of the node at `path`.
    pub fn get_attrs(&self, path: &str) -> Option<&Attributes> {
        self.root_node().get_attrs(path)
    }
}

/// Parse an integer the way C's `atoi` does: skip leading whitespace,
/// accept one sign, read decimal digits up to the first non-digit.
/// Garbage yields 0; out-of-range values saturate.
pub(crate) fn parse_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut acc: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(b - b'0');
        acc = if negative {
            acc.saturating_mul(10).saturating_sub(d)
        } else {
            acc.saturating_mul(10).saturating_add(d)
        };
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_permissive() {
        assert_eq!(parse_int("42"), 42);
        assert_eq!(parse_int("  -17"), -17);
        assert_eq!(parse_int("+8"), 8);
        assert_eq!(parse_int("12abc"), 12);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("- 5"), 0);
    }

    #[test]
    fn test_parse_int_saturates() {
        assert_eq!(parse_int("99999999999999999999999"), i64::MAX);
        assert_eq!(parse_int("-99999999999999999999999"), i64::MIN);
    }

    #[test]
    fn test_walk_rejects_empty_components() {
        let mut tree = Tree::new();
        tree.set_value("a.b", "1").unwrap();
        let root = tree.root();
        assert!(tree.lookup(root, "a.b").is_some());
        assert!(tree.lookup(root, "").is_none());
        assert!(tree.lookup(root, "a..b").is_none());
        assert!(tree.lookup(root, ".a").is_none());
    }

    #[test]
    fn test_walk_link_final_component() {
        let mut tree = Tree::new();
        tree.set_value("real.x", "1").unwrap();
        tree.set_symlink("alias", "real").unwrap();
        let root = tree.root();

        let followed = tree.walk(root, "alias", true).unwrap();
        let unfollowed = tree.walk(root, "alias", false).unwrap();
        assert_eq!(Some(followed), tree.lookup(root, "real"));
        assert_ne!(followed, unfollowed);
        assert_eq!(tree.get_value("alias.x", "?"), "1");
    }

    #[test]
    fn test_walk_link_cycle_is_absent() {
        let mut tree = Tree::new();
        tree.set_symlink("a", "b").unwrap();
        tree.set_symlink("b", "a").unwrap();
        assert!(tree.get_obj("a").is_none());
        assert!(tree.get_obj("a.x").is_none());
    }
}

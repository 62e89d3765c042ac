//! Write-side path resolution and mutation

use std::borrow::Cow;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, TreeError};
use crate::node::{NodeId, NodeValue};
use crate::path::{self, MAX_LINK_HOPS};
use crate::view::NodeRef;

use super::Tree;

impl Tree {
    /// Write `value` at `path` relative to `at`, creating missing nodes.
    ///
    /// Missing intermediate components become valueless container nodes,
    /// appended after their existing siblings. At the final component the
    /// node is created, or its previous value is dropped and replaced.
    /// `None` clears the value. Links met along the way are followed.
    ///
    /// Returns the id of the node that received the value.
    ///
    /// # Errors
    ///
    /// - `Assertion` for an empty path, an empty component, a stale `at`,
    ///   or a link chain longer than [`MAX_LINK_HOPS`]
    /// - `OutOfMemory` if a node cannot be allocated
    pub fn set(&mut self, at: NodeId, path: &str, value: Option<NodeValue>) -> Result<NodeId> {
        let id = self.vivify(at, path, true)?;
        self.expect_node_mut(id)?.value = value;
        Ok(id)
    }

    /// Resolve `path` relative to `at`, creating every missing component.
    ///
    /// When `follow_final` is false a link on the last component is
    /// returned itself instead of its target.
    pub(crate) fn vivify(&mut self, at: NodeId, path: &str, follow_final: bool) -> Result<NodeId> {
        self.expect_node(at)?;
        let parts = path::components(path)?;

        let mut pending: Vec<Cow<'_, str>> = parts.into_iter().rev().map(Cow::Borrowed).collect();
        let mut cursor = at;
        let mut hops = 0;

        while let Some(component) = pending.pop() {
            let Some(found) = self.find_child(cursor, &component) else {
                cursor = self.append_child(cursor, &component, None)?;
                continue;
            };

            let link = match self.get(found).and_then(|n| n.link.as_ref()) {
                Some(target) if follow_final || !pending.is_empty() => target.clone(),
                _ => {
                    cursor = found;
                    continue;
                }
            };

            hops += 1;
            if hops > MAX_LINK_HOPS {
                return Err(TreeError::Assertion(format!(
                    "Too many link hops while setting {}",
                    path
                )));
            }
            let target_parts = path::components(&link)?;
            pending.extend(
                target_parts
                    .into_iter()
                    .rev()
                    .map(|part| Cow::Owned(part.to_string())),
            );
            cursor = self.root;
        }
        Ok(cursor)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Root-scoped writers
    // ═══════════════════════════════════════════════════════════════════

    /// Set `path` to a copy of `value`. The node owns the copy.
    pub fn set_value(&mut self, path: &str, value: &str) -> Result<()> {
        self.set(self.root, path, Some(NodeValue::Owned(value.to_string())))?;
        Ok(())
    }

    /// Set `path` to `buf`, moving the buffer into the node without copying.
    pub fn set_buf(&mut self, path: &str, buf: String) -> Result<()> {
        self.set(self.root, path, Some(NodeValue::Owned(buf)))?;
        Ok(())
    }

    /// Set `path` to a buffer shared with the caller.
    pub fn set_shared(&mut self, path: &str, value: Arc<str>) -> Result<()> {
        self.set(self.root, path, Some(NodeValue::Shared(value)))?;
        Ok(())
    }

    /// Copy the current value at `src` to `dest`.
    ///
    /// This is a snapshot: later writes to `src` do not affect `dest`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `src` is missing or has no value.
    pub fn copy_value(&mut self, dest: &str, src: &str) -> Result<()> {
        self.copy_value_at(self.root, dest, src)
    }

    pub(crate) fn copy_value_at(&mut self, at: NodeId, dest: &str, src: &str) -> Result<()> {
        let value = self
            .lookup(at, src)
            .and_then(|id| self.get(id))
            .and_then(|node| node.value.as_ref())
            .map(|v| v.as_str().to_string())
            .ok_or_else(|| TreeError::NotFound(format!("Unable to find {}", src)))?;
        self.set(at, dest, Some(NodeValue::Owned(value)))?;
        Ok(())
    }

    /// Set or remove (`None`) the attribute `key` on the node at `path`,
    /// creating the node if needed.
    pub fn set_attr(&mut self, path: &str, key: &str, value: Option<&str>) -> Result<()> {
        self.set_attr_at(self.root, path, key, value)
    }

    pub(crate) fn set_attr_at(
        &mut self,
        at: NodeId,
        path: &str,
        key: &str,
        value: Option<&str>,
    ) -> Result<()> {
        let id = self.vivify(at, path, true)?;
        let attrs = &mut self.expect_node_mut(id)?.attrs;
        match value {
            Some(v) => {
                attrs.insert(key.to_string(), v.to_string());
            }
            None => {
                attrs.shift_remove(key);
            }
        }
        Ok(())
    }

    /// Make the node at `src` an alias of the location `dest`.
    ///
    /// `dest` is always resolved from the root and need not exist yet. The
    /// alias node's own value and children are dropped, since every lookup
    /// through it lands on the target; re-linking an existing alias
    /// replaces its target.
    pub fn set_symlink(&mut self, src: &str, dest: &str) -> Result<()> {
        self.set_symlink_at(self.root, src, dest)
    }

    pub(crate) fn set_symlink_at(&mut self, at: NodeId, src: &str, dest: &str) -> Result<()> {
        path::components(dest)?;
        let id = self.vivify(at, src, false)?;
        let dropped = self.free_children(id);
        if dropped > 0 {
            debug!(src, dest, dropped, "link replaced existing children");
        }
        let node = self.expect_node_mut(id)?;
        node.value = None;
        node.link = Some(dest.to_string());
        Ok(())
    }

    /// Remove the node at `path` and its whole subtree.
    ///
    /// A missing path is not an error. A link on the final component is
    /// removed itself, not its target. Returns the number of nodes freed.
    pub fn remove_tree(&mut self, path: &str) -> Result<usize> {
        self.remove_tree_at(self.root, path)
    }

    pub(crate) fn remove_tree_at(&mut self, at: NodeId, path: &str) -> Result<usize> {
        path::components(path)?;
        match self.walk(at, path, false) {
            Some(id) => self.remove_node(id),
            None => Ok(0),
        }
    }

    /// Deep-copy `src` (value, attributes, link and all descendants) onto
    /// the node at `dest`, merging with whatever is already there.
    ///
    /// `src` may come from any other tree; to copy within one tree, copy
    /// from a detached snapshot made with [`NodeRef::to_tree`].
    pub fn copy_tree(&mut self, dest: &str, src: NodeRef<'_>) -> Result<NodeId> {
        self.copy_tree_at(self.root, dest, src)
    }

    pub(crate) fn copy_tree_at(&mut self, at: NodeId, dest: &str, src: NodeRef<'_>) -> Result<NodeId> {
        let dest_id = self.vivify(at, dest, true)?;
        self.graft(dest_id, src)?;
        Ok(dest_id)
    }

    /// Merge `src` and its descendants onto the existing node `dest`.
    pub(crate) fn graft(&mut self, dest: NodeId, src: NodeRef<'_>) -> Result<()> {
        let mut stack = vec![(src, dest)];
        while let Some((from, to)) = stack.pop() {
            let target = self.expect_node_mut(to)?;
            if let Some(value) = from.node_value() {
                target.value = Some(value.clone());
            }
            for (key, value) in from.attrs() {
                target.attrs.insert(key.clone(), value.clone());
            }
            if let Some(link) = from.link() {
                // A link node is a leaf
                self.free_children(to);
                self.expect_node_mut(to)?.link = Some(link.to_string());
                continue;
            }

            for child in from.children() {
                let existing = self.find_child(to, child.name());
                let child_to = match existing {
                    Some(id) => id,
                    None => self.append_child(to, child.name(), None)?,
                };
                stack.push((child, child_to));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_returns_final_node() {
        let mut tree = Tree::new();
        let root = tree.root();
        let id = tree.set(root, "a.b", Some("v".into())).unwrap();
        assert_eq!(tree.lookup(root, "a.b"), Some(id));
    }

    #[test]
    fn test_set_none_clears_value() {
        let mut tree = Tree::new();
        tree.set_value("a", "1").unwrap();
        let root = tree.root();
        tree.set(root, "a", None).unwrap();
        assert_eq!(tree.find_value("a"), None);
        assert!(tree.get_obj("a").is_some());
    }

    #[test]
    fn test_set_through_link_writes_target() {
        let mut tree = Tree::new();
        tree.set_symlink("alias", "real").unwrap();
        tree.set_value("alias.x", "1").unwrap();
        tree.set_value("alias", "top").unwrap();
        assert_eq!(tree.get_value("real.x", "?"), "1");
        assert_eq!(tree.get_value("real", "?"), "top");
    }

    #[test]
    fn test_set_link_loop_is_assertion() {
        let mut tree = Tree::new();
        tree.set_symlink("a", "b").unwrap();
        tree.set_symlink("b", "a").unwrap();
        let err = tree.set_value("a.x", "1").unwrap_err();
        assert!(matches!(err, TreeError::Assertion(_)));
    }

    #[test]
    fn test_relink_replaces_target() {
        let mut tree = Tree::new();
        tree.set_value("one", "1").unwrap();
        tree.set_value("two", "2").unwrap();
        tree.set_symlink("alias", "one").unwrap();
        tree.set_symlink("alias", "two").unwrap();
        assert_eq!(tree.get_value("alias", "?"), "2");
    }

    #[test]
    fn test_symlink_frees_existing_children() {
        let mut tree = Tree::new();
        tree.set_value("alias.x.deep", "1").unwrap();
        tree.set_value("alias.y", "2").unwrap();
        let before = tree.len();

        tree.set_symlink("alias", "real").unwrap();
        assert_eq!(tree.len(), before - 3);
        let root = tree.root();
        let alias = tree.walk(root, "alias", false).unwrap();
        assert!(tree.node(alias).unwrap().child().is_none());
    }

    #[test]
    fn test_copy_tree_link_replaces_dest_children() {
        let mut src = Tree::new();
        src.set_symlink("n", "elsewhere").unwrap();
        let mut dest = Tree::new();
        dest.set_value("top.n.old", "1").unwrap();

        dest.copy_tree("top", src.root_node()).unwrap();
        let root = dest.root();
        let n = dest.walk(root, "top.n", false).unwrap();
        let n = dest.node(n).unwrap();
        assert_eq!(n.link(), Some("elsewhere"));
        assert!(n.child().is_none());
        assert_eq!(dest.write_string(), "top.n := elsewhere\n");
    }

    #[test]
    fn test_set_symlink_rejects_bad_target() {
        let mut tree = Tree::new();
        assert!(tree.set_symlink("alias", "a..b").is_err());
        assert!(tree.get_obj("alias").is_none());
    }
}

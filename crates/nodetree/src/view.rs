//! Borrowed views onto tree nodes
//!
//! A [`NodeRef`] is a read-only window onto one node; it can walk the
//! structure (`child`, `next`, `parent`) and resolve paths relative to its
//! node. A [`NodeMut`] scopes writes to a node. Neither owns anything:
//! views are tied to the tree's lifetime and can never outlive or destroy
//! it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::node::{Attributes, Node, NodeId, NodeValue};
use crate::reader::{self, ReadOptions};
use crate::tree::{parse_int, Tree};

/// Read-only view of a node.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    pub(crate) fn new(tree: &'t Tree, id: NodeId) -> Self {
        Self { tree, id }
    }

    fn node(&self) -> &'t Node {
        // Views are only created for live ids, and the shared borrow of the
        // tree keeps them live.
        match self.tree.get(self.id) {
            Some(node) => node,
            None => unreachable!("node view outlived its node"),
        }
    }

    fn view(&self, id: Option<NodeId>) -> Option<NodeRef<'t>> {
        id.and_then(|id| self.tree.node(id))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Structure
    // ═══════════════════════════════════════════════════════════════════

    /// This node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The tree this view borrows from.
    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    /// Whether this is the tree's root.
    pub fn is_root(&self) -> bool {
        self.id == self.tree.root()
    }

    /// The root of the tree this node belongs to.
    pub fn top(&self) -> NodeRef<'t> {
        self.tree.root_node()
    }

    /// First child.
    pub fn child(&self) -> Option<NodeRef<'t>> {
        self.view(self.node().first_child)
    }

    /// Next sibling.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> Option<NodeRef<'t>> {
        self.view(self.node().next)
    }

    /// Parent node (`None` for the root).
    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.view(self.node().parent)
    }

    /// Iterate over the children in sibling order.
    pub fn children(&self) -> Children<'t> {
        Children {
            tree: self.tree,
            next: self.node().first_child,
        }
    }

    /// Node name (empty for the root).
    pub fn name(&self) -> &'t str {
        &self.node().name
    }

    /// Node value as a string slice.
    pub fn value(&self) -> Option<&'t str> {
        self.node().value.as_ref().map(NodeValue::as_str)
    }

    /// Node value with its ownership mode.
    pub fn node_value(&self) -> Option<&'t NodeValue> {
        self.node().value.as_ref()
    }

    /// Link target when this node aliases another location.
    pub fn link(&self) -> Option<&'t str> {
        self.node().link.as_deref()
    }

    /// Attributes in insertion order.
    pub fn attrs(&self) -> &'t Attributes {
        &self.node().attrs
    }

    /// A single attribute value.
    pub fn attr(&self, key: &str) -> Option<&'t str> {
        self.node().attrs.get(key).map(String::as_str)
    }

    /// Fully-qualified dotted name of this node (empty for the root).
    pub fn full_name(&self) -> String {
        let mut parts = Vec::new();
        let mut cursor = Some(*self);
        while let Some(node) = cursor {
            if !node.is_root() {
                parts.push(node.name());
            }
            cursor = node.parent();
        }
        parts.reverse();
        parts.join(".")
    }

    // ═══════════════════════════════════════════════════════════════════
    // Path-relative readers
    // ═══════════════════════════════════════════════════════════════════

    /// Resolve `path` relative to this node.
    pub fn get_obj(&self, path: &str) -> Option<NodeRef<'t>> {
        self.view(self.tree.lookup(self.id, path))
    }

    /// First child of the node at `path`.
    pub fn get_child(&self, path: &str) -> Option<NodeRef<'t>> {
        self.get_obj(path).and_then(|node| node.child())
    }

    /// Value at `path`, if there is one.
    pub fn find_value(&self, path: &str) -> Option<&'t str> {
        self.get_obj(path).and_then(|node| node.value())
    }

    /// Value at `path`, or `default` when missing or valueless.
    pub fn get_value<'a>(&self, path: &str, default: &'a str) -> &'a str
    where
        't: 'a,
    {
        self.find_value(path).unwrap_or(default)
    }

    /// Integer value at `path`.
    ///
    /// `default` is returned only when there is no value; a value that is
    /// not a number parses as 0.
    pub fn get_int_value(&self, path: &str, default: i64) -> i64 {
        self.find_value(path).map_or(default, parse_int)
    }

    /// Freshly allocated copy of the value at `path`, else of `default`.
    pub fn get_copy(&self, path: &str, default: Option<&str>) -> Option<String> {
        self.find_value(path).or(default).map(str::to_string)
    }

    /// Attributes of the node at `path`.
    pub fn get_attrs(&self, path: &str) -> Option<&'t Attributes> {
        self.get_obj(path).map(|node| node.attrs())
    }

    /// Detached deep copy of this node and its descendants.
    ///
    /// This node becomes the new tree's root: its value, attributes and
    /// link are carried over, its name is dropped.
    pub fn to_tree(&self) -> Result<Tree> {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.graft(root, *self)?;
        Ok(tree)
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("value", &self.value())
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

/// Iterator over a node's children in sibling order.
pub struct Children<'t> {
    tree: &'t Tree,
    next: Option<NodeId>,
}

impl<'t> Iterator for Children<'t> {
    type Item = NodeRef<'t>;

    fn next(&mut self) -> Option<NodeRef<'t>> {
        let id = self.next?;
        let node = self.tree.node(id)?;
        self.next = self.tree.get(id).and_then(|n| n.next);
        Some(node)
    }
}

/// Mutable view scoping writes to one node.
///
/// Paths given to a `NodeMut` are relative to its node.
pub struct NodeMut<'t> {
    tree: &'t mut Tree,
    id: NodeId,
}

impl<'t> NodeMut<'t> {
    pub(crate) fn new(tree: &'t mut Tree, id: NodeId) -> Self {
        Self { tree, id }
    }

    /// This node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Reborrow as a read-only view.
    pub fn view(&self) -> NodeRef<'_> {
        NodeRef::new(self.tree, self.id)
    }

    /// Write `value` at `path` below this node.
    pub fn set(&mut self, path: &str, value: Option<NodeValue>) -> Result<NodeId> {
        self.tree.set(self.id, path, value)
    }

    /// Set `path` to a copy of `value`.
    pub fn set_value(&mut self, path: &str, value: &str) -> Result<()> {
        self.set(path, Some(NodeValue::Owned(value.to_string())))?;
        Ok(())
    }

    /// Set `path` to `buf`, moving the buffer into the node.
    pub fn set_buf(&mut self, path: &str, buf: String) -> Result<()> {
        self.set(path, Some(NodeValue::Owned(buf)))?;
        Ok(())
    }

    /// Set `path` to a buffer shared with the caller.
    pub fn set_shared(&mut self, path: &str, value: Arc<str>) -> Result<()> {
        self.set(path, Some(NodeValue::Shared(value)))?;
        Ok(())
    }

    /// Snapshot-copy the value at `src` to `dest`, both relative to this node.
    pub fn copy_value(&mut self, dest: &str, src: &str) -> Result<()> {
        self.tree.copy_value_at(self.id, dest, src)
    }

    /// Set or remove an attribute on the node at `path`.
    pub fn set_attr(&mut self, path: &str, key: &str, value: Option<&str>) -> Result<()> {
        self.tree.set_attr_at(self.id, path, key, value)
    }

    /// Make `src` (relative to this node) an alias of `dest` (from the root).
    pub fn set_symlink(&mut self, src: &str, dest: &str) -> Result<()> {
        self.tree.set_symlink_at(self.id, src, dest)
    }

    /// Remove the subtree at `path`.
    pub fn remove_tree(&mut self, path: &str) -> Result<usize> {
        self.tree.remove_tree_at(self.id, path)
    }

    /// Deep-copy `src` onto `dest` below this node.
    pub fn copy_tree(&mut self, dest: &str, src: NodeRef<'_>) -> Result<NodeId> {
        self.tree.copy_tree_at(self.id, dest, src)
    }

    /// Parse a file into this node.
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        reader::read_file(self.tree, self.id, path.as_ref(), &ReadOptions::default())
    }

    /// Parse text into this node.
    pub fn read_string(&mut self, text: &str, permissive: bool) -> Result<()> {
        reader::read_str(self.tree, self.id, text, &ReadOptions::for_string(permissive))
    }
}

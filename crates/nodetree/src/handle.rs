//! Shared handles for embedding the tree behind a host boundary
//!
//! A [`TreeHandle`] is what a binding layer hands out: a shared hold on a
//! tree plus the id of one node in it. Every handle obtained from another
//! (`get_obj`, `child`, `next`, `top`) shares the same tree, and the tree
//! lives as long as its longest holder. All returned strings are owned, so
//! nothing borrowed from the tree crosses the boundary.
//!
//! Handles are single-threaded (`Rc<RefCell<_>>`). The tree is borrowed
//! only for the duration of each call.

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::trace;

use crate::error::{Result, TreeError};
use crate::node::NodeId;
use crate::reader::{self, ReadOptions};
use crate::tree::Tree;
use crate::view::{NodeMut, NodeRef};

/// A shared hold on a tree, positioned at one node.
#[derive(Clone)]
pub struct TreeHandle {
    tree: Rc<RefCell<Tree>>,
    node: NodeId,
}

impl Default for TreeHandle {
    fn default() -> Self {
        Self::init()
    }
}

impl TreeHandle {
    /// Create a new empty tree and return a handle to its root.
    pub fn init() -> Self {
        Self::from_tree(Tree::new())
    }

    /// Take ownership of an existing tree.
    pub fn from_tree(tree: Tree) -> Self {
        let node = tree.root();
        Self {
            tree: Rc::new(RefCell::new(tree)),
            node,
        }
    }

    fn at(&self, node: NodeId) -> Self {
        Self {
            tree: Rc::clone(&self.tree),
            node,
        }
    }

    /// Run `f` against a read-only view of this handle's node.
    ///
    /// Returns `None` if the node has been removed from the tree.
    ///
    /// The tree stays borrowed while `f` runs. Reads through other handles
    /// to the same tree work inside `f`; mutations through them fail with
    /// an `Assertion` error.
    pub fn with_node<R>(&self, f: impl FnOnce(NodeRef<'_>) -> R) -> Option<R> {
        let tree = self.tree.borrow();
        tree.node(self.node).map(f)
    }

    fn tree_mut(&self) -> Result<RefMut<'_, Tree>> {
        self.tree.try_borrow_mut().map_err(|_| {
            TreeError::Assertion("Tree is borrowed by an in-progress read".to_string())
        })
    }

        fn view_or<R>(&self, default: R, f: impl FnOnce(NodeRef<'_>) -> R) -> R {
        self.with_node(f).unwrap_or(default)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════

    /// Release this handle.
    ///
    /// Returns true if this was the last holder and the tree was freed.
    /// Releasing a handle to an inner node never frees a tree that another
    /// handle (such as its root) still holds.
    pub fn destroy(self) -> bool {
        let is_root = self.is_root();
        match Rc::try_unwrap(self.tree) {
            Ok(cell) => {
                let tree = cell.into_inner();
                trace!(nodes = tree.len(), is_root, "last handle released");
                tree.destroy();
                true
            }
            Err(_) => false,
        }
    }

    /// Number of handles sharing this tree.
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.tree)
    }

    /// Whether two handles share one tree.
    pub fn same_tree(&self, other: &TreeHandle) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree)
    }

    /// The id of this handle's node.
    pub fn id(&self) -> NodeId {
        self.node
    }

    /// Whether this handle is positioned at the tree's root.
    pub fn is_root(&self) -> bool {
        self.tree.borrow().root() == self.node
    }

    // ═══════════════════════════════════════════════════════════════════
    // Navigation
    // ═══════════════════════════════════════════════════════════════════

    /// Handle to the tree's root.
    pub fn top(&self) -> TreeHandle {
        let root = self.tree.borrow().root();
        self.at(root)
    }

    /// Handle to the node at `path`, relative to this node.
    pub fn get_obj(&self, path: &str) -> Option<TreeHandle> {
        let found = self.tree.borrow().lookup(self.node, path);
        found.map(|id| self.at(id))
    }

    /// Handle to the first child of the node at `path`.
    pub fn get_child(&self, path: &str) -> Option<TreeHandle> {
        let found = self
            .with_node(|node| node.get_child(path).map(|c| c.id()))
            .flatten();
        found.map(|id| self.at(id))
    }

    /// Handle to this node's first child.
    pub fn child(&self) -> Option<TreeHandle> {
        let found = self.with_node(|node| node.child().map(|c| c.id())).flatten();
        found.map(|id| self.at(id))
    }

    /// Handle to this node's next sibling.
    pub fn next(&self) -> Option<TreeHandle> {
        let found = self.with_node(|node| node.next().map(|c| c.id())).flatten();
        found.map(|id| self.at(id))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Values and attributes
    // ═══════════════════════════════════════════════════════════════════

    /// This node's name.
    pub fn name(&self) -> String {
        self.view_or(String::new(), |node| node.name().to_string())
    }

    /// This node's value.
    pub fn value(&self) -> Option<String> {
        self.with_node(|node| node.value().map(str::to_string)).flatten()
    }

    /// Value at `path`, or `default`.
    pub fn get_value(&self, path: &str, default: &str) -> String {
        self.view_or(default.to_string(), |node| {
            node.get_value(path, default).to_string()
        })
    }

    /// Integer value at `path`, or `default` when there is no value.
    pub fn get_int_value(&self, path: &str, default: i64) -> i64 {
        self.view_or(default, |node| node.get_int_value(path, default))
    }

    /// This node's attributes in insertion order.
    pub fn attrs(&self) -> Vec<(String, String)> {
        self.view_or(Vec::new(), pairs)
    }

    /// Attributes of the node at `path`.
    pub fn get_attrs(&self, path: &str) -> Option<Vec<(String, String)>> {
        self.with_node(|node| node.get_obj(path).map(pairs)).flatten()
    }

    /// Set `path` to a copy of `value`.
    pub fn set_value(&self, path: &str, value: &str) -> Result<()> {
        self.mutate(|mut node| node.set_value(path, value))
    }

    /// Snapshot-copy the value at `src` to `dest`.
    pub fn copy_value(&self, dest: &str, src: &str) -> Result<()> {
        self.mutate(|mut node| node.copy_value(dest, src))
    }

    /// Set or remove an attribute on the node at `path`.
    pub fn set_attr(&self, path: &str, key: &str, value: Option<&str>) -> Result<()> {
        self.mutate(|mut node| node.set_attr(path, key, value))
    }

    /// Make `src` (relative to this node) an alias of `dest` (from the root).
    pub fn set_symlink(&self, src: &str, dest: &str) -> Result<()> {
        self.mutate(|mut node| node.set_symlink(src, dest))
    }

    /// Remove the subtree at `path`, returning the number of nodes freed.
    pub fn remove_tree(&self, path: &str) -> Result<usize> {
        self.mutate(|mut node| node.remove_tree(path))
    }

    /// Deep-copy the subtree at `src` onto `name` below this node.
    ///
    /// `src` may be a handle into this same tree; it is snapshotted first.
    pub fn copy(&self, name: &str, src: &TreeHandle) -> Result<()> {
        let snapshot = src
            .with_node(|node| node.to_tree())
            .ok_or_else(|| stale(src.node))??;
        self.mutate(|mut node| node.copy_tree(name, snapshot.root_node()).map(|_| ()))
    }

    fn mutate<R>(&self, f: impl FnOnce(NodeMut<'_>) -> Result<R>) -> Result<R> {
        let mut tree = self.tree_mut()?;
        let node = tree.node_mut(self.node).ok_or_else(|| stale(self.node))?;
        f(node)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Files and text
    // ═══════════════════════════════════════════════════════════════════

    /// Parse a file into this node.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.mutate(|mut node| node.read_file(path))
    }

    /// Parse text into this node; `permissive` skips `#include` lines.
    pub fn read_string(&self, text: &str, permissive: bool) -> Result<()> {
        self.mutate(|mut node| node.read_string(text, permissive))
    }

    /// Parse text into this node with explicit options.
    pub fn read_str_with(&self, text: &str, options: &ReadOptions) -> Result<()> {
        let mut tree = self.tree_mut()?;
        reader::read_str(&mut tree, self.node, text, options)
    }

    /// Serialize this node's descendants.
    pub fn write_string(&self) -> String {
        self.view_or(String::new(), |node| node.write_string())
    }

    /// Write this node's descendants to `path`.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.with_node(|node| node.write_file(path))
            .ok_or_else(|| stale(self.node))?
    }

    /// Write this node's descendants to `path` via a temporary file.
    pub fn write_file_atomic(&self, path: impl AsRef<Path>) -> Result<()> {
        self.with_node(|node| node.write_file_atomic(path))
            .ok_or_else(|| stale(self.node))?
    }

    /// Print `path = value` lines for this node and its descendants.
    pub fn dump(&self, prefix: &str) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.with_node(|node| node.dump_to(&mut out, prefix))
            .ok_or_else(|| stale(self.node))?
    }

    /// Dump as a string.
    pub fn dump_string(&self, prefix: &str) -> String {
        self.view_or(String::new(), |node| node.dump_string(prefix))
    }

    /// Resolve a file against the tree's load paths.
    pub fn search_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        self.tree.borrow().search_path(path)
    }
}

fn pairs(node: NodeRef<'_>) -> Vec<(String, String)> {
    node.attrs()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn stale(id: NodeId) -> TreeError {
    TreeError::Assertion(format!("Node {} is no longer in the tree", id))
}

impl fmt::Debug for TreeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeHandle")
            .field("node", &self.node)
            .field("holders", &self.holders())
            .finish()
    }
}

impl PartialEq for TreeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_tree(other) && self.node == other.node
    }
}

impl Eq for TreeHandle {}

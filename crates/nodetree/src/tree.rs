//! The node arena: allocation, linking and destruction

mod mutate;
mod resolve;
mod search;

pub(crate) use resolve::parse_int;
pub use search::LOAD_PATHS;

use tracing::trace;

use crate::error::{Result, TreeError};
use crate::node::{Node, NodeId, NodeValue};
use crate::view::{NodeMut, NodeRef};

/// A path-addressed tree of named nodes.
///
/// All nodes live in a flat arena owned by the tree and are addressed by
/// generational [`NodeId`]s. Children form an insertion-ordered sibling
/// chain; duplicate sibling names are permitted and lookups take the first
/// match.
///
/// Dropping the tree releases every node at once, without recursion.
///
/// # Example
///
/// ```
/// use nodetree::Tree;
///
/// let mut tree = Tree::new();
/// tree.set_value("Page.Title", "Hello").unwrap();
///
/// assert_eq!(tree.get_value("Page.Title", "?"), "Hello");
/// assert_eq!(tree.get_value("Page", "?"), "?"); // container, no value
/// assert_eq!(tree.get_value("Page.Missing", "?"), "?");
/// ```
#[derive(Debug, Clone)]
pub struct Tree {
    /// Node storage; freed slots keep their generation
    slots: Vec<Slot>,

    /// Indices of free slots, reused before growing
    free: Vec<u32>,

    /// The synthetic, unnamed root
    root: NodeId,

    /// Number of live nodes, root included
    live: usize,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create an empty tree holding only its root.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::new("", None)),
            }],
            free: Vec::new(),
            root: NodeId::new(0, 0),
            live: 1,
        }
    }

    /// Release the tree and every node in it.
    ///
    /// Equivalent to dropping the tree; node views borrowed from it cannot
    /// outlive this call.
    pub fn destroy(self) {
        trace!(nodes = self.live, "destroying tree");
        drop(self);
    }

    /// Remove every node except the root, keeping the root's attributes.
    pub fn clear(&mut self) {
        let root = self.root;
        self.free_children(root);
        if let Some(node) = self.get_mut(root) {
            node.value = None;
            node.link = None;
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════

    /// The root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the root has no children.
    pub fn is_empty(&self) -> bool {
        self.get(self.root)
            .map_or(true, |root| root.first_child.is_none())
    }

    /// Whether `id` refers to a live node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Read-only view of a node.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.get(id).map(|_| NodeRef::new(self, id))
    }

    /// Mutable view of a node.
    pub fn node_mut(&mut self, id: NodeId) -> Option<NodeMut<'_>> {
        if self.contains(id) {
            Some(NodeMut::new(self, id))
        } else {
            None
        }
    }

    /// Read-only view of the root.
    pub fn root_node(&self) -> NodeRef<'_> {
        NodeRef::new(self, self.root)
    }

    /// Mutable view of the root.
    pub fn root_node_mut(&mut self) -> NodeMut<'_> {
        let root = self.root;
        NodeMut::new(self, root)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Arena primitives
    // ═══════════════════════════════════════════════════════════════════

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Like [`get`](Self::get), but a stale id is a caller error.
    pub(crate) fn expect_node(&self, id: NodeId) -> Result<&Node> {
        self.get(id)
            .ok_or_else(|| TreeError::Assertion(format!("Node {} is not part of this tree", id)))
    }

    pub(crate) fn expect_node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.get_mut(id)
            .ok_or_else(|| TreeError::Assertion(format!("Node {} is not part of this tree", id)))
    }

    fn alloc(&mut self, node: Node) -> Result<NodeId> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            self.live += 1;
            return Ok(NodeId::new(index, slot.generation));
        }

        let index = u32::try_from(self.slots.len()).map_err(|_| {
            TreeError::OutOfMemory(format!("Unable to allocate node {}: arena full", node.name))
        })?;
        self.slots.try_reserve(1).map_err(|_| {
            TreeError::OutOfMemory(format!("Unable to allocate memory for node {}", node.name))
        })?;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        self.live += 1;
        Ok(NodeId::new(index, 0))
    }

    fn release(&mut self, id: NodeId) -> Option<Node> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(node)
    }

    /// First child of `parent` whose name equals `name`.
    pub(crate) fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let mut cursor = self.get(parent)?.first_child;
        while let Some(id) = cursor {
            let node = self.get(id)?;
            if node.name == name {
                return Some(id);
            }
            cursor = node.next;
        }
        None
    }

    /// Allocate a node and append it at the end of `parent`'s children.
    pub(crate) fn append_child(
        &mut self,
        parent: NodeId,
        name: &str,
        value: Option<NodeValue>,
    ) -> Result<NodeId> {
        let last = self.expect_node(parent)?.last_child;

        let mut node = Node::new(name, value);
        node.parent = Some(parent);
        let id = self.alloc(node)?;
        trace!(name, id = %id, "allocated node");

        match last.and_then(|prev| self.get_mut(prev)) {
            Some(prev) => prev.next = Some(id),
            None => self.expect_node_mut(parent)?.first_child = Some(id),
        }
        self.expect_node_mut(parent)?.last_child = Some(id);
        Ok(id)
    }

    /// Unlink a node from its parent's child list and free it together
    /// with its whole subtree. Returns the number of nodes freed.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Result<usize> {
        let node = self.expect_node(id)?;
        let parent = node.parent.ok_or_else(|| {
            TreeError::Assertion("Unable to remove the root of a tree".to_string())
        })?;
        let next = node.next;

        // Find the predecessor in the sibling chain
        let mut prev = None;
        let mut cursor = self.expect_node(parent)?.first_child;
        while let Some(current) = cursor {
            if current == id {
                break;
            }
            prev = Some(current);
            cursor = self.get(current).and_then(|n| n.next);
        }

        match prev.and_then(|p| self.get_mut(p)) {
            Some(prev_node) => prev_node.next = next,
            None => self.expect_node_mut(parent)?.first_child = next,
        }
        let parent_node = self.expect_node_mut(parent)?;
        if parent_node.last_child == Some(id) {
            parent_node.last_child = prev;
        }

        Ok(self.free_subtree(id))
    }

    /// Free a detached subtree with an explicit stack. Every node, including
    /// every sibling at every level, is released exactly once.
    fn free_subtree(&mut self, id: NodeId) -> usize {
        let mut stack = vec![id];
        let mut freed = 0;
        while let Some(current) = stack.pop() {
            let Some(node) = self.release(current) else {
                continue;
            };
            let mut child = node.first_child;
            while let Some(c) = child {
                child = self.get(c).and_then(|n| n.next);
                stack.push(c);
            }
            freed += 1;
        }
        trace!(freed, "released subtree");
        freed
    }

    /// Free every subtree below `id`, leaving it a leaf. Returns the number
    /// of nodes freed.
    pub(crate) fn free_children(&mut self, id: NodeId) -> usize {
        let children: Vec<NodeId> = self.child_ids(id).collect();
        let freed = children.into_iter().map(|c| self.free_subtree(c)).sum();
        if let Some(node) = self.get_mut(id) {
            node.first_child = None;
            node.last_child = None;
        }
        freed
    }

    /// Iterate over the ids of `parent`'s children in sibling order.
    pub(crate) fn child_ids(&self, parent: NodeId) -> ChildIds<'_> {
        ChildIds {
            tree: self,
            next: self.get(parent).and_then(|n| n.first_child),
        }
    }
}

/// Iterator over child ids in sibling order.
pub(crate) struct ChildIds<'t> {
    tree: &'t Tree,
    next: Option<NodeId>,
}

impl Iterator for ChildIds<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.get(id).and_then(|n| n.next);
        Some(id)
    }
}

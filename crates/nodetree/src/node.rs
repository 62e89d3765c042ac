//! Node representation: identifiers, values and per-node storage

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// Ordered key/value attributes attached to a node.
pub type Attributes = IndexMap<String, String>;

/// Stable handle to a node inside a [`Tree`](crate::Tree).
///
/// Ids are generational: once a node is removed its id never resolves
/// again, even if the slot is reused for a new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the owning tree.
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// A node's value buffer.
///
/// Exactly one ownership mode applies at a time and is chosen by the
/// writer. Replacing or removing a value drops whichever buffer was held;
/// a shared buffer stays alive as long as the caller keeps its own handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeValue {
    /// Buffer exclusively owned by the node
    Owned(String),

    /// Buffer shared with the caller
    Shared(Arc<str>),
}

impl NodeValue {
    /// Borrow the value as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            NodeValue::Owned(s) => s,
            NodeValue::Shared(s) => s,
        }
    }

    /// Whether the node exclusively owns the buffer.
    pub fn is_owned(&self) -> bool {
        matches!(self, NodeValue::Owned(_))
    }

    /// Take the value out as an owned `String`.
    ///
    /// An owned buffer is moved out; a shared buffer is copied.
    pub fn into_string(self) -> String {
        match self {
            NodeValue::Owned(s) => s,
            NodeValue::Shared(s) => s.to_string(),
        }
    }
}

impl AsRef<str> for NodeValue {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for NodeValue {
    fn from(s: String) -> Self {
        NodeValue::Owned(s)
    }
}

impl From<&str> for NodeValue {
    fn from(s: &str) -> Self {
        NodeValue::Owned(s.to_string())
    }
}

impl From<Arc<str>> for NodeValue {
    fn from(s: Arc<str>) -> Self {
        NodeValue::Shared(s)
    }
}

impl PartialEq<str> for NodeValue {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for NodeValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Storage for one tree element.
///
/// Structural links are ids into the owning arena. A node owns nothing
/// through them: the arena owns every node, and `first_child`/`next` only
/// describe order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Node {
    /// Name, unique only among siblings; empty for the root
    pub(crate) name: String,

    /// Optional value
    pub(crate) value: Option<NodeValue>,

    /// Target path when this node aliases another location
    pub(crate) link: Option<String>,

    /// Ordered attributes
    pub(crate) attrs: Attributes,

    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

impl Node {
    /// A fresh, unlinked node.
    pub(crate) fn new(name: impl Into<String>, value: Option<NodeValue>) -> Self {
        Self {
            name: name.into(),
            value,
            ..Default::default()
        }
    }
}

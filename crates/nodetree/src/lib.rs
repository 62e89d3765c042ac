//! # nodetree
//!
//! A path-addressed tree of named string values with a line-oriented text
//! format.
//!
//! Nodes are addressed by dotted paths (`Page.Header.Title`). Writing a path
//! creates every missing component; reading a missing path yields the
//! caller's default rather than an error.
//!
//! ## Architecture
//!
//! - **Tree**: arena of nodes addressed by generational [`NodeId`]s
//! - **Resolver**: path lookup and typed reads ([`Tree::get_value`],
//!   [`NodeRef::get_obj`])
//! - **Mutator**: auto-vivifying writes ([`Tree::set_value`], links,
//!   attributes, subtree copy and removal)
//! - **Reader**: the text format, with blocks, heredocs, value copies and
//!   `#include`
//! - **Writer**: canonical depth-first dump and text serialization
//! - **Handles**: [`TreeHandle`], shared single-threaded handles for
//!   binding layers
//!
//! ## Example
//!
//! ```
//! use nodetree::Tree;
//!
//! let mut tree = Tree::new();
//! tree.read_string("Page {\n  Title = Hello\n  Copy : Title\n}\n", false)?;
//!
//! assert_eq!(tree.get_value("Page.Copy", ""), "Hello");
//! assert_eq!(tree.write_string(), "Page.Title = Hello\nPage.Copy = Hello\n");
//! # Ok::<(), nodetree::TreeError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod handle;
pub mod node;
pub mod path;
pub mod reader;
#[cfg(feature = "serde")]
mod ser;
pub mod tree;
pub mod view;
pub mod writer;

// Re-export main types
pub use error::{ErrorKind, Result, SourceLocation, TreeError};
pub use handle::TreeHandle;
pub use node::{Attributes, NodeId, NodeValue};
pub use reader::{IncludePolicy, ReadOptions};
pub use tree::{Tree, LOAD_PATHS};
pub use view::{Children, NodeMut, NodeRef};
pub use writer::Walk;

/// nodetree version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}

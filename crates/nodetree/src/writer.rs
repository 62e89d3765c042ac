//! Tree serialization
//!
//! Everything here is built on one traversal, [`NodeRef::walk`]: a node,
//! then its children (with the dotted prefix extended by the node's name),
//! then the next sibling under the same prefix. The debug dump and the
//! text writer both emit entries in that order, so a written tree reads
//! back with the same sibling order.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::error::{Result, TreeError};
use crate::node::{Attributes, NodeId};
use crate::path;
use crate::reader::{is_name_char, is_terminator};
use crate::tree::Tree;
use crate::view::NodeRef;

/// Depth-first walk yielding `(dotted path, node)` pairs.
///
/// The starting node is visited first under `prefix` joined with its own
/// name; its siblings are not visited.
pub struct Walk<'t> {
    tree: &'t Tree,
    pending: Vec<(NodeId, String)>,
}

impl<'t> Iterator for Walk<'t> {
    type Item = (String, NodeRef<'t>);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, prefix) = self.pending.pop()?;
        let node = self.tree.node(id)?;
        let full = path::join(&prefix, node.name());

        // Children are pushed in reverse so the first child is popped next
        let children: Vec<NodeId> = node.children().map(|c| c.id()).collect();
        for child in children.into_iter().rev() {
            self.pending.push((child, full.clone()));
        }
        Some((full, node))
    }
}

impl<'t> NodeRef<'t> {
    /// Walk this node and its descendants in canonical order.
    pub fn walk(&self, prefix: &str) -> Walk<'t> {
        Walk {
            tree: self.tree(),
            pending: vec![(self.id(), prefix.to_string())],
        }
    }

    /// Write `path = value` for every valued node under this one.
    pub fn dump_to<W: Write>(&self, out: &mut W, prefix: &str) -> Result<()> {
        for (full, node) in self.walk(prefix) {
            if let Some(value) = node.value() {
                if full.is_empty() {
                    continue;
                }
                writeln!(out, "{} = {}", full, value)
                    .map_err(|e| TreeError::io("Unable to write dump", e))?;
            }
        }
        Ok(())
    }

    /// The dump as a string.
    pub fn dump_string(&self, prefix: &str) -> String {
        let mut out = String::new();
        for (full, node) in self.walk(prefix) {
            if let (false, Some(value)) = (full.is_empty(), node.value()) {
                let _ = writeln!(out, "{} = {}", full, value);
            }
        }
        out
    }

    /// Serialize the descendants of this node in the text format, with
    /// paths relative to this node.
    ///
    /// Reading the result into an empty node rebuilds the same values,
    /// links, attributes and sibling order, provided every name is made of
    /// ASCII letters, digits and `_`. Other names are written as they are
    /// and will not parse; [`check_names`](Self::check_names) finds them.
    pub fn write_string(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            for (full, node) in child.walk("") {
                write_entry(&mut out, &full, node);
            }
        }
        out
    }

    /// Fail with `Assertion` on the first descendant whose name the text
    /// format cannot express.
    pub fn check_names(&self) -> Result<()> {
        for child in self.children() {
            for (full, node) in child.walk("") {
                if !node.name().chars().all(is_name_char) {
                    return Err(TreeError::Assertion(format!(
                        "Node name {:?} at {} cannot be written as text",
                        node.name(),
                        full
                    )));
                }
            }
        }
        Ok(())
    }

    /// Write [`write_string`](Self::write_string) output to `path`,
    /// replacing any existing file in place.
    ///
    /// Nothing is written if [`check_names`](Self::check_names) fails.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.check_names()?;
        debug!(path = %path.display(), "writing file");
        let text = self.write_string();
        let mut file = File::create(path).map_err(|e| {
            TreeError::io(format!("Unable to open {} for writing", path.display()), e)
        })?;
        file.write_all(text.as_bytes())
            .map_err(|e| TreeError::io(format!("Unable to write {}", path.display()), e))
    }

    /// Write to a temporary file next to `path`, then rename it into place.
    pub fn write_file_atomic(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.check_names()?;
        let tmp = temp_path(path);
        debug!(path = %path.display(), tmp = %tmp.display(), "writing file atomically");

        let text = self.write_string();
        if let Err(e) = write_synced(&tmp, text.as_bytes()) {
            let _ = fs::remove_file(&tmp);
            return Err(TreeError::io(
                format!("Unable to write temporary file {}", tmp.display()),
                e,
            ));
        }
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(TreeError::io(
                format!("Unable to rename {} to {}", tmp.display(), path.display()),
                e,
            ));
        }
        Ok(())
    }
}

impl Tree {
    /// Print the dump of the whole tree to stdout.
    pub fn dump(&self, prefix: &str) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.root_node().dump_to(&mut out, prefix)?;
        out.flush()
            .map_err(|e| TreeError::io("Unable to flush stdout", e))
    }

    /// Write the dump of the whole tree to `out`.
    pub fn dump_to<W: Write>(&self, out: &mut W, prefix: &str) -> Result<()> {
        self.root_node().dump_to(out, prefix)
    }

    /// The dump of the whole tree as a string.
    pub fn dump_string(&self, prefix: &str) -> String {
        self.root_node().dump_string(prefix)
    }

    /// Serialize the whole tree in the text format.
    ///
    /// # Example
    ///
    /// ```
    /// use nodetree::Tree;
    ///
    /// let mut tree = Tree::new();
    /// tree.set_value("Page.Title", "Hello").unwrap();
    /// tree.set_value("Page.Lang", "en").unwrap();
    ///
    /// assert_eq!(tree.write_string(), "Page.Title = Hello\nPage.Lang = en\n");
    /// ```
    pub fn write_string(&self) -> String {
        self.root_node().write_string()
    }

    /// Write the tree to `path`, replacing any existing file in place.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.root_node().write_file(path)
    }

    /// Write the tree to a temporary file next to `path` and rename it
    /// into place, so readers see either the old file or the new one.
    pub fn write_file_atomic(&self, path: impl AsRef<Path>) -> Result<()> {
        self.root_node().write_file_atomic(path)
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// `<name>.tmp.<pid>.<nanos>` in the target's directory.
fn temp_path(path: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tree".to_string());
    path.with_file_name(format!("{}.tmp.{}.{}", name, std::process::id(), nanos))
}

fn write_entry(out: &mut String, full: &str, node: NodeRef<'_>) {
    let attrs = format_attrs(node.attrs());
    if let Some(target) = node.link() {
        let _ = writeln!(out, "{}{} := {}", full, attrs, target);
    } else if let Some(value) = node.value() {
        if value.contains('\n') {
            let terminator = heredoc_terminator(value);
            let _ = writeln!(out, "{}{} << {}", full, attrs, terminator);
            out.push_str(value);
            if !value.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&terminator);
            out.push('\n');
        } else {
            let _ = writeln!(out, "{}{} = {}", full, attrs, value);
        }
    } else if !attrs.is_empty() {
        let _ = writeln!(out, "{}{} {{\n}}", full, attrs);
    }
}

/// ` [key="value", ...]`, or empty when there are no attributes.
fn format_attrs(attrs: &Attributes) -> String {
    if attrs.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = attrs
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape(v)))
        .collect();
    format!(" [{}]", parts.join(", "))
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// First of `EOM`, `EOM1`, `EOM2`, ... that no body line would match.
fn heredoc_terminator(value: &str) -> String {
    let mut n = 0;
    loop {
        let candidate = if n == 0 {
            "EOM".to_string()
        } else {
            format!("EOM{}", n)
        };
        if !value
            .split_inclusive('\n')
            .any(|line| is_terminator(line, &candidate))
        {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Tree {
        let mut tree = Tree::new();
        tree.set_value("a", "1").unwrap();
        tree.set_value("a.b", "2").unwrap();
        tree.set_value("a.c.d", "3").unwrap();
        tree.set_value("z", "4").unwrap();
        tree
    }

    #[test]
    fn test_walk_order_children_before_siblings() {
        let tree = sample();
        let paths: Vec<String> = tree.root_node().walk("").map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["", "a", "a.b", "a.c", "a.c.d", "z"]);
    }

    #[test]
    fn test_walk_from_inner_node_skips_its_siblings() {
        let tree = sample();
        let a = tree.get_obj("a").unwrap();
        let paths: Vec<String> = a.walk("top").map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["top.a", "top.a.b", "top.a.c", "top.a.c.d"]);
    }

    #[test]
    fn test_dump_string() {
        let tree = sample();
        assert_eq!(tree.dump_string(""), "a = 1\na.b = 2\na.c.d = 3\nz = 4\n");
        assert_eq!(
            tree.dump_string("P"),
            "P.a = 1\nP.a.b = 2\nP.a.c.d = 3\nP.z = 4\n"
        );
    }

    #[test]
    fn test_dump_to_matches_dump_string() {
        let tree = sample();
        let mut buf = Vec::new();
        tree.dump_to(&mut buf, "x").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), tree.dump_string("x"));
    }

    #[test]
    fn test_write_entry_forms() {
        let mut tree = Tree::new();
        tree.set_value("Plain", "v").unwrap();
        tree.set_value("Multi", "one\ntwo").unwrap();
        tree.set_symlink("Alias", "Plain").unwrap();
        tree.set_attr("Tagged", "lang", Some("e\"n")).unwrap();

        assert_eq!(
            tree.write_string(),
            "Plain = v\n\
             Multi << EOM\none\ntwo\nEOM\n\
             Alias := Plain\n\
             Tagged [lang=\"e\\\"n\"] {\n}\n"
        );
    }

    #[test]
    fn test_heredoc_terminator_avoids_body_lines() {
        assert_eq!(heredoc_terminator("a\nb\n"), "EOM");
        assert_eq!(heredoc_terminator("EOM\n"), "EOM1");
        assert_eq!(heredoc_terminator("EOM x\nEOM1\n"), "EOM2");
        assert_eq!(heredoc_terminator("EOMX\n"), "EOM");
    }

    #[test]
    fn test_check_names() {
        let mut tree = sample();
        assert!(tree.root_node().check_names().is_ok());

        tree.set_value("a.my key", "v").unwrap();
        let err = tree.root_node().check_names().unwrap_err();
        assert_eq!(err.to_string(), "Assertion failed: Node name \"my key\" at a.my key cannot be written as text");
        // Only descendants are checked
        assert!(tree.get_obj("a.my key").unwrap().check_names().is_ok());
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("/data/conf.hdf"));
        assert_eq!(tmp.parent(), Some(Path::new("/data")));
        let name = tmp.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(&format!("conf.hdf.tmp.{}.", std::process::id())));
    }
}

//! Text-format reader
//!
//! A line-oriented parser that builds a tree through the mutator:
//!
//! ```text
//! # comment
//! #include "other.hdf"
//! Page.Title = Hello
//! Page {
//!   Author [lang=en] = Someone
//!   Copy : Title
//!   Alias := Page.Title
//!   Body << EOM
//! multi-line
//! text
//! EOM
//! }
//! ```
//!
//! Nested blocks are tracked with an explicit scope stack, so block depth
//! does not grow the call stack. Included files recurse once per file,
//! bounded by [`ReadOptions::max_include_depth`]. Errors from nested
//! operations are wrapped with the file and line being processed at each
//! level.

mod line;
mod options;

pub use options::{IncludePolicy, ReadOptions};

pub(crate) use line::{is_name_char, is_terminator};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, TreeError};
use crate::node::{NodeId, NodeValue};
use crate::tree::Tree;

use line::{Line, Op};

/// Source name used in diagnostics for in-memory input.
pub const STRING_SOURCE: &str = "<string>";

/// Parse the file at `path` into the node `at`.
pub(crate) fn read_file(tree: &mut Tree, at: NodeId, path: &Path, options: &ReadOptions) -> Result<()> {
    Parser::new(tree, options).parse_file(at, path)
}

/// Parse `text` into the node `at`.
pub(crate) fn read_str(tree: &mut Tree, at: NodeId, text: &str, options: &ReadOptions) -> Result<()> {
    Parser::new(tree, options).parse_stream(at, &mut text.as_bytes(), STRING_SOURCE)
}

impl Tree {
    /// Parse a file into the root, following `#include` lines.
    ///
    /// # Errors
    ///
    /// - `Io` if a file cannot be opened or read
    /// - `Parse` for malformed lines, wrapped in `In file` context
    /// - any mutator error raised while applying a line
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.read_file_with(path, &ReadOptions::default())
    }

    /// Parse a file into the root with explicit options.
    pub fn read_file_with(&mut self, path: impl AsRef<Path>, options: &ReadOptions) -> Result<()> {
        let root = self.root();
        read_file(self, root, path.as_ref(), options)
    }

    /// Parse in-memory text into the root.
    ///
    /// With `permissive`, `#include` lines are skipped; otherwise they are
    /// parse errors, since in-memory text has no file context.
    ///
    /// # Example
    ///
    /// ```
    /// use nodetree::Tree;
    ///
    /// let mut tree = Tree::new();
    /// tree.read_string("A {\n  B = 1\n}\n", false).unwrap();
    /// assert_eq!(tree.get_value("A.B", "?"), "1");
    /// ```
    pub fn read_string(&mut self, text: &str, permissive: bool) -> Result<()> {
        self.read_str_with(text, &ReadOptions::for_string(permissive))
    }

    /// Parse in-memory text into the root with explicit options.
    pub fn read_str_with(&mut self, text: &str, options: &ReadOptions) -> Result<()> {
        let root = self.root();
        read_str(self, root, text, options)
    }
}

struct Parser<'t, 'o> {
    tree: &'t mut Tree,
    options: &'o ReadOptions,
    /// Current include nesting
    depth: usize,
}

impl<'t, 'o> Parser<'t, 'o> {
    fn new(tree: &'t mut Tree, options: &'o ReadOptions) -> Self {
        Self {
            tree,
            options,
            depth: 0,
        }
    }

    fn parse_file(&mut self, at: NodeId, path: &Path) -> Result<()> {
        debug!(path = %path.display(), depth = self.depth, "reading file");
        let file = File::open(path).map_err(|e| {
            TreeError::io(format!("Unable to open file {}", path.display()), e)
        })?;
        let mut input = BufReader::new(file);
        self.parse_stream(at, &mut input, &path.display().to_string())
    }

    fn parse_stream<R: BufRead>(&mut self, at: NodeId, input: &mut R, source: &str) -> Result<()> {
        let mut scopes = vec![at];
        let mut line_no = 0;
        let mut buf = String::new();

        loop {
            buf.clear();
            let read = input
                .read_line(&mut buf)
                .map_err(|e| TreeError::io(format!("Unable to read {}", source), e))?;
            if read == 0 {
                // End of input closes any open blocks
                break;
            }
            line_no += 1;

            let here = line_no;
            let scope = scopes.last().copied().unwrap_or(at);
            let line = line::classify(&buf).map_err(|msg| TreeError::parse(msg, source, here))?;

            match line {
                Line::Blank | Line::Comment => {}

                Line::Include(target) => self.include(scope, target, source, here)?,

                Line::Close => {
                    if scopes.len() == 1 {
                        return Err(TreeError::parse("Unmatched } with no open block", source, here));
                    }
                    scopes.pop();
                }

                Line::Entry { name, attrs, op } => {
                    let wrap = |e: TreeError| e.in_file(source, here);
                    match op {
                        Op::Assign(value) => {
                            let value = NodeValue::Owned(value.to_string());
                            self.tree.set(scope, name, Some(value)).map_err(wrap)?;
                        }
                        Op::Copy(src) => {
                            self.tree.copy_value_at(scope, name, src).map_err(wrap)?;
                        }
                        Op::Link(target) => {
                            self.tree.set_symlink_at(scope, name, target).map_err(wrap)?;
                        }
                        Op::Block => {
                            let lower = match self.tree.lookup(scope, name) {
                                Some(id) => id,
                                None => self.tree.set(scope, name, None).map_err(wrap)?,
                            };
                            scopes.push(lower);
                        }
                        Op::Heredoc(terminator) => {
                            let body = read_heredoc(input, terminator, name, source, &mut line_no)?;
                            // The accumulated buffer moves into the node
                            self.tree
                                .set(scope, name, Some(NodeValue::Owned(body)))
                                .map_err(wrap)?;
                        }
                    }
                    if !attrs.is_empty() {
                        self.apply_attrs(scope, name, attrs).map_err(wrap)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn include(&mut self, scope: NodeId, target: &str, source: &str, line: usize) -> Result<()> {
        match self.options.include {
            IncludePolicy::Ignore => {
                warn!(source, line, target, "skipping #include");
                Ok(())
            }
            IncludePolicy::Reject => Err(TreeError::parse(
                format!("#include not allowed here: {}", target),
                source,
                line,
            )),
            IncludePolicy::Follow => {
                if self.depth >= self.options.max_include_depth {
                    return Err(TreeError::parse(
                        format!(
                            "Include depth exceeds {} while including {}",
                            self.options.max_include_depth, target
                        ),
                        source,
                        line,
                    ));
                }
                let path = self
                    .tree
                    .search_path_with(target, &self.options.load_paths)
                    .unwrap_or_else(|_| PathBuf::from(target));
                debug!(source, line, path = %path.display(), "including file");

                self.depth += 1;
                let result = self.parse_file(scope, &path);
                self.depth -= 1;
                result.map_err(|e| e.in_file(source, line))
            }
        }
    }

    /// Attach parsed attributes to the node named by the line itself (a
    /// link node keeps them, rather than its target).
    fn apply_attrs(&mut self, scope: NodeId, name: &str, attrs: Vec<(String, String)>) -> Result<()> {
        let id = self.tree.vivify(scope, name, false)?;
        let node = self.tree.expect_node_mut(id)?;
        node.attrs.extend(attrs);
        Ok(())
    }
}

/// Accumulate raw lines up to the terminator line. Line breaks inside the
/// body are kept as read; the terminator line itself is dropped.
fn read_heredoc<R: BufRead>(
    input: &mut R,
    terminator: &str,
    name: &str,
    source: &str,
    line_no: &mut usize,
) -> Result<String> {
    let start = *line_no;
    if terminator.is_empty() {
        return Err(TreeError::parse(
            format!("No multi-line assignment terminator given for {}", name),
            source,
            start,
        ));
    }

    let mut body = String::new();
    let mut raw = String::new();
    loop {
        raw.clear();
        let read = input
            .read_line(&mut raw)
            .map_err(|e| TreeError::io(format!("Unable to read {}", source), e))?;
        if read == 0 {
            return Err(TreeError::parse(
                format!(
                    "Missing terminator {} for multi-line assignment to {}",
                    terminator, name
                ),
                source,
                start,
            ));
        }
        *line_no += 1;

        if line::is_terminator(&raw, terminator) {
            return Ok(body);
        }
        body.try_reserve(raw.len()).map_err(|_| {
            TreeError::OutOfMemory(format!(
                "[{}:{}] Unable to allocate memory for multi-line assignment to {}",
                source, start, name
            ))
        })?;
        body.push_str(&raw);
    }
}

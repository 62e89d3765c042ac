//! File search against load paths configured in the tree

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{Result, TreeError};

use super::Tree;

/// Node whose children's values list the directories searched by
/// [`Tree::search_path`] and by `#include`.
pub const LOAD_PATHS: &str = "loadpaths";

impl Tree {
    /// Directories listed under [`LOAD_PATHS`], in sibling order.
    pub fn load_paths(&self) -> Vec<PathBuf> {
        self.get_obj(LOAD_PATHS)
            .map(|node| {
                node.children()
                    .filter_map(|child| child.value())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Locate a file.
    ///
    /// An absolute path is returned if it exists. A relative path is tried
    /// under each load path in order, then as given (relative to the
    /// working directory).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no candidate exists.
    pub fn search_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        self.search_path_with(path, &[])
    }

    /// Like [`search_path`](Self::search_path), trying `extra` directories
    /// after the tree's own load paths.
    pub fn search_path_with(&self, path: impl AsRef<Path>, extra: &[PathBuf]) -> Result<PathBuf> {
        let path = path.as_ref();

        if path.is_absolute() {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(TreeError::NotFound(format!("Path {} not found", path.display())));
        }

        let dirs = self.load_paths();
        for dir in dirs.iter().chain(extra) {
            let candidate = dir.join(path);
            trace!(candidate = %candidate.display(), "searching");
            if candidate.exists() {
                return Ok(candidate);
            }
        }

        if path.exists() {
            return Ok(path.to_path_buf());
        }
        Err(TreeError::NotFound(format!(
            "Path {} not found in load paths",
            path.display()
        )))
    }
}

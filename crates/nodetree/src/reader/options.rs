//! Reader configuration

use std::path::PathBuf;

/// How `#include` lines are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncludePolicy {
    /// Parse the named file into the current scope
    #[default]
    Follow,

    /// Skip the line
    Ignore,

    /// Treat the line as a parse error
    Reject,
}

/// Configuration for a read.
///
/// This is passed through every nested include and controls how far the
/// reader may go.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// What `#include` does
    pub include: IncludePolicy,

    /// Maximum nesting of included files (catches self-including files)
    pub max_include_depth: usize,

    /// Directories searched for includes after the tree's own `loadpaths`.
    /// They are never written into the tree.
    pub load_paths: Vec<PathBuf>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            include: IncludePolicy::Follow,
            max_include_depth: 32,
            load_paths: Vec::new(),
        }
    }
}

impl ReadOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for in-memory text: includes are skipped when `permissive`,
    /// rejected otherwise.
    pub fn for_string(permissive: bool) -> Self {
        Self {
            include: if permissive {
                IncludePolicy::Ignore
            } else {
                IncludePolicy::Reject
            },
            ..Default::default()
        }
    }

    /// Set the include policy.
    pub fn with_include(mut self, include: IncludePolicy) -> Self {
        self.include = include;
        self
    }

    /// Set the include nesting limit.
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Set the extra include search directories.
    pub fn with_load_paths(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.load_paths = dirs.into_iter().collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_includes() {
        let opts = ReadOptions::new();
        assert_eq!(opts.include, IncludePolicy::Follow);
        assert_eq!(opts.max_include_depth, 32);
        assert!(opts.load_paths.is_empty());
    }

    #[test]
    fn test_string_policies() {
        assert_eq!(ReadOptions::for_string(true).include, IncludePolicy::Ignore);
        assert_eq!(ReadOptions::for_string(false).include, IncludePolicy::Reject);
    }

    #[test]
    fn test_builders() {
        let opts = ReadOptions::new()
            .with_include(IncludePolicy::Reject)
            .with_max_include_depth(2)
            .with_load_paths(vec![PathBuf::from("lib")]);
        assert_eq!(opts.include, IncludePolicy::Reject);
        assert_eq!(opts.max_include_depth, 2);
        assert_eq!(opts.load_paths, vec![PathBuf::from("lib")]);
    }
}

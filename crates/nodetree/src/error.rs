//! Error types for tree operations

use std::fmt;

use thiserror::Error;

/// Main error type for nodetree operations.
///
/// Lookup misses are not errors: read operations return `None` or the
/// caller's default. Only writes and operations that require a source
/// (such as [`Tree::copy_value`](crate::Tree::copy_value)) report
/// [`TreeError::NotFound`].
#[derive(Error, Debug)]
pub enum TreeError {
    /// Allocation failure while growing tree or parser storage
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// Caller contract violation (empty path, empty component, stale node)
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// A required value or file could not be found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed text input
    #[error("Parse error: [{location}] {message}")]
    Parse {
        /// Human-readable description of the problem
        message: String,
        /// Where the problem was found
        location: SourceLocation,
    },

    /// File open/read/write failure
    #[error("I/O error: {context}: {source}")]
    Io {
        /// What was being attempted, usually including the path
        context: String,
        /// The underlying system error
        #[source]
        source: std::io::Error,
    },

    /// An error passed up through the reader, annotated with the file and
    /// line that was being processed at that level
    #[error("In file {file}:{line}")]
    Context {
        /// File (or `<string>`) being read
        file: String,
        /// Line number (1-indexed)
        line: usize,
        /// The wrapped error
        #[source]
        source: Box<TreeError>,
    },
}

/// The semantic category of a [`TreeError`], independent of context layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Allocation failure
    OutOfMemory,
    /// Caller contract violation
    Assertion,
    /// Required value or file missing
    NotFound,
    /// Malformed text input
    Parse,
    /// File system failure
    Io,
}

impl TreeError {
    /// Create a parse error at the given location.
    pub fn parse(message: impl Into<String>, file: impl Into<String>, line: usize) -> Self {
        TreeError::Parse {
            message: message.into(),
            location: SourceLocation::new(file, line),
        }
    }

    /// Create an I/O error with a description of the failed operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        TreeError::Io {
            context: context.into(),
            source,
        }
    }

    /// Wrap this error with the file and line being processed.
    pub fn in_file(self, file: impl Into<String>, line: usize) -> Self {
        TreeError::Context {
            file: file.into(),
            line,
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through all context layers.
    pub fn root_cause(&self) -> &TreeError {
        let mut err = self;
        while let TreeError::Context { source, .. } = err {
            err = source;
        }
        err
    }

    /// The semantic kind of the innermost error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TreeError::OutOfMemory(_) => ErrorKind::OutOfMemory,
            TreeError::Assertion(_) => ErrorKind::Assertion,
            TreeError::NotFound(_) => ErrorKind::NotFound,
            TreeError::Parse { .. } => ErrorKind::Parse,
            TreeError::Io { .. } => ErrorKind::Io,
            TreeError::Context { source, .. } => source.kind(),
        }
    }

    /// Whether the innermost error is a parse error.
    ///
    /// Binding layers use this to separate a "parse" category from general
    /// errors.
    pub fn is_parse(&self) -> bool {
        self.kind() == ErrorKind::Parse
    }

    /// Files and lines the error passed through, outermost first.
    pub fn trail(&self) -> Vec<(&str, usize)> {
        let mut out = Vec::new();
        let mut err = self;
        while let TreeError::Context { file, line, source } = err {
            out.push((file.as_str(), *line));
            err = source;
        }
        out
    }
}

/// Source location for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// File name, or `<string>` for in-memory input
    pub file: String,

    /// Line number (1-indexed)
    pub line: usize,
}

impl SourceLocation {
    /// Create a new source location.
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Result type alias for nodetree operations
pub type Result<T> = std::result::Result<T, TreeError>;

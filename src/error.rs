//! Error types for Quiet Text
//!
//! The highlighting engine has three error kinds of its own. None of them is
//! ever allowed to stop editing or saving: the editor falls back to plain,
//! unhighlighted text.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Editor error types
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Grammar(#[from] GrammarLoadError),

    #[error("Invalid settings: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("Cannot write settings: {0}")]
    SettingsSerialize(#[from] toml::ser::Error),

    #[error("No file name set")]
    NoFile,

    #[error("{0}")]
    Message(String),
}

/// Failure to turn a grammar document into a [`Grammar`](crate::syntax::Grammar)
#[derive(Error, Debug)]
pub enum GrammarLoadError {
    #[error("Cannot read grammar {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed grammar document: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Rule #{index} is missing the `{field}` field")]
    MissingField { index: usize, field: &'static str },

    #[error("Rule `{rule}` has an invalid pattern: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rule `{0}` is declared more than once")]
    DuplicateRule(String),
}

/// A rule that could not finish matching within its budget
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternMatchError {
    #[error("Rule `{rule}` gave up after {matches} matches in {elapsed:?}")]
    BudgetExceeded {
        rule: String,
        matches: usize,
        elapsed: Duration,
    },
}

/// The annotation surface refused a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Region {start}..{end} is outside the surface (length {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("Offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
}

//! Error types for pipeline-highlight

use thiserror::Error;

/// Result type alias for highlighting operations
pub type Result<T> = std::result::Result<T, HighlightError>;

/// Highlighting error types
#[derive(Error, Debug)]
pub enum HighlightError {
    /// The host is present but does not expose the editor API
    #[error("host editor API unavailable")]
    EditorApiUnavailable,

    #[error("invalid pattern in rule `{rule}`: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("grammar `{grammar}` refers to unknown mode `{mode}`")]
    UnknownMode { grammar: String, mode: String },

    #[error("unknown grammar: {0}")]
    UnknownGrammar(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("{0}")]
    Message(String),
}

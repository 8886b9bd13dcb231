//! Error types for the Perch protocol envelope.

use thiserror::Error;

/// Errors that can occur while decoding a protocol line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line was empty after stripping the line terminator.
    #[error("empty line")]
    EmptyLine,

    /// The line carried tags or a prefix but no command.
    #[error("missing command in line: {line:?}")]
    MissingCommand {
        /// The offending line.
        line: String,
    },

    /// The source prefix could not be decoded.
    #[error("invalid prefix {prefix:?}: {reason}")]
    InvalidPrefix {
        /// The raw prefix text.
        prefix: String,
        /// Reason for failure.
        reason: &'static str,
    },

    /// The command verb contained characters outside the protocol grammar.
    #[error("invalid command {command:?}")]
    InvalidCommand {
        /// The raw command text.
        command: String,
    },
}

/// Result type for envelope decoding.
pub type ParseResult<T> = Result<T, ParseError>;

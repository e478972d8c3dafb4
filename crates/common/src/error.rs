//! Common error types for overlay controller components.

use thiserror::Error;

/// Errors raised while parsing the textual form of a data-model value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unknown conference status name
    #[error("Unknown conference status: {0}")]
    ConferenceStatus(String),

    /// Unknown participant type name
    #[error("Unknown participant type: {0}")]
    ParticipantType(String),

    /// Unknown stream kind name
    #[error("Unknown stream kind: {0}")]
    StreamKind(String),

    /// Unknown presentation mode name
    #[error("Unknown presentation mode: {0}")]
    PresentationMode(String),
}

/// Result type alias using `ParseError`
pub type Result<T> = std::result::Result<T, ParseError>;

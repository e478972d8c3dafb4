//! Overlay Controller error types.
//!
//! Nothing in the controller is fatal. Errors raised by collaborators are
//! reported to the `ErrorSink` and the event loop keeps going; handle methods
//! only fail when the actor is gone.

use thiserror::Error;

/// Overlay Controller error type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OverlayError {
    /// The host surface could not be resolved (host finishing, root missing).
    #[error("Host surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// A collaborator call failed (audio focus, output route, attach).
    #[error("Collaborator error in {collaborator}: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (actor channel failures).
    #[error("Internal error: {0}")]
    Internal(String),

    /// The controller is shutting down.
    #[error("Controller is shutting down")]
    ShuttingDown,
}

impl OverlayError {
    /// Build a collaborator error.
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        OverlayError::Collaborator {
            collaborator,
            message: message.into(),
        }
    }

    /// Bounded label for metrics and logs.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            OverlayError::SurfaceUnavailable(_) => "surface_unavailable",
            OverlayError::Collaborator { .. } => "collaborator",
            OverlayError::Config(_) => "config",
            OverlayError::Internal(_) => "internal",
            OverlayError::ShuttingDown => "shutting_down",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping() {
        assert_eq!(
            OverlayError::SurfaceUnavailable("finishing".to_string()).category(),
            "surface_unavailable"
        );
        assert_eq!(
            OverlayError::collaborator("audio", "focus denied").category(),
            "collaborator"
        );
        assert_eq!(OverlayError::Config("bad".to_string()).category(), "config");
        assert_eq!(
            OverlayError::Internal("closed".to_string()).category(),
            "internal"
        );
        assert_eq!(OverlayError::ShuttingDown.category(), "shutting_down");
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(
            format!("{}", OverlayError::collaborator("audio", "focus denied")),
            "Collaborator error in audio: focus denied"
        );
        assert_eq!(
            format!("{}", OverlayError::SurfaceUnavailable("no root".to_string())),
            "Host surface unavailable: no root"
        );
    }
}

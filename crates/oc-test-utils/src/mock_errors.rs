//! Error sink that keeps every report.

use overlay_controller::collaborators::ErrorSink;
use overlay_controller::errors::OverlayError;
use std::sync::Mutex;

/// Records every reported error.
#[derive(Debug, Default)]
pub struct RecordingErrorSink {
    reports: Mutex<Vec<OverlayError>>,
}

impl RecordingErrorSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All reports so far, oldest first.
    #[must_use]
    pub fn reports(&self) -> Vec<OverlayError> {
        self.reports.lock().unwrap().clone()
    }

    /// Number of reports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.lock().unwrap().len()
    }

    /// Whether nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorSink for RecordingErrorSink {
    fn report(&self, error: &OverlayError) {
        self.reports.lock().unwrap().push(error.clone());
    }
}

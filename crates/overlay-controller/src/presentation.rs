//! Expanded/minimized presentation state with a saved slot.
//!
//! `current` is the saved slot. It survives a retained detach and is cleared by
//! a releasing one, after which the next attach falls back to `default`.

use common::types::PresentationMode;

/// Saved and default presentation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationState {
    current: Option<PresentationMode>,
    default: PresentationMode,
}

impl PresentationState {
    /// Create a state with no saved mode.
    #[must_use]
    pub fn new(default: PresentationMode) -> Self {
        Self {
            current: None,
            default,
        }
    }

    /// Saved mode, if any.
    #[must_use]
    pub fn current(&self) -> Option<PresentationMode> {
        self.current
    }

    /// Fallback mode.
    #[must_use]
    pub fn default_mode(&self) -> PresentationMode {
        self.default
    }

    /// Mode the overlay should show now (`current ?? default`).
    #[must_use]
    pub fn effective(&self) -> PresentationMode {
        self.current.unwrap_or(self.default)
    }

    /// Change the fallback mode. The saved slot is untouched.
    pub fn set_default(&mut self, mode: PresentationMode) {
        self.default = mode;
    }

    /// Record an expand.
    pub fn expand(&mut self) {
        self.current = Some(PresentationMode::Expanded);
    }

    /// Record a minimize.
    pub fn minimize(&mut self) {
        self.current = Some(PresentationMode::Minimized);
    }

    /// Resolve `current ?? default`, save it and return it.
    pub fn restore_saved(&mut self) -> PresentationMode {
        let mode = self.effective();
        self.current = Some(mode);
        mode
    }

    /// Seed the saved slot from the default if it is empty. Used on allocation.
    pub fn seed(&mut self) -> PresentationMode {
        *self.current.get_or_insert(self.default)
    }

    /// Clear the saved slot unless the detach retains the overlay.
    pub fn clear_on_detach(&mut self, retain: bool) {
        if !retain {
            self.current = None;
        }
    }
}

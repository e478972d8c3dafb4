//! Message types for the controller actor.
//!
//! Every request carries a `oneshot` reply channel, so a handle call returns
//! only after the actor has processed it.

use crate::errors::OverlayError;
use crate::scheduler::SurfacePhase;
use common::events::DomainEvent;
use common::types::{Participant, PresentationMode, StreamMap};
use tokio::sync::oneshot;

/// Messages sent to `OverlayControllerActor`.
#[derive(Debug)]
pub enum ControllerMessage {
    /// Deliver a domain event directly, as if it came from the subscription.
    Dispatch {
        event: DomainEvent,
        respond_to: oneshot::Sender<Result<(), OverlayError>>,
    },

    /// The host window came to the foreground.
    HostResumed {
        respond_to: oneshot::Sender<Result<(), OverlayError>>,
    },

    /// The host window went to the background.
    HostPaused {
        respond_to: oneshot::Sender<Result<(), OverlayError>>,
    },

    /// Toggle the overlay on or off.
    SetEnabled {
        enabled: bool,
        respond_to: oneshot::Sender<Result<(), OverlayError>>,
    },

    /// Change the default presentation.
    SetDefaultPresentation {
        mode: PresentationMode,
        respond_to: oneshot::Sender<Result<(), OverlayError>>,
    },

    /// Change the retention policy.
    SetRetainedOnLeave {
        retained: bool,
        respond_to: oneshot::Sender<Result<(), OverlayError>>,
    },

    /// The host resized or re-laid out the overlay surface.
    SurfaceResized {
        respond_to: oneshot::Sender<Result<(), OverlayError>>,
    },

    /// Close and release the overlay regardless of the retention policy.
    CloseOverlay {
        respond_to: oneshot::Sender<Result<(), OverlayError>>,
    },

    /// Get a snapshot of the controller state (for debugging/tests).
    GetState {
        respond_to: oneshot::Sender<ControllerSnapshot>,
    },
}

/// Overlay lifecycle as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayLifecycle {
    /// No overlay content.
    Uninitialized,
    /// Content allocated, not on screen.
    InitializedHidden,
    /// Content attached to the host.
    Showing,
    /// Content kept allocated across a conference end or host pause.
    RetainedHidden,
}

impl OverlayLifecycle {
    /// Returns the lifecycle state as a string for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            OverlayLifecycle::Uninitialized => "uninitialized",
            OverlayLifecycle::InitializedHidden => "initialized_hidden",
            OverlayLifecycle::Showing => "showing",
            OverlayLifecycle::RetainedHidden => "retained_hidden",
        }
    }
}

/// Why a detach was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachReason {
    /// A domain event (conference over).
    Event,
    /// The host went to the background.
    Hud,
    /// An explicit request (disable, close).
    Explicit,
}

impl DetachReason {
    /// Returns the reason as a string for metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DetachReason::Event => "event",
            DetachReason::Hud => "hud",
            DetachReason::Explicit => "explicit",
        }
    }
}

/// Point-in-time view of the controller state.
#[derive(Debug, Clone)]
pub struct ControllerSnapshot {
    pub controller_id: String,
    pub lifecycle: OverlayLifecycle,
    pub enabled: bool,
    pub subscribed: bool,
    pub retained_on_leave: bool,
    pub has_overlay: bool,
    pub roster: Vec<Participant>,
    pub camera_streams: StreamMap,
    pub screen_share_streams: StreamMap,
    pub presentation_current: Option<PresentationMode>,
    pub presentation_default: PresentationMode,
    pub phase: SurfacePhase,
    pub attach_count: u64,
    pub aborted_attach_count: u64,
    pub detach_count: u64,
    pub recording: bool,
    pub conference_active: bool,
}

impl ControllerSnapshot {
    /// Roster ids in order.
    #[must_use]
    pub fn roster_ids(&self) -> Vec<&str> {
        self.roster.iter().map(|p| p.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(DetachReason::Event.as_str(), "event");
        assert_eq!(DetachReason::Hud.as_str(), "hud");
        assert_eq!(DetachReason::Explicit.as_str(), "explicit");
        assert_eq!(OverlayLifecycle::RetainedHidden.as_str(), "retained_hidden");
    }
}

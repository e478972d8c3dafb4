//! Capabilities the controller consumes from its surroundings.
//!
//! Every collaborator is injected into `OverlayControllerActor::spawn` as an
//! `Arc<dyn Trait>`. Calls are synchronous: they run on the controller task and
//! must not block. The controller never inspects the overlay surface beyond the
//! attach-state queries below.

use crate::errors::OverlayError;
use common::events::DomainEvent;
use common::types::{Participant, ParticipantType, PresentationMode, StreamKind, StreamMap};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::error;

/// Default capacity of an `EventBus`.
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 1024;

/// Source of conference domain events.
///
/// Delivery may duplicate events and does not order them relative to each
/// other. Unsubscribing is dropping the receiver.
pub trait EventSource: Send + Sync {
    /// Open a new subscription.
    fn subscribe(&self) -> broadcast::Receiver<DomainEvent>;
}

/// Broadcast-backed `EventSource`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Returns the number of subscribers that will see it
    /// (zero when nobody is subscribed, which is not an error).
    pub fn publish(&self, event: DomainEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Current number of subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUS_CAPACITY)
    }
}

impl EventSource for EventBus {
    fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

/// Read access to the backend's authoritative conference state.
pub trait ConferenceSnapshot: Send + Sync {
    /// Participants the backend currently knows about.
    fn roster(&self) -> Vec<Participant>;

    /// Participants from the latest invitation list (back-fill source).
    fn invited_participants(&self) -> Vec<Participant>;

    /// Complete stream mapping for `kind`.
    fn stream_mapping(&self, kind: StreamKind) -> StreamMap;

    /// Id of the live conference, if any.
    fn current_conference_id(&self) -> Option<String>;

    /// Whether a conference is live.
    fn is_live(&self) -> bool;

    /// Id of the local user, if known.
    fn local_participant_id(&self) -> Option<String>;

    /// How the local user takes part in the conference.
    fn local_participant_type(&self) -> ParticipantType;
}

/// Opaque reference to the host's root surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub String);

impl SurfaceId {
    /// Create a new surface id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of the host window the overlay floats above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostLifecycle {
    /// In the foreground.
    Resumed,
    /// In the background, expected to come back.
    Paused,
    /// Going away for good.
    Finishing,
}

impl HostLifecycle {
    /// Returns the lifecycle state as a string for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            HostLifecycle::Resumed => "resumed",
            HostLifecycle::Paused => "paused",
            HostLifecycle::Finishing => "finishing",
        }
    }
}

/// The host's view hierarchy.
pub trait HostSurfaceProvider: Send + Sync {
    /// Root surface to attach under, if the host has one right now.
    fn root_surface(&self) -> Option<SurfaceId>;

    /// Host lifecycle state.
    fn lifecycle_state(&self) -> HostLifecycle;

    /// Attach the overlay under `surface`.
    fn attach_overlay(&self, surface: &SurfaceId) -> Result<(), OverlayError>;

    /// Remove the overlay from the host. Best-effort; a missing overlay is fine.
    fn detach_overlay(&self);

    /// Whether the host currently shows the overlay.
    fn is_overlay_attached(&self) -> bool;
}

/// The overlay content. All notifications carry complete snapshots.
pub trait OverlayView: Send {
    /// The overlay became visible.
    fn on_resume(&mut self);
    /// The overlay was hidden.
    fn on_stop(&mut self);
    /// The overlay is being torn down for good.
    fn on_destroy(&mut self);

    /// Full roster snapshot.
    fn on_participants_updated(&mut self, participants: &[Participant]);
    /// A participant joined.
    fn on_participant_joined(&mut self, participant: &Participant);
    /// A participant changed.
    fn on_participant_updated(&mut self, participant: &Participant);
    /// A participant left.
    fn on_participant_left(&mut self, participant: &Participant);
    /// A participant declined the call.
    fn on_participant_declined(&mut self, participant_id: &str);
    /// The backend's participant list for the conference.
    fn on_conference_updated(&mut self, participants: &[Participant]);

    /// Full stream mapping for `kind`.
    fn on_streams_updated(&mut self, kind: StreamKind, streams: &StreamMap);

    /// Conference creation started.
    fn on_conference_creating(&mut self);
    /// About to join `conference_id`.
    fn on_conference_joining(&mut self, conference_id: &str);
    /// Joined `conference_id`.
    fn on_conference_joined(&mut self, conference_id: &str);
    /// `conference_id` was created.
    fn on_conference_created(&mut self, conference_id: &str);
    /// The local user left.
    fn on_conference_left(&mut self);
    /// The conference is gone.
    fn on_conference_destroyed(&mut self);

    /// Recording was toggled.
    fn on_recording_status(&mut self, recording: bool);

    /// Switch to the expanded layout.
    fn expand(&mut self);
    /// Switch to the minimized layout.
    fn minimize(&mut self);
}

/// Allocates overlay content.
pub trait OverlayFactory: Send + Sync {
    /// Create overlay content starting in `initial`.
    fn create(&self, initial: PresentationMode) -> Box<dyn OverlayView>;
}

/// Audio cues and routing around a call.
pub trait AudioCues: Send + Sync {
    /// Start the outgoing-call ring.
    fn play_ring(&self);
    /// Stop any ringing cue.
    fn stop(&self);
    /// Acquire audio focus for the call.
    fn request_focus(&self) -> Result<(), OverlayError>;
    /// Route call audio to the loudspeaker.
    fn route_to_speaker(&self) -> Result<(), OverlayError>;
    /// Check the current output route is usable.
    fn check_output_route(&self) -> Result<(), OverlayError>;
}

/// External exception sink for collaborator failures.
pub trait ErrorSink: Send + Sync {
    /// Report a failure. Must not panic.
    fn report(&self, error: &OverlayError);
}

/// `ErrorSink` that logs at `error` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, err: &OverlayError) {
        error!(
            target: "oc.actor.controller",
            category = err.category(),
            error = %err,
            "Collaborator failure"
        );
    }
}

/// Everything the controller actor talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub events: Arc<dyn EventSource>,
    pub conference: Arc<dyn ConferenceSnapshot>,
    pub host: Arc<dyn HostSurfaceProvider>,
    pub overlays: Arc<dyn OverlayFactory>,
    pub audio: Arc<dyn AudioCues>,
    pub errors: Arc<dyn ErrorSink>,
}

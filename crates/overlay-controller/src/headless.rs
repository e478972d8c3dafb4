//! Headless collaborators.
//!
//! Implementations of every collaborator trait that only log what they are
//! asked to do, plus `InMemoryConference`, a settable conference snapshot. The
//! binary runs the controller against these; tests build on them too.

use crate::collaborators::{
    AudioCues, ConferenceSnapshot, HostLifecycle, HostSurfaceProvider, OverlayFactory, OverlayView,
    SurfaceId,
};
use crate::errors::OverlayError;
use common::types::{Participant, ParticipantType, PresentationMode, StreamKind, StreamMap};
use serde::Deserialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ----------------------------------------------------------------------------
// Conference snapshot
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct ConferenceState {
    conference_id: Option<String>,
    live: bool,
    roster: Vec<Participant>,
    invited: Vec<Participant>,
    camera: StreamMap,
    screen_share: StreamMap,
    local_participant_id: Option<String>,
    local_participant_type: ParticipantType,
}

/// Partial update of an `InMemoryConference`. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConferenceUpdate {
    pub conference_id: Option<String>,
    pub live: Option<bool>,
    pub roster: Option<Vec<Participant>>,
    pub invited: Option<Vec<Participant>>,
    pub camera: Option<StreamMap>,
    pub screen_share: Option<StreamMap>,
    pub local_participant_id: Option<String>,
    pub local_participant_type: Option<ParticipantType>,
}

/// Settable `ConferenceSnapshot`.
#[derive(Debug, Default)]
pub struct InMemoryConference {
    state: Mutex<ConferenceState>,
}

impl InMemoryConference {
    /// Create an idle conference (not live, empty roster).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `conference_id` as live.
    pub fn go_live(&self, conference_id: impl Into<String>) {
        let mut state = lock(&self.state);
        state.conference_id = Some(conference_id.into());
        state.live = true;
    }

    /// Mark the conference as over.
    pub fn end(&self) {
        lock(&self.state).live = false;
    }

    /// Replace the roster.
    pub fn set_roster(&self, roster: Vec<Participant>) {
        lock(&self.state).roster = roster;
    }

    /// Replace the invitation list.
    pub fn set_invited(&self, invited: Vec<Participant>) {
        lock(&self.state).invited = invited;
    }

    /// Replace the stream mapping for `kind`.
    pub fn set_streams(&self, kind: StreamKind, mapping: StreamMap) {
        let mut state = lock(&self.state);
        match kind {
            StreamKind::Camera => state.camera = mapping,
            StreamKind::ScreenShare => state.screen_share = mapping,
        }
    }

    /// Set the local user.
    pub fn set_local_participant(&self, id: impl Into<String>, participant_type: ParticipantType) {
        let mut state = lock(&self.state);
        state.local_participant_id = Some(id.into());
        state.local_participant_type = participant_type;
    }

    /// Apply a partial update.
    pub fn apply(&self, update: ConferenceUpdate) {
        let mut state = lock(&self.state);
        if let Some(id) = update.conference_id {
            state.conference_id = Some(id);
        }
        if let Some(live) = update.live {
            state.live = live;
        }
        if let Some(roster) = update.roster {
            state.roster = roster;
        }
        if let Some(invited) = update.invited {
            state.invited = invited;
        }
        if let Some(camera) = update.camera {
            state.camera = camera;
        }
        if let Some(screen_share) = update.screen_share {
            state.screen_share = screen_share;
        }
        if let Some(local_id) = update.local_participant_id {
            state.local_participant_id = Some(local_id);
        }
        if let Some(local_type) = update.local_participant_type {
            state.local_participant_type = local_type;
        }
    }
}

impl ConferenceSnapshot for InMemoryConference {
    fn roster(&self) -> Vec<Participant> {
        lock(&self.state).roster.clone()
    }

    fn invited_participants(&self) -> Vec<Participant> {
        lock(&self.state).invited.clone()
    }

    fn stream_mapping(&self, kind: StreamKind) -> StreamMap {
        let state = lock(&self.state);
        match kind {
            StreamKind::Camera => state.camera.clone(),
            StreamKind::ScreenShare => state.screen_share.clone(),
        }
    }

    fn current_conference_id(&self) -> Option<String> {
        lock(&self.state).conference_id.clone()
    }

    fn is_live(&self) -> bool {
        lock(&self.state).live
    }

    fn local_participant_id(&self) -> Option<String> {
        lock(&self.state).local_participant_id.clone()
    }

    fn local_participant_type(&self) -> ParticipantType {
        lock(&self.state).local_participant_type
    }
}

// ----------------------------------------------------------------------------
// Host
// ----------------------------------------------------------------------------

#[derive(Debug)]
struct HostState {
    lifecycle: HostLifecycle,
    attached: bool,
}

/// Host with a single always-present root surface.
#[derive(Debug)]
pub struct HeadlessHost {
    root: SurfaceId,
    state: Mutex<HostState>,
}

impl HeadlessHost {
    /// Create a resumed host whose root surface is `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: SurfaceId::new(root),
            state: Mutex::new(HostState {
                lifecycle: HostLifecycle::Resumed,
                attached: false,
            }),
        }
    }

    /// Change the reported lifecycle state.
    pub fn set_lifecycle(&self, lifecycle: HostLifecycle) {
        lock(&self.state).lifecycle = lifecycle;
    }
}

impl HostSurfaceProvider for HeadlessHost {
    fn root_surface(&self) -> Option<SurfaceId> {
        match lock(&self.state).lifecycle {
            HostLifecycle::Finishing => None,
            HostLifecycle::Resumed | HostLifecycle::Paused => Some(self.root.clone()),
        }
    }

    fn lifecycle_state(&self) -> HostLifecycle {
        lock(&self.state).lifecycle
    }

    fn attach_overlay(&self, surface: &SurfaceId) -> Result<(), OverlayError> {
        info!(target: "oc.host", surface = %surface, "Overlay attached");
        lock(&self.state).attached = true;
        Ok(())
    }

    fn detach_overlay(&self) {
        let mut state = lock(&self.state);
        if state.attached {
            info!(target: "oc.host", "Overlay detached");
        }
        state.attached = false;
    }

    fn is_overlay_attached(&self) -> bool {
        lock(&self.state).attached
    }
}

// ----------------------------------------------------------------------------
// Overlay
// ----------------------------------------------------------------------------

/// Factory for `LoggingOverlayView`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingOverlayFactory;

impl OverlayFactory for LoggingOverlayFactory {
    fn create(&self, initial: PresentationMode) -> Box<dyn OverlayView> {
        info!(target: "oc.overlay", initial = initial.as_str(), "Overlay content created");
        Box::new(LoggingOverlayView { mode: initial })
    }
}

/// Overlay content that logs every callback.
#[derive(Debug)]
pub struct LoggingOverlayView {
    mode: PresentationMode,
}

impl OverlayView for LoggingOverlayView {
    fn on_resume(&mut self) {
        debug!(target: "oc.overlay", mode = self.mode.as_str(), "on_resume");
    }

    fn on_stop(&mut self) {
        debug!(target: "oc.overlay", "on_stop");
    }

    fn on_destroy(&mut self) {
        debug!(target: "oc.overlay", "on_destroy");
    }

    fn on_participants_updated(&mut self, participants: &[Participant]) {
        debug!(target: "oc.overlay", count = participants.len(), "on_participants_updated");
    }

    fn on_participant_joined(&mut self, participant: &Participant) {
        debug!(target: "oc.overlay", participant_id = %participant.id, "on_participant_joined");
    }

    fn on_participant_updated(&mut self, participant: &Participant) {
        debug!(
            target: "oc.overlay",
            participant_id = %participant.id,
            status = participant.status.as_str(),
            "on_participant_updated"
        );
    }

    fn on_participant_left(&mut self, participant: &Participant) {
        debug!(target: "oc.overlay", participant_id = %participant.id, "on_participant_left");
    }

    fn on_participant_declined(&mut self, participant_id: &str) {
        debug!(target: "oc.overlay", participant_id = %participant_id, "on_participant_declined");
    }

    fn on_conference_updated(&mut self, participants: &[Participant]) {
        debug!(target: "oc.overlay", count = participants.len(), "on_conference_updated");
    }

    fn on_streams_updated(&mut self, kind: StreamKind, streams: &StreamMap) {
        debug!(
            target: "oc.overlay",
            kind = kind.as_str(),
            count = streams.len(),
            "on_streams_updated"
        );
    }

    fn on_conference_creating(&mut self) {
        debug!(target: "oc.overlay", "on_conference_creating");
    }

    fn on_conference_joining(&mut self, conference_id: &str) {
        debug!(target: "oc.overlay", conference_id = %conference_id, "on_conference_joining");
    }

    fn on_conference_joined(&mut self, conference_id: &str) {
        debug!(target: "oc.overlay", conference_id = %conference_id, "on_conference_joined");
    }

    fn on_conference_created(&mut self, conference_id: &str) {
        debug!(target: "oc.overlay", conference_id = %conference_id, "on_conference_created");
    }

    fn on_conference_left(&mut self) {
        debug!(target: "oc.overlay", "on_conference_left");
    }

    fn on_conference_destroyed(&mut self) {
        debug!(target: "oc.overlay", "on_conference_destroyed");
    }

    fn on_recording_status(&mut self, recording: bool) {
        debug!(target: "oc.overlay", recording, "on_recording_status");
    }

    fn expand(&mut self) {
        self.mode = PresentationMode::Expanded;
        debug!(target: "oc.overlay", "expand");
    }

    fn minimize(&mut self) {
        self.mode = PresentationMode::Minimized;
        debug!(target: "oc.overlay", "minimize");
    }
}

// ----------------------------------------------------------------------------
// Audio
// ----------------------------------------------------------------------------

/// Audio cues that only log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingAudioCues;

impl AudioCues for LoggingAudioCues {
    fn play_ring(&self) {
        debug!(target: "oc.audio", "play_ring");
    }

    fn stop(&self) {
        debug!(target: "oc.audio", "stop");
    }

    fn request_focus(&self) -> Result<(), OverlayError> {
        debug!(target: "oc.audio", "request_focus");
        Ok(())
    }

    fn route_to_speaker(&self) -> Result<(), OverlayError> {
        debug!(target: "oc.audio", "route_to_speaker");
        Ok(())
    }

    fn check_output_route(&self) -> Result<(), OverlayError> {
        debug!(target: "oc.audio", "check_output_route");
        Ok(())
    }
}

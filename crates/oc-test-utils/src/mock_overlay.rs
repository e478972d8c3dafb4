//! Recording overlay factory and view.
//!
//! Every view created by a `RecordingOverlayFactory` appends to the factory's
//! shared call log, so a test holding the factory sees calls across overlay
//! re-allocations.
//!
//! # Example
//!
//! ```rust,ignore
//! use oc_test_utils::{RecordingOverlayFactory, ViewCall};
//!
//! let overlays = RecordingOverlayFactory::new();
//! // ... hand `Arc::new(overlays.clone())` to the controller ...
//! assert_eq!(overlays.count(|c| matches!(c, ViewCall::Resume)), 1);
//! ```

use common::types::{Participant, PresentationMode, StreamKind, StreamMap};
use overlay_controller::collaborators::{OverlayFactory, OverlayView};
use std::sync::{Arc, Mutex};

/// One call made to an overlay view (or the factory).
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCall {
    Created(PresentationMode),
    Resume,
    Stop,
    Destroy,
    /// Full roster push, as participant ids in order.
    ParticipantsUpdated(Vec<String>),
    ParticipantJoined(String),
    ParticipantUpdated(String),
    ParticipantLeft(String),
    ParticipantDeclined(String),
    /// Backend participant list, as ids in order.
    ConferenceUpdated(Vec<String>),
    StreamsUpdated(StreamKind, StreamMap),
    ConferenceCreating,
    ConferenceJoining(String),
    ConferenceJoined(String),
    ConferenceCreated(String),
    ConferenceLeft,
    ConferenceDestroyed,
    RecordingStatus(bool),
    Expand,
    Minimize,
}

type CallLog = Arc<Mutex<Vec<ViewCall>>>;

/// Overlay factory that records every view callback.
#[derive(Debug, Clone, Default)]
pub struct RecordingOverlayFactory {
    calls: CallLog,
}

impl RecordingOverlayFactory {
    /// Create a factory with an empty call log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<ViewCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Forget all recorded calls.
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Number of recorded calls matching `pred`.
    pub fn count<F>(&self, pred: F) -> usize
    where
        F: Fn(&ViewCall) -> bool,
    {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    /// Number of overlay contents created.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.count(|c| matches!(c, ViewCall::Created(_)))
    }

    /// Every full roster push, oldest first.
    #[must_use]
    pub fn roster_pushes(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                ViewCall::ParticipantsUpdated(ids) => Some(ids.clone()),
                _ => None,
            })
            .collect()
    }

    /// The most recent full roster push.
    #[must_use]
    pub fn last_roster(&self) -> Option<Vec<String>> {
        self.roster_pushes().pop()
    }

    /// The most recent stream push for `kind`.
    #[must_use]
    pub fn last_streams(&self, kind: StreamKind) -> Option<StreamMap> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|c| match c {
                ViewCall::StreamsUpdated(k, map) if *k == kind => Some(map.clone()),
                _ => None,
            })
    }
}

impl OverlayFactory for RecordingOverlayFactory {
    fn create(&self, initial: PresentationMode) -> Box<dyn OverlayView> {
        self.calls.lock().unwrap().push(ViewCall::Created(initial));
        Box::new(RecordingOverlayView {
            calls: Arc::clone(&self.calls),
        })
    }
}

/// View that appends each callback to the shared log.
#[derive(Debug)]
pub struct RecordingOverlayView {
    calls: CallLog,
}

impl RecordingOverlayView {
    fn record(&self, call: ViewCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl OverlayView for RecordingOverlayView {
    fn on_resume(&mut self) {
        self.record(ViewCall::Resume);
    }

    fn on_stop(&mut self) {
        self.record(ViewCall::Stop);
    }

    fn on_destroy(&mut self) {
        self.record(ViewCall::Destroy);
    }

    fn on_participants_updated(&mut self, participants: &[Participant]) {
        self.record(ViewCall::ParticipantsUpdated(
            participants.iter().map(|p| p.id.clone()).collect(),
        ));
    }

    fn on_participant_joined(&mut self, participant: &Participant) {
        self.record(ViewCall::ParticipantJoined(participant.id.clone()));
    }

    fn on_participant_updated(&mut self, participant: &Participant) {
        self.record(ViewCall::ParticipantUpdated(participant.id.clone()));
    }

    fn on_participant_left(&mut self, participant: &Participant) {
        self.record(ViewCall::ParticipantLeft(participant.id.clone()));
    }

    fn on_participant_declined(&mut self, participant_id: &str) {
        self.record(ViewCall::ParticipantDeclined(participant_id.to_string()));
    }

    fn on_conference_updated(&mut self, participants: &[Participant]) {
        self.record(ViewCall::ConferenceUpdated(
            participants.iter().map(|p| p.id.clone()).collect(),
        ));
    }

    fn on_streams_updated(&mut self, kind: StreamKind, streams: &StreamMap) {
        self.record(ViewCall::StreamsUpdated(kind, streams.clone()));
    }

    fn on_conference_creating(&mut self) {
        self.record(ViewCall::ConferenceCreating);
    }

    fn on_conference_joining(&mut self, conference_id: &str) {
        self.record(ViewCall::ConferenceJoining(conference_id.to_string()));
    }

    fn on_conference_joined(&mut self, conference_id: &str) {
        self.record(ViewCall::ConferenceJoined(conference_id.to_string()));
    }

    fn on_conference_created(&mut self, conference_id: &str) {
        self.record(ViewCall::ConferenceCreated(conference_id.to_string()));
    }

    fn on_conference_left(&mut self) {
        self.record(ViewCall::ConferenceLeft);
    }

    fn on_conference_destroyed(&mut self) {
        self.record(ViewCall::ConferenceDestroyed);
    }

    fn on_recording_status(&mut self, recording: bool) {
        self.record(ViewCall::RecordingStatus(recording));
    }

    fn expand(&mut self) {
        self.record(ViewCall::Expand);
    }

    fn minimize(&mut self) {
        self.record(ViewCall::Minimize);
    }
}

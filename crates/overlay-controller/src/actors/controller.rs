//! `OverlayControllerActor` - owns the overlay and everything it displays.
//!
//! One task owns the roster, the stream registry, the presentation state, the
//! attach scheduler and the overlay content. Its inputs are:
//! - the domain event subscription (while enabled)
//! - the mailbox fed by `OverlayControllerHandle`
//! - the scheduler's pending attach deadline
//! - a loopback queue for events the controller posts to itself
//!
//! Handlers run to completion one at a time, so none of the state needs
//! locking. The loop is `biased`: cancellation first, then a due attach, then
//! loopback events, then domain events, then mailbox requests.
//!
//! # Retention
//!
//! A detach requested with `release = true` only tears the overlay down when
//! `reason != Event || !retained_on_leave || !enabled`. A retained
//! termination hides the overlay and keeps its content. The finished
//! conference's roster and streams are dropped either way, and further
//! terminations are ignored until the next conference starts.

use super::messages::{ControllerMessage, ControllerSnapshot, DetachReason, OverlayLifecycle};
use super::metrics::MailboxMonitor;
use crate::collaborators::{Collaborators, HostLifecycle, OverlayView};
use crate::config::ControllerConfig;
use crate::errors::OverlayError;
use crate::observability;
use crate::presentation::PresentationState;
use crate::roster::{Roster, UpsertOutcome};
use crate::scheduler::{AttachRequest, AttachScheduler, DetachRequest};
use crate::streams::StreamRegistry;

use common::events::{DomainEvent, TerminationCause};
use common::types::{Participant, ParticipantType, PresentationMode, StreamKind};
use std::collections::VecDeque;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Handle to the `OverlayControllerActor`.
#[derive(Clone, Debug)]
pub struct OverlayControllerHandle {
    sender: mpsc::Sender<ControllerMessage>,
    cancel_token: CancellationToken,
    controller_id: String,
}

impl OverlayControllerHandle {
    /// Get the controller ID.
    #[must_use]
    pub fn controller_id(&self) -> &str {
        &self.controller_id
    }

    /// Deliver a domain event directly. Ignored while the controller is disabled.
    pub async fn dispatch(&self, event: DomainEvent) -> Result<(), OverlayError> {
        self.request(|respond_to| ControllerMessage::Dispatch { event, respond_to })
            .await
    }

    /// The host window came to the foreground.
    pub async fn host_resumed(&self) -> Result<(), OverlayError> {
        self.request(|respond_to| ControllerMessage::HostResumed { respond_to })
            .await
    }

    /// The host window went to the background.
    pub async fn host_paused(&self) -> Result<(), OverlayError> {
        self.request(|respond_to| ControllerMessage::HostPaused { respond_to })
            .await
    }

    /// Enable or disable the overlay.
    pub async fn set_enabled(&self, enabled: bool) -> Result<(), OverlayError> {
        self.request(|respond_to| ControllerMessage::SetEnabled {
            enabled,
            respond_to,
        })
        .await
    }

    /// Change the default presentation. Applied immediately if content exists.
    pub async fn set_default_presentation(
        &self,
        mode: PresentationMode,
    ) -> Result<(), OverlayError> {
        self.request(|respond_to| ControllerMessage::SetDefaultPresentation { mode, respond_to })
            .await
    }

    /// Keep (or stop keeping) the overlay allocated when the conference ends.
    pub async fn set_retained_on_leave(&self, retained: bool) -> Result<(), OverlayError> {
        self.request(|respond_to| ControllerMessage::SetRetainedOnLeave {
            retained,
            respond_to,
        })
        .await
    }

    /// The host resized the overlay surface.
    pub async fn surface_resized(&self) -> Result<(), OverlayError> {
        self.request(|respond_to| ControllerMessage::SurfaceResized { respond_to })
            .await
    }

    /// Close and release the overlay.
    pub async fn close_overlay(&self) -> Result<(), OverlayError> {
        self.request(|respond_to| ControllerMessage::CloseOverlay { respond_to })
            .await
    }

    /// Get a snapshot of the controller state.
    pub async fn get_state(&self) -> Result<ControllerSnapshot, OverlayError> {
        if self.cancel_token.is_cancelled() {
            return Err(OverlayError::ShuttingDown);
        }

        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ControllerMessage::GetState { respond_to: tx })
            .await
            .map_err(|e| OverlayError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| OverlayError::Internal(format!("response receive failed: {e}")))
    }

    /// Cancel the controller. The overlay is released on the way out.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the controller is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    async fn request<F>(&self, build: F) -> Result<(), OverlayError>
    where
        F: FnOnce(oneshot::Sender<Result<(), OverlayError>>) -> ControllerMessage,
    {
        if self.cancel_token.is_cancelled() {
            return Err(OverlayError::ShuttingDown);
        }

        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|e| OverlayError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| OverlayError::Internal(format!("response receive failed: {e}")))?
    }
}

/// Outcome of one attach execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttachOutcome {
    Attached,
    Aborted,
    Failed,
}

impl AttachOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            AttachOutcome::Attached => "attached",
            AttachOutcome::Aborted => "aborted",
            AttachOutcome::Failed => "failed",
        }
    }
}

/// The overlay lifecycle controller actor.
pub struct OverlayControllerActor {
    controller_id: String,
    config: ControllerConfig,
    enabled: bool,
    retained_on_leave: bool,
    collaborators: Collaborators,
    receiver: mpsc::Receiver<ControllerMessage>,
    subscription: Option<broadcast::Receiver<DomainEvent>>,
    loopback: VecDeque<DomainEvent>,
    cancel_token: CancellationToken,
    overlay: Option<Box<dyn OverlayView>>,
    lifecycle: OverlayLifecycle,
    roster: Roster,
    streams: StreamRegistry,
    presentation: PresentationState,
    scheduler: AttachScheduler,
    recording: bool,
    conference_active: bool,
    mailbox: MailboxMonitor,
}

impl OverlayControllerActor {
    /// Spawn the controller.
    ///
    /// When `config.enabled` is set the event subscription is opened before this
    /// returns, so events published right after `spawn` are not missed.
    pub fn spawn(
        config: ControllerConfig,
        collaborators: Collaborators,
        cancel_token: CancellationToken,
    ) -> (OverlayControllerHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.mailbox_capacity.max(1));
        let controller_id = config.controller_id.clone();

        let subscription = config
            .enabled
            .then(|| collaborators.events.subscribe());

        let actor = Self {
            controller_id: controller_id.clone(),
            enabled: config.enabled,
            retained_on_leave: config.retained_on_leave,
            presentation: PresentationState::new(config.default_presentation),
            config,
            collaborators,
            receiver,
            subscription,
            loopback: VecDeque::new(),
            cancel_token: cancel_token.clone(),
            overlay: None,
            lifecycle: OverlayLifecycle::Uninitialized,
            roster: Roster::new(),
            streams: StreamRegistry::new(),
            scheduler: AttachScheduler::new(),
            recording: false,
            conference_active: false,
            mailbox: MailboxMonitor::new(&controller_id),
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = OverlayControllerHandle {
            sender,
            cancel_token,
            controller_id,
        };

        (handle, task_handle)
    }

    /// Run the actor loop.
    #[instrument(skip_all, name = "oc.actor.controller", fields(controller_id = %self.controller_id))]
    async fn run(mut self) {
        info!(
            target: "oc.actor.controller",
            controller_id = %self.controller_id,
            enabled = self.enabled,
            retained_on_leave = self.retained_on_leave,
            "OverlayControllerActor started"
        );

        loop {
            let deadline = self.scheduler.deadline();

            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "oc.actor.controller",
                        controller_id = %self.controller_id,
                        "OverlayControllerActor received cancellation signal"
                    );
                    break;
                }

                () = wait_until(deadline) => {
                    self.execute_due_attach();
                }

                () = std::future::ready(()), if !self.loopback.is_empty() => {
                    if let Some(event) = self.loopback.pop_front() {
                        self.handle_event(event);
                    }
                }

                event = recv_event(&mut self.subscription) => {
                    match event {
                        Ok(event) => self.handle_event(event),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(
                                target: "oc.actor.controller",
                                controller_id = %self.controller_id,
                                skipped,
                                "Event subscription lagged, continuing with next event"
                            );
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!(
                                target: "oc.actor.controller",
                                controller_id = %self.controller_id,
                                "Event source closed, dropping subscription"
                            );
                            self.subscription = None;
                        }
                    }
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.handle_message(message);
                            self.mailbox.record_dequeue(self.receiver.len());
                        }
                        None => {
                            info!(
                                target: "oc.actor.controller",
                                controller_id = %self.controller_id,
                                "OverlayControllerActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        self.shutdown();

        info!(
            target: "oc.actor.controller",
            controller_id = %self.controller_id,
            attaches = self.scheduler.attach_count(),
            detaches = self.scheduler.detach_count(),
            messages_processed = self.mailbox.messages_processed(),
            "OverlayControllerActor stopped"
        );
    }

    fn shutdown(&mut self) {
        self.subscription = None;
        self.loopback.clear();
        self.request_detach(true, DetachReason::Explicit);
    }

    /// Handle a single mailbox message.
    fn handle_message(&mut self, message: ControllerMessage) {
        match message {
            ControllerMessage::Dispatch { event, respond_to } => {
                if self.enabled {
                    self.handle_event(event);
                } else {
                    debug!(
                        target: "oc.actor.controller",
                        event = event.name(),
                        "Controller disabled, ignoring dispatched event"
                    );
                }
                let _ = respond_to.send(Ok(()));
            }

            ControllerMessage::HostResumed { respond_to } => {
                self.on_host_resumed();
                let _ = respond_to.send(Ok(()));
            }

            ControllerMessage::HostPaused { respond_to } => {
                self.on_host_paused();
                let _ = respond_to.send(Ok(()));
            }

            ControllerMessage::SetEnabled {
                enabled,
                respond_to,
            } => {
                self.set_enabled(enabled);
                let _ = respond_to.send(Ok(()));
            }

            ControllerMessage::SetDefaultPresentation { mode, respond_to } => {
                self.set_default_presentation(mode);
                let _ = respond_to.send(Ok(()));
            }

            ControllerMessage::SetRetainedOnLeave {
                retained,
                respond_to,
            } => {
                self.retained_on_leave = retained;
                let _ = respond_to.send(Ok(()));
            }

            ControllerMessage::SurfaceResized { respond_to } => {
                self.on_surface_resized();
                let _ = respond_to.send(Ok(()));
            }

            ControllerMessage::CloseOverlay { respond_to } => {
                self.request_detach(true, DetachReason::Explicit);
                let _ = respond_to.send(Ok(()));
            }

            ControllerMessage::GetState { respond_to } => {
                let _ = respond_to.send(self.snapshot());
            }
        }
    }

    // ------------------------------------------------------------------------
    // Domain events
    // ------------------------------------------------------------------------

    fn passes_filter(&self, event: &DomainEvent) -> bool {
        match event.conference_ref() {
            Some((conference_id, alias)) => self.config.filter.accepts_ref(conference_id, alias),
            None => true,
        }
    }

    fn handle_event(&mut self, event: DomainEvent) {
        let class = event.class();

        if !self.passes_filter(&event) {
            observability::record_event_filtered();
            debug!(
                target: "oc.actor.controller",
                event = event.name(),
                "Event filtered out by conference filter"
            );
            return;
        }

        let started = std::time::Instant::now();
        let termination = event.termination_cause();
        debug!(target: "oc.actor.controller", event = event.name(), "Handling event");

        match event {
            DomainEvent::ConferenceCreating { .. } => self.on_conference_creating(),
            DomainEvent::ConferencePreJoined { conference_id } => {
                self.on_conference_pre_joined(&conference_id);
            }
            DomainEvent::ConferenceJoined { conference_id, .. } => {
                self.on_conference_joined(&conference_id);
            }
            DomainEvent::ConferenceCreated { conference_id, .. } => {
                self.on_conference_created(&conference_id);
            }

            DomainEvent::ParticipantJoined { participant } => self.on_participant_joined(participant),
            DomainEvent::ParticipantUpdated {
                participant,
                screen_share,
            } => self.on_participant_updated(participant, screen_share),
            DomainEvent::ParticipantLeft { participant } => self.on_participant_left(&participant),
            DomainEvent::ParticipantsInvited { participants } => {
                self.on_participants_invited(participants);
            }
            DomainEvent::InvitationReceived { participants } => {
                self.on_invitation_received(participants);
            }
            DomainEvent::ParticipantDeclined { participant_id } => {
                self.on_participant_declined(&participant_id);
            }
            DomainEvent::ConferenceRefreshed { participant } => {
                self.on_conference_refreshed(participant);
            }
            DomainEvent::ConferenceUpdated { participants } => {
                self.on_conference_updated(&participants);
            }

            DomainEvent::ScreenShareStarted { .. } | DomainEvent::ScreenShareStopped { .. } => {
                self.refresh_streams(StreamKind::ScreenShare);
            }
            DomainEvent::MediaStreamUpdated { .. } => self.refresh_streams(StreamKind::Camera),

            DomainEvent::ConferenceLeft
            | DomainEvent::ConferenceLeaveFailed
            | DomainEvent::ConferenceCreateFailed
            | DomainEvent::ConferenceJoinFailed
            | DomainEvent::ConferenceDestroyed { .. }
            | DomainEvent::ConferenceEnded { .. }
            | DomainEvent::ReplayFailed => {
                if let Some(cause) = termination {
                    self.on_termination(cause);
                }
            }

            DomainEvent::RecordingStatusUpdated { recording } => {
                self.recording = recording;
                if let Some(view) = self.overlay.as_mut() {
                    view.on_recording_status(recording);
                }
            }

            DomainEvent::IncomingCall | DomainEvent::MinimizeRequested => {
                self.apply_presentation(PresentationMode::Minimized);
            }
            DomainEvent::ExpandRequested => self.apply_presentation(PresentationMode::Expanded),
            DomainEvent::RestoreSavedPresentation => {
                if self.overlay.is_some() {
                    let mode = self.presentation.restore_saved();
                    self.apply_presentation(mode);
                }
            }
        }

        observability::record_event(class.as_str());
        observability::record_event_latency(class.as_str(), started.elapsed());
        observability::set_roster_size(self.roster.len());
    }

    fn on_conference_creating(&mut self) {
        self.begin_conference();

        if self.collaborators.host.root_surface().is_none() {
            debug!(
                target: "oc.actor.controller",
                "No host surface, ignoring conference creation"
            );
            return;
        }

        self.allocate_overlay();
        self.show_overlay();

        if let Some(view) = self.overlay.as_mut() {
            view.on_conference_creating();
        }
    }

    fn on_conference_pre_joined(&mut self, conference_id: &str) {
        self.begin_conference();
        self.update_ring_cue();

        if self.collaborators.host.root_surface().is_none() {
            debug!(
                target: "oc.actor.controller",
                conference_id = %conference_id,
                "No host surface, ignoring pre-join"
            );
            return;
        }

        self.allocate_overlay();
        self.show_overlay();

        if let Some(view) = self.overlay.as_mut() {
            view.on_conference_joining(conference_id);
        }
    }

    fn on_conference_joined(&mut self, conference_id: &str) {
        self.begin_conference();

        if let Err(e) = self.collaborators.audio.route_to_speaker() {
            self.report(&e);
        }

        self.show_overlay();

        self.roster.merge(self.collaborators.conference.roster());
        self.push_roster();

        if let Some(view) = self.overlay.as_mut() {
            view.on_conference_joined(conference_id);
        }
    }

    fn on_conference_created(&mut self, conference_id: &str) {
        self.begin_conference();
        self.update_ring_cue();
        self.allocate_overlay();
        self.show_overlay();

        if let Some(view) = self.overlay.as_mut() {
            view.on_conference_created(conference_id);
        }
    }

    /// Mark a conference as under way.
    ///
    /// Content retained from an earlier conference is re-synced from the
    /// backend before the new conference uses it.
    fn begin_conference(&mut self) {
        if self.conference_active {
            return;
        }
        self.conference_active = true;

        if self.overlay.is_some() {
            info!(
                target: "oc.actor.controller",
                controller_id = %self.controller_id,
                conference_id = ?self.collaborators.conference.current_conference_id(),
                "Reusing retained overlay for new conference"
            );
            self.resync_from_backend();
        }
    }

    /// Ring for a regular participant, stay silent for a listener.
    fn update_ring_cue(&self) {
        match self.collaborators.conference.local_participant_type() {
            ParticipantType::Normal => self.collaborators.audio.play_ring(),
            ParticipantType::Listener => {
                debug!(
                    target: "oc.actor.controller",
                    "Local participant is a listener, not ringing"
                );
                self.collaborators.audio.stop();
            }
        }
    }

    fn on_participant_joined(&mut self, participant: Participant) {
        let outcome = self.roster.upsert(participant.clone());
        if outcome == UpsertOutcome::Rejected {
            return;
        }
        if outcome == UpsertOutcome::AlreadyPresent {
            self.roster.update(&participant);
        }

        self.check_outgoing_call();
        self.push_roster();
        self.refresh_streams(StreamKind::Camera);

        let Some(current) = self.roster.find_by_id(&participant.id) else {
            return;
        };
        if let Some(view) = self.overlay.as_mut() {
            match outcome {
                UpsertOutcome::Inserted => view.on_participant_joined(current),
                _ => view.on_participant_updated(current),
            }
        }
    }

    fn on_participant_updated(&mut self, participant: Participant, screen_share: bool) {
        let outcome = self.roster.upsert(participant.clone());
        match outcome {
            UpsertOutcome::Rejected => return,
            UpsertOutcome::Inserted => {
                self.check_outgoing_call();
                self.push_roster();
            }
            UpsertOutcome::AlreadyPresent => {
                self.roster.update(&participant);
                self.check_outgoing_call();
            }
        }

        let kind = if screen_share {
            StreamKind::ScreenShare
        } else {
            StreamKind::Camera
        };
        let kind = if self.config.invert_update_stream_kind {
            kind.flipped()
        } else {
            kind
        };
        self.refresh_streams(kind);

        if let (Some(view), Some(current)) =
            (self.overlay.as_mut(), self.roster.find_by_id(&participant.id))
        {
            view.on_participant_updated(current);
        }
    }

    fn on_participant_left(&mut self, participant: &Participant) {
        if self.roster.remove(&participant.id) > 0 {
            self.push_roster();
        }

        if let Some(view) = self.overlay.as_mut() {
            view.on_participant_left(participant);
        }
    }

    fn on_participants_invited(&mut self, participants: Vec<Participant>) {
        for participant in participants {
            if self.roster.upsert(participant.clone()) == UpsertOutcome::Inserted {
                if let Some(view) = self.overlay.as_mut() {
                    view.on_participant_updated(&participant);
                }
            }
        }
        self.push_roster();
    }

    fn on_invitation_received(&mut self, participants: Vec<Participant>) {
        for participant in participants {
            if let Some(view) = self.overlay.as_mut() {
                view.on_participant_updated(&participant);
            }
            let _ = self.roster.upsert(participant);
        }
        self.push_roster();
    }

    fn on_participant_declined(&mut self, participant_id: &str) {
        if self.roster.remove(participant_id) > 0 {
            self.push_roster();
        }

        if let Some(view) = self.overlay.as_mut() {
            view.on_participant_declined(participant_id);
        }
    }

    fn on_conference_refreshed(&mut self, participant: Option<Participant>) {
        if let Some(participant) = participant {
            let _ = self.roster.upsert(participant.clone());
            if let Some(view) = self.overlay.as_mut() {
                view.on_participant_updated(&participant);
            }
        }
        self.push_roster();
    }

    fn on_conference_updated(&mut self, participants: &[Participant]) {
        self.roster.merge(participants.iter().cloned());
        if let Some(view) = self.overlay.as_mut() {
            view.on_conference_updated(participants);
        }
        self.push_roster();
    }

    fn on_termination(&mut self, cause: TerminationCause) {
        if !self.conference_active && self.overlay.is_some() {
            debug!(
                target: "oc.actor.controller",
                cause = cause.as_str(),
                "Conference already over, ignoring termination"
            );
            return;
        }
        self.conference_active = false;

        self.collaborators.audio.stop();
        self.loopback.clear();
        self.recording = false;
        self.roster.clear();
        self.streams.clear();

        let conference_id = self.collaborators.conference.current_conference_id();
        let Some(view) = self.overlay.as_mut() else {
            debug!(
                target: "oc.actor.controller",
                cause = cause.as_str(),
                "Termination with no overlay content, nothing to do"
            );
            return;
        };

        view.on_participants_updated(&[]);
        for kind in [StreamKind::Camera, StreamKind::ScreenShare] {
            view.on_streams_updated(kind, self.streams.get(kind));
        }
        if cause.is_leave() {
            view.on_conference_left();
        } else {
            view.on_conference_destroyed();
        }

        info!(
            target: "oc.actor.controller",
            controller_id = %self.controller_id,
            conference_id = ?conference_id,
            cause = cause.as_str(),
            "Conference over, releasing overlay"
        );
        self.request_detach(true, DetachReason::Event);
    }

    /// Stop ringing once anybody but the local user is on air.
    fn check_outgoing_call(&self) {
        let local_id = self.collaborators.conference.local_participant_id();
        if self.roster.has_remote_on_air(local_id.as_deref()) {
            debug!(target: "oc.actor.controller", "Remote participant on air, stopping ring");
            self.collaborators.audio.stop();
        }
    }

    // ------------------------------------------------------------------------
    // Snapshots pushed to the view
    // ------------------------------------------------------------------------

    fn push_roster(&mut self) {
        if let Some(view) = self.overlay.as_mut() {
            view.on_participants_updated(self.roster.participants());
        }
    }

    /// Re-pull the authoritative mapping for `kind` and push it.
    fn refresh_streams(&mut self, kind: StreamKind) {
        let mapping = self.collaborators.conference.stream_mapping(kind);
        self.streams.replace_all(kind, mapping);

        if let Some(view) = self.overlay.as_mut() {
            view.on_streams_updated(kind, self.streams.get(kind));
        }
    }

    /// Re-pull roster and streams from the backend and push everything once.
    fn resync_from_backend(&mut self) {
        self.roster.merge(self.collaborators.conference.roster());
        self.roster
            .merge(self.collaborators.conference.invited_participants());

        for kind in [StreamKind::Camera, StreamKind::ScreenShare] {
            self.refresh_streams(kind);
        }
        self.push_roster();
    }

    // ------------------------------------------------------------------------
    // Overlay lifecycle
    // ------------------------------------------------------------------------

    /// Allocate overlay content unless it already exists.
    fn allocate_overlay(&mut self) {
        if self.overlay.is_some() {
            return;
        }

        let initial = self.presentation.seed();
        self.overlay = Some(self.collaborators.overlays.create(initial));
        self.lifecycle = OverlayLifecycle::InitializedHidden;
        self.conference_active = true;

        info!(
            target: "oc.actor.controller",
            controller_id = %self.controller_id,
            initial = initial.as_str(),
            "Overlay content allocated"
        );

        self.resync_from_backend();
    }

    /// Allocate content if a conference is live, then schedule an attach if enabled.
    fn show_overlay(&mut self) {
        let live = self.collaborators.conference.is_live();

        if self.overlay.is_none() && live {
            self.allocate_overlay();
        }

        if !self.enabled || !live || self.overlay.is_none() {
            debug!(
                target: "oc.actor.controller",
                enabled = self.enabled,
                live,
                "Not scheduling attach"
            );
            return;
        }

        let request = self
            .scheduler
            .request_attach(self.config.settle_delay, Instant::now());
        if matches!(request, AttachRequest::AlreadyAttached) {
            debug!(target: "oc.actor.controller", "Overlay already attached");
        }
    }

    fn execute_due_attach(&mut self) {
        if !self.scheduler.take_due(Instant::now()) {
            return;
        }

        let audio = &self.collaborators.audio;
        let focus = audio.request_focus().and_then(|()| audio.check_output_route());
        if let Err(e) = focus {
            self.report(&e);
        }

        let outcome = self.try_attach();
        self.scheduler
            .complete_attach(outcome == AttachOutcome::Attached);
        observability::record_attach(outcome.as_str());

        if outcome != AttachOutcome::Attached {
            return;
        }

        if let Some(view) = self.overlay.as_mut() {
            view.on_resume();
            for participant in self.roster.participants() {
                view.on_participant_joined(participant);
            }
        }
        self.lifecycle = OverlayLifecycle::Showing;
        self.loopback.push_back(DomainEvent::RestoreSavedPresentation);

        info!(
            target: "oc.actor.controller",
            controller_id = %self.controller_id,
            participants = self.roster.len(),
            "Overlay attached"
        );
    }

    fn try_attach(&self) -> AttachOutcome {
        if self.overlay.is_none() {
            debug!(target: "oc.scheduler", "Overlay content gone, abandoning attach");
            return AttachOutcome::Aborted;
        }

        let host = &self.collaborators.host;
        let root = match host.lifecycle_state() {
            HostLifecycle::Finishing => None,
            HostLifecycle::Resumed | HostLifecycle::Paused => host.root_surface(),
        };
        let Some(root) = root else {
            info!(
                target: "oc.scheduler",
                host_state = host.lifecycle_state().as_str(),
                "Host surface unavailable, abandoning attach"
            );
            return AttachOutcome::Aborted;
        };

        match host.attach_overlay(&root) {
            Ok(()) => AttachOutcome::Attached,
            Err(e) => {
                self.report(&e);
                AttachOutcome::Failed
            }
        }
    }

    /// Detach the overlay now, cancelling a pending attach.
    fn request_detach(&mut self, release: bool, reason: DetachReason) {
        let release = release
            && (reason != DetachReason::Event || !self.retained_on_leave || !self.enabled);

        match self.scheduler.request_detach() {
            DetachRequest::Detach => {
                let host = &self.collaborators.host;
                if host.is_overlay_attached() {
                    host.detach_overlay();
                } else {
                    debug!(target: "oc.scheduler", "Host already dropped the overlay");
                }
                if let Some(view) = self.overlay.as_mut() {
                    view.on_stop();
                }
                self.scheduler.complete_detach();
                observability::record_detach(reason.as_str(), release);
            }
            DetachRequest::CancelledPending => {
                observability::record_detach(reason.as_str(), release);
            }
            DetachRequest::AlreadyDetached => {}
        }

        self.presentation.clear_on_detach(!release);

        if release {
            if let Some(mut view) = self.overlay.take() {
                view.on_destroy();
                info!(
                    target: "oc.actor.controller",
                    controller_id = %self.controller_id,
                    reason = reason.as_str(),
                    "Overlay released"
                );
            }
            self.roster.clear();
            self.streams.clear();
            self.lifecycle = OverlayLifecycle::Uninitialized;
        } else if self.overlay.is_some() {
            self.lifecycle = OverlayLifecycle::RetainedHidden;
        }
    }

    fn apply_presentation(&mut self, mode: PresentationMode) {
        let Some(view) = self.overlay.as_mut() else {
            return;
        };
        match mode {
            PresentationMode::Expanded => {
                view.expand();
                self.presentation.expand();
            }
            PresentationMode::Minimized => {
                view.minimize();
                self.presentation.minimize();
            }
        }
    }

    // ------------------------------------------------------------------------
    // Host signals and setters
    // ------------------------------------------------------------------------

    fn on_host_resumed(&mut self) {
        if self.overlay.is_some() {
            self.show_overlay();
        }
    }

    fn on_host_paused(&mut self) {
        if self.overlay.is_some() {
            self.request_detach(false, DetachReason::Hud);
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        info!(
            target: "oc.actor.controller",
            controller_id = %self.controller_id,
            enabled,
            "Overlay enabled flag changed"
        );

        if enabled {
            if self.subscription.is_none() {
                self.subscription = Some(self.collaborators.events.subscribe());
            }
            // Events were missed while unsubscribed
            if self.overlay.is_some() {
                self.resync_from_backend();
            }
            self.show_overlay();
        } else {
            self.subscription = None;
            self.request_detach(false, DetachReason::Explicit);
        }
    }

    fn set_default_presentation(&mut self, mode: PresentationMode) {
        self.presentation.set_default(mode);
        self.apply_presentation(mode);
    }

    fn on_surface_resized(&mut self) {
        if !self.scheduler.is_attached() {
            return;
        }
        let mode = self.presentation.restore_saved();
        self.apply_presentation(mode);
    }

    fn report(&self, err: &OverlayError) {
        observability::record_collaborator_error(err.category());
        self.collaborators.errors.report(err);
    }

    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            controller_id: self.controller_id.clone(),
            lifecycle: self.lifecycle,
            enabled: self.enabled,
            subscribed: self.subscription.is_some(),
            retained_on_leave: self.retained_on_leave,
            has_overlay: self.overlay.is_some(),
            roster: self.roster.to_vec(),
            camera_streams: self.streams.get(StreamKind::Camera).clone(),
            screen_share_streams: self.streams.get(StreamKind::ScreenShare).clone(),
            presentation_current: self.presentation.current(),
            presentation_default: self.presentation.default_mode(),
            phase: self.scheduler.phase(),
            attach_count: self.scheduler.attach_count(),
            aborted_attach_count: self.scheduler.aborted_attach_count(),
            detach_count: self.scheduler.detach_count(),
            recording: self.recording,
            conference_active: self.conference_active,
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn recv_event(
    subscription: &mut Option<broadcast::Receiver<DomainEvent>>,
) -> Result<DomainEvent, broadcast::error::RecvError> {
    match subscription {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::collaborators::{EventBus, TracingErrorSink};
    use crate::headless::{HeadlessHost, InMemoryConference, LoggingAudioCues, LoggingOverlayFactory};
    use crate::scheduler::SurfacePhase;
    use std::sync::Arc;
    use std::time::Duration;

    fn headless(conference: Arc<InMemoryConference>) -> (Collaborators, EventBus) {
        let bus = EventBus::new(64);
        let collaborators = Collaborators {
            events: Arc::new(bus.clone()),
            conference,
            host: Arc::new(HeadlessHost::new("root")),
            overlays: Arc::new(LoggingOverlayFactory),
            audio: Arc::new(LoggingAudioCues),
            errors: Arc::new(TracingErrorSink),
        };
        (collaborators, bus)
    }

    fn joined(conference_id: &str) -> DomainEvent {
        DomainEvent::ConferenceJoined {
            conference_id: conference_id.to_string(),
            alias: None,
        }
    }

    #[tokio::test]
    async fn test_controller_spawn_and_cancel() {
        let (collaborators, bus) = headless(Arc::new(InMemoryConference::new()));
        let cancel_token = CancellationToken::new();

        let (handle, task) = OverlayControllerActor::spawn(
            ControllerConfig::default(),
            collaborators,
            cancel_token,
        );

        assert_eq!(handle.controller_id(), "oc-local");
        assert_eq!(bus.subscriber_count(), 1);
        assert!(!handle.is_cancelled());

        let state = handle.get_state().await.unwrap();
        assert_eq!(state.lifecycle, OverlayLifecycle::Uninitialized);
        assert!(state.subscribed);

        handle.cancel();
        task.await.unwrap();

        assert!(matches!(
            handle.get_state().await,
            Err(OverlayError::ShuttingDown)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_joined_attaches_after_settle_delay() {
        let conference = Arc::new(InMemoryConference::new());
        conference.go_live("conf-1");
        conference.set_roster(vec![Participant::new("alice")]);
        let (collaborators, _bus) = headless(Arc::clone(&conference));

        let (handle, _task) = OverlayControllerActor::spawn(
            ControllerConfig::default(),
            collaborators,
            CancellationToken::new(),
        );

        handle.dispatch(joined("conf-1")).await.unwrap();

        let state = handle.get_state().await.unwrap();
        assert_eq!(state.lifecycle, OverlayLifecycle::InitializedHidden);
        assert!(matches!(state.phase, SurfacePhase::AttachPending { .. }));
        assert_eq!(state.roster_ids(), vec!["alice"]);

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let state = handle.get_state().await.unwrap();
        assert_eq!(state.lifecycle, OverlayLifecycle::Showing);
        assert_eq!(state.attach_count, 1);
        // Restore posted after attach seeds the saved slot from the default
        assert_eq!(state.presentation_current, Some(PresentationMode::Minimized));
    }

    #[tokio::test]
    async fn test_not_live_does_not_allocate() {
        let (collaborators, _bus) = headless(Arc::new(InMemoryConference::new()));

        let (handle, _task) = OverlayControllerActor::spawn(
            ControllerConfig::default(),
            collaborators,
            CancellationToken::new(),
        );

        handle.dispatch(joined("conf-1")).await.unwrap();

        let state = handle.get_state().await.unwrap();
        assert!(!state.has_overlay);
        assert_eq!(state.phase, SurfacePhase::Detached);
    }

    #[tokio::test]
    async fn test_disabled_controller_ignores_dispatch() {
        let conference = Arc::new(InMemoryConference::new());
        conference.go_live("conf-1");
        let (collaborators, bus) = headless(conference);

        let (handle, _task) = OverlayControllerActor::spawn(
            ControllerConfig::default().with_enabled(false),
            collaborators,
            CancellationToken::new(),
        );

        assert_eq!(bus.subscriber_count(), 0);
        handle.dispatch(joined("conf-1")).await.unwrap();

        let state = handle.get_state().await.unwrap();
        assert!(!state.has_overlay);
        assert!(!state.subscribed);
    }
}

//! Spawned controller wired to recording mocks.
//!
//! # Example
//!
//! ```rust,ignore
//! use oc_test_utils::*;
//!
//! let rig = TestRig::spawn(ControllerConfig::default().with_retained_on_leave(true));
//! rig.conference.go_live("conf-1");
//! rig.publish(events::joined("conf-1")).await;
//! let state = rig.state().await;
//! ```

use common::events::DomainEvent;
use overlay_controller::actors::{
    ControllerSnapshot, OverlayControllerActor, OverlayControllerHandle,
};
use overlay_controller::collaborators::{Collaborators, EventBus};
use overlay_controller::config::ControllerConfig;
use overlay_controller::headless::InMemoryConference;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{MockAudio, MockHost, RecordingErrorSink, RecordingOverlayFactory};

/// A running controller plus every collaborator it was given.
pub struct TestRig {
    pub handle: OverlayControllerHandle,
    pub bus: EventBus,
    pub conference: Arc<InMemoryConference>,
    pub host: Arc<MockHost>,
    pub overlays: RecordingOverlayFactory,
    pub audio: Arc<MockAudio>,
    pub errors: Arc<RecordingErrorSink>,
    task: Option<JoinHandle<()>>,
}

impl TestRig {
    /// Spawn a controller with a resumed host that has a root surface.
    #[must_use]
    pub fn spawn(config: ControllerConfig) -> Self {
        Self::spawn_with_host(config, MockHost::new())
    }

    /// Spawn a controller with a preconfigured host.
    #[must_use]
    pub fn spawn_with_host(config: ControllerConfig, host: MockHost) -> Self {
        let bus = EventBus::new(256);
        let conference = Arc::new(InMemoryConference::new());
        let host = Arc::new(host);
        let overlays = RecordingOverlayFactory::new();
        let audio = Arc::new(MockAudio::new());
        let errors = Arc::new(RecordingErrorSink::new());

        let collaborators = Collaborators {
            events: Arc::new(bus.clone()),
            conference: conference.clone(),
            host: host.clone(),
            overlays: Arc::new(overlays.clone()),
            audio: audio.clone(),
            errors: errors.clone(),
        };

        let (handle, task) =
            OverlayControllerActor::spawn(config, collaborators, CancellationToken::new());

        Self {
            handle,
            bus,
            conference,
            host,
            overlays,
            audio,
            errors,
            task: Some(task),
        }
    }

    /// Publish an event on the bus and wait until the controller has handled it.
    pub async fn publish(&self, event: DomainEvent) {
        self.bus.publish(event);
        self.sync().await;
    }

    /// Publish several events back to back, then wait for all of them.
    pub async fn publish_all(&self, events: impl IntoIterator<Item = DomainEvent>) {
        for event in events {
            self.bus.publish(event);
        }
        self.sync().await;
    }

    /// Wait until the controller has drained everything queued so far.
    ///
    /// Domain events take priority over mailbox requests, so a round trip
    /// through the mailbox returns only after earlier events were handled.
    pub async fn sync(&self) {
        let _ = self.state().await;
    }

    /// Current controller snapshot.
    pub async fn state(&self) -> ControllerSnapshot {
        self.handle
            .get_state()
            .await
            .expect("controller should answer get_state")
    }

    /// Cancel the controller and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.handle.cancel();
        if let Some(task) = self.task.take() {
            task.await.expect("controller task should not panic");
        }
    }
}

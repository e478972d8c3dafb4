//! Pre-configured test data fixtures for controller testing.
//!
//! Provides builders and test data for:
//! - Participants in each conference status
//! - Stream mappings
//! - Commonly used domain events

use common::events::DomainEvent;
use common::types::{
    ConferenceStatus, Participant, ParticipantType, StreamHandle, StreamMap,
};
use uuid::Uuid;

/// Test participant fixture.
#[derive(Debug, Clone)]
pub struct TestParticipant {
    participant: Participant,
}

impl TestParticipant {
    /// Create an invited participant with the given id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            participant: Participant::new(id.clone())
                .with_name(format!("User {id}"))
                .with_status(ConferenceStatus::Invited),
        }
    }

    /// Create a participant with a random id.
    #[must_use]
    pub fn random() -> Self {
        Self::new(format!("part-{}", Uuid::new_v4()))
    }

    /// Set the display name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.participant.name = Some(name.into());
        self
    }

    /// Set the avatar.
    #[must_use]
    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.participant.avatar_url = Some(url.into());
        self
    }

    /// Mark as on air.
    #[must_use]
    pub fn on_air(mut self) -> Self {
        self.participant.status = ConferenceStatus::OnAir;
        self
    }

    /// Mark as having left.
    #[must_use]
    pub fn left(mut self) -> Self {
        self.participant.status = ConferenceStatus::Left;
        self
    }

    /// Mark as a listener.
    #[must_use]
    pub fn listener(mut self) -> Self {
        self.participant.participant_type = ParticipantType::Listener;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Participant {
        self.participant
    }
}

impl From<TestParticipant> for Participant {
    fn from(fixture: TestParticipant) -> Self {
        fixture.build()
    }
}

/// A participant with no usable id (rejected by the roster).
#[must_use]
pub fn anonymous_participant() -> Participant {
    Participant::new("")
}

/// Build a stream map from `(participant_id, handle)` pairs.
#[must_use]
pub fn stream_map(entries: &[(&str, &str)]) -> StreamMap {
    entries
        .iter()
        .map(|(id, handle)| ((*id).to_string(), StreamHandle::new(*handle)))
        .collect()
}

/// Helpers for building domain events.
pub mod events {
    use super::{DomainEvent, Participant};

    #[must_use]
    pub fn creating() -> DomainEvent {
        DomainEvent::ConferenceCreating {
            conference_id: None,
        }
    }

    #[must_use]
    pub fn pre_joined(conference_id: &str) -> DomainEvent {
        DomainEvent::ConferencePreJoined {
            conference_id: conference_id.to_string(),
        }
    }

    #[must_use]
    pub fn joined(conference_id: &str) -> DomainEvent {
        DomainEvent::ConferenceJoined {
            conference_id: conference_id.to_string(),
            alias: None,
        }
    }

    #[must_use]
    pub fn joined_with_alias(conference_id: &str, alias: &str) -> DomainEvent {
        DomainEvent::ConferenceJoined {
            conference_id: conference_id.to_string(),
            alias: Some(alias.to_string()),
        }
    }

    #[must_use]
    pub fn created(conference_id: &str) -> DomainEvent {
        DomainEvent::ConferenceCreated {
            conference_id: conference_id.to_string(),
            alias: None,
        }
    }

    #[must_use]
    pub fn participant_joined(participant: impl Into<Participant>) -> DomainEvent {
        DomainEvent::ParticipantJoined {
            participant: participant.into(),
        }
    }

    #[must_use]
    pub fn participant_updated(participant: impl Into<Participant>, screen_share: bool) -> DomainEvent {
        DomainEvent::ParticipantUpdated {
            participant: participant.into(),
            screen_share,
        }
    }

    #[must_use]
    pub fn participant_left(participant: impl Into<Participant>) -> DomainEvent {
        DomainEvent::ParticipantLeft {
            participant: participant.into(),
        }
    }

    #[must_use]
    pub fn conference_updated(participants: Vec<Participant>) -> DomainEvent {
        DomainEvent::ConferenceUpdated { participants }
    }

    #[must_use]
    pub fn declined(participant_id: &str) -> DomainEvent {
        DomainEvent::ParticipantDeclined {
            participant_id: participant_id.to_string(),
        }
    }

    #[must_use]
    pub fn left() -> DomainEvent {
        DomainEvent::ConferenceLeft
    }

    #[must_use]
    pub fn ended(conference_id: &str) -> DomainEvent {
        DomainEvent::ConferenceEnded {
            conference_id: Some(conference_id.to_string()),
        }
    }
}

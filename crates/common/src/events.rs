//! Domain events emitted by the conference backend.
//!
//! The whole vocabulary lives in one tagged union so consumers dispatch with an
//! exhaustive `match`. Events may arrive duplicated and out of order relative to
//! each other; consumers must treat them idempotently.

use crate::types::Participant;
use serde::{Deserialize, Serialize};

/// Coarse classification used for routing and metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    /// Conference creating / pre-joined / joined / created
    Creation,
    /// Roster changes
    Participant,
    /// Camera or screen-share stream changes
    Stream,
    /// Conference over, for whatever reason
    Termination,
    /// Expand / minimize / restore requests
    Presentation,
    /// Recording toggles
    Recording,
}

impl EventClass {
    /// Returns the class as a string for metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventClass::Creation => "creation",
            EventClass::Participant => "participant",
            EventClass::Stream => "stream",
            EventClass::Termination => "termination",
            EventClass::Presentation => "presentation",
            EventClass::Recording => "recording",
        }
    }
}

/// Why a conference ended. All causes share the same recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationCause {
    /// Local user left successfully
    LeftSuccess,
    /// Leaving failed on the backend
    LeftError,
    /// Conference creation failed
    CreatedError,
    /// Joining failed
    JoinedError,
    /// Backend pushed a destroy notification
    DestroyedPush,
    /// Conference ended
    Ended,
    /// Replay of a recorded conference failed
    ReplayError,
}

impl TerminationCause {
    /// Returns the cause as a string for logs and labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TerminationCause::LeftSuccess => "left_success",
            TerminationCause::LeftError => "left_error",
            TerminationCause::CreatedError => "created_error",
            TerminationCause::JoinedError => "joined_error",
            TerminationCause::DestroyedPush => "destroyed_push",
            TerminationCause::Ended => "ended",
            TerminationCause::ReplayError => "replay_error",
        }
    }

    /// Whether the local user left (as opposed to the conference going away).
    #[must_use]
    pub const fn is_leave(&self) -> bool {
        matches!(self, TerminationCause::LeftSuccess | TerminationCause::LeftError)
    }
}

/// A conference-lifecycle domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    // ------------------------------------------------------------------
    // Creation / join intent
    // ------------------------------------------------------------------
    /// The local user started creating a conference.
    ConferenceCreating {
        #[serde(default)]
        conference_id: Option<String>,
    },

    /// The local user is about to join a conference.
    ConferencePreJoined { conference_id: String },

    /// The local user joined a conference.
    ConferenceJoined {
        conference_id: String,
        #[serde(default)]
        alias: Option<String>,
    },

    /// A conference was created.
    ConferenceCreated {
        conference_id: String,
        #[serde(default)]
        alias: Option<String>,
    },

    // ------------------------------------------------------------------
    // Participants
    // ------------------------------------------------------------------
    /// A participant joined.
    ParticipantJoined { participant: Participant },

    /// A participant changed (status, profile or streams).
    ParticipantUpdated {
        participant: Participant,
        /// Whether the change concerns a screen-share stream.
        #[serde(default)]
        screen_share: bool,
    },

    /// A participant left.
    ParticipantLeft { participant: Participant },

    /// The local user invited participants.
    ParticipantsInvited { participants: Vec<Participant> },

    /// An invitation listing participants was received.
    InvitationReceived { participants: Vec<Participant> },

    /// A participant declined the call. Only the id is known.
    ParticipantDeclined { participant_id: String },

    /// The backend refreshed the conference, optionally about one participant.
    ConferenceRefreshed {
        #[serde(default)]
        participant: Option<Participant>,
    },

    /// The backend sent the conference's current participant list.
    ConferenceUpdated { participants: Vec<Participant> },

    // ------------------------------------------------------------------
    // Streams
    // ------------------------------------------------------------------
    /// A screen-share stream appeared.
    ScreenShareStarted { participant_id: String },

    /// A screen-share stream went away.
    ScreenShareStopped { participant_id: String },

    /// A camera/media stream changed.
    MediaStreamUpdated { participant_id: String },

    // ------------------------------------------------------------------
    // Termination
    // ------------------------------------------------------------------
    /// Leaving succeeded.
    ConferenceLeft,

    /// Leaving failed.
    ConferenceLeaveFailed,

    /// Creating failed.
    ConferenceCreateFailed,

    /// Joining failed.
    ConferenceJoinFailed,

    /// The backend destroyed the conference.
    ConferenceDestroyed {
        #[serde(default)]
        conference_id: Option<String>,
    },

    /// The conference ended.
    ConferenceEnded {
        #[serde(default)]
        conference_id: Option<String>,
    },

    /// Replaying a recorded conference failed.
    ReplayFailed,

    // ------------------------------------------------------------------
    // Presentation / misc
    // ------------------------------------------------------------------
    /// Recording was toggled.
    RecordingStatusUpdated { recording: bool },

    /// An incoming call notification is on screen.
    IncomingCall,

    /// Explicit request to expand the overlay.
    ExpandRequested,

    /// Explicit request to minimize the overlay.
    MinimizeRequested,

    /// Re-apply the saved presentation (posted after an attach completes).
    RestoreSavedPresentation,
}

impl DomainEvent {
    /// Classify the event.
    #[must_use]
    pub fn class(&self) -> EventClass {
        match self {
            DomainEvent::ConferenceCreating { .. }
            | DomainEvent::ConferencePreJoined { .. }
            | DomainEvent::ConferenceJoined { .. }
            | DomainEvent::ConferenceCreated { .. } => EventClass::Creation,

            DomainEvent::ParticipantJoined { .. }
            | DomainEvent::ParticipantUpdated { .. }
            | DomainEvent::ParticipantLeft { .. }
            | DomainEvent::ParticipantsInvited { .. }
            | DomainEvent::InvitationReceived { .. }
            | DomainEvent::ParticipantDeclined { .. }
            | DomainEvent::ConferenceRefreshed { .. }
            | DomainEvent::ConferenceUpdated { .. } => EventClass::Participant,

            DomainEvent::ScreenShareStarted { .. }
            | DomainEvent::ScreenShareStopped { .. }
            | DomainEvent::MediaStreamUpdated { .. } => EventClass::Stream,

            DomainEvent::ConferenceLeft
            | DomainEvent::ConferenceLeaveFailed
            | DomainEvent::ConferenceCreateFailed
            | DomainEvent::ConferenceJoinFailed
            | DomainEvent::ConferenceDestroyed { .. }
            | DomainEvent::ConferenceEnded { .. }
            | DomainEvent::ReplayFailed => EventClass::Termination,

            DomainEvent::IncomingCall
            | DomainEvent::ExpandRequested
            | DomainEvent::MinimizeRequested
            | DomainEvent::RestoreSavedPresentation => EventClass::Presentation,

            DomainEvent::RecordingStatusUpdated { .. } => EventClass::Recording,
        }
    }

    /// The termination cause, for termination events.
    #[must_use]
    pub fn termination_cause(&self) -> Option<TerminationCause> {
        match self {
            DomainEvent::ConferenceLeft => Some(TerminationCause::LeftSuccess),
            DomainEvent::ConferenceLeaveFailed => Some(TerminationCause::LeftError),
            DomainEvent::ConferenceCreateFailed => Some(TerminationCause::CreatedError),
            DomainEvent::ConferenceJoinFailed => Some(TerminationCause::JoinedError),
            DomainEvent::ConferenceDestroyed { .. } => Some(TerminationCause::DestroyedPush),
            DomainEvent::ConferenceEnded { .. } => Some(TerminationCause::Ended),
            DomainEvent::ReplayFailed => Some(TerminationCause::ReplayError),
            _ => None,
        }
    }

    /// Conference id and alias referenced by the event, if any.
    #[must_use]
    pub fn conference_ref(&self) -> Option<(&str, Option<&str>)> {
        match self {
            DomainEvent::ConferencePreJoined { conference_id } => {
                Some((conference_id.as_str(), None))
            }
            DomainEvent::ConferenceJoined {
                conference_id,
                alias,
            }
            | DomainEvent::ConferenceCreated {
                conference_id,
                alias,
            } => Some((conference_id.as_str(), alias.as_deref())),
            DomainEvent::ConferenceCreating { conference_id }
            | DomainEvent::ConferenceDestroyed { conference_id }
            | DomainEvent::ConferenceEnded { conference_id } => {
                conference_id.as_deref().map(|id| (id, None))
            }
            _ => None,
        }
    }

    /// Short event name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            DomainEvent::ConferenceCreating { .. } => "conference_creating",
            DomainEvent::ConferencePreJoined { .. } => "conference_pre_joined",
            DomainEvent::ConferenceJoined { .. } => "conference_joined",
            DomainEvent::ConferenceCreated { .. } => "conference_created",
            DomainEvent::ParticipantJoined { .. } => "participant_joined",
            DomainEvent::ParticipantUpdated { .. } => "participant_updated",
            DomainEvent::ParticipantLeft { .. } => "participant_left",
            DomainEvent::ParticipantsInvited { .. } => "participants_invited",
            DomainEvent::InvitationReceived { .. } => "invitation_received",
            DomainEvent::ParticipantDeclined { .. } => "participant_declined",
            DomainEvent::ConferenceRefreshed { .. } => "conference_refreshed",
            DomainEvent::ConferenceUpdated { .. } => "conference_updated",
            DomainEvent::ScreenShareStarted { .. } => "screen_share_started",
            DomainEvent::ScreenShareStopped { .. } => "screen_share_stopped",
            DomainEvent::MediaStreamUpdated { .. } => "media_stream_updated",
            DomainEvent::ConferenceLeft => "conference_left",
            DomainEvent::ConferenceLeaveFailed => "conference_leave_failed",
            DomainEvent::ConferenceCreateFailed => "conference_create_failed",
            DomainEvent::ConferenceJoinFailed => "conference_join_failed",
            DomainEvent::ConferenceDestroyed { .. } => "conference_destroyed",
            DomainEvent::ConferenceEnded { .. } => "conference_ended",
            DomainEvent::ReplayFailed => "replay_failed",
            DomainEvent::RecordingStatusUpdated { .. } => "recording_status_updated",
            DomainEvent::IncomingCall => "incoming_call",
            DomainEvent::ExpandRequested => "expand_requested",
            DomainEvent::MinimizeRequested => "minimize_requested",
            DomainEvent::RestoreSavedPresentation => "restore_saved_presentation",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::ConferenceStatus;

    #[test]
    fn test_every_termination_event_has_a_cause() {
        let events = [
            DomainEvent::ConferenceLeft,
            DomainEvent::ConferenceLeaveFailed,
            DomainEvent::ConferenceCreateFailed,
            DomainEvent::ConferenceJoinFailed,
            DomainEvent::ConferenceDestroyed {
                conference_id: None,
            },
            DomainEvent::ConferenceEnded {
                conference_id: Some("conf-1".to_string()),
            },
            DomainEvent::ReplayFailed,
        ];

        for event in &events {
            assert_eq!(event.class(), EventClass::Termination, "{}", event.name());
            assert!(event.termination_cause().is_some(), "{}", event.name());
        }

        assert!(DomainEvent::IncomingCall.termination_cause().is_none());
    }

    #[test]
    fn test_leave_causes() {
        assert!(TerminationCause::LeftSuccess.is_leave());
        assert!(TerminationCause::LeftError.is_leave());
        assert!(!TerminationCause::Ended.is_leave());
        assert!(!TerminationCause::DestroyedPush.is_leave());
    }

    #[test]
    fn test_conference_ref_includes_alias() {
        let event = DomainEvent::ConferenceJoined {
            conference_id: "conf-1".to_string(),
            alias: Some("standup".to_string()),
        };
        assert_eq!(event.conference_ref(), Some(("conf-1", Some("standup"))));

        let creating = DomainEvent::ConferenceCreating {
            conference_id: None,
        };
        assert_eq!(creating.conference_ref(), None);

        let left = DomainEvent::ParticipantLeft {
            participant: Participant::new("bob"),
        };
        assert_eq!(left.conference_ref(), None);
    }

    #[test]
    fn test_json_tagged_representation() {
        let event: DomainEvent = serde_json::from_str(
            r#"{"type":"participant_joined","participant":{"id":"alice","status":"ON_AIR"}}"#,
        )
        .unwrap();

        match event {
            DomainEvent::ParticipantJoined { participant } => {
                assert_eq!(participant.id, "alice");
                assert_eq!(participant.status, ConferenceStatus::OnAir);
            }
            other => panic!("unexpected event {other:?}"),
        }

        let left: DomainEvent = serde_json::from_str(r#"{"type":"conference_left"}"#).unwrap();
        assert_eq!(left, DomainEvent::ConferenceLeft);
    }

    #[test]
    fn test_conference_updated_is_a_participant_event() {
        let event: DomainEvent = serde_json::from_str(
            r#"{"type":"conference_updated","participants":[{"id":"alice"},{"id":"bob"}]}"#,
        )
        .unwrap();

        assert_eq!(event.class(), EventClass::Participant);
        assert_eq!(event.name(), "conference_updated");
        assert_eq!(event.conference_ref(), None);
        match event {
            DomainEvent::ConferenceUpdated { participants } => {
                let ids: Vec<_> = participants.iter().map(|p| p.id.as_str()).collect();
                assert_eq!(ids, ["alice", "bob"]);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}

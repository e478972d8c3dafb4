//! Common data types for overlay controller components.
//!
//! Participants compare by identity (`id`) only. Two values describing the
//! same participant at different points of the conference are equal even
//! if their status or profile differ.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Conference status of a participant as reported by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConferenceStatus {
    /// Invited, not yet answered
    #[default]
    Invited,
    /// In the conference with media flowing
    OnAir,
    /// Left the conference
    Left,
    /// Declined the invitation
    Declined,
}

impl ConferenceStatus {
    /// Returns the wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConferenceStatus::Invited => "INVITED",
            ConferenceStatus::OnAir => "ON_AIR",
            ConferenceStatus::Left => "LEFT",
            ConferenceStatus::Declined => "DECLINED",
        }
    }
}

impl FromStr for ConferenceStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INVITED" => Ok(ConferenceStatus::Invited),
            "ON_AIR" => Ok(ConferenceStatus::OnAir),
            "LEFT" => Ok(ConferenceStatus::Left),
            "DECLINED" => Ok(ConferenceStatus::Declined),
            _ => Err(ParseError::ConferenceStatus(s.to_string())),
        }
    }
}

/// Kind of participation in a conference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantType {
    /// Regular participant (sends and receives media)
    #[default]
    Normal,
    /// Receive-only participant
    Listener,
}

impl ParticipantType {
    /// Returns the wire name of the participant type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ParticipantType::Normal => "NORMAL",
            ParticipantType::Listener => "LISTENER",
        }
    }
}

impl FromStr for ParticipantType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(ParticipantType::Normal),
            "LISTENER" => Ok(ParticipantType::Listener),
            _ => Err(ParseError::ParticipantType(s.to_string())),
        }
    }
}

/// A conference participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Backend identity, unique within a conference
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar reference (URL or asset key)
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Conference status
    #[serde(default)]
    pub status: ConferenceStatus,
    /// Participation type
    #[serde(default)]
    pub participant_type: ParticipantType,
}

impl Participant {
    /// Create a participant with the given id, no profile, `INVITED` and `NORMAL`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            avatar_url: None,
            status: ConferenceStatus::default(),
            participant_type: ParticipantType::default(),
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the avatar reference.
    #[must_use]
    pub fn with_avatar(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// Set the conference status.
    #[must_use]
    pub fn with_status(mut self, status: ConferenceStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the participant type.
    #[must_use]
    pub fn with_type(mut self, participant_type: ParticipantType) -> Self {
        self.participant_type = participant_type;
        self
    }

    /// Whether the identity is usable (non-empty id).
    #[must_use]
    pub fn has_identity(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Whether the participant is currently on air.
    #[must_use]
    pub fn is_on_air(&self) -> bool {
        self.status == ConferenceStatus::OnAir
    }

    /// Apply a newer description of the same participant in place.
    ///
    /// Status and type always follow `other`; profile fields only change
    /// when `other` carries a value.
    pub fn apply_update(&mut self, other: &Participant) {
        if other.name.is_some() {
            self.name.clone_from(&other.name);
        }
        if other.avatar_url.is_some() {
            self.avatar_url.clone_from(&other.avatar_url);
        }
        self.status = other.status;
        self.participant_type = other.participant_type;
    }
}

impl PartialEq for Participant {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Participant {}

impl Hash for Participant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Kind of media stream tracked per participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Camera / microphone media
    Camera,
    /// Screen-share media
    ScreenShare,
}

impl StreamKind {
    /// Returns the stream kind as a string for labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Camera => "camera",
            StreamKind::ScreenShare => "screen_share",
        }
    }

    /// The other kind.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            StreamKind::Camera => StreamKind::ScreenShare,
            StreamKind::ScreenShare => StreamKind::Camera,
        }
    }
}

impl FromStr for StreamKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "camera" => Ok(StreamKind::Camera),
            "screen_share" | "screenshare" => Ok(StreamKind::ScreenShare),
            _ => Err(ParseError::StreamKind(s.to_string())),
        }
    }
}

/// Opaque handle to a backend media stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamHandle(pub String);

impl StreamHandle {
    /// Wrap a backend stream label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }
}

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Participant id to stream handle, for one stream kind.
pub type StreamMap = HashMap<String, StreamHandle>;

/// Presentation slot of the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationMode {
    /// Full overlay
    Expanded,
    /// Collapsed thumbnail
    Minimized,
}

impl PresentationMode {
    /// Returns the mode as a string for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PresentationMode::Expanded => "expanded",
            PresentationMode::Minimized => "minimized",
        }
    }
}

impl FromStr for PresentationMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expanded" => Ok(PresentationMode::Expanded),
            "minimized" => Ok(PresentationMode::Minimized),
            _ => Err(ParseError::PresentationMode(s.to_string())),
        }
    }
}

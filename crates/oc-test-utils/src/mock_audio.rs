//! Mock audio cues.

use overlay_controller::collaborators::AudioCues;
use overlay_controller::errors::OverlayError;
use std::sync::Mutex;

/// One call made to the audio layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    PlayRing,
    Stop,
    RequestFocus,
    RouteToSpeaker,
    CheckOutputRoute,
}

#[derive(Debug, Default)]
struct MockAudioInner {
    calls: Vec<AudioCall>,
    fail_focus: bool,
    fail_route: bool,
}

/// Audio cues that record every call.
#[derive(Debug, Default)]
pub struct MockAudio {
    inner: Mutex<MockAudioInner>,
}

impl MockAudio {
    /// Create a mock where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `request_focus` fail.
    pub fn fail_focus(&self, fail: bool) {
        self.inner.lock().unwrap().fail_focus = fail;
    }

    /// Make `route_to_speaker` fail.
    pub fn fail_route(&self, fail: bool) {
        self.inner.lock().unwrap().fail_route = fail;
    }

    /// All calls so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<AudioCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Number of calls of one kind.
    #[must_use]
    pub fn count(&self, call: AudioCall) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == call)
            .count()
    }

    fn record(&self, call: AudioCall) {
        self.inner.lock().unwrap().calls.push(call);
    }
}

impl AudioCues for MockAudio {
    fn play_ring(&self) {
        self.record(AudioCall::PlayRing);
    }

    fn stop(&self) {
        self.record(AudioCall::Stop);
    }

    fn request_focus(&self) -> Result<(), OverlayError> {
        self.record(AudioCall::RequestFocus);
        if self.inner.lock().unwrap().fail_focus {
            return Err(OverlayError::collaborator("audio", "focus denied"));
        }
        Ok(())
    }

    fn route_to_speaker(&self) -> Result<(), OverlayError> {
        self.record(AudioCall::RouteToSpeaker);
        if self.inner.lock().unwrap().fail_route {
            return Err(OverlayError::collaborator("audio", "speaker unavailable"));
        }
        Ok(())
    }

    fn check_output_route(&self) -> Result<(), OverlayError> {
        self.record(AudioCall::CheckOutputRoute);
        Ok(())
    }
}

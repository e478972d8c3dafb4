//! Integration tests for domain event handling: roster reconciliation, stream
//! re-pulls, audio cues, the conference filter and the enabled toggle.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashSet;
use std::time::Duration;

use common::events::DomainEvent;
use common::types::{ConferenceStatus, ParticipantType, StreamKind};
use oc_test_utils::{
    anonymous_participant, events, stream_map, AudioCall, TestParticipant, TestRig, ViewCall,
};
use overlay_controller::actors::OverlayLifecycle;
use overlay_controller::config::{ConferenceFilter, ControllerConfig};

/// Live conference with overlay content allocated (not yet attached).
async fn joined_rig(config: ControllerConfig) -> TestRig {
    let rig = TestRig::spawn(config);
    rig.conference.set_local_participant("me", ParticipantType::Normal);
    rig.conference.go_live("conf-1");
    rig.publish(events::joined("conf-1")).await;
    assert!(rig.state().await.has_overlay);
    rig.overlays.clear();
    rig
}

fn stream_pushes(rig: &TestRig) -> Vec<StreamKind> {
    rig.overlays
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            ViewCall::StreamsUpdated(kind, _) => Some(kind),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Roster
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_join_then_rejoin_updates_in_place() {
    let rig = joined_rig(ControllerConfig::default()).await;

    rig.publish(events::participant_joined(TestParticipant::new("a")))
        .await;
    rig.publish(events::participant_joined(TestParticipant::new("a").on_air()))
        .await;

    let state = rig.state().await;
    assert_eq!(state.roster_ids(), vec!["a"]);
    assert_eq!(
        state.roster.first().map(|p| p.status),
        Some(ConferenceStatus::OnAir)
    );

    let notifications: Vec<ViewCall> = rig
        .overlays
        .calls()
        .into_iter()
        .filter(|c| {
            matches!(
                c,
                ViewCall::ParticipantJoined(_) | ViewCall::ParticipantUpdated(_)
            )
        })
        .collect();
    assert_eq!(
        notifications,
        vec![
            ViewCall::ParticipantJoined("a".to_string()),
            ViewCall::ParticipantUpdated("a".to_string()),
        ]
    );
    assert_eq!(rig.overlays.roster_pushes().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_participant_without_identity_is_ignored() {
    let rig = joined_rig(ControllerConfig::default()).await;

    rig.publish(events::participant_joined(anonymous_participant()))
        .await;

    assert!(rig.state().await.roster.is_empty());
    assert!(rig.overlays.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_left_pushes_only_when_something_was_removed() {
    let rig = joined_rig(ControllerConfig::default()).await;
    rig.publish(events::participant_joined(TestParticipant::new("a")))
        .await;
    rig.overlays.clear();

    rig.publish(events::participant_left(TestParticipant::new("ghost")))
        .await;
    assert!(rig.overlays.roster_pushes().is_empty());
    assert_eq!(
        rig.overlays.calls(),
        vec![ViewCall::ParticipantLeft("ghost".to_string())]
    );

    rig.publish(events::participant_left(TestParticipant::new("a")))
        .await;
    assert_eq!(rig.overlays.last_roster(), Some(Vec::new()));
}

#[tokio::test(start_paused = true)]
async fn test_declined_removes_and_notifies() {
    let rig = joined_rig(ControllerConfig::default()).await;
    rig.publish_all([
        events::participant_joined(TestParticipant::new("a")),
        events::participant_joined(TestParticipant::new("b")),
    ])
    .await;
    rig.overlays.clear();

    rig.publish(events::declined("a")).await;

    assert_eq!(rig.state().await.roster_ids(), vec!["b"]);
    assert_eq!(
        rig.overlays.calls(),
        vec![
            ViewCall::ParticipantsUpdated(vec!["b".to_string()]),
            ViewCall::ParticipantDeclined("a".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_invitations_merge_without_overwriting() {
    let rig = joined_rig(ControllerConfig::default()).await;
    rig.publish(events::participant_joined(
        TestParticipant::new("a").named("Alice").on_air(),
    ))
    .await;
    rig.overlays.clear();

    rig.publish(DomainEvent::ParticipantsInvited {
        participants: vec![
            TestParticipant::new("a").named("Stale").build(),
            TestParticipant::new("b").build(),
        ],
    })
    .await;

    let state = rig.state().await;
    assert_eq!(state.roster_ids(), vec!["a", "b"]);
    assert_eq!(
        state.roster.first().and_then(|p| p.name.clone()),
        Some("Alice".to_string())
    );
    // Only the new participant is announced
    assert_eq!(
        rig.overlays.calls(),
        vec![
            ViewCall::ParticipantUpdated("b".to_string()),
            ViewCall::ParticipantsUpdated(vec!["a".to_string(), "b".to_string()]),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_allocation_backfills_invited_participants() {
    let rig = TestRig::spawn(ControllerConfig::default());
    rig.conference
        .set_roster(vec![TestParticipant::new("a").on_air().build()]);
    rig.conference.set_invited(vec![
        TestParticipant::new("a").build(),
        TestParticipant::new("c").build(),
    ]);
    rig.conference.go_live("conf-1");

    rig.publish(events::joined("conf-1")).await;

    assert_eq!(rig.state().await.roster_ids(), vec!["a", "c"]);
}

#[tokio::test(start_paused = true)]
async fn test_refreshed_without_participant_pushes_roster() {
    let rig = joined_rig(ControllerConfig::default()).await;

    rig.publish(DomainEvent::ConferenceRefreshed { participant: None })
        .await;

    assert_eq!(rig.overlays.calls(), vec![ViewCall::ParticipantsUpdated(vec![])]);
}

#[tokio::test(start_paused = true)]
async fn test_conference_updated_merges_and_forwards_list() {
    let rig = joined_rig(ControllerConfig::default()).await;
    rig.publish(events::participant_joined(TestParticipant::new("a").on_air()))
        .await;
    rig.overlays.clear();

    rig.publish(events::conference_updated(vec![
        TestParticipant::new("a").build(),
        TestParticipant::new("b").build(),
    ]))
    .await;

    let state = rig.state().await;
    assert_eq!(state.roster_ids(), vec!["a", "b"]);
    assert_eq!(
        state.roster.first().map(|p| p.status),
        Some(ConferenceStatus::OnAir)
    );
    assert_eq!(
        rig.overlays.calls(),
        vec![
            ViewCall::ConferenceUpdated(vec!["a".to_string(), "b".to_string()]),
            ViewCall::ParticipantsUpdated(vec!["a".to_string(), "b".to_string()]),
        ]
    );
}

// ============================================================================
// Streams
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_join_repulls_camera_streams() {
    let rig = joined_rig(ControllerConfig::default()).await;
    let cameras = stream_map(&[("a", "cam-a")]);
    rig.conference.set_streams(StreamKind::Camera, cameras.clone());

    rig.publish(events::participant_joined(TestParticipant::new("a")))
        .await;

    assert_eq!(rig.overlays.last_streams(StreamKind::Camera), Some(cameras.clone()));
    assert_eq!(rig.state().await.camera_streams, cameras);
}

#[tokio::test(start_paused = true)]
async fn test_screen_share_events_replace_whole_mapping() {
    let rig = joined_rig(ControllerConfig::default()).await;
    rig.conference
        .set_streams(StreamKind::ScreenShare, stream_map(&[("a", "ss-a")]));
    rig.publish(DomainEvent::ScreenShareStarted {
        participant_id: "a".to_string(),
    })
    .await;

    rig.conference
        .set_streams(StreamKind::ScreenShare, stream_map(&[("b", "ss-b")]));
    rig.publish(DomainEvent::ScreenShareStarted {
        participant_id: "b".to_string(),
    })
    .await;

    let state = rig.state().await;
    assert_eq!(state.screen_share_streams, stream_map(&[("b", "ss-b")]));
    assert!(state.camera_streams.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_update_routes_stream_kind_by_flag() {
    let rig = joined_rig(ControllerConfig::default()).await;

    rig.publish(events::participant_updated(TestParticipant::new("a"), true))
        .await;
    rig.publish(events::participant_updated(TestParticipant::new("a"), false))
        .await;

    assert_eq!(
        stream_pushes(&rig),
        vec![StreamKind::ScreenShare, StreamKind::Camera]
    );
}

#[tokio::test(start_paused = true)]
async fn test_inverted_update_stream_routing() {
    let rig = joined_rig(ControllerConfig::default().with_inverted_update_stream_kind(true)).await;

    rig.publish(events::participant_updated(TestParticipant::new("a"), true))
        .await;

    assert_eq!(stream_pushes(&rig), vec![StreamKind::Camera]);
}

// ============================================================================
// Audio cues
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_ring_stops_when_remote_goes_on_air() {
    let rig = TestRig::spawn(ControllerConfig::default());
    rig.conference.set_local_participant("me", ParticipantType::Normal);
    rig.conference.go_live("conf-1");

    rig.publish(events::pre_joined("conf-1")).await;
    assert_eq!(rig.audio.calls(), vec![AudioCall::PlayRing]);

    // The local user going on air does not count
    rig.publish(events::participant_joined(TestParticipant::new("me").on_air()))
        .await;
    assert_eq!(rig.audio.count(AudioCall::Stop), 0);

    rig.publish(events::participant_joined(TestParticipant::new("bob").on_air()))
        .await;
    assert_eq!(rig.audio.count(AudioCall::Stop), 1);
}

#[tokio::test(start_paused = true)]
async fn test_listener_never_rings() {
    let rig = TestRig::spawn(ControllerConfig::default());
    rig.conference
        .set_local_participant("me", ParticipantType::Listener);
    rig.conference.go_live("conf-1");

    rig.publish(events::created("conf-1")).await;

    assert_eq!(rig.audio.count(AudioCall::PlayRing), 0);
    assert_eq!(rig.audio.count(AudioCall::Stop), 1);
    assert_eq!(
        rig.overlays.calls().last(),
        Some(&ViewCall::ConferenceCreated("conf-1".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_speaker_route_failure_is_reported() {
    let rig = TestRig::spawn(ControllerConfig::default());
    rig.audio.fail_route(true);
    rig.conference.go_live("conf-1");

    rig.publish(events::joined("conf-1")).await;

    assert_eq!(rig.errors.len(), 1);
    assert!(rig.state().await.has_overlay);
}

// ============================================================================
// Termination
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_termination_without_content_only_stops_audio() {
    let rig = TestRig::spawn(ControllerConfig::default());

    rig.publish(events::left()).await;
    rig.publish(DomainEvent::ConferenceJoinFailed).await;

    assert_eq!(rig.audio.calls(), vec![AudioCall::Stop, AudioCall::Stop]);
    assert!(rig.overlays.calls().is_empty());
    assert_eq!(rig.host.detach_calls(), 0);
    assert_eq!(rig.state().await.lifecycle, OverlayLifecycle::Uninitialized);
}

#[tokio::test(start_paused = true)]
async fn test_recording_status_reaches_view() {
    let rig = joined_rig(ControllerConfig::default()).await;

    rig.publish(DomainEvent::RecordingStatusUpdated { recording: true })
        .await;

    assert!(rig.state().await.recording);
    assert_eq!(rig.overlays.calls(), vec![ViewCall::RecordingStatus(true)]);
}

// ============================================================================
// Filter
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_filter_drops_other_conferences() {
    let allow: HashSet<String> = ["conf-1".to_string()].into_iter().collect();
    let rig = TestRig::spawn(ControllerConfig::default().with_filter(ConferenceFilter::AllowList(allow)));
    rig.conference.go_live("conf-2");

    rig.publish(events::joined("conf-2")).await;
    assert!(!rig.state().await.has_overlay);

    // Alias match is enough
    rig.publish(events::joined_with_alias("conf-2", "conf-1"))
        .await;
    assert!(rig.state().await.has_overlay);
}

#[tokio::test(start_paused = true)]
async fn test_predicate_filter() {
    let filter = ConferenceFilter::predicate(|id| id.starts_with("team-"));
    let rig = TestRig::spawn(ControllerConfig::default().with_filter(filter));
    rig.conference.go_live("lobby");

    rig.publish(events::joined("lobby")).await;
    assert!(!rig.state().await.has_overlay);

    rig.publish(events::created("team-7")).await;
    assert!(rig.state().await.has_overlay);
}

// ============================================================================
// Enabled toggle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_reenable_resyncs_with_single_push() {
    let rig = joined_rig(ControllerConfig::default()).await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(rig.state().await.lifecycle, OverlayLifecycle::Showing);

    rig.handle.set_enabled(false).await.unwrap();
    let state = rig.state().await;
    assert!(!state.subscribed);
    assert_eq!(state.lifecycle, OverlayLifecycle::RetainedHidden);

    // Missed while unsubscribed
    rig.publish_all([
        events::participant_joined(TestParticipant::new("a")),
        events::participant_joined(TestParticipant::new("b")),
        events::participant_joined(TestParticipant::new("c")),
    ])
    .await;
    rig.conference.set_roster(vec![
        TestParticipant::new("a").build(),
        TestParticipant::new("b").build(),
        TestParticipant::new("c").build(),
    ]);
    rig.overlays.clear();

    rig.handle.set_enabled(true).await.unwrap();

    assert_eq!(
        rig.overlays.roster_pushes(),
        vec![vec!["a".to_string(), "b".to_string(), "c".to_string()]]
    );
    assert_eq!(
        stream_pushes(&rig),
        vec![StreamKind::Camera, StreamKind::ScreenShare]
    );

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let state = rig.state().await;
    assert!(state.subscribed);
    assert_eq!(state.lifecycle, OverlayLifecycle::Showing);
    assert_eq!(state.attach_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_from_start_does_not_subscribe() {
    let rig = TestRig::spawn(ControllerConfig::default().with_enabled(false));
    rig.conference.go_live("conf-1");

    assert_eq!(rig.bus.subscriber_count(), 0);
    rig.handle.dispatch(events::joined("conf-1")).await.unwrap();
    assert!(!rig.state().await.has_overlay);

    rig.handle.set_enabled(true).await.unwrap();
    assert_eq!(rig.bus.subscriber_count(), 1);

    rig.publish(events::joined("conf-1")).await;
    assert!(rig.state().await.has_overlay);
}

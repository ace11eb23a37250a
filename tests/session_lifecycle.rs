//! Session lifecycle and processor selection through the public API

mod common;

use common::{frame, HeldFactory, RecordingPlayer};
use std::io::Write;
use std::sync::Arc;
use vision_overlay::{
    CollectingNotifier, DefaultProcessorFactory, NotificationLevel, OverlayError, PlayerState,
    ProcessorKind, SessionConfig, SharedOverlay, SubmitOutcome, VideoSession, POSE_DETECTION,
};

fn session(
    config: SessionConfig,
    factory: HeldFactory,
) -> (VideoSession, RecordingPlayer, CollectingNotifier, SharedOverlay) {
    let player = RecordingPlayer::new();
    let notifier = CollectingNotifier::new();
    let overlay = SharedOverlay::new();
    let session = VideoSession::new(
        config,
        Box::new(player.clone()),
        Arc::new(overlay.clone()),
        Box::new(factory),
        Arc::new(notifier.clone()),
    )
    .unwrap();
    (session, player, notifier, overlay)
}

#[test]
fn test_full_lifecycle_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "processor": "Pose Detection", "mirrored": true }}"#
    )
    .unwrap();
    let config = SessionConfig::from_file(file.path()).unwrap();

    let factory = HeldFactory::new();
    let (mut session, player, notifier, overlay) = session(config, factory.clone());
    assert_eq!(session.selected_processor(), ProcessorKind::PoseDetection);

    session.open_video(Some("file:///videos/lunges.mp4")).unwrap();
    assert_eq!(session.player_state(), PlayerState::Playing);

    assert!(session.resume());
    assert_eq!(session.submit_frame(frame(0, 640, 360)), SubmitOutcome::Dispatched);
    let snapshot = overlay.snapshot();
    assert!(snapshot.mirrored);
    assert_eq!(snapshot.dimension_updates, 1);

    session.pause().unwrap();
    assert!(factory.created()[0].is_stopped());
    assert!(!session.has_processor());

    // Resume picks the processor back up without replaying the last frame
    assert!(session.resume());
    assert!(factory.created()[1].dispatched().is_empty());

    session.destroy().unwrap();
    assert_eq!(
        player.calls(),
        vec![
            "stop",
            "set_source:file:///videos/lunges.mp4",
            "prepare",
            "play",
            "pause",
            "stop",
            "release",
        ]
    );
    assert!(notifier.messages().is_empty());
}

#[test]
fn test_switching_processors_replays_last_frame() {
    let factory = HeldFactory::new();
    let (mut session, _player, _notifier, _overlay) = session(SessionConfig::default(), factory.clone());
    session.resume();

    session.submit_frame(frame(0, 64, 64));
    session.submit_frame(frame(1, 64, 64));
    assert_eq!(
        session.select_processor(POSE_DETECTION).unwrap(),
        Some(SubmitOutcome::Dispatched)
    );

    let created = factory.created();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].dispatched(), vec![0]);
    assert_eq!(created[1].dispatched(), vec![1]);

    // The replaced processor abandoned frame 0 silently
    assert_eq!(session.pump_completions(), 0);
    assert!(session.pacer().is_busy());
}

#[test]
fn test_unknown_label_is_rejected() {
    let factory = HeldFactory::new();
    let (mut session, _player, _notifier, _overlay) = session(SessionConfig::default(), factory.clone());
    session.resume();

    let err = session.select_processor("Barcode Scanning").unwrap_err();
    assert!(matches!(err, OverlayError::UnknownProcessor(_)));
    assert_eq!(session.selected_processor(), ProcessorKind::FaceDetection);
    assert_eq!(factory.created().len(), 1);
}

#[test]
fn test_creation_failure_is_reported_once() {
    let (mut session, _player, notifier, overlay) =
        session(SessionConfig::default(), HeldFactory::failing("classifier asset missing"));

    assert!(!session.resume());
    assert_eq!(session.submit_frame(frame(0, 10, 10)), SubmitOutcome::Dropped);
    assert_eq!(session.submit_frame(frame(1, 10, 10)), SubmitOutcome::Dropped);
    assert_eq!(overlay.snapshot().dimension_updates, 0);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, NotificationLevel::Error);
    assert_eq!(
        messages[0].1,
        "Can not create image processor: Invalid configuration: classifier asset missing"
    );
}

#[test]
fn test_default_factory_requires_injection() {
    let notifier = CollectingNotifier::new();
    let mut session = VideoSession::new(
        SessionConfig::default(),
        Box::new(RecordingPlayer::new()),
        Arc::new(SharedOverlay::new()),
        Box::new(DefaultProcessorFactory),
        Arc::new(notifier.clone()),
    )
    .unwrap();

    assert!(!session.resume());
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].1.contains("Must be injected"));
}

#[test]
fn test_no_video_chosen() {
    let (mut session, player, _notifier, _overlay) = session(SessionConfig::default(), HeldFactory::new());
    session.open_video(None).unwrap();
    assert!(player.calls().is_empty());
    assert_eq!(session.player_state(), PlayerState::Idle);
}

mod common;

use std::sync::atomic::Ordering;

use common::{drain, Behaviour, FakeHub};
use hub_client::event::{self, ClientEvent};
use hub_client::upload::{UploadError, UploadOutcome, UploadPhase};
use hub_client::ClientSession;

fn write_clip(dir: &tempfile::TempDir, name: &str, len: usize) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, vec![7u8; len]).unwrap();
    path
}

#[tokio::test]
async fn test_upload_success() {
    let hub = FakeHub::start(Behaviour::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_clip(&dir, "my_summer-trip.mp4", 300_000);

    let (tx, mut rx) = event::channel();
    let mut session = ClientSession::new(hub.config(), tx).unwrap();
    session.select_file(&path, None).await.unwrap();
    assert_eq!(session.upload().view().title, "My summer trip");
    session.set_description("  beach  ");
    session.set_tags("sea,sun");

    let outcome = session.submit_upload().await.unwrap();
    let expected_link = format!("{}/watch/42", hub.base_url());
    match &outcome {
        UploadOutcome::Succeeded {
            video_id,
            watch_url,
        } => {
            assert_eq!(video_id.as_ref().map(|v| v.to_string()).as_deref(), Some("42"));
            assert_eq!(watch_url.as_deref(), Some(expected_link.as_str()));
        }
        other => panic!("expected success, got {:?}", other),
    }

    let view = session.upload().view();
    assert_eq!(session.upload().phase(), UploadPhase::Succeeded);
    assert!(view.success_visible);
    assert_eq!(view.progress_percent, 100);
    assert_eq!(view.progress_size, "300.0 KB / 300.0 KB");

    let record = hub.state.last_upload.lock().unwrap().clone().unwrap();
    assert_eq!(record.file_name.as_deref(), Some("my_summer-trip.mp4"));
    assert_eq!(record.content_type.as_deref(), Some("video/mp4"));
    assert_eq!(record.bytes, 300_000);
    assert_eq!(record.title, "My summer trip");
    assert_eq!(record.description, "beach");
    assert_eq!(record.tags, "sea,sun");

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|ev| matches!(ev, ClientEvent::UploadProgress(_))));
    assert!(events
        .iter()
        .any(|ev| matches!(ev, ClientEvent::UploadFinished(UploadOutcome::Succeeded { .. }))));
    assert!(!events.iter().any(|ev| matches!(ev, ClientEvent::Alert(_))));
}

#[tokio::test]
async fn test_server_error_resets_flow() {
    let hub = FakeHub::start(Behaviour {
        upload_status: Some(500),
        ..Behaviour::default()
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_clip(&dir, "clip.webm", 1000);

    let (tx, mut rx) = event::channel();
    let mut session = ClientSession::new(hub.config(), tx).unwrap();
    session.select_file(&path, None).await.unwrap();
    let outcome = session.submit_upload().await.unwrap();
    assert_eq!(
        outcome,
        UploadOutcome::Failed {
            reason: "Upload failed: Internal Server Error".to_string()
        }
    );

    let flow = session.upload();
    assert_eq!(flow.phase(), UploadPhase::Idle);
    assert!(flow.selected().is_none());
    let view = flow.view();
    assert!(view.submit_enabled);
    assert_eq!(view.progress_percent, 0);
    assert_eq!(view.progress_size, "");
    assert_eq!(view.file_input, None);
    assert_eq!(view.preview, None);
    assert!(!view.progress_visible);

    let alerts: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter_map(|ev| match ev {
            ClientEvent::Alert(text) => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(alerts, vec!["Upload failed: Internal Server Error".to_string()]);
}

#[tokio::test]
async fn test_unexpected_body_still_succeeds() {
    let hub = FakeHub::start(Behaviour {
        upload_body: Some("<html>ok</html>".to_string()),
        ..Behaviour::default()
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_clip(&dir, "clip.mp4", 10);

    let (tx, mut rx) = event::channel();
    let mut session = ClientSession::new(hub.config(), tx).unwrap();
    session.select_file(&path, None).await.unwrap();
    let outcome = session.submit_upload().await.unwrap();
    assert_eq!(
        outcome,
        UploadOutcome::Succeeded {
            video_id: None,
            watch_url: None
        }
    );
    assert_eq!(session.upload().phase(), UploadPhase::Succeeded);
    assert!(drain(&mut rx).iter().any(|ev| matches!(
        ev,
        ClientEvent::Alert(text) if text == "Upload completed but response was unexpected"
    )));
}

#[tokio::test]
async fn test_blank_title_sends_nothing() {
    let hub = FakeHub::start(Behaviour::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_clip(&dir, "clip.mp4", 10);

    let (tx, mut rx) = event::channel();
    let mut session = ClientSession::new(hub.config(), tx).unwrap();
    session.select_file(&path, None).await.unwrap();
    session.set_title("   ");

    assert_eq!(session.submit_upload().await, Err(UploadError::MissingTitle));
    assert_eq!(session.upload().phase(), UploadPhase::Selected);
    assert_eq!(hub.state.uploads.load(Ordering::SeqCst), 0);
    assert!(drain(&mut rx).iter().any(|ev| matches!(
        ev,
        ClientEvent::Alert(text) if text == "Please enter a title"
    )));
}

#[tokio::test]
async fn test_oversized_file_rejected() {
    let hub = FakeHub::start(Behaviour::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.mp4");
    let file = std::fs::File::create(&path).unwrap();
    file.set_len(600 * 1024 * 1024).unwrap();

    let (tx, mut rx) = event::channel();
    let mut session = ClientSession::new(hub.config(), tx).unwrap();
    let err = session.select_file(&path, None).await.unwrap_err();
    assert_eq!(err, UploadError::TooLarge { max_mb: 500 });
    assert_eq!(session.upload().phase(), UploadPhase::Idle);
    assert!(drain(&mut rx).iter().any(|ev| matches!(
        ev,
        ClientEvent::Alert(text) if text == "File too large. Maximum size is 500MB."
    )));
}

#[tokio::test]
async fn test_non_video_rejected_unless_declared() {
    let hub = FakeHub::start(Behaviour::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_clip(&dir, "notes.txt", 10);

    let (tx, _rx) = event::channel();
    let mut session = ClientSession::new(hub.config(), tx).unwrap();
    assert_eq!(
        session.select_file(&path, None).await,
        Err(UploadError::UnsupportedType)
    );
    assert_eq!(session.upload().phase(), UploadPhase::Idle);

    session
        .select_file(&path, Some("video/mp4".to_string()))
        .await
        .unwrap();
    assert_eq!(session.upload().phase(), UploadPhase::Selected);
}

#[tokio::test]
async fn test_background_upload_through_events() {
    let hub = FakeHub::start(Behaviour::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_clip(&dir, "clip.mp4", 50_000);

    let (tx, mut rx) = event::channel();
    let mut session = ClientSession::new(hub.config(), tx).unwrap();
    session.select_file(&path, None).await.unwrap();
    let pending = session.begin_upload().unwrap();
    assert_eq!(pending.request().title, "Clip");
    pending.spawn();

    // a second submit while in flight is refused
    assert_eq!(session.begin_upload().err(), Some(UploadError::Busy));

    loop {
        let ev = rx.recv().await.unwrap();
        session.apply_event(&ev);
        if matches!(ev, ClientEvent::UploadFinished(_)) {
            break;
        }
    }
    assert_eq!(session.upload().phase(), UploadPhase::Succeeded);
    assert_eq!(hub.state.uploads.load(Ordering::SeqCst), 1);
}

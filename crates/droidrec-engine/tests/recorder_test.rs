mod common;

use common::*;
use droidrec_engine::backend::NullBackend;
use droidrec_engine::protocol::{Bounds, ClassifiedAction};
use droidrec_engine::recorder::StepRecorder;
use droidrec_engine::store::RecordStore;
use std::sync::Arc;

#[tokio::test]
async fn test_start_session_captures_initial_step() {
    let dir = tempfile::tempdir().unwrap();
    let device = Arc::new(MockDevice::healthy());
    let mut recorder = StepRecorder::new(device.clone(), recording_config(dir.path().to_path_buf()));

    let initial = recorder.start_session("turn on wifi").await.unwrap();
    assert_eq!(initial.step_id, 0);
    assert!(initial.is_initial());
    assert_eq!(initial.screen_shot, "step_0.png");
    assert_eq!(
        initial.activity_info.as_deref(),
        Some("com.android.settings/.Settings")
    );
    assert!(initial.operated_bounds.is_none());

    let session = recorder.session().unwrap();
    let log = RecordStore::load(&session.store().log_path()).await.unwrap();
    assert_eq!(log.target.as_deref(), Some("turn on wifi"));
    assert_eq!(log.steps, vec![initial]);
    assert!(session.store().screenshot_path(0).exists());
}

#[tokio::test]
async fn test_record_enriches_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let device = Arc::new(MockDevice::healthy());
    let mut recorder = StepRecorder::new(device.clone(), recording_config(dir.path().to_path_buf()));
    recorder.start_session("tap ok").await.unwrap();

    let step = recorder
        .record(ClassifiedAction::Tap { x: 100, y: 100 })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(step.step_id, 1);
    assert_eq!(step.screen_shot, "step_1.png");
    assert_eq!(step.ui_tree.as_deref(), Some("step_1.xml"));
    assert_eq!(step.operated_bounds, Some(Bounds::new(50, 50, 250, 150)));
    assert!(step.processed_screen_shot.is_none());

    let store = recorder.session().unwrap().store().clone();
    assert!(store.screenshot_path(1).exists());
    assert_eq!(
        tokio::fs::read_to_string(store.ui_tree_path(1)).await.unwrap(),
        SETTINGS_DUMP
    );

    let persisted = RecordStore::load(&store.log_path()).await.unwrap();
    assert_eq!(&persisted, recorder.session().unwrap().log());
    assert_eq!(persisted.steps.len(), 2);
}

#[tokio::test]
async fn test_swipe_has_no_operated_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let device = Arc::new(MockDevice::healthy());
    let mut recorder = StepRecorder::new(device, recording_config(dir.path().to_path_buf()));
    recorder.start_session("scroll").await.unwrap();

    let step = recorder
        .record(ClassifiedAction::Swipe {
            start_x: 100,
            start_y: 100,
            end_x: 100,
            end_y: 900,
            duration: 0.3,
        })
        .await
        .unwrap()
        .unwrap();
    assert!(step.operated_bounds.is_none());
    assert!(step.ui_tree.is_some());
}

#[tokio::test]
async fn test_step_ids_are_dense_across_deletes() {
    let dir = tempfile::tempdir().unwrap();
    let device = Arc::new(MockDevice::healthy());
    let mut recorder = StepRecorder::new(device, recording_config(dir.path().to_path_buf()));
    recorder.start_session("ids").await.unwrap();

    for i in 0..3 {
        let step = recorder
            .record(ClassifiedAction::Tap { x: i, y: i })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(step.step_id, i as u32 + 1);
    }
    assert_eq!(recorder.session().unwrap().next_step_id(), 4);

    let store = recorder.session().unwrap().store().clone();
    assert!(store.screenshot_path(3).exists());

    let deleted = recorder.delete_last().await.unwrap().unwrap();
    assert_eq!(deleted.step_id, 3);
    assert_eq!(recorder.session().unwrap().next_step_id(), 3);
    assert!(!store.screenshot_path(3).exists());
    assert!(!store.ui_tree_path(3).exists());

    let reused = recorder
        .record(ClassifiedAction::special("KEY_HOME"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reused.step_id, 3);

    let log = RecordStore::load(&store.log_path()).await.unwrap();
    let ids: Vec<u32> = log.steps.iter().map(|s| s.step_id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_delete_never_removes_initial_step() {
    let dir = tempfile::tempdir().unwrap();
    let device = Arc::new(MockDevice::healthy());
    let mut recorder = StepRecorder::new(device, recording_config(dir.path().to_path_buf()));

    // No session: no-op.
    assert!(recorder.delete_last().await.unwrap().is_none());

    recorder.start_session("empty").await.unwrap();
    assert!(recorder.delete_last().await.unwrap().is_none());
    assert_eq!(recorder.session().unwrap().log().steps.len(), 1);
}

#[tokio::test]
async fn test_collaborator_failures_degrade_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let device = Arc::new(MockDevice::broken());
    let mut recorder = StepRecorder::new(device.clone(), recording_config(dir.path().to_path_buf()));
    recorder.start_session("flaky").await.unwrap();

    let step = recorder
        .record(ClassifiedAction::Tap { x: 10, y: 10 })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(step.step_id, 1);
    assert!(step.activity_info.is_none());
    assert!(step.ui_tree.is_none());
    assert!(step.operated_bounds.is_none());
    assert!(step.processed_screen_shot.is_none());
    assert_eq!(step.screen_shot, "step_1.png");

    let calls = device.calls();
    assert!(calls.contains(&"foreground_screen"));
    assert!(calls.contains(&"dump_ui_tree"));
    assert!(calls.contains(&"capture_screenshot"));
}

#[tokio::test]
async fn test_hung_collaborators_time_out() {
    let dir = tempfile::tempdir().unwrap();
    let device = Arc::new(MockDevice {
        hang: true,
        ..MockDevice::healthy()
    });
    let mut config = recording_config(dir.path().to_path_buf());
    config.collaborator_timeout_ms = 20;
    let mut recorder = StepRecorder::new(device, config);
    recorder.start_session("hung").await.unwrap();

    let step = recorder
        .record(ClassifiedAction::special("KEY_BACK"))
        .await
        .unwrap()
        .unwrap();
    assert!(step.activity_info.is_none());
    assert!(step.ui_tree.is_none());
}

#[tokio::test]
async fn test_annotation_when_supported() {
    let dir = tempfile::tempdir().unwrap();
    let device = Arc::new(MockDevice {
        annotate: true,
        ..MockDevice::healthy()
    });
    let mut recorder = StepRecorder::new(device, recording_config(dir.path().to_path_buf()));
    let initial = recorder.start_session("overlay").await.unwrap();
    assert!(initial.processed_screen_shot.is_none());

    let step = recorder
        .record(ClassifiedAction::Tap { x: 60, y: 60 })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        step.processed_screen_shot.as_deref(),
        Some("step_1_processed.png")
    );
    let store = recorder.session().unwrap().store();
    assert!(store.processed_screenshot_path(1).exists());
}

#[tokio::test]
async fn test_actions_outside_session_are_not_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let device = Arc::new(MockDevice::healthy());
    let mut recorder = StepRecorder::new(device.clone(), recording_config(dir.path().to_path_buf()));

    let step = recorder
        .record(ClassifiedAction::Tap { x: 1, y: 1 })
        .await
        .unwrap();
    assert!(step.is_none());
    assert!(device.calls().is_empty());
    assert!(!recorder.status().recording);
}

#[tokio::test]
async fn test_finish_seals_session() {
    let dir = tempfile::tempdir().unwrap();
    let device = Arc::new(MockDevice::healthy());
    let mut recorder = StepRecorder::new(device, recording_config(dir.path().to_path_buf()));
    recorder.start_session("seal").await.unwrap();
    recorder
        .record(ClassifiedAction::special("KEY_BACK"))
        .await
        .unwrap();

    let status = recorder.status();
    assert!(status.recording);
    assert_eq!(status.step_count, 1);
    assert_eq!(status.target.as_deref(), Some("seal"));

    let log = recorder.finish_session().await.unwrap().unwrap();
    assert_eq!(log.action_count(), 1);
    assert!(recorder.finish_session().await.unwrap().is_none());
    assert!(
        recorder
            .record(ClassifiedAction::special("KEY_HOME"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_new_session_gets_its_own_directory() {
    let dir = tempfile::tempdir().unwrap();
    let device = Arc::new(MockDevice::healthy());
    let mut recorder = StepRecorder::new(device, recording_config(dir.path().to_path_buf()));

    recorder.start_session("first").await.unwrap();
    let first = recorder.status().record_dir.unwrap();
    recorder.start_session("second").await.unwrap();
    let second = recorder.status().record_dir.unwrap();

    assert_ne!(first, second);
    let sealed = RecordStore::load(&first.join("record.json")).await.unwrap();
    assert_eq!(sealed.target.as_deref(), Some("first"));
    assert_eq!(recorder.status().target.as_deref(), Some("second"));
}

#[tokio::test]
async fn test_null_backend_records_bare_steps() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = StepRecorder::new(
        Arc::new(NullBackend),
        recording_config(dir.path().to_path_buf()),
    );
    recorder.start_session("offline").await.unwrap();

    let step = recorder
        .record(ClassifiedAction::special("KEY_BACK"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(step.step_id, 1);
    assert_eq!(step.screen_shot, "step_1.png");
    assert!(step.activity_info.is_none());
    assert!(step.ui_tree.is_none());
    assert!(step.processed_screen_shot.is_none());
    assert_eq!(recorder.status().step_count, 1);
}

#[tokio::test]
async fn test_failed_append_leaves_log_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let device = Arc::new(MockDevice::healthy());
    let mut recorder = StepRecorder::new(device, recording_config(dir.path().to_path_buf()));
    recorder.start_session("blocked write").await.unwrap();
    let store = recorder.session().unwrap().store().clone();

    // A directory in place of the temp file makes the write fail.
    let tmp = store.root().join("record.json.tmp");
    std::fs::create_dir(&tmp).unwrap();
    assert!(recorder.record(ClassifiedAction::Tap { x: 1, y: 1 }).await.is_err());
    assert_eq!(recorder.session().unwrap().log().steps.len(), 1);
    assert_eq!(RecordStore::load(&store.log_path()).await.unwrap().steps.len(), 1);
    assert!(!store.screenshot_path(1).exists());

    std::fs::remove_dir(&tmp).unwrap();
    let step = recorder
        .record(ClassifiedAction::Tap { x: 2, y: 2 })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(step.step_id, 1);

    let persisted = RecordStore::load(&store.log_path()).await.unwrap();
    let ids: Vec<u32> = persisted.steps.iter().map(|s| s.step_id).collect();
    assert_eq!(ids, vec![0, 1]);
    assert_eq!(
        persisted.steps[1].action,
        Some(ClassifiedAction::Tap { x: 2, y: 2 })
    );
    assert_eq!(&persisted, recorder.session().unwrap().log());
}

#[tokio::test]
async fn test_failed_delete_keeps_step_and_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let device = Arc::new(MockDevice::healthy());
    let mut recorder = StepRecorder::new(device, recording_config(dir.path().to_path_buf()));
    recorder.start_session("undo blocked").await.unwrap();
    recorder
        .record(ClassifiedAction::Tap { x: 100, y: 100 })
        .await
        .unwrap();
    let store = recorder.session().unwrap().store().clone();

    let tmp = store.root().join("record.json.tmp");
    std::fs::create_dir(&tmp).unwrap();
    assert!(recorder.delete_last().await.is_err());
    assert_eq!(recorder.session().unwrap().log().steps.len(), 2);
    assert!(store.screenshot_path(1).exists());
    assert!(store.ui_tree_path(1).exists());

    std::fs::remove_dir(&tmp).unwrap();
    let deleted = recorder.delete_last().await.unwrap().unwrap();
    assert_eq!(deleted.step_id, 1);
    assert!(!store.screenshot_path(1).exists());
    assert_eq!(RecordStore::load(&store.log_path()).await.unwrap().steps.len(), 1);
}

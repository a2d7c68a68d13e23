//! Rescue flow: application closes, recent document gets copied.

use std::fs;
use std::sync::atomic::Ordering;
use std::time::{Duration, SystemTime};

use super::test_helpers::{test_config, FakePresence};
use wordtrack_session::rescue::{copy_preserving, RescueOutcome, RescueWatcher};
use wordtrack_session::SessionSupervisor;

#[tokio::test]
async fn closed_application_document_is_copied_to_destination() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = test_config(temp.path());
    let document = temp.path().join("Word add-in session.docx");
    fs::write(&document, b"PK\x03\x04 tracked changes").expect("write document");
    let destination = config.rescue.destination().expect("destination");

    let watcher = RescueWatcher::new(&config.rescue, destination.clone(), FakePresence::absent());
    let outcome = watcher.run().await;

    assert_eq!(
        outcome,
        RescueOutcome::Saved {
            source: document.clone(),
            destination: destination.clone(),
        }
    );
    assert_eq!(
        fs::read(&destination).expect("read copy"),
        fs::read(&document).expect("read original")
    );
}

#[tokio::test]
async fn watcher_waits_while_application_is_open() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = test_config(temp.path());
    fs::write(temp.path().join("Word add-in draft.docx"), b"draft").expect("write document");
    let destination = config.rescue.destination().expect("destination");
    let (presence, calls) = FakePresence::present_for(3);

    let outcome = RescueWatcher::new(&config.rescue, destination.clone(), presence)
        .run()
        .await;

    assert!(matches!(outcome, RescueOutcome::Saved { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 4, "three present checks, one absent");
}

#[tokio::test]
async fn no_candidate_reports_not_found() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = test_config(temp.path());
    fs::write(temp.path().join("Unrelated.docx"), b"other").expect("write file");
    let destination = config.rescue.destination().expect("destination");

    let outcome = RescueWatcher::new(&config.rescue, destination.clone(), FakePresence::absent())
        .run()
        .await;

    assert_eq!(outcome, RescueOutcome::NotFound);
    assert!(!destination.exists());
}

#[tokio::test]
async fn copy_failure_reports_original_location() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = test_config(temp.path());
    let document = temp.path().join("Word add-in session.docx");
    fs::write(&document, b"content").expect("write document");
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, b"not a directory").expect("write blocker");

    let outcome = RescueWatcher::new(
        &config.rescue,
        blocker.join("Default.docx"),
        FakePresence::absent(),
    )
    .run()
    .await;

    match outcome {
        RescueOutcome::CopyFailed { source, .. } => assert_eq!(source, document),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(document.exists(), "original left in place");
}

#[test]
fn copy_keeps_modification_time() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = temp.path().join("source.docx");
    fs::write(&source, b"body").expect("write source");
    let earlier = SystemTime::now() - Duration::from_secs(600);
    fs::File::options()
        .write(true)
        .open(&source)
        .expect("open source")
        .set_modified(earlier)
        .expect("set mtime");
    let destination = temp.path().join("nested").join("Default.docx");

    let bytes = copy_preserving(&source, &destination).expect("copy");

    assert_eq!(bytes, 4);
    let copied = fs::metadata(&destination).expect("metadata").modified().expect("mtime");
    let original = fs::metadata(&source).expect("metadata").modified().expect("mtime");
    assert_eq!(copied, original);
}

#[tokio::test]
async fn supervisor_starts_watcher_once() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(temp.path());
    config.rescue.enabled = true;
    fs::write(temp.path().join("Word add-in session.docx"), b"doc").expect("write document");
    let destination = config.rescue.destination().expect("destination");
    let mut supervisor = SessionSupervisor::with_presence(config, FakePresence::absent());

    supervisor.start_watcher();
    supervisor.start_watcher();

    let watcher = supervisor.take_watcher().expect("watcher started");
    let outcome = tokio::time::timeout(Duration::from_secs(5), watcher)
        .await
        .expect("watcher finishes")
        .expect("watcher task");
    assert!(matches!(outcome, RescueOutcome::Saved { .. }));
    assert!(destination.exists());
    assert!(supervisor.take_watcher().is_none());
}

#[tokio::test]
async fn disabled_rescue_starts_no_watcher() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = test_config(temp.path());
    let mut supervisor = SessionSupervisor::with_presence(config, FakePresence::absent());

    supervisor.start_watcher();

    assert!(supervisor.take_watcher().is_none());
}

#[tokio::test]
async fn crashed_search_is_not_reported_as_missing_document() {
    let crashed = tokio::task::spawn_blocking(|| -> RescueOutcome { panic!("scan crashed") }).await;

    let outcome = RescueOutcome::from_task(crashed);

    assert!(matches!(outcome, RescueOutcome::SearchFailed { .. }));
    outcome.report();
}

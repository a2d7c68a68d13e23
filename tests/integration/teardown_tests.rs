//! Teardown stops what the session owns and nothing else.

use serial_test::serial;

use super::test_helpers::{sh, sleeper, test_config, FakePresence};
use wordtrack_session::process::{OutputTarget, ProcessHandle};
use wordtrack_session::supervisor::SlotName;
use wordtrack_session::SessionSupervisor;

#[tokio::test]
#[serial]
async fn teardown_stops_every_owned_slot() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = test_config(temp.path());
    let mut supervisor = SessionSupervisor::with_presence(config, FakePresence::absent());
    for name in [SlotName::Proxy, SlotName::Launcher, SlotName::DevServer] {
        supervisor
            .session_mut()
            .slot_mut(name)
            .set_handle(sleeper(name.label(), temp.path()));
    }

    let report = supervisor.teardown().await;

    assert_eq!(
        report.stopped,
        vec![SlotName::Proxy, SlotName::DevServer, SlotName::Launcher]
    );
    assert!(report.skipped.is_empty());
    for name in [SlotName::Proxy, SlotName::Launcher, SlotName::DevServer] {
        let handle = supervisor
            .session_mut()
            .slot_mut(name)
            .handle_mut()
            .expect("handle kept");
        assert!(!handle.is_running(), "{name} still running");
    }
}

#[tokio::test]
#[serial]
async fn teardown_never_terminates_already_running_slot() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = test_config(temp.path());
    let mut supervisor = SessionSupervisor::with_presence(config, FakePresence::absent());
    let proxy = supervisor.session_mut().slot_mut(SlotName::Proxy);
    proxy.set_handle(sleeper("proxy", temp.path()));
    proxy.mark_already_running();
    supervisor
        .session_mut()
        .slot_mut(SlotName::Launcher)
        .set_handle(sleeper("launcher", temp.path()));

    let report = supervisor.teardown().await;

    assert_eq!(report.skipped, vec![SlotName::Proxy]);
    assert_eq!(report.stopped, vec![SlotName::Launcher]);
    let mut external = supervisor
        .session_mut()
        .slot_mut(SlotName::Proxy)
        .take_handle()
        .expect("proxy handle");
    assert!(external.is_running(), "adopted process must survive teardown");
    external.terminate(std::time::Duration::from_millis(300)).await;
}

#[tokio::test]
#[serial]
async fn adopted_slot_without_handle_is_reported_skipped() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = test_config(temp.path());
    let mut supervisor = SessionSupervisor::with_presence(config, FakePresence::absent());
    supervisor
        .session_mut()
        .slot_mut(SlotName::Proxy)
        .mark_already_running();

    let report = supervisor.teardown().await;

    assert_eq!(report.skipped, vec![SlotName::Proxy]);
    assert!(report.stopped.is_empty());
}

#[tokio::test]
#[serial]
async fn teardown_runs_only_once() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = test_config(temp.path());
    let mut supervisor = SessionSupervisor::with_presence(config, FakePresence::absent());
    supervisor
        .session_mut()
        .slot_mut(SlotName::Launcher)
        .set_handle(sleeper("launcher", temp.path()));

    let first = supervisor.teardown().await;
    let second = supervisor.teardown().await;

    assert_eq!(first.stopped, vec![SlotName::Launcher]);
    assert!(second.stopped.is_empty() && second.skipped.is_empty());
    assert!(supervisor.is_torn_down());
}

#[tokio::test]
#[serial]
async fn teardown_deletes_remaining_logs() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = test_config(temp.path());
    let log_path = temp.path().join("dev.log");
    let mut supervisor = SessionSupervisor::with_presence(config, FakePresence::absent());
    let handle = ProcessHandle::spawn(
        "dev-server",
        &sh("echo compiling; sleep 5"),
        temp.path(),
        OutputTarget::File(log_path.clone()),
    )
    .expect("spawn dev server");
    supervisor
        .session_mut()
        .slot_mut(SlotName::DevServer)
        .set_handle(handle);
    assert!(log_path.exists());

    supervisor.teardown().await;

    assert!(!log_path.exists());
}

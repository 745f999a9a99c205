use dictate_foundation::env::{is_wayland, is_x11};
use std::process::Command;

/// spec §4.4: "Selected-text capture is deliberately conservative: an
/// implementation MAY return null rather than simulate a copy keystroke."
/// This always returns `None` — the synthetic-copy-keystroke variant would
/// stomp the user's existing clipboard contents, which this implementation
/// chooses never to risk.
pub fn selected_text() -> Option<String> {
    None
}

/// Clipboard capture, read-only — spec §4.4: "reads without writing."
pub fn clipboard_text() -> Option<String> {
    if is_wayland() {
        read_wl_paste()
    } else if is_x11() {
        read_xclip()
    } else {
        None
    }
}

fn read_wl_paste() -> Option<String> {
    let output = Command::new("wl-paste").arg("--no-newline").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn read_xclip() -> Option<String> {
    let output = Command::new("xclip")
        .args(["-selection", "clipboard", "-o"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_text_always_returns_none() {
        assert_eq!(selected_text(), None);
    }
}

//! Foreground-app context capture and classification (C4). Runs once per
//! recording session, in the background, so it never delays audio flow.

pub mod classify;
pub mod selected_text;
pub mod snapshot;

pub use classify::{classify, AppContextTag, Tone};
pub use snapshot::{ForegroundWindow, ForegroundWindowCache};

/// spec §3 Captured Context: an immutable record created once per session.
#[derive(Debug, Clone)]
pub struct CapturedContext {
    pub app_name: String,
    pub window_title: String,
    pub app_context_tag: AppContextTag,
    pub suggested_tone: Tone,
    pub selected_text: Option<String>,
    pub clipboard_text: Option<String>,
    pub mode_id: Option<String>,
}

impl Default for CapturedContext {
    /// The default used when capture has not finished by the time the auth
    /// message is sent (spec §4.4: "a default context is used and the
    /// capture result is discarded").
    fn default() -> Self {
        Self {
            app_name: String::new(),
            window_title: String::new(),
            app_context_tag: AppContextTag::General,
            suggested_tone: Tone::Formal,
            selected_text: None,
            clipboard_text: None,
            mode_id: None,
        }
    }
}

/// Collects the foreground window, classifies it, and optionally reads the
/// clipboard (spec §4.4 steps 1-4). Intended to be spawned as a background
/// task by the state machine on session start; `capture_clipboard` is an
/// explicit opt-in since clipboard reads, while non-mutating, still touch a
/// system-global resource.
pub fn capture(cache: &ForegroundWindowCache, capture_clipboard: bool) -> CapturedContext {
    let window = cache.get();
    let (tag, tone) = classify(&window.process_name, &window.window_title);
    CapturedContext {
        app_name: window.process_name,
        window_title: window.window_title,
        app_context_tag: tag,
        suggested_tone: tone,
        selected_text: selected_text::selected_text(),
        clipboard_text: if capture_clipboard {
            selected_text::clipboard_text()
        } else {
            None
        },
        mode_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_general_formal() {
        let ctx = CapturedContext::default();
        assert_eq!(ctx.app_context_tag, AppContextTag::General);
        assert_eq!(ctx.suggested_tone, Tone::Formal);
    }

    #[test]
    fn capture_without_clipboard_leaves_it_none() {
        let cache = ForegroundWindowCache::new();
        let ctx = capture(&cache, false);
        assert_eq!(ctx.clipboard_text, None);
        assert_eq!(ctx.selected_text, None);
    }
}

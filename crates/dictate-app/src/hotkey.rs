//! Global low-level key hook (C1) and hotkey binding parsing (spec §6).
//!
//! Grounded on the shared `Hotkey` parser used by CLI and desktop frontends
//! in the reference dictation tooling this workspace draws its platform
//! layer from: plus-separated modifier tokens, `rdev` for the raw,
//! before-focused-window hook. Adapted here to track Pressed-Key Snapshot
//! edges explicitly (key-down/key-up events for the state machine) rather
//! than firing a single callback, and to recognize Esc independently of the
//! configured binding.

use rdev::{listen, Event, EventType, Key};
use std::collections::HashSet;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum HotkeyParseError {
    #[error("empty hotkey string")]
    Empty,
    #[error("binding needs at least one modifier, or two when no non-modifier key is given")]
    InsufficientModifiers,
    #[error("unknown key: {0}")]
    UnknownKey(String),
}

/// spec §3 Hotkey Binding: a set of required modifiers plus at most one
/// non-modifier key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    pub key: Option<Key>,
}

impl HotkeyBinding {
    /// Parses a plus-separated, case-insensitive chord string (spec §6).
    pub fn parse(s: &str) -> Result<Self, HotkeyParseError> {
        let lower = s.trim().to_lowercase();
        if lower.is_empty() {
            return Err(HotkeyParseError::Empty);
        }

        let mut ctrl = false;
        let mut alt = false;
        let mut shift = false;
        let mut meta = false;
        let mut key = None;

        for part in lower.split('+').map(str::trim) {
            match part {
                "ctrl" | "control" | "commandorcontrol" => ctrl = true,
                "shift" => shift = true,
                "alt" | "option" => alt = true,
                "meta" | "cmd" | "command" | "super" | "win" => meta = true,
                other => key = Some(parse_key(other)?),
            }
        }

        let modifier_count = [ctrl, alt, shift, meta].iter().filter(|m| **m).count();
        let valid = if key.is_some() {
            modifier_count >= 1
        } else {
            modifier_count >= 2
        };
        if !valid {
            return Err(HotkeyParseError::InsufficientModifiers);
        }

        Ok(Self {
            ctrl,
            alt,
            shift,
            meta,
            key,
        })
    }

    /// The binding is "engaged" iff every required modifier and the
    /// non-modifier key (if any) are in the pressed-key snapshot.
    pub fn is_engaged(&self, pressed: &HashSet<Key>) -> bool {
        let ctrl_ok =
            !self.ctrl || pressed.contains(&Key::ControlLeft) || pressed.contains(&Key::ControlRight);
        let shift_ok =
            !self.shift || pressed.contains(&Key::ShiftLeft) || pressed.contains(&Key::ShiftRight);
        let alt_ok = !self.alt || pressed.contains(&Key::Alt) || pressed.contains(&Key::AltGr);
        let meta_ok =
            !self.meta || pressed.contains(&Key::MetaLeft) || pressed.contains(&Key::MetaRight);
        let key_ok = self.key.map(|k| pressed.contains(&k)).unwrap_or(true);

        ctrl_ok && shift_ok && alt_ok && meta_ok && key_ok
    }

    pub fn to_normalized_string(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl".to_string());
        }
        if self.alt {
            parts.push("Alt".to_string());
        }
        if self.shift {
            parts.push("Shift".to_string());
        }
        if self.meta {
            parts.push("Meta".to_string());
        }
        if let Some(key) = self.key {
            parts.push(key_to_string(key));
        }
        parts.join("+")
    }
}

fn parse_key(s: &str) -> Result<Key, HotkeyParseError> {
    let key = match s {
        "a" => Key::KeyA,
        "b" => Key::KeyB,
        "c" => Key::KeyC,
        "d" => Key::KeyD,
        "e" => Key::KeyE,
        "f" => Key::KeyF,
        "g" => Key::KeyG,
        "h" => Key::KeyH,
        "i" => Key::KeyI,
        "j" => Key::KeyJ,
        "k" => Key::KeyK,
        "l" => Key::KeyL,
        "m" => Key::KeyM,
        "n" => Key::KeyN,
        "o" => Key::KeyO,
        "p" => Key::KeyP,
        "q" => Key::KeyQ,
        "r" => Key::KeyR,
        "s" => Key::KeyS,
        "t" => Key::KeyT,
        "u" => Key::KeyU,
        "v" => Key::KeyV,
        "w" => Key::KeyW,
        "x" => Key::KeyX,
        "y" => Key::KeyY,
        "z" => Key::KeyZ,
        "0" => Key::Num0,
        "1" => Key::Num1,
        "2" => Key::Num2,
        "3" => Key::Num3,
        "4" => Key::Num4,
        "5" => Key::Num5,
        "6" => Key::Num6,
        "7" => Key::Num7,
        "8" => Key::Num8,
        "9" => Key::Num9,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        "space" => Key::Space,
        "enter" | "return" => Key::Return,
        "tab" => Key::Tab,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        other => return Err(HotkeyParseError::UnknownKey(other.to_string())),
    };
    Ok(key)
}

/// Inverse of `parse_key`: maps back to the token `parse` accepts, so
/// `to_normalized_string` round-trips through `parse`.
fn key_to_string(key: Key) -> String {
    match key {
        Key::KeyA => "A".to_string(),
        Key::KeyB => "B".to_string(),
        Key::KeyC => "C".to_string(),
        Key::KeyD => "D".to_string(),
        Key::KeyE => "E".to_string(),
        Key::KeyF => "F".to_string(),
        Key::KeyG => "G".to_string(),
        Key::KeyH => "H".to_string(),
        Key::KeyI => "I".to_string(),
        Key::KeyJ => "J".to_string(),
        Key::KeyK => "K".to_string(),
        Key::KeyL => "L".to_string(),
        Key::KeyM => "M".to_string(),
        Key::KeyN => "N".to_string(),
        Key::KeyO => "O".to_string(),
        Key::KeyP => "P".to_string(),
        Key::KeyQ => "Q".to_string(),
        Key::KeyR => "R".to_string(),
        Key::KeyS => "S".to_string(),
        Key::KeyT => "T".to_string(),
        Key::KeyU => "U".to_string(),
        Key::KeyV => "V".to_string(),
        Key::KeyW => "W".to_string(),
        Key::KeyX => "X".to_string(),
        Key::KeyY => "Y".to_string(),
        Key::KeyZ => "Z".to_string(),
        Key::Num0 => "0".to_string(),
        Key::Num1 => "1".to_string(),
        Key::Num2 => "2".to_string(),
        Key::Num3 => "3".to_string(),
        Key::Num4 => "4".to_string(),
        Key::Num5 => "5".to_string(),
        Key::Num6 => "6".to_string(),
        Key::Num7 => "7".to_string(),
        Key::Num8 => "8".to_string(),
        Key::Num9 => "9".to_string(),
        Key::F1 => "F1".to_string(),
        Key::F2 => "F2".to_string(),
        Key::F3 => "F3".to_string(),
        Key::F4 => "F4".to_string(),
        Key::F5 => "F5".to_string(),
        Key::F6 => "F6".to_string(),
        Key::F7 => "F7".to_string(),
        Key::F8 => "F8".to_string(),
        Key::F9 => "F9".to_string(),
        Key::F10 => "F10".to_string(),
        Key::F11 => "F11".to_string(),
        Key::F12 => "F12".to_string(),
        Key::Space => "Space".to_string(),
        Key::Return => "Enter".to_string(),
        Key::Tab => "Tab".to_string(),
        Key::Backspace => "Backspace".to_string(),
        Key::Delete => "Delete".to_string(),
        Key::UpArrow => "Up".to_string(),
        Key::DownArrow => "Down".to_string(),
        Key::LeftArrow => "Left".to_string(),
        Key::RightArrow => "Right".to_string(),
        other => format!("{other:?}"),
    }
}

/// Edges the state machine reacts to (spec §4.5's transition table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEdge {
    Engaged,
    Disengaged,
    EscPressed,
}

/// Installs the global low-level key hook (spec §4.1
/// `install_keyboard_hook`) and forwards edges on `binding` plus a
/// standing Esc watch. Runs on a dedicated blocking thread since `rdev`'s
/// `listen` call blocks for the process lifetime.
pub fn spawn_key_hook(binding: HotkeyBinding, tx: mpsc::Sender<HotkeyEdge>) {
    std::thread::spawn(move || {
        let mut pressed: HashSet<Key> = HashSet::new();
        let mut engaged = false;

        let callback = move |event: Event| match event.event_type {
            EventType::KeyPress(key) => {
                pressed.insert(key);
                if key == Key::Escape {
                    let _ = tx.blocking_send(HotkeyEdge::EscPressed);
                }
                if !engaged && binding.is_engaged(&pressed) {
                    engaged = true;
                    let _ = tx.blocking_send(HotkeyEdge::Engaged);
                }
            }
            EventType::KeyRelease(key) => {
                pressed.remove(&key);
                if engaged && !binding.is_engaged(&pressed) {
                    engaged = false;
                    let _ = tx.blocking_send(HotkeyEdge::Disengaged);
                }
            }
            _ => {}
        };

        if let Err(e) = listen(callback) {
            tracing::error!("global key hook failed to install: {e:?}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_modifiers_and_key() {
        let binding = HotkeyBinding::parse("Ctrl+Shift+Space").unwrap();
        assert!(binding.ctrl && binding.shift && !binding.alt);
        assert_eq!(binding.key, Some(Key::Space));
    }

    #[test]
    fn rejects_single_modifier_with_no_key() {
        assert!(HotkeyBinding::parse("Ctrl").is_err());
    }

    #[test]
    fn accepts_two_modifiers_with_no_key() {
        assert!(HotkeyBinding::parse("Ctrl+Alt").is_ok());
    }

    #[test]
    fn rejects_unknown_key() {
        assert!(HotkeyBinding::parse("Ctrl+Nonsense").is_err());
    }

    #[test]
    fn round_trips_through_normalized_string() {
        let binding = HotkeyBinding::parse("shift+ctrl+w").unwrap();
        let normalized = binding.to_normalized_string();
        let reparsed = HotkeyBinding::parse(&normalized).unwrap();
        assert_eq!(binding, reparsed);
    }

    #[test]
    fn normalized_string_uses_parseable_key_tokens() {
        let binding = HotkeyBinding::parse("ctrl+up").unwrap();
        assert_eq!(binding.to_normalized_string(), "Ctrl+Up");

        let binding = HotkeyBinding::parse("meta+f5").unwrap();
        assert_eq!(binding.to_normalized_string(), "Meta+F5");
    }

    #[test]
    fn is_engaged_requires_all_modifiers_and_key() {
        let binding = HotkeyBinding::parse("Ctrl+Shift+Space").unwrap();
        let mut pressed = HashSet::new();
        pressed.insert(Key::ControlLeft);
        pressed.insert(Key::ShiftLeft);
        assert!(!binding.is_engaged(&pressed));
        pressed.insert(Key::Space);
        assert!(binding.is_engaged(&pressed));
    }
}

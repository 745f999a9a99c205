use dictate_foundation::env::{is_wayland, is_x11};
use parking_lot::Mutex;
use std::process::Command;
use std::time::{Duration, Instant};

/// spec §4.1 `get_foreground_window()`: the identity of the window the
/// user was typing into. Cached for 500ms to absorb bursts (several
/// components query this in quick succession around a hotkey edge).
#[derive(Debug, Clone, Default)]
pub struct ForegroundWindow {
    pub process_name: String,
    pub window_title: String,
}

const CACHE_TTL: Duration = Duration::from_millis(500);

pub struct ForegroundWindowCache {
    last: Mutex<Option<(Instant, ForegroundWindow)>>,
}

impl Default for ForegroundWindowCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ForegroundWindowCache {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    pub fn get(&self) -> ForegroundWindow {
        let mut guard = self.last.lock();
        if let Some((at, window)) = guard.as_ref() {
            if at.elapsed() < CACHE_TTL {
                return window.clone();
            }
        }
        let window = query_foreground_window();
        *guard = Some((Instant::now(), window.clone()));
        window
    }
}

fn query_foreground_window() -> ForegroundWindow {
    if is_wayland() {
        query_sway().unwrap_or_default()
    } else if is_x11() {
        query_x11().unwrap_or_default()
    } else {
        ForegroundWindow::default()
    }
}

fn query_x11() -> Option<ForegroundWindow> {
    let active = Command::new("xdotool")
        .arg("getactivewindow")
        .output()
        .ok()?;
    if !active.status.success() {
        return None;
    }
    let window_id = String::from_utf8_lossy(&active.stdout).trim().to_string();

    let title = Command::new("xdotool")
        .args(["getwindowname", &window_id])
        .output()
        .ok()
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default();

    let class = Command::new("xdotool")
        .args(["getwindowclassname", &window_id])
        .output()
        .ok()
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default();

    Some(ForegroundWindow {
        process_name: class,
        window_title: title,
    })
}

fn query_sway() -> Option<ForegroundWindow> {
    let output = Command::new("swaymsg")
        .args(["-t", "get_tree"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).ok()?;
    find_focused(&tree)
}

fn find_focused(node: &serde_json::Value) -> Option<ForegroundWindow> {
    if node.get("focused").and_then(|v| v.as_bool()).unwrap_or(false) {
        let process_name = node
            .get("app_id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let window_title = node
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        return Some(ForegroundWindow {
            process_name,
            window_title,
        });
    }
    node.get("nodes")
        .and_then(|v| v.as_array())
        .and_then(|nodes| nodes.iter().find_map(find_focused))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_focused_descends_into_nested_nodes() {
        let tree = serde_json::json!({
            "nodes": [
                {"focused": false, "app_id": "other"},
                {"nodes": [
                    {"focused": true, "app_id": "code", "name": "main.rs"}
                ]}
            ]
        });
        let found = find_focused(&tree).unwrap();
        assert_eq!(found.process_name, "code");
        assert_eq!(found.window_title, "main.rs");
    }

    #[test]
    fn cache_returns_same_value_within_ttl() {
        let cache = ForegroundWindowCache::new();
        let first = cache.get();
        let second = cache.get();
        assert_eq!(first.process_name, second.process_name);
    }
}

use dictate_foundation::AudioError;
use std::process::Command;

/// Enumerates and selects microphone devices by shelling out to the
/// platform's audio-device listing tool, instead of binding to a device
/// directly — the capture subprocess (see `subprocess.rs`) is the one that
/// actually opens the device.
pub struct DeviceManager {
    list_command: Vec<String>,
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceManager {
    pub fn new() -> Self {
        Self {
            list_command: vec![
                "ffmpeg".to_string(),
                "-hide_banner".to_string(),
                "-f".to_string(),
                "pulse".to_string(),
                "-list_devices".to_string(),
                "true".to_string(),
                "-i".to_string(),
                "dummy".to_string(),
            ],
        }
    }

    #[cfg(test)]
    fn with_list_command(command: Vec<String>) -> Self {
        Self {
            list_command: command,
        }
    }

    /// Enumerate available input device identifiers. Returns an empty list
    /// (not an error) if the listing tool is unavailable; `open_device`
    /// still falls back to the platform default in that case.
    pub fn enumerate_devices(&self) -> Vec<String> {
        let Some((cmd, args)) = self.list_command.split_first() else {
            return Vec::new();
        };
        let output = Command::new(cmd).args(args).output();
        match output {
            Ok(out) => {
                let text = String::from_utf8_lossy(&out.stderr);
                parse_device_listing(&text)
            }
            Err(e) => {
                tracing::debug!("device listing tool unavailable: {e}");
                Vec::new()
            }
        }
    }

    /// Candidate device identifiers in priority order: an explicitly
    /// requested device first (if it was actually enumerated), then the
    /// platform default, then whatever else was enumerated.
    pub fn candidate_device_names(&self, preferred: Option<&str>) -> Vec<String> {
        let all = self.enumerate_devices();
        let mut out = Vec::new();

        if let Some(name) = preferred {
            if all.iter().any(|d| d == name) {
                out.push(name.to_string());
            }
        }
        if !out.iter().any(|n| n == "default") {
            out.push("default".to_string());
        }
        for d in all {
            if !out.contains(&d) {
                out.push(d);
            }
        }
        out
    }

    /// Resolves `enumerate_default_audio_input()` from spec §4.1: the first
    /// candidate is cached by the caller at startup and only re-probed if
    /// capture start fails.
    pub fn default_device(&self, preferred: Option<&str>) -> Result<String, AudioError> {
        self.candidate_device_names(preferred)
            .into_iter()
            .next()
            .ok_or(AudioError::NoDevice)
    }
}

fn parse_device_listing(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .filter_map(|line| line.trim().strip_prefix("* ").map(|s| s.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_starred_device_lines() {
        let sample = "Some banner text\n* alsa_input.pci-0000\n* pulse_monitor\nother noise";
        let devices = parse_device_listing(sample);
        assert_eq!(devices, vec!["alsa_input.pci-0000", "pulse_monitor"]);
    }

    #[test]
    fn falls_back_to_default_when_tool_missing() {
        let mgr = DeviceManager::with_list_command(vec!["definitely-not-a-real-binary".into()]);
        assert_eq!(mgr.default_device(None).unwrap(), "default");
    }

    #[test]
    fn preferred_device_is_first_when_already_enumerated() {
        let mgr = DeviceManager::with_list_command(vec!["definitely-not-a-real-binary".into()]);
        // Tool is missing so enumeration is empty; an unconfirmed preferred
        // device name is not injected out of thin air.
        let candidates = mgr.candidate_device_names(Some("mic-1"));
        assert_eq!(candidates, vec!["default"]);
    }
}

//! Process-wide configuration: defaults overridable by an optional TOML file
//! and `DICTATE_`-prefixed environment variables.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },
}

/// Top-level settings consumed by `dictate-app` at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DictateConfig {
    /// Base URL of the ASR/settings HTTP boundary; the WebSocket URL is
    /// derived by swapping the scheme (http -> ws, https -> wss).
    pub api_base_url: String,
    /// Preferred microphone device name; `None` means auto-select.
    pub device: Option<String>,
    /// Hotkey binding string, e.g. "Ctrl+Shift+Space".
    pub hotkey: String,
    /// `RUST_LOG`-style filter; overridden by the `RUST_LOG` env var if set.
    pub log_level: String,
    /// Seconds to wait for a `Final` after `stop` before declaring a timeout.
    pub final_timeout_secs: u64,
    /// Milliseconds to wait after stopping the capture subprocess before
    /// sending the textual `stop` control message.
    pub stop_guard_ms: u64,
    /// Whether the native overlay window is enabled (requires the `gui` feature).
    pub gui: bool,
}

impl Default for DictateConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8765".to_string(),
            device: None,
            hotkey: "Ctrl+Shift+Space".to_string(),
            log_level: "info".to_string(),
            final_timeout_secs: 30,
            stop_guard_ms: 300,
            gui: false,
        }
    }
}

impl DictateConfig {
    /// Load defaults, then an optional `dictate.toml` in the current
    /// directory, then `DICTATE_`-prefixed environment variables (nested
    /// fields use `__` as separator, matching the `config` crate convention).
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("api_base_url", defaults.api_base_url.clone())?
            .set_default("hotkey", defaults.hotkey.clone())?
            .set_default("log_level", defaults.log_level.clone())?
            .set_default("final_timeout_secs", defaults.final_timeout_secs)?
            .set_default("stop_guard_ms", defaults.stop_guard_ms)?
            .set_default("gui", defaults.gui)?
            .add_source(config::File::with_name("dictate").required(false))
            .add_source(
                config::Environment::with_prefix("DICTATE")
                    .separator("__")
                    .try_parsing(true),
            );

        let settings = builder.build()?;
        let cfg: DictateConfig = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.final_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "final_timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ConfigError::Validation {
                field: "api_base_url".into(),
                reason: "must start with http:// or https://".into(),
            });
        }
        Ok(())
    }

    /// Derive the WebSocket base URL by swapping the HTTP(S) scheme.
    pub fn ws_base_url(&self) -> String {
        if let Some(rest) = self.api_base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.api_base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.api_base_url.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(DictateConfig::default().validate().is_ok());
    }

    #[test]
    fn ws_url_swaps_scheme() {
        let mut cfg = DictateConfig::default();
        cfg.api_base_url = "https://example.com:9000".to_string();
        assert_eq!(cfg.ws_base_url(), "wss://example.com:9000");
    }

    #[test]
    fn rejects_zero_final_timeout() {
        let mut cfg = DictateConfig::default();
        cfg.final_timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }
}

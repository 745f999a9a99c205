//! Wires the six components (C1-C6) together and exposes a single
//! `AppHandle` the binary drives. Grounded on the teacher's `start()` /
//! `AppHandle` shape, stripped of the VAD/STT/resampler/device-monitor
//! options this build has no use for — there is exactly one activation
//! source (the hotkey) and one backend (the streaming transcription
//! service), so the options struct collapses to the handful of fields
//! `DictateConfig` already carries.

use crate::hotkey::{spawn_key_hook, HotkeyBinding};
use crate::overlay::{HeadlessOverlay, OverlayHandle};
use crate::session;
use dictate_audio::{AudioPipeline, AudioPipelineConfig};
use dictate_context::ForegroundWindowCache;
use dictate_foundation::config::DictateConfig;
use dictate_telemetry::PipelineMetrics;
use dictate_transport::TokenCache;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to the running application. Dropping it does not stop anything —
/// call `shutdown` to tear down the session actor and the key hook cleanly.
pub struct AppHandle {
    pub metrics: Arc<PipelineMetrics>,
    session_handle: JoinHandle<()>,
    hotkey_tx: mpsc::Sender<crate::hotkey::HotkeyEdge>,
}

impl AppHandle {
    /// Stops accepting hotkey edges and waits for any in-flight session to
    /// reach `Idle` before returning.
    pub async fn shutdown(self) {
        tracing::debug!("shutting down dictate runtime");
        drop(self.hotkey_tx);
        let _ = self.session_handle.await;
        tracing::debug!("dictate runtime shutdown complete");
    }
}

/// Starts capture, the key hook, and the session actor per spec §4.1-§4.6.
/// The global key hook runs for the process lifetime on its own OS thread
/// (spec §4.1); everything else is ordinary tokio tasks.
pub async fn start(config: DictateConfig) -> Result<AppHandle, crate::AppError> {
    tracing::info!(hotkey = %config.hotkey, api_base_url = %config.api_base_url, "starting dictate runtime");

    if config.gui {
        tracing::warn!("gui=true requested but this build has no native overlay; using the headless overlay");
    }

    let metrics = Arc::new(PipelineMetrics::default());
    let audio = Arc::new(AudioPipeline::spawn(
        AudioPipelineConfig {
            device: config.device.clone(),
            ..Default::default()
        },
        metrics.clone(),
    ));
    let tokens = TokenCache::new();
    let context_cache = Arc::new(ForegroundWindowCache::new());
    let overlay: Arc<dyn OverlayHandle> = Arc::new(HeadlessOverlay);

    let binding = HotkeyBinding::parse(&config.hotkey).map_err(crate::AppError::Hotkey)?;
    let (hotkey_tx, hotkey_rx) = mpsc::channel(16);
    spawn_key_hook(binding, hotkey_tx.clone());

    let session_config = session::SessionConfig {
        final_timeout: std::time::Duration::from_secs(config.final_timeout_secs),
        stop_guard: std::time::Duration::from_millis(config.stop_guard_ms),
        api_base_url: config.api_base_url.clone(),
        ws_base_url: config.ws_base_url(),
    };

    let session_handle = tokio::spawn(session::run(
        session_config,
        hotkey_rx,
        audio,
        tokens,
        context_cache,
        metrics.clone(),
        overlay,
    ));

    Ok(AppHandle {
        metrics,
        session_handle,
        hotkey_tx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_rejects_an_invalid_hotkey() {
        let config = DictateConfig {
            hotkey: "Ctrl".to_string(),
            ..Default::default()
        };
        let result = start(config).await;
        assert!(result.is_err());
    }
}

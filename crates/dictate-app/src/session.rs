//! Recording State Machine (C5, spec §4.5): the single owner of session
//! state. All inbound events — hotkey edges, transcription events, capture
//! failures, and timers — funnel through one channel and one `match`, per
//! §9's guidance, the same shape `dictate-audio::pipeline`'s actor already
//! uses for its own command loop.

use crate::hotkey::HotkeyEdge;
use crate::overlay::{OverlayHandle, ToastState};
use dictate_audio::{AudioPipeline, PipelineState};
use dictate_context::ForegroundWindowCache;
use dictate_foundation::state::{RecordingState, StateManager};
use dictate_telemetry::PipelineMetrics;
use dictate_transport::{SessionContext, TokenCache, TransportClient, TranscriptionEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, sleep_until, Instant};

/// Delay between hiding the overlay and invoking injection, giving the OS
/// time to restore focus to the previously active window (spec §4.6).
const FOCUS_YIELD_DELAY: Duration = Duration::from_millis(100);
/// How long a `Done` toast stays up before auto-hiding (spec §4.5).
const DONE_AUTO_HIDE: Duration = Duration::from_millis(1500);
/// Overlay-side safety net independent of the transport's final-timeout
/// (spec §5 Timeouts): coerces a stuck `Processing` toast to `Error`.
const PROCESSING_TOAST_SAFETY: Duration = Duration::from_secs(15);
/// Budget given to context capture before the auth message goes out with a
/// default context (spec §4.4: "if capture has not finished... a default
/// context is used"). Local shell-outs finish well under this in practice;
/// the budget exists only to bound the capture-vs-connect race.
const CONTEXT_CAPTURE_BUDGET: Duration = Duration::from_millis(100);

pub struct SessionConfig {
    pub final_timeout: Duration,
    pub stop_guard: Duration,
    pub api_base_url: String,
    pub ws_base_url: String,
}

enum Phase {
    Idle,
    Recording {
        transport: TransportClient,
        transport_rx: mpsc::Receiver<TranscriptionEvent>,
        confirmed: String,
        partial: String,
    },
    Processing {
        transport: TransportClient,
        transport_rx: mpsc::Receiver<TranscriptionEvent>,
        final_deadline: Instant,
        /// Fires the "still processing" toast once, then cleared so the
        /// branch doesn't keep re-firing for the rest of the timeout.
        toast_deadline: Option<Instant>,
    },
}

/// Runs the session actor until `hotkey_rx` closes. Owns the only mutable
/// Recording Session, Toast State, for the lifetime of the process.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: SessionConfig,
    mut hotkey_rx: mpsc::Receiver<HotkeyEdge>,
    audio: Arc<AudioPipeline>,
    tokens: TokenCache,
    context_cache: Arc<ForegroundWindowCache>,
    metrics: Arc<PipelineMetrics>,
    overlay: Arc<dyn OverlayHandle>,
) {
    let state_manager = StateManager::new();
    let mut phase = Phase::Idle;
    let mut pipeline_watch = audio.subscribe_state();

    loop {
        match &mut phase {
            Phase::Idle => {
                match hotkey_rx.recv().await {
                    Some(HotkeyEdge::Engaged) => {
                        phase = start_session(
                            &config,
                            &state_manager,
                            &audio,
                            &tokens,
                            &context_cache,
                            &metrics,
                            overlay.as_ref(),
                        )
                        .await;
                    }
                    Some(_) => {} // key-up / Esc with nothing recording: ignored
                    None => return,
                }
            }

            Phase::Recording { .. } => {
                tokio::select! {
                    edge = hotkey_rx.recv() => {
                        match edge {
                            Some(HotkeyEdge::Disengaged) => {
                                let Phase::Recording { transport, transport_rx, .. } =
                                    std::mem::replace(&mut phase, Phase::Idle) else { unreachable!() };
                                phase = to_processing(
                                    &config, &state_manager, &audio, overlay.as_ref(),
                                    transport, transport_rx,
                                ).await;
                            }
                            Some(HotkeyEdge::EscPressed) => {
                                let Phase::Recording { transport, .. } =
                                    std::mem::replace(&mut phase, Phase::Idle) else { unreachable!() };
                                audio.stop_session().await;
                                transport.close().await;
                                overlay.hide();
                                let _ = state_manager.transition(RecordingState::Idle);
                            }
                            Some(HotkeyEdge::Engaged) | None => {}
                        }
                    }
                    event = recv_transcription(&mut phase) => {
                        match event {
                            Some(TranscriptionEvent::Partial { partial, confirmed }) => {
                                if let Phase::Recording { confirmed: c, partial: p, .. } = &mut phase {
                                    *c = confirmed.clone();
                                    *p = partial.clone();
                                }
                                overlay.set_state(ToastState::Recording { confirmed, partial });
                            }
                            Some(TranscriptionEvent::Final { text }) => {
                                // Final arrived before the hotkey was released: skip
                                // straight to Processing's Final handling.
                                let Phase::Recording { transport, .. } =
                                    std::mem::replace(&mut phase, Phase::Idle) else { unreachable!() };
                                transport.close().await;
                                audio.stop_session().await;
                                let _ = state_manager.transition(RecordingState::Processing);
                                finish_with_final(overlay.clone(), &metrics, text).await;
                                let _ = state_manager.transition(RecordingState::Idle);
                            }
                            Some(TranscriptionEvent::Error { .. }) | None => {
                                // ASR-side error or the connection closing without a
                                // final both abort the session the same way CaptureDied
                                // does; spec §4.5's table treats them identically.
                                audio.stop_session().await;
                                phase = Phase::Idle;
                                overlay.set_state(ToastState::Error { message: "transport closed early".into() });
                                let _ = state_manager.transition(RecordingState::Idle);
                            }
                        }
                    }
                    _ = pipeline_watch.changed() => {
                        if *pipeline_watch.borrow() == PipelineState::Cold {
                            tracing::error!("capture died mid-recording");
                            if let Phase::Recording { transport, .. } =
                                std::mem::replace(&mut phase, Phase::Idle)
                            {
                                transport.close().await;
                            }
                            overlay.set_state(ToastState::Error { message: "microphone capture died".into() });
                            let _ = state_manager.transition(RecordingState::Idle);
                        }
                    }
                }
            }

            Phase::Processing { final_deadline, toast_deadline, .. } => {
                let final_deadline = *final_deadline;
                let toast_pending = toast_deadline.is_some();
                let toast_deadline_value = toast_deadline.unwrap_or(final_deadline);
                tokio::select! {
                    _ = sleep_until(final_deadline) => {
                        let Phase::Processing { transport, .. } =
                            std::mem::replace(&mut phase, Phase::Idle) else { unreachable!() };
                        transport.close().await;
                        overlay.set_state(ToastState::Error { message: "processing timed out".into() });
                        let _ = state_manager.transition(RecordingState::Idle);
                    }
                    _ = sleep_until(toast_deadline_value), if toast_pending => {
                        overlay.set_state(ToastState::Error { message: "still processing".into() });
                        if let Phase::Processing { toast_deadline, .. } = &mut phase {
                            *toast_deadline = None;
                        }
                    }
                    event = recv_transcription(&mut phase) => {
                        match event {
                            Some(TranscriptionEvent::Final { text }) => {
                                phase = Phase::Idle;
                                finish_with_final(overlay.clone(), &metrics, text).await;
                                let _ = state_manager.transition(RecordingState::Idle);
                            }
                            Some(TranscriptionEvent::Error { .. }) | None => {
                                phase = Phase::Idle;
                                overlay.set_state(ToastState::Error { message: "transport closed early".into() });
                                let _ = state_manager.transition(RecordingState::Idle);
                            }
                            Some(TranscriptionEvent::Partial { .. }) => {
                                // Partials after stop are stale; spec's ordering
                                // guarantee places the Final last, so these are
                                // simply ignored rather than re-shown.
                            }
                        }
                    }
                }
            }
        }
    }
}

async fn recv_transcription(phase: &mut Phase) -> Option<TranscriptionEvent> {
    match phase {
        Phase::Recording { transport_rx, .. } | Phase::Processing { transport_rx, .. } => {
            transport_rx.recv().await
        }
        Phase::Idle => std::future::pending().await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn start_session(
    config: &SessionConfig,
    state_manager: &StateManager,
    audio: &Arc<AudioPipeline>,
    tokens: &TokenCache,
    context_cache: &Arc<ForegroundWindowCache>,
    metrics: &Arc<PipelineMetrics>,
    overlay: &dyn OverlayHandle,
) -> Phase {
    let _ = state_manager.transition(RecordingState::Recording);
    overlay.set_state(ToastState::Recording {
        confirmed: String::new(),
        partial: String::new(),
    });

    let (transport, transport_rx) = TransportClient::spawn(
        config.api_base_url.clone(),
        config.ws_base_url.clone(),
        tokens.clone(),
        metrics.clone(),
    );
    audio.start_session(transport.audio_sender()).await;

    let cache = context_cache.clone();
    let context_handle =
        tokio::task::spawn_blocking(move || dictate_context::capture(&cache, true));
    let session_context = match tokio::time::timeout(CONTEXT_CAPTURE_BUDGET, context_handle).await
    {
        Ok(Ok(captured)) => to_session_context(captured),
        _ => SessionContext::default(),
    };

    if let Err(e) = transport.connect(session_context).await {
        tracing::warn!("transport connect failed: {e}");
        audio.stop_session().await;
        transport.close().await;
        overlay.set_state(ToastState::Error {
            message: "could not reach transcription service".into(),
        });
        let _ = state_manager.transition(RecordingState::Idle);
        return Phase::Idle;
    }

    Phase::Recording {
        transport,
        transport_rx,
        confirmed: String::new(),
        partial: String::new(),
    }
}

async fn to_processing(
    config: &SessionConfig,
    state_manager: &StateManager,
    audio: &Arc<AudioPipeline>,
    overlay: &dyn OverlayHandle,
    transport: TransportClient,
    transport_rx: mpsc::Receiver<TranscriptionEvent>,
) -> Phase {
    audio.stop_session().await;
    sleep(config.stop_guard).await;
    transport.send_stop().await;
    overlay.set_state(ToastState::Processing {
        message: "Processing…".into(),
    });
    let _ = state_manager.transition(RecordingState::Processing);

    let now = Instant::now();
    Phase::Processing {
        transport,
        transport_rx,
        final_deadline: now + config.final_timeout,
        toast_deadline: Some(now + PROCESSING_TOAST_SAFETY),
    }
}

async fn finish_with_final(
    overlay: Arc<dyn OverlayHandle>,
    metrics: &Arc<PipelineMetrics>,
    text: String,
) {
    if text.trim().is_empty() {
        overlay.set_state(ToastState::Done {
            message: "No speech detected".into(),
        });
        schedule_auto_hide(overlay);
        return;
    }

    overlay.set_state(ToastState::Processing {
        message: "Injecting…".into(),
    });
    overlay.hide();
    sleep(FOCUS_YIELD_DELAY).await;

    match dictate_injection::inject_text(&text, metrics).await {
        Ok(_method) => {
            overlay.set_state(ToastState::Done {
                message: "Done".into(),
            });
            schedule_auto_hide(overlay);
        }
        Err(e) => {
            tracing::error!("injection failed: {e}");
            overlay.set_state(ToastState::Error {
                message: "could not deliver text".into(),
            });
        }
    }
}

/// Hides the `Done` toast after it has had time to be read (spec §4.5).
fn schedule_auto_hide(overlay: Arc<dyn OverlayHandle>) {
    tokio::spawn(async move {
        sleep(DONE_AUTO_HIDE).await;
        overlay.hide();
    });
}

fn to_session_context(ctx: dictate_context::CapturedContext) -> SessionContext {
    SessionContext {
        app_context: ctx.app_context_tag.as_str().to_string(),
        app_name: if ctx.app_name.is_empty() {
            None
        } else {
            Some(ctx.app_name)
        },
        window_title: if ctx.window_title.is_empty() {
            None
        } else {
            Some(ctx.window_title)
        },
        selected_text: ctx.selected_text,
        clipboard_text: ctx.clipboard_text,
        mode_id: ctx.mode_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_context_omits_empty_strings() {
        let ctx = dictate_context::CapturedContext::default();
        let session_context = to_session_context(ctx);
        assert_eq!(session_context.app_name, None);
        assert_eq!(session_context.app_context, "general");
    }
}

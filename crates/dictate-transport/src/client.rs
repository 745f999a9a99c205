use crate::token::TokenCache;
use crate::types::{parse_server_message, AuthMessage, SessionContext, TranscriptionEvent};
use dictate_foundation::error::TransportError;
use dictate_telemetry::PipelineMetrics;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Connecting,
    Ready,
    Closed,
}

enum Command {
    Connect {
        context: SessionContext,
        reply: oneshot::Sender<Result<(), TransportError>>,
    },
    SendStop {
        reply: oneshot::Sender<()>,
    },
    Close,
}

/// Handle to the C3 transport actor. One `TransportClient` is created per
/// recording session (spec §4.3: "one connection per session").
pub struct TransportClient {
    cmd_tx: mpsc::Sender<Command>,
    audio_tx: mpsc::Sender<Vec<u8>>,
}

impl TransportClient {
    /// Spawns the actor and returns the handle plus the event stream the
    /// State Machine should consume.
    pub fn spawn(
        api_base_url: String,
        ws_base_url: String,
        tokens: TokenCache,
        metrics: Arc<PipelineMetrics>,
    ) -> (Self, mpsc::Receiver<TranscriptionEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (audio_tx, audio_rx) = mpsc::channel(64);
        let (event_tx, event_rx) = mpsc::channel(64);
        tokio::spawn(run_actor(
            api_base_url,
            ws_base_url,
            tokens,
            cmd_rx,
            audio_rx,
            event_tx,
            metrics,
        ));
        (Self { cmd_tx, audio_tx }, event_rx)
    }

    /// The sender end C2's `start_session` should be given as its consumer —
    /// audio chunks pushed here are buffered until the connection is ready.
    pub fn audio_sender(&self) -> mpsc::Sender<Vec<u8>> {
        self.audio_tx.clone()
    }

    pub async fn connect(&self, context: SessionContext) -> Result<(), TransportError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Connect {
                context,
                reply: reply_tx,
            })
            .await
            .map_err(|_| TransportError::ClosedEarly)?;
        reply_rx.await.map_err(|_| TransportError::ClosedEarly)?
    }

    /// Spec §4.5: caller waits the stop-guard interval itself before
    /// invoking this, so the last audio chunk has had time to be written.
    pub async fn send_stop(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(Command::SendStop { reply: reply_tx })
            .await
            .is_ok()
        {
            let _ = reply_rx.await;
        }
    }

    pub async fn close(&self) {
        let _ = self.cmd_tx.send(Command::Close).await;
    }
}

async fn run_actor(
    api_base_url: String,
    ws_base_url: String,
    tokens: TokenCache,
    mut cmd_rx: mpsc::Receiver<Command>,
    mut audio_rx: mpsc::Receiver<Vec<u8>>,
    event_tx: mpsc::Sender<TranscriptionEvent>,
    metrics: Arc<PipelineMetrics>,
) {
    let mut state = TransportState::Idle;
    let mut socket: Option<WsStream> = None;
    let mut pending_audio: Vec<Vec<u8>> = Vec::new();
    let mut expecting_final = false;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    None | Some(Command::Close) => {
                        if let Some(mut ws) = socket.take() {
                            let _ = ws.close(None).await;
                        }
                        break;
                    }
                    Some(Command::Connect { context, reply }) => {
                        state = TransportState::Connecting;
                        let outcome = connect_and_auth(&api_base_url, &ws_base_url, &tokens, &context).await;
                        match outcome {
                            Ok(mut ws) => {
                                for chunk in pending_audio.drain(..) {
                                    let _ = ws.send(Message::Binary(chunk.into())).await;
                                }
                                socket = Some(ws);
                                state = TransportState::Ready;
                                expecting_final = true;
                                let _ = reply.send(Ok(()));
                            }
                            Err(e) => {
                                state = TransportState::Closed;
                                let _ = reply.send(Err(e));
                            }
                        }
                    }
                    Some(Command::SendStop { reply }) => {
                        if let Some(ws) = socket.as_mut() {
                            let _ = ws.send(Message::Text("stop".into())).await;
                        }
                        let _ = reply.send(());
                    }
                }
            }
            chunk = audio_rx.recv(), if state != TransportState::Closed => {
                let Some(chunk) = chunk else { continue };
                match (state, socket.as_mut()) {
                    (TransportState::Ready, Some(ws)) => {
                        let _ = ws.send(Message::Binary(chunk.into())).await;
                    }
                    _ => pending_audio.push(chunk),
                }
            }
            incoming = async {
                match socket.as_mut() {
                    Some(ws) => ws.next().await,
                    None => std::future::pending().await,
                }
            }, if socket.is_some() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(event) = parse_server_message(&text) {
                            let is_final = matches!(event, TranscriptionEvent::Final { .. });
                            match &event {
                                TranscriptionEvent::Partial { .. } => {
                                    metrics.transport_partials_received.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                                }
                                TranscriptionEvent::Final { .. } => {
                                    metrics.transport_finals_received.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                                }
                                TranscriptionEvent::Error { .. } => {}
                            }
                            let _ = event_tx.send(event).await;
                            if is_final {
                                expecting_final = false;
                                if let Some(mut ws) = socket.take() {
                                    let _ = ws.close(None).await;
                                }
                                state = TransportState::Closed;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => {
                        socket = None;
                        state = TransportState::Closed;
                        if expecting_final {
                            metrics.transport_closed_early.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                            let _ = event_tx.send(TranscriptionEvent::Error {
                                message: "connection closed before final".to_string(),
                            }).await;
                        }
                    }
                }
            }
        }
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn connect_and_auth(
    api_base_url: &str,
    ws_base_url: &str,
    tokens: &TokenCache,
    context: &SessionContext,
) -> Result<WsStream, TransportError> {
    let token = tokens.get_or_fetch(api_base_url).await?;
    let url = format!(
        "{}/ws/transcribe",
        ws_base_url.trim_end_matches('/')
    );
    let (mut ws, _) = timeout(CONNECT_TIMEOUT, tokio_tungstenite::connect_async(&url))
        .await
        .map_err(|_| TransportError::ConnectTimeout(CONNECT_TIMEOUT))?
        .map_err(|e| TransportError::WebSocket(e.to_string()))?;

    let auth = AuthMessage {
        token: &token,
        context,
    };
    let payload = serde_json::to_string(&auth).map_err(|e| TransportError::ProtocolError(e.to_string()))?;
    ws.send(Message::Text(payload.into()))
        .await
        .map_err(|e| TransportError::WebSocket(e.to_string()))?;

    Ok(ws)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_states_are_distinguishable() {
        assert_ne!(TransportState::Idle, TransportState::Ready);
    }
}

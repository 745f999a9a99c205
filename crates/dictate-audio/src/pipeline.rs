use crate::accumulator::Accumulator;
use crate::device::DeviceManager;
use crate::prewarm_ring::PreWarmRing;
use crate::subprocess::{self, CaptureSubprocess};
use crate::watchdog::WatchdogTimer;
use dictate_telemetry::{BufferType, PipelineMetrics, PipelineStage};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Duration, Instant};

/// How long the watchdog tolerates a silent-but-alive subprocess before
/// treating it the same as a dead one.
const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a pre-warmed subprocess may sit idle in `Standby` before the
/// actor cycles it, per spec §9's "periodically cycle the subprocess"
/// guidance for very long-lived idle periods.
const MAX_PREWARM_AGE: Duration = Duration::from_secs(600);

/// Chunk size from spec §3: 16 000 bytes of 16kHz/s16le/mono PCM, ≈500ms.
pub const TARGET_CHUNK_BYTES: usize = 16_000;
/// Pre-warm look-back window from spec §3.
pub const PRE_WARM_BUFFER_MS: u64 = 1_500;
const BYTES_PER_MS: u64 = (subprocess::SAMPLE_RATE_HZ as u64 * 2) / 1_000; // s16 mono
const PRE_WARM_BUFFER_BYTES: usize = (PRE_WARM_BUFFER_MS * BYTES_PER_MS) as usize;
const READ_BUF_SIZE: usize = 4_096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Cold,
    Standby,
    Live,
}

#[derive(Debug, Clone)]
pub struct AudioPipelineConfig {
    pub chunk_bytes: usize,
    pub prewarm_capacity_bytes: usize,
    pub device: Option<String>,
}

impl Default for AudioPipelineConfig {
    fn default() -> Self {
        Self {
            chunk_bytes: TARGET_CHUNK_BYTES,
            prewarm_capacity_bytes: PRE_WARM_BUFFER_BYTES,
            device: None,
        }
    }
}

enum Command {
    StartSession {
        consumer: mpsc::Sender<Vec<u8>>,
        reply: oneshot::Sender<()>,
    },
    StopSession {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to the audio pipeline actor (C2). Construction spawns the
/// background task that owns the capture subprocess, the Accumulator, and
/// the Pre-warm Ring, per spec §3's ownership rule.
pub struct AudioPipeline {
    cmd_tx: mpsc::Sender<Command>,
    state_rx: watch::Receiver<PipelineState>,
    metrics: Arc<PipelineMetrics>,
}

impl AudioPipeline {
    pub fn spawn(config: AudioPipelineConfig, metrics: Arc<PipelineMetrics>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (state_tx, state_rx) = watch::channel(PipelineState::Cold);
        let actor_metrics = metrics.clone();
        tokio::spawn(run_actor(config, cmd_rx, state_tx, actor_metrics));
        Self {
            cmd_tx,
            state_rx,
            metrics,
        }
    }

    pub fn state(&self) -> PipelineState {
        *self.state_rx.borrow()
    }

    /// Watch channel of pipeline state, used by the session owner to detect
    /// `CaptureDied` (a transition to `Cold` while a session expects `Live`).
    pub fn subscribe_state(&self) -> watch::Receiver<PipelineState> {
        self.state_rx.clone()
    }

    /// spec §4.2 start_session: drains the Pre-warm Ring (if Standby) or
    /// starts the subprocess cold, then redirects emission to `consumer`.
    pub async fn start_session(&self, consumer: mpsc::Sender<Vec<u8>>) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(Command::StartSession {
                consumer,
                reply: reply_tx,
            })
            .await
            .is_ok()
        {
            let _ = reply_rx.await;
        }
        self.metrics.record_session_start(Instant::now().into_std());
    }

    /// spec §4.2 stop_session: idempotent when already in `Standby`.
    pub async fn stop_session(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(Command::StopSession { reply: reply_tx })
            .await
            .is_ok()
        {
            let _ = reply_rx.await;
        }
        self.metrics.record_session_end();
    }
}

async fn run_actor(
    config: AudioPipelineConfig,
    mut cmd_rx: mpsc::Receiver<Command>,
    state_tx: watch::Sender<PipelineState>,
    metrics: Arc<PipelineMetrics>,
) {
    let device_manager = DeviceManager::new();
    let mut accumulator = Accumulator::new();
    let mut ring = PreWarmRing::new(config.prewarm_capacity_bytes);
    let mut subprocess: Option<CaptureSubprocess> = None;
    let mut subprocess_started_at: Option<Instant> = None;
    let mut consumer: Option<mpsc::Sender<Vec<u8>>> = None;
    let mut read_buf = [0u8; READ_BUF_SIZE];

    let mut watchdog = WatchdogTimer::new(WATCHDOG_TIMEOUT);
    let watchdog_running = Arc::new(AtomicBool::new(true));
    watchdog.start(watchdog_running.clone());
    let mut watchdog_poll = tokio::time::interval(Duration::from_millis(500));

    loop {
        let has_subprocess = subprocess.is_some();
        tokio::select! {
            _ = watchdog_poll.tick() => {
                if has_subprocess && watchdog.is_triggered() {
                    tracing::error!("capture watchdog fired: subprocess alive but silent");
                    if let Some(sp) = subprocess.take() {
                        let _ = sp.kill().await;
                    }
                    subprocess_started_at = None;
                    consumer = None;
                    let _ = state_tx.send(PipelineState::Cold);
                    watchdog.feed();
                } else if *state_tx.borrow() == PipelineState::Standby {
                    if let Some(started_at) = subprocess_started_at {
                        if cycle_if_stale(started_at, MAX_PREWARM_AGE).await {
                            tracing::info!("cycling pre-warmed subprocess past max age");
                            if let Some(sp) = subprocess.take() {
                                let _ = sp.kill().await;
                            }
                            subprocess_started_at = None;
                            let _ = state_tx.send(PipelineState::Cold);
                        }
                    }
                }
            }
            cmd = cmd_rx.recv() => {
                match cmd {
                    None => break,
                    Some(Command::StartSession { consumer: new_consumer, reply }) => {
                        if subprocess.is_none() {
                            match subprocess::start_capture_subprocess(
                                &device_manager
                                    .default_device(config.device.as_deref())
                                    .unwrap_or_else(|_| "default".to_string()),
                            )
                            .await
                            {
                                Ok(child) => {
                                    subprocess = Some(child);
                                    subprocess_started_at = Some(Instant::now());
                                    watchdog.feed();
                                }
                                Err(e) => {
                                    tracing::warn!("capture start failed: {e}");
                                    metrics.capture_errors.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                                }
                            }
                        }
                        // Adopt ring contents as the session's first chunks,
                        // then clear it, before switching emission target —
                        // no event reaches the consumer until this completes.
                        for chunk in ring.drain() {
                            let _ = new_consumer.send(chunk).await;
                        }
                        consumer = Some(new_consumer);
                        let _ = state_tx.send(PipelineState::Live);
                        let _ = reply.send(());
                    }
                    Some(Command::StopSession { reply }) => {
                        if *state_tx.borrow() == PipelineState::Live {
                            if let Some(tail) = accumulator.flush() {
                                if let Some(c) = &consumer {
                                    let _ = c.send(tail).await;
                                }
                            }
                        }
                        consumer = None;
                        if subprocess.is_some() {
                            let _ = state_tx.send(PipelineState::Standby);
                        }
                        let _ = reply.send(());
                    }
                }
            }
            n = async {
                match subprocess.as_mut() {
                    Some(sp) => sp.read(&mut read_buf).await,
                    None => std::future::pending().await,
                }
            }, if has_subprocess => {
                match n {
                    Ok(0) | Err(_) => {
                        // Subprocess died: surface CaptureDied by dropping
                        // back to Cold; the caller's session owner reacts
                        // to the state watch and aborts the session.
                        tracing::error!("capture subprocess exited mid-stream");
                        subprocess = None;
                        subprocess_started_at = None;
                        consumer = None;
                        let _ = state_tx.send(PipelineState::Cold);
                        metrics.capture_errors.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    }
                    Ok(read) => {
                        watchdog.feed();
                        metrics.mark_stage_active(PipelineStage::Capture);
                        metrics.increment_capture_frames();
                        accumulator.push(&read_buf[..read]);
                        metrics.update_buffer_fill(
                            BufferType::Accumulator,
                            accumulator.len() * 100 / config.chunk_bytes.max(1),
                        );
                        let ready = accumulator.take_ready_chunks(config.chunk_bytes);
                        for chunk in ready {
                            metrics.increment_chunks_emitted();
                            metrics.mark_stage_active(PipelineStage::Chunker);
                            let current_state = *state_tx.borrow();
                            match (current_state, &consumer) {
                                (PipelineState::Live, Some(c)) => {
                                    let _ = c.send(chunk).await;
                                }
                                _ => {
                                    ring.push(chunk);
                                    metrics.update_buffer_fill(
                                        BufferType::PrewarmRing,
                                        ring.fill_percent(),
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    watchdog_running.store(false, std::sync::atomic::Ordering::SeqCst);
    watchdog.stop();
}

/// Whether a pre-warmed subprocess started at `started_at` has outlived
/// `max_age` and should be killed so the next session starts a fresh one.
/// Checked on every watchdog tick while the pipeline sits in `Standby`.
async fn cycle_if_stale(started_at: Instant, max_age: Duration) -> bool {
    started_at.elapsed() > max_age
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prewarm_bytes_match_fifteen_hundred_ms() {
        // 1500ms * 16000 samples/s * 2 bytes/sample / 1000 = 48000 bytes.
        assert_eq!(PRE_WARM_BUFFER_BYTES, 48_000);
    }

    #[tokio::test]
    async fn stale_check_respects_max_age() {
        let started = Instant::now();
        assert!(!cycle_if_stale(started, Duration::from_secs(3600)).await);
    }
}

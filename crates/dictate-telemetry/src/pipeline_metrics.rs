use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared metrics for cross-thread monitoring of a recording session,
/// spanning the audio pipeline, transport, and injection stages.
#[derive(Clone)]
pub struct PipelineMetrics {
    // Stage-reached flags, one per pipeline stage the spec defines.
    pub stage_capture: Arc<AtomicBool>,
    pub stage_chunker: Arc<AtomicBool>,
    pub stage_transport: Arc<AtomicBool>,
    pub stage_injection: Arc<AtomicBool>,

    // Buffer occupancy, as a percentage of configured capacity.
    pub accumulator_fill: Arc<AtomicUsize>,
    pub prewarm_ring_fill: Arc<AtomicUsize>,

    pub capture_frames: Arc<AtomicU64>,
    pub chunks_emitted: Arc<AtomicU64>,

    pub is_recording: Arc<AtomicBool>,
    pub last_session_start: Arc<RwLock<Option<Instant>>>,
    pub sessions_started: Arc<AtomicU64>,

    pub capture_errors: Arc<AtomicU64>,

    // Transport (C3)
    pub transport_partials_received: Arc<AtomicU64>,
    pub transport_finals_received: Arc<AtomicU64>,
    pub transport_closed_early: Arc<AtomicU64>,
    pub transport_connect_latency_ms: Arc<AtomicU64>,

    // Injection & overlay (C6)
    pub injection_direct_success: Arc<AtomicU64>,
    pub injection_clipboard_fallback: Arc<AtomicU64>,
    pub injection_failures: Arc<AtomicU64>,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            stage_capture: Arc::new(AtomicBool::new(false)),
            stage_chunker: Arc::new(AtomicBool::new(false)),
            stage_transport: Arc::new(AtomicBool::new(false)),
            stage_injection: Arc::new(AtomicBool::new(false)),

            accumulator_fill: Arc::new(AtomicUsize::new(0)),
            prewarm_ring_fill: Arc::new(AtomicUsize::new(0)),

            capture_frames: Arc::new(AtomicU64::new(0)),
            chunks_emitted: Arc::new(AtomicU64::new(0)),

            is_recording: Arc::new(AtomicBool::new(false)),
            last_session_start: Arc::new(RwLock::new(None)),
            sessions_started: Arc::new(AtomicU64::new(0)),

            capture_errors: Arc::new(AtomicU64::new(0)),

            transport_partials_received: Arc::new(AtomicU64::new(0)),
            transport_finals_received: Arc::new(AtomicU64::new(0)),
            transport_closed_early: Arc::new(AtomicU64::new(0)),
            transport_connect_latency_ms: Arc::new(AtomicU64::new(0)),

            injection_direct_success: Arc::new(AtomicU64::new(0)),
            injection_clipboard_fallback: Arc::new(AtomicU64::new(0)),
            injection_failures: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl PipelineMetrics {
    pub fn mark_stage_active(&self, stage: PipelineStage) {
        match stage {
            PipelineStage::Capture => self.stage_capture.store(true, Ordering::Relaxed),
            PipelineStage::Chunker => self.stage_chunker.store(true, Ordering::Relaxed),
            PipelineStage::Transport => self.stage_transport.store(true, Ordering::Relaxed),
            PipelineStage::Injection => self.stage_injection.store(true, Ordering::Relaxed),
        }
    }

    pub fn update_buffer_fill(&self, buffer: BufferType, fill_percent: usize) {
        let fill = fill_percent.min(100);
        match buffer {
            BufferType::Accumulator => self.accumulator_fill.store(fill, Ordering::Relaxed),
            BufferType::PrewarmRing => self.prewarm_ring_fill.store(fill, Ordering::Relaxed),
        }
    }

    pub fn increment_capture_frames(&self) {
        self.capture_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_chunks_emitted(&self) {
        self.chunks_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_start(&self, now: Instant) {
        self.is_recording.store(true, Ordering::Relaxed);
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
        *self.last_session_start.write() = Some(now);
    }

    pub fn record_session_end(&self) {
        self.is_recording.store(false, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PipelineStage {
    Capture,
    Chunker,
    Transport,
    Injection,
}

#[derive(Debug, Clone, Copy)]
pub enum BufferType {
    Accumulator,
    PrewarmRing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_flags_mark_independently() {
        let metrics = PipelineMetrics::default();
        metrics.mark_stage_active(PipelineStage::Capture);
        metrics.mark_stage_active(PipelineStage::Injection);
        assert!(metrics.stage_capture.load(Ordering::Relaxed));
        assert!(metrics.stage_injection.load(Ordering::Relaxed));
        assert!(!metrics.stage_chunker.load(Ordering::Relaxed));
    }

    #[test]
    fn session_lifecycle_counts() {
        let metrics = PipelineMetrics::default();
        metrics.record_session_start(Instant::now());
        assert_eq!(metrics.sessions_started.load(Ordering::Relaxed), 1);
        assert!(metrics.is_recording.load(Ordering::Relaxed));
        metrics.record_session_end();
        assert!(!metrics.is_recording.load(Ordering::Relaxed));
    }
}

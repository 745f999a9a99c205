//! Exercises `AudioPipeline`'s actor lifecycle through its public handle,
//! independent of whether `ffmpeg`/pulseaudio are actually present: the
//! transition to `Live` in `start_session` happens unconditionally, so these
//! assertions hold in any environment this crate's own unit tests run in.

use std::sync::Arc;
use std::time::Duration;

use dictate_audio::{AudioPipeline, AudioPipelineConfig, PipelineState};
use dictate_telemetry::PipelineMetrics;
use tokio::sync::mpsc;
use tokio::time::timeout;

#[tokio::test]
async fn start_session_transitions_cold_to_live() {
    let metrics = Arc::new(PipelineMetrics::default());
    let pipeline = AudioPipeline::spawn(AudioPipelineConfig::default(), metrics);
    assert_eq!(pipeline.state(), PipelineState::Cold);

    let (tx, _rx) = mpsc::channel(8);
    pipeline.start_session(tx).await;

    assert_eq!(pipeline.state(), PipelineState::Live);
}

#[tokio::test]
async fn stop_session_is_a_no_op_without_a_prior_start() {
    let metrics = Arc::new(PipelineMetrics::default());
    let pipeline = AudioPipeline::spawn(AudioPipelineConfig::default(), metrics);

    pipeline.stop_session().await;

    assert_eq!(pipeline.state(), PipelineState::Cold);
}

#[tokio::test]
async fn subscribe_state_observes_the_live_transition() {
    let metrics = Arc::new(PipelineMetrics::default());
    let pipeline = AudioPipeline::spawn(AudioPipelineConfig::default(), metrics);
    let mut watch = pipeline.subscribe_state();
    assert_eq!(*watch.borrow(), PipelineState::Cold);

    let (tx, _rx) = mpsc::channel(8);
    pipeline.start_session(tx).await;

    timeout(Duration::from_secs(1), watch.changed())
        .await
        .expect("timed out waiting for a state change")
        .expect("state watch closed unexpectedly");
    assert_eq!(*watch.borrow(), PipelineState::Live);
}

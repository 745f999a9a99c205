pub mod accumulator;
pub mod device;
pub mod pipeline;
pub mod prewarm_ring;
pub mod subprocess;
pub mod watchdog;

pub use accumulator::Accumulator;
pub use device::DeviceManager;
pub use pipeline::{
    AudioPipeline, AudioPipelineConfig, PipelineState, PRE_WARM_BUFFER_MS, TARGET_CHUNK_BYTES,
};
pub use prewarm_ring::PreWarmRing;
pub use subprocess::{start_capture_subprocess, CaptureSubprocess, CHANNELS, SAMPLE_RATE_HZ};
pub use watchdog::WatchdogTimer;

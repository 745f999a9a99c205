use dictate_foundation::AudioError;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::time::timeout;

pub const SAMPLE_RATE_HZ: u32 = 16_000;
pub const CHANNELS: u32 = 1;

/// A running capture subprocess and its stdout pipe.
pub struct CaptureSubprocess {
    child: Child,
    stdout: BufReader<ChildStdout>,
}

/// Spawns the OS audio tool (`ffmpeg`) so it writes raw 16kHz/mono/s16le PCM
/// to stdout with minimal internal buffering — `rtbufsize`/`probesize`/
/// `analyzeduration` are tuned down from ffmpeg's defaults specifically to
/// hit the pre-warm latency target (spec §4.1/§9: "tuned for latency").
pub async fn start_capture_subprocess(device: &str) -> Result<CaptureSubprocess, AudioError> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args([
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        "pulse",
        "-probesize",
        "32",
        "-analyzeduration",
        "0",
        "-rtbufsize",
        "32k",
        "-i",
        device,
        "-ac",
        &CHANNELS.to_string(),
        "-ar",
        &SAMPLE_RATE_HZ.to_string(),
        "-f",
        "s16le",
        "-",
    ]);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::null());
    cmd.stdin(Stdio::null());
    cmd.kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|e| AudioError::CaptureStartFailed(e.to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AudioError::CaptureStartFailed("no stdout pipe".to_string()))?;

    Ok(CaptureSubprocess {
        child,
        stdout: BufReader::new(stdout),
    })
}

impl CaptureSubprocess {
    /// Non-blocking read of whatever bytes are currently available, up to
    /// `buf.len()`. Returns `Ok(0)` when the child has exited (EOF).
    pub async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stdout.read(buf).await
    }

    /// SIGTERM-equivalent; must complete within 1s per spec §4.1.
    pub async fn kill(mut self) -> Result<(), AudioError> {
        let _ = self.child.start_kill();
        match timeout(Duration::from_secs(1), self.child.wait()).await {
            Ok(_) => Ok(()),
            Err(_) => Err(AudioError::KillTimeout(Duration::from_secs(1))),
        }
    }

    /// `true` once the child process has exited, surfacing `CaptureDied`
    /// (spec §4.2 Failures) to the pipeline's caller.
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn nonexistent_tool_reports_capture_start_failed() {
        let mut cmd = Command::new("definitely-not-a-real-binary-xyz");
        cmd.stdout(Stdio::piped());
        let result = cmd.spawn();
        assert!(result.is_err());
    }
}

//! FFprobe duration lookup.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::process::hide_console_window;

/// Get the source duration in seconds, or `0.0` when it cannot be determined.
///
/// The duration only drives progress estimation, so every failure (missing
/// probe, timeout, non-zero exit, unparsable output) degrades to "unknown"
/// instead of failing the job.
pub async fn probe_duration(probe: &Path, input: &Path, timeout: Duration) -> f64 {
    match try_probe_duration(probe, input, timeout).await {
        Ok(duration) => {
            debug!(input = %input.display(), duration, "Probed source duration");
            duration
        }
        Err(e) => {
            warn!(
                input = %input.display(),
                error = %e,
                "Duration probe failed, progress will not be reported"
            );
            0.0
        }
    }
}

/// Run FFprobe and parse the bare `format=duration` value.
pub async fn try_probe_duration(probe: &Path, input: &Path, timeout: Duration) -> MediaResult<f64> {
    if !probe.is_file() {
        return Err(MediaError::FfprobeNotFound(probe.to_path_buf()));
    }

    let mut command = Command::new(probe);
    command
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    hide_console_window(&mut command);

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| MediaError::Timeout(timeout))??;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe exited with {}", output.status),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_duration_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse FFprobe's single floating-point token.
fn parse_duration_output(stdout: &str) -> MediaResult<f64> {
    let token = stdout.trim();
    let duration: f64 = token
        .parse()
        .map_err(|_| MediaError::InvalidDuration(token.to_string()))?;

    if !duration.is_finite() || duration < 0.0 {
        return Err(MediaError::InvalidDuration(token.to_string()));
    }

    Ok(duration)
}

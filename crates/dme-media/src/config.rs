//! Supervisor configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::binaries::TranscoderBinaries;
use crate::error::MediaResult;

/// Default bound on a duration probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Process-wide, read-only supervisor configuration.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Transcoder and probe executables
    pub binaries: TranscoderBinaries,
    /// Upper bound on the duration probe
    pub probe_timeout: Duration,
}

impl SupervisorConfig {
    /// Create config for the given executables.
    pub fn new(binaries: TranscoderBinaries) -> Self {
        Self {
            binaries,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Override the probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Create config from environment variables.
    ///
    /// `DME_FFMPEG_PATH` pins the transcoder; otherwise it is located in the
    /// working directory or on `PATH`.
    pub fn from_env() -> MediaResult<Self> {
        let binaries = match std::env::var("DME_FFMPEG_PATH") {
            Ok(path) if !path.trim().is_empty() => {
                TranscoderBinaries::from_transcoder(PathBuf::from(path))
            }
            _ => TranscoderBinaries::locate()?,
        };

        let probe_timeout = Duration::from_secs(
            std::env::var("DME_PROBE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PROBE_TIMEOUT.as_secs()),
        );

        Ok(Self {
            binaries,
            probe_timeout,
        })
    }
}

//! Locating the FFmpeg and FFprobe executables.

use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Base name of the transcoder executable.
pub const TRANSCODER_NAME: &str = "ffmpeg";
/// Base name of the duration probe executable.
pub const PROBE_NAME: &str = "ffprobe";

/// Platform executable file name (`ffmpeg` or `ffmpeg.exe`).
pub fn executable_name(base: &str) -> String {
    format!("{}{}", base, EXE_SUFFIX)
}

/// Paths of the two external executables a job uses.
///
/// The probe always lives next to the transcoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscoderBinaries {
    pub transcoder: PathBuf,
    pub probe: PathBuf,
}

impl TranscoderBinaries {
    /// Use an explicit transcoder path and derive the probe path from it.
    pub fn from_transcoder(transcoder: impl Into<PathBuf>) -> Self {
        let transcoder = transcoder.into();
        let probe_name = executable_name(PROBE_NAME);
        let probe = match transcoder.parent() {
            Some(dir) => dir.join(&probe_name),
            None => PathBuf::from(&probe_name),
        };
        Self { transcoder, probe }
    }

    /// Find the transcoder in the current working directory, then on `PATH`.
    pub fn locate() -> MediaResult<Self> {
        let cwd = std::env::current_dir()?;
        Self::locate_in(&cwd)
    }

    /// Find the transcoder in `dir`, then on `PATH`.
    pub fn locate_in(dir: &Path) -> MediaResult<Self> {
        let local = dir.join(executable_name(TRANSCODER_NAME));
        if local.is_file() {
            debug!(path = %local.display(), "Using local FFmpeg");
            return Ok(Self::from_transcoder(local));
        }

        let found = which::which(TRANSCODER_NAME).map_err(|_| MediaError::FfmpegNotFound)?;
        debug!(path = %found.display(), "Using FFmpeg from PATH");
        Ok(Self::from_transcoder(found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_probe_is_sibling_of_transcoder() {
        let bins = TranscoderBinaries::from_transcoder("/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(
            bins.probe,
            Path::new("/opt/ffmpeg/bin").join(executable_name("ffprobe"))
        );
    }

    #[test]
    fn test_locate_prefers_working_directory() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join(executable_name("ffmpeg"));
        std::fs::write(&local, b"").unwrap();

        let bins = TranscoderBinaries::locate_in(dir.path()).unwrap();
        assert_eq!(bins.transcoder, local);
        assert_eq!(bins.probe, dir.path().join(executable_name("ffprobe")));
    }
}

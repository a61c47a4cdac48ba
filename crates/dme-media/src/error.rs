//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use dme_models::RequestError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while preparing or supervising a transcode.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in working directory or PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found at {}", .0.display())]
    FfprobeNotFound(PathBuf),

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Failed to launch {}: {source}", program.display())]
    LaunchFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("A job is already running on this supervisor")]
    JobAlreadyRunning,

    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid duration output: {0}")]
    InvalidDuration(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            exit_code,
        }
    }

    /// Exit code of the transcoder, when the error carries one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::FfmpegFailed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

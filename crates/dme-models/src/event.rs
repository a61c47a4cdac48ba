//! Events streamed from a running job to its caller.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::JobState;

/// Job event envelope.
///
/// Events for one job arrive in production order and the terminal event
/// (`Completed`, `Cancelled` or `Failed`) is always the last one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// One line of transcoder output (or a supervisor notice)
    Log {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Progress estimate (0-99 while running, 100 right before `Completed`)
    Progress { value: u8 },

    /// Transcoder exited successfully
    Completed { output_path: PathBuf },

    /// Job was cancelled; the output file may be truncated
    Cancelled,

    /// Launch failure or non-zero exit
    Failed {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
    },
}

impl JobEvent {
    /// Create a log event stamped with the current time.
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn progress(value: u8) -> Self {
        Self::Progress {
            value: value.min(100),
        }
    }

    pub fn completed(output_path: impl Into<PathBuf>) -> Self {
        Self::Completed {
            output_path: output_path.into(),
        }
    }

    pub fn failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::Failed {
            message: message.into(),
            exit_code,
        }
    }

    /// Whether this event ends the job.
    pub fn is_terminal(&self) -> bool {
        self.terminal_state().is_some()
    }

    /// The job state this event moves to, for terminal events.
    pub fn terminal_state(&self) -> Option<JobState> {
        match self {
            JobEvent::Completed { .. } => Some(JobState::Completed),
            JobEvent::Cancelled => Some(JobState::Cancelled),
            JobEvent::Failed { .. } => Some(JobState::Failed),
            JobEvent::Log { .. } | JobEvent::Progress { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(JobEvent::completed("/out/a.mp4").is_terminal());
        assert!(JobEvent::Cancelled.is_terminal());
        assert_eq!(
            JobEvent::failed("boom", Some(1)).terminal_state(),
            Some(JobState::Failed)
        );
        assert!(!JobEvent::log("frame=1").is_terminal());
        assert!(!JobEvent::progress(50).is_terminal());
    }

    #[test]
    fn test_progress_is_capped() {
        assert_eq!(JobEvent::progress(250), JobEvent::Progress { value: 100 });
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(JobEvent::progress(42)).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["value"], 42);

        let json = serde_json::to_value(JobEvent::failed("exit", None)).unwrap();
        assert_eq!(json["type"], "failed");
        assert!(json.get("exit_code").is_none());
    }
}

//! Tracing setup and console presentation of job events.

use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dme_media::JobObserver;
use dme_models::JobId;

/// Initialize tracing with colored output by default, JSON when `LOG_FORMAT=json`.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Presents one job's events through `tracing`.
#[derive(Debug)]
pub struct ConsoleObserver {
    job_id: String,
    lines: usize,
    last_percent: Option<u8>,
}

impl ConsoleObserver {
    pub fn new(job_id: &JobId) -> Self {
        Self {
            job_id: job_id.to_string(),
            lines: 0,
            last_percent: None,
        }
    }

    /// Number of transcoder lines seen.
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn last_percent(&self) -> Option<u8> {
        self.last_percent
    }
}

impl JobObserver for ConsoleObserver {
    fn on_log(&mut self, message: &str) {
        self.lines += 1;
        info!(job_id = %self.job_id, "{}", message);
    }

    fn on_progress(&mut self, percent: u8) {
        self.last_percent = Some(percent);
        info!(job_id = %self.job_id, percent, "Progress: {}%", percent);
    }

    fn on_completed(&mut self, output_path: &Path) {
        info!(
            job_id = %self.job_id,
            output = %output_path.display(),
            "Done: {}",
            output_path.display()
        );
    }

    fn on_cancelled(&mut self) {
        warn!(job_id = %self.job_id, "Aborted");
    }

    fn on_error(&mut self, message: &str, exit_code: Option<i32>) {
        error!(job_id = %self.job_id, exit_code = ?exit_code, "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_tracks_lines_and_progress() {
        let job_id = JobId::new();
        let mut observer = ConsoleObserver::new(&job_id);
        assert_eq!(observer.last_percent(), None);

        observer.on_log("frame=1 time=00:00:01.00");
        observer.on_progress(12);
        observer.on_log("frame=2 time=00:00:02.00");
        observer.on_progress(25);

        assert_eq!(observer.lines(), 2);
        assert_eq!(observer.last_percent(), Some(25));
    }
}

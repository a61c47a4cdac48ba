//! Caller-facing side of a job's event stream.

use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use dme_models::{JobEvent, JobId};

/// Callback surface for job events.
///
/// Every method defaults to a no-op so observers implement only what they
/// present.
pub trait JobObserver {
    fn on_log(&mut self, _message: &str) {}
    fn on_progress(&mut self, _percent: u8) {}
    fn on_completed(&mut self, _output_path: &Path) {}
    fn on_cancelled(&mut self) {}
    fn on_error(&mut self, _message: &str, _exit_code: Option<i32>) {}
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed { output_path: PathBuf },
    Cancelled,
    Failed {
        message: String,
        exit_code: Option<i32>,
    },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }
}

/// Sending half, owned by the job worker.
#[derive(Debug, Clone)]
pub(crate) struct EventSender {
    tx: mpsc::UnboundedSender<JobEvent>,
}

impl EventSender {
    pub(crate) fn send(&self, event: JobEvent) {
        if self.tx.send(event).is_err() {
            trace!("Job event receiver dropped");
        }
    }
}

/// Ordered event stream of one job.
///
/// The stream ends after the terminal event.
#[derive(Debug)]
pub struct JobEvents {
    job_id: JobId,
    rx: mpsc::UnboundedReceiver<JobEvent>,
}

impl JobEvents {
    pub(crate) fn channel(job_id: JobId) -> (EventSender, JobEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventSender { tx }, JobEvents { job_id, rx })
    }

    /// The job these events belong to.
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Next event, `None` once the job has ended.
    pub async fn recv(&mut self) -> Option<JobEvent> {
        self.rx.recv().await
    }

    /// Drain the stream until the job ends.
    pub async fn collect(mut self) -> Vec<JobEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }

    /// Dispatch every event to `observer` and return the outcome.
    pub async fn forward_to<O>(mut self, observer: &mut O) -> JobOutcome
    where
        O: JobObserver + ?Sized,
    {
        while let Some(event) = self.rx.recv().await {
            match event {
                JobEvent::Log { message, .. } => observer.on_log(&message),
                JobEvent::Progress { value } => observer.on_progress(value),
                JobEvent::Completed { output_path } => {
                    observer.on_completed(&output_path);
                    return JobOutcome::Completed { output_path };
                }
                JobEvent::Cancelled => {
                    observer.on_cancelled();
                    return JobOutcome::Cancelled;
                }
                JobEvent::Failed { message, exit_code } => {
                    observer.on_error(&message, exit_code);
                    return JobOutcome::Failed { message, exit_code };
                }
            }
        }

        warn!(job_id = %self.job_id, "Job event stream closed without a terminal event");
        let message = "Job ended without reporting a result".to_string();
        observer.on_error(&message, None);
        JobOutcome::Failed {
            message,
            exit_code: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl JobObserver for Recorder {
        fn on_log(&mut self, message: &str) {
            self.calls.push(format!("log:{}", message));
        }
        fn on_progress(&mut self, percent: u8) {
            self.calls.push(format!("progress:{}", percent));
        }
        fn on_completed(&mut self, output_path: &Path) {
            self.calls.push(format!("completed:{}", output_path.display()));
        }
        fn on_error(&mut self, message: &str, exit_code: Option<i32>) {
            self.calls.push(format!("error:{}:{:?}", message, exit_code));
        }
    }

    #[tokio::test]
    async fn test_forward_dispatches_in_order() {
        let (tx, events) = JobEvents::channel(JobId::from_string("job-1"));
        tx.send(JobEvent::log("frame=1"));
        tx.send(JobEvent::progress(40));
        tx.send(JobEvent::progress(100));
        tx.send(JobEvent::completed("/out/a.mp4"));
        drop(tx);

        let mut recorder = Recorder::default();
        let outcome = events.forward_to(&mut recorder).await;

        assert!(outcome.is_success());
        assert_eq!(
            recorder.calls,
            vec!["log:frame=1", "progress:40", "progress:100", "completed:/out/a.mp4"]
        );
    }

    #[tokio::test]
    async fn test_forward_reports_failure_exit_code() {
        let (tx, events) = JobEvents::channel(JobId::new());
        tx.send(JobEvent::failed("FFmpeg exited with exit status: 1", Some(1)));

        let mut recorder = Recorder::default();
        let outcome = events.forward_to(&mut recorder).await;

        assert_eq!(
            outcome,
            JobOutcome::Failed {
                message: "FFmpeg exited with exit status: 1".to_string(),
                exit_code: Some(1),
            }
        );
    }

    #[tokio::test]
    async fn test_closed_stream_without_terminal_is_failure() {
        let (tx, events) = JobEvents::channel(JobId::new());
        tx.send(JobEvent::log("partial"));
        drop(tx);

        let mut recorder = Recorder::default();
        let outcome = events.forward_to(&mut recorder).await;
        assert!(matches!(outcome, JobOutcome::Failed { exit_code: None, .. }));
        assert_eq!(recorder.calls.len(), 2);
    }
}

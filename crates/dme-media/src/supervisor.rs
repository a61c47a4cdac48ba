//! Transcode job supervisor.
//!
//! One supervisor runs at most one job at a time. A job runs on its own
//! tokio task: probe the duration, pick the output path, launch FFmpeg,
//! stream its merged stdout/stderr as log and progress events, then reap the
//! process and emit exactly one terminal event.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

use dme_models::{JobEvent, JobId, JobState, TranscodeRequest};

use crate::command::build_transcode_args;
use crate::config::SupervisorConfig;
use crate::error::{MediaError, MediaResult};
use crate::events::{EventSender, JobEvents};
use crate::lines::forward_lines;
use crate::output_path::allocate_output_path;
use crate::probe::probe_duration;
use crate::process::hide_console_window;
use crate::progress::ProgressTracker;

/// Handle on the job currently owned by a supervisor.
struct ActiveJob {
    job_id: JobId,
    cancel_tx: watch::Sender<bool>,
    /// Cleared by the worker before it sends the terminal event
    busy: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ActiveJob {
    fn is_running(&self) -> bool {
        self.busy.load(Ordering::Acquire) && !self.handle.is_finished()
    }
}

/// Caller-owned transcode supervisor.
///
/// Dropping the supervisor cancels a job that is still running.
pub struct TranscodeSupervisor {
    config: Arc<SupervisorConfig>,
    state: Arc<watch::Sender<JobState>>,
    active: Option<ActiveJob>,
}

impl TranscodeSupervisor {
    /// Create a new supervisor.
    pub fn new(config: SupervisorConfig) -> Self {
        let (state, _) = watch::channel(JobState::Idle);
        Self {
            config: Arc::new(config),
            state: Arc::new(state),
            active: None,
        }
    }

    /// Current job state.
    pub fn state(&self) -> JobState {
        *self.state.borrow()
    }

    /// Watch job state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<JobState> {
        self.state.subscribe()
    }

    /// Whether a job is still in flight (including its probe phase).
    ///
    /// False as soon as the terminal event has been sent.
    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(ActiveJob::is_running)
    }

    /// Start a job.
    ///
    /// Fails synchronously only for an invalid request or when a job is
    /// already in flight. Everything else, including a transcoder that
    /// cannot be launched, is reported through the returned event stream.
    pub fn start(&mut self, request: TranscodeRequest) -> MediaResult<JobEvents> {
        if self.is_active() {
            return Err(MediaError::JobAlreadyRunning);
        }
        request.validate()?;

        let job_id = JobId::new();
        let (events_tx, events) = JobEvents::channel(job_id.clone());
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let busy = Arc::new(AtomicBool::new(true));
        self.state.send_replace(JobState::Idle);

        let span = tracing::info_span!("transcode_job", job_id = %job_id);
        let job = JobRun {
            request,
            config: Arc::clone(&self.config),
            events: events_tx,
            state: Arc::clone(&self.state),
            busy: Arc::clone(&busy),
            cancel_rx,
        };
        let handle = tokio::spawn(job.run().instrument(span));

        info!(job_id = %job_id, "Transcode job started");
        self.active = Some(ActiveJob {
            job_id,
            cancel_tx,
            busy,
            handle,
        });

        Ok(events)
    }

    /// Cancel the running job.
    ///
    /// The transcoder is killed without a grace period and any partial
    /// output is left on disk. No-op when no job is running.
    pub fn cancel(&self) {
        match &self.active {
            Some(job) if job.is_running() => {
                info!(job_id = %job.job_id, "Cancelling transcode job");
                job.cancel_tx.send_replace(true);
            }
            _ => debug!("Cancel requested with no running job"),
        }
    }
}

/// Everything the worker task owns for one job.
struct JobRun {
    request: TranscodeRequest,
    config: Arc<SupervisorConfig>,
    events: EventSender,
    state: Arc<watch::Sender<JobState>>,
    busy: Arc<AtomicBool>,
    cancel_rx: watch::Receiver<bool>,
}

impl JobRun {
    async fn run(mut self) {
        let started = Instant::now();

        let terminal = self.execute().await;
        let state = terminal.terminal_state().unwrap_or(JobState::Failed);

        match &terminal {
            JobEvent::Completed { output_path } => {
                info!(output = %output_path.display(), "Transcode completed")
            }
            JobEvent::Failed { message, exit_code } => {
                error!(exit_code = ?exit_code, "Transcode failed: {}", message)
            }
            _ => info!("Transcode cancelled"),
        }

        metrics::counter!("dme_jobs_total", "outcome" => state.as_str()).increment(1);
        metrics::histogram!("dme_transcode_seconds").record(started.elapsed().as_secs_f64());

        // State and activity first, so a caller reacting to the terminal
        // event sees them and may start the next job right away
        self.state.send_replace(state);
        self.busy.store(false, Ordering::Release);
        self.events.send(terminal);
    }

    /// Run the job and return its terminal event.
    async fn execute(&mut self) -> JobEvent {
        let binaries = &self.config.binaries;

        let duration = tokio::select! {
            biased;
            _ = cancellation(&mut self.cancel_rx) => return JobEvent::Cancelled,
            duration = probe_duration(
                &binaries.probe,
                &self.request.input_path,
                self.config.probe_timeout,
            ) => duration,
        };
        if *self.cancel_rx.borrow() {
            return JobEvent::Cancelled;
        }

        let output_path = allocate_output_path(
            &self.request.output_dir,
            &self.request.output_base_name(),
            self.request.format.extension(),
        );
        let args = build_transcode_args(&self.request, &output_path);
        debug!("Running FFmpeg: {} {}", binaries.transcoder.display(), args.join(" "));

        self.events.send(JobEvent::log(format!(
            "Start processing: {}",
            self.request.input_file_name()
        )));

        let mut command = Command::new(&binaries.transcoder);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        hide_console_window(&mut command);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = MediaError::LaunchFailed {
                    program: binaries.transcoder.clone(),
                    source,
                };
                return JobEvent::failed(err.to_string(), None);
            }
        };

        self.state.send_replace(JobState::Running);
        info!(
            pid = ?child.id(),
            output = %output_path.display(),
            duration,
            "FFmpeg launched"
        );

        self.supervise(child, duration, output_path).await
    }

    /// Consume the child's output until it ends or the job is cancelled.
    async fn supervise(&mut self, mut child: Child, duration: f64, output_path: PathBuf) -> JobEvent {
        let (line_tx, mut line_rx) = mpsc::unbounded_channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(forward_lines(stdout, line_tx.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(forward_lines(stderr, line_tx.clone())));
        }
        drop(line_tx);

        let mut tracker = ProgressTracker::new(duration);
        let mut cancelled = false;

        loop {
            tokio::select! {
                biased;
                _ = cancellation(&mut self.cancel_rx) => {
                    cancelled = true;
                    break;
                }
                line = line_rx.recv() => match line {
                    Some(line) => {
                        let progress = tracker.update(&line);
                        self.events.send(JobEvent::log(line));
                        if let Some(percent) = progress {
                            self.events.send(JobEvent::progress(percent));
                        }
                    }
                    None => break,
                },
            }
        }

        let status = if cancelled {
            None
        } else {
            tokio::select! {
                biased;
                _ = cancellation(&mut self.cancel_rx) => {
                    cancelled = true;
                    None
                }
                status = child.wait() => Some(status),
            }
        };

        if cancelled {
            kill_and_reap(&mut child).await;
            for reader in readers {
                reader.abort();
            }
            return JobEvent::Cancelled;
        }

        for reader in readers {
            match reader.await {
                Ok(Err(e)) => warn!("Error reading FFmpeg output: {}", e),
                Err(e) => warn!("FFmpeg output reader panicked: {}", e),
                Ok(Ok(())) => {}
            }
        }

        match status {
            Some(Ok(status)) if status.success() => {
                self.events.send(JobEvent::progress(100));
                JobEvent::completed(output_path)
            }
            Some(Ok(status)) => {
                let err = MediaError::ffmpeg_failed(
                    format!("FFmpeg exited with {}", status),
                    status.code(),
                );
                JobEvent::failed(err.to_string(), err.exit_code())
            }
            Some(Err(e)) => JobEvent::failed(format!("Failed to wait for FFmpeg: {}", e), None),
            None => JobEvent::failed("FFmpeg exit status unavailable", None),
        }
    }
}

/// Resolves once cancellation is requested or the supervisor is dropped.
async fn cancellation(cancel_rx: &mut watch::Receiver<bool>) {
    loop {
        if *cancel_rx.borrow_and_update() {
            return;
        }
        if cancel_rx.changed().await.is_err() {
            debug!("Supervisor dropped, treating job as cancelled");
            return;
        }
    }
}

/// Kill the child immediately and wait for it so no zombie is left.
async fn kill_and_reap(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        // Already exited between the last read and the kill
        debug!("FFmpeg kill skipped: {}", e);
    }
    match child.wait().await {
        Ok(status) => debug!("FFmpeg reaped after cancel: {}", status),
        Err(e) => warn!("Failed to reap FFmpeg after cancel: {}", e),
    }
}

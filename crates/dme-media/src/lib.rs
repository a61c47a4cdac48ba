//! FFmpeg job supervision for the DME transcoder.
//!
//! This crate provides:
//! - Duration probing through FFprobe (best effort)
//! - Collision-free output path allocation
//! - Deterministic FFmpeg argument construction for the crop/blur/scale pipeline
//! - Progress parsing from FFmpeg status lines
//! - A single-job supervisor with an ordered event stream and kill-on-cancel

pub mod binaries;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod filters;
pub mod lines;
pub mod output_path;
pub mod probe;
pub mod process;
pub mod progress;
pub mod supervisor;

pub use binaries::TranscoderBinaries;
pub use command::{build_transcode_args, build_transcode_command, FfmpegCommand};
pub use config::SupervisorConfig;
pub use error::{MediaError, MediaResult};
pub use events::{JobEvents, JobObserver, JobOutcome};
pub use filters::{build_filter_chain, build_video_filter};
pub use output_path::allocate_output_path;
pub use probe::{probe_duration, try_probe_duration};
pub use progress::{extract_elapsed_seconds, progress_percent, ProgressTracker};
pub use supervisor::TranscodeSupervisor;

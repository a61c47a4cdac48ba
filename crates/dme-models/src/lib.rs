//! Shared data models for the DME transcoder.
//!
//! This crate provides Serde-serializable types for:
//! - Transcode requests and their parameters
//! - Encoding defaults and quality flag selection
//! - Job state and the job event stream

pub mod encoding;
pub mod event;
pub mod filter;
pub mod job;
pub mod params;
pub mod request;

// Re-export common types
pub use encoding::{presets_for_codec, QualityFlag};
pub use event::JobEvent;
pub use filter::auto_balance_sigma_r;
pub use job::{JobId, JobState};
pub use params::{AspectOverride, ContainerFormat, ResolutionMode};
pub use request::{RequestError, TranscodeRequest};

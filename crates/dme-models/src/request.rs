//! Transcode request definition and validation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::encoding::{DEFAULT_PRESET, DEFAULT_QUALITY, DEFAULT_VIDEO_CODEC, MAX_QUALITY};
use crate::filter::{BLUR_MAX, BLUR_MIN, DEFAULT_BLUR, DEFAULT_SIGMA_R, SIGMA_R_MAX, SIGMA_R_MIN};
use crate::{AspectOverride, ContainerFormat, ResolutionMode};

/// One desired encode.
///
/// Built by the caller and never mutated by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscodeRequest {
    /// Source video file
    pub input_path: PathBuf,

    /// Folder the output file is written to
    pub output_dir: PathBuf,

    /// Output container
    #[serde(default)]
    pub format: ContainerFormat,

    /// Apply the blur + bilateral smoothing pair
    #[serde(default)]
    pub use_filter: bool,

    /// Gaussian blur sigma, also the bilateral spatial sigma
    #[serde(default = "default_blur")]
    pub blur: f64,

    /// Bilateral range sigma
    #[serde(default = "default_sigma_r")]
    pub sigma_r: f64,

    /// Square output size
    #[serde(default)]
    pub resolution: ResolutionMode,

    /// Display aspect ratio override
    #[serde(default)]
    #[schemars(with = "String")]
    pub aspect: AspectOverride,

    /// Video codec (e.g., "libx265", "hevc_nvenc")
    #[serde(default = "default_codec")]
    pub codec: String,

    /// CRF or CQ value depending on the codec family
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Encoder preset (e.g., "medium", "p4")
    #[serde(default = "default_preset")]
    pub preset: String,
}

fn default_blur() -> f64 {
    DEFAULT_BLUR
}
fn default_sigma_r() -> f64 {
    DEFAULT_SIGMA_R
}
fn default_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_quality() -> u8 {
    DEFAULT_QUALITY
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}

impl TranscodeRequest {
    /// Create a request with default encoding parameters.
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            format: ContainerFormat::default(),
            use_filter: false,
            blur: DEFAULT_BLUR,
            sigma_r: DEFAULT_SIGMA_R,
            resolution: ResolutionMode::default(),
            aspect: AspectOverride::default(),
            codec: default_codec(),
            quality: DEFAULT_QUALITY,
            preset: default_preset(),
        }
    }

    /// Enable the smoothing filters with the given strengths.
    pub fn with_filter(mut self, blur: f64, sigma_r: f64) -> Self {
        self.use_filter = true;
        self.blur = blur;
        self.sigma_r = sigma_r;
        self
    }

    pub fn with_resolution(mut self, resolution: ResolutionMode) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_aspect(mut self, aspect: AspectOverride) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn with_format(mut self, format: ContainerFormat) -> Self {
        self.format = format;
        self
    }

    /// Set codec, quality and preset together.
    pub fn with_encoder(mut self, codec: impl Into<String>, quality: u8, preset: impl Into<String>) -> Self {
        self.codec = codec.into();
        self.quality = quality;
        self.preset = preset.into();
        self
    }

    /// Check parameter bounds.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.input_path.as_os_str().is_empty() {
            return Err(RequestError::MissingInput);
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(RequestError::MissingOutputDir);
        }
        if !(BLUR_MIN..=BLUR_MAX).contains(&self.blur) {
            return Err(RequestError::OutOfRange {
                field: "blur",
                value: self.blur,
                min: BLUR_MIN,
                max: BLUR_MAX,
            });
        }
        if !(SIGMA_R_MIN..=SIGMA_R_MAX).contains(&self.sigma_r) {
            return Err(RequestError::OutOfRange {
                field: "sigma_r",
                value: self.sigma_r,
                min: SIGMA_R_MIN,
                max: SIGMA_R_MAX,
            });
        }
        if self.quality > MAX_QUALITY {
            return Err(RequestError::OutOfRange {
                field: "quality",
                value: self.quality as f64,
                min: 0.0,
                max: MAX_QUALITY as f64,
            });
        }
        if self.codec.trim().is_empty() {
            return Err(RequestError::Empty("codec"));
        }
        if self.preset.trim().is_empty() {
            return Err(RequestError::Empty("preset"));
        }
        Ok(())
    }

    /// Output file stem: the source stem tagged with the filter strengths.
    ///
    /// Runs with different settings on the same source get distinct names.
    pub fn output_base_name(&self) -> String {
        let stem = self
            .input_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());

        format!("{}_G{:.2}_S{:.3}", stem, self.blur, self.sigma_r)
    }

    /// Source file name for display.
    pub fn input_file_name(&self) -> String {
        self.input_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input_path.display().to_string())
    }
}

/// Request validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("Input file is not set")]
    MissingInput,

    #[error("Output folder is not set")]
    MissingOutputDir,

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{0} cannot be empty")]
    Empty(&'static str),
}

//! Output container, resolution and aspect ratio parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Output container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// MPEG-4 Part 14
    #[default]
    Mp4,
    /// Matroska
    Mkv,
    /// MPEG transport stream
    Ts,
}

impl ContainerFormat {
    pub const ALL: &'static [ContainerFormat] = &[
        ContainerFormat::Mp4,
        ContainerFormat::Mkv,
        ContainerFormat::Ts,
    ];

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::Mkv => "mkv",
            ContainerFormat::Ts => "ts",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ContainerFormat {
    type Err = ContainerFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "mp4" => Ok(ContainerFormat::Mp4),
            "mkv" => Ok(ContainerFormat::Mkv),
            "ts" => Ok(ContainerFormat::Ts),
            _ => Err(ContainerFormatParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown container format: {0}")]
pub struct ContainerFormatParseError(String);

/// Square output resolution.
///
/// `Original` leaves the frame size untouched; the other modes scale to a
/// fixed `N x N` square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum ResolutionMode {
    #[default]
    #[serde(rename = "none")]
    Original,
    #[serde(rename = "518")]
    Square518,
    #[serde(rename = "512")]
    Square512,
    #[serde(rename = "504")]
    Square504,
    #[serde(rename = "392")]
    Square392,
}

impl ResolutionMode {
    pub const ALL: &'static [ResolutionMode] = &[
        ResolutionMode::Original,
        ResolutionMode::Square518,
        ResolutionMode::Square512,
        ResolutionMode::Square504,
        ResolutionMode::Square392,
    ];

    /// Target edge length in pixels, `None` for the original size.
    pub fn target_size(&self) -> Option<u32> {
        match self {
            ResolutionMode::Original => None,
            ResolutionMode::Square518 => Some(518),
            ResolutionMode::Square512 => Some(512),
            ResolutionMode::Square504 => Some(504),
            ResolutionMode::Square392 => Some(392),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMode::Original => "none",
            ResolutionMode::Square518 => "518",
            ResolutionMode::Square512 => "512",
            ResolutionMode::Square504 => "504",
            ResolutionMode::Square392 => "392",
        }
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResolutionMode {
    type Err = ResolutionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "original" | "" => Ok(ResolutionMode::Original),
            "518" => Ok(ResolutionMode::Square518),
            "512" => Ok(ResolutionMode::Square512),
            "504" => Ok(ResolutionMode::Square504),
            "392" => Ok(ResolutionMode::Square392),
            _ => Err(ResolutionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown resolution mode: {0}, expected one of none, 518, 512, 504, 392")]
pub struct ResolutionParseError(String);

/// Display aspect ratio override.
///
/// A ratio is kept as validated text in `setdar` form (`W/H` or a single
/// decimal), so decimal ratios such as `2.35:1` pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum AspectOverride {
    /// Keep whatever aspect ratio the filter chain produces
    #[default]
    None,
    /// Force the display aspect ratio
    Ratio(String),
}

impl AspectOverride {
    /// Create an integer `width/height` override.
    pub fn ratio(width: u32, height: u32) -> Self {
        Self::Ratio(format!("{}/{}", width, height))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, AspectOverride::None)
    }

    /// The ratio text, `None` when no override is set.
    pub fn as_ratio(&self) -> Option<&str> {
        match self {
            AspectOverride::None => None,
            AspectOverride::Ratio(ratio) => Some(ratio),
        }
    }
}

impl fmt::Display for AspectOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspectOverride::None => write!(f, "none"),
            AspectOverride::Ratio(ratio) => write!(f, "{}", ratio),
        }
    }
}

impl FromStr for AspectOverride {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(AspectOverride::None);
        }

        let parts: Vec<&str> = s.split(|c| c == ':' || c == '/').map(str::trim).collect();
        if parts.len() > 2 {
            return Err(AspectRatioParseError::InvalidFormat(s.to_string()));
        }
        for part in &parts {
            check_ratio_term(part)?;
        }

        Ok(AspectOverride::Ratio(parts.join("/")))
    }
}

/// A ratio term is a plain positive decimal: digits with at most one dot.
fn check_ratio_term(term: &str) -> Result<(), AspectRatioParseError> {
    let plain = !term.is_empty()
        && term.chars().all(|c| c.is_ascii_digit() || c == '.')
        && term.chars().any(|c| c.is_ascii_digit());
    let value: f64 = match term.parse() {
        Ok(value) if plain => value,
        _ => return Err(AspectRatioParseError::InvalidNumber(term.to_string())),
    };
    if value <= 0.0 {
        return Err(AspectRatioParseError::NonPositive(term.to_string()));
    }
    Ok(())
}

impl TryFrom<String> for AspectOverride {
    type Error = AspectRatioParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectOverride> for String {
    fn from(value: AspectOverride) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Error)]
pub enum AspectRatioParseError {
    #[error("Invalid aspect ratio format: {0}, expected 'W:H', 'W/H', a decimal ratio or 'none'")]
    InvalidFormat(String),
    #[error("Invalid number in aspect ratio: {0}")]
    InvalidNumber(String),
    #[error("Aspect ratio terms must be positive, got {0}")]
    NonPositive(String),
}

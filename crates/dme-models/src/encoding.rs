//! Video encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.265)
pub const DEFAULT_VIDEO_CODEC: &str = "libx265";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "medium";
/// Default quality value (CRF or CQ, depending on codec family)
pub const DEFAULT_QUALITY: u8 = 18;
/// Highest quality value accepted by both quality flag families
pub const MAX_QUALITY: u8 = 51;

/// Codecs offered to users.
pub const SUPPORTED_CODECS: &[&str] = &["libx265", "libx264", "hevc_nvenc"];

/// Substring identifying NVIDIA hardware encoders (`h264_nvenc`, `hevc_nvenc`, ...).
pub const HARDWARE_ENCODER_MARKER: &str = "nvenc";

/// Presets understood by the NVENC encoders.
pub const HARDWARE_PRESETS: &[&str] = &[
    "p1", "p2", "p3", "p4", "p5", "p6", "p7", "fast", "medium", "slow",
];

/// Presets understood by libx264/libx265.
pub const SOFTWARE_PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

/// Whether the codec belongs to the hardware encoder family.
pub fn is_hardware_codec(codec: &str) -> bool {
    codec.contains(HARDWARE_ENCODER_MARKER)
}

/// Presets offered for a codec.
///
/// Advisory only: requests carrying any other preset are still encoded.
pub fn presets_for_codec(codec: &str) -> &'static [&'static str] {
    if is_hardware_codec(codec) {
        HARDWARE_PRESETS
    } else {
        SOFTWARE_PRESETS
    }
}

/// Quality flag family.
///
/// Exactly one applies per request: NVENC encoders take a constant
/// quantizer target, software encoders take a constant rate factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    /// `-crf` (libx264/libx265)
    Crf,
    /// `-cq` (NVENC rate control)
    Cq,
}

impl QualityFlag {
    /// Select the flag family for a codec identifier.
    pub fn for_codec(codec: &str) -> Self {
        if is_hardware_codec(codec) {
            QualityFlag::Cq
        } else {
            QualityFlag::Crf
        }
    }

    /// The FFmpeg option name.
    pub fn as_arg(&self) -> &'static str {
        match self {
            QualityFlag::Crf => "-crf",
            QualityFlag::Cq => "-cq",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_flag_selection() {
        assert_eq!(QualityFlag::for_codec("hevc_nvenc"), QualityFlag::Cq);
        assert_eq!(QualityFlag::for_codec("h264_nvenc"), QualityFlag::Cq);
        assert_eq!(QualityFlag::for_codec("libx265"), QualityFlag::Crf);
        assert_eq!(QualityFlag::for_codec("libx264"), QualityFlag::Crf);
        assert_eq!(QualityFlag::Cq.as_arg(), "-cq");
    }

    #[test]
    fn test_presets_for_codec() {
        assert!(presets_for_codec("hevc_nvenc").contains(&"p7"));
        assert!(!presets_for_codec("hevc_nvenc").contains(&"veryslow"));
        assert!(presets_for_codec("libx264").contains(&"veryslow"));
        // "medium" is a safe fallback for every family
        for codec in SUPPORTED_CODECS {
            assert!(presets_for_codec(codec).contains(&DEFAULT_PRESET));
        }
    }
}

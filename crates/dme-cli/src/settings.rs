//! Persisted front-end settings.
//!
//! A flat JSON record kept next to the binary. Keys match the document
//! written by earlier releases, so existing files keep loading.

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use dme_models::encoding::{DEFAULT_PRESET, DEFAULT_QUALITY, DEFAULT_VIDEO_CODEC, MAX_QUALITY};
use dme_models::filter::{DEFAULT_BLUR, DEFAULT_SIGMA_R};
use dme_models::{
    auto_balance_sigma_r, presets_for_codec, AspectOverride, ContainerFormat, ResolutionMode,
    TranscodeRequest,
};

/// Default settings file name.
pub const DEFAULT_SETTINGS_FILE: &str = "settings_single.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// UI language tag, carried through untouched
    pub lang: String,
    pub input: String,
    pub output: String,
    pub use_filter: bool,
    pub res_mode: ResolutionMode,
    pub aspect: AspectOverride,
    pub blur: f64,
    pub sigmar: f64,
    /// Derive `sigmar` from `blur`
    pub auto: bool,
    pub ext: ContainerFormat,
    pub codec: String,
    #[serde(deserialize_with = "deserialize_quality")]
    pub crf: u8,
    pub preset: String,
}

/// Accepts `20` as well as the `20.0` written by the spin box of older releases.
fn deserialize_quality<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || !(0.0..=f64::from(MAX_QUALITY)).contains(&value) {
        return Err(de::Error::custom(format!(
            "crf must be a whole number between 0 and {}, got {}",
            MAX_QUALITY, value
        )));
    }
    Ok(value as u8)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lang: "EN".to_string(),
            input: String::new(),
            output: String::new(),
            use_filter: false,
            res_mode: ResolutionMode::default(),
            aspect: AspectOverride::default(),
            blur: DEFAULT_BLUR,
            sigmar: DEFAULT_SIGMA_R,
            auto: true,
            ext: ContainerFormat::default(),
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            crf: DEFAULT_QUALITY,
            preset: DEFAULT_PRESET.to_string(),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %path.display(), "No settings loaded: {}", e);
                return Self::default();
            }
        };

        match serde_json::from_str::<Settings>(&raw) {
            Ok(mut settings) => {
                settings.normalize();
                settings
            }
            Err(e) => {
                warn!(path = %path.display(), "Ignoring corrupt settings file: {}", e);
                Self::default()
            }
        }
    }

    /// Write settings as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        debug!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// Apply the derived values: auto-balanced `sigmar` and a preset valid for `codec`.
    pub fn normalize(&mut self) {
        if self.auto && self.use_filter {
            self.sigmar = auto_balance_sigma_r(self.blur);
        }

        if !presets_for_codec(&self.codec).contains(&self.preset.as_str()) {
            warn!(
                codec = %self.codec,
                preset = %self.preset,
                "Preset not offered for codec, using {}",
                DEFAULT_PRESET
            );
            self.preset = DEFAULT_PRESET.to_string();
        }
    }

    /// Build the request handed to the supervisor.
    pub fn to_request(&self) -> TranscodeRequest {
        let mut request = TranscodeRequest::new(PathBuf::from(&self.input), PathBuf::from(&self.output))
            .with_format(self.ext)
            .with_resolution(self.res_mode)
            .with_aspect(self.aspect.clone())
            .with_encoder(&self.codec, self.crf, &self.preset);
        request.use_filter = self.use_filter;
        request.blur = self.blur;
        request.sigma_r = self.sigmar;
        request
    }
}

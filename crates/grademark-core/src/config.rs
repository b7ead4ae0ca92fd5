//! Grading configuration and loading.
//!
//! Every component takes its section of [`GrademarkConfig`] at construction;
//! nothing reads process-wide settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::text::TextLanguage;

/// Top-level grademark configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrademarkConfig {
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// External OCR engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Path or name of the `tesseract` executable.
    #[serde(default = "default_tesseract_cmd")]
    pub tesseract_cmd: String,
    /// `+`-joined language set, e.g. `eng+hin+guj`.
    #[serde(default = "default_languages")]
    pub languages: String,
    /// Tesseract OCR engine mode (3 = default, LSTM when available).
    #[serde(default = "default_engine_mode")]
    pub engine_mode: u8,
    /// Tesseract page segmentation mode (6 = a single uniform block of text).
    #[serde(default = "default_page_segmentation_mode")]
    pub page_segmentation_mode: u8,
}

fn default_tesseract_cmd() -> String {
    "tesseract".to_string()
}
fn default_languages() -> String {
    "eng+hin+guj".to_string()
}
fn default_engine_mode() -> u8 {
    3
}
fn default_page_segmentation_mode() -> u8 {
    6
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: default_tesseract_cmd(),
            languages: default_languages(),
            engine_mode: default_engine_mode(),
            page_segmentation_mode: default_page_segmentation_mode(),
        }
    }
}

/// Binarization and denoising settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Nominal side of the local thresholding window in pixels; odd, at least 3.
    ///
    /// The local mean is a Gaussian blur whose sigma is derived from this value
    /// (`0.3 * ((w - 1) / 2 - 1) + 0.8`). The blur kernel spans `2 * ceil(3 * sigma) + 1`
    /// pixels, so the default of 11 (sigma 2.0) actually samples 13.
    #[serde(default = "default_window_size")]
    pub window_size: u32,
    /// Subtracted from the local mean before comparing.
    #[serde(default = "default_threshold_constant")]
    pub threshold_constant: f32,
    /// Radius of the opening's structuring element; 0 disables the opening.
    #[serde(default = "default_opening_radius")]
    pub opening_radius: u8,
}

fn default_window_size() -> u32 {
    11
}
fn default_threshold_constant() -> f32 {
    2.0
}
fn default_opening_radius() -> u8 {
    1
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            threshold_constant: default_threshold_constant(),
            opening_radius: default_opening_radius(),
        }
    }
}

/// What to do when two regions of one answer sheet carry the same question id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionCollision {
    /// The later region replaces the earlier text.
    #[default]
    Overwrite,
    /// The first region's text is kept.
    KeepFirst,
    /// Texts are joined with a newline in page order.
    Append,
}

/// Page segmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Number of horizontal bands when no layout template is supplied.
    #[serde(default = "default_bands")]
    pub bands: u32,
    /// Half-height of the boundary search window, as a fraction of the page.
    #[serde(default = "default_search_radius")]
    pub search_radius: f64,
    #[serde(default)]
    pub collision: RegionCollision,
}

fn default_bands() -> u32 {
    5
}
fn default_search_radius() -> f64 {
    0.05
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            bands: default_bands(),
            search_radius: default_search_radius(),
            collision: RegionCollision::default(),
        }
    }
}

/// Text comparison settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub language: TextLanguage,
}

impl GrademarkConfig {
    /// Reject values no component can work with.
    pub fn validate(&self) -> Result<()> {
        let window = self.preprocess.window_size;
        anyhow::ensure!(
            window >= 3 && window % 2 == 1,
            "preprocess.window_size must be odd and at least 3, got {window}"
        );
        anyhow::ensure!(
            self.preprocess.threshold_constant.is_finite(),
            "preprocess.threshold_constant must be finite"
        );
        anyhow::ensure!(
            self.segmentation.bands >= 1,
            "segmentation.bands must be at least 1"
        );
        let radius = self.segmentation.search_radius;
        anyhow::ensure!(
            radius > 0.0 && radius <= 0.5,
            "segmentation.search_radius must be in (0, 0.5], got {radius}"
        );
        anyhow::ensure!(
            !self.ocr.languages.trim().is_empty(),
            "ocr.languages must not be empty"
        );
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `grademark.toml` in the current directory
/// 2. `~/.config/grademark/config.toml`
///
/// Environment variable overrides: `GRADEMARK_TESSERACT_CMD`, `GRADEMARK_OCR_LANGUAGES`.
pub fn load_config_from(path: Option<&Path>) -> Result<GrademarkConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("grademark.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GrademarkConfig::default(),
    };

    if let Ok(cmd) = std::env::var("GRADEMARK_TESSERACT_CMD") {
        config.ocr.tesseract_cmd = cmd;
    }
    if let Ok(languages) = std::env::var("GRADEMARK_OCR_LANGUAGES") {
        config.ocr.languages = languages;
    }

    config.ocr.tesseract_cmd = resolve_env_vars(&config.ocr.tesseract_cmd);
    config.ocr.languages = resolve_env_vars(&config.ocr.languages);

    config.validate()?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

/// Parse a TOML string into a config (no env overrides, no validation).
pub fn parse_config_str(content: &str) -> Result<GrademarkConfig> {
    Ok(toml::from_str(content)?)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("grademark"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_GRADEMARK_TEST_VAR", "/opt/tess");
        assert_eq!(resolve_env_vars("${_GRADEMARK_TEST_VAR}"), "/opt/tess");
        assert_eq!(
            resolve_env_vars("${_GRADEMARK_TEST_VAR}/bin/tesseract"),
            "/opt/tess/bin/tesseract"
        );
        std::env::remove_var("_GRADEMARK_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = GrademarkConfig::default();
        assert_eq!(config.ocr.languages, "eng+hin+guj");
        assert_eq!(config.ocr.page_segmentation_mode, 6);
        assert_eq!(config.preprocess.window_size, 11);
        assert_eq!(config.segmentation.bands, 5);
        assert_eq!(config.segmentation.collision, RegionCollision::Overwrite);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml_str = r#"
[ocr]
languages = "eng"

[segmentation]
bands = 8
collision = "keep_first"
"#;
        let config = parse_config_str(toml_str).unwrap();
        assert_eq!(config.ocr.languages, "eng");
        assert_eq!(config.ocr.tesseract_cmd, "tesseract");
        assert_eq!(config.segmentation.bands, 8);
        assert_eq!(config.segmentation.collision, RegionCollision::KeepFirst);
        assert_eq!(config.preprocess, PreprocessConfig::default());
    }

    #[test]
    fn validate_rejects_even_window() {
        let mut config = GrademarkConfig::default();
        config.preprocess.window_size = 10;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("window_size"));
    }

    #[test]
    fn validate_rejects_zero_bands() {
        let mut config = GrademarkConfig::default();
        config.segmentation.bands = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grademark.toml");
        std::fs::write(&path, "[preprocess]\nwindow_size = 15\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.preprocess.window_size, 15);
    }

    #[test]
    fn load_missing_explicit_path_fails() {
        let err = load_config_from(Some(Path::new("/nonexistent/grademark.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}

//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `sharecard.toml`. User files are
//! sparse: stock defaults are serialized to a TOML value and the user file is
//! merged on top, so only the keys being changed need to appear.
//!
//! ## Configuration Options
//!
//! ```toml
//! [output]
//! width = 1200             # Final share image size
//! height = 630
//! quality = 88             # JPEG quality (1-100)
//!
//! [generation]
//! width = 2400             # Illustration size (same aspect as output)
//! height = 1260
//!
//! [generator]
//! provider = "gemini"      # "gemini" or "none" (fallback backgrounds only)
//! model = "gemini-2.5-flash-image"
//! api_base = "https://generativelanguage.googleapis.com/v1beta"
//! api_key_env = "GEMINI_API_KEY"
//! timeout_secs = 90
//!
//! [layout]
//! margin_fraction = 0.06
//! text_width_fraction = 0.55
//! title_size_fraction = 0.1
//! max_title_lines = 4
//!
//! [brand]
//! text = "Code with PHP"
//! text_color = "#0f172a"
//! shadow_color = "#ffffff"
//! light_tint = "#f8fafc"
//! dark_tint = "#0b1020"
//!
//! [series.php-basics]
//! label = "PHP Basics"
//! primary = "#4f46e5"
//! secondary = "#0ea5e9"
//! accent = "#6366f1"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, Rgb8, aspect_ratios_match};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILENAME: &str = "sharecard.toml";

/// Maximum relative difference between the generation and output aspect ratios.
const ASPECT_TOLERANCE: f64 = 0.02;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Final share image settings.
    pub output: OutputConfig,
    /// Illustration (background) resolution.
    pub generation: GenerationConfig,
    /// External image generation service.
    pub generator: GeneratorConfig,
    /// Text placement on the final image.
    pub layout: LayoutConfig,
    /// Branding string and text/overlay colours.
    pub brand: BrandConfig,
    /// Content series catalog, keyed by series slug.
    pub series: BTreeMap<String, SeriesConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            generation: GenerationConfig::default(),
            generator: GeneratorConfig::default(),
            layout: LayoutConfig::default(),
            brand: BrandConfig::default(),
            series: default_series(),
        }
    }
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let out = (self.output.width, self.output.height);
        let generation = (self.generation.width, self.generation.height);

        if out.0 == 0 || out.1 == 0 {
            return Err(ConfigError::Validation(
                "output.width and output.height must be non-zero".into(),
            ));
        }
        if generation.0 < out.0 || generation.1 < out.1 {
            return Err(ConfigError::Validation(
                "generation size must be at least the output size".into(),
            ));
        }
        if !aspect_ratios_match(generation, out, ASPECT_TOLERANCE) {
            return Err(ConfigError::Validation(format!(
                "generation size {}x{} must match the output aspect ratio {}x{}",
                generation.0, generation.1, out.0, out.1
            )));
        }
        if self.output.quality == 0 || self.output.quality > 100 {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        for (name, value) in [
            ("layout.margin_fraction", self.layout.margin_fraction),
            ("layout.text_width_fraction", self.layout.text_width_fraction),
            ("layout.title_size_fraction", self.layout.title_size_fraction),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be in (0, 1]"
                )));
            }
        }
        if self.layout.max_title_lines == 0 {
            return Err(ConfigError::Validation(
                "layout.max_title_lines must be at least 1".into(),
            ));
        }
        if self.generator.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "generator.timeout_secs must be non-zero".into(),
            ));
        }
        for (key, value) in [
            ("brand.text_color", &self.brand.text_color),
            ("brand.shadow_color", &self.brand.shadow_color),
            ("brand.light_tint", &self.brand.light_tint),
            ("brand.dark_tint", &self.brand.dark_tint),
        ] {
            parse_color(key, value)?;
        }
        if self.series.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [series.<slug>] table is required".into(),
            ));
        }
        for (slug, series) in &self.series {
            series.palette(slug)?;
        }
        Ok(())
    }

    /// Resolve a series slug against the catalog.
    pub fn series(&self, slug: &str) -> Option<Series> {
        let config = self.series.get(slug)?;
        let palette = config.palette(slug).ok()?;
        Some(Series {
            slug: slug.to_string(),
            label: config.label.clone(),
            palette,
        })
    }

    /// Parsed brand colours. Only valid after [`validate`](Self::validate).
    pub fn brand_palette(&self) -> Result<BrandPalette, ConfigError> {
        Ok(BrandPalette {
            text: parse_color("brand.text_color", &self.brand.text_color)?,
            shadow: parse_color("brand.shadow_color", &self.brand.shadow_color)?,
            light_tint: parse_color("brand.light_tint", &self.brand.light_tint)?,
            dark_tint: parse_color("brand.dark_tint", &self.brand.dark_tint)?,
        })
    }

    pub fn output_size(&self) -> (u32, u32) {
        (self.output.width, self.output.height)
    }

    pub fn generation_size(&self) -> (u32, u32) {
        (self.generation.width, self.generation.height)
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.output.quality)
    }
}

fn parse_color(key: &str, value: &str) -> Result<Rgb8, ConfigError> {
    Rgb8::parse_hex(value).map_err(|e| ConfigError::Validation(format!("{key}: {e}")))
}

/// Final share image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 630,
            quality: 88,
        }
    }
}

/// Illustration resolution. Larger than the output so the final downscale is sharp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            width: 2400,
            height: 1260,
        }
    }
}

/// Which image generation service to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini image generation (`generateContent`).
    Gemini,
    /// No service: every cache miss uses the procedural background.
    None,
}

/// External image generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub provider: Provider,
    pub model: String,
    pub api_base: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout for a single generation call.
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            model: "gemini-2.5-flash-image".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 90,
        }
    }
}

/// Text placement on the final image, as fractions of the canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Outer margin as a fraction of the canvas width.
    pub margin_fraction: f32,
    /// Width budget for title lines as a fraction of the canvas width.
    pub text_width_fraction: f32,
    /// Preferred title glyph height as a fraction of the canvas height.
    pub title_size_fraction: f32,
    /// The title shrinks until it fits in this many lines.
    pub max_title_lines: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin_fraction: 0.06,
            text_width_fraction: 0.55,
            title_size_fraction: 0.1,
            max_title_lines: 4,
        }
    }
}

/// Branding string and the colours shared by every series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrandConfig {
    /// Fixed branding string drawn next to the series badge.
    pub text: String,
    pub text_color: String,
    /// Colour of the offset pass drawn beneath the title.
    pub shadow_color: String,
    /// Overlay tint behind the text.
    pub light_tint: String,
    /// Overlay tint at the illustration corner.
    pub dark_tint: String,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            text: "Code with PHP".to_string(),
            text_color: "#0f172a".to_string(),
            shadow_color: "#ffffff".to_string(),
            light_tint: "#f8fafc".to_string(),
            dark_tint: "#0b1020".to_string(),
        }
    }
}

/// One content series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeriesConfig {
    /// Badge label.
    pub label: String,
    /// Fallback gradient start colour.
    pub primary: String,
    /// Fallback gradient end colour.
    pub secondary: String,
    /// Accent used in prompts, the overlay, and the badge.
    pub accent: String,
}

impl SeriesConfig {
    fn palette(&self, slug: &str) -> Result<SeriesPalette, ConfigError> {
        Ok(SeriesPalette {
            primary: parse_color(&format!("series.{slug}.primary"), &self.primary)?,
            secondary: parse_color(&format!("series.{slug}.secondary"), &self.secondary)?,
            accent: parse_color(&format!("series.{slug}.accent"), &self.accent)?,
        })
    }
}

fn default_series() -> BTreeMap<String, SeriesConfig> {
    let mut series = BTreeMap::new();
    series.insert(
        "php-basics".to_string(),
        SeriesConfig {
            label: "PHP Basics".to_string(),
            primary: "#4f46e5".to_string(),
            secondary: "#0ea5e9".to_string(),
            accent: "#6366f1".to_string(),
        },
    );
    series.insert(
        "ai-ml-php-developers".to_string(),
        SeriesConfig {
            label: "AI/ML for PHP".to_string(),
            primary: "#059669".to_string(),
            secondary: "#0d9488".to_string(),
            accent: "#10b981".to_string(),
        },
    );
    series
}

/// A resolved series: slug, label, and parsed colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub slug: String,
    pub label: String,
    pub palette: SeriesPalette,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesPalette {
    pub primary: Rgb8,
    pub secondary: Rgb8,
    pub accent: Rgb8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrandPalette {
    pub text: Rgb8,
    pub shadow: Rgb8,
    pub light_tint: Rgb8,
    pub dark_tint: Rgb8,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Top-level key of the series catalog.
const SERIES_KEY: &str = "series";

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(PipelineConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
///
/// The series catalog is the exception to key-by-key merging: an overlay with
/// any `[series.*]` table replaces the stock catalog, so the stock series can
/// be dropped.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PipelineConfig, ConfigError> {
    let mut base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => {
            if ov.get(SERIES_KEY).is_some() {
                if let Some(base_table) = base.as_table_mut() {
                    base_table.remove(SERIES_KEY);
                }
            }
            merge_toml(base, ov)
        }
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// A missing file yields the validated stock defaults; a present file is
/// merged on top of them.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `sharecard.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sharecard configuration
# =======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Final share image
# ---------------------------------------------------------------------------
[output]
width = 1200
height = 630

# JPEG encoding quality (1 = worst, 100 = best).
quality = 88

# ---------------------------------------------------------------------------
# Illustration resolution
# ---------------------------------------------------------------------------
# Must be at least the output size and share its aspect ratio.
[generation]
width = 2400
height = 1260

# ---------------------------------------------------------------------------
# Image generation service
# ---------------------------------------------------------------------------
[generator]
# "gemini" calls the Gemini API; "none" uses procedural backgrounds only.
provider = "gemini"
model = "gemini-2.5-flash-image"
api_base = "https://generativelanguage.googleapis.com/v1beta"

# Environment variable holding the API key. With provider = "gemini" a
# missing key is an error; pass --offline to run without it.
api_key_env = "GEMINI_API_KEY"

# Seconds before a generation request is abandoned (the item then falls
# back to the procedural background).
timeout_secs = 90

# ---------------------------------------------------------------------------
# Layout
# ---------------------------------------------------------------------------
[layout]
# Outer margin as a fraction of the canvas width.
margin_fraction = 0.06

# Title lines wrap within this fraction of the canvas width.
text_width_fraction = 0.55

# Preferred title glyph height as a fraction of the canvas height.
title_size_fraction = 0.1

# The title shrinks until it fits in this many lines.
max_title_lines = 4

# ---------------------------------------------------------------------------
# Branding
# ---------------------------------------------------------------------------
[brand]
text = "Code with PHP"
text_color = "#0f172a"
shadow_color = "#ffffff"    # Offset pass beneath the title
light_tint = "#f8fafc"      # Overlay behind the text
dark_tint = "#0b1020"       # Overlay at the illustration corner

# ---------------------------------------------------------------------------
# Series
# ---------------------------------------------------------------------------
# One table per series slug. Items naming a series not listed here fail.
# Listing any series replaces this whole catalog, so keep every series you use.
[series.php-basics]
label = "PHP Basics"
primary = "#4f46e5"         # Fallback gradient start
secondary = "#0ea5e9"       # Fallback gradient end
accent = "#6366f1"          # Prompt guidance, overlay, badge

[series.ai-ml-php-developers]
label = "AI/ML for PHP"
primary = "#059669"
secondary = "#0d9488"
accent = "#10b981"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn default_config_sizes() {
        let config = PipelineConfig::default();
        assert_eq!(config.output_size(), (1200, 630));
        assert_eq!(config.generation_size(), (2400, 1260));
        assert_eq!(config.quality().value(), 88);
    }

    #[test]
    fn default_config_has_series() {
        let config = PipelineConfig::default();
        let series = config.series("php-basics").unwrap();
        assert_eq!(series.label, "PHP Basics");
        assert_eq!(series.palette.primary, Rgb8::new(0x4f, 0x46, 0xe5));
        assert!(config.series("nope").is_none());
    }

    #[test]
    fn stock_config_toml_matches_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let parsed: PipelineConfig = value.try_into().unwrap();
        let defaults = PipelineConfig::default();
        assert_eq!(parsed.output.width, defaults.output.width);
        assert_eq!(parsed.generator.model, defaults.generator.model);
        assert_eq!(parsed.brand.text, defaults.brand.text);
        assert_eq!(
            parsed.series.keys().collect::<Vec<_>>(),
            defaults.series.keys().collect::<Vec<_>>()
        );
    }

    // =========================================================================
    // Parsing and merging
    // =========================================================================

    #[test]
    fn parse_partial_config() {
        let overlay: toml::Value = toml::from_str(
            r##"
[output]
quality = 75
"##,
        )
        .unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        assert_eq!(config.output.quality, 75);
        // Defaults preserved
        assert_eq!(config.output.width, 1200);
        assert_eq!(config.brand.text, "Code with PHP");
    }

    #[test]
    fn user_series_replace_stock_catalog() {
        let overlay: toml::Value = toml::from_str(
            r##"
[series.A]
label = "Series A"
primary = "#111111"
secondary = "#222222"
accent = "#333333"
"##,
        )
        .unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        assert!(config.series("A").is_some());
        assert!(config.series("php-basics").is_none());
        assert!(config.series("ai-ml-php-developers").is_none());
        assert_eq!(config.series.len(), 1);
    }

    #[test]
    fn overlay_without_series_keeps_stock_catalog() {
        let overlay: toml::Value = toml::from_str("[brand]\ntext = \"Acme\"\n").unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        assert_eq!(config.brand.text, "Acme");
        assert!(config.series("php-basics").is_some());
        assert!(config.series("ai-ml-php-developers").is_some());
    }

    #[test]
    fn partial_stock_series_override_must_be_complete() {
        // Replacement, not merge: a lone accent has no label to fall back on
        let overlay: toml::Value =
            toml::from_str("[series.php-basics]\naccent = \"#000000\"\n").unwrap();
        assert!(resolve_config(Some(overlay)).is_err());
    }

    #[test]
    fn unknown_key_rejected() {
        let overlay: toml::Value = toml::from_str("[output]\ncolour = 3\n").unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn provider_none_parses() {
        let overlay: toml::Value = toml::from_str("[generator]\nprovider = \"none\"\n").unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        assert_eq!(config.generator.provider, Provider::None);
    }

    #[test]
    fn merge_toml_overlay_wins_and_keeps_base() {
        let base: toml::Value = toml::from_str("a = 1\n[t]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[t]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["t"]["x"].as_integer(), Some(1));
        assert_eq!(merged["t"]["y"].as_integer(), Some(3));
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validation_rejects_generation_smaller_than_output() {
        let mut config = PipelineConfig::default();
        config.generation.width = 600;
        config.generation.height = 315;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_aspect_mismatch() {
        let mut config = PipelineConfig::default();
        config.generation.width = 2048;
        config.generation.height = 2048;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_bad_quality() {
        let mut config = PipelineConfig::default();
        config.output.quality = 0;
        assert!(config.validate().is_err());
        config.output.quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_bad_fraction() {
        let mut config = PipelineConfig::default();
        config.layout.text_width_fraction = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_bad_series_colour() {
        let mut config = PipelineConfig::default();
        config.series.get_mut("php-basics").unwrap().accent = "blue".into();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("series.php-basics.accent"), "{err}");
    }

    #[test]
    fn validation_rejects_empty_series_catalog() {
        let mut config = PipelineConfig::default();
        config.series.clear();
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // load_config
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config.output.width, 1200);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r##"
[brand]
text = "Example Academy"

[layout]
max_title_lines = 3
"##,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.brand.text, "Example Academy");
        assert_eq!(config.layout.max_title_lines, 3);
        assert_eq!(config.brand.text_color, "#0f172a");
    }

    #[test]
    fn load_config_invalid_toml_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "[output\nwidth = ").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }
}

//! Configuration
//!
//! [`LayoutConfig`] holds every layout constant the sizer and composers use.
//! It is passed into them explicitly so tests can run with overrides.
//! [`Config`] wraps it together with process-level settings and can be loaded
//! from a TOML file, then merged with command-line overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{BuildError, Result};

// ============================================================
// Constants
// ============================================================

/// Rendering resolution used by KDP for covers and interiors
pub const DEFAULT_DPI: u32 = 300;

/// Bleed inset on each outside edge (inches)
pub const DEFAULT_BLEED_IN: f64 = 0.125;

/// Safe margin inside the trim for text blocks (inches)
pub const DEFAULT_SAFE_MARGIN_IN: f64 = 0.25;

/// Minimum page count for spine text
pub const DEFAULT_SPINE_TEXT_MIN_PAGES: u32 = 79;

/// Default output root; each book lives in `{root}/{safe_title}/`
pub const DEFAULT_OUTPUT_ROOT: &str = "/mnt/ai_data/ColoringBooks";

/// Local config file name
pub const LOCAL_CONFIG_FILE: &str = "kdp-coloring.toml";

/// Application directory under the user config dir
pub const APP_CONFIG_DIR: &str = "kdp-coloring";

// ============================================================
// Layout
// ============================================================

/// Named two-stop vertical gradient palettes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientPreset {
    /// Preset name used in `gradient:<name>:<variant>`
    pub name: String,
    /// `(top, bottom)` colors as `#RRGGBB`
    pub variants: Vec<(String, String)>,
}

impl GradientPreset {
    fn pastel() -> Self {
        let variants = [
            ("#FDF2F8", "#DBEAFE"),
            ("#FDE68A", "#A7F3D0"),
            ("#E9D5FF", "#BFDBFE"),
            ("#FFE4E6", "#FEF9C3"),
            ("#E0F2FE", "#DCFCE7"),
        ];
        Self {
            name: "pastel".to_string(),
            variants: variants
                .iter()
                .map(|(t, b)| (t.to_string(), b.to_string()))
                .collect(),
        }
    }
}

/// Layout constants for sizing and composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub dpi: u32,
    pub bleed_in: f64,
    pub safe_margin_in: f64,

    /// Spine floor for very low page counts (0 disables the clamp)
    pub min_spine_in: f64,
    pub spine_text_min_pages: u32,

    pub barcode_width_in: f64,
    pub barcode_height_in: f64,
    /// Distance from the bottom trim edge
    pub barcode_bottom_offset_in: f64,
    /// Distance from the back panel's spine-side edge
    pub barcode_inner_offset_in: f64,

    /// Title font candidates, tried in order
    pub title_fonts: Vec<PathBuf>,
    /// Body text font candidates; falls back to the title font
    pub text_fonts: Vec<PathBuf>,

    pub title_max_px: u32,
    pub title_min_px: u32,
    pub title_step_px: u32,
    pub title_max_lines: usize,
    /// Share of the front panel width the title may occupy
    pub title_width_ratio: f64,
    pub title_top_in: f64,

    pub body_font_px: u32,
    pub description_top_in: f64,
    pub description_width_ratio: f64,
    pub card_padding_in: f64,

    /// Front panel band reserved for the title (share of trim height)
    pub title_band_ratio: f64,
    /// Back panel band reserved for the description (share of trim height)
    pub description_band_ratio: f64,
    pub max_tilt_deg: f32,
    /// Sheet height as a share of its grid cell
    pub sheet_cell_fill: f64,
    /// Centre jitter as a share of the grid cell
    pub sheet_jitter: f64,
    /// Number of leading interior pages sample sheets are drawn from
    pub sheet_pool: usize,

    pub gradients: Vec<GradientPreset>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            bleed_in: DEFAULT_BLEED_IN,
            safe_margin_in: DEFAULT_SAFE_MARGIN_IN,
            min_spine_in: 0.0,
            spine_text_min_pages: DEFAULT_SPINE_TEXT_MIN_PAGES,
            barcode_width_in: 2.0,
            barcode_height_in: 1.2,
            barcode_bottom_offset_in: 0.25,
            barcode_inner_offset_in: 0.25,
            title_fonts: vec![
                PathBuf::from("fonts/Baloo2-SemiBold.ttf"),
                PathBuf::from("fonts/Fredoka-SemiBold.ttf"),
                PathBuf::from("fonts/ComicNeue-Bold.ttf"),
                PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
            ],
            text_fonts: vec![
                PathBuf::from("fonts/Inter-Regular.ttf"),
                PathBuf::from("fonts/Quicksand-Regular.ttf"),
                PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
            ],
            title_max_px: 150,
            title_min_px: 24,
            title_step_px: 4,
            title_max_lines: 2,
            title_width_ratio: 0.8,
            title_top_in: 0.35,
            body_font_px: 40,
            description_top_in: 0.75,
            description_width_ratio: 0.8,
            card_padding_in: 0.2,
            title_band_ratio: 0.3,
            description_band_ratio: 0.35,
            max_tilt_deg: 15.0,
            sheet_cell_fill: 0.8,
            sheet_jitter: 0.1,
            sheet_pool: 6,
            gradients: vec![GradientPreset::pastel()],
        }
    }
}

impl LayoutConfig {
    /// Convert inches to pixels at this layout's DPI
    pub fn px(&self, inches: f64) -> u32 {
        crate::sizing::inches_to_px(inches, self.dpi)
    }

    /// Scale a pixel size authored for 300 DPI to this layout's DPI
    pub fn scaled_px(&self, px_at_300: u32) -> u32 {
        ((px_at_300 as f64) * self.dpi as f64 / DEFAULT_DPI as f64).round() as u32
    }

    /// Look up a gradient preset by name (case-insensitive)
    pub fn gradient(&self, name: &str) -> Option<&GradientPreset> {
        self.gradients
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
    }

    /// Check values that would make the geometry meaningless
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(BuildError::config("dpi must be greater than zero"));
        }
        if self.bleed_in < 0.0 || self.safe_margin_in < 0.0 || self.min_spine_in < 0.0 {
            return Err(BuildError::config(
                "bleed, safe margin and spine minimum must not be negative",
            ));
        }
        if self.title_min_px == 0 || self.title_min_px > self.title_max_px {
            return Err(BuildError::config("title font size range is empty"));
        }
        if self.title_step_px == 0 {
            return Err(BuildError::config("title_step_px must be greater than zero"));
        }
        if self.title_band_ratio + 0.1 >= 1.0 || self.description_band_ratio + 0.1 >= 1.0 {
            return Err(BuildError::config(
                "text bands leave no room for sample sheets",
            ));
        }
        Ok(())
    }
}

// ============================================================
// Config file
// ============================================================

/// Settings loaded from a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one folder per book
    pub output_root: PathBuf,
    /// Use ImageMagick for the cover PDF when it is installed
    pub use_magick: bool,
    pub layout: LayoutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            use_magick: true,
            layout: LayoutConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| BuildError::config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load from the first existing search path, or defaults when none exists
    ///
    /// A discovered file that fails to parse is reported and skipped.
    pub fn load() -> Result<Self> {
        for path in Self::search_paths() {
            if path.is_file() {
                debug!(path = %path.display(), "loading config file");
                match Self::load_from_path(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                        return Ok(Self::default());
                    }
                }
            }
        }
        Ok(Self::default())
    }

    /// Config file locations in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_CONFIG_DIR).join("config.toml"));
        }
        paths
    }

    /// Apply command-line overrides; CLI values win
    #[must_use]
    pub fn merge_with_cli(&self, overrides: &CliOverrides) -> Config {
        let mut merged = self.clone();
        if let Some(root) = &overrides.output_root {
            merged.output_root = root.clone();
        }
        if let Some(use_magick) = overrides.use_magick {
            merged.use_magick = use_magick;
        }
        if let Some(dpi) = overrides.dpi {
            merged.layout.dpi = dpi;
        }
        if let Some(bleed) = overrides.bleed_in {
            merged.layout.bleed_in = bleed;
        }
        merged
    }

    /// Directory for a given book
    pub fn book_dir(&self, safe_title: &str) -> PathBuf {
        self.output_root.join(safe_title)
    }
}

/// Reject book folder names that would escape the output root
pub fn validate_safe_title(safe_title: &str) -> Result<()> {
    let trimmed = safe_title.trim();
    if trimmed.is_empty() {
        return Err(BuildError::config("safe title must not be empty"));
    }
    if trimmed == "." || trimmed == ".." || trimmed.contains(['/', '\\']) {
        return Err(BuildError::config(format!(
            "safe title must be a single folder name, got '{safe_title}'"
        )));
    }
    Ok(())
}

/// Values supplied on the command line that override the config file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub output_root: Option<PathBuf>,
    pub use_magick: Option<bool>,
    pub dpi: Option<u32>,
    pub bleed_in: Option<f64>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}

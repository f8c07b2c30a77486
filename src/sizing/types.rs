//! Sizing core types
//!
//! Physical inputs (trim size, paper) and pixel rectangles.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::{BuildError, Result};

// ============================================================
// Constants
// ============================================================

/// Thickness per page, white paper (inches)
pub const THICKNESS_WHITE: f64 = 0.002252;

/// Thickness per page, cream paper (inches)
pub const THICKNESS_CREAM: f64 = 0.0025;

/// Thickness per page, premium color (inches)
pub const THICKNESS_COLOR_PREMIUM: f64 = 0.002347;

/// Thickness per page, standard color (inches)
pub const THICKNESS_COLOR_STANDARD: f64 = 0.002252;

/// Trim sizes outside this range are accepted but reported
const TYPICAL_TRIM_MIN_IN: f64 = 4.0;
const TYPICAL_TRIM_MAX_IN: f64 = 14.0;

/// Largest trim side accepted at all (inches)
pub const MAX_TRIM_IN: f64 = 48.0;

// ============================================================
// Trim size
// ============================================================

/// Finished book page size in inches
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrimSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl TrimSize {
    /// Create a trim size; both sides must be positive
    pub fn new(width_in: f64, height_in: f64) -> Result<Self> {
        if !(width_in > 0.0 && height_in > 0.0) || !width_in.is_finite() || !height_in.is_finite()
        {
            return Err(BuildError::config(format!(
                "trim size must be positive, got {width_in}x{height_in}"
            )));
        }
        if width_in > MAX_TRIM_IN || height_in > MAX_TRIM_IN {
            return Err(BuildError::config(format!(
                "trim size {width_in}x{height_in} exceeds the {MAX_TRIM_IN} in limit"
            )));
        }
        let typical = TYPICAL_TRIM_MIN_IN..=TYPICAL_TRIM_MAX_IN;
        if !typical.contains(&width_in) || !typical.contains(&height_in) {
            warn!(width_in, height_in, "unusual trim size");
        }
        Ok(Self { width_in, height_in })
    }

    /// US Letter, the most common coloring book trim
    pub fn letter() -> Self {
        Self {
            width_in: 8.5,
            height_in: 11.0,
        }
    }

    /// Width over height
    pub fn aspect(&self) -> f64 {
        self.width_in / self.height_in
    }
}

impl Default for TrimSize {
    fn default() -> Self {
        Self::letter()
    }
}

impl FromStr for TrimSize {
    type Err = BuildError;

    /// Parse `WxH` in inches, e.g. `8.5x11`
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let invalid = || BuildError::config(format!("--trim must look like '8.5x11', got '{s}'"));

        let (w, h) = lower.split_once('x').ok_or_else(invalid)?;
        let parse = |part: &str| -> Result<f64> {
            let part = part.trim();
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit() || c == '.') {
                return Err(invalid());
            }
            part.parse::<f64>().map_err(|_| invalid())
        };
        TrimSize::new(parse(w)?, parse(h)?)
    }
}

impl fmt::Display for TrimSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width_in, self.height_in)
    }
}

// ============================================================
// Paper
// ============================================================

/// Interior paper stock; decides the spine thickness per page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperProfile {
    /// Black & white on white paper
    #[default]
    White,
    /// Black & white on cream paper
    Cream,
    /// Premium color
    Color,
    /// Standard color
    ColorStandard,
}

impl PaperProfile {
    /// All profiles
    pub fn all() -> [PaperProfile; 4] {
        [
            PaperProfile::White,
            PaperProfile::Cream,
            PaperProfile::Color,
            PaperProfile::ColorStandard,
        ]
    }

    /// Thickness per page in inches
    pub fn thickness_per_page(&self) -> f64 {
        match self {
            PaperProfile::White => THICKNESS_WHITE,
            PaperProfile::Cream => THICKNESS_CREAM,
            PaperProfile::Color => THICKNESS_COLOR_PREMIUM,
            PaperProfile::ColorStandard => THICKNESS_COLOR_STANDARD,
        }
    }

    /// Name accepted on the command line
    pub fn name(&self) -> &'static str {
        match self {
            PaperProfile::White => "white",
            PaperProfile::Cream => "cream",
            PaperProfile::Color => "color",
            PaperProfile::ColorStandard => "color_standard",
        }
    }
}

impl FromStr for PaperProfile {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Ok(PaperProfile::White),
            "cream" => Ok(PaperProfile::Cream),
            "color" | "color_premium" => Ok(PaperProfile::Color),
            "color_standard" => Ok(PaperProfile::ColorStandard),
            other => Err(BuildError::config(format!(
                "unknown paper '{other}' (expected white, cream, color, color_standard)"
            ))),
        }
    }
}

impl fmt::Display for PaperProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================
// Pixel geometry
// ============================================================

/// Axis-aligned rectangle in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Centre point (may be fractional)
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Shrink by `inset` on every side; collapses to zero size rather than underflowing
    #[must_use]
    pub fn inset(&self, inset: u32) -> Self {
        let width = self.width.saturating_sub(inset * 2);
        let height = self.height.saturating_sub(inset * 2);
        Self {
            x: self.x + inset.min(self.width / 2),
            y: self.y + inset.min(self.height / 2),
            width,
            height,
        }
    }

    /// True when `other` lies completely inside `self`
    pub fn contains(&self, other: &PixelRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// True when the two rectangles share at least one pixel
    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trim() {
        let trim: TrimSize = "8.5x11".parse().unwrap();
        assert_eq!(trim, TrimSize::letter());

        let spaced: TrimSize = " 6 X 9 ".parse().unwrap();
        assert_eq!(spaced.width_in, 6.0);
        assert_eq!(spaced.height_in, 9.0);
    }

    #[test]
    fn test_parse_trim_invalid() {
        for bad in ["", "8.5", "8.5x", "x11", "8.5by11", "-8x11", "8.5x11x2", "0x11"] {
            let result = bad.parse::<TrimSize>();
            assert!(
                matches!(result, Err(BuildError::Config(_))),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_trim_new_rejects_non_positive() {
        assert!(TrimSize::new(0.0, 11.0).is_err());
        assert!(TrimSize::new(8.5, -1.0).is_err());
        assert!(TrimSize::new(f64::NAN, 11.0).is_err());
    }

    #[test]
    fn test_trim_rejects_oversized() {
        assert!(matches!(TrimSize::new(100.0, 100.0), Err(BuildError::Config(_))));
        assert!(matches!("8.5x49".parse::<TrimSize>(), Err(BuildError::Config(_))));
        assert!(TrimSize::new(MAX_TRIM_IN, 11.0).is_ok());
    }

    #[test]
    fn test_trim_display_and_aspect() {
        let trim = TrimSize::new(8.5, 8.5).unwrap();
        assert_eq!(trim.to_string(), "8.5x8.5");
        assert_eq!(trim.aspect(), 1.0);
    }

    #[test]
    fn test_paper_parse() {
        assert_eq!("white".parse::<PaperProfile>().unwrap(), PaperProfile::White);
        assert_eq!("Cream".parse::<PaperProfile>().unwrap(), PaperProfile::Cream);
        assert_eq!("color".parse::<PaperProfile>().unwrap(), PaperProfile::Color);
        assert_eq!(
            "color_premium".parse::<PaperProfile>().unwrap(),
            PaperProfile::Color
        );
        assert_eq!(
            "color_standard".parse::<PaperProfile>().unwrap(),
            PaperProfile::ColorStandard
        );
    }

    #[test]
    fn test_paper_parse_unknown() {
        let result = "glossy".parse::<PaperProfile>();
        assert!(matches!(result, Err(BuildError::Config(_))));
    }

    #[test]
    fn test_paper_thickness() {
        assert_eq!(PaperProfile::White.thickness_per_page(), 0.002252);
        assert_eq!(PaperProfile::Cream.thickness_per_page(), 0.0025);
        assert_eq!(PaperProfile::Color.thickness_per_page(), 0.002347);
        for paper in PaperProfile::all() {
            assert!(paper.thickness_per_page() > 0.0);
            assert_eq!(paper.name().parse::<PaperProfile>().unwrap(), paper);
        }
    }

    #[test]
    fn test_pixel_rect_inset() {
        let rect = PixelRect::new(10, 20, 100, 50);
        let inner = rect.inset(5);
        assert_eq!(inner, PixelRect::new(15, 25, 90, 40));
        assert!(rect.contains(&inner));
        assert!(!inner.contains(&rect));

        let collapsed = rect.inset(40);
        assert_eq!(collapsed.height, 0);
    }

    #[test]
    fn test_pixel_rect_edges() {
        let rect = PixelRect::new(10, 20, 100, 50);
        assert_eq!(rect.right(), 110);
        assert_eq!(rect.bottom(), 70);
        assert_eq!(rect.center(), (60.0, 45.0));
    }

    #[test]
    fn test_pixel_rect_intersects() {
        let rect = PixelRect::new(10, 20, 100, 50);
        assert!(rect.intersects(&PixelRect::new(100, 60, 20, 20)));
        // Touching edges share no pixel
        assert!(!rect.intersects(&PixelRect::new(110, 20, 10, 10)));
        assert!(!rect.intersects(&PixelRect::new(10, 70, 10, 10)));
    }
}

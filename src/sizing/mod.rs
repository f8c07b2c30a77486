//! Spine & Canvas Sizer
//!
//! Maps page count and paper stock to a physical spine width, then derives
//! the full wraparound cover canvas in pixels.
//!
//! # Layout
//!
//! ```text
//! | bleed | back panel (trim w) | spine | front panel (trim w) | bleed |
//! ```
//!
//! Height is trim height plus bleed top and bottom, independent of the spine.
//!
//! # Example
//!
//! ```rust
//! use kdp_coloring::{compute_canvas, compute_spine, LayoutConfig, PaperProfile, TrimSize};
//!
//! let layout = LayoutConfig::default();
//! let spine = compute_spine(120, PaperProfile::White, &layout).unwrap();
//! let canvas = compute_canvas(TrimSize::letter(), spine.width_in, 0.125, 300).unwrap();
//! assert!(spine.text_eligible(layout.spine_text_min_pages));
//! assert_eq!(canvas.height_px, 3375);
//! ```

mod types;

pub use types::{
    PaperProfile, PixelRect, TrimSize, THICKNESS_COLOR_PREMIUM, THICKNESS_COLOR_STANDARD,
    THICKNESS_CREAM, THICKNESS_WHITE,
};

use serde::Serialize;
use tracing::debug;

use crate::config::{LayoutConfig, DEFAULT_SPINE_TEXT_MIN_PAGES};
use crate::error::{BuildError, Result};

/// Convert inches to whole pixels (round half away from zero)
pub fn inches_to_px(inches: f64, dpi: u32) -> u32 {
    (inches * dpi as f64).round().max(0.0) as u32
}

/// True iff the vendor allows text on a spine of this many pages
///
/// Always uses the vendor's default threshold. Builds read
/// `LayoutConfig::spine_text_min_pages` through [`SpineSpec::text_eligible`],
/// which may be configured higher or lower.
pub fn spine_text_eligible(page_count: u32) -> bool {
    page_count >= DEFAULT_SPINE_TEXT_MIN_PAGES
}

// ============================================================
// Spine
// ============================================================

/// Derived spine dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpineSpec {
    pub page_count: u32,
    pub paper: PaperProfile,
    /// Spine width in inches after the minimum clamp
    pub width_in: f64,
    /// True when the computed width was raised to the configured minimum
    pub clamped: bool,
}

impl SpineSpec {
    /// Spine text predicate against a configurable threshold
    pub fn text_eligible(&self, min_pages: u32) -> bool {
        self.page_count >= min_pages
    }
}

/// Spine width for a page count on a given paper
pub fn compute_spine(page_count: u32, paper: PaperProfile, layout: &LayoutConfig) -> Result<SpineSpec> {
    if page_count < 1 {
        return Err(BuildError::config("page count must be at least 1"));
    }

    let raw = page_count as f64 * paper.thickness_per_page();
    let clamped = raw < layout.min_spine_in;
    let width_in = raw.max(layout.min_spine_in);

    debug!(page_count, %paper, width_in, clamped, "computed spine");

    Ok(SpineSpec {
        page_count,
        paper,
        width_in,
        clamped,
    })
}

// ============================================================
// Canvas
// ============================================================

/// Pixel canvas of the full wraparound cover
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CanvasSpec {
    pub dpi: u32,
    pub bleed_in: f64,
    pub trim: TrimSize,
    pub spine_in: f64,
    pub width_px: u32,
    pub height_px: u32,
}

/// Cover canvas for a trim size, spine width and bleed at a DPI
pub fn compute_canvas(trim: TrimSize, spine_in: f64, bleed_in: f64, dpi: u32) -> Result<CanvasSpec> {
    if dpi == 0 {
        return Err(BuildError::config("dpi must be greater than zero"));
    }
    if !(trim.width_in > 0.0 && trim.height_in > 0.0) {
        return Err(BuildError::config("trim size must be positive"));
    }
    if bleed_in < 0.0 || spine_in < 0.0 {
        return Err(BuildError::config("bleed and spine must not be negative"));
    }

    let canvas = CanvasSpec {
        dpi,
        bleed_in,
        trim,
        spine_in,
        width_px: inches_to_px(bleed_in * 2.0 + trim.width_in * 2.0 + spine_in, dpi),
        height_px: inches_to_px(bleed_in * 2.0 + trim.height_in, dpi),
    };
    debug!(
        width_px = canvas.width_px,
        height_px = canvas.height_px,
        dpi,
        "computed cover canvas"
    );
    Ok(canvas)
}

impl CanvasSpec {
    /// Physical width in inches
    pub fn width_in(&self) -> f64 {
        self.bleed_in * 2.0 + self.trim.width_in * 2.0 + self.spine_in
    }

    /// Physical height in inches
    pub fn height_in(&self) -> f64 {
        self.bleed_in * 2.0 + self.trim.height_in
    }

    pub fn bleed_px(&self) -> u32 {
        inches_to_px(self.bleed_in, self.dpi)
    }

    pub fn trim_width_px(&self) -> u32 {
        inches_to_px(self.trim.width_in, self.dpi)
    }

    pub fn trim_height_px(&self) -> u32 {
        inches_to_px(self.trim.height_in, self.dpi)
    }

    pub fn spine_px(&self) -> u32 {
        inches_to_px(self.spine_in, self.dpi)
    }

    /// Back cover panel inside the trim
    pub fn back_panel(&self) -> PixelRect {
        PixelRect::new(
            self.bleed_px(),
            self.bleed_px(),
            self.trim_width_px(),
            self.trim_height_px(),
        )
    }

    /// Spine strip between the two panels
    pub fn spine_panel(&self) -> PixelRect {
        let back = self.back_panel();
        PixelRect::new(back.right(), back.y, self.spine_px(), back.height)
    }

    /// Front cover panel inside the trim
    pub fn front_panel(&self) -> PixelRect {
        let spine = self.spine_panel();
        PixelRect::new(spine.right(), spine.y, self.trim_width_px(), spine.height)
    }
}

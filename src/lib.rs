//! kdp-coloring - Print-ready KDP coloring book covers and interiors
//!
//! Builds a wraparound cover (PNG preview + PDF) and an interior PDF from a
//! folder of `fbnp_<N>.png` line-art pages.
//!
//! # Modules
//!
//! - [`sizing`]: spine width, canvas and panel geometry
//! - [`cover`]: cover composition and output
//! - [`interior`]: interior pages and PDF
//! - [`sheets`]: tilted sample sheets shown on the cover
//! - [`export`]: native PDF export, ImageMagick conversion, PDF inspection
//! - [`config`]: layout constants, config file, CLI overrides
//!
//! # Example
//!
//! ```rust
//! use kdp_coloring::{compute_canvas, compute_spine, LayoutConfig, PaperProfile, TrimSize};
//!
//! let layout = LayoutConfig::default();
//! let spine = compute_spine(100, PaperProfile::White, &layout).unwrap();
//! let canvas = compute_canvas(TrimSize::letter(), spine.width_in, 0.125, 300).unwrap();
//! assert_eq!(canvas.height_px, 3375);
//! ```

pub mod background;
pub mod cli;
pub mod config;
pub mod cover;
pub mod error;
pub mod export;
pub mod fonts;
pub mod interior;
pub mod pages;
pub mod progress;
pub mod random;
pub mod sheets;
pub mod sizing;
pub mod text;

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    /// Bad arguments, missing pages, undecodable images
    pub const INVALID_CONFIG: i32 = 2;
    /// No usable font
    pub const RESOURCE_MISSING: i32 = 3;
    pub const IO_ERROR: i32 = 4;
}

// Re-exports
pub use background::{Background, BackgroundSpec, Color};
pub use cli::{Cli, Commands, CoverArgs, InteriorArgs, SpineArgs};
pub use config::{validate_safe_title, CliOverrides, Config, GradientPreset, LayoutConfig};
pub use cover::{
    build_cover, build_cover_with_progress, generate_cover, plan_cover, write_cover,
    CoverFiles, CoverOptions, CoverOptionsBuilder, CoverOutput, CoverPlan, COVER_PDF, COVER_PNG,
};
pub use error::{BuildError, Result};
pub use export::{
    convert_or_fallback, inspect_pdf, raster_pages_to_pdf, MagickConverter, PdfRasterWriter,
    PdfRoute, PdfSummary,
};
pub use fonts::{FontChain, FontProvider, LoadedFont};
pub use interior::{
    build_interior, build_interior_with_progress, generate_interior, page_geometry,
    write_interior, InteriorOptions, InteriorOptionsBuilder, InteriorOutput, PageGeometry,
    PageKind, INTERIOR_PDF,
};
pub use pages::{scan_pages, InteriorPage};
pub use progress::{BuildStage, ConsoleProgress, OutputMode, ProgressCallback, SilentProgress};
pub use random::{RandomStream, SeededStream};
pub use sheets::{plan_sheets, Panel, SampleSheet};
pub use sizing::{
    compute_canvas, compute_spine, inches_to_px, spine_text_eligible, CanvasSpec, PaperProfile,
    PixelRect, SpineSpec, TrimSize,
};

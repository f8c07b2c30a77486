//! Interior Composer
//!
//! Builds the interior PDF: an ownership page, a copyright page, then one
//! page per `fbnp_<N>.png` in page-number order. Each page image is converted
//! to grayscale, scaled to fit the safe area without cropping and centred.
//!
//! With bleed enabled the page grows by the bleed on every side; the safe
//! area is always measured from the trim edge.

use ab_glyph::FontVec;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{validate_safe_title, Config, LayoutConfig};
use crate::error::{BuildError, Result};
use crate::export::PdfRasterWriter;
use crate::fonts::FontChain;
use crate::pages::{load_page_image, scan_pages, InteriorPage};
use crate::progress::{BuildStage, ProgressCallback, SilentProgress};
use crate::sizing::{inches_to_px, PixelRect, TrimSize};
use crate::text::{self, Align};

// ============================================================
// Constants
// ============================================================

/// Interior PDF file name
pub const INTERIOR_PDF: &str = "fbnp_interior.pdf";

/// Default safe margin from the trim edge (inches)
pub const DEFAULT_MARGIN_IN: f64 = 0.5;

/// Default upscale limit for small page images
pub const DEFAULT_MAX_UPSCALE: f64 = 4.0;

/// Default copyright holder
pub const DEFAULT_COPYRIGHT_HOLDER: &str = "Fantasy Broadcast Network";

const OWNERSHIP_TEXT: &str = "This Book Belongs To:";

// Pixel sizes below are authored for 300 DPI and scaled
const OWNERSHIP_FONT_PX: u32 = 100;
const OWNERSHIP_LINE_GAP_PX: u32 = 100;
const OWNERSHIP_LINE_THICKNESS_PX: u32 = 5;
const COPYRIGHT_FONT_PX: u32 = 60;
const COPYRIGHT_SPACING_PX: u32 = 20;

/// Length of the name line on the ownership page
const OWNERSHIP_LINE_IN: f64 = 5.0;

const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

// ============================================================
// Options
// ============================================================

/// Per-invocation interior settings
#[derive(Debug, Clone, PartialEq)]
pub struct InteriorOptions {
    /// Largest scale factor applied to page images smaller than the safe area
    pub max_upscale: f64,
    pub copyright_holder: String,
    pub copyright_year: i32,
    /// Ownership and copyright pages
    pub front_matter: bool,
    /// PDF document title
    pub title: String,
}

impl Default for InteriorOptions {
    fn default() -> Self {
        Self {
            max_upscale: DEFAULT_MAX_UPSCALE,
            copyright_holder: DEFAULT_COPYRIGHT_HOLDER.to_string(),
            copyright_year: current_year(),
            front_matter: true,
            title: "Interior".to_string(),
        }
    }
}

fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Local::now().year()
}

impl InteriorOptions {
    pub fn builder() -> InteriorOptionsBuilder {
        InteriorOptionsBuilder::default()
    }

    /// Copyright page text, one entry per line
    pub fn copyright_lines(&self) -> Vec<String> {
        vec![
            format!("\u{a9} {} {}", self.copyright_year, self.copyright_holder),
            "All Rights Reserved".to_string(),
        ]
    }
}

/// Builder for [`InteriorOptions`]
#[derive(Debug, Default)]
pub struct InteriorOptionsBuilder {
    options: InteriorOptions,
}

impl InteriorOptionsBuilder {
    /// Upscale limit (clamped to at least 1.0)
    #[must_use]
    pub fn max_upscale(mut self, max_upscale: f64) -> Self {
        self.options.max_upscale = if max_upscale.is_finite() {
            max_upscale.max(1.0)
        } else {
            DEFAULT_MAX_UPSCALE
        };
        self
    }

    #[must_use]
    pub fn copyright_holder(mut self, holder: impl Into<String>) -> Self {
        self.options.copyright_holder = holder.into();
        self
    }

    #[must_use]
    pub fn copyright_year(mut self, year: i32) -> Self {
        self.options.copyright_year = year;
        self
    }

    #[must_use]
    pub fn front_matter(mut self, enabled: bool) -> Self {
        self.options.front_matter = enabled;
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.options.title = title.into();
        self
    }

    #[must_use]
    pub fn build(self) -> InteriorOptions {
        self.options
    }
}

// ============================================================
// Geometry
// ============================================================

/// Pixel geometry shared by every interior page
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub dpi: u32,
    pub trim: TrimSize,
    pub bleed_in: f64,
    pub margin_in: f64,
    pub width_px: u32,
    pub height_px: u32,
    /// Trim inset by the margin, in page pixels
    pub safe: PixelRect,
}

/// Page canvas and safe area for a trim size
pub fn page_geometry(trim: TrimSize, dpi: u32, margin_in: f64, bleed_in: f64) -> Result<PageGeometry> {
    if dpi == 0 {
        return Err(BuildError::config("dpi must be greater than zero"));
    }
    if margin_in.is_nan() || margin_in < 0.0 || bleed_in < 0.0 {
        return Err(BuildError::config("margin and bleed must not be negative"));
    }
    if margin_in * 2.0 >= trim.width_in.min(trim.height_in) {
        return Err(BuildError::config(format!(
            "margin {margin_in} in leaves no room on a {trim} page"
        )));
    }

    // Page size rounds the whole physical width, like the cover canvas
    let width_px = inches_to_px(trim.width_in + 2.0 * bleed_in, dpi);
    let height_px = inches_to_px(trim.height_in + 2.0 * bleed_in, dpi);
    let margin = inches_to_px(margin_in, dpi);
    let trim_w = inches_to_px(trim.width_in, dpi).min(width_px);
    let trim_h = inches_to_px(trim.height_in, dpi).min(height_px);

    Ok(PageGeometry {
        dpi,
        trim,
        bleed_in,
        margin_in,
        width_px,
        height_px,
        safe: PixelRect::new(
            (width_px - trim_w) / 2 + margin,
            (height_px - trim_h) / 2 + margin,
            trim_w.saturating_sub(2 * margin),
            trim_h.saturating_sub(2 * margin),
        ),
    })
}

/// Scale that fits `src` inside `area` without cropping, capped at `max_upscale`
pub fn fit_scale(src: (u32, u32), area: (u32, u32), max_upscale: f64) -> f64 {
    let fit = (area.0 as f64 / src.0.max(1) as f64).min(area.1 as f64 / src.1.max(1) as f64);
    fit.min(max_upscale.max(1.0))
}

/// Where a `src`-sized image lands inside `safe`
pub fn place_centered(src: (u32, u32), safe: &PixelRect, max_upscale: f64) -> PixelRect {
    let scale = fit_scale(src, (safe.width, safe.height), max_upscale);
    let width = ((src.0 as f64 * scale) as u32).clamp(1, safe.width.max(1));
    let height = ((src.1 as f64 * scale) as u32).clamp(1, safe.height.max(1));
    PixelRect::new(
        safe.x + (safe.width.saturating_sub(width)) / 2,
        safe.y + (safe.height.saturating_sub(height)) / 2,
        width,
        height,
    )
}

// ============================================================
// Results
// ============================================================

/// Kind of an interior page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Ownership,
    Copyright,
    Art,
}

/// One page of the interior PDF
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagePlacement {
    pub kind: PageKind,
    pub source: Option<PathBuf>,
    /// Art rectangle in page pixels
    pub rect: Option<PixelRect>,
}

/// Built interior
#[derive(Debug, Clone)]
pub struct InteriorOutput {
    pub geometry: PageGeometry,
    pub pages: Vec<PagePlacement>,
    pub document: Vec<u8>,
}

impl InteriorOutput {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

// ============================================================
// Rendering
// ============================================================

fn blank_page(geometry: &PageGeometry) -> RgbaImage {
    RgbaImage::from_pixel(geometry.width_px, geometry.height_px, Rgba([255, 255, 255, 255]))
}

fn flatten(page: RgbaImage) -> RgbImage {
    DynamicImage::ImageRgba8(page).to_rgb8()
}

fn ownership_page(font: &FontVec, geometry: &PageGeometry, layout: &LayoutConfig) -> RgbImage {
    let mut page = blank_page(geometry);
    let px = layout.scaled_px(OWNERSHIP_FONT_PX).max(1) as f32;
    let lines = vec![OWNERSHIP_TEXT.to_string()];
    let (_, text_h) = text::block_size(font, px, &lines, 0);
    let y = geometry.height_px.saturating_sub(text_h) / 3;
    text::draw_block(
        &mut page,
        font,
        px,
        &lines,
        (0, y as i32),
        geometry.width_px,
        Align::Center,
        0,
        INK,
    );

    let line_w = layout.px(OWNERSHIP_LINE_IN).min(geometry.width_px);
    let thickness = layout.scaled_px(OWNERSHIP_LINE_THICKNESS_PX).max(1);
    let line_y = y + text_h + layout.scaled_px(OWNERSHIP_LINE_GAP_PX);
    if line_w > 0 && line_y + thickness <= geometry.height_px {
        draw_filled_rect_mut(
            &mut page,
            Rect::at(((geometry.width_px - line_w) / 2) as i32, line_y as i32).of_size(line_w, thickness),
            INK,
        );
    }
    flatten(page)
}

fn copyright_page(
    font: &FontVec,
    geometry: &PageGeometry,
    layout: &LayoutConfig,
    options: &InteriorOptions,
) -> RgbImage {
    let mut page = blank_page(geometry);
    let px = layout.scaled_px(COPYRIGHT_FONT_PX).max(1) as f32;
    let spacing = layout.scaled_px(COPYRIGHT_SPACING_PX);
    let lines = options.copyright_lines();
    let (_, text_h) = text::block_size(font, px, &lines, spacing);
    let y = geometry.height_px.saturating_sub(text_h) / 2;
    text::draw_block(
        &mut page,
        font,
        px,
        &lines,
        (0, y as i32),
        geometry.width_px,
        Align::Center,
        spacing,
        INK,
    );
    flatten(page)
}

/// Grayscale art on white, fitted and centred in the safe area
fn art_page(
    art: &DynamicImage,
    geometry: &PageGeometry,
    max_upscale: f64,
) -> (RgbImage, PixelRect) {
    // Transparent areas become paper white before the grayscale conversion
    let mut flattened = RgbaImage::from_pixel(art.width(), art.height(), Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut flattened, &art.to_rgba8(), 0, 0);
    let gray = DynamicImage::ImageRgba8(flattened).to_luma8();

    let rect = place_centered(gray.dimensions(), &geometry.safe, max_upscale);
    let fitted = if gray.dimensions() == (rect.width, rect.height) {
        gray
    } else {
        imageops::resize(&gray, rect.width, rect.height, FilterType::Lanczos3)
    };

    let mut page = RgbImage::from_pixel(geometry.width_px, geometry.height_px, Rgb([255, 255, 255]));
    let fitted = DynamicImage::ImageLuma8(fitted).to_rgb8();
    imageops::replace(&mut page, &fitted, rect.x as i64, rect.y as i64);
    (page, rect)
}

/// Build the interior PDF from the `fbnp_<N>.png` files in `source_dir`
pub fn build_interior(
    source_dir: &Path,
    trim: TrimSize,
    dpi: u32,
    margin_in: f64,
    bleed_enabled: bool,
    options: &InteriorOptions,
    layout: &LayoutConfig,
) -> Result<InteriorOutput> {
    build_interior_with_progress(
        source_dir,
        trim,
        dpi,
        margin_in,
        bleed_enabled,
        options,
        layout,
        &SilentProgress,
    )
}

/// [`build_interior`] with progress reporting
#[allow(clippy::too_many_arguments)]
pub fn build_interior_with_progress(
    source_dir: &Path,
    trim: TrimSize,
    dpi: u32,
    margin_in: f64,
    bleed_enabled: bool,
    options: &InteriorOptions,
    layout: &LayoutConfig,
    progress: &dyn ProgressCallback,
) -> Result<InteriorOutput> {
    let layout = &LayoutConfig {
        dpi,
        ..layout.clone()
    };
    let bleed_in = if bleed_enabled { layout.bleed_in } else { 0.0 };
    let geometry = page_geometry(trim, dpi, margin_in, bleed_in)?;
    let art: Vec<InteriorPage> = scan_pages(source_dir)?;

    let mut writer = PdfRasterWriter::new(options.title.clone());
    let mut pages = Vec::with_capacity(art.len() + 2);

    if options.front_matter {
        let font = FontChain::from_paths(&layout.title_fonts)
            .then(FontChain::from_paths(&layout.text_fonts))
            .resolve("front matter")?;
        writer.add_page(&ownership_page(&font.font, &geometry, layout), dpi)?;
        pages.push(PagePlacement {
            kind: PageKind::Ownership,
            source: None,
            rect: None,
        });
        writer.add_page(&copyright_page(&font.font, &geometry, layout, options), dpi)?;
        pages.push(PagePlacement {
            kind: PageKind::Copyright,
            source: None,
            rect: None,
        });
    }

    progress.on_stage(BuildStage::Pages);
    for (i, page) in art.iter().enumerate() {
        let image = load_page_image(&page.path)?;
        let (raster, rect) = art_page(&image, &geometry, options.max_upscale);
        writer.add_page(&raster, dpi)?;
        debug!(page = %page.file_name(), ?rect, "placed page");
        pages.push(PagePlacement {
            kind: PageKind::Art,
            source: Some(page.path.clone()),
            rect: Some(rect),
        });
        progress.on_item(i + 1, art.len(), &page.file_name());
    }

    progress.on_stage(BuildStage::WritingPdf);
    let document = writer.finish()?;
    Ok(InteriorOutput {
        geometry,
        pages,
        document,
    })
}

/// Write `fbnp_interior.pdf`, replacing an existing file
pub fn write_interior(book_dir: &Path, output: &InteriorOutput) -> Result<PathBuf> {
    std::fs::create_dir_all(book_dir)?;
    let path = book_dir.join(INTERIOR_PDF);
    std::fs::write(&path, &output.document)?;
    Ok(path)
}

/// Build and write the interior for the book under `config`'s output root
#[allow(clippy::too_many_arguments)]
pub fn generate_interior(
    safe_title: &str,
    trim: TrimSize,
    dpi: u32,
    margin_in: f64,
    bleed_enabled: bool,
    options: &InteriorOptions,
    config: &Config,
    progress: &dyn ProgressCallback,
) -> Result<PathBuf> {
    validate_safe_title(safe_title)?;
    progress.on_stage(BuildStage::Initializing);
    let book_dir = config.book_dir(safe_title);
    let output = build_interior_with_progress(
        &book_dir,
        trim,
        dpi,
        margin_in,
        bleed_enabled,
        options,
        &config.layout,
        progress,
    )?;
    let path = write_interior(&book_dir, &output)?;
    info!(path = %path.display(), pages = output.page_count(), "interior written");
    progress.on_complete();
    Ok(path)
}

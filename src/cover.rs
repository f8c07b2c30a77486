//! Cover Composer
//!
//! Draws the wraparound cover back to front onto one RGBA canvas:
//!
//! 1. Background (solid or gradient)
//! 2. Description card on the back panel
//! 3. White barcode reservation
//! 4. Rotated spine title, when the page count allows spine text
//! 5. Front title with a soft white shadow, then the optional subtitle
//! 6. Tilted sample sheets
//!
//! The canvas is flattened to RGB for the PNG preview and the PDF.

use ab_glyph::FontVec;
use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbImage, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::background::{BackgroundSpec, Color};
use crate::config::{validate_safe_title, Config, LayoutConfig};
use crate::error::{BuildError, Result};
use crate::export::{convert_or_fallback, raster_pages_to_pdf, MagickConverter, PdfRoute};
use crate::fonts::FontChain;
use crate::pages::{load_page_image, scan_pages};
use crate::progress::{BuildStage, ProgressCallback, SilentProgress};
use crate::random::{RandomStream, SeededStream};
use crate::sheets::{
    clear_below, plan_sheets, render_sheet, sheet_zones, Panel, SampleSheet, MAX_SHEETS,
};
use crate::sizing::{
    compute_canvas, compute_spine, CanvasSpec, PaperProfile, PixelRect, SpineSpec, TrimSize,
};
use crate::text::{self, Align, FitRange, Shadow};

// ============================================================
// Constants
// ============================================================

/// Cover preview file name
pub const COVER_PNG: &str = "fbnp_cover.png";

/// Cover PDF file name
pub const COVER_PDF: &str = "fbnp_cover.pdf";

const TITLE_FILL: Rgba<u8> = Rgba([25, 25, 25, 255]);
const TITLE_SHADOW: Rgba<u8> = Rgba([255, 255, 255, 255]);
const SUBTITLE_FILL: Rgba<u8> = Rgba([60, 60, 60, 255]);
const BODY_FILL: Rgba<u8> = Rgba([30, 30, 30, 255]);
const SPINE_FILL: Rgba<u8> = Rgba([30, 30, 30, 255]);

/// Description card opacity
const CARD_ALPHA: u8 = 210;

// Pixel sizes below are authored for 300 DPI and scaled
const LINE_SPACING_PX: u32 = 10;
const SHADOW_OFFSET_PX: u32 = 3;
const SHADOW_BLUR_PX: u32 = 4;
const SUBTITLE_GAP_PX: u32 = 20;
const SPINE_FONT_MIN_PX: u32 = 24;
const SPINE_FONT_MAX_PX: u32 = 80;

/// Gap between spine text and the folds
const SPINE_CLEARANCE_IN: f64 = 0.125;

/// Subtitle size relative to the fitted title
const SUBTITLE_RATIO: f32 = 0.45;

// ============================================================
// Options
// ============================================================

/// Per-invocation cover settings
#[derive(Debug, Clone, PartialEq)]
pub struct CoverOptions {
    /// Book folder name under the output root
    pub safe_title: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: String,
    pub pages: u32,
    pub paper: PaperProfile,
    pub trim: TrimSize,
    /// Requested sample sheets (clamped to 2..=5)
    pub max_images: usize,
    pub spine_title: Option<String>,
    pub background: BackgroundSpec,
    /// Layout seed; `None` draws from OS entropy
    pub seed: Option<u64>,
    pub bleed: bool,
    pub use_magick: bool,
}

impl Default for CoverOptions {
    fn default() -> Self {
        Self {
            safe_title: String::new(),
            title: String::new(),
            subtitle: None,
            description: String::new(),
            pages: 0,
            paper: PaperProfile::White,
            trim: TrimSize::letter(),
            max_images: MAX_SHEETS,
            spine_title: None,
            background: BackgroundSpec::default(),
            seed: None,
            bleed: true,
            use_magick: true,
        }
    }
}

impl CoverOptions {
    pub fn builder() -> CoverOptionsBuilder {
        CoverOptionsBuilder::default()
    }

    /// Check the fields no later step validates
    pub fn validate(&self) -> Result<()> {
        validate_safe_title(&self.safe_title)?;
        if self.title.trim().is_empty() {
            return Err(BuildError::config("cover title must not be empty"));
        }
        Ok(())
    }

    /// Spine title, if one was given and is not blank
    pub fn spine_title(&self) -> Option<&str> {
        self.spine_title
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Builder for [`CoverOptions`]
#[derive(Debug, Default)]
pub struct CoverOptionsBuilder {
    options: CoverOptions,
}

impl CoverOptionsBuilder {
    #[must_use]
    pub fn safe_title(mut self, safe_title: impl Into<String>) -> Self {
        self.options.safe_title = safe_title.into();
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.options.title = title.into();
        self
    }

    #[must_use]
    pub fn subtitle(mut self, subtitle: Option<String>) -> Self {
        self.options.subtitle = subtitle;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.options.description = description.into();
        self
    }

    #[must_use]
    pub fn pages(mut self, pages: u32) -> Self {
        self.options.pages = pages;
        self
    }

    #[must_use]
    pub fn paper(mut self, paper: PaperProfile) -> Self {
        self.options.paper = paper;
        self
    }

    #[must_use]
    pub fn trim(mut self, trim: TrimSize) -> Self {
        self.options.trim = trim;
        self
    }

    #[must_use]
    pub fn max_images(mut self, max_images: usize) -> Self {
        self.options.max_images = max_images;
        self
    }

    #[must_use]
    pub fn spine_title(mut self, spine_title: Option<String>) -> Self {
        self.options.spine_title = spine_title;
        self
    }

    #[must_use]
    pub fn background(mut self, background: BackgroundSpec) -> Self {
        self.options.background = background;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.options.seed = seed;
        self
    }

    #[must_use]
    pub fn bleed(mut self, bleed: bool) -> Self {
        self.options.bleed = bleed;
        self
    }

    #[must_use]
    pub fn use_magick(mut self, use_magick: bool) -> Self {
        self.options.use_magick = use_magick;
        self
    }

    #[must_use]
    pub fn build(self) -> CoverOptions {
        self.options
    }
}

// ============================================================
// Results
// ============================================================

/// Where each cover element ended up, in canvas pixels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverLayout {
    pub title: PixelRect,
    pub title_px: u32,
    pub title_lines: Vec<String>,
    pub subtitle: Option<PixelRect>,
    pub description_card: Option<PixelRect>,
    pub barcode: PixelRect,
    /// Bounds of the rotated spine title, when drawn
    pub spine_text: Option<PixelRect>,
    /// Sample sheets as drawn, after moving back sheets off the description
    pub sheets: Vec<SampleSheet>,
}

/// Rendered cover
#[derive(Debug, Clone)]
pub struct CoverOutput {
    pub preview: RgbImage,
    /// Native single-page PDF
    pub document: Vec<u8>,
    pub layout: CoverLayout,
}

/// Geometry and sheet placement decided before drawing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverPlan {
    pub book_dir: PathBuf,
    pub spine: SpineSpec,
    pub canvas: CanvasSpec,
    pub spine_text: bool,
    pub sheets: Vec<SampleSheet>,
    pub seed: Option<u64>,
}

/// Files written for a cover
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverFiles {
    pub png: PathBuf,
    pub pdf: PathBuf,
    pub route: PdfRoute,
}

// ============================================================
// Geometry
// ============================================================

/// Barcode box at the back panel's bottom inner corner, clamped into the panel
pub fn barcode_rect(canvas: &CanvasSpec, layout: &LayoutConfig) -> PixelRect {
    let back = canvas.back_panel();
    let width = layout.px(layout.barcode_width_in).min(back.width);
    let height = layout.px(layout.barcode_height_in).min(back.height);
    let inner = layout.px(layout.barcode_inner_offset_in);
    let bottom = layout.px(layout.barcode_bottom_offset_in);

    let x = back.right().saturating_sub(width + inner).max(back.x);
    let y = back.bottom().saturating_sub(height + bottom).max(back.y);
    PixelRect::new(x, y, width, height)
}

/// True when the cover gets a rotated spine title
pub fn spine_text_allowed(
    options: &CoverOptions,
    canvas: &CanvasSpec,
    layout: &LayoutConfig,
) -> bool {
    options.spine_title().is_some()
        && options.pages >= layout.spine_text_min_pages
        && canvas.spine_px() > 0
}

/// Layout constants expressed at the canvas resolution
fn at_canvas_dpi(layout: &LayoutConfig, canvas: &CanvasSpec) -> LayoutConfig {
    LayoutConfig {
        dpi: canvas.dpi,
        ..layout.clone()
    }
}

fn fill_rect(canvas: &mut RgbaImage, rect: &PixelRect, color: Rgba<u8>) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    draw_filled_rect_mut(
        canvas,
        Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width, rect.height),
        color,
    );
}

// ============================================================
// Drawing
// ============================================================

struct TitleBlock {
    rect: PixelRect,
    size_px: u32,
    lines: Vec<String>,
}

fn draw_title(
    base: &mut RgbaImage,
    font: &FontVec,
    title: &str,
    canvas: &CanvasSpec,
    layout: &LayoutConfig,
) -> TitleBlock {
    let front = canvas.front_panel();
    let max_width = (front.width as f64 * layout.title_width_ratio) as u32;
    let range = FitRange {
        max_px: layout.scaled_px(layout.title_max_px).max(1),
        min_px: layout.scaled_px(layout.title_min_px).max(1),
        step_px: layout.scaled_px(layout.title_step_px).max(1),
        max_lines: layout.title_max_lines,
    };
    let fit = text::fit_title(font, title, max_width, range);
    let spacing = layout.scaled_px(LINE_SPACING_PX);
    let (block_w, block_h) = text::block_size(font, fit.size_px as f32, &fit.lines, spacing);
    let y = front.y + layout.px(layout.title_top_in);

    let offset = layout.scaled_px(SHADOW_OFFSET_PX) as i32;
    let shadow = Shadow {
        color: TITLE_SHADOW,
        offset: (offset, offset),
        blur_sigma: layout.scaled_px(SHADOW_BLUR_PX) as f32,
    };
    text::draw_block_with_shadow(
        base,
        font,
        fit.size_px as f32,
        &fit.lines,
        (front.x as i32, y as i32),
        front.width,
        Align::Center,
        spacing,
        TITLE_FILL,
        shadow,
    );
    debug!(size_px = fit.size_px, lines = fit.lines.len(), "drew title");

    let block_w = block_w.min(front.width);
    TitleBlock {
        rect: PixelRect::new(front.x + (front.width - block_w) / 2, y, block_w, block_h),
        size_px: fit.size_px,
        lines: fit.lines,
    }
}

fn draw_subtitle(
    base: &mut RgbaImage,
    font: &FontVec,
    subtitle: &str,
    title: &TitleBlock,
    canvas: &CanvasSpec,
    layout: &LayoutConfig,
) -> PixelRect {
    let front = canvas.front_panel();
    let px = (title.size_px as f32 * SUBTITLE_RATIO).max(layout.scaled_px(layout.body_font_px) as f32);
    let max_width = (front.width as f64 * layout.title_width_ratio) as u32;
    let spacing = layout.scaled_px(LINE_SPACING_PX);
    let lines = text::wrap_text(font, px, subtitle, max_width);
    let (block_w, block_h) = text::block_size(font, px, &lines, spacing);
    let y = title.rect.bottom() + layout.scaled_px(SUBTITLE_GAP_PX);

    text::draw_block(
        base,
        font,
        px,
        &lines,
        (front.x as i32, y as i32),
        front.width,
        Align::Center,
        spacing,
        SUBTITLE_FILL,
    );
    let block_w = block_w.min(front.width);
    PixelRect::new(front.x + (front.width - block_w) / 2, y, block_w, block_h)
}

fn draw_description(
    base: &mut RgbaImage,
    font: &FontVec,
    description: &str,
    canvas: &CanvasSpec,
    layout: &LayoutConfig,
) -> Option<PixelRect> {
    if description.trim().is_empty() {
        return None;
    }
    let back = canvas.back_panel();
    let px = layout.scaled_px(layout.body_font_px).max(1) as f32;
    let max_width = (back.width as f64 * layout.description_width_ratio) as u32;
    let x = back.x + back.width.saturating_sub(max_width) / 2;
    let y = back.y + layout.px(layout.description_top_in);
    let spacing = layout.scaled_px(LINE_SPACING_PX);

    let lines = text::wrap_text(font, px, description, max_width);
    let (text_w, text_h) = text::block_size(font, px, &lines, spacing);
    let pad = layout.px(layout.card_padding_in);
    let card = RgbaImage::from_pixel(text_w + 2 * pad, text_h + 2 * pad, Color::WHITE.rgba(CARD_ALPHA));
    let card_x = x.saturating_sub(pad);
    let card_y = y.saturating_sub(pad);
    imageops::overlay(base, &card, card_x as i64, card_y as i64);

    text::draw_block(
        base,
        font,
        px,
        &lines,
        (x as i32, y as i32),
        max_width,
        Align::Left,
        spacing,
        BODY_FILL,
    );
    debug!(lines = lines.len(), "drew description card");
    Some(PixelRect::new(card_x, card_y, card.width(), card.height()))
}

/// Back sheets that would cover the description card move below it, or are dropped
fn keep_clear_of_description(
    sheets: &[SampleSheet],
    card: Option<&PixelRect>,
    canvas: &CanvasSpec,
    layout: &LayoutConfig,
) -> Vec<SampleSheet> {
    let Some(card) = card else {
        return sheets.to_vec();
    };
    let zone = sheet_zones(canvas, layout).back;
    if card.bottom() > zone.y {
        warn!(
            card_bottom = card.bottom(),
            zone_top = zone.y,
            "description runs into the sample sheet area"
        );
    }

    sheets
        .iter()
        .filter_map(|sheet| {
            if sheet.panel != Panel::Back {
                return Some(sheet.clone());
            }
            let kept = clear_below(sheet, card, &zone, canvas.dpi);
            match &kept {
                Some(moved) if moved.rect != sheet.rect => {
                    debug!(from = ?sheet.rect, to = ?moved.rect, "moved sheet below description")
                }
                None => warn!(source = %sheet.source.display(), "no room below description, sheet dropped"),
                _ => {}
            }
            kept
        })
        .collect()
}

fn draw_spine_text(
    base: &mut RgbaImage,
    font: &FontVec,
    spine_title: &str,
    canvas: &CanvasSpec,
    layout: &LayoutConfig,
) -> PixelRect {
    let spine = canvas.spine_panel();
    let clearance = layout.px(SPINE_CLEARANCE_IN);
    let mut px = spine
        .width
        .saturating_sub(clearance)
        .clamp(
            layout.scaled_px(SPINE_FONT_MIN_PX),
            layout.scaled_px(SPINE_FONT_MAX_PX),
        )
        .max(1) as f32;

    let margin = canvas.bleed_px() + layout.px(layout.safe_margin_in);
    let available = canvas.height_px.saturating_sub(2 * margin).max(1);
    let (text_w, _) = text::measure(font, px, spine_title);
    if text_w > available {
        px = (px * available as f32 / text_w as f32).floor().max(1.0);
        debug!(px, "spine title shrunk to fit the canvas height");
    }

    // Reads bottom to top
    let line = text::render_line(font, px, spine_title, SPINE_FILL);
    let rotated = imageops::rotate270(&line);
    let x = spine.x as i64 + (spine.width as i64 - rotated.width() as i64) / 2;
    let y = (canvas.height_px as i64 - rotated.height() as i64) / 2;
    imageops::overlay(base, &rotated, x, y);

    PixelRect::new(x.max(0) as u32, y.max(0) as u32, rotated.width(), rotated.height())
}

/// Render a cover from a planned canvas and sheet placement
pub fn build_cover(
    options: &CoverOptions,
    canvas: &CanvasSpec,
    sheets: &[SampleSheet],
    layout: &LayoutConfig,
) -> Result<CoverOutput> {
    build_cover_with_progress(options, canvas, sheets, layout, &SilentProgress)
}

/// [`build_cover`] with progress reporting
pub fn build_cover_with_progress(
    options: &CoverOptions,
    canvas: &CanvasSpec,
    sheets: &[SampleSheet],
    layout: &LayoutConfig,
    progress: &dyn ProgressCallback,
) -> Result<CoverOutput> {
    options.validate()?;
    let layout = &at_canvas_dpi(layout, canvas);
    layout.validate()?;
    let background = options.background.resolve(layout)?;

    let title_font = FontChain::from_paths(&layout.title_fonts).resolve("title")?;
    let body_font = FontChain::from_paths(&layout.text_fonts)
        .then(FontChain::from_paths(&layout.title_fonts))
        .resolve("body")?;

    progress.on_stage(BuildStage::Background);
    let mut base = RgbaImage::new(canvas.width_px, canvas.height_px);
    background.paint(&mut base);

    progress.on_stage(BuildStage::Text);
    let description_card = draw_description(&mut base, &body_font.font, &options.description, canvas, layout);

    let barcode = barcode_rect(canvas, layout);
    fill_rect(&mut base, &barcode, Color::WHITE.rgba(255));

    let spine_text = match options.spine_title() {
        Some(spine_title) if spine_text_allowed(options, canvas, layout) => Some(draw_spine_text(
            &mut base,
            &title_font.font,
            spine_title,
            canvas,
            layout,
        )),
        _ => None,
    };

    let title = draw_title(&mut base, &title_font.font, &options.title, canvas, layout);
    let subtitle = options
        .subtitle
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| draw_subtitle(&mut base, &body_font.font, s, &title, canvas, layout));

    let front = canvas.front_panel();
    let title_band_bottom =
        front.y + (canvas.trim_height_px() as f64 * layout.title_band_ratio).round() as u32;
    let text_bottom = subtitle.map_or(title.rect.bottom(), |s| s.bottom());
    if text_bottom > title_band_bottom {
        warn!(text_bottom, title_band_bottom, "title block runs into the sample sheet area");
    }

    let sheets = keep_clear_of_description(sheets, description_card.as_ref(), canvas, layout);

    progress.on_stage(BuildStage::Sheets);
    for (i, sheet) in sheets.iter().enumerate() {
        let art = load_page_image(&sheet.source)?;
        render_sheet(&mut base, sheet, &art, canvas.dpi);
        progress.on_item(i + 1, sheets.len(), &sheet.source.display().to_string());
    }

    progress.on_stage(BuildStage::EncodingPreview);
    let preview = DynamicImage::ImageRgba8(base).to_rgb8();

    progress.on_stage(BuildStage::WritingPdf);
    let document = raster_pages_to_pdf(&options.title, std::slice::from_ref(&preview), canvas.dpi)?;

    Ok(CoverOutput {
        preview,
        document,
        layout: CoverLayout {
            title: title.rect,
            title_px: title.size_px,
            title_lines: title.lines,
            subtitle,
            description_card,
            barcode,
            spine_text,
            sheets,
        },
    })
}

// ============================================================
// Planning and output
// ============================================================

/// Size the cover and place sample sheets from the pages in `book_dir`
pub fn plan_cover(
    options: &CoverOptions,
    book_dir: &Path,
    layout: &LayoutConfig,
    rng: &mut dyn RandomStream,
) -> Result<CoverPlan> {
    options.validate()?;
    layout.validate()?;

    let spine = compute_spine(options.pages, options.paper, layout)?;
    let bleed_in = if options.bleed { layout.bleed_in } else { 0.0 };
    let canvas = compute_canvas(options.trim, spine.width_in, bleed_in, layout.dpi)?;
    let pages = scan_pages(book_dir)?;
    let sheets = plan_sheets(&pages, options.max_images, &canvas, layout, rng)?;

    Ok(CoverPlan {
        book_dir: book_dir.to_path_buf(),
        spine,
        canvas,
        spine_text: spine_text_allowed(options, &canvas, layout),
        sheets,
        seed: options.seed,
    })
}

/// Write `fbnp_cover.png` and `fbnp_cover.pdf`, replacing existing files
pub fn write_cover(
    book_dir: &Path,
    output: &CoverOutput,
    dpi: u32,
    magick: Option<&MagickConverter>,
) -> Result<CoverFiles> {
    std::fs::create_dir_all(book_dir)?;
    let png = book_dir.join(COVER_PNG);
    let pdf = book_dir.join(COVER_PDF);

    output.preview.save_with_format(&png, ImageFormat::Png)?;
    let route = convert_or_fallback(magick, &png, &pdf, dpi, &output.document)?;
    Ok(CoverFiles { png, pdf, route })
}

/// Plan, render and write a cover for the book under `config`'s output root
pub fn generate_cover(
    options: &CoverOptions,
    config: &Config,
    progress: &dyn ProgressCallback,
) -> Result<CoverFiles> {
    progress.on_stage(BuildStage::Initializing);
    let book_dir = config.book_dir(&options.safe_title);
    let mut rng = SeededStream::new(options.seed);

    progress.on_stage(BuildStage::Sizing);
    let plan = plan_cover(options, &book_dir, &config.layout, &mut rng)?;
    info!(
        width_px = plan.canvas.width_px,
        height_px = plan.canvas.height_px,
        spine_in = format!("{:.4}", plan.spine.width_in),
        sheets = plan.sheets.len(),
        "cover planned"
    );

    let output = build_cover_with_progress(options, &plan.canvas, &plan.sheets, &config.layout, progress)?;
    let magick = if config.use_magick && options.use_magick {
        MagickConverter::detect()
    } else {
        None
    };
    let files = write_cover(&book_dir, &output, plan.canvas.dpi, magick.as_ref())?;
    info!(png = %files.png.display(), pdf = %files.pdf.display(), route = ?files.route, "cover written");
    progress.on_complete();
    Ok(files)
}

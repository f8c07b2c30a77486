//! Sample sheets: tilted thumbnails of interior pages on the cover
//!
//! # Algorithm
//!
//! 1. Take the first few interior pages, shuffle them with the build's random
//!    stream and keep `count` of them
//! 2. Split each panel's sheet zone into a 2x2 grid and shuffle the cells
//! 3. Alternate front, back, front, ... taking one cell per sheet
//! 4. Size each sheet at the trim aspect ratio, jitter its centre and pick a
//!    tilt angle
//!
//! Zones keep clear of the title band on the front and of the description
//! band and barcode row on the back. A description card taller than its band
//! is only known once drawn; [`clear_below`] then moves back-panel sheets
//! under the card or drops them.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::rect::Rect;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use crate::config::LayoutConfig;
use crate::error::{BuildError, Result};
use crate::pages::InteriorPage;
use crate::random::{shuffle, RandomStream};
use crate::sizing::{CanvasSpec, PixelRect};

// ============================================================
// Constants
// ============================================================

/// Lower bound on sheets per cover
pub const MIN_SHEETS: usize = 2;

/// Upper bound on sheets per cover
pub const MAX_SHEETS: usize = 5;

const GRID_ROWS: u32 = 2;
const GRID_COLS: u32 = 2;

/// Matte border at 300 DPI
const BORDER_PX: u32 = 12;

/// Shadow blur radius and offset at 300 DPI
const SHADOW_PX: u32 = 12;

const SHADOW_ALPHA: u8 = 180;

/// Shadows are blurred at reduced resolution
const SHADOW_DOWNSCALE: u32 = 4;

// ============================================================
// Types
// ============================================================

/// Cover panel a sheet sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    Front,
    Back,
}

/// One placed sample sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSheet {
    /// Interior page image shown on the sheet
    pub source: PathBuf,
    pub panel: Panel,
    /// Unrotated sheet rectangle in canvas pixels
    pub rect: PixelRect,
    /// Counter-clockwise tilt in degrees
    pub angle_deg: f32,
}

/// Areas of each panel sheets may occupy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetZones {
    pub front: PixelRect,
    pub back: PixelRect,
}

// ============================================================
// Planning
// ============================================================

/// Number of sheets: `max_images` clamped to 2..=5, then to what is available
pub fn sheet_count(max_images: usize, available: usize) -> usize {
    max_images.clamp(MIN_SHEETS, MAX_SHEETS).min(available)
}

/// Sheet zones for a canvas
pub fn sheet_zones(canvas: &CanvasSpec, layout: &LayoutConfig) -> SheetZones {
    let safe = layout.px(layout.safe_margin_in);

    let front_panel = canvas.front_panel().inset(safe);
    let title_band = (canvas.trim_height_px() as f64 * layout.title_band_ratio).round() as u32;
    let front_top = (canvas.front_panel().y + title_band).max(front_panel.y);
    let front = PixelRect::new(
        front_panel.x,
        front_top,
        front_panel.width,
        front_panel.bottom().saturating_sub(front_top),
    );

    let back_panel = canvas.back_panel().inset(safe);
    let description_band =
        (canvas.trim_height_px() as f64 * layout.description_band_ratio).round() as u32;
    let back_top = (canvas.back_panel().y + description_band).max(back_panel.y);
    let barcode_row = layout.px(layout.barcode_height_in + layout.barcode_bottom_offset_in);
    let back_bottom = canvas
        .back_panel()
        .bottom()
        .saturating_sub(barcode_row + safe)
        .max(back_top);
    let back = PixelRect::new(back_panel.x, back_top, back_panel.width, back_bottom - back_top);

    SheetZones { front, back }
}

/// Pick which interior pages appear on the cover
pub fn select_sources(
    pages: &[InteriorPage],
    max_images: usize,
    layout: &LayoutConfig,
    rng: &mut dyn RandomStream,
) -> Result<Vec<PathBuf>> {
    if pages.is_empty() {
        return Err(BuildError::config("no interior pages to show on the cover"));
    }
    let count = sheet_count(max_images, pages.len());
    if count < max_images.clamp(MIN_SHEETS, MAX_SHEETS) {
        debug!(requested = max_images, available = pages.len(), count, "sheet count clamped");
    }

    let mut pool: Vec<PathBuf> = pages
        .iter()
        .take(layout.sheet_pool.max(count))
        .map(|p| p.path.clone())
        .collect();
    shuffle(&mut pool, rng);
    pool.truncate(count);
    Ok(pool)
}

/// Grid cells of a zone
fn grid_cells(zone: &PixelRect) -> Vec<PixelRect> {
    let cell_w = zone.width / GRID_COLS;
    let cell_h = zone.height / GRID_ROWS;
    let mut cells = Vec::with_capacity((GRID_ROWS * GRID_COLS) as usize);
    for row in 0..GRID_ROWS {
        for col in 0..GRID_COLS {
            cells.push(PixelRect::new(
                zone.x + col * cell_w,
                zone.y + row * cell_h,
                cell_w,
                cell_h,
            ));
        }
    }
    cells
}

/// Half width and half height of a `width` x `height` rectangle's bounding box after rotation
pub fn rotated_half_extents(width: f64, height: f64, angle_deg: f32) -> (f64, f64) {
    let theta = (angle_deg as f64).to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    (
        (width * cos + height * sin) / 2.0,
        (width * sin + height * cos) / 2.0,
    )
}

/// Distance a sheet's shadow reaches past its rotated bounds
pub fn shadow_reach(dpi: u32) -> u32 {
    shadow_px(dpi) * 4
}

fn shadow_px(dpi: u32) -> u32 {
    ((SHADOW_PX as f64 * dpi as f64 / 300.0).round() as u32).max(1)
}

/// Sheet rectangle inside a cell, at the trim aspect ratio
///
/// The sheet is sized so that its rotated outline fits the filled cell, and
/// its centre is clamped so the outline plus shadow stays inside the zone.
fn sheet_in_cell(
    cell: &PixelRect,
    zone: &PixelRect,
    aspect: f64,
    angle_deg: f32,
    reach: u32,
    layout: &LayoutConfig,
    rng: &mut dyn RandomStream,
) -> PixelRect {
    let fill = layout.sheet_cell_fill.clamp(0.1, 1.0);
    let theta = (angle_deg as f64).to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let max_w = (cell.width as f64 * fill - 2.0 * reach as f64).max(1.0);
    let max_h = (cell.height as f64 * fill - 2.0 * reach as f64).max(1.0);
    let height = (max_w / (aspect * cos + sin)).min(max_h / (aspect * sin + cos));
    let width = (height * aspect).round().max(1.0) as u32;
    let height = height.round().max(1.0) as u32;

    let (half_w, half_h) = rotated_half_extents(width as f64, height as f64, angle_deg);
    let (half_w, half_h) = (half_w + reach as f64, half_h + reach as f64);

    let jitter_x = (cell.width as f64 * layout.sheet_jitter).round() as i64;
    let jitter_y = (cell.height as f64 * layout.sheet_jitter).round() as i64;
    let (cx, cy) = cell.center();
    let cx = cx + rng.int_in(-jitter_x, jitter_x) as f64;
    let cy = cy + rng.int_in(-jitter_y, jitter_y) as f64;

    let clamp_centre = |centre: f64, half: f64, lo: u32, span: u32| -> f64 {
        let (min, max) = (lo as f64 + half, lo as f64 + span as f64 - half);
        if min > max {
            lo as f64 + span as f64 / 2.0
        } else {
            centre.clamp(min, max)
        }
    };
    let cx = clamp_centre(cx, half_w, zone.x, zone.width);
    let cy = clamp_centre(cy, half_h, zone.y, zone.height);

    let x = (cx - width as f64 / 2.0).round().max(zone.x as f64) as u32;
    let y = (cy - height as f64 / 2.0).round().max(zone.y as f64) as u32;
    PixelRect::new(
        x.min(zone.right().saturating_sub(width)),
        y.min(zone.bottom().saturating_sub(height)),
        width.min(zone.width),
        height.min(zone.height),
    )
}

/// Place already-selected sources onto the cover
pub fn place_sheets(
    sources: Vec<PathBuf>,
    canvas: &CanvasSpec,
    layout: &LayoutConfig,
    rng: &mut dyn RandomStream,
) -> Vec<SampleSheet> {
    let zones = sheet_zones(canvas, layout);
    let aspect = canvas.trim.aspect();

    let mut front_cells = grid_cells(&zones.front);
    let mut back_cells = grid_cells(&zones.back);
    shuffle(&mut front_cells, rng);
    shuffle(&mut back_cells, rng);

    let tilt = layout.max_tilt_deg.abs() as f64;
    let reach = shadow_reach(canvas.dpi);
    let mut sheets = Vec::with_capacity(sources.len());

    for (i, source) in sources.into_iter().enumerate() {
        let angle_deg = rng.uniform(-tilt, tilt) as f32;

        let (panel, cell, zone) = if i % 2 == 0 {
            (Panel::Front, front_cells.pop(), zones.front)
        } else {
            (Panel::Back, back_cells.pop(), zones.back)
        };
        // Both panels hold four cells, more than the five-sheet maximum needs
        let (panel, cell, zone) = match cell {
            Some(cell) => (panel, cell, zone),
            None => match front_cells.pop() {
                Some(cell) => (Panel::Front, cell, zones.front),
                None => break,
            },
        };

        let rect = sheet_in_cell(&cell, &zone, aspect, angle_deg, reach, layout, rng);
        debug!(?panel, ?rect, angle_deg, source = %source.display(), "placed sample sheet");
        sheets.push(SampleSheet {
            source,
            panel,
            rect,
            angle_deg,
        });
    }
    sheets
}

/// Select and place sample sheets
pub fn plan_sheets(
    pages: &[InteriorPage],
    max_images: usize,
    canvas: &CanvasSpec,
    layout: &LayoutConfig,
    rng: &mut dyn RandomStream,
) -> Result<Vec<SampleSheet>> {
    let sources = select_sources(pages, max_images, layout, rng)?;
    Ok(place_sheets(sources, canvas, layout, rng))
}

/// Canvas area a sheet covers once rotated, shadow included
pub fn sheet_footprint(sheet: &SampleSheet, dpi: u32) -> PixelRect {
    let (cx, cy) = sheet.rect.center();
    let (half_w, half_h) = rotated_half_extents(
        sheet.rect.width as f64,
        sheet.rect.height as f64,
        sheet.angle_deg,
    );
    let reach = shadow_reach(dpi) as f64;
    let x0 = (cx - half_w - reach).floor().max(0.0);
    let y0 = (cy - half_h - reach).floor().max(0.0);
    let x1 = (cx + half_w + reach).ceil().max(x0);
    let y1 = (cy + half_h + reach).ceil().max(y0);
    PixelRect::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
}

/// Keep `sheet` off `obstacle`, moving it straight down inside `zone`
///
/// Returns `None` when the zone has no room left below the obstacle.
pub fn clear_below(
    sheet: &SampleSheet,
    obstacle: &PixelRect,
    zone: &PixelRect,
    dpi: u32,
) -> Option<SampleSheet> {
    let footprint = sheet_footprint(sheet, dpi);
    if !footprint.intersects(obstacle) {
        return Some(sheet.clone());
    }
    let shift = obstacle.bottom().saturating_sub(footprint.y);
    if footprint.bottom() + shift > zone.bottom() {
        return None;
    }
    let mut moved = sheet.clone();
    moved.rect.y += shift;
    Some(moved)
}

// ============================================================
// Rendering
// ============================================================

/// Stretch a grayscale image to the full 0-255 range
pub fn autocontrast(gray: &mut GrayImage) {
    let (mut lo, mut hi) = (u8::MAX, u8::MIN);
    for p in gray.pixels() {
        lo = lo.min(p.0[0]);
        hi = hi.max(p.0[0]);
    }
    if hi <= lo {
        return;
    }
    let span = (hi - lo) as f32;
    for p in gray.pixels_mut() {
        p.0[0] = (((p.0[0] - lo) as f32 / span) * 255.0).round() as u8;
    }
}

/// Largest size with the source aspect ratio that fits `target`
pub fn fit_within(src: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let scale = (target.0 as f64 / src.0.max(1) as f64).min(target.1 as f64 / src.1.max(1) as f64);
    (
        ((src.0 as f64 * scale) as u32).max(1),
        ((src.1 as f64 * scale) as u32).max(1),
    )
}

/// White paper matte with the page art fitted in the middle
fn paper_matte(art: &DynamicImage, width: u32, height: u32, dpi_scale: f64) -> Option<RgbaImage> {
    let border = (BORDER_PX as f64 * dpi_scale).round() as u32;
    let pad = (width.min(height) / 20).max(8);
    let inner_w = width.checked_sub(2 * (border + pad)).filter(|w| *w > 0)?;
    let inner_h = height.checked_sub(2 * (border + pad)).filter(|h| *h > 0)?;

    let mut gray = art.to_luma8();
    autocontrast(&mut gray);
    let (fit_w, fit_h) = fit_within(gray.dimensions(), (inner_w, inner_h));
    let fitted = imageops::resize(&gray, fit_w, fit_h, FilterType::Lanczos3);
    let fitted = DynamicImage::ImageLuma8(fitted).to_rgba8();

    let mut paper = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    imageops::overlay(
        &mut paper,
        &fitted,
        ((width - fit_w) / 2) as i64,
        ((height - fit_h) / 2) as i64,
    );
    draw_hollow_rect_mut(
        &mut paper,
        Rect::at(0, 0).of_size(width, height),
        Rgba([210, 210, 210, 255]),
    );
    Some(paper)
}

/// Rotate counter-clockwise on a canvas grown to hold every corner
fn rotate_expanded(image: &RgbaImage, angle_deg: f32) -> RgbaImage {
    let theta = angle_deg.to_radians();
    let (w, h) = (image.width() as f32, image.height() as f32);
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let out_w = ((w * cos + h * sin).ceil() as u32).max(image.width());
    let out_h = ((w * sin + h * cos).ceil() as u32).max(image.height());

    let mut expanded = RgbaImage::new(out_w, out_h);
    imageops::overlay(
        &mut expanded,
        image,
        ((out_w - image.width()) / 2) as i64,
        ((out_h - image.height()) / 2) as i64,
    );
    // imageproc rotates clockwise for positive angles
    rotate_about_center(&expanded, -theta, Interpolation::Bicubic, Rgba([0, 0, 0, 0]))
}

/// Soft drop shadow from the alpha channel, with `margin` px of room for the blur
fn drop_shadow(rotated: &RgbaImage, sigma: f32, margin: u32) -> RgbaImage {
    let (w, h) = (rotated.width() + margin * 2, rotated.height() + margin * 2);
    let mut mask = GrayImage::new(w, h);
    for (x, y, p) in rotated.enumerate_pixels() {
        let alpha = (p.0[3] as u32 * SHADOW_ALPHA as u32 / 255) as u8;
        mask.put_pixel(x + margin, y + margin, Luma([alpha]));
    }

    let small_w = (w / SHADOW_DOWNSCALE).max(1);
    let small_h = (h / SHADOW_DOWNSCALE).max(1);
    let small = imageops::resize(&mask, small_w, small_h, FilterType::Triangle);
    let blurred = gaussian_blur_f32(&small, (sigma / SHADOW_DOWNSCALE as f32).max(0.5));
    let mask = imageops::resize(&blurred, w, h, FilterType::Triangle);

    RgbaImage::from_fn(w, h, |x, y| Rgba([0, 0, 0, mask.get_pixel(x, y).0[0]]))
}

/// Draw one sample sheet (shadow, then the tilted paper) onto the cover
pub fn render_sheet(canvas: &mut RgbaImage, sheet: &SampleSheet, art: &DynamicImage, dpi: u32) {
    let dpi_scale = dpi as f64 / 300.0;
    let Some(paper) = paper_matte(art, sheet.rect.width, sheet.rect.height, dpi_scale) else {
        debug!(rect = ?sheet.rect, "sheet too small for its art, skipped");
        return;
    };
    let rotated = rotate_expanded(&paper, sheet.angle_deg);

    let blur = shadow_px(dpi);
    let margin = blur * 3;
    let shadow = drop_shadow(&rotated, blur as f32, margin);

    let x = sheet.rect.x as i64 - (rotated.width() as i64 - sheet.rect.width as i64) / 2;
    let y = sheet.rect.y as i64 - (rotated.height() as i64 - sheet.rect.height as i64) / 2;
    imageops::overlay(
        canvas,
        &shadow,
        x - margin as i64 + blur as i64,
        y - margin as i64 + blur as i64,
    );
    imageops::overlay(canvas, &rotated, x, y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedStream, SeededStream};
    use crate::sizing::{compute_canvas, compute_spine, PaperProfile, TrimSize};

    fn canvas(pages: u32) -> CanvasSpec {
        let layout = LayoutConfig::default();
        let spine = compute_spine(pages, PaperProfile::White, &layout).unwrap();
        compute_canvas(TrimSize::letter(), spine.width_in, layout.bleed_in, layout.dpi).unwrap()
    }

    fn pages(n: u64) -> Vec<InteriorPage> {
        (1..=n)
            .map(|i| InteriorPage {
                path: PathBuf::from(format!("/book/fbnp_{}.png", i)),
                number: i,
            })
            .collect()
    }

    #[test]
    fn test_sheet_count_clamps() {
        assert_eq!(sheet_count(4, 30), 4);
        assert_eq!(sheet_count(0, 30), 2);
        assert_eq!(sheet_count(9, 30), 5);
        assert_eq!(sheet_count(5, 3), 3);
        assert_eq!(sheet_count(5, 1), 1);
    }

    #[test]
    fn test_select_sources_from_leading_pool() {
        let layout = LayoutConfig::default();
        let mut rng = SeededStream::new(Some(42));
        let sources = select_sources(&pages(30), 5, &layout, &mut rng).unwrap();
        assert_eq!(sources.len(), 5);
        for source in &sources {
            let n = crate::pages::page_number(&source.file_name().unwrap().to_string_lossy()).unwrap();
            assert!(n <= 6, "page {} is outside the leading pool", n);
        }
        let mut unique = sources.clone();
        unique.dedup();
        assert_eq!(unique.len(), sources.len());
    }

    #[test]
    fn test_select_sources_none_available() {
        let layout = LayoutConfig::default();
        let mut rng = SeededStream::new(Some(1));
        let result = select_sources(&[], 4, &layout, &mut rng);
        assert!(matches!(result, Err(BuildError::Config(_))));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let layout = LayoutConfig::default();
        let canvas = canvas(30);
        let a = plan_sheets(&pages(12), 5, &canvas, &layout, &mut SeededStream::new(Some(42))).unwrap();
        let b = plan_sheets(&pages(12), 5, &canvas, &layout, &mut SeededStream::new(Some(42))).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_different_seed_different_layout() {
        let layout = LayoutConfig::default();
        let canvas = canvas(30);
        let a = plan_sheets(&pages(12), 5, &canvas, &layout, &mut SeededStream::new(Some(1))).unwrap();
        let b = plan_sheets(&pages(12), 5, &canvas, &layout, &mut SeededStream::new(Some(2))).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sheets_alternate_panels_and_stay_in_zones() {
        let layout = LayoutConfig::default();
        let canvas = canvas(120);
        let zones = sheet_zones(&canvas, &layout);

        for seed in 0..25 {
            let sheets =
                plan_sheets(&pages(8), 5, &canvas, &layout, &mut SeededStream::new(Some(seed))).unwrap();
            let front = sheets.iter().filter(|s| s.panel == Panel::Front).count();
            let back = sheets.iter().filter(|s| s.panel == Panel::Back).count();
            assert_eq!((front, back), (3, 2));

            for sheet in &sheets {
                let zone = match sheet.panel {
                    Panel::Front => zones.front,
                    Panel::Back => zones.back,
                };
                assert!(zone.contains(&sheet.rect), "{:?} outside {:?}", sheet.rect, zone);
                assert!(sheet.angle_deg.abs() <= 15.0);

                // Rotated outline and shadow stay in the zone too
                let (half_w, half_h) = rotated_half_extents(
                    sheet.rect.width as f64,
                    sheet.rect.height as f64,
                    sheet.angle_deg,
                );
                let reach = shadow_reach(canvas.dpi) as f64;
                let (cx, cy) = sheet.rect.center();
                assert!(cx - half_w - reach >= zone.x as f64 - 1.0);
                assert!(cx + half_w + reach <= zone.right() as f64 + 1.0);
                assert!(cy - half_h - reach >= zone.y as f64 - 1.0);
                assert!(cy + half_h + reach <= zone.bottom() as f64 + 1.0);
            }
        }
    }

    #[test]
    fn test_zones_avoid_text_areas() {
        let layout = LayoutConfig::default();
        let canvas = canvas(30);
        let zones = sheet_zones(&canvas, &layout);
        let front = canvas.front_panel();
        let back = canvas.back_panel();

        assert!(front.contains(&zones.front));
        assert!(back.contains(&zones.back));
        // Title band: 30% of 3300px
        assert!(zones.front.y >= front.y + 990);
        // Barcode row sits below the back zone
        let barcode_top = back.bottom() - layout.px(1.2 + 0.25);
        assert!(zones.back.bottom() <= barcode_top);
        assert!(zones.back.height > 0);
    }

    #[test]
    fn test_sheet_keeps_trim_aspect() {
        let layout = LayoutConfig {
            sheet_jitter: 0.0,
            ..Default::default()
        };
        let canvas = canvas(30);
        let sheets = place_sheets(
            vec![PathBuf::from("a.png")],
            &canvas,
            &layout,
            &mut ScriptedStream::default(),
        );
        let rect = sheets[0].rect;
        let aspect = rect.width as f64 / rect.height as f64;
        assert!((aspect - 8.5 / 11.0).abs() < 0.01);
        assert_eq!(sheets[0].angle_deg, -15.0);
    }

    #[test]
    fn test_rotated_half_extents() {
        let (w, h) = rotated_half_extents(100.0, 50.0, 0.0);
        assert!((w - 50.0).abs() < 1e-9 && (h - 25.0).abs() < 1e-9);
        let (w, h) = rotated_half_extents(100.0, 50.0, 90.0);
        assert!((w - 25.0).abs() < 1e-6 && (h - 50.0).abs() < 1e-6);
        assert_eq!(
            rotated_half_extents(80.0, 60.0, 12.0),
            rotated_half_extents(80.0, 60.0, -12.0)
        );
    }

    fn back_sheet(rect: PixelRect, angle_deg: f32) -> SampleSheet {
        SampleSheet {
            source: PathBuf::from("fbnp_1.png"),
            panel: Panel::Back,
            rect,
            angle_deg,
        }
    }

    #[test]
    fn test_sheet_footprint_includes_rotation_and_shadow() {
        let flat = sheet_footprint(&back_sheet(PixelRect::new(100, 100, 50, 50), 0.0), 300);
        assert_eq!(flat, PixelRect::new(52, 52, 146, 146));

        let tilted = sheet_footprint(&back_sheet(PixelRect::new(100, 100, 50, 50), 15.0), 300);
        assert!(tilted.contains(&flat));
        assert!(tilted.width > flat.width);
    }

    #[test]
    fn test_clear_below_moves_sheet_under_card() {
        let sheet = back_sheet(PixelRect::new(100, 100, 50, 50), 0.0);
        let card = PixelRect::new(0, 0, 300, 150);
        let zone = PixelRect::new(0, 0, 300, 400);

        let moved = clear_below(&sheet, &card, &zone, 300).unwrap();
        assert_eq!(moved.rect, PixelRect::new(100, 198, 50, 50));
        assert!(!sheet_footprint(&moved, 300).intersects(&card));
        assert!(zone.contains(&sheet_footprint(&moved, 300)));
    }

    #[test]
    fn test_clear_below_keeps_sheet_away_from_card() {
        let sheet = back_sheet(PixelRect::new(100, 100, 50, 50), 10.0);
        let card = PixelRect::new(260, 0, 40, 150);
        let zone = PixelRect::new(0, 0, 300, 400);
        assert_eq!(clear_below(&sheet, &card, &zone, 300), Some(sheet));
    }

    #[test]
    fn test_clear_below_drops_sheet_without_room() {
        let sheet = back_sheet(PixelRect::new(100, 100, 50, 50), 0.0);
        let card = PixelRect::new(0, 0, 300, 150);
        let zone = PixelRect::new(0, 0, 300, 250);
        assert!(clear_below(&sheet, &card, &zone, 300).is_none());
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within((1000, 2000), (500, 500)), (250, 500));
        assert_eq!(fit_within((100, 50), (400, 400)), (400, 200));
        assert_eq!(fit_within((0, 0), (10, 10)), (1, 1));
    }

    #[test]
    fn test_autocontrast() {
        let mut gray = GrayImage::from_fn(4, 1, |x, _| Luma([100 + x as u8 * 10]));
        autocontrast(&mut gray);
        assert_eq!(gray.get_pixel(0, 0).0[0], 0);
        assert_eq!(gray.get_pixel(3, 0).0[0], 255);

        let mut flat = GrayImage::from_pixel(3, 3, Luma([77]));
        autocontrast(&mut flat);
        assert_eq!(flat.get_pixel(1, 1).0[0], 77);
    }

    #[test]
    fn test_rotate_expanded_grows() {
        let image = RgbaImage::from_pixel(100, 200, Rgba([255, 255, 255, 255]));
        let same = rotate_expanded(&image, 0.0);
        assert_eq!(same.dimensions(), (100, 200));

        let tilted = rotate_expanded(&image, 15.0);
        assert!(tilted.width() > 100);
        assert!(tilted.height() >= 200);
        // Corners are transparent after rotation
        assert_eq!(tilted.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_render_sheet_draws_paper_and_shadow() {
        let mut cover = RgbaImage::from_pixel(800, 800, Rgba([100, 150, 200, 255]));
        let art = DynamicImage::ImageLuma8(GrayImage::from_fn(300, 400, |x, y| {
            if (x / 20 + y / 20) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        }));
        let sheet = SampleSheet {
            source: PathBuf::from("fbnp_1.png"),
            panel: Panel::Front,
            rect: PixelRect::new(200, 150, 300, 400),
            angle_deg: 8.0,
        };
        render_sheet(&mut cover, &sheet, &art, 300);

        // Paper edge area near the centre-top is white-ish
        let top_mid = cover.get_pixel(350, 170).0;
        assert!(top_mid[0] > 200 && top_mid[1] > 200 && top_mid[2] > 200);
        // Far corner untouched
        assert_eq!(cover.get_pixel(5, 5).0, [100, 150, 200, 255]);
    }

    #[test]
    fn test_render_sheet_too_small_is_skipped() {
        let mut cover = RgbaImage::from_pixel(100, 100, Rgba([1, 2, 3, 255]));
        let art = DynamicImage::ImageLuma8(GrayImage::new(10, 10));
        let sheet = SampleSheet {
            source: PathBuf::from("fbnp_1.png"),
            panel: Panel::Back,
            rect: PixelRect::new(10, 10, 30, 30),
            angle_deg: 0.0,
        };
        render_sheet(&mut cover, &sheet, &art, 300);
        assert!(cover.pixels().all(|p| p.0 == [1, 2, 3, 255]));
    }
}

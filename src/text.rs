//! Text measuring, fitting, wrapping and drawing on RGBA canvases

use ab_glyph::{Font, PxScale, ScaleFont};
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use imageproc::filter::gaussian_blur_f32;

/// Horizontal alignment of lines inside a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// Pixel size of a single line of text
pub fn measure<F: Font>(font: &F, px: f32, text: &str) -> (u32, u32) {
    text_size(PxScale::from(px), font, text)
}

/// Baseline-to-baseline advance for a font size
pub fn line_height<F: Font>(font: &F, px: f32) -> u32 {
    let scaled = font.as_scaled(PxScale::from(px));
    (scaled.height() + scaled.line_gap()).ceil().max(1.0) as u32
}

/// Greedy word wrap; a single word wider than `max_width` gets a line of its own
pub fn wrap_text<F: Font>(font: &F, px: f32, text: &str, max_width: u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        line.push(word);
        let candidate = line.join(" ");
        if measure(font, px, &candidate).0 > max_width && line.len() > 1 {
            line.pop();
            lines.push(line.join(" "));
            line = vec![word];
        }
    }
    if !line.is_empty() {
        lines.push(line.join(" "));
    }
    lines
}

/// Size of a block of lines separated by `spacing` extra pixels
pub fn block_size<F: Font>(font: &F, px: f32, lines: &[String], spacing: u32) -> (u32, u32) {
    if lines.is_empty() {
        return (0, 0);
    }
    let width = lines
        .iter()
        .map(|l| measure(font, px, l).0)
        .max()
        .unwrap_or(0);
    let advance = line_height(font, px) + spacing;
    let height = advance * (lines.len() as u32 - 1) + line_height(font, px);
    (width, height)
}

/// Result of fitting a title into a width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleFit {
    pub size_px: u32,
    pub lines: Vec<String>,
}

/// Parameters for [`fit_title`]
#[derive(Debug, Clone, Copy)]
pub struct FitRange {
    pub max_px: u32,
    pub min_px: u32,
    pub step_px: u32,
    pub max_lines: usize,
}

/// Largest size at which `text` fits `max_width` in at most `max_lines` lines
///
/// Falls back to the minimum size, wrapped into as many lines as needed.
pub fn fit_title<F: Font>(font: &F, text: &str, max_width: u32, range: FitRange) -> TitleFit {
    let step = range.step_px.max(1);
    let mut size = range.max_px;

    while size >= range.min_px {
        let lines = wrap_text(font, size as f32, text, max_width);
        let fits = lines.len() <= range.max_lines.max(1)
            && lines
                .iter()
                .all(|l| measure(font, size as f32, l).0 <= max_width);
        if fits {
            return TitleFit { size_px: size, lines };
        }
        if size < range.min_px + step {
            break;
        }
        size -= step;
    }

    TitleFit {
        size_px: range.min_px,
        lines: wrap_text(font, range.min_px as f32, text, max_width),
    }
}

/// Draw lines top-down starting at `origin`; centred lines use `block_width`
#[allow(clippy::too_many_arguments)]
pub fn draw_block<F: Font>(
    canvas: &mut RgbaImage,
    font: &F,
    px: f32,
    lines: &[String],
    origin: (i32, i32),
    block_width: u32,
    align: Align,
    spacing: u32,
    color: Rgba<u8>,
) {
    let advance = (line_height(font, px) + spacing) as i32;
    for (i, line) in lines.iter().enumerate() {
        let x = match align {
            Align::Left => origin.0,
            Align::Center => {
                let w = measure(font, px, line).0 as i32;
                origin.0 + (block_width as i32 - w) / 2
            }
        };
        let y = origin.1 + advance * i as i32;
        draw_text_mut(canvas, color, x, y, PxScale::from(px), font, line);
    }
}

/// Shadow settings for [`draw_block_with_shadow`]
#[derive(Debug, Clone, Copy)]
pub struct Shadow {
    pub color: Rgba<u8>,
    pub offset: (i32, i32),
    pub blur_sigma: f32,
}

/// Draw a blurred shadow copy of the block first, then the block itself
#[allow(clippy::too_many_arguments)]
pub fn draw_block_with_shadow<F: Font>(
    canvas: &mut RgbaImage,
    font: &F,
    px: f32,
    lines: &[String],
    origin: (i32, i32),
    block_width: u32,
    align: Align,
    spacing: u32,
    fill: Rgba<u8>,
    shadow: Shadow,
) {
    let (_, block_h) = block_size(font, px, lines, spacing);
    let pad = (shadow.blur_sigma * 3.0).ceil() as u32 + 2;
    let mut layer = RgbaImage::new(block_width + pad * 2, block_h + pad * 2);
    draw_block(
        &mut layer,
        font,
        px,
        lines,
        (pad as i32, pad as i32),
        block_width,
        align,
        spacing,
        shadow.color,
    );
    if shadow.blur_sigma > 0.0 {
        layer = gaussian_blur_f32(&layer, shadow.blur_sigma);
    }
    imageops::overlay(
        canvas,
        &layer,
        (origin.0 - pad as i32 + shadow.offset.0) as i64,
        (origin.1 - pad as i32 + shadow.offset.1) as i64,
    );

    draw_block(
        canvas,
        font,
        px,
        lines,
        origin,
        block_width,
        align,
        spacing,
        fill,
    );
}

/// Render a single line onto a transparent layer sized to the text
pub fn render_line<F: Font>(font: &F, px: f32, text: &str, color: Rgba<u8>) -> RgbaImage {
    let (w, _) = measure(font, px, text);
    let h = line_height(font, px);
    let mut layer = RgbaImage::new(w.max(1), h.max(1));
    draw_text_mut(&mut layer, color, 0, 0, PxScale::from(px), font, text);
    layer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::fonts::FontChain;

    fn test_font() -> Option<ab_glyph::FontVec> {
        let layout = LayoutConfig::default();
        let chain = FontChain::from_paths(&layout.title_fonts).then(FontChain::from_paths(&layout.text_fonts));
        match chain.resolve("test") {
            Ok(loaded) => Some(loaded.font),
            Err(e) => {
                eprintln!("Skipping text test, no font: {}", e);
                None
            }
        }
    }

    #[test]
    fn test_wrap_respects_width() {
        let Some(font) = test_font() else { return };
        let text = "Includes 30 fun illustrations. Stomp into a world of friendly dinos!";
        let lines = wrap_text(&font, 40.0, text, 400);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(measure(&font, 40.0, line).0 <= 400, "line too wide: {}", line);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_empty_text() {
        let Some(font) = test_font() else { return };
        assert!(wrap_text(&font, 40.0, "   ", 400).is_empty());
    }

    #[test]
    fn test_wrap_long_word_gets_own_line() {
        let Some(font) = test_font() else { return };
        let lines = wrap_text(&font, 40.0, "a Supercalifragilisticexpialidocious b", 50);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "Supercalifragilisticexpialidocious");
    }

    #[test]
    fn test_fit_title_prefers_largest_size() {
        let Some(font) = test_font() else { return };
        let range = FitRange {
            max_px: 150,
            min_px: 24,
            step_px: 4,
            max_lines: 2,
        };
        let short = fit_title(&font, "Dinos", 2000, range);
        assert_eq!(short.size_px, 150);
        assert_eq!(short.lines, vec!["Dinos".to_string()]);

        let long = fit_title(&font, "Cute Dinosaurs Coloring Book for Kids", 900, range);
        assert!(long.size_px < 150);
        assert!(long.lines.len() <= 2);
        for line in &long.lines {
            assert!(measure(&font, long.size_px as f32, line).0 <= 900);
        }
    }

    #[test]
    fn test_fit_title_falls_back_to_minimum() {
        let Some(font) = test_font() else { return };
        let range = FitRange {
            max_px: 60,
            min_px: 24,
            step_px: 4,
            max_lines: 1,
        };
        let fit = fit_title(&font, "A very long title that cannot fit on one line", 100, range);
        assert_eq!(fit.size_px, 24);
        assert!(fit.lines.len() > 1);
    }

    #[test]
    fn test_block_size_grows_with_lines() {
        let Some(font) = test_font() else { return };
        let one = block_size(&font, 40.0, &["Hello".to_string()], 10);
        let two = block_size(&font, 40.0, &["Hello".to_string(), "World".to_string()], 10);
        assert!(two.1 > one.1);
        assert_eq!(block_size(&font, 40.0, &[], 10), (0, 0));
    }

    #[test]
    fn test_draw_block_marks_canvas() {
        let Some(font) = test_font() else { return };
        let mut canvas = RgbaImage::from_pixel(400, 200, Rgba([255, 255, 255, 255]));
        draw_block(
            &mut canvas,
            &font,
            48.0,
            &["Hi".to_string()],
            (10, 10),
            380,
            Align::Center,
            0,
            Rgba([0, 0, 0, 255]),
        );
        let dark = canvas.pixels().filter(|p| p.0[0] < 128).count();
        assert!(dark > 0);
    }

    #[test]
    fn test_render_line_transparent_background() {
        let Some(font) = test_font() else { return };
        let layer = render_line(&font, 40.0, "Spine", Rgba([30, 30, 30, 255]));
        assert!(layer.width() > 0);
        assert!(layer.pixels().any(|p| p.0[3] > 0));
        assert!(layer.pixels().any(|p| p.0[3] == 0));
    }
}

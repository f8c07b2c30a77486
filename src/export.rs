//! PDF export and inspection
//!
//! Native export embeds each raster as a full-bleed JPEG image on a page
//! sized to the raster at the given DPI. When ImageMagick is installed the
//! cover PDF can be produced by `magick` instead; any failure there falls back
//! to the native bytes.

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use lopdf::{Document, Object};
use printpdf::{
    ColorBits, ColorSpace, Image, ImageFilter, ImageTransform, ImageXObject, Mm, PdfDocument,
    PdfDocumentReference, Px,
};
use serde::Serialize;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

use crate::error::{BuildError, Result};

/// JPEG quality for embedded page images
const JPEG_QUALITY: u8 = 95;

const MM_PER_INCH: f32 = 25.4;

/// PDF points per inch
pub const POINTS_PER_INCH: f32 = 72.0;

// ============================================================
// Native export
// ============================================================

fn encode_jpeg(page: &RgbImage) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY).encode_image(page)?;
    Ok(data)
}

fn pdf_image(page: &RgbImage) -> Result<Image> {
    Ok(Image::from(ImageXObject {
        width: Px(page.width() as usize),
        height: Px(page.height() as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: encode_jpeg(page)?,
        image_filter: Some(ImageFilter::DCT),
        clipping_bbox: None,
        smask: None,
    }))
}

/// Page size in millimetres for a raster at `dpi`
pub fn page_size_mm(width_px: u32, height_px: u32, dpi: u32) -> (f32, f32) {
    let dpi = dpi.max(1) as f32;
    (
        width_px as f32 / dpi * MM_PER_INCH,
        height_px as f32 / dpi * MM_PER_INCH,
    )
}

/// Builds a raster PDF one page at a time, so callers never hold every page
pub struct PdfRasterWriter {
    title: String,
    doc: Option<PdfDocumentReference>,
    pages: usize,
}

impl PdfRasterWriter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            doc: None,
            pages: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// Append a page sized to `page` at `dpi`
    pub fn add_page(&mut self, page: &RgbImage, dpi: u32) -> Result<()> {
        if dpi == 0 {
            return Err(BuildError::config("dpi must be greater than zero"));
        }
        let (w, h) = page_size_mm(page.width(), page.height(), dpi);
        let layer = match &self.doc {
            None => {
                let (doc, page_idx, layer_idx) =
                    PdfDocument::new(self.title.clone(), Mm(w), Mm(h), "Layer 1");
                let layer = doc.get_page(page_idx).get_layer(layer_idx);
                self.doc = Some(doc);
                layer
            }
            Some(doc) => {
                let (page_idx, layer_idx) = doc.add_page(Mm(w), Mm(h), "Layer 1");
                doc.get_page(page_idx).get_layer(layer_idx)
            }
        };
        let transform = ImageTransform {
            dpi: Some(dpi as f32),
            ..Default::default()
        };
        pdf_image(page)?.add_to_layer(layer, transform);
        self.pages += 1;
        Ok(())
    }

    /// Serialize the document
    pub fn finish(self) -> Result<Vec<u8>> {
        let Some(doc) = self.doc else {
            return Err(BuildError::config("cannot write a PDF without pages"));
        };
        let mut writer = BufWriter::new(Vec::new());
        doc.save(&mut writer)
            .map_err(|e| BuildError::Pdf(e.to_string()))?;
        let bytes = writer
            .into_inner()
            .map_err(|e| BuildError::Pdf(e.to_string()))?;
        debug!(pages = self.pages, bytes = bytes.len(), "encoded PDF");
        Ok(bytes)
    }
}

/// One PDF page per raster, each page exactly the raster's physical size
pub fn raster_pages_to_pdf(title: &str, pages: &[RgbImage], dpi: u32) -> Result<Vec<u8>> {
    let mut writer = PdfRasterWriter::new(title);
    for page in pages {
        writer.add_page(page, dpi)?;
    }
    writer.finish()
}

// ============================================================
// ImageMagick
// ============================================================

/// How a PDF ended up on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfRoute {
    Magick,
    Native,
}

/// `magick` found on `PATH`
#[derive(Debug, Clone)]
pub struct MagickConverter {
    program: PathBuf,
}

impl MagickConverter {
    pub const PROGRAM: &'static str = "magick";

    /// Look up `magick` on `PATH`
    pub fn detect() -> Option<Self> {
        which::which(Self::PROGRAM)
            .ok()
            .map(|program| Self { program })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Version reported by `magick --version`, if it runs
    pub fn version(&self) -> Option<String> {
        let output = Command::new(&self.program).arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }
        parse_magick_version(&String::from_utf8_lossy(&output.stdout))
    }

    /// `magick <png> -units PixelsPerInch -density <dpi> <pdf>`
    pub fn convert(&self, png: &Path, pdf: &Path, dpi: u32) -> Result<()> {
        let output = Command::new(&self.program)
            .arg(png)
            .args(["-units", "PixelsPerInch", "-density", &dpi.to_string()])
            .arg(pdf)
            .output()?;
        if !output.status.success() {
            return Err(BuildError::Resource(format!(
                "magick exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if !pdf.is_file() {
            return Err(BuildError::Resource(format!(
                "magick did not produce {}",
                pdf.display()
            )));
        }
        Ok(())
    }
}

/// `7.1.1-29` from `Version: ImageMagick 7.1.1-29 Q16-HDRI ...`
fn parse_magick_version(stdout: &str) -> Option<String> {
    let first = stdout.lines().next()?.trim();
    let rest = first.strip_prefix("Version:").unwrap_or(first).trim();
    let rest = rest.strip_prefix("ImageMagick").unwrap_or(rest).trim();
    rest.split_whitespace().next().map(str::to_string)
}

/// Convert with `magick` when given, otherwise (or on failure) write `native`
pub fn convert_or_fallback(
    magick: Option<&MagickConverter>,
    png: &Path,
    pdf: &Path,
    dpi: u32,
    native: &[u8],
) -> Result<PdfRoute> {
    if let Some(converter) = magick {
        match converter.convert(png, pdf, dpi) {
            Ok(()) => {
                debug!(pdf = %pdf.display(), "PDF written by magick");
                return Ok(PdfRoute::Magick);
            }
            Err(e) => warn!(error = %e, "magick conversion failed, using native PDF export"),
        }
    }
    std::fs::write(pdf, native)?;
    Ok(PdfRoute::Native)
}

// ============================================================
// Inspection
// ============================================================

/// Page count and page boxes of a PDF on disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfSummary {
    pub page_count: usize,
    /// `[x0, y0, x1, y1]` in points, per page that declares one
    pub media_boxes: Vec<[f32; 4]>,
}

impl PdfSummary {
    /// Size of the first page in inches
    pub fn first_page_in(&self) -> Option<(f32, f32)> {
        self.media_boxes.first().map(|b| {
            (
                (b[2] - b[0]) / POINTS_PER_INCH,
                (b[3] - b[1]) / POINTS_PER_INCH,
            )
        })
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn media_box(doc: &Document, page_id: lopdf::ObjectId) -> Option<[f32; 4]> {
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let values = page.get(b"MediaBox").ok()?.as_array().ok()?;
    if values.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = number(value)?;
    }
    Some(out)
}

/// Read a PDF back and summarise it
pub fn inspect_pdf(path: &Path) -> Result<PdfSummary> {
    let doc = Document::load(path)
        .map_err(|e| BuildError::Pdf(format!("{}: {}", path.display(), e)))?;
    let pages = doc.get_pages();
    let media_boxes = pages
        .values()
        .filter_map(|id| media_box(&doc, *id))
        .collect();
    Ok(PdfSummary {
        page_count: pages.len(),
        media_boxes,
    })
}

//! Cover background parsing and painting
//!
//! Accepted forms:
//!
//! - `#RRGGBB` or `RRGGBB` for a solid fill
//! - `gradient:<preset>:<variant>` for a vertical two-stop gradient; the
//!   variant index is clamped into the preset's range

use image::{Rgba, RgbaImage};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::config::LayoutConfig;
use crate::error::{BuildError, Result};

/// Opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const WHITE: Color = Color([255, 255, 255]);

    pub fn rgba(&self, alpha: u8) -> Rgba<u8> {
        Rgba([self.0[0], self.0[1], self.0[2], alpha])
    }

    /// Linear blend; `t` = 0 gives `self`, 1 gives `other`
    pub fn lerp(&self, other: &Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color([
            mix(self.0[0], other.0[0]),
            mix(self.0[1], other.0[1]),
            mix(self.0[2], other.0[2]),
        ])
    }
}

impl FromStr for Color {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BuildError::config(format!(
                "color must look like '#RRGGBB', got '{s}'"
            )));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Color([r, g, b])),
            _ => Err(BuildError::config(format!("invalid color '{s}'"))),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

/// Background request as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundSpec {
    Solid(Color),
    Gradient { preset: String, variant: i64 },
}

impl Default for BackgroundSpec {
    fn default() -> Self {
        BackgroundSpec::Gradient {
            preset: "pastel".to_string(),
            variant: 1,
        }
    }
}

impl FromStr for BackgroundSpec {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix("gradient:") {
            let (preset, variant) = match rest.split_once(':') {
                Some((preset, variant)) => {
                    let variant = variant.trim().parse::<i64>().map_err(|_| {
                        BuildError::config(format!("gradient variant must be an integer, got '{variant}'"))
                    })?;
                    (preset, variant)
                }
                None => (rest, 0),
            };
            if preset.trim().is_empty() {
                return Err(BuildError::config("gradient preset name is empty"));
            }
            return Ok(BackgroundSpec::Gradient {
                preset: preset.trim().to_string(),
                variant,
            });
        }
        Ok(BackgroundSpec::Solid(s.parse()?))
    }
}

impl fmt::Display for BackgroundSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackgroundSpec::Solid(color) => write!(f, "{color}"),
            BackgroundSpec::Gradient { preset, variant } => {
                write!(f, "gradient:{preset}:{variant}")
            }
        }
    }
}

/// Background with preset names resolved to colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Solid(Color),
    Vertical { top: Color, bottom: Color },
}

impl BackgroundSpec {
    /// Resolve preset names against the layout's gradient table
    pub fn resolve(&self, layout: &LayoutConfig) -> Result<Background> {
        match self {
            BackgroundSpec::Solid(color) => Ok(Background::Solid(*color)),
            BackgroundSpec::Gradient { preset, variant } => {
                let found = layout.gradient(preset).ok_or_else(|| {
                    let known: Vec<&str> = layout.gradients.iter().map(|g| g.name.as_str()).collect();
                    BuildError::config(format!(
                        "unknown gradient preset '{}' (known: {})",
                        preset,
                        known.join(", ")
                    ))
                })?;
                if found.variants.is_empty() {
                    return Err(BuildError::config(format!(
                        "gradient preset '{preset}' has no variants"
                    )));
                }
                let max = found.variants.len() as i64 - 1;
                let index = (*variant).clamp(0, max);
                if index != *variant {
                    warn!(preset = %preset, requested = variant, used = index, "gradient variant clamped");
                }
                let (top, bottom) = &found.variants[index as usize];
                Ok(Background::Vertical {
                    top: top.parse()?,
                    bottom: bottom.parse()?,
                })
            }
        }
    }
}

impl Background {
    /// Fill a canvas with this background
    pub fn paint(&self, canvas: &mut RgbaImage) {
        match self {
            Background::Solid(color) => {
                let px = color.rgba(255);
                for pixel in canvas.pixels_mut() {
                    *pixel = px;
                }
            }
            Background::Vertical { top, bottom } => {
                let height = canvas.height();
                let span = height.saturating_sub(1).max(1) as f64;
                for y in 0..height {
                    let px = top.lerp(bottom, y as f64 / span).rgba(255);
                    for x in 0..canvas.width() {
                        canvas.put_pixel(x, y, px);
                    }
                }
            }
        }
    }
}

//! Hex colour parsing and the small amount of colour math the gradients need.

use image::Rgba;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid colour {0:?}: expected #rrggbb")]
pub struct ColorParseError(pub String);

/// An opaque 8-bit sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const WHITE: Rgb8 = Rgb8::new(255, 255, 255);
    pub const BLACK: Rgb8 = Rgb8::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn parse_hex(value: &str) -> Result<Self, ColorParseError> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError(value.to_string()));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Self::new(r, g, b)),
            _ => Err(ColorParseError(value.to_string())),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation towards `other`; `t` is clamped to `[0, 1]`.
    pub fn mix(self, other: Rgb8, t: f32) -> Rgb8 {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb8::new(lerp(self.r, other.r), lerp(self.g, other.g), lerp(self.b, other.b))
    }

    /// Lighten towards white by `amount`.
    pub fn lighten(self, amount: f32) -> Rgb8 {
        self.mix(Rgb8::WHITE, amount)
    }

    /// This colour with an alpha in `[0, 1]`.
    pub fn with_alpha(self, alpha: f32) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
    }

    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Source-over blend of `src` (with its alpha scaled by `coverage`) onto an opaque pixel.
pub fn blend_over(dst: [u8; 3], src: Rgba<u8>, coverage: f32) -> [u8; 3] {
    let a = (src.0[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    let mut out = [0u8; 3];
    for i in 0..3 {
        let value = src.0[i] as f32 * a + dst[i] as f32 * (1.0 - a);
        out[i] = value.round().clamp(0.0, 255.0) as u8;
    }
    out
}

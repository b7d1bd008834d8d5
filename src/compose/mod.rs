//! Final share image composition.
//!
//! Layers, bottom to top:
//!
//! ```text
//! background   cover-resized to the output size, anchored East
//! overlay      radial legibility gradient from the top-left corner
//! text layer   title (shadow pass + main pass), series badge, branding
//! ```
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │  Title line one                            │
//! │  title line two            (illustration)  │
//! │                                            │
//! │  (Series)  Brand                           │
//! └────────────────────────────────────────────┘
//! ```
//!
//! The result is flattened to RGB, encoded as JPEG, and written atomically.

pub mod overlay;
pub mod text;

use crate::config::{BrandPalette, ConfigError, LayoutConfig, PipelineConfig, Series};
use crate::imaging::{self, ImagingError, Quality, Rgb8, SUBJECT_GRAVITY};
use crate::types::ContentItem;
use image::{DynamicImage, Rgba, RgbaImage, RgbImage, imageops};
use std::path::Path;
use text::{GLYPH_SIZE, char_budget, draw_text, text_width, wrap_text};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CompositeError {
    #[error("invalid brand colours: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Imaging(#[from] ImagingError),
}

/// Title lines and the glyph scale they were fitted at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleLayout {
    pub lines: Vec<String>,
    pub scale: u32,
}

/// Fit `title` into `width_px`, shrinking from `max_scale` until it takes at
/// most `max_lines` lines.
///
/// At scale 1 the wrapped lines are kept even if there are too many; they
/// overflow the canvas bottom rather than being dropped.
pub fn fit_title(title: &str, width_px: u32, max_scale: u32, max_lines: usize) -> TitleLayout {
    let mut scale = max_scale.max(1);
    loop {
        let lines = wrap_text(title, char_budget(width_px, GLYPH_SIZE * scale));
        if lines.len() <= max_lines || scale == 1 {
            return TitleLayout { lines, scale };
        }
        scale -= 1;
    }
}

/// Renders share images for one configuration.
#[derive(Debug, Clone)]
pub struct Compositor {
    size: (u32, u32),
    quality: Quality,
    layout: LayoutConfig,
    brand_text: String,
    brand: BrandPalette,
}

impl Compositor {
    pub fn new(config: &PipelineConfig) -> Result<Self, CompositeError> {
        Ok(Self {
            size: config.output_size(),
            quality: config.quality(),
            layout: config.layout.clone(),
            brand_text: config.brand.text.clone(),
            brand: config.brand_palette()?,
        })
    }

    /// Compose and write the final image for `item` to `output_path`.
    ///
    /// Parent directories are created and an existing file is replaced.
    pub fn render(
        &self,
        background: &RgbImage,
        item: &ContentItem,
        series: &Series,
        output_path: &Path,
    ) -> Result<(), CompositeError> {
        let image = self.compose(background, &item.title, series);
        let bytes = imaging::encode_jpeg(&image, self.quality)?;
        imaging::write_atomic(output_path, &bytes)?;
        debug!(item = %item, file = %output_path.display(), bytes = bytes.len(), "wrote share image");
        Ok(())
    }

    /// Compose in memory.
    pub fn compose(&self, background: &RgbImage, title: &str, series: &Series) -> RgbImage {
        let (width, height) = self.size;
        let mut base = if background.dimensions() == self.size {
            background.clone()
        } else {
            imaging::resize_cover(background, self.size, SUBJECT_GRAVITY)
        };
        overlay::apply_overlay(&mut base, &self.brand, series.palette.accent);

        let mut layer = RgbaImage::new(width, height);
        let margin = (width as f32 * self.layout.margin_fraction).round() as i64;
        self.draw_title(&mut layer, title, margin);
        self.draw_footer(&mut layer, series, margin);

        let mut flattened = DynamicImage::ImageRgb8(base).to_rgba8();
        imageops::overlay(&mut flattened, &layer, 0, 0);
        DynamicImage::ImageRgba8(flattened).to_rgb8()
    }

    fn draw_title(&self, layer: &mut RgbaImage, title: &str, margin: i64) {
        let (width, height) = self.size;
        let text_px = (width as f32 * self.layout.text_width_fraction) as u32;
        let max_scale = (height as f32 * self.layout.title_size_fraction / GLYPH_SIZE as f32) as u32;
        let fitted = fit_title(title, text_px, max_scale, self.layout.max_title_lines);

        let scale = fitted.scale;
        let line_height = (GLYPH_SIZE * scale + 2 * scale) as i64;
        let shadow_offset = (scale as i64 / 3).max(1);
        let shadow = self.brand.shadow.with_alpha(0.85);
        let ink = self.brand.text.with_alpha(1.0);

        for (index, line) in fitted.lines.iter().enumerate() {
            let y = margin + index as i64 * line_height;
            draw_text(layer, line, (margin + shadow_offset, y + shadow_offset), scale, shadow);
            draw_text(layer, line, (margin, y), scale, ink);
        }
    }

    /// Series badge and branding string along the bottom-left edge.
    fn draw_footer(&self, layer: &mut RgbaImage, series: &Series, margin: i64) {
        let (_, height) = self.size;
        let scale = ((height as f32 * self.layout.title_size_fraction / GLYPH_SIZE as f32) as u32 / 3).max(1);
        let pad = (3 * scale) as i64;
        let glyph = (GLYPH_SIZE * scale) as i64;

        let badge_w = text_width(&series.label, scale) as i64 + 4 * pad;
        let badge_h = glyph + 2 * pad;
        let badge_y = height as i64 - margin - badge_h;
        fill_pill(layer, (margin, badge_y), (badge_w, badge_h), series.palette.accent.with_alpha(1.0));
        draw_text(
            layer,
            &series.label,
            (margin + 2 * pad, badge_y + pad),
            scale,
            Rgb8::WHITE.with_alpha(1.0),
        );

        if !self.brand_text.is_empty() {
            draw_text(
                layer,
                &self.brand_text,
                (margin + badge_w + 3 * pad, badge_y + pad),
                scale,
                self.brand.text.with_alpha(1.0),
            );
        }
    }
}

/// Fill a fully rounded rectangle (semicircular ends).
fn fill_pill(layer: &mut RgbaImage, origin: (i64, i64), size: (i64, i64), color: Rgba<u8>) {
    let (w, h) = (size.0.max(1), size.1.max(1));
    let radius = h.min(w) as f32 / 2.0;
    let center_y = origin.1 as f32 + h as f32 / 2.0;
    let left = origin.0 as f32 + radius;
    let right = (origin.0 + w) as f32 - radius;

    let y_range = origin.1.max(0)..(origin.1 + h).min(layer.height() as i64);
    let x_range = origin.0.max(0)..(origin.0 + w).min(layer.width() as i64);
    for y in y_range {
        for x in x_range.clone() {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let dx = px - px.clamp(left, right.max(left));
            let dy = py - center_y;
            if dx * dx + dy * dy <= radius * radius {
                layer.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

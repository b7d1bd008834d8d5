//! Procedural backgrounds for when generation is unavailable.
//!
//! A diagonal two-stop gradient from the series' primary to secondary colour,
//! lifted by two soft radial highlights on the illustration side. Pure
//! function of size and palette; cannot fail.

use crate::config::SeriesPalette;
use crate::imaging::{Rgb8, blend_over};
use image::{Rgb, RgbImage};

/// A soft circular highlight, positioned in canvas fractions.
struct Highlight {
    center: (f32, f32),
    /// Radius as a fraction of the canvas width.
    radius: f32,
    alpha: f32,
}

const HIGHLIGHTS: [Highlight; 2] = [
    Highlight {
        center: (0.78, 0.30),
        radius: 0.35,
        alpha: 0.16,
    },
    Highlight {
        center: (0.90, 0.85),
        radius: 0.25,
        alpha: 0.12,
    },
];

/// Render the fallback background at `width`×`height`.
pub fn render_fallback(width: u32, height: u32, palette: &SeriesPalette) -> RgbImage {
    let width = width.max(1);
    let height = height.max(1);
    let highlight_colors = [Rgb8::WHITE, palette.secondary.lighten(0.5)];

    RgbImage::from_fn(width, height, |x, y| {
        let fx = x as f32 / (width - 1).max(1) as f32;
        let fy = y as f32 / (height - 1).max(1) as f32;
        let mut px = palette.primary.mix(palette.secondary, (fx + fy) / 2.0).channels();

        for (highlight, color) in HIGHLIGHTS.iter().zip(highlight_colors) {
            let dx = (x as f32 - highlight.center.0 * width as f32) / width as f32;
            let dy = (y as f32 - highlight.center.1 * height as f32) / width as f32;
            let distance = (dx * dx + dy * dy).sqrt() / highlight.radius;
            if distance < 1.0 {
                let falloff = (1.0 - distance).powi(2);
                px = blend_over(px, color.with_alpha(highlight.alpha), falloff);
            }
        }
        Rgb(px)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::sample_series;

    #[test]
    fn fallback_has_requested_dimensions() {
        let img = render_fallback(240, 126, &sample_series().palette);
        assert_eq!(img.dimensions(), (240, 126));
    }

    #[test]
    fn fallback_is_deterministic() {
        let palette = sample_series().palette;
        assert_eq!(render_fallback(64, 32, &palette), render_fallback(64, 32, &palette));
    }

    #[test]
    fn fallback_corners_follow_gradient() {
        let palette = sample_series().palette;
        let img = render_fallback(200, 100, &palette);

        // Top-left is outside both highlights: exactly the primary colour
        assert_eq!(img.get_pixel(0, 0).0, palette.primary.channels());

        // Bottom-left sits halfway along the diagonal, away from highlights
        let mid = palette.primary.mix(palette.secondary, 0.5).channels();
        assert_eq!(img.get_pixel(0, 99).0, mid);
    }

    #[test]
    fn fallback_highlight_brightens_illustration_side() {
        let palette = sample_series().palette;
        let img = render_fallback(200, 100, &palette);
        let base = palette
            .primary
            .mix(palette.secondary, (156.0 / 199.0 + 30.0 / 99.0) / 2.0);
        let lit = img.get_pixel(156, 30).0;
        let sum = |c: [u8; 3]| c.iter().map(|&v| v as u32).sum::<u32>();
        assert!(sum(lit) > sum(base.channels()));
    }

    #[test]
    fn fallback_tiny_canvas_does_not_panic() {
        let img = render_fallback(1, 1, &sample_series().palette);
        assert_eq!(img.dimensions(), (1, 1));
        assert_eq!(render_fallback(0, 0, &sample_series().palette).dimensions(), (1, 1));
    }
}

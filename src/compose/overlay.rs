//! Legibility overlay.
//!
//! A radial gradient centred on the top-left corner where the title sits. It
//! starts as a strong light tint so dark text always reads, passes through
//! the series accent, and ends in a dark tint at the far corner that grounds
//! the illustration.

use crate::config::BrandPalette;
use crate::imaging::{Rgb8, blend_over};
use image::RgbImage;

/// One colour stop: position along the radius in `[0, 1]`, colour, opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub position: f32,
    pub color: Rgb8,
    pub alpha: f32,
}

/// Overlay stops for a brand palette and series accent.
pub fn overlay_stops(brand: &BrandPalette, accent: Rgb8) -> [GradientStop; 4] {
    [
        GradientStop {
            position: 0.0,
            color: brand.light_tint,
            alpha: 0.92,
        },
        GradientStop {
            position: 0.35,
            color: brand.light_tint,
            alpha: 0.78,
        },
        GradientStop {
            position: 0.7,
            color: accent,
            alpha: 0.28,
        },
        GradientStop {
            position: 1.0,
            color: brand.dark_tint,
            alpha: 0.5,
        },
    ]
}

/// Colour and opacity at `t` along sorted `stops`. Clamped at both ends.
pub fn sample_stops(stops: &[GradientStop], t: f32) -> (Rgb8, f32) {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return (Rgb8::BLACK, 0.0);
    };
    if t <= first.position {
        return (first.color, first.alpha);
    }
    if t >= last.position {
        return (last.color, last.alpha);
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.position {
            let span = (b.position - a.position).max(f32::EPSILON);
            let local = (t - a.position) / span;
            return (
                a.color.mix(b.color, local),
                a.alpha + (b.alpha - a.alpha) * local,
            );
        }
    }
    (last.color, last.alpha)
}

/// Blend the overlay onto `image` in place.
pub fn apply_overlay(image: &mut RgbImage, brand: &BrandPalette, accent: Rgb8) {
    let stops = overlay_stops(brand, accent);
    let radius = (image.width() as f32).hypot(image.height() as f32).max(1.0);

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let t = (x as f32).hypot(y as f32) / radius;
        let (color, alpha) = sample_stops(&stops, t);
        pixel.0 = blend_over(pixel.0, color.with_alpha(alpha), 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    fn brand() -> BrandPalette {
        PipelineConfig::default().brand_palette().unwrap()
    }

    #[test]
    fn sample_stops_endpoints() {
        let stops = overlay_stops(&brand(), Rgb8::new(255, 0, 0));
        assert_eq!(sample_stops(&stops, 0.0), (brand().light_tint, 0.92));
        assert_eq!(sample_stops(&stops, 1.0), (brand().dark_tint, 0.5));
        assert_eq!(sample_stops(&stops, 2.0), (brand().dark_tint, 0.5));
        assert_eq!(sample_stops(&stops, -1.0), (brand().light_tint, 0.92));
    }

    #[test]
    fn sample_stops_interpolates_between() {
        let stops = [
            GradientStop {
                position: 0.0,
                color: Rgb8::BLACK,
                alpha: 0.0,
            },
            GradientStop {
                position: 1.0,
                color: Rgb8::new(200, 100, 0),
                alpha: 1.0,
            },
        ];
        let (color, alpha) = sample_stops(&stops, 0.5);
        assert_eq!(color, Rgb8::new(100, 50, 0));
        assert!((alpha - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sample_stops_empty_is_transparent() {
        assert_eq!(sample_stops(&[], 0.3).1, 0.0);
    }

    #[test]
    fn overlay_lightens_text_corner_and_darkens_far_corner() {
        let mut image = RgbImage::from_pixel(120, 63, image::Rgb([128, 128, 128]));
        apply_overlay(&mut image, &brand(), Rgb8::new(99, 102, 241));

        let text_corner = image.get_pixel(0, 0).0;
        let far_corner = image.get_pixel(119, 62).0;
        assert!(text_corner.iter().all(|&c| c > 200), "{text_corner:?}");
        assert!(far_corner.iter().all(|&c| c < 128), "{far_corner:?}");
    }
}

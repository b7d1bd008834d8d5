//! Title wrapping and bitmap text rendering.
//!
//! Glyphs come from the public-domain 8×8 `font8x8` set, scaled by an integer
//! factor. The font is monospaced, so width estimation is exact per character
//! and needs no shaping or measurement pass.

use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};

/// Side length of one unscaled glyph cell in pixels.
pub const GLYPH_SIZE: u32 = 8;

/// Greedy word wrap to at most `max_chars` characters per line.
///
/// Words are never split. A word longer than `max_chars` gets a line of its
/// own and overflows. Whitespace runs collapse to single spaces. An empty or
/// all-whitespace title yields no lines.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len == 0 {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// How many characters of `advance_px` width fit in `width_px`. At least 1.
pub fn char_budget(width_px: u32, advance_px: u32) -> usize {
    (width_px / advance_px.max(1)).max(1) as usize
}

/// Rendered width of `text` at `scale`.
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Draw `text` with its top-left corner at `origin`.
///
/// Pixels falling outside the canvas are clipped. Covered pixels are
/// overwritten with `color`.
pub fn draw_text(canvas: &mut RgbaImage, text: &str, origin: (i64, i64), scale: u32, color: Rgba<u8>) {
    let scale = scale.max(1) as i64;
    let cell = GLYPH_SIZE as i64 * scale;
    let (width, height) = (canvas.width() as i64, canvas.height() as i64);

    for (index, c) in text.chars().enumerate() {
        let left = origin.0 + index as i64 * cell;
        if left >= width {
            break;
        }
        if c == ' ' {
            continue;
        }
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..8 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let x0 = left + col as i64 * scale;
                let y0 = origin.1 + row as i64 * scale;
                for y in y0.max(0)..(y0 + scale).min(height) {
                    for x in x0.max(0)..(x0 + scale).min(width) {
                        canvas.put_pixel(x as u32, y as u32, color);
                    }
                }
            }
        }
    }
}

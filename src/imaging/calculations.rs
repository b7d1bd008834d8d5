//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Gravity;

/// Largest region of `source` that has the aspect ratio of `target`.
///
/// Cropping to this region first and then resizing straight to `target`
/// keeps every intermediate buffer no larger than the source or the target,
/// whatever the source proportions.
///
/// # Returns
/// * `(width, height)` - Crop size, each side within `1..=source side`
pub fn calculate_aspect_crop(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (source.0.max(1), source.1.max(1));
    let (tgt_w, tgt_h) = (target.0.max(1), target.1.max(1));

    // Compare src_w/src_h with tgt_w/tgt_h without division
    let lhs = src_w as u64 * tgt_h as u64;
    let rhs = tgt_w as u64 * src_h as u64;

    if lhs > rhs {
        // Source is wider: keep full height, trim width
        let w = (src_h as u64 * tgt_w as u64 + tgt_h as u64 / 2) / tgt_h as u64;
        ((w as u32).clamp(1, src_w), src_h)
    } else {
        // Source is taller (or equal): keep full width, trim height
        let h = (src_w as u64 * tgt_h as u64 + tgt_w as u64 / 2) / tgt_w as u64;
        (src_w, (h as u32).clamp(1, src_h))
    }
}

/// Top-left offset of a `target`-sized crop window inside an `outer` image.
///
/// The surplus on each axis is distributed according to the gravity
/// fractions: `0.0` keeps the left/top edge, `1.0` keeps the right/bottom edge.
pub fn calculate_crop_offset(outer: (u32, u32), target: (u32, u32), gravity: Gravity) -> (u32, u32) {
    let (fx, fy) = gravity.fractions();
    let surplus_x = outer.0.saturating_sub(target.0);
    let surplus_y = outer.1.saturating_sub(target.1);
    (
        (surplus_x as f64 * fx).round() as u32,
        (surplus_y as f64 * fy).round() as u32,
    )
}

/// Whether two sizes share an aspect ratio within `tolerance` (relative).
pub fn aspect_ratios_match(a: (u32, u32), b: (u32, u32), tolerance: f64) -> bool {
    if a.1 == 0 || b.1 == 0 {
        return false;
    }
    let ra = a.0 as f64 / a.1 as f64;
    let rb = b.0 as f64 / b.1 as f64;
    ((ra - rb) / rb).abs() <= tolerance
}

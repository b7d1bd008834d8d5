//! Natural-language generation instructions.
//!
//! The instruction combines the style catalog entry, the theme hint, the
//! series accent colour, and fixed composition rules. Composition matters as
//! much as content: the compositor puts the title on the left, so the
//! illustration must keep that side quiet.

use crate::config::Series;
use crate::style::VisualStyle;

/// Aspect ratios image providers commonly accept, with their numeric value.
const RATIO_CANDIDATES: &[(&str, f64)] = &[
    ("1:1", 1.0),
    ("4:3", 4.0 / 3.0),
    ("3:2", 3.0 / 2.0),
    ("16:9", 16.0 / 9.0),
    ("21:9", 21.0 / 9.0),
];

/// Nearest supported aspect ratio label for a pixel size.
pub fn nearest_aspect_ratio(size: (u32, u32)) -> &'static str {
    let target = size.0 as f64 / size.1.max(1) as f64;
    RATIO_CANDIDATES
        .iter()
        .min_by(|a, b| {
            let da = (a.1 - target).abs();
            let db = (b.1 - target).abs();
            da.total_cmp(&db)
        })
        .map(|(label, _)| *label)
        .unwrap_or("16:9")
}

/// Build the instruction sent to the image generator.
pub fn build_prompt(style: &VisualStyle, series: &Series, size: (u32, u32)) -> String {
    let accent = series.palette.accent.to_hex();
    let kind = style.kind;
    format!(
        "Create a {description} of {hint}.\n\
         Palette: {palette}, with {accent} as the recurring accent colour for the \"{label}\" series.\n\
         Composition: place the main subject in the right-hand third of the frame, \
         anchored towards the lower-right quadrant. Keep the left half light, \
         uncluttered and low in detail so text can be placed over it.\n\
         Mood: {suffix}.\n\
         Format: wide {ratio} landscape banner, {width}x{height} pixels.\n\
         Do not include any text, letters, numbers, logos or watermarks.",
        description = kind.description(),
        hint = style.illustration_hint,
        palette = style.palette_hint,
        accent = accent,
        label = series.label,
        suffix = kind.suffix(),
        ratio = nearest_aspect_ratio(size),
        width = size.0,
        height = size.1,
    )
}

//! Image primitives: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** (PNG, JPEG, WebP) | `image::load_from_memory` |
//! | **Cover resize** | Lanczos3 `imageops::resize` + gravity crop |
//! | **Encode → JPEG / PNG** | `image` codecs |
//! | **Atomic write** | `tempfile::NamedTempFile::persist` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: [`Quality`] and [`Gravity`]
//! - **Color**: hex parsing and blending used by the gradient layers
//! - **Operations**: functions combining calculations with the `image` crate

mod calculations;
pub mod color;
pub mod operations;
mod params;

pub use calculations::aspect_ratios_match;
pub use color::{ColorParseError, Rgb8, blend_over};
pub use operations::{
    ImagingError, decode_rgb, encode_jpeg, encode_png, load_rgb, resize_cover, write_atomic,
};
pub use params::{Gravity, Quality, SUBJECT_GRAVITY};

//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how*. They are shared between the
//! background stage and the compositor so both crop with the same policy.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 88). Clamped on construction.
//! - [`Gravity`]: which part of an image survives a cover crop.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as the `u8` the JPEG encoder expects.
    pub fn as_u8(self) -> u8 {
        self.0.clamp(1, 100) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(88)
    }
}

/// Crop anchor for cover resizes.
///
/// Illustrations put their subject on the right-hand side, so both stages
/// crop with [`Gravity::East`] to keep it in frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gravity {
    #[default]
    Center,
    North,
    South,
    East,
    West,
    NorthEast,
    SouthEast,
}

impl Gravity {
    /// Horizontal and vertical surplus fractions kept *before* the crop window.
    pub fn fractions(self) -> (f64, f64) {
        match self {
            Gravity::Center => (0.5, 0.5),
            Gravity::North => (0.5, 0.0),
            Gravity::South => (0.5, 1.0),
            Gravity::East => (1.0, 0.5),
            Gravity::West => (0.0, 0.5),
            Gravity::NorthEast => (1.0, 0.0),
            Gravity::SouthEast => (1.0, 1.0),
        }
    }
}

/// Gravity used for every crop of an illustration.
pub const SUBJECT_GRAVITY: Gravity = Gravity::East;

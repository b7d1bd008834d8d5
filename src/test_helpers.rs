//! Shared test utilities for the sharecard test suite.
//!
//! Provides a recording [`MockGenerator`], a small-canvas config that keeps
//! image work fast, and item builders.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let config = test_config();
//! let generator = MockGenerator::solid(240, 126, [10, 20, 30]);
//! let pipeline = Pipeline::new(&config, &generator, tmp.path());
//! pipeline.run_batch(&[sample_item("Mastering Arrays", "06")], None).unwrap();
//! assert_eq!(generator.call_count(), 1);
//! ```

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::background::generator::{
    GeneratedImage, GenerationError, GenerationRequest, ImageGenerator,
};
use crate::config::{GenerationConfig, OutputConfig, PipelineConfig, Series, SeriesConfig};
use crate::imaging::encode_png;
use crate::types::ContentItem;
use image::{Rgb, RgbImage};

// =========================================================================
// Fixtures
// =========================================================================

/// Default config shrunk to a 120×63 output and 240×126 generation size,
/// with a single series `"A"`.
pub fn test_config() -> PipelineConfig {
    let mut series = BTreeMap::new();
    series.insert(
        "A".to_string(),
        SeriesConfig {
            label: "Series A".to_string(),
            primary: "#4f46e5".to_string(),
            secondary: "#0ea5e9".to_string(),
            accent: "#6366f1".to_string(),
        },
    );
    PipelineConfig {
        output: OutputConfig {
            width: 120,
            height: 63,
            quality: 85,
        },
        generation: GenerationConfig {
            width: 240,
            height: 126,
        },
        series,
        ..PipelineConfig::default()
    }
}

/// Resolved series `"A"` from [`test_config`].
pub fn sample_series() -> Series {
    test_config()
        .series("A")
        .unwrap_or_else(|| panic!("test config has no series A"))
}

/// An item in series `"A"`.
pub fn sample_item(title: &str, identifier: &str) -> ContentItem {
    ContentItem::new(title, "A", identifier)
}

// =========================================================================
// MockGenerator
// =========================================================================

#[derive(Debug, Clone)]
enum Reply {
    Images(Vec<u8>),
    Fail,
    Empty,
}

/// Generator that records requests and returns a canned reply.
/// Uses Mutex (not RefCell) so it stays Sync like real generators.
#[derive(Debug)]
pub struct MockGenerator {
    reply: Reply,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replies with a PNG of one solid colour.
    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> Self {
        let png = encode_png(&RgbImage::from_pixel(width, height, Rgb(color))).unwrap();
        Self::with_reply(Reply::Images(png))
    }

    /// Replies with arbitrary bytes claiming to be an image.
    pub fn bytes(bytes: Vec<u8>) -> Self {
        Self::with_reply(Reply::Images(bytes))
    }

    /// Every call fails with an API error.
    pub fn failing() -> Self {
        Self::with_reply(Reply::Fail)
    }

    /// Every call succeeds with zero images.
    pub fn empty() -> Self {
        Self::with_reply(Reply::Empty)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl ImageGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedImage>, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Reply::Images(bytes) => Ok(vec![GeneratedImage {
                bytes: bytes.clone(),
                mime_type: Some("image/png".to_string()),
            }]),
            Reply::Fail => Err(GenerationError::Api {
                status: 503,
                body: "unavailable".to_string(),
            }),
            Reply::Empty => Ok(Vec::new()),
        }
    }
}

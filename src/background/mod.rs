//! Background acquisition: cache, then AI generation, then procedural fallback.
//!
//! Every item ends up with a background at the generation resolution. The only
//! way [`BackgroundProvider::acquire`] fails is when the freshly produced
//! background cannot be written to the cache; generation problems are logged
//! and absorbed by the fallback.
//!
//! ```text
//! lookup(key) ── hit ──► decode ──────────────────────────────► Background(Cache)
//!      │                   │ undecodable
//!      ▼ miss ◄────────────┘
//! select_style → build_prompt → generator.generate
//!      │ ok + decodable                       │ error / empty / undecodable
//!      ▼                                      ▼
//!   cover resize (East)               render_fallback(series)
//!      └──────────────┬───────────────────────┘
//!                     ▼
//!               cache.store(key) ──► Background(Generated | Fallback)
//! ```

pub mod fallback;
pub mod generator;
pub mod prompt;

use crate::cache::{CacheError, CacheManager, compute_key};
use crate::config::{PipelineConfig, Series};
use crate::imaging::{self, SUBJECT_GRAVITY};
use crate::style::{VisualStyle, select_style};
use crate::types::ContentItem;
use generator::{GenerationError, GenerationRequest, ImageGenerator};
use image::RgbImage;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum BackgroundError {
    #[error("failed to cache background: {0}")]
    Cache(#[from] CacheError),
}

/// Where a background came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundSource {
    Cache,
    Generated,
    Fallback,
}

impl fmt::Display for BackgroundSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackgroundSource::Cache => "cached",
            BackgroundSource::Generated => "generated",
            BackgroundSource::Fallback => "fallback",
        })
    }
}

/// A background at the generation resolution.
#[derive(Debug, Clone)]
pub struct Background {
    pub image: RgbImage,
    pub source: BackgroundSource,
    /// Style used for a fresh background. `None` for cache hits.
    pub style: Option<VisualStyle>,
}

/// Produces backgrounds for items, one generator attempt per cache miss.
pub struct BackgroundProvider<'a> {
    config: &'a PipelineConfig,
    generator: &'a dyn ImageGenerator,
}

impl<'a> BackgroundProvider<'a> {
    pub fn new(config: &'a PipelineConfig, generator: &'a dyn ImageGenerator) -> Self {
        Self { config, generator }
    }

    pub fn acquire(
        &self,
        item: &ContentItem,
        series: &Series,
        cache: &mut CacheManager,
    ) -> Result<Background, BackgroundError> {
        let key = compute_key(&item.title, &item.series, &item.identifier);

        if let Some(path) = cache.lookup(&key) {
            match imaging::load_rgb(&path) {
                Ok(image) => {
                    debug!(item = %item, file = %path.display(), "using cached background");
                    return Ok(Background {
                        image,
                        source: BackgroundSource::Cache,
                        style: None,
                    });
                }
                Err(e) => {
                    warn!(item = %item, file = %path.display(), error = %e, "cached background unreadable, regenerating");
                    cache.invalidate(&key);
                }
            }
        }

        let style = select_style(&item.title, &item.identifier);
        let size = self.config.generation_size();
        let (raw, source) = match self.generate(item, &style, series) {
            Ok(image) => (image, BackgroundSource::Generated),
            Err(e) => {
                warn!(item = %item, generator = self.generator.name(), error = %e, "generation failed, using fallback background");
                (
                    fallback::render_fallback(size.0, size.1, &series.palette),
                    BackgroundSource::Fallback,
                )
            }
        };

        let image = if raw.dimensions() == size {
            raw
        } else {
            imaging::resize_cover(&raw, size, SUBJECT_GRAVITY)
        };
        cache.store(&key, &image)?;

        Ok(Background {
            image,
            source,
            style: Some(style),
        })
    }

    /// One generator attempt, decoded to pixels.
    fn generate(
        &self,
        item: &ContentItem,
        style: &VisualStyle,
        series: &Series,
    ) -> Result<RgbImage, AttemptError> {
        let size = self.config.generation_size();
        let request = GenerationRequest::new(
            prompt::build_prompt(style, series, size),
            prompt::nearest_aspect_ratio(size),
        );
        debug!(item = %item, style = %style.kind, generator = self.generator.name(), "generating background");

        let images = self.generator.generate(&request)?;
        let first = images.into_iter().next().ok_or(AttemptError::Empty)?;
        Ok(imaging::decode_rgb(&first.bytes)?)
    }
}

/// Why a generation attempt produced nothing usable. Never leaves this module.
#[derive(Error, Debug)]
enum AttemptError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("generator returned no images")]
    Empty,
    #[error("generated image could not be decoded: {0}")]
    Decode(#[from] imaging::ImagingError),
}

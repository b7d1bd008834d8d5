//! Batch driver.
//!
//! Runs every item through background acquisition and composition, one at a
//! time. Each item is its own failure boundary: an unknown series, a cache
//! write failure, or a composition failure is logged with the item's identity
//! and counted, and the batch moves on. Only problems that make the whole run
//! meaningless (the output root cannot be created, the brand colours are
//! invalid) abort it.
//!
//! The cache manifest is opened once before the first item and flushed once
//! after the last.

use crate::background::generator::ImageGenerator;
use crate::background::{BackgroundError, BackgroundProvider, BackgroundSource};
use crate::cache::{CACHE_DIRNAME, CacheManager, CacheStats};
use crate::compose::{CompositeError, Compositor};
use crate::config::PipelineConfig;
use crate::style::StyleKind;
use crate::types::ContentItem;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot create output root {path}: {source}")]
    OutputRoot {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Compositor(#[from] CompositeError),
}

/// Why one item failed. The batch continues.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("unknown series {0:?}")]
    UnknownSeries(String),
    #[error(transparent)]
    Background(#[from] BackgroundError),
    #[error("composition failed: {0}")]
    Composite(#[from] CompositeError),
    #[error("output {} already written by an earlier item", .0.display())]
    DuplicateOutput(PathBuf),
}

/// Progress notification for one finished item.
#[derive(Debug, Clone)]
pub enum ItemEvent {
    Completed {
        /// 1-based position in the batch.
        index: usize,
        item: ContentItem,
        /// Output file relative to the output root.
        output: PathBuf,
        source: BackgroundSource,
        style: Option<StyleKind>,
    },
    Failed {
        index: usize,
        item: ContentItem,
        error: String,
    },
}

/// Outcome counts for a batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub via_ai: u32,
    pub via_fallback: u32,
    pub from_cache: u32,
    pub failed: u32,
    pub cache: CacheStats,
}

impl BatchSummary {
    /// Items whose final image was written.
    pub fn generated(&self) -> u32 {
        self.via_ai + self.via_fallback + self.from_cache
    }

    fn record(&mut self, source: BackgroundSource) {
        match source {
            BackgroundSource::Generated => self.via_ai += 1,
            BackgroundSource::Fallback => self.via_fallback += 1,
            BackgroundSource::Cache => self.from_cache += 1,
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} generated ({} via AI, {} via fallback, {} from cache), {} failed",
            self.generated(),
            self.via_ai,
            self.via_fallback,
            self.from_cache,
            self.failed
        )
    }
}

struct ItemReport {
    output: PathBuf,
    source: BackgroundSource,
    style: Option<StyleKind>,
}

/// Sequential batch runner bound to one config, generator, and output root.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    generator: &'a dyn ImageGenerator,
    output_root: PathBuf,
    force: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        generator: &'a dyn ImageGenerator,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            generator,
            output_root: output_root.into(),
            force: false,
        }
    }

    /// Ignore cached backgrounds for this run. Fresh ones are still stored.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.output_root.join(CACHE_DIRNAME)
    }

    /// Process `items` in order, reporting each outcome on `events`.
    pub fn run_batch(
        &self,
        items: &[ContentItem],
        events: Option<Sender<ItemEvent>>,
    ) -> Result<BatchSummary, PipelineError> {
        std::fs::create_dir_all(&self.output_root).map_err(|source| PipelineError::OutputRoot {
            path: self.output_root.clone(),
            source,
        })?;
        let compositor = Compositor::new(self.config)?;
        let provider = BackgroundProvider::new(self.config, self.generator);
        let mut cache = CacheManager::open(self.cache_dir(), self.force);

        info!(
            items = items.len(),
            root = %self.output_root.display(),
            generator = self.generator.name(),
            force = self.force,
            "starting batch"
        );

        let mut summary = BatchSummary::default();
        let mut claimed = HashSet::new();
        for (i, item) in items.iter().enumerate() {
            let index = i + 1;
            let result = self.claim_output(item, &mut claimed).and_then(|relative| {
                self.process_item(item, relative, &provider, &compositor, &mut cache)
            });
            let event = match result {
                Ok(report) => {
                    summary.record(report.source);
                    ItemEvent::Completed {
                        index,
                        item: item.clone(),
                        output: report.output,
                        source: report.source,
                        style: report.style,
                    }
                }
                Err(e) => {
                    error!(item = %item, error = %e, "item failed");
                    summary.failed += 1;
                    ItemEvent::Failed {
                        index,
                        item: item.clone(),
                        error: e.to_string(),
                    }
                }
            };
            if let Some(tx) = &events {
                tx.send(event).ok();
            }
        }

        if let Err(e) = cache.flush() {
            warn!(file = %cache.manifest_path().display(), error = %e, "failed to write cache manifest");
        }
        summary.cache = cache.stats().clone();
        info!(%summary, "batch finished");
        Ok(summary)
    }

    /// Reserve the item's output path for this run.
    ///
    /// Two items resolving to the same file would silently overwrite each
    /// other, so the later one fails instead.
    fn claim_output(
        &self,
        item: &ContentItem,
        claimed: &mut HashSet<PathBuf>,
    ) -> Result<PathBuf, ItemError> {
        let relative = item.relative_output_path();
        if claimed.insert(relative.clone()) {
            Ok(relative)
        } else {
            Err(ItemError::DuplicateOutput(relative))
        }
    }

    fn process_item(
        &self,
        item: &ContentItem,
        relative: PathBuf,
        provider: &BackgroundProvider<'_>,
        compositor: &Compositor,
        cache: &mut CacheManager,
    ) -> Result<ItemReport, ItemError> {
        let series = self
            .config
            .series(&item.series)
            .ok_or_else(|| ItemError::UnknownSeries(item.series.clone()))?;
        let background = provider.acquire(item, &series, cache)?;

        compositor.render(
            &background.image,
            item,
            &series,
            &self.output_root().join(&relative),
        )?;

        Ok(ItemReport {
            output: relative,
            source: background.source,
            style: background.style.map(|s| s.kind),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockGenerator, sample_item, test_config};
    use tempfile::TempDir;

    fn items() -> Vec<ContentItem> {
        vec![
            sample_item("Introduction", "01"),
            sample_item("Variables and Types", "02"),
            sample_item("Mastering Arrays", "06"),
        ]
    }

    #[test]
    fn summary_counts_by_source() {
        let mut summary = BatchSummary::default();
        summary.record(BackgroundSource::Generated);
        summary.record(BackgroundSource::Generated);
        summary.record(BackgroundSource::Fallback);
        summary.record(BackgroundSource::Cache);
        summary.failed = 1;
        assert_eq!(summary.generated(), 4);
        assert_eq!(
            summary.to_string(),
            "4 generated (2 via AI, 1 via fallback, 1 from cache), 1 failed"
        );
    }

    #[test]
    fn run_batch_writes_every_item() {
        let tmp = TempDir::new().unwrap();
        let config = test_config();
        let generator = MockGenerator::solid(240, 126, [30, 60, 90]);
        let pipeline = Pipeline::new(&config, &generator, tmp.path());

        let summary = pipeline.run_batch(&items(), None).unwrap();

        assert_eq!(summary.via_ai, 3);
        assert_eq!(summary.failed, 0);
        for item in items() {
            assert!(tmp.path().join(item.relative_output_path()).is_file());
        }
        assert!(tmp.path().join(CACHE_DIRNAME).join("manifest.json").is_file());
    }

    #[test]
    fn unknown_series_fails_only_that_item() {
        let tmp = TempDir::new().unwrap();
        let config = test_config();
        let generator = MockGenerator::failing();
        let pipeline = Pipeline::new(&config, &generator, tmp.path());

        let mut batch = items();
        batch.insert(1, ContentItem::new("Stray", "no-such-series", "01"));
        let summary = pipeline.run_batch(&batch, None).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.via_fallback, 3);
        assert_eq!(generator.call_count(), 3);
    }

    #[test]
    fn events_report_each_item_in_order() {
        let tmp = TempDir::new().unwrap();
        let config = test_config();
        let generator = MockGenerator::failing();
        let pipeline = Pipeline::new(&config, &generator, tmp.path());

        let mut batch = items();
        batch.push(ContentItem::new("Stray", "nope", "09"));
        let (tx, rx) = std::sync::mpsc::channel();
        pipeline.run_batch(&batch, Some(tx)).unwrap();

        let events: Vec<ItemEvent> = rx.iter().collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            &events[2],
            ItemEvent::Completed { index: 3, source: BackgroundSource::Fallback, style: Some(_), output, .. }
                if output == &PathBuf::from("A/A-06.jpg")
        ));
        assert!(matches!(&events[3], ItemEvent::Failed { index: 4, .. }));
    }

    #[test]
    fn lookalike_identifiers_get_separate_files() {
        let tmp = TempDir::new().unwrap();
        let config = test_config();
        let generator = MockGenerator::failing();
        let batch = vec![
            ContentItem::new("Part one", "A", "1.1"),
            ContentItem::new("Part two", "A", "1-1"),
        ];

        let summary = Pipeline::new(&config, &generator, tmp.path())
            .run_batch(&batch, None)
            .unwrap();

        assert_eq!(summary.generated(), 2);
        assert_eq!(summary.failed, 0);
        let written: Vec<_> = std::fs::read_dir(tmp.path().join("A"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(written.len(), 2);
    }

    #[test]
    fn repeated_output_path_fails_later_item() {
        let tmp = TempDir::new().unwrap();
        let config = test_config();
        let generator = MockGenerator::failing();
        let batch = vec![
            sample_item("First take", "03"),
            sample_item("Second take", "03"),
        ];
        let (tx, rx) = std::sync::mpsc::channel();

        let summary = Pipeline::new(&config, &generator, tmp.path())
            .run_batch(&batch, Some(tx))
            .unwrap();

        assert_eq!(summary.generated(), 1);
        assert_eq!(summary.failed, 1);
        // The duplicate is rejected before any background work
        assert_eq!(generator.call_count(), 1);
        let events: Vec<ItemEvent> = rx.iter().collect();
        assert!(matches!(
            &events[1],
            ItemEvent::Failed { index: 2, error, .. } if error.contains("A/A-03.jpg")
        ));
    }

    #[test]
    fn cache_dir_is_under_output_root() {
        let config = test_config();
        let generator = MockGenerator::failing();
        let pipeline = Pipeline::new(&config, &generator, "share");

        assert_eq!(pipeline.output_root(), Path::new("share"));
        assert_eq!(pipeline.cache_dir(), Path::new("share").join(CACHE_DIRNAME));
    }

    #[test]
    fn force_bypasses_cache() {
        let tmp = TempDir::new().unwrap();
        let config = test_config();
        let generator = MockGenerator::solid(240, 126, [1, 2, 3]);

        Pipeline::new(&config, &generator, tmp.path())
            .run_batch(&items(), None)
            .unwrap();
        let summary = Pipeline::new(&config, &generator, tmp.path())
            .force(true)
            .run_batch(&items(), None)
            .unwrap();

        assert_eq!(summary.from_cache, 0);
        assert_eq!(summary.via_ai, 3);
        assert_eq!(generator.call_count(), 6);
    }

    #[test]
    fn unwritable_output_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        let config = test_config();
        let generator = MockGenerator::failing();

        let result = Pipeline::new(&config, &generator, blocker.join("out")).run_batch(&items(), None);
        assert!(matches!(result, Err(PipelineError::OutputRoot { .. })));
    }

    #[test]
    fn manifest_flush_failure_is_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let config = test_config();
        let generator = MockGenerator::failing();
        // Directory squatting on the manifest path makes the final rename fail
        std::fs::create_dir_all(tmp.path().join(CACHE_DIRNAME).join("manifest.json")).unwrap();

        let summary = Pipeline::new(&config, &generator, tmp.path())
            .run_batch(&items(), None)
            .unwrap();
        assert_eq!(summary.via_fallback, 3);
        assert_eq!(summary.failed, 0);
    }
}

//! # sharecard
//!
//! Illustrated social-share images for tutorial series. Each content item
//! (title, series, identifier) becomes one 1200×630 JPEG: an AI-generated
//! illustration in a deterministic style, a legibility gradient, and the
//! title, series badge, and branding drawn on top.
//!
//! # Architecture: Per-Item Pipeline
//!
//! ```text
//! ContentItem ─► cache lookup ─► hit ──────────────────────────┐
//!                    │ miss                                     │
//!                    ▼                                          ▼
//!          style ─► prompt ─► generator ─► (fallback) ─► cache store
//!                                                               │
//!                                                               ▼
//!                       {root}/{series}/{series}-{id}.jpg ◄── compose
//! ```
//!
//! Items run sequentially and each is its own failure boundary, so one bad
//! item never costs the rest of the batch.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`style`] | Deterministic style and theme-hint selection from title and identifier |
//! | [`cache`] | Content-addressed background cache with an in-memory manifest |
//! | [`background`] | Cache → AI generation → procedural fallback, resized to the generation size |
//! | [`compose`] | Overlay gradient, wrapped title, badge and branding, JPEG output |
//! | [`pipeline`] | Sequential batch driver with per-item failure isolation and a summary |
//! | [`config`] | `sharecard.toml` loading, merging over stock defaults, validation |
//! | [`types`] | [`types::ContentItem`] and its output path convention |
//! | [`imaging`] | Pure-Rust image primitives: cover resize with gravity, colours, encoding, atomic writes |
//! | [`output`] | CLI output formatting for batch progress and previews |
//!
//! # Design Decisions
//!
//! ## Determinism Over Variety
//!
//! The visual style is a function of the identifier and the theme hint a
//! function of the title. The cache key hashes the same identity. Running
//! the pipeline twice over unchanged content therefore makes no generation
//! calls the second time, and a deleted background is regenerated with the
//! same instruction it had before.
//!
//! ## Always Produce an Image
//!
//! Generation gets one attempt. Any error, empty response, or undecodable
//! payload falls through to a gradient built from the series palette. The
//! only configuration problem that stops a run up front is a provider with no
//! API key, because silently producing a whole batch of fallbacks is worse
//! than asking the operator to pass `--offline`.
//!
//! ## Load Once, Flush Once
//!
//! The cache manifest lives in memory for the whole run and is written once
//! at the end, atomically. A crash mid-run loses manifest entries, not
//! background files; the next run regenerates those entries.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling, JPEG/PNG encoding and text all use pure-Rust crates
//! (`image`, `font8x8`). The binary has no system dependencies.

pub mod background;
pub mod cache;
pub mod compose;
pub mod config;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod style;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

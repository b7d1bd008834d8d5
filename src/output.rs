//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Each item leads with
//! its batch position, series/identifier, and title; the written file and
//! the background's provenance follow as indented context lines.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! 001 php-basics/01 Introduction to PHP
//!     Output: php-basics/php-basics-01.jpg
//!     Background: generated (isometric)
//! 002 php-basics/02 Variables and Types
//!     Output: php-basics/php-basics-02.jpg
//!     Background: cached
//! 003 unknown/07 Stray Page
//!     Failed: unknown series "unknown"
//!
//! Generated 2 (1 via AI, 0 via fallback, 1 from cache)
//! Failed 1
//! Cache: 1 cached, 2 missed
//! ```
//!
//! ## Preview
//!
//! ```text
//! php-basics/06 Mastering Arrays
//!     Style: blueprint
//!     Hint: a neat row of numbered boxes ...
//!     Cache key: 3f1c...
//!     Output: php-basics/php-basics-06.jpg
//!
//! Prompt:
//! Create a ...
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::pipeline::{BatchSummary, ItemEvent};
use crate::style::VisualStyle;
use crate::types::ContentItem;

/// Longest title shown on an item header line.
const MAX_TITLE_CHARS: usize = 60;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    }
}

/// `series/identifier Title`
fn item_label(item: &ContentItem) -> String {
    format!(
        "{}/{} {}",
        item.series,
        item.identifier,
        truncate(&item.title, MAX_TITLE_CHARS)
    )
}

// ============================================================================
// Generate
// ============================================================================

/// Format a single per-item pipeline event as display lines.
pub fn format_item_event(event: &ItemEvent) -> Vec<String> {
    match event {
        ItemEvent::Completed {
            index,
            item,
            output,
            source,
            style,
        } => {
            let background = match style {
                Some(kind) => format!("{} ({})", source, kind),
                None => source.to_string(),
            };
            vec![
                format!("{} {}", format_index(*index), item_label(item)),
                format!("{}Output: {}", indent(1), output.display()),
                format!("{}Background: {}", indent(1), background),
            ]
        }
        ItemEvent::Failed { index, item, error } => vec![
            format!("{} {}", format_index(*index), item_label(item)),
            format!("{}Failed: {}", indent(1), error),
        ],
    }
}

/// Format the end-of-batch summary.
pub fn format_summary(summary: &BatchSummary) -> Vec<String> {
    vec![
        String::new(),
        format!(
            "Generated {} ({} via AI, {} via fallback, {} from cache)",
            summary.generated(),
            summary.via_ai,
            summary.via_fallback,
            summary.from_cache
        ),
        format!("Failed {}", summary.failed),
        format!("Cache: {}", summary.cache),
    ]
}

pub fn print_summary(summary: &BatchSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Preview
// ============================================================================

/// Format what a run would send for one item, without doing it.
pub fn format_preview(
    item: &ContentItem,
    style: &VisualStyle,
    cache_key: &str,
    prompt: &str,
) -> Vec<String> {
    let mut lines = vec![
        item_label(item),
        format!("{}Style: {}", indent(1), style.kind),
        format!("{}Hint: {}", indent(1), style.illustration_hint),
        format!("{}Cache key: {}", indent(1), cache_key),
        format!(
            "{}Output: {}",
            indent(1),
            item.relative_output_path().display()
        ),
        String::new(),
        "Prompt:".to_string(),
    ];
    lines.extend(prompt.lines().map(str::to_string));
    lines
}

pub fn print_preview(item: &ContentItem, style: &VisualStyle, cache_key: &str, prompt: &str) {
    for line in format_preview(item, style, cache_key, prompt) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

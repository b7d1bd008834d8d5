//! Shared types used across all pipeline stages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// File extension of every final share image.
pub const OUTPUT_EXTENSION: &str = "jpg";

/// One unit of content that needs a share image.
///
/// Produced by whatever scans the documentation tree; the pipeline only
/// reads it. `identifier` is a chapter/section number such as `"06"` or a
/// sentinel such as `"overview"` or `"homepage"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub title: String,
    /// Series slug; must name a `[series.<slug>]` table in the config.
    pub series: String,
    pub identifier: String,
    /// Carried through for future layouts; not rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
}

impl ContentItem {
    pub fn new(
        title: impl Into<String>,
        series: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            series: series.into(),
            identifier: identifier.into(),
            code_snippet: None,
        }
    }

    /// Output path relative to the output root: `{series}/{series}-{identifier}.jpg`.
    pub fn relative_output_path(&self) -> PathBuf {
        let series = sanitize_path_segment(&self.series);
        let identifier = sanitize_path_segment(&self.identifier);
        Path::new(&series).join(format!("{series}-{identifier}.{OUTPUT_EXTENSION}"))
    }
}

impl fmt::Display for ContentItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} \"{}\"", self.series, self.identifier, self.title)
    }
}

/// Percent-encode everything outside `[A-Za-z0-9._-]`, byte by byte.
///
/// The mapping is injective (`%` itself is encoded), so distinct identities
/// never share an output file. A segment made only of dots has its dots
/// encoded so it cannot name the current or parent directory. Empty input
/// maps to `"untitled"` so a path segment is never empty.
fn sanitize_path_segment(value: &str) -> String {
    if value.is_empty() {
        return "untitled".to_string();
    }
    let only_dots = value.bytes().all(|b| b == b'.');
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_')
            || (byte == b'.' && !only_dots);
        if keep {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Read a batch input file: a JSON array of [`ContentItem`]s.
pub fn read_items(path: &Path) -> Result<Vec<ContentItem>, ItemsError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[derive(thiserror::Error, Debug)]
pub enum ItemsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

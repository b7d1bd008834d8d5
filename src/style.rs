//! Deterministic visual style selection.
//!
//! A share image's look is derived from its content identity alone:
//!
//! - the **style** comes from the identifier's number modulo the catalog size,
//!   so consecutive chapters cycle through the catalog;
//! - the **illustration hint** comes from the first theme rule whose keyword
//!   appears in the title.
//!
//! Nothing here is random. The same `(title, identifier)` always yields the
//! same [`VisualStyle`], which is what lets the background cache hit across
//! runs.

use std::fmt;

/// The closed catalog of illustration treatments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKind {
    FlatVector,
    Isometric,
    LineArt,
    PaperCutout,
    Watercolor,
    Blueprint,
    RetroPoster,
    SoftClay,
}

impl StyleKind {
    /// Catalog order. Reordering changes which chapter gets which style.
    pub const ALL: [StyleKind; 8] = [
        StyleKind::FlatVector,
        StyleKind::Isometric,
        StyleKind::LineArt,
        StyleKind::PaperCutout,
        StyleKind::Watercolor,
        StyleKind::Blueprint,
        StyleKind::RetroPoster,
        StyleKind::SoftClay,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StyleKind::FlatVector => "flat-vector",
            StyleKind::Isometric => "isometric",
            StyleKind::LineArt => "line-art",
            StyleKind::PaperCutout => "paper-cutout",
            StyleKind::Watercolor => "watercolor",
            StyleKind::Blueprint => "blueprint",
            StyleKind::RetroPoster => "retro-poster",
            StyleKind::SoftClay => "soft-clay",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StyleKind::FlatVector => "clean flat vector illustration with simple geometric shapes",
            StyleKind::Isometric => "isometric 3D illustration with crisp edges and soft shadows",
            StyleKind::LineArt => "minimal continuous line art with a few spot-colour fills",
            StyleKind::PaperCutout => "layered paper cut-out illustration with subtle depth",
            StyleKind::Watercolor => "loose watercolor illustration with soft bleeding edges",
            StyleKind::Blueprint => "technical blueprint drawing with fine white linework",
            StyleKind::RetroPoster => "retro screen-printed poster with grainy halftone texture",
            StyleKind::SoftClay => "soft clay 3D render with rounded friendly forms",
        }
    }

    /// Tone phrase appended to the generation instruction.
    pub fn suffix(self) -> &'static str {
        match self {
            StyleKind::FlatVector => "modern, friendly, editorial",
            StyleKind::Isometric => "precise, tidy, slightly playful",
            StyleKind::LineArt => "airy, elegant, lots of negative space",
            StyleKind::PaperCutout => "tactile, handcrafted, warm",
            StyleKind::Watercolor => "calm, artistic, gentle",
            StyleKind::Blueprint => "engineered, structured, nerdy",
            StyleKind::RetroPoster => "bold, nostalgic, confident",
            StyleKind::SoftClay => "cosy, approachable, whimsical",
        }
    }

    pub fn palette_hint(self) -> &'static str {
        match self {
            StyleKind::FlatVector => "bright saturated colours on a pale background",
            StyleKind::Isometric => "cool pastel tones with one strong highlight colour",
            StyleKind::LineArt => "mostly monochrome ink with one accent colour",
            StyleKind::PaperCutout => "warm layered paper tones",
            StyleKind::Watercolor => "soft muted washes",
            StyleKind::Blueprint => "deep blue ground with white and cyan lines",
            StyleKind::RetroPoster => "limited three-ink palette with cream paper",
            StyleKind::SoftClay => "candy pastel colours with soft studio lighting",
        }
    }
}

impl fmt::Display for StyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The selected look for one content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualStyle {
    pub kind: StyleKind,
    pub illustration_hint: &'static str,
    pub palette_hint: &'static str,
}

/// One entry of the ordered theme table.
struct ThemeRule {
    keywords: &'static [&'static str],
    hint: &'static str,
}

impl ThemeRule {
    /// `title` must already be lowercase.
    fn matches(&self, title: &str) -> bool {
        self.keywords.iter().any(|k| title.contains(k))
    }
}

/// Used when no theme keyword matches.
pub const DEFAULT_HINT: &str =
    "a friendly code editor window with glowing syntax-highlighted lines and a coffee mug";

/// Evaluated top to bottom; the first match wins, so specific themes come first.
const THEME_RULES: &[ThemeRule] = &[
    ThemeRule {
        keywords: &["machine learning", "neural", "artificial intelligence", "llm", "embedding"],
        hint: "a small friendly robot studying a glowing network of connected nodes",
    },
    ThemeRule {
        keywords: &["computer vision", "image recognition", "object detection"],
        hint: "a camera lens whose reflection outlines recognised shapes with bounding boxes",
    },
    ThemeRule {
        keywords: &["sentiment", "natural language", "nlp", "chatbot"],
        hint: "speech bubbles turning into tidy rows of labelled tokens",
    },
    ThemeRule {
        keywords: &["forecast", "time series", "prediction"],
        hint: "a line chart climbing into a dotted future trend beside a crystal ball",
    },
    ThemeRule {
        keywords: &["array"],
        hint: "a neat row of numbered boxes on a conveyor belt, each holding a small object",
    },
    ThemeRule {
        keywords: &["string", "text processing"],
        hint: "letter tiles strung together on a thread like beads",
    },
    ThemeRule {
        keywords: &["function", "closure", "callable"],
        hint: "a machine with an input funnel and an output chute transforming shapes",
    },
    ThemeRule {
        keywords: &["class", "object", "oop", "inheritance", "interface"],
        hint: "stacked blueprint cards that snap together into a small building",
    },
    ThemeRule {
        keywords: &["database", "sql", "pdo", "query", "mysql"],
        hint: "stacked database cylinders connected to a magnifying glass",
    },
    ThemeRule {
        keywords: &["api", "rest", "http", "request", "endpoint"],
        hint: "two servers exchanging paper-plane messages along a dotted path",
    },
    ThemeRule {
        keywords: &["security", "password", "auth", "encryption", "csrf", "xss"],
        hint: "a sturdy padlock shielding a glowing key card",
    },
    ThemeRule {
        keywords: &["test", "phpunit", "debug"],
        hint: "a magnifying glass over a checklist with green ticks and a tiny bug",
    },
    ThemeRule {
        keywords: &["error", "exception"],
        hint: "a safety net catching a falling warning triangle",
    },
    ThemeRule {
        keywords: &["loop", "iteration", "control flow", "conditional"],
        hint: "a looping rollercoaster track with signposts at each fork",
    },
    ThemeRule {
        keywords: &["variable", "data type", "types"],
        hint: "labelled jars on a shelf holding numbers, letters and toggles",
    },
    ThemeRule {
        keywords: &["file", "upload", "stream"],
        hint: "folders flowing out of an open filing cabinet",
    },
    ThemeRule {
        keywords: &["regex", "regular expression", "pattern"],
        hint: "a magnifying glass highlighting matching shapes in a patterned quilt",
    },
    ThemeRule {
        keywords: &["session", "cookie", "state"],
        hint: "a cookie jar beside a browser window with a remembered profile card",
    },
    ThemeRule {
        keywords: &["performance", "cache", "optimi"],
        hint: "a stopwatch next to a rocket leaving a speed trail",
    },
    ThemeRule {
        keywords: &["deploy", "docker", "server", "production"],
        hint: "shipping containers being lifted onto a cloud-shaped ship",
    },
    ThemeRule {
        keywords: &["form", "validation", "input"],
        hint: "a clipboard form with fields being checked by a friendly stamp",
    },
    ThemeRule {
        keywords: &["route", "routing", "mvc", "framework"],
        hint: "a city map with signposts directing arrows to different buildings",
    },
    ThemeRule {
        keywords: &["json", "csv", "xml", "data"],
        hint: "spreadsheet cells folding into curly-brace shaped containers",
    },
];

/// The numeric part of an identifier.
///
/// Uses the first run of ASCII digits (`"06"` → 6, `"chapter-12"` → 12).
/// Identifiers without digits (`"overview"`, `"homepage"`) map to 0. Very
/// long digit runs saturate rather than overflow.
pub fn parse_identifier_number(identifier: &str) -> u64 {
    identifier
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .filter_map(|c| c.to_digit(10))
        .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(u64::from(d)))
}

/// Theme hint for a title: first matching rule, or [`DEFAULT_HINT`].
pub fn illustration_hint(title: &str) -> &'static str {
    let lowered = title.to_lowercase();
    THEME_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.hint)
        .unwrap_or(DEFAULT_HINT)
}

/// Catalog index for an identifier.
pub fn style_index(identifier: &str) -> usize {
    (parse_identifier_number(identifier) % StyleKind::ALL.len() as u64) as usize
}

/// Select the visual style for a content item. Pure and total.
pub fn select_style(title: &str, identifier: &str) -> VisualStyle {
    let kind = StyleKind::ALL[style_index(identifier)];
    VisualStyle {
        kind,
        illustration_hint: illustration_hint(title),
        palette_hint: kind.palette_hint(),
    }
}

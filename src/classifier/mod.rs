//! Keyword-scoring classifier selecting a model style for a free-text prompt
//!
//! Scoring is an ordered substring scan over the full keyword tables, so
//! overlapping keys ("photo" inside "photorealistic") each contribute their
//! weight. Deterministic, stateless, no I/O.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Named model variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Style {
    #[serde(rename = "realistic_vision", alias = "realistic")]
    RealisticVision,
    #[serde(rename = "dreamshaper")]
    Dreamshaper,
}

impl Style {
    pub const ALL: [Style; 2] = [Style::RealisticVision, Style::Dreamshaper];

    /// Public identifier, also used in artifact filenames
    pub fn id(&self) -> &'static str {
        match self {
            Style::RealisticVision => "realistic_vision",
            Style::Dreamshaper => "dreamshaper",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "realistic" | "realistic_vision" => Ok(Style::RealisticVision),
            "dreamshaper" => Ok(Style::Dreamshaper),
            other => Err(format!("unknown style: {other}")),
        }
    }
}

/// Keyword weights for the stylized/illustrative model
static DREAMSHAPER_KEYWORDS: &[(&str, u32)] = &[
    ("anime", 10),
    ("cartoon", 8),
    ("manga", 10),
    ("illustration", 6),
    ("artistic", 5),
    ("stylized", 4),
    ("fantasy", 3),
    ("magical", 3),
    ("dreamy", 3),
    ("ethereal", 3),
    ("whimsical", 3),
    ("colorful", 2),
    ("vibrant", 2),
    ("animated", 2),
    ("cute", 2),
    ("kawaii", 5),
    ("chibi", 5),
    ("character", 2),
    ("portrait", 2),
    ("figure", 2),
];

/// Keyword weights for the photorealistic model
static REALISTIC_KEYWORDS: &[(&str, u32)] = &[
    ("photograph", 10),
    ("photo", 8),
    ("realistic", 10),
    ("real", 8),
    ("photorealistic", 10),
    ("hyperrealistic", 10),
    ("detailed", 5),
    ("sharp", 4),
    ("clear", 3),
    ("professional", 4),
    ("high quality", 5),
    ("ultra detailed", 6),
    ("masterpiece", 3),
    ("award winning", 3),
    ("cinematic", 4),
    ("film", 3),
    ("camera", 3),
    ("lens", 2),
    ("aperture", 2),
    ("depth of field", 3),
    ("bokeh", 2),
    ("natural", 3),
    ("organic", 2),
    ("texture", 2),
    ("material", 2),
    ("surface", 2),
    ("lighting", 3),
    ("shadow", 2),
    ("reflection", 2),
    ("perspective", 2),
    ("composition", 3),
];

/// Strong-signal words granting a fixed bonus on top of keyword weights
static DREAMSHAPER_SIGNALS: &[&str] = &["anime", "cartoon", "manga", "illustration"];
static REALISTIC_SIGNALS: &[&str] = &["photograph", "photo", "realistic", "real"];

const SIGNAL_BONUS: u32 = 5;

/// Chosen style plus the scoring breakdown for observability
#[derive(Debug, Clone, Serialize)]
pub struct StyleDetection {
    pub style: Style,
    pub dreamshaper_score: u32,
    pub realistic_score: u32,
    pub matched_dreamshaper: Vec<String>,
    pub matched_realistic: Vec<String>,
}

/// Classify a prompt into a model style.
///
/// A strictly greater dreamshaper score selects [`Style::Dreamshaper`];
/// ties and everything else fall back to [`Style::RealisticVision`].
pub fn classify(prompt: &str) -> StyleDetection {
    let prompt = prompt.to_lowercase();

    let (mut dreamshaper_score, matched_dreamshaper) = score(&prompt, DREAMSHAPER_KEYWORDS);
    let (mut realistic_score, matched_realistic) = score(&prompt, REALISTIC_KEYWORDS);

    if DREAMSHAPER_SIGNALS.iter().any(|w| prompt.contains(w)) {
        dreamshaper_score += SIGNAL_BONUS;
    }
    if REALISTIC_SIGNALS.iter().any(|w| prompt.contains(w)) {
        realistic_score += SIGNAL_BONUS;
    }

    let style = if dreamshaper_score > realistic_score {
        Style::Dreamshaper
    } else {
        Style::RealisticVision
    };

    debug!(
        dreamshaper = dreamshaper_score,
        realistic = realistic_score,
        style = %style,
        "Style detection"
    );

    StyleDetection {
        style,
        dreamshaper_score,
        realistic_score,
        matched_dreamshaper,
        matched_realistic,
    }
}

fn score(prompt: &str, table: &[(&str, u32)]) -> (u32, Vec<String>) {
    let mut total = 0;
    let mut matched = Vec::new();

    for &(keyword, weight) in table {
        if prompt.contains(keyword) {
            total += weight;
            matched.push(format!("{keyword} (+{weight})"));
        }
    }

    (total, matched)
}

//! Outline types handed to serialization.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Heading depth, serialized as `"H1"`, `"H2"`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    /// Top-level heading.
    pub const H1: HeadingLevel = HeadingLevel(1);
    /// Second-level heading.
    pub const H2: HeadingLevel = HeadingLevel(2);
    /// Third-level heading.
    pub const H3: HeadingLevel = HeadingLevel(3);

    /// Create a level from its depth (1 = top). Returns `None` for 0.
    pub fn new(depth: u8) -> Option<Self> {
        (depth > 0).then_some(Self(depth))
    }

    /// Depth of this level (1 = top).
    pub fn depth(self) -> u8 {
        self.0
    }

    /// The next deeper level (H1 -> H2).
    pub fn demoted(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The next shallower level, saturating at H1.
    pub fn promoted(self) -> Self {
        Self(self.0.saturating_sub(1).max(1))
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.0)
    }
}

impl From<HeadingLevel> for String {
    fn from(level: HeadingLevel) -> Self {
        level.to_string()
    }
}

impl TryFrom<String> for HeadingLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .strip_prefix('H')
            .or_else(|| value.strip_prefix('h'))
            .and_then(|n| n.parse::<u8>().ok())
            .and_then(HeadingLevel::new)
            .ok_or_else(|| format!("invalid heading level: {value:?}"))
    }
}

/// A language code attached to outline text.
///
/// Purely informational; never influences classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LanguageTag {
    /// ISO 639-3 code reported by the detector
    Known(String),
    /// Detection failed or was inconclusive
    Unknown,
}

impl LanguageTag {
    /// Serialized form of [`LanguageTag::Unknown`].
    pub const UNKNOWN: &'static str = "unknown";

    /// The code, or `"unknown"`.
    pub fn as_str(&self) -> &str {
        match self {
            LanguageTag::Known(code) => code,
            LanguageTag::Unknown => Self::UNKNOWN,
        }
    }

    /// Check if detection failed.
    pub fn is_unknown(&self) -> bool {
        matches!(self, LanguageTag::Unknown)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for LanguageTag {
    fn from(value: String) -> Self {
        if value.is_empty() || value == Self::UNKNOWN {
            LanguageTag::Unknown
        } else {
            LanguageTag::Known(value)
        }
    }
}

impl From<LanguageTag> for String {
    fn from(tag: LanguageTag) -> Self {
        tag.as_str().to_string()
    }
}

/// One outline entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading depth
    pub level: HeadingLevel,
    /// Heading text
    pub text: String,
    /// Zero-based page index
    pub page: usize,
    /// Language of the heading text, when per-heading tagging is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<LanguageTag>,
}

impl Heading {
    /// Create a heading without a language tag.
    pub fn new(level: HeadingLevel, text: impl Into<String>, page: usize) -> Self {
        Self {
            level,
            text: text.into(),
            page,
            language: None,
        }
    }
}

/// The per-document result: title, ordered headings and timing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Document title, empty when none was detected
    pub title: String,
    /// Headings in reading order
    pub outline: Vec<Heading>,
    /// Wall-clock processing time in seconds
    #[serde(serialize_with = "serialize_seconds")]
    pub time_taken_seconds: f64,
    /// Document language, when language tagging is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<LanguageTag>,
}

impl Outline {
    /// Create an empty outline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the elapsed processing time.
    pub fn with_time_taken(mut self, elapsed: std::time::Duration) -> Self {
        self.time_taken_seconds = elapsed.as_secs_f64();
        self
    }

    /// Check if neither a title nor any heading was found.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.outline.is_empty()
    }

    /// Number of headings at the given level.
    pub fn count_at(&self, level: HeadingLevel) -> usize {
        self.outline.iter().filter(|h| h.level == level).count()
    }
}

/// Round seconds to two decimals on the way out.
fn serialize_seconds<S: Serializer>(seconds: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((seconds * 100.0).round() / 100.0)
}

//! Noise filtering: lines that can never be headings.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::{Line, PageLines};

use super::config::OutlineConfig;

/// Built-in boilerplate patterns, matched against lowercased text.
const BUILTIN_PATTERNS: &[&str] = &[
    // "page 3", "page 3 of 10"
    r"^page\s*\d+",
    // "3 of 10", "3 / 10"
    r"^\d+\s*(?:of|/)\s*\d+$",
    r"^(?:www\.|https?://)",
    r"[\w.+-]+@[\w-]+\.[\w.]+",
    r"^(?:©|\(c\)\s|copyright\b)",
    r"all rights reserved",
];

/// Short lines that still count as section markers ("A", "IV.", "B)").
const SECTION_MARKER: &str = r"^(?:[A-Z]|[IVXLC]{1,4})[.)]?$";

/// Why a line was rejected as a heading candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Longer than `max_chars`
    TooLong,
    /// Shorter than `min_chars` and not a section marker
    TooShort,
    /// Contains no letters (page numbers, rules, dates)
    NoLetters,
    /// Matches a stoplist phrase or boilerplate pattern
    Boilerplate,
    /// Recurs at the same vertical position on too many pages
    Repeated,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::TooLong => "too long",
            Rejection::TooShort => "too short",
            Rejection::NoLetters => "no letters",
            Rejection::Boilerplate => "boilerplate",
            Rejection::Repeated => "repeated",
        };
        f.write_str(reason)
    }
}

/// Rejects lines that cannot be headings regardless of their font.
///
/// Holds a per-document map from normalized line text to the pages and
/// relative positions it occurs at, so it must be built from the whole
/// document before any line is checked.
pub struct NoiseFilter<'a> {
    config: &'a OutlineConfig,
    patterns: Vec<Regex>,
    section_marker: Regex,
    stoplist: HashSet<String>,
    occurrences: HashMap<String, Vec<Occurrence>>,
}

/// One sighting of a line: page index and position relative to page height.
#[derive(Debug, Clone, Copy)]
struct Occurrence {
    page: usize,
    rel_y: Option<f32>,
}

impl<'a> NoiseFilter<'a> {
    /// Build the filter and its repetition map from every page of a document.
    pub fn new(config: &'a OutlineConfig, pages: &[PageLines]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(BUILTIN_PATTERNS.len());
        for pattern in BUILTIN_PATTERNS
            .iter()
            .copied()
            .chain(config.boilerplate_patterns.iter().map(String::as_str))
        {
            let re = Regex::new(pattern).map_err(|e| {
                Error::InvalidConfig(format!("bad boilerplate pattern {pattern:?}: {e}"))
            })?;
            patterns.push(re);
        }
        let section_marker =
            Regex::new(SECTION_MARKER).map_err(|e| Error::InvalidConfig(e.to_string()))?;

        let stoplist = config
            .boilerplate
            .iter()
            .map(|phrase| letters_only(&normalize_key(phrase)))
            .filter(|phrase| !phrase.is_empty())
            .collect();

        let mut occurrences: HashMap<String, Vec<Occurrence>> = HashMap::new();
        for page in pages {
            for line in &page.lines {
                occurrences
                    .entry(normalize_key(&line.text))
                    .or_default()
                    .push(Occurrence {
                        page: page.index,
                        rel_y: page.relative_y(line.y),
                    });
            }
        }

        Ok(Self {
            config,
            patterns,
            section_marker,
            stoplist,
            occurrences,
        })
    }

    /// Check a line. `None` means the line stays a heading candidate.
    pub fn check(&self, line: &Line, page: &PageLines) -> Option<Rejection> {
        let chars = line.char_count();

        if chars > self.config.max_chars {
            return Some(Rejection::TooLong);
        }
        if chars < self.config.min_chars && !self.section_marker.is_match(&line.text) {
            return Some(Rejection::TooShort);
        }
        if !line.text.chars().any(char::is_alphabetic) {
            return Some(Rejection::NoLetters);
        }

        let key = normalize_key(&line.text);
        let lower = line.text.to_lowercase();
        if self.stoplist.contains(&letters_only(&key))
            || self.patterns.iter().any(|re| re.is_match(&lower))
        {
            return Some(Rejection::Boilerplate);
        }

        if self.other_pages(&key, page, line) >= self.config.repeat_threshold {
            return Some(Rejection::Repeated);
        }

        None
    }

    /// Convenience wrapper around [`NoiseFilter::check`].
    pub fn keeps(&self, line: &Line, page: &PageLines) -> bool {
        self.check(line, page).is_none()
    }

    /// Number of other pages carrying the same text within `repeat_band`
    /// of this line's relative position.
    fn other_pages(&self, key: &str, page: &PageLines, line: &Line) -> usize {
        let Some(seen) = self.occurrences.get(key) else {
            return 0;
        };
        let rel_y = page.relative_y(line.y);
        seen.iter()
            .filter(|o| o.page != page.index && near(o.rel_y, rel_y, self.config.repeat_band))
            .map(|o| o.page)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Positions on pages of unknown height only match each other.
fn near(a: Option<f32>, b: Option<f32>, tolerance: f32) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).abs() <= tolerance,
        (None, None) => true,
        _ => false,
    }
}

/// Normalize text for repetition and stoplist matching.
///
/// NFKC-folds, lowercases and collapses whitespace. Digits are kept, so
/// "Chapter 1" and "Chapter 2" stay distinct.
pub fn normalize_key(text: &str) -> String {
    let folded: String = text.nfkc().flat_map(char::to_lowercase).collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep letters and single spaces only.
fn letters_only(key: &str) -> String {
    key.split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

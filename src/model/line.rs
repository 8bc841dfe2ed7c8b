//! Assembled text lines.

use serde::{Deserialize, Serialize};

/// One visual row of text merged from one or more spans.
///
/// `text` is never empty and has its whitespace collapsed. `font_size` is
/// the line's dominant size as chosen by the assembler's size policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Merged, whitespace-normalized text
    pub text: String,
    /// Dominant font size in points
    pub font_size: f32,
    /// Majority of the characters are set in a bold font
    pub is_bold: bool,
    /// All cased letters are uppercase
    pub is_upper: bool,
    /// Leftmost X position
    pub x: f32,
    /// Baseline Y position, measured from the top of the page
    pub y: f32,
    /// Zero-based page index
    pub page: usize,
}

impl Line {
    /// Create a line from already-merged values; flags are derived from the text.
    pub fn new(text: impl Into<String>, font_size: f32, is_bold: bool, y: f32, page: usize) -> Self {
        let text = normalize_whitespace(&text.into());
        let is_upper = is_uppercase_text(&text);
        Self {
            text,
            font_size,
            is_bold,
            is_upper,
            x: 0.0,
            y,
            page,
        }
    }

    /// Whether the font size can take part in statistics and ranking.
    pub fn has_valid_size(&self) -> bool {
        self.font_size.is_finite() && self.font_size > 0.0
    }

    /// Number of characters in the text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Lines of one page in reading order, with the page geometry needed for
/// positional rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLines {
    /// Zero-based page index
    pub index: usize,
    /// Page height in points, 0 when unknown
    pub height: f32,
    /// Lines sorted top to bottom
    pub lines: Vec<Line>,
}

impl PageLines {
    /// Relative vertical position of `y` on this page (0 = top, 1 = bottom).
    ///
    /// Returns `None` when the page height is unknown.
    pub fn relative_y(&self, y: f32) -> Option<f32> {
        if self.height.is_finite() && self.height > 0.0 {
            Some((y / self.height).clamp(0.0, 1.0))
        } else {
            None
        }
    }
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the text has at least one cased letter and no lowercase ones.
///
/// Scripts without case (CJK, Arabic, ...) are never considered uppercase.
pub fn is_uppercase_text(text: &str) -> bool {
    let mut has_upper = false;
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_upper = true;
        }
    }
    has_upper
}

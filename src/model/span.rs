//! Span-level types produced by the extraction backend.

use serde::{Deserialize, Serialize};

/// A run of text sharing one font, size and position.
///
/// Coordinates are top-down: `y` grows towards the bottom of the page and
/// marks the text baseline. `x` is the left edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// Font size in points
    pub font_size: f32,
    /// Whether the font appears to be bold
    pub is_bold: bool,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline, measured from the top of the page)
    pub y: f32,
    /// Advance width of the text, 0 when unknown
    pub width: f32,
    /// Zero-based page index
    pub page: usize,
}

impl TextSpan {
    /// Create a span whose boldness is inferred from the font name.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32, font_name: &str) -> Self {
        Self {
            text: text.into(),
            font_size,
            is_bold: is_bold_font(font_name),
            x,
            y,
            width: 0.0,
            page: 0,
        }
    }

    /// Create a span with an explicit bold flag.
    pub fn styled(text: impl Into<String>, font_size: f32, is_bold: bool, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
            is_bold,
            x,
            y,
            width: 0.0,
            page: 0,
        }
    }

    /// Set the advance width.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Set the page index.
    pub fn on_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Whether the span's font size is usable for statistics.
    pub fn has_valid_size(&self) -> bool {
        self.font_size.is_finite() && self.font_size > 0.0
    }

    /// Width of the span, estimated from the font size when unknown.
    pub fn effective_width(&self) -> f32 {
        if self.width > 0.0 {
            return self.width;
        }
        let size = if self.has_valid_size() { self.font_size } else { 10.0 };
        self.text.chars().count() as f32 * size * 0.5
    }

    /// Right edge of the span.
    pub fn right(&self) -> f32 {
        self.x + self.effective_width()
    }
}

/// Infer boldness from a PostScript/base font name such as `Helvetica-Bold`.
pub fn is_bold_font(font_name: &str) -> bool {
    let name = font_name.to_lowercase();
    ["bold", "black", "heavy", "semibold", "demi"]
        .iter()
        .any(|marker| name.contains(marker))
}

/// All spans of one page, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSpans {
    /// Zero-based page index
    pub index: usize,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Spans in extraction order
    pub spans: Vec<TextSpan>,
}

impl PageSpans {
    /// Create an empty page with the given dimensions.
    pub fn new(index: usize, width: f32, height: f32) -> Self {
        Self {
            index,
            width,
            height,
            spans: Vec::new(),
        }
    }

    /// Create an empty page with standard Letter size (8.5 x 11 inches).
    pub fn letter(index: usize) -> Self {
        Self::new(index, 612.0, 792.0)
    }

    /// Create an empty page with standard A4 size (210 x 297 mm).
    pub fn a4(index: usize) -> Self {
        Self::new(index, 595.0, 842.0)
    }

    /// Add a span, stamping it with this page's index.
    pub fn push(&mut self, span: TextSpan) {
        self.spans.push(span.on_page(self.index));
    }

    /// Builder-style variant of [`PageSpans::push`].
    pub fn with_span(mut self, span: TextSpan) -> Self {
        self.push(span);
        self
    }

    /// Check if the page has no spans.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_span_bold_detection() {
        let span = TextSpan::new("Test", 0.0, 0.0, 12.0, "Helvetica-Bold");
        assert!(span.is_bold);

        let span = TextSpan::new("Test", 0.0, 0.0, 12.0, "ABCDEE+Arial-BlackItalic");
        assert!(span.is_bold);

        let span = TextSpan::new("Test", 0.0, 0.0, 12.0, "Helvetica-Oblique");
        assert!(!span.is_bold);
    }

    #[test]
    fn test_effective_width_estimate() {
        let span = TextSpan::styled("abcd", 10.0, false, 0.0, 0.0);
        assert!((span.effective_width() - 20.0).abs() < f32::EPSILON);

        let span = span.with_width(33.0);
        assert!((span.right() - 33.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(!TextSpan::styled("x", 0.0, false, 0.0, 0.0).has_valid_size());
        assert!(!TextSpan::styled("x", -3.0, false, 0.0, 0.0).has_valid_size());
        assert!(!TextSpan::styled("x", f32::NAN, false, 0.0, 0.0).has_valid_size());
        assert!(TextSpan::styled("x", 9.5, false, 0.0, 0.0).has_valid_size());
    }

    #[test]
    fn test_page_push_stamps_index() {
        let page = PageSpans::a4(3).with_span(TextSpan::styled("Intro", 14.0, true, 72.0, 90.0));
        assert_eq!(page.spans[0].page, 3);
        assert_eq!(page.height, 842.0);
    }
}

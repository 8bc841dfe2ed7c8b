//! Line assembly: merging a page's spans into visual lines.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::model::{is_uppercase_text, normalize_whitespace, Line, PageLines, PageSpans, TextSpan};

use super::config::{OutlineConfig, SizePolicy};

/// Font size assumed when computing tolerances for spans with a broken size.
const FALLBACK_SIZE: f32 = 10.0;

/// Groups spans into lines by vertical proximity.
///
/// Spans are consumed in extraction order with a single open line. A span
/// whose baseline lies within `line_tolerance × font size` of the open
/// line's baseline joins it; anything else closes the line and opens a new
/// one. Closed lines are finally sorted top to bottom.
pub struct LineAssembler<'a> {
    config: &'a OutlineConfig,
}

impl<'a> LineAssembler<'a> {
    /// Create an assembler for the given configuration.
    pub fn new(config: &'a OutlineConfig) -> Self {
        Self { config }
    }

    /// Assemble all lines of one page.
    pub fn assemble(&self, page: &PageSpans) -> PageLines {
        let mut lines: Vec<Line> = Vec::new();
        let mut current: Vec<&TextSpan> = Vec::new();

        for span in page.spans.iter().filter(|s| !s.text.trim().is_empty()) {
            let joins = current
                .first()
                .map(|anchor| self.same_line(anchor, span))
                .unwrap_or(true);

            if !joins {
                lines.extend(self.merge(&current, page.index));
                current.clear();
            }
            current.push(span);
        }
        lines.extend(self.merge(&current, page.index));

        // Stable, so lines sharing a baseline keep extraction order.
        lines.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal));

        log::debug!("Page {}: {} spans -> {} lines", page.index, page.spans.len(), lines.len());

        PageLines {
            index: page.index,
            height: page.height,
            lines,
        }
    }

    /// Check whether `span` belongs on the line opened by `anchor`.
    fn same_line(&self, anchor: &TextSpan, span: &TextSpan) -> bool {
        if !anchor.y.is_finite() || !span.y.is_finite() {
            return false;
        }
        let size = tolerance_size(anchor).max(tolerance_size(span));
        (span.y - anchor.y).abs() <= size * self.config.line_tolerance
    }

    /// Merge the spans of one line. Returns `None` if no text survives.
    fn merge(&self, spans: &[&TextSpan], page: usize) -> Option<Line> {
        let anchor = spans.first()?;

        let mut ordered: Vec<&TextSpan> = spans.to_vec();
        ordered.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

        let text = normalize_whitespace(&join_spans(&ordered));
        if text.is_empty() {
            return None;
        }

        let font_size = match self.config.size_policy {
            SizePolicy::Dominant => self.dominant_size(&ordered),
            SizePolicy::Maximum => maximum_size(&ordered),
        };

        let is_upper = is_uppercase_text(&text);
        Some(Line {
            text,
            font_size,
            is_bold: is_mostly_bold(&ordered),
            is_upper,
            x: ordered.first().map(|s| s.x).unwrap_or(anchor.x),
            y: anchor.y,
            page,
        })
    }

    /// The size carrying the most characters; ties go to the larger size.
    /// Returns 0.0 when no span has a usable size.
    fn dominant_size(&self, spans: &[&TextSpan]) -> f32 {
        let mut weights: BTreeMap<i64, (usize, f32)> = BTreeMap::new();
        for span in spans.iter().filter(|s| s.has_valid_size()) {
            let chars = span.text.chars().filter(|c| !c.is_whitespace()).count();
            let entry = weights
                .entry(self.config.size_key(span.font_size))
                .or_insert((0, span.font_size));
            entry.0 += chars;
            entry.1 = entry.1.max(span.font_size);
        }

        // Keys ascend, so `>=` lets a larger size win a tie.
        let mut best: Option<(usize, f32)> = None;
        for &(count, size) in weights.values() {
            if best.map(|(c, _)| count >= c).unwrap_or(true) {
                best = Some((count, size));
            }
        }
        best.map(|(_, size)| size).unwrap_or(0.0)
    }
}

fn tolerance_size(span: &TextSpan) -> f32 {
    if span.has_valid_size() {
        span.font_size
    } else {
        FALLBACK_SIZE
    }
}

fn maximum_size(spans: &[&TextSpan]) -> f32 {
    spans
        .iter()
        .filter(|s| s.has_valid_size())
        .map(|s| s.font_size)
        .fold(0.0, f32::max)
}

/// Strictly more than half of the visible characters are bold.
fn is_mostly_bold(spans: &[&TextSpan]) -> bool {
    let mut bold = 0usize;
    let mut total = 0usize;
    for span in spans {
        let chars = span.text.chars().filter(|c| !c.is_whitespace()).count();
        total += chars;
        if span.is_bold {
            bold += chars;
        }
    }
    total > 0 && bold * 2 > total
}

/// Concatenate x-sorted spans, inserting a space only across real gaps.
fn join_spans(spans: &[&TextSpan]) -> String {
    let mut result = String::new();

    for (i, span) in spans.iter().enumerate() {
        if i == 0 {
            result.push_str(&span.text);
            continue;
        }

        let prev = spans[i - 1];
        let gap = span.x - prev.right();

        let char_count = span.text.chars().count();
        let avg_char_width = if char_count > 0 && span.width > 0.0 {
            span.width / char_count as f32
        } else {
            tolerance_size(span) * 0.5
        };

        // Gaps under 20% of a character are kerning, not word spaces.
        let separated = gap > avg_char_width * 0.2;

        let prev_cjk = prev.text.chars().last().map(is_spaceless_script_char).unwrap_or(false);
        let curr_cjk = span.text.chars().next().map(is_spaceless_script_char).unwrap_or(false);

        let has_space = prev.text.ends_with(char::is_whitespace)
            || span.text.starts_with(char::is_whitespace);

        if separated && !(prev_cjk && curr_cjk) && !has_space {
            result.push(' ');
        }
        result.push_str(&span.text);
    }

    result
}

/// Characters from scripts that do not separate words with spaces.
///
/// Chinese and Japanese qualify; Korean uses word spaces and does not.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and Extension A
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    // Extensions B-F
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(spans: Vec<TextSpan>) -> PageSpans {
        let mut page = PageSpans::letter(0);
        for span in spans {
            page.push(span);
        }
        page
    }

    fn assemble(spans: Vec<TextSpan>) -> Vec<Line> {
        let config = OutlineConfig::default();
        LineAssembler::new(&config).assemble(&page(spans)).lines
    }

    #[test]
    fn test_empty_page_yields_no_lines() {
        assert!(assemble(vec![]).is_empty());
    }

    #[test]
    fn test_whitespace_spans_dropped() {
        let lines = assemble(vec![
            TextSpan::styled("   ", 12.0, false, 72.0, 100.0),
            TextSpan::styled("\t", 12.0, false, 72.0, 200.0),
        ]);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_adjacent_fragments_join_without_space() {
        let lines = assemble(vec![
            TextSpan::styled("Intro", 12.0, true, 72.0, 100.0).with_width(30.0),
            TextSpan::styled("duction", 12.0, false, 102.0, 100.2).with_width(42.0),
        ]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Introduction");
    }

    #[test]
    fn test_separated_spans_join_with_space() {
        let lines = assemble(vec![
            TextSpan::styled("Market", 14.0, false, 72.0, 100.0).with_width(40.0),
            TextSpan::styled("Analysis", 14.0, false, 120.0, 101.0).with_width(50.0),
        ]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Market Analysis");
    }

    #[test]
    fn test_spans_sorted_by_x_within_line() {
        let lines = assemble(vec![
            TextSpan::styled("World", 12.0, false, 140.0, 100.0).with_width(30.0),
            TextSpan::styled("Hello", 12.0, false, 72.0, 100.0).with_width(30.0),
        ]);
        assert_eq!(lines[0].text, "Hello World");
    }

    #[test]
    fn test_vertical_gap_starts_new_line() {
        let lines = assemble(vec![
            TextSpan::styled("First", 12.0, false, 72.0, 100.0),
            TextSpan::styled("Second", 12.0, false, 72.0, 116.0),
        ]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "First");
        assert_eq!(lines[1].text, "Second");
    }

    #[test]
    fn test_lines_emitted_in_reading_order() {
        let lines = assemble(vec![
            TextSpan::styled("Bottom", 12.0, false, 72.0, 700.0),
            TextSpan::styled("Top", 12.0, false, 72.0, 80.0),
            TextSpan::styled("Middle", 12.0, false, 72.0, 400.0),
        ]);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["Top", "Middle", "Bottom"]);
    }

    #[test]
    fn test_bold_requires_majority() {
        let lines = assemble(vec![
            TextSpan::styled("Key", 12.0, true, 72.0, 100.0).with_width(18.0),
            TextSpan::styled("findings of the year", 12.0, false, 100.0, 100.0),
        ]);
        assert!(!lines[0].is_bold);

        let lines = assemble(vec![
            TextSpan::styled("Key findings", 12.0, true, 72.0, 100.0).with_width(70.0),
            TextSpan::styled("(2)", 12.0, false, 150.0, 100.0),
        ]);
        assert!(lines[0].is_bold);
    }

    #[test]
    fn test_uppercase_flag() {
        let lines = assemble(vec![TextSpan::styled("2. RESULTS", 12.0, false, 72.0, 100.0)]);
        assert!(lines[0].is_upper);
    }

    #[test]
    fn test_dominant_size_policy() {
        let lines = assemble(vec![
            TextSpan::styled("A", 20.0, false, 72.0, 100.0).with_width(14.0),
            TextSpan::styled("nnual overview", 12.0, false, 86.0, 100.0),
        ]);
        assert_eq!(lines[0].font_size, 12.0);

        let config = OutlineConfig::new().with_size_policy(SizePolicy::Maximum);
        let page = page(vec![
            TextSpan::styled("A", 20.0, false, 72.0, 100.0).with_width(14.0),
            TextSpan::styled("nnual overview", 12.0, false, 86.0, 100.0),
        ]);
        let lines = LineAssembler::new(&config).assemble(&page).lines;
        assert_eq!(lines[0].font_size, 20.0);
    }

    #[test]
    fn test_malformed_sizes_yield_zero() {
        let lines = assemble(vec![TextSpan::styled("Broken", -1.0, true, 72.0, 100.0)]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].font_size, 0.0);
        assert!(!lines[0].has_valid_size());
    }

    #[test]
    fn test_cjk_fragments_join_without_space() {
        let lines = assemble(vec![
            TextSpan::styled("概要", 12.0, false, 72.0, 100.0).with_width(24.0),
            TextSpan::styled("説明", 12.0, false, 110.0, 100.0).with_width(24.0),
        ]);
        assert_eq!(lines[0].text, "概要説明");
    }

    #[test]
    fn test_is_spaceless_script_char() {
        assert!(is_spaceless_script_char('中'));
        assert!(is_spaceless_script_char('カ'));
        assert!(!is_spaceless_script_char('한'));
        assert!(!is_spaceless_script_char('a'));
    }
}

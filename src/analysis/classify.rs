//! Heading classification from font-size rank, emphasis and position.

use crate::model::{HeadingLevel, Line, PageLines};

use super::config::{MarginPolicy, OutlineConfig};
use super::stats::{FontStatistics, SizeEntry};

/// The sizes that can carry headings, largest first.
///
/// Only sizes strictly above the document average take part, and only
/// those actually used by heading candidates (lines kept by the noise
/// filter and not consumed by the title). Rank 1 is the first entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadingScale {
    entries: Vec<SizeEntry>,
}

impl HeadingScale {
    /// Build the scale from the document statistics and candidate line sizes.
    pub fn new<I>(stats: &FontStatistics, candidate_sizes: I) -> Self
    where
        I: IntoIterator<Item = f32>,
    {
        let keys: Vec<i64> = candidate_sizes
            .into_iter()
            .filter(|&size| !stats.is_body_size(size))
            .filter_map(|size| stats.key(size))
            .collect();

        let entries: Vec<SizeEntry> = stats
            .entries()
            .iter()
            .filter(|e| keys.contains(&e.key))
            .copied()
            .collect();

        log::debug!(
            "Heading scale: {:?}",
            entries.iter().map(|e| e.size).collect::<Vec<_>>()
        );

        Self { entries }
    }

    /// Rank of a size on the scale (1 = largest), `None` if it is not a
    /// heading size.
    pub fn rank_of(&self, stats: &FontStatistics, size: f32) -> Option<usize> {
        let key = stats.key(size)?;
        self.entries.iter().position(|e| e.key == key).map(|i| i + 1)
    }

    /// Heading sizes, largest first.
    pub fn sizes(&self) -> Vec<f32> {
        self.entries.iter().map(|e| e.size).collect()
    }

    /// Number of distinct heading sizes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the document has no heading sizes at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn size_at_rank(&self, rank: usize) -> Option<f32> {
        rank.checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(|e| e.size)
    }
}

/// Assigns heading levels to filtered lines.
///
/// Pure: the same line, statistics, scale and configuration always give
/// the same answer.
pub struct HeadingClassifier<'a> {
    config: &'a OutlineConfig,
    stats: &'a FontStatistics,
    scale: &'a HeadingScale,
}

impl<'a> HeadingClassifier<'a> {
    pub fn new(config: &'a OutlineConfig, stats: &'a FontStatistics, scale: &'a HeadingScale) -> Self {
        Self { config, stats, scale }
    }

    /// Classify one line. `None` means body text or otherwise not a heading.
    pub fn classify(&self, line: &Line, page: &PageLines) -> Option<HeadingLevel> {
        if !line.has_valid_size() || self.stats.is_body_size(line.font_size) {
            return None;
        }

        let rank = self.scale.rank_of(self.stats, line.font_size)?;
        let mut level = HeadingLevel::new(u8::try_from(rank).unwrap_or(u8::MAX))?;

        if self.promotable(line, rank) {
            level = level.promoted();
        }

        if self.in_margin_band(line, page) {
            match self.config.margin_policy {
                MarginPolicy::Demote => level = level.demoted(),
                MarginPolicy::Reject => return None,
            }
        }

        (level.depth() <= self.config.max_heading_level).then_some(level)
    }

    /// Bold and uppercase bias may lift a line whose size sits just below
    /// the next larger heading size.
    fn promotable(&self, line: &Line, rank: usize) -> bool {
        let mut bias = 0.0;
        if line.is_bold {
            bias += self.config.bold_bias;
        }
        if line.is_upper {
            bias += self.config.upper_bias;
        }
        if bias <= 0.0 {
            return false;
        }

        match self.scale.size_at_rank(rank - 1) {
            Some(larger) => larger - line.font_size <= bias.min(self.config.promotion_window),
            None => false,
        }
    }

    fn in_margin_band(&self, line: &Line, page: &PageLines) -> bool {
        let band = self.config.margin_band;
        match page.relative_y(line.y) {
            Some(rel) => rel < band || rel > 1.0 - band,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_lines(count: usize) -> Vec<Line> {
        (0..count)
            .map(|i| Line::new(format!("body text {i}"), 10.0, false, 200.0 + i as f32, 0))
            .collect()
    }

    fn setup(extra: &[f32]) -> (OutlineConfig, FontStatistics, HeadingScale) {
        let config = OutlineConfig::default();
        let mut lines = body_lines(20);
        lines.extend(extra.iter().map(|&s| Line::new("Heading", s, false, 100.0, 0)));
        let stats = FontStatistics::from_lines(&lines, &config);
        let scale = HeadingScale::new(&stats, extra.iter().copied());
        (config, stats, scale)
    }

    fn page() -> PageLines {
        PageLines {
            index: 0,
            height: 800.0,
            lines: vec![],
        }
    }

    fn heading(size: f32, bold: bool, y: f32) -> Line {
        Line::new("Results", size, bold, y, 0)
    }

    #[test]
    fn test_rank_maps_to_level() {
        let (config, stats, scale) = setup(&[18.0, 14.0, 12.0, 11.0]);
        let classifier = HeadingClassifier::new(&config, &stats, &scale);
        let page = page();

        assert_eq!(classifier.classify(&heading(18.0, false, 300.0), &page), Some(HeadingLevel::H1));
        assert_eq!(classifier.classify(&heading(14.0, false, 300.0), &page), Some(HeadingLevel::H2));
        assert_eq!(classifier.classify(&heading(12.0, false, 300.0), &page), Some(HeadingLevel::H3));
        // Rank 4 exceeds the default ceiling
        assert_eq!(classifier.classify(&heading(11.0, false, 300.0), &page), None);
    }

    #[test]
    fn test_body_text_never_heading() {
        let (config, stats, scale) = setup(&[18.0]);
        let classifier = HeadingClassifier::new(&config, &stats, &scale);
        let mut line = Line::new("EMPHASIZED BODY", 10.0, true, 300.0, 0);
        line.is_upper = true;
        assert_eq!(classifier.classify(&line, &page()), None);
    }

    #[test]
    fn test_malformed_size_is_body() {
        let (config, stats, scale) = setup(&[18.0]);
        let classifier = HeadingClassifier::new(&config, &stats, &scale);
        for size in [0.0, -3.0, f32::NAN, f32::INFINITY] {
            assert_eq!(classifier.classify(&heading(size, true, 300.0), &page()), None);
        }
    }

    #[test]
    fn test_bold_promotes_borderline_rank() {
        let (config, stats, scale) = setup(&[14.0, 13.6, 12.0]);
        let classifier = HeadingClassifier::new(&config, &stats, &scale);
        let page = page();

        assert_eq!(classifier.classify(&heading(13.6, false, 300.0), &page), Some(HeadingLevel::H2));
        assert_eq!(classifier.classify(&heading(13.6, true, 300.0), &page), Some(HeadingLevel::H1));
        // 12 is two points below 13.6: too far for a bias of 0.5
        assert_eq!(classifier.classify(&heading(12.0, true, 300.0), &page), Some(HeadingLevel::H3));
    }

    #[test]
    fn test_bold_and_upper_biases_add_up() {
        let (config, stats, scale) = setup(&[14.0, 13.2]);
        let classifier = HeadingClassifier::new(&config, &stats, &scale);

        assert_eq!(classifier.classify(&heading(13.2, true, 300.0), &page()), Some(HeadingLevel::H2));

        let upper = Line::new("RESULTS", 13.2, true, 300.0, 0);
        assert!(upper.is_upper);
        assert_eq!(classifier.classify(&upper, &page()), Some(HeadingLevel::H1));
    }

    #[test]
    fn test_margin_band_demotes_or_rejects() {
        let (config, stats, scale) = setup(&[18.0, 14.0]);
        let page = page();
        let classifier = HeadingClassifier::new(&config, &stats, &scale);

        // 20 / 800 = 2.5% from the top
        assert_eq!(classifier.classify(&heading(18.0, false, 20.0), &page), Some(HeadingLevel::H2));
        assert_eq!(classifier.classify(&heading(18.0, false, 790.0), &page), Some(HeadingLevel::H2));

        let shallow = OutlineConfig::default().with_max_heading_level(2);
        let classifier = HeadingClassifier::new(&shallow, &stats, &scale);
        assert_eq!(classifier.classify(&heading(14.0, false, 20.0), &page), None);

        let reject = OutlineConfig::default().with_margin_policy(MarginPolicy::Reject);
        let classifier = HeadingClassifier::new(&reject, &stats, &scale);
        assert_eq!(classifier.classify(&heading(18.0, false, 20.0), &page), None);
        assert_eq!(classifier.classify(&heading(18.0, false, 400.0), &page), Some(HeadingLevel::H1));
    }

    #[test]
    fn test_unknown_page_height_skips_margin_rule() {
        let (config, stats, scale) = setup(&[18.0]);
        let classifier = HeadingClassifier::new(&config, &stats, &scale);
        let unknown = PageLines::default();
        assert_eq!(classifier.classify(&heading(18.0, false, 1.0), &unknown), Some(HeadingLevel::H1));
    }

    #[test]
    fn test_scale_ignores_sizes_without_candidates() {
        let config = OutlineConfig::default();
        let mut lines = body_lines(20);
        lines.push(Line::new("Report Title", 24.0, false, 40.0, 0));
        lines.push(Line::new("Summary", 18.0, true, 200.0, 0));
        let stats = FontStatistics::from_lines(&lines, &config);

        // The title line is not a candidate, so 18pt becomes rank 1.
        let scale = HeadingScale::new(&stats, [18.0, 10.0]);
        assert_eq!(scale.sizes(), vec![18.0]);
        assert_eq!(scale.rank_of(&stats, 18.0), Some(1));
        assert_eq!(scale.rank_of(&stats, 24.0), None);
    }
}

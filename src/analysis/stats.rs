//! Document-wide font size statistics.

use std::collections::BTreeMap;

use crate::model::{Line, PageLines};

use super::config::OutlineConfig;

/// A distinct (quantized) font size and how many lines use it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeEntry {
    /// Quantization key, `round(size / size_epsilon)`
    pub key: i64,
    /// Largest raw size that quantized to this key
    pub size: f32,
    /// Number of lines at this size
    pub count: usize,
}

/// Font statistics for one document.
///
/// Built once from every assembled line before any classification happens
/// and never mutated afterwards. Lines with a missing or non-positive size
/// are left out entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct FontStatistics {
    /// Distinct sizes, largest first; index + 1 is the rank
    sizes: Vec<SizeEntry>,
    /// Arithmetic mean of all valid line sizes (the body baseline)
    average_size: f32,
    /// Number of lines that contributed
    line_count: usize,
    /// Quantization step used for `key`
    epsilon: f32,
}

impl FontStatistics {
    /// Collect statistics over every line of every page.
    pub fn from_pages(pages: &[PageLines], config: &OutlineConfig) -> Self {
        Self::from_lines(pages.iter().flat_map(|p| p.lines.iter()), config)
    }

    /// Collect statistics over the given lines.
    pub fn from_lines<'l, I>(lines: I, config: &OutlineConfig) -> Self
    where
        I: IntoIterator<Item = &'l Line>,
    {
        let mut by_key: BTreeMap<i64, SizeEntry> = BTreeMap::new();
        let mut total = 0.0f64;
        let mut line_count = 0usize;

        for line in lines.into_iter().filter(|l| l.has_valid_size()) {
            let key = config.size_key(line.font_size);
            let entry = by_key.entry(key).or_insert(SizeEntry {
                key,
                size: line.font_size,
                count: 0,
            });
            entry.count += 1;
            entry.size = entry.size.max(line.font_size);

            total += f64::from(line.font_size);
            line_count += 1;
        }

        let average_size = if line_count > 0 {
            (total / line_count as f64) as f32
        } else {
            0.0
        };

        let sizes: Vec<SizeEntry> = by_key.into_values().rev().collect();

        log::debug!(
            "Font statistics: {} lines, {} distinct sizes, average {:.2}pt",
            line_count,
            sizes.len(),
            average_size
        );

        Self {
            sizes,
            average_size,
            line_count,
            epsilon: config.size_epsilon,
        }
    }

    /// Distinct sizes, largest first.
    pub fn distinct_sizes(&self) -> Vec<f32> {
        self.sizes.iter().map(|e| e.size).collect()
    }

    /// Distinct size entries, largest first.
    pub fn entries(&self) -> &[SizeEntry] {
        &self.sizes
    }

    /// Rank of a size among all distinct sizes (1 = largest).
    pub fn rank_of(&self, size: f32) -> Option<usize> {
        let key = self.key(size)?;
        self.sizes.iter().position(|e| e.key == key).map(|i| i + 1)
    }

    /// Number of lines set at the given size.
    pub fn count_of(&self, size: f32) -> usize {
        self.key(size)
            .and_then(|key| self.sizes.iter().find(|e| e.key == key))
            .map(|e| e.count)
            .unwrap_or(0)
    }

    /// Mean size of all valid lines; 0 for an empty document.
    pub fn average_size(&self) -> f32 {
        self.average_size
    }

    /// Number of lines with a valid size.
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Check if no line had a usable size.
    pub fn is_empty(&self) -> bool {
        self.line_count == 0
    }

    /// True when a line of this size is presumptively body text: at or below
    /// the average after quantization, or malformed.
    pub fn is_body_size(&self, size: f32) -> bool {
        match (self.key(size), self.key(self.average_size)) {
            (Some(k), Some(avg)) => k <= avg,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    /// Quantization key of a size, `None` for malformed values.
    pub(crate) fn key(&self, size: f32) -> Option<i64> {
        (size.is_finite() && size > 0.0).then(|| (size / self.epsilon).round() as i64)
    }
}

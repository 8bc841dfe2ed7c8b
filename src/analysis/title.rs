//! Title detection on the first page.

use crate::model::PageLines;

use super::config::OutlineConfig;
use super::noise::NoiseFilter;
use super::stats::FontStatistics;

/// The detected title and the page-0 lines it was built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleMatch {
    /// Title text, empty when no line qualified
    pub text: String,
    /// Indices into the first page's lines
    pub lines: Vec<usize>,
}

impl TitleMatch {
    /// Check if no title was found.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Check if the given page-0 line is part of the title.
    pub fn contains(&self, index: usize) -> bool {
        self.lines.contains(&index)
    }
}

/// Picks the title from the largest text at the top of the first page.
///
/// The largest page-0 size must stand out from the document average,
/// otherwise a uniformly set document would get its first line as a title.
/// Lines rejected by the noise filter are only accepted when a single line
/// carries that size.
pub struct TitleDetector<'a> {
    config: &'a OutlineConfig,
    stats: &'a FontStatistics,
}

impl<'a> TitleDetector<'a> {
    pub fn new(config: &'a OutlineConfig, stats: &'a FontStatistics) -> Self {
        Self { config, stats }
    }

    pub fn detect(&self, first_page: &PageLines, filter: &NoiseFilter<'_>) -> TitleMatch {
        let Some(max_key) = first_page
            .lines
            .iter()
            .filter_map(|l| self.stats.key(l.font_size))
            .max()
        else {
            return TitleMatch::default();
        };

        let average_key = self.stats.key(self.stats.average_size());
        if average_key.map(|avg| max_key <= avg).unwrap_or(true) {
            log::debug!("No title: largest page-0 size does not exceed the average");
            return TitleMatch::default();
        }

        let at_max = |i: usize| self.stats.key(first_page.lines[i].font_size) == Some(max_key);
        let single = (0..first_page.lines.len()).filter(|&i| at_max(i)).count() == 1;

        let eligible = |i: usize| {
            let line = &first_page.lines[i];
            let in_region = first_page
                .relative_y(line.y)
                .map(|rel| rel <= self.config.title_region)
                .unwrap_or(true);
            at_max(i) && in_region && (single || filter.keeps(line, first_page))
        };

        // First contiguous run of eligible lines in reading order.
        let lines: Vec<usize> = (0..first_page.lines.len())
            .skip_while(|&i| !eligible(i))
            .take_while(|&i| eligible(i))
            .collect();

        let text = lines
            .iter()
            .map(|&i| first_page.lines[i].text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        log::debug!("Title: {:?} from {} line(s)", text, lines.len());

        TitleMatch { text, lines }
    }
}

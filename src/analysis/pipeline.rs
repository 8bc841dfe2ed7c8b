//! The per-document two-pass driver.
//!
//! Pass one assembles every page into lines and builds the immutable
//! [`FontStatistics`]. Pass two filters, detects the title, classifies and
//! builds the outline against those statistics.

use std::sync::Arc;

use crate::error::Result;
use crate::model::{HeadingLevel, Outline, PageLines, PageSpans};

use super::builder::OutlineBuilder;
use super::classify::{HeadingClassifier, HeadingScale};
use super::config::OutlineConfig;
use super::language::{tag_language, LanguageDetector, WhatlangDetector};
use super::lines::LineAssembler;
use super::noise::{NoiseFilter, Rejection};
use super::stats::FontStatistics;
use super::title::{TitleDetector, TitleMatch};

/// What happened to one assembled line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineVerdict {
    /// Zero-based page index
    pub page: usize,
    /// Index into that page's lines
    pub line: usize,
    /// Noise filter verdict, `None` when kept
    pub rejection: Option<Rejection>,
    /// The line is part of the title
    pub is_title: bool,
    /// Assigned heading level
    pub level: Option<HeadingLevel>,
}

/// Full intermediate state of one document's run.
#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
    /// Assembled lines per page, in input page order
    pub pages: Vec<PageLines>,
    /// Document font statistics
    pub statistics: FontStatistics,
    /// Sizes eligible for headings, largest first
    pub heading_sizes: Vec<f32>,
    /// Detected title
    pub title: TitleMatch,
    /// One verdict per assembled line, page by page
    pub verdicts: Vec<LineVerdict>,
    /// The resulting outline
    pub outline: Outline,
}

impl DocumentAnalysis {
    /// Verdicts for one page.
    pub fn verdicts_for(&self, page: usize) -> impl Iterator<Item = &LineVerdict> {
        self.verdicts.iter().filter(move |v| v.page == page)
    }
}

/// Runs the outline pipeline for one document at a time.
///
/// Holds only configuration and the language detector; all per-document
/// state lives inside a single [`OutlinePipeline::analyze`] call, so one
/// pipeline can serve many documents from many threads.
#[derive(Clone)]
pub struct OutlinePipeline {
    config: OutlineConfig,
    detector: Arc<dyn LanguageDetector>,
}

impl OutlinePipeline {
    /// Create a pipeline, validating the configuration.
    pub fn new(config: OutlineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            detector: Arc::new(WhatlangDetector::default()),
        })
    }

    /// Replace the language detector.
    pub fn with_detector(mut self, detector: impl LanguageDetector + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    /// Extract the outline from a document's spans.
    pub fn run(&self, pages: &[PageSpans]) -> Result<Outline> {
        Ok(self.analyze(pages)?.outline)
    }

    /// Run the pipeline and keep every intermediate result.
    pub fn analyze(&self, pages: &[PageSpans]) -> Result<DocumentAnalysis> {
        let config = &self.config;

        // Pass one
        let assembler = LineAssembler::new(config);
        let pages: Vec<PageLines> = pages.iter().map(|p| assembler.assemble(p)).collect();
        let statistics = FontStatistics::from_pages(&pages, config);

        // Pass two
        let filter = NoiseFilter::new(config, &pages)?;
        let title = pages
            .iter()
            .find(|p| p.index == 0)
            .map(|first| TitleDetector::new(config, &statistics).detect(first, &filter))
            .unwrap_or_default();

        let mut verdicts = Vec::new();
        for page in &pages {
            for (i, line) in page.lines.iter().enumerate() {
                verdicts.push(LineVerdict {
                    page: page.index,
                    line: i,
                    rejection: filter.check(line, page),
                    is_title: page.index == 0 && title.contains(i),
                    level: None,
                });
            }
        }

        let candidate_sizes: Vec<f32> = pages
            .iter()
            .flat_map(|p| p.lines.iter())
            .zip(&verdicts)
            .filter(|(_, v)| v.rejection.is_none() && !v.is_title)
            .map(|(line, _)| line.font_size)
            .collect();
        let scale = HeadingScale::new(&statistics, candidate_sizes);
        let classifier = HeadingClassifier::new(config, &statistics, &scale);

        let mut builder = OutlineBuilder::new(title.text.clone());
        let mut remaining = verdicts.iter_mut();
        for page in &pages {
            // Verdicts were pushed in the same page and line order.
            for (line, verdict) in page.lines.iter().zip(remaining.by_ref()) {
                if verdict.rejection.is_some() || verdict.is_title {
                    continue;
                }
                verdict.level = classifier.classify(line, page);
                if let Some(level) = verdict.level {
                    builder.push(line, level);
                }
            }
        }

        let mut outline = builder.build();
        self.tag(&mut outline);

        log::debug!(
            "Outline: title {:?}, {} headings from {} pages",
            outline.title,
            outline.outline.len(),
            pages.len()
        );

        Ok(DocumentAnalysis {
            pages,
            statistics,
            heading_sizes: scale.sizes(),
            title,
            verdicts,
            outline,
        })
    }

    fn tag(&self, outline: &mut Outline) {
        let detector = self.detector.as_ref();

        if self.config.tag_headings {
            for heading in &mut outline.outline {
                heading.language = Some(tag_language(detector, &heading.text));
            }
        }

        if self.config.tag_language {
            let mut text = outline.title.clone();
            for heading in &outline.outline {
                text.push(' ');
                text.push_str(&heading.text);
            }
            outline.language = Some(tag_language(detector, text.trim()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::language::LanguageError;
    use crate::model::{LanguageTag, TextSpan};

    struct Always(&'static str);

    impl LanguageDetector for Always {
        fn detect(&self, _text: &str) -> std::result::Result<String, LanguageError> {
            Ok(self.0.to_string())
        }
    }

    fn report_page() -> PageSpans {
        let mut page = PageSpans::letter(0);
        page.push(TextSpan::styled("Report Title", 24.0, true, 72.0, 60.0));
        page.push(TextSpan::styled("Summary", 18.0, true, 72.0, 150.0));
        for i in 0..12 {
            page.push(TextSpan::styled(
                format!("Body sentence number {i} of the summary."),
                10.0,
                false,
                72.0,
                180.0 + 14.0 * i as f32,
            ));
        }
        page.push(TextSpan::styled("Findings", 18.0, true, 72.0, 400.0));
        page.push(TextSpan::styled("Notes", 14.0, false, 72.0, 600.0));
        page
    }

    #[test]
    fn test_analyze_records_verdicts() {
        let pipeline = OutlinePipeline::new(OutlineConfig::default()).unwrap();
        let analysis = pipeline.analyze(&[report_page()]).unwrap();

        assert_eq!(analysis.title.text, "Report Title");
        assert_eq!(analysis.verdicts.len(), analysis.pages[0].lines.len());
        assert!(analysis.verdicts[0].is_title);
        assert_eq!(analysis.heading_sizes, vec![18.0, 14.0]);

        let levels: Vec<_> = analysis.verdicts_for(0).filter_map(|v| v.level).collect();
        assert_eq!(levels, [HeadingLevel::H1, HeadingLevel::H1, HeadingLevel::H2]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = OutlineConfig::default().with_max_heading_level(0);
        assert!(OutlinePipeline::new(config).is_err());
    }

    #[test]
    fn test_empty_document() {
        let pipeline = OutlinePipeline::new(OutlineConfig::default()).unwrap();
        let outline = pipeline.run(&[]).unwrap();
        assert!(outline.is_empty());

        let outline = pipeline.run(&[PageSpans::letter(0), PageSpans::letter(1)]).unwrap();
        assert!(outline.is_empty());
    }

    #[test]
    fn test_language_tagging() {
        let config = OutlineConfig::default()
            .with_language(true)
            .with_heading_language(true);
        let pipeline = OutlinePipeline::new(config).unwrap().with_detector(Always("eng"));
        let outline = pipeline.run(&[report_page()]).unwrap();

        assert_eq!(outline.language, Some(LanguageTag::Known("eng".to_string())));
        assert!(outline
            .outline
            .iter()
            .all(|h| h.language == Some(LanguageTag::Known("eng".to_string()))));
    }

    #[test]
    fn test_language_off_by_default() {
        let pipeline = OutlinePipeline::new(OutlineConfig::default()).unwrap();
        let outline = pipeline.run(&[report_page()]).unwrap();
        assert!(outline.language.is_none());
        assert!(outline.outline.iter().all(|h| h.language.is_none()));
    }
}

//! # pdfoutline
//!
//! Document outline extraction for PDF files.
//!
//! Derives a title and a hierarchy of headings (with zero-based page
//! numbers) from typographic and layout cues alone: font-size rank against
//! document-wide statistics, bold and uppercase emphasis, and position on
//! the page. No trained model is involved.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfoutline::{extract_file, render};
//!
//! fn main() -> pdfoutline::Result<()> {
//!     let outline = extract_file("document.pdf")?;
//!
//!     let json = render::to_json(&outline, render::JsonFormat::Pretty)?;
//!     println!("{}", json);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Two-pass analysis**: statistics first, then a pure classifier
//! - **Noise suppression**: running headers/footers, page numbers, boilerplate
//! - **Multilingual**: CJK-aware line assembly, optional language tags
//! - **Batch processing**: a directory of PDFs in parallel with Rayon
//!
//! ## Language tags
//!
//! Language tagging is opt-in so the default JSON carries only `title`,
//! `outline` and `time_taken_seconds`. Enable it with
//! [`OutlineConfig::with_language`] (document) and
//! [`OutlineConfig::with_heading_language`] (per heading). Detection
//! failures become `"unknown"` and never fail a document.

pub mod analysis;
pub mod batch;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use analysis::{
    DocumentAnalysis, LanguageDetector, MarginPolicy, OutlineConfig, OutlinePipeline, SizePolicy,
    WhatlangDetector,
};
pub use batch::{BatchEvent, BatchOptions, BatchProcessor, DocumentReport, TitleFallback};
pub use detect::{has_pdf_extension, is_pdf, sniff_bytes, sniff_path, PdfHeader};
pub use error::{Error, Result};
pub use model::{Heading, HeadingLevel, LanguageTag, Line, Outline, PageSpans, TextSpan};
pub use parser::{LopdfSource, SpanSource};
pub use render::JsonFormat;

use std::io::Read;
use std::path::Path;
use std::time::Instant;

/// Extract the outline of a PDF file with default settings.
///
/// # Example
///
/// ```no_run
/// use pdfoutline::extract_file;
///
/// let outline = extract_file("document.pdf").unwrap();
/// for heading in &outline.outline {
///     println!("{} {} (page {})", heading.level, heading.text, heading.page);
/// }
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Outline> {
    OutlineExtractor::new().extract_file(path)
}

/// Extract the outline of a PDF held in memory.
pub fn extract_bytes(data: &[u8]) -> Result<Outline> {
    OutlineExtractor::new().extract_bytes(data)
}

/// Run the pipeline on spans that were extracted elsewhere.
///
/// Useful when another PDF library produces the spans, and for testing.
/// The returned outline's `time_taken_seconds` is zero.
pub fn extract_pages(pages: &[PageSpans]) -> Result<Outline> {
    OutlinePipeline::new(OutlineConfig::default())?.run(pages)
}

/// Builder for one-off outline extraction.
///
/// # Example
///
/// ```no_run
/// use pdfoutline::{OutlineConfig, OutlineExtractor, TitleFallback};
///
/// let outline = OutlineExtractor::new()
///     .config(OutlineConfig::new().with_max_heading_level(4))
///     .title_fallback(TitleFallback::Metadata)
///     .extract_file("document.pdf")
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct OutlineExtractor {
    config: OutlineConfig,
    title_fallback: TitleFallback,
}

impl OutlineExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the analysis configuration.
    pub fn config(mut self, config: OutlineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the title fallback used when no title is detected.
    pub fn title_fallback(mut self, fallback: TitleFallback) -> Self {
        self.title_fallback = fallback;
        self
    }

    /// Extract from a file path.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<Outline> {
        let start = Instant::now();
        let path = path.as_ref();
        let source = LopdfSource::load_file(path)?;
        self.extract_from(&source, Some(path), start)
    }

    /// Extract from bytes.
    pub fn extract_bytes(&self, data: &[u8]) -> Result<Outline> {
        let start = Instant::now();
        sniff_bytes(data)?;
        let source = LopdfSource::load_bytes(data)?;
        self.extract_from(&source, None, start)
    }

    /// Extract from a reader.
    pub fn extract_reader<R: Read>(&self, mut reader: R) -> Result<Outline> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.extract_bytes(&data)
    }

    fn extract_from(&self, source: &dyn SpanSource, path: Option<&Path>, start: Instant) -> Result<Outline> {
        let pipeline = OutlinePipeline::new(self.config.clone())?;
        let outline = batch::outline_from_source(source, &pipeline, self.title_fallback, path)?;
        Ok(outline.with_time_taken(start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_pages_minimal() {
        let page = PageSpans::letter(0)
            .with_span(TextSpan::styled("Field Notes", 22.0, true, 72.0, 70.0))
            .with_span(TextSpan::styled("Some ordinary text", 10.0, false, 72.0, 200.0))
            .with_span(TextSpan::styled("More ordinary text", 10.0, false, 72.0, 215.0))
            .with_span(TextSpan::styled("Even more text here", 10.0, false, 72.0, 230.0));
        let outline = extract_pages(&[page]).unwrap();
        assert_eq!(outline.title, "Field Notes");
        assert!(outline.outline.is_empty());
        assert_eq!(outline.time_taken_seconds, 0.0);
    }

    #[test]
    fn test_extract_bytes_rejects_non_pdf() {
        assert!(matches!(extract_bytes(b"GIF89a"), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_invalid_config_surfaces() {
        let extractor = OutlineExtractor::new().config(OutlineConfig::new().with_length_bounds(9, 3));
        let result = extractor.extract_from(&FakeEmpty, None, Instant::now());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    struct FakeEmpty;

    impl SpanSource for FakeEmpty {
        fn page_count(&self) -> usize {
            0
        }
        fn page_spans(&self, _index: usize) -> Result<PageSpans> {
            Err(Error::Extraction("empty".to_string()))
        }
        fn metadata_title(&self) -> Option<String> {
            None
        }
    }
}

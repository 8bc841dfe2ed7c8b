//! Directory driver: one JSON outline per PDF.
//!
//! Every `*.pdf` in the input directory is processed as an independent
//! unit, optionally in parallel, and written to `<stem>.json` in the output
//! directory. A document that cannot be processed gets an error JSON file
//! and a failed [`DocumentReport`]; it never stops the batch.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use rayon::prelude::*;

use crate::analysis::OutlinePipeline;
use crate::detect::{has_pdf_extension, sniff_path};
use crate::error::{Error, Result};
use crate::model::Outline;
use crate::parser::{LopdfSource, SpanSource};
use crate::render::{error_json, to_json, JsonFormat};

/// Where a title comes from when none is detected on the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleFallback {
    /// Keep the empty title
    #[default]
    None,
    /// Use the document Info `/Title`
    Metadata,
    /// Use `/Title`, then the file stem
    MetadataThenFileName,
}

/// Options for batch processing.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Process documents concurrently (whole documents per worker)
    pub parallel: bool,
    /// Output JSON layout
    pub format: JsonFormat,
    /// Title substitution when detection finds nothing
    pub title_fallback: TitleFallback,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            format: JsonFormat::Pretty,
            title_fallback: TitleFallback::None,
        }
    }
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the JSON layout.
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the title fallback.
    pub fn with_title_fallback(mut self, fallback: TitleFallback) -> Self {
        self.title_fallback = fallback;
        self
    }
}

/// Progress notifications sent while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// A document was picked up
    Started { path: PathBuf, total: usize },
    /// A document finished, successfully or not
    Finished {
        path: PathBuf,
        error: Option<String>,
        elapsed: Duration,
    },
}

/// The outcome for one input document.
#[derive(Debug)]
pub struct DocumentReport {
    /// Input PDF
    pub input: PathBuf,
    /// JSON file written for it
    pub output: PathBuf,
    /// The outline, or why the document could not be processed
    pub result: Result<Outline>,
    /// Wall-clock time spent on the document
    pub elapsed: Duration,
}

impl DocumentReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs an [`OutlinePipeline`] over files and directories.
pub struct BatchProcessor {
    pipeline: OutlinePipeline,
    options: BatchOptions,
    events: Option<Sender<BatchEvent>>,
}

impl BatchProcessor {
    pub fn new(pipeline: OutlinePipeline, options: BatchOptions) -> Self {
        Self {
            pipeline,
            options,
            events: None,
        }
    }

    /// Send progress events to the given channel.
    pub fn with_events(mut self, sender: Sender<BatchEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Process every PDF in `input_dir`, writing JSON files to `output_dir`.
    ///
    /// Only directory-level problems (unreadable input, uncreatable output)
    /// are returned as errors; per-document failures are in the reports.
    pub fn process_directory(&self, input_dir: &Path, output_dir: &Path) -> Result<Vec<DocumentReport>> {
        fs::create_dir_all(output_dir)?;
        let inputs = list_pdfs(input_dir)?;
        let total = inputs.len();

        log::info!("Processing {} PDF(s) from {}", total, input_dir.display());

        let process = |input: &PathBuf| self.process_into(input, output_dir, total);
        let reports: Vec<DocumentReport> = if self.options.parallel {
            inputs.par_iter().map(process).collect()
        } else {
            inputs.iter().map(process).collect()
        };

        let failed = reports.iter().filter(|r| !r.is_ok()).count();
        log::info!("Finished {} document(s), {} failed", total, failed);

        Ok(reports)
    }

    /// Extract the outline of one PDF file, timed.
    pub fn process_file(&self, path: &Path) -> Result<Outline> {
        let start = Instant::now();
        let header = sniff_path(path)?;
        log::debug!("{}: {}", path.display(), header);

        let source = LopdfSource::load_file(path)?;
        let outline = outline_from_source(&source, &self.pipeline, self.options.title_fallback, Some(path))?;
        Ok(outline.with_time_taken(start.elapsed()))
    }

    fn process_into(&self, input: &Path, output_dir: &Path, total: usize) -> DocumentReport {
        self.emit(BatchEvent::Started {
            path: input.to_path_buf(),
            total,
        });

        let start = Instant::now();
        let output = output_path_for(input, output_dir);
        let mut result = self.process_file(input);

        let body = match &result {
            Ok(outline) => to_json(outline, self.options.format),
            Err(e) => {
                log::warn!("{}: {}", input.display(), e);
                error_json(&e.to_string(), self.options.format)
            }
        };
        if let Err(e) = body.and_then(|json| fs::write(&output, json).map_err(Error::from)) {
            log::warn!("{}: could not write {}: {}", input.display(), output.display(), e);
            if result.is_ok() {
                result = Err(e);
            }
        }

        let elapsed = start.elapsed();
        self.emit(BatchEvent::Finished {
            path: input.to_path_buf(),
            error: result.as_ref().err().map(|e| e.to_string()),
            elapsed,
        });

        DocumentReport {
            input: input.to_path_buf(),
            output,
            result,
            elapsed,
        }
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(sender) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = sender.send(event);
        }
    }
}

/// Run the pipeline over a span source and apply the title fallback.
pub(crate) fn outline_from_source(
    source: &dyn SpanSource,
    pipeline: &OutlinePipeline,
    fallback: TitleFallback,
    path: Option<&Path>,
) -> Result<Outline> {
    let pages = source.all_page_spans()?;
    let mut outline = pipeline.run(&pages)?;

    if outline.title.is_empty() && fallback != TitleFallback::None {
        let from_file = || {
            path.and_then(|p| p.file_stem())
                .map(|s| s.to_string_lossy().to_string())
        };
        let substitute = match fallback {
            TitleFallback::None => None,
            TitleFallback::Metadata => source.metadata_title(),
            TitleFallback::MetadataThenFileName => source.metadata_title().or_else(from_file),
        };
        if let Some(title) = substitute {
            log::debug!("Using fallback title {:?}", title);
            outline.title = title;
        }
    }

    Ok(outline)
}

/// All `*.pdf` files (any extension case) directly inside `dir`, sorted by name.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_pdf_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// `<output_dir>/<stem>.json` for an input file.
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(format!("{stem}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::OutlineConfig;
    use crate::model::{PageSpans, TextSpan};

    struct FakeSource {
        pages: Vec<PageSpans>,
        title: Option<String>,
    }

    impl SpanSource for FakeSource {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_spans(&self, index: usize) -> Result<PageSpans> {
            self.pages
                .get(index)
                .cloned()
                .ok_or_else(|| Error::Extraction("missing".to_string()))
        }

        fn metadata_title(&self) -> Option<String> {
            self.title.clone()
        }
    }

    fn uniform_source(title: Option<&str>) -> FakeSource {
        let page = PageSpans::letter(0).with_span(TextSpan::styled("Plain words", 10.0, false, 72.0, 100.0));
        FakeSource {
            pages: vec![page],
            title: title.map(str::to_string),
        }
    }

    fn pipeline() -> OutlinePipeline {
        OutlinePipeline::new(OutlineConfig::default()).unwrap()
    }

    #[test]
    fn test_output_path_for() {
        let out = output_path_for(Path::new("/in/report.final.PDF"), Path::new("/out"));
        assert_eq!(out, PathBuf::from("/out/report.final.json"));
    }

    #[test]
    fn test_title_fallback_chain() {
        let path = Path::new("/in/file01.pdf");

        let outline = outline_from_source(&uniform_source(Some("Meta")), &pipeline(), TitleFallback::None, Some(path)).unwrap();
        assert_eq!(outline.title, "");

        let outline =
            outline_from_source(&uniform_source(Some("Meta")), &pipeline(), TitleFallback::Metadata, Some(path)).unwrap();
        assert_eq!(outline.title, "Meta");

        let outline = outline_from_source(&uniform_source(None), &pipeline(), TitleFallback::Metadata, Some(path)).unwrap();
        assert_eq!(outline.title, "");

        let outline = outline_from_source(
            &uniform_source(None),
            &pipeline(),
            TitleFallback::MetadataThenFileName,
            Some(path),
        )
        .unwrap();
        assert_eq!(outline.title, "file01");
    }

    #[test]
    fn test_unreadable_document_is_error() {
        let source = FakeSource {
            pages: vec![],
            title: Some("Meta".to_string()),
        };
        // page_count() is 0, so nothing failed and the outline is empty
        let outline = outline_from_source(&source, &pipeline(), TitleFallback::None, None).unwrap();
        assert!(outline.outline.is_empty());

        struct Unreadable;
        impl SpanSource for Unreadable {
            fn page_count(&self) -> usize {
                3
            }
            fn page_spans(&self, index: usize) -> Result<PageSpans> {
                Err(Error::Extraction(format!("page {} unreadable", index)))
            }
            fn metadata_title(&self) -> Option<String> {
                Some("Meta".to_string())
            }
        }

        let result = outline_from_source(&Unreadable, &pipeline(), TitleFallback::Metadata, None);
        assert!(matches!(result, Err(Error::Extraction(_))));
    }

    #[test]
    fn test_list_pdfs_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "A.PDF", "notes.txt", "c.pdf.bak"] {
            fs::write(dir.path().join(name), b"%PDF-1.4\n").unwrap();
        }
        fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let names: Vec<String> = list_pdfs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["A.PDF", "b.pdf"]);
    }

    #[test]
    fn test_bad_document_gets_error_json() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("broken.pdf"), b"this is not a pdf").unwrap();

        let (tx, rx) = crossbeam_channel::unbounded();
        let processor = BatchProcessor::new(pipeline(), BatchOptions::new().with_parallel(false)).with_events(tx);
        let reports = processor.process_directory(input.path(), output.path()).unwrap();

        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0].result, Err(Error::UnknownFormat)));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output.path().join("broken.json")).unwrap()).unwrap();
        assert_eq!(json["title"], "");
        assert_eq!(json["outline"], serde_json::json!([]));
        assert!(json["error"].as_str().unwrap().contains("not a valid PDF"));

        let events: Vec<BatchEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], BatchEvent::Started { total: 1, .. }));
        assert!(matches!(&events[1], BatchEvent::Finished { error: Some(_), .. }));
    }

    #[test]
    fn test_missing_input_dir_is_error() {
        let output = tempfile::tempdir().unwrap();
        let processor = BatchProcessor::new(pipeline(), BatchOptions::default());
        let result = processor.process_directory(Path::new("/definitely/not/here"), output.path());
        assert!(matches!(result, Err(Error::Io(_))));
    }
}

//! pdfoutline CLI - PDF outline extraction tool

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfoutline::batch::list_pdfs;
use pdfoutline::render::to_json;
use pdfoutline::{
    BatchEvent, BatchOptions, BatchProcessor, JsonFormat, LopdfSource, OutlineConfig,
    OutlineExtractor, OutlinePipeline, SpanSource, TitleFallback,
};

#[derive(Parser)]
#[command(name = "pdfoutline")]
#[command(version)]
#[command(about = "Extract title and heading outlines from PDF files as JSON", long_about = None)]
struct Cli {
    /// Input directory of PDFs
    #[arg(value_name = "INPUT_DIR", env = "PDFOUTLINE_INPUT")]
    input: Option<PathBuf>,

    /// Output directory for JSON files
    #[arg(value_name = "OUTPUT_DIR", env = "PDFOUTLINE_OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Analysis settings shared by every command.
#[derive(Args, Clone)]
struct ConfigArgs {
    /// Deepest heading level to emit (1-6)
    #[arg(long, global = true, default_value_t = 3, env = "PDFOUTLINE_MAX_LEVEL")]
    max_level: u8,

    /// Shortest heading in characters
    #[arg(long, global = true, default_value_t = 2)]
    min_chars: usize,

    /// Longest heading in characters
    #[arg(long, global = true, default_value_t = 150)]
    max_chars: usize,

    /// Header/footer band as a fraction of page height
    #[arg(long, global = true, default_value_t = 0.05)]
    margin_band: f32,

    /// Title search region as a fraction of page height
    #[arg(long, global = true, default_value_t = 0.30)]
    title_region: f32,

    /// Lines repeated on this many other pages are boilerplate
    #[arg(long, global = true, default_value_t = 2)]
    repeat_threshold: usize,

    /// Extra boilerplate phrase (repeatable)
    #[arg(long = "stopword", global = true, value_name = "PHRASE")]
    stopwords: Vec<String>,

    /// Tag the outline with the detected language
    #[arg(long, global = true, env = "PDFOUTLINE_LANGUAGE")]
    language: bool,

    /// Tag every heading with its detected language
    #[arg(long, global = true)]
    heading_language: bool,

    /// Title fallback when none is detected
    #[arg(long, global = true, value_enum, default_value = "none")]
    title_fallback: FallbackMode,
}

impl ConfigArgs {
    fn outline_config(&self) -> OutlineConfig {
        let mut config = OutlineConfig::new()
            .with_max_heading_level(self.max_level)
            .with_length_bounds(self.min_chars, self.max_chars)
            .with_margin_band(self.margin_band)
            .with_title_region(self.title_region)
            .with_repeat_threshold(self.repeat_threshold)
            .with_language(self.language)
            .with_heading_language(self.heading_language);
        for phrase in &self.stopwords {
            config = config.with_boilerplate(phrase.clone());
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Process every PDF in a directory into <name>.json files
    Batch {
        /// Input directory
        #[arg(value_name = "INPUT_DIR")]
        input: PathBuf,

        /// Output directory
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,

        /// Process one document at a time
        #[arg(long)]
        sequential: bool,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Extract the outline of a single PDF
    Outline {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show assembled lines with their classification
    Lines {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Only show this page (zero-based)
        #[arg(long)]
        page: Option<usize>,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FallbackMode {
    /// Keep an empty title
    None,
    /// Use the document metadata title
    Metadata,
    /// Use the metadata title, then the file name
    Filename,
}

impl From<FallbackMode> for TitleFallback {
    fn from(mode: FallbackMode) -> Self {
        match mode {
            FallbackMode::None => TitleFallback::None,
            FallbackMode::Metadata => TitleFallback::Metadata,
            FallbackMode::Filename => TitleFallback::MetadataThenFileName,
        }
    }
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Some(Commands::Batch {
            input,
            output,
            sequential,
            compact,
        }) => cmd_batch(&input, &output, &config, !sequential, compact),
        Some(Commands::Outline {
            input,
            output,
            compact,
        }) => cmd_outline(&input, output.as_deref(), &config, compact),
        Some(Commands::Lines { input, page }) => cmd_lines(&input, page, &config),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => match (cli.input, cli.output) {
            (Some(input), Some(output)) => cmd_batch(&input, &output, &config, true, false),
            _ => {
                println!("{}", "Usage: pdfoutline <INPUT_DIR> <OUTPUT_DIR>".yellow());
                println!("       pdfoutline --help for more information");
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_batch(
    input: &Path,
    output: &Path,
    config: &ConfigArgs,
    parallel: bool,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = OutlinePipeline::new(config.outline_config())?;
    let options = BatchOptions::new()
        .with_parallel(parallel)
        .with_format(json_format(compact))
        .with_title_fallback(config.title_fallback.into());

    let total = list_pdfs(input)?.len();
    if total == 0 {
        println!("{} {}", "No PDF files found in".yellow(), input.display());
        return Ok(());
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let (tx, rx) = crossbeam_channel::unbounded();
    let processor = BatchProcessor::new(pipeline, options).with_events(tx);

    let reports = thread::scope(|scope| {
        let worker = scope.spawn(move || processor.process_directory(input, output));

        // The channel closes when the processor is dropped.
        for event in rx.iter() {
            match event {
                BatchEvent::Started { path, .. } => {
                    pb.set_message(file_name(&path));
                }
                BatchEvent::Finished { path, error, elapsed } => {
                    if let Some(error) = error {
                        pb.println(format!("{} {}: {}", "Failed".red(), file_name(&path), error));
                    } else {
                        log::info!("{} done in {:.2}s", path.display(), elapsed.as_secs_f64());
                    }
                    pb.inc(1);
                }
            }
        }

        worker.join()
    })
    .map_err(|_| "batch worker panicked")??;

    pb.finish_with_message("Done!");

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    println!(
        "\n{} {} processed, {} failed",
        "Summary:".green().bold(),
        reports.len() - failed,
        failed
    );
    println!("{} {}", "Output:".dimmed(), output.display());

    Ok(())
}

fn cmd_outline(
    input: &Path,
    output: Option<&Path>,
    config: &ConfigArgs,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let outline = OutlineExtractor::new()
        .config(config.outline_config())
        .title_fallback(config.title_fallback.into())
        .extract_file(input)?;

    let json = to_json(&outline, json_format(compact))?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_lines(input: &Path, page: Option<usize>, config: &ConfigArgs) -> Result<(), Box<dyn std::error::Error>> {
    let source = LopdfSource::load_file(input)?;
    let pipeline = OutlinePipeline::new(config.outline_config())?;
    let analysis = pipeline.analyze(&source.all_page_spans()?)?;

    let stats = &analysis.statistics;
    println!("{}", "Font Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {:.2}pt", "Average size".bold(), stats.average_size());
    println!("{}: {:?}", "Distinct sizes".bold(), stats.distinct_sizes());
    println!("{}: {:?}", "Heading sizes".bold(), analysis.heading_sizes);
    println!("{}: {:?}", "Title".bold(), analysis.title.text);

    for page_lines in analysis.pages.iter().filter(|p| page.map_or(true, |n| p.index == n)) {
        println!();
        println!("{} {}", "Page".cyan().bold(), page_lines.index);
        println!("{}", "─".repeat(40).dimmed());

        for (line, verdict) in page_lines.lines.iter().zip(analysis.verdicts_for(page_lines.index)) {
            let tag = if verdict.is_title {
                "TITLE".magenta().bold().to_string()
            } else if let Some(level) = verdict.level {
                level.to_string().green().bold().to_string()
            } else if let Some(rejection) = verdict.rejection {
                rejection.to_string().dimmed().to_string()
            } else {
                "body".dimmed().to_string()
            };

            let mut flags = String::new();
            if line.is_bold {
                flags.push('B');
            }
            if line.is_upper {
                flags.push('U');
            }

            println!(
                "{:>6.1} {:>5.1}pt {:<2} {:<12} {}",
                line.y, line.font_size, flags, tag, line.text
            );
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfoutline".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF outline extraction tool");
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

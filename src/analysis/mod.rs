//! Heading detection and classification.
//!
//! Stages run strictly in sequence for one document:
//! [`LineAssembler`] → [`FontStatistics`] → [`NoiseFilter`] →
//! [`TitleDetector`] → [`HeadingClassifier`] → [`OutlineBuilder`], with
//! optional language tagging at the end. [`OutlinePipeline`] wires them
//! together.

mod builder;
mod classify;
mod config;
mod language;
mod lines;
mod noise;
mod pipeline;
mod stats;
mod title;

pub use builder::OutlineBuilder;
pub use classify::{HeadingClassifier, HeadingScale};
pub use config::{MarginPolicy, OutlineConfig, SizePolicy};
pub use language::{tag_language, LanguageDetector, LanguageError, WhatlangDetector};
pub use lines::LineAssembler;
pub use noise::{normalize_key, NoiseFilter, Rejection};
pub use pipeline::{DocumentAnalysis, LineVerdict, OutlinePipeline};
pub use stats::{FontStatistics, SizeEntry};
pub use title::{TitleDetector, TitleMatch};

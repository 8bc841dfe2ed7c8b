//! Document model types for outline extraction.
//!
//! Spans come in from the extraction backend, lines are built from them by
//! the analysis pipeline, and an [`Outline`] comes out the other end.

mod line;
mod outline;
mod span;

pub use line::{is_uppercase_text, normalize_whitespace, Line, PageLines};
pub use outline::{Heading, HeadingLevel, LanguageTag, Outline};
pub use span::{is_bold_font, PageSpans, TextSpan};

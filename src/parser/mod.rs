//! PDF span extraction.

mod backend;
mod content;

pub use backend::{decode_text_simple, ContentOp, LopdfSource, PdfValue, SpanSource, DEFAULT_PAGE_SIZE};

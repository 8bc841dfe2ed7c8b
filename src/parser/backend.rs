//! Span source abstraction layer.
//!
//! Provides a trait-based interface for pulling positioned text spans out
//! of a document, isolating the concrete PDF library (lopdf) from the
//! outline analysis.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::PageSpans;

use super::content::SpanCollector;

/// Page size used when a page has no usable MediaBox (US Letter).
pub const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// A value from a PDF content stream operand.
#[derive(Debug, Clone)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

impl PdfValue {
    /// Numeric value of an integer or real operand.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            PdfValue::Integer(i) => Some(*i as f32),
            PdfValue::Real(r) => Some(*r),
            _ => None,
        }
    }
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

/// Anything that can hand out positioned text spans page by page.
///
/// Page indices are zero-based. A failing page is reported as an error for
/// that page only; callers decide whether to skip it.
pub trait SpanSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Spans of one page in extraction order.
    fn page_spans(&self, index: usize) -> Result<PageSpans>;

    /// Title from the document metadata, if any.
    fn metadata_title(&self) -> Option<String>;

    /// Spans of every page. Pages that fail to extract come back empty;
    /// if every page of a non-empty document fails, the last page error is
    /// returned instead.
    fn all_page_spans(&self) -> Result<Vec<PageSpans>> {
        let count = self.page_count();
        let mut pages = Vec::with_capacity(count);
        let mut failed = 0;
        let mut last_error = None;

        for index in 0..count {
            match self.page_spans(index) {
                Ok(page) => pages.push(page),
                Err(e) => {
                    log::warn!("Page {}: extraction failed, treating as empty: {}", index, e);
                    failed += 1;
                    last_error = Some(e);
                    pages.push(PageSpans::letter(index));
                }
            }
        }

        if count > 0 && failed == count {
            let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
            return Err(Error::Extraction(format!("all {} pages failed: {}", count, reason)));
        }
        Ok(pages)
    }
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// LopdfSource: concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

/// Concrete [`SpanSource`] backed by `lopdf::Document`.
pub struct LopdfSource {
    doc: LopdfDocument,
    pages: Vec<ObjectId>,
}

impl LopdfSource {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_document(LopdfDocument::load(path)?)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        Self::from_document(LopdfDocument::load_mem(data)?)
    }

    /// Load from a reader.
    pub fn load_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::load_bytes(&data)
    }

    fn from_document(doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        // get_pages is keyed by 1-based page number and already sorted.
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        log::debug!("Loaded PDF {} with {} pages", doc.version, pages.len());
        Ok(Self { doc, pages })
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Page width and height from the MediaBox, following inheritance.
    fn page_size(&self, page_id: ObjectId) -> (f32, f32) {
        let mut current = self.doc.get_dictionary(page_id).ok();
        // Bounded walk up the page tree.
        for _ in 0..32 {
            let Some(dict) = current else { break };
            if let Some(size) = media_box_size(dict) {
                return size;
            }
            current = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|id| self.doc.get_dictionary(id))
                .ok();
        }
        DEFAULT_PAGE_SIZE
    }

    /// Font resource name to base font name for one page.
    fn page_fonts(&self, page_id: ObjectId) -> Result<HashMap<Vec<u8>, String>> {
        let fonts = self.doc.get_page_fonts(page_id)?;
        Ok(fonts
            .iter()
            .map(|(name, dict)| {
                let base_font = dict
                    .get(b"BaseFont")
                    .and_then(Object::as_name)
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_else(|_| String::from_utf8_lossy(name).to_string());
                (name.clone(), base_font)
            })
            .collect())
    }

    /// Decode the page's content streams into operations.
    fn page_operations(&self, page_id: ObjectId) -> Result<Vec<ContentOp>> {
        let data = self.doc.get_page_content(page_id)?;
        let content = lopdf::content::Content::decode(&data)?;
        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(convert_object).collect(),
                operator: op.operator,
            })
            .collect())
    }

    /// Decode shown bytes with the font's encoding, falling back to simple
    /// decoding when the font or its encoding is unavailable.
    fn decode_text(&self, fonts: &BTreeMap<Vec<u8>, &Dictionary>, font: &[u8], bytes: &[u8]) -> String {
        fonts
            .get(font)
            .and_then(|dict| dict.get_font_encoding(&self.doc).ok())
            .and_then(|encoding| LopdfDocument::decode_text(&encoding, bytes).ok())
            .unwrap_or_else(|| decode_text_simple(bytes))
    }
}

impl SpanSource for LopdfSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_spans(&self, index: usize) -> Result<PageSpans> {
        let page_id = *self
            .pages
            .get(index)
            .ok_or_else(|| Error::Extraction(format!("page {} out of range ({} pages)", index, self.pages.len())))?;

        let (width, height) = self.page_size(page_id);
        let mut page = PageSpans::new(index, width, height);

        let fonts = self.page_fonts(page_id)?;
        let font_dicts = self.doc.get_page_fonts(page_id)?;
        let operations = self.page_operations(page_id)?;

        let collector = SpanCollector::new(
            &fonts,
            |font: &[u8], bytes: &[u8]| self.decode_text(&font_dicts, font, bytes),
            height,
        );
        for span in collector.collect(&operations) {
            page.push(span);
        }

        log::debug!("Page {}: {} spans", index, page.spans.len());
        Ok(page)
    }

    fn metadata_title(&self) -> Option<String> {
        let info = self
            .doc
            .trailer
            .get(b"Info")
            .and_then(Object::as_reference)
            .and_then(|id| self.doc.get_dictionary(id))
            .ok()?;

        let title = match info.get(b"Title").ok()? {
            Object::String(bytes, _) => decode_text_simple(bytes),
            Object::Name(bytes) => String::from_utf8_lossy(bytes).to_string(),
            _ => return None,
        };
        let title = title.trim().to_string();
        (!title.is_empty()).then_some(title)
    }
}

fn media_box_size(dict: &Dictionary) -> Option<(f32, f32)> {
    let array = dict.get(b"MediaBox").ok()?.as_array().ok()?;
    if array.len() < 4 {
        return None;
    }
    let coords: Vec<f32> = array.iter().filter_map(|o| o.as_float().ok()).collect();
    if coords.len() < 4 {
        return None;
    }
    let (width, height) = ((coords[2] - coords[0]).abs(), (coords[3] - coords[1]).abs());
    (width > 0.0 && height > 0.0).then_some((width, height))
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

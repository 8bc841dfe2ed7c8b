//! Content stream interpretation: text operators to positioned spans.

use std::collections::HashMap;

use crate::model::TextSpan;

use super::backend::{ContentOp, PdfValue};

/// Font size assumed before the first `Tf`.
const DEFAULT_FONT_SIZE: f32 = 12.0;

/// TJ adjustments beyond this (thousandths of text space) are word gaps.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Average glyph advance as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f32 = 0.5;

/// Text matrix for tracking position in a content stream.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    // Start of the current line, restored by Td/TD/T*
    line_e: f32,
    line_f: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            line_e: 0.0,
            line_f: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
        self.line_e = e;
        self.line_f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_e += tx * self.a + ty * self.c;
        self.line_f += tx * self.b + ty * self.d;
        self.e = self.line_e;
        self.f = self.line_f;
    }

    fn next_line(&mut self, leading: f32) {
        self.translate(0.0, -leading);
    }

    /// Move past shown text along the baseline.
    fn advance(&mut self, width: f32) {
        self.e += width;
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

/// Walks decoded content operations and collects text spans.
///
/// `fonts` maps a page's font resource names to base font names; `decode`
/// turns shown bytes into text for a given font resource. Output `y`
/// values are flipped to top-down using `page_height`.
pub(crate) struct SpanCollector<'a, D>
where
    D: Fn(&[u8], &[u8]) -> String,
{
    fonts: &'a HashMap<Vec<u8>, String>,
    decode: D,
    page_height: f32,
}

impl<'a, D> SpanCollector<'a, D>
where
    D: Fn(&[u8], &[u8]) -> String,
{
    pub(crate) fn new(fonts: &'a HashMap<Vec<u8>, String>, decode: D, page_height: f32) -> Self {
        Self {
            fonts,
            decode,
            page_height,
        }
    }

    pub(crate) fn collect(&self, ops: &[ContentOp]) -> Vec<TextSpan> {
        let mut spans = Vec::new();
        let mut font_resource: Vec<u8> = Vec::new();
        let mut font_name = String::new();
        let mut font_size = DEFAULT_FONT_SIZE;
        let mut leading = 0.0f32;
        let mut matrix = TextMatrix::default();
        let mut in_text = false;

        for op in ops {
            let operands = &op.operands;
            match op.operator.as_str() {
                "BT" => {
                    in_text = true;
                    matrix = TextMatrix::default();
                }
                "ET" => in_text = false,
                "Tf" => {
                    if operands.len() >= 2 {
                        if let PdfValue::Name(name) = &operands[0] {
                            font_resource = name.clone();
                            font_name = self
                                .fonts
                                .get(name)
                                .cloned()
                                .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                        }
                        font_size = operands[1].as_number().unwrap_or(DEFAULT_FONT_SIZE);
                    }
                }
                "TL" => {
                    if let Some(value) = operands.first().and_then(PdfValue::as_number) {
                        leading = value;
                    }
                }
                "Td" | "TD" => {
                    if operands.len() >= 2 {
                        let tx = operands[0].as_number().unwrap_or(0.0);
                        let ty = operands[1].as_number().unwrap_or(0.0);
                        if op.operator == "TD" {
                            leading = -ty;
                        }
                        matrix.translate(tx, ty);
                    }
                }
                "Tm" => {
                    if operands.len() >= 6 {
                        let n = |i: usize, default: f32| operands[i].as_number().unwrap_or(default);
                        matrix.set(n(0, 1.0), n(1, 0.0), n(2, 0.0), n(3, 1.0), n(4, 0.0), n(5, 0.0));
                    }
                }
                "T*" => matrix.next_line(self.leading_or_default(leading, font_size)),
                "Tj" | "TJ" | "'" | "\"" => {
                    if op.operator == "'" || op.operator == "\"" {
                        matrix.next_line(self.leading_or_default(leading, font_size));
                    }
                    if !in_text {
                        continue;
                    }

                    let text = match op.operator.as_str() {
                        "TJ" => match operands.first() {
                            Some(PdfValue::Array(items)) => self.decode_array(&font_resource, items),
                            _ => String::new(),
                        },
                        "\"" => self.decode_string(&font_resource, operands.get(2)),
                        _ => self.decode_string(&font_resource, operands.first()),
                    };

                    let size = font_size * matrix.scale();
                    let width = text.chars().count() as f32 * size * GLYPH_WIDTH_RATIO;
                    if !text.trim().is_empty() {
                        let (x, y) = matrix.position();
                        spans.push(
                            TextSpan::new(text, x, self.page_height - y, size, &font_name)
                                .with_width(width),
                        );
                    }
                    matrix.advance(width);
                }
                _ => {}
            }
        }

        spans
    }

    fn leading_or_default(&self, leading: f32, font_size: f32) -> f32 {
        if leading != 0.0 {
            leading
        } else {
            font_size * 1.2
        }
    }

    fn decode_string(&self, font: &[u8], value: Option<&PdfValue>) -> String {
        match value {
            Some(PdfValue::Str(bytes)) => (self.decode)(font, bytes),
            _ => String::new(),
        }
    }

    /// Decode a TJ array, turning large negative adjustments into spaces.
    fn decode_array(&self, font: &[u8], items: &[PdfValue]) -> String {
        let mut combined = String::new();
        for item in items {
            match item {
                PdfValue::Str(bytes) => combined.push_str(&(self.decode)(font, bytes)),
                PdfValue::Integer(_) | PdfValue::Real(_) => {
                    let adjustment = -item.as_number().unwrap_or(0.0);
                    let needs_space = adjustment > TJ_SPACE_THRESHOLD
                        && !combined.ends_with(char::is_whitespace)
                        && combined
                            .chars()
                            .last()
                            .map(|c| !is_cjk(c))
                            .unwrap_or(false);
                    if needs_space {
                        combined.push(' ');
                    }
                }
                _ => {}
            }
        }
        combined
    }
}

/// Chinese and Japanese characters, which take no word spaces.
fn is_cjk(c: char) -> bool {
    matches!(c as u32, 0x3040..=0x30FF | 0x3400..=0x4DBF | 0x4E00..=0x9FFF)
}

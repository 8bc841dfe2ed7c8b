//! Outline assembly.

use std::cmp::Ordering;

use crate::model::{normalize_whitespace, Heading, HeadingLevel, Line, Outline};

/// A classified line waiting for ordering.
#[derive(Debug, Clone)]
struct Entry {
    page: usize,
    y: f32,
    seq: usize,
    heading: Heading,
}

/// Collects classified lines and produces the final [`Outline`].
///
/// Headings come out in reading order (page, then vertical position, then
/// the order they were pushed), with consecutive duplicates on one page
/// collapsed and any heading that merely repeats the title dropped.
#[derive(Debug, Default)]
pub struct OutlineBuilder {
    title: String,
    entries: Vec<Entry>,
}

impl OutlineBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    /// Add a classified line.
    pub fn push(&mut self, line: &Line, level: HeadingLevel) {
        let seq = self.entries.len();
        self.entries.push(Entry {
            page: line.page,
            y: line.y,
            seq,
            heading: Heading::new(level, line.text.clone(), line.page),
        });
    }

    /// Number of headings pushed so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(mut self) -> Outline {
        self.entries.sort_by(|a, b| {
            a.page
                .cmp(&b.page)
                .then(a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
                .then(a.seq.cmp(&b.seq))
        });

        let title_key = comparable(&self.title);
        let mut outline: Vec<Heading> = Vec::with_capacity(self.entries.len());

        for entry in self.entries {
            let heading = entry.heading;
            if !title_key.is_empty() && comparable(&heading.text) == title_key {
                continue;
            }
            let duplicate = outline
                .last()
                .map(|prev| prev.page == heading.page && prev.text == heading.text)
                .unwrap_or(false);
            if duplicate {
                log::debug!("Collapsed duplicate heading {:?} on page {}", heading.text, heading.page);
                continue;
            }
            outline.push(heading);
        }

        Outline {
            title: self.title,
            outline,
            time_taken_seconds: 0.0,
            language: None,
        }
    }
}

fn comparable(text: &str) -> String {
    normalize_whitespace(text).to_lowercase()
}

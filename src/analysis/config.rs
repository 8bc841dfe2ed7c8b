//! Outline extraction configuration.

use crate::error::{Error, Result};

/// Tunables for one document's outline extraction.
///
/// Passed explicitly into every pipeline run; nothing here is global.
#[derive(Debug, Clone)]
pub struct OutlineConfig {
    /// Deepest heading level emitted (H1..=H`max_heading_level`)
    pub max_heading_level: u8,

    /// Shortest line (in characters) considered as a heading
    pub min_chars: usize,

    /// Longest line (in characters) considered as a heading
    pub max_chars: usize,

    /// Fraction of page height treated as header/footer band, top and bottom
    pub margin_band: f32,

    /// What happens to heading candidates inside the margin bands
    pub margin_policy: MarginPolicy,

    /// Fraction of page height searched for the title on the first page
    pub title_region: f32,

    /// A line recurring on at least this many *other* pages is boilerplate
    pub repeat_threshold: usize,

    /// Vertical tolerance (fraction of page height) within which two
    /// occurrences of a line count as the same position
    pub repeat_band: f32,

    /// Font sizes that quantize to the same multiple of this value share a rank
    pub size_epsilon: f32,

    /// Vertical tolerance for joining spans, as a fraction of font size
    pub line_tolerance: f32,

    /// How a line's font size is chosen from its spans
    pub size_policy: SizePolicy,

    /// Bias (points) that bold text adds toward the next level up
    pub bold_bias: f32,

    /// Bias (points) that uppercase text adds toward the next level up
    pub upper_bias: f32,

    /// Size gap (points) within which a bias may promote a line
    pub promotion_window: f32,

    /// Normalized phrases that are never headings
    pub boilerplate: Vec<String>,

    /// Extra regular expressions (matched against lowercased text) that
    /// mark a line as boilerplate
    pub boilerplate_patterns: Vec<String>,

    /// Attach a language tag to the outline (off by default)
    pub tag_language: bool,

    /// Attach a language tag to each heading (off by default)
    pub tag_headings: bool,
}

impl OutlineConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deepest heading level.
    pub fn with_max_heading_level(mut self, level: u8) -> Self {
        self.max_heading_level = level;
        self
    }

    /// Set heading length bounds in characters.
    pub fn with_length_bounds(mut self, min_chars: usize, max_chars: usize) -> Self {
        self.min_chars = min_chars;
        self.max_chars = max_chars;
        self
    }

    /// Set the header/footer band fraction.
    pub fn with_margin_band(mut self, fraction: f32) -> Self {
        self.margin_band = fraction;
        self
    }

    /// Set the margin band policy.
    pub fn with_margin_policy(mut self, policy: MarginPolicy) -> Self {
        self.margin_policy = policy;
        self
    }

    /// Set the title search region fraction.
    pub fn with_title_region(mut self, fraction: f32) -> Self {
        self.title_region = fraction;
        self
    }

    /// Set the repeated-line threshold (other pages).
    pub fn with_repeat_threshold(mut self, pages: usize) -> Self {
        self.repeat_threshold = pages;
        self
    }

    /// Set the size quantization step.
    pub fn with_size_epsilon(mut self, epsilon: f32) -> Self {
        self.size_epsilon = epsilon;
        self
    }

    /// Set the line size policy.
    pub fn with_size_policy(mut self, policy: SizePolicy) -> Self {
        self.size_policy = policy;
        self
    }

    /// Add a boilerplate phrase.
    pub fn with_boilerplate(mut self, phrase: impl Into<String>) -> Self {
        self.boilerplate.push(phrase.into());
        self
    }

    /// Add a boilerplate regular expression.
    pub fn with_boilerplate_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.boilerplate_patterns.push(pattern.into());
        self
    }

    /// Enable or disable document language tagging.
    pub fn with_language(mut self, enabled: bool) -> Self {
        self.tag_language = enabled;
        self
    }

    /// Enable or disable per-heading language tagging.
    pub fn with_heading_language(mut self, enabled: bool) -> Self {
        self.tag_headings = enabled;
        self
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if !(1..=6).contains(&self.max_heading_level) {
            return Err(Error::InvalidConfig(format!(
                "max_heading_level must be between 1 and 6, got {}",
                self.max_heading_level
            )));
        }
        if self.min_chars > self.max_chars {
            return Err(Error::InvalidConfig(format!(
                "min_chars ({}) must not exceed max_chars ({})",
                self.min_chars, self.max_chars
            )));
        }
        for (name, value) in [
            ("margin_band", self.margin_band),
            ("title_region", self.title_region),
            ("repeat_band", self.repeat_band),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a fraction between 0 and 1, got {value}"
                )));
            }
        }
        if self.repeat_band <= 0.0 {
            return Err(Error::InvalidConfig("repeat_band must be positive".to_string()));
        }
        if self.size_epsilon.is_nan() || self.size_epsilon <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "size_epsilon must be positive, got {}",
                self.size_epsilon
            )));
        }
        if self.line_tolerance < 0.0 || self.promotion_window < 0.0 {
            return Err(Error::InvalidConfig(
                "line_tolerance and promotion_window must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Quantize a font size to its rank key.
    pub(crate) fn size_key(&self, size: f32) -> i64 {
        (size / self.size_epsilon).round() as i64
    }
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            max_heading_level: 3,
            min_chars: 2,
            max_chars: 150,
            margin_band: 0.05,
            margin_policy: MarginPolicy::Demote,
            title_region: 0.30,
            repeat_threshold: 2,
            repeat_band: 0.05,
            size_epsilon: 0.1,
            line_tolerance: 0.3,
            size_policy: SizePolicy::Dominant,
            bold_bias: 0.5,
            upper_bias: 0.5,
            promotion_window: 1.0,
            boilerplate: ["page", "copyright", "all rights reserved"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            boilerplate_patterns: Vec::new(),
            tag_language: false,
            tag_headings: false,
        }
    }
}

/// Treatment of heading candidates that sit in a header/footer band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarginPolicy {
    /// Push the heading one level deeper
    #[default]
    Demote,
    /// Drop the heading
    Reject,
}

/// How a line's font size is derived from its spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizePolicy {
    /// The size that carries the most characters
    #[default]
    Dominant,
    /// The largest size in the line
    Maximum,
}

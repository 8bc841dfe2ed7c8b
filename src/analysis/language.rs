//! Language tagging for titles and headings.
//!
//! Detection is advisory: every failure collapses into
//! [`LanguageTag::Unknown`] and never aborts outline generation.

use thiserror::Error;

use crate::model::LanguageTag;

/// Why a language could not be determined.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LanguageError {
    /// Not enough letters to attempt detection
    #[error("text too short for language detection ({0} letters)")]
    TooShort(usize),

    /// The detector returned nothing
    #[error("language could not be detected")]
    Undetected,

    /// The detector's best guess was below the confidence floor
    #[error("ambiguous language detection (confidence {0:.2})")]
    Ambiguous(f64),
}

/// Something that maps text to an ISO 639-3 language code.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Result<String, LanguageError>;
}

/// Default detector backed by the `whatlang` trigram models.
#[derive(Debug, Clone)]
pub struct WhatlangDetector {
    /// Minimum number of alphabetic characters
    pub min_letters: usize,
    /// Minimum detector confidence (0.0 to 1.0)
    pub min_confidence: f64,
}

impl WhatlangDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence floor.
    pub fn with_min_confidence(mut self, confidence: f64) -> Self {
        self.min_confidence = confidence;
        self
    }
}

impl Default for WhatlangDetector {
    fn default() -> Self {
        Self {
            min_letters: 3,
            min_confidence: 0.5,
        }
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Result<String, LanguageError> {
        let letters = text.chars().filter(|c| c.is_alphabetic()).count();
        if letters < self.min_letters {
            return Err(LanguageError::TooShort(letters));
        }

        let info = whatlang::detect(text).ok_or(LanguageError::Undetected)?;
        if info.confidence() < self.min_confidence {
            return Err(LanguageError::Ambiguous(info.confidence()));
        }
        Ok(info.lang().code().to_string())
    }
}

/// Tag a piece of text, recovering every failure as `Unknown`.
pub fn tag_language(detector: &dyn LanguageDetector, text: &str) -> LanguageTag {
    match detector.detect(text) {
        Ok(code) => LanguageTag::Known(code),
        Err(e) => {
            log::debug!("Language unknown for {:?}: {}", text, e);
            LanguageTag::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDetector(Result<String, LanguageError>);

    impl LanguageDetector for FixedDetector {
        fn detect(&self, _text: &str) -> Result<String, LanguageError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_too_short_is_error() {
        let detector = WhatlangDetector::default();
        assert_eq!(detector.detect("A1"), Err(LanguageError::TooShort(1)));
        assert_eq!(detector.detect("12 34"), Err(LanguageError::TooShort(0)));
    }

    #[test]
    fn test_detects_english_prose() {
        let detector = WhatlangDetector::default();
        let text = "The quarterly report describes the financial results of the company \
                    and the outlook for the next year in considerable detail.";
        assert_eq!(detector.detect(text), Ok("eng".to_string()));
    }

    #[test]
    fn test_detects_non_latin_script() {
        let detector = WhatlangDetector::default();
        let text = "これは会社の年次報告書です。今年の結果について説明します。";
        assert_eq!(detector.detect(text), Ok("jpn".to_string()));
    }

    #[test]
    fn test_confidence_floor() {
        let detector = WhatlangDetector::new().with_min_confidence(1.1);
        let result = detector.detect("Introduction to the methods used in this study");
        assert!(matches!(result, Err(LanguageError::Ambiguous(_))));
    }

    #[test]
    fn test_failures_become_unknown() {
        for err in [
            LanguageError::TooShort(0),
            LanguageError::Undetected,
            LanguageError::Ambiguous(0.1),
        ] {
            let detector = FixedDetector(Err(err));
            assert_eq!(tag_language(&detector, "anything"), LanguageTag::Unknown);
        }

        let detector = FixedDetector(Ok("fra".to_string()));
        assert_eq!(tag_language(&detector, "Résumé"), LanguageTag::Known("fra".to_string()));
    }
}

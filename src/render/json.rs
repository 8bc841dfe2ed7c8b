//! JSON rendering for outlines.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Heading, Outline};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Body written for a document that could not be processed.
#[derive(Serialize)]
struct FailedOutline<'a> {
    title: &'a str,
    outline: &'a [Heading],
    error: &'a str,
}

/// Convert an outline to JSON.
pub fn to_json(outline: &Outline, format: JsonFormat) -> Result<String> {
    serialize(outline, format)
}

/// JSON for a failed document: empty title and outline plus the error message.
pub fn error_json(message: &str, format: JsonFormat) -> Result<String> {
    let failed = FailedOutline {
        title: "",
        outline: &[],
        error: message,
    };
    serialize(&failed, format)
}

fn serialize<T: Serialize>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HeadingLevel;

    fn sample() -> Outline {
        let mut outline = Outline::new();
        outline.title = "Test".to_string();
        outline.outline.push(Heading::new(HeadingLevel::H1, "Intro", 0));
        outline
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"title\": \"Test\""));
        assert!(json.contains("\"level\": \"H1\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert_eq!(
            json,
            r#"{"title":"Test","outline":[{"level":"H1","text":"Intro","page":0}],"time_taken_seconds":0.0}"#
        );
    }

    #[test]
    fn test_error_json() {
        let json = error_json("Document is encrypted", JsonFormat::Compact).unwrap();
        assert_eq!(json, r#"{"title":"","outline":[],"error":"Document is encrypted"}"#);
    }
}

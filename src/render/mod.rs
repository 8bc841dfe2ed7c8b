//! Outline serialization.

mod json;

pub use json::{error_json, to_json, JsonFormat};

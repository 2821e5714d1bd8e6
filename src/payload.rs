//! Progress-payload extraction from log entries.
//!
//! Run workers log progress either as a structured `jsonPayload` or as a
//! plain text line with JSON appended (e.g. `INFO:root:{...}`). Extraction
//! is best-effort and never fails: anything that does not parse to a
//! non-empty JSON object yields `None`.

use serde_json::{Map, Value};

use crate::logging_client::LogEntry;

/// Parse the trailing JSON object out of a free-text log line.
///
/// Takes the substring from the first `{` to the end of the line, trims it,
/// and keeps the result only if it parses to a JSON object.
pub fn extract_json_from_text(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let candidate = text[start..].trim();

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Extract the progress payload from a log entry.
///
/// A non-empty structured payload wins; otherwise the text payload is
/// scanned. Empty objects count as no payload.
pub fn entry_payload(entry: &LogEntry) -> Option<Map<String, Value>> {
    if let Some(json) = entry.json_payload.as_ref().filter(|m| !m.is_empty()) {
        return Some(json.clone());
    }

    entry
        .text_payload
        .as_deref()
        .and_then(extract_json_from_text)
        .filter(|m| !m.is_empty())
}

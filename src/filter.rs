//! Log-query filter construction.
//!
//! Progress events are emitted by run workers as JSON lines, so the filter
//! matches on the serialized `"event_type": "progress"` and `"run_id"` pairs
//! inside `textPayload` rather than on indexed fields.

use std::fmt::Write;

/// Resource type used when the caller does not provide one.
pub const DEFAULT_RESOURCE_TYPE: &str = "cloud_run_revision";

/// Build the filter selecting progress events for a run.
///
/// Values are interpolated verbatim; a `"` inside any of them produces a
/// malformed filter (see DESIGN.md).
pub fn progress_filter(run_id: &str, resource_type: &str, service_name: Option<&str>) -> String {
    let mut filter = format!(
        r#"resource.type="{resource_type}" AND textPayload:"\"event_type\": \"progress\"" AND textPayload:"\"run_id\": \"{run_id}\"""#
    );

    if let Some(service_name) = service_name {
        // Writing to a String cannot fail.
        let _ = write!(filter, r#" AND resource.labels.service_name="{service_name}""#);
    }

    filter
}

/// Normalize a caller-supplied resource type: trimmed, defaulted when blank.
pub fn resource_type_or_default(resource_type: Option<&str>) -> &str {
    match resource_type.map(str::trim) {
        Some(rt) if !rt.is_empty() => rt,
        _ => DEFAULT_RESOURCE_TYPE,
    }
}

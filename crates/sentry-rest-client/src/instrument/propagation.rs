//! `sentry-trace` header injection and extraction
//!
//! `reqwest` re-exports the `http` header types, so both the REST client and
//! the tower layer go through these functions.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};

use crate::tracer::{SENTRY_TRACE_HEADER, TraceHeader};

/// Set the `sentry-trace` header, replacing any value already present
pub fn inject_trace_header(trace_header: &TraceHeader, headers: &mut HeaderMap) {
    let value = trace_header.value();
    match HeaderValue::from_str(&value) {
        Ok(header_value) => {
            headers.insert(HeaderName::from_static(SENTRY_TRACE_HEADER), header_value);
        }
        Err(e) => warn!(error = %e, value = %value, "Skipping invalid sentry-trace value"),
    }
}

/// Read an incoming `sentry-trace` header. Malformed values are ignored.
#[must_use]
pub fn extract_trace_header(headers: &HeaderMap) -> Option<TraceHeader> {
    let raw = headers.get(SENTRY_TRACE_HEADER)?.to_str().ok()?;
    match raw.parse() {
        Ok(trace_header) => Some(trace_header),
        Err(e) => {
            debug!(error = %e, "Failed to parse sentry-trace header");
            None
        }
    }
}

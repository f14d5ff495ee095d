//! `tracing` spans mirroring each recorded HTTP client span, so log lines
//! emitted during a call carry its trace and span ids.

use crate::tracer::Span;

/// Field names used on the log spans
pub mod attributes {
    pub const HTTP_REQUEST_METHOD: &str = "http.request.method";
    pub const HTTP_RESPONSE_STATUS_CODE: &str = "http.response.status_code";
    pub const URL_FULL: &str = "url.full";
    pub const SERVER_ADDRESS: &str = "server.address";
    pub const SENTRY_TRACE_ID: &str = "sentry.trace_id";
    pub const SENTRY_SPAN_ID: &str = "sentry.span_id";
    pub const SENTRY_STATUS: &str = "sentry.status";
    pub const ERROR_TYPE: &str = "error.type";
}

/// Create a log span for an HTTP client call recorded as `span`
#[must_use]
pub fn make_http_client_span(method: &str, url: &str, host: &str, span: &Span) -> tracing::Span {
    tracing::debug_span!(
        "http.client",
        description = %span.description(),
        { attributes::HTTP_REQUEST_METHOD } = %method,
        { attributes::URL_FULL } = %url,
        { attributes::SERVER_ADDRESS } = %host,
        { attributes::SENTRY_TRACE_ID } = %span.trace_id(),
        { attributes::SENTRY_SPAN_ID } = %span.span_id(),
        { attributes::HTTP_RESPONSE_STATUS_CODE } = tracing::field::Empty,
        { attributes::SENTRY_STATUS } = tracing::field::Empty,
        { attributes::ERROR_TYPE } = tracing::field::Empty,
    )
}

/// Record HTTP response status on a log span
pub fn record_http_status(log_span: &tracing::Span, span: &Span, status_code: u16) {
    log_span.record(attributes::HTTP_RESPONSE_STATUS_CODE, status_code);
    if let Some(status) = span.status() {
        log_span.record(attributes::SENTRY_STATUS, tracing::field::display(status));
    }
}

/// Record a transport failure on a log span
pub fn record_http_error(log_span: &tracing::Span, span: &Span, error: &str) {
    log_span.record(attributes::ERROR_TYPE, error);
    if let Some(status) = span.status() {
        log_span.record(attributes::SENTRY_STATUS, tracing::field::display(status));
    }
}

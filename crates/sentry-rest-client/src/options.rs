//! # Client and tracing options
//!
//! ## Example
//!
//! ```rust
//! use sentry_rest_client::{RestClientOptions, TracingOptions};
//! use std::time::Duration;
//!
//! let client_options = RestClientOptions {
//!     base_url: "http://localhost:8080".to_string(),
//!     timeout: Some(Duration::from_secs(5)),
//!     ..Default::default()
//! };
//! let tracing_options = TracingOptions {
//!     enabled: true,
//!     propagate_trace_header: false,
//! };
//! ```

use std::time::Duration;

use reqwest::header::HeaderMap;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the underlying HTTP client
#[derive(Debug, Clone)]
pub struct RestClientOptions {
    /// Base URL relative request paths are resolved against
    pub base_url: String,
    /// Headers sent with every request
    pub headers: HeaderMap,
    pub connect_timeout: Duration,
    /// Overall request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for RestClientOptions {
    fn default() -> Self {
        RestClientOptions {
            base_url: DEFAULT_BASE_URL.to_string(),
            headers: HeaderMap::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: None,
        }
    }
}

/// Settings for span recording on outgoing calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingOptions {
    /// Record spans at all
    /// Default: `SENTRY_TRACING_ENABLED`, else true
    pub enabled: bool,
    /// Write the `sentry-trace` header on instrumented requests
    /// Default: `SENTRY_TRACE_PROPAGATION`, else true
    pub propagate_trace_header: bool,
}

impl Default for TracingOptions {
    fn default() -> Self {
        let enabled = std::env::var("SENTRY_TRACING_ENABLED")
            .ok()
            .and_then(|s| parse_flag(&s))
            .unwrap_or(true);

        let propagate_trace_header = std::env::var("SENTRY_TRACE_PROPAGATION")
            .ok()
            .and_then(|s| parse_flag(&s))
            .unwrap_or(true);

        Self {
            enabled,
            propagate_trace_header,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

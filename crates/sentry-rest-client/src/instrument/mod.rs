//! HTTP client instrumentation
//!
//! Two entry points share the same span semantics:
//! - [`TracingCustomizer`] / [`TracingInterceptor`] for [`RestClient`](crate::RestClient)
//! - `TracingLayer` for any tower `Service` speaking `http` types
//!
//! With the `tower` feature, `TransactionLayer` starts the transaction those
//! spans attach to for each incoming request.

mod customizer;
mod interceptor;
#[cfg(feature = "tower")]
mod layer;
mod propagation;
#[cfg(feature = "tower")]
mod server;
mod span;

pub use customizer::TracingCustomizer;
pub use interceptor::TracingInterceptor;
#[cfg(feature = "tower")]
pub use layer::{TracedResponseFuture, TracingLayer, TracingService};
pub use propagation::{extract_trace_header, inject_trace_header};
#[cfg(feature = "tower")]
pub use server::{TransactionFuture, TransactionLayer, TransactionService};
pub use span::{attributes, make_http_client_span};

/// Operation recorded on every outgoing HTTP span
pub const HTTP_CLIENT_OP: &str = "http.client";

/// Operation of transactions started for incoming requests
pub const HTTP_SERVER_OP: &str = "http.server";

/// Span description: `<METHOD> <path>`
fn describe(method: &reqwest::Method, path: &str) -> String {
    format!("{} {}", method, path)
}

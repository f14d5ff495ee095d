//! # Sentry spans for outgoing HTTP calls
//!
//! Records an `http.client` span under the active transaction for every call
//! made through an instrumented client, and forwards the `sentry-trace` header
//! so the callee can continue the trace.
//!
//! ## Features
//!
//! * Interceptor chain on a `reqwest`-backed [`RestClient`]
//! * Idempotent registration through [`TracingCustomizer`]
//! * Tower `TracingLayer` for `http`-typed services (`tower` feature)
//! * Tower `TransactionLayer` starting a transaction per incoming request,
//!   continuing the caller's trace (`tower` feature)
//! * Explicit [`Scope`] handle instead of global state
//!
//! ## Example
//!
//! ```rust,no_run
//! use sentry_rest_client::{
//!     RestClient, RestClientCustomizer, RestClientOptions, Scope, TracingCustomizer,
//!     TransactionContext,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let scope = Scope::new();
//!     let mut client = RestClient::new(&RestClientOptions::default()).unwrap();
//!     TracingCustomizer::new(scope.clone()).customize(&mut client);
//!
//!     let transaction = scope.start_transaction(TransactionContext::new("checkout", "task", true));
//!     let body = client.get_text("/orders/{id}", &[&42]).await.unwrap();
//!
//!     for span in transaction.spans() {
//!         println!("{} {} {:?}", span.operation(), span.description(), span.status());
//!     }
//!     println!("{body}");
//! }
//! ```

pub mod client;
pub mod error;
pub mod instrument;
mod options;
pub mod tracer;

pub use client::{Interceptor, InterceptorKey, Next, RestClient, RestClientCustomizer};
pub use error::{ClientError, TraceHeaderError};
pub use instrument::{HTTP_CLIENT_OP, HTTP_SERVER_OP, TracingCustomizer, TracingInterceptor};
#[cfg(feature = "tower")]
pub use instrument::{TracingLayer, TransactionLayer};
pub use options::{RestClientOptions, TracingOptions};
pub use tracer::{
    SENTRY_TRACE_HEADER, Scope, Span, SpanStatus, TraceHeader, Transaction, TransactionContext,
};

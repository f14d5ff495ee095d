//! Minimal transaction/span model used by the HTTP instrumentation

mod header;
mod id;
mod scope;
mod span;
mod transaction;

pub use header::{SENTRY_TRACE_HEADER, TraceHeader};
pub use id::{SpanId, TraceId};
pub use scope::Scope;
pub use span::{Span, SpanRecord, SpanStatus};
pub use transaction::{Transaction, TransactionContext};

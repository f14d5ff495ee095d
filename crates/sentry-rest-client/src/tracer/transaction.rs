//! Root tracing unit owning the span list

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::header::TraceHeader;
use super::id::{SpanId, TraceId};
use super::span::{Span, SpanRecorder, SpanStatus};

/// Identity and sampling decision of a transaction before it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionContext {
    pub name: String,
    pub op: String,
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub sampled: Option<bool>,
}

impl TransactionContext {
    /// Starts a fresh trace
    #[must_use]
    pub fn new(name: impl Into<String>, op: impl Into<String>, sampled: bool) -> Self {
        Self {
            name: name.into(),
            op: op.into(),
            trace_id: TraceId::random(),
            span_id: SpanId::random(),
            parent_span_id: None,
            sampled: Some(sampled),
        }
    }

    /// Continues the trace announced by an incoming `sentry-trace` header
    #[must_use]
    pub fn from_trace_header(
        name: impl Into<String>,
        op: impl Into<String>,
        header: &TraceHeader,
    ) -> Self {
        Self {
            name: name.into(),
            op: op.into(),
            trace_id: header.trace_id,
            span_id: SpanId::random(),
            parent_span_id: Some(header.span_id),
            sampled: header.sampled,
        }
    }
}

#[derive(Debug, Default)]
struct TransactionState {
    status: Option<SpanStatus>,
    finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct TransactionInner {
    context: TransactionContext,
    started_at: DateTime<Utc>,
    state: Mutex<TransactionState>,
    recorder: Arc<SpanRecorder>,
}

/// A started transaction. Cheap to clone; clones share the span list.
#[derive(Debug, Clone)]
pub struct Transaction {
    inner: Arc<TransactionInner>,
}

impl Transaction {
    #[must_use]
    pub fn start(context: TransactionContext) -> Self {
        debug!(
            name = %context.name,
            op = %context.op,
            trace_id = %context.trace_id,
            "Transaction started"
        );
        Self {
            inner: Arc::new(TransactionInner {
                context,
                started_at: Utc::now(),
                state: Mutex::new(TransactionState::default()),
                recorder: Arc::new(SpanRecorder::default()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, TransactionState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Creates a child of the transaction's own span; it is appended to
    /// [`Transaction::spans`] immediately.
    #[must_use]
    pub fn start_child(&self, op: &str, description: impl Into<String>) -> Span {
        let context = &self.inner.context;
        Span::start(
            Arc::downgrade(&self.inner.recorder),
            context.trace_id,
            context.span_id,
            context.sampled,
            op,
            description.into(),
        )
    }

    /// Spans in creation order
    pub fn spans(&self) -> Vec<Span> {
        self.inner.recorder.snapshot()
    }

    pub fn context(&self) -> &TransactionContext {
        &self.inner.context
    }

    pub fn name(&self) -> &str {
        &self.inner.context.name
    }

    pub fn operation(&self) -> &str {
        &self.inner.context.op
    }

    pub fn trace_id(&self) -> TraceId {
        self.inner.context.trace_id
    }

    pub fn span_id(&self) -> SpanId {
        self.inner.context.span_id
    }

    pub fn sampled(&self) -> Option<bool> {
        self.inner.context.sampled
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    pub fn status(&self) -> Option<SpanStatus> {
        self.state().status
    }

    pub fn is_finished(&self) -> bool {
        self.state().finished_at.is_some()
    }

    /// Records the terminal status. Only the first call has an effect.
    pub fn finish(&self, status: SpanStatus) {
        let mut state = self.state();
        if state.finished_at.is_some() {
            return;
        }
        state.status = Some(status);
        state.finished_at = Some(Utc::now());
        debug!(
            name = %self.inner.context.name,
            spans = self.inner.recorder.snapshot().len(),
            %status,
            "Transaction finished"
        );
    }

    /// Header for a call made directly from the transaction's own span
    #[must_use]
    pub fn to_trace_header(&self) -> TraceHeader {
        let context = &self.inner.context;
        TraceHeader::new(context.trace_id, context.span_id, context.sampled)
    }

    /// Whether both handles refer to the same transaction
    pub fn ptr_eq(&self, other: &Transaction) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_child_span_belongs_to_transaction() {
        let transaction = Transaction::start(TransactionContext::new("aTransaction", "op", true));
        let span = transaction.start_child("http.client", "GET /test/123");

        assert_eq!(transaction.spans().len(), 1);
        assert_eq!(span.trace_id(), transaction.trace_id());
        assert_eq!(span.parent_span_id(), transaction.span_id());
        assert_ne!(span.span_id(), transaction.span_id());
        assert_eq!(span.sampled(), Some(true));
    }

    #[test]
    fn test_continue_from_header() {
        let upstream = Transaction::start(TransactionContext::new("upstream", "http.server", false));
        let header = upstream.to_trace_header();

        let context = TransactionContext::from_trace_header("GET /orders", "http.server", &header);

        assert_eq!(context.trace_id, upstream.trace_id());
        assert_eq!(context.parent_span_id, Some(upstream.span_id()));
        assert_ne!(context.span_id, upstream.span_id());
        assert_eq!(context.sampled, Some(false));
    }

    #[test]
    fn test_finish_is_idempotent() {
        let transaction = Transaction::start(TransactionContext::new("aTransaction", "op", true));

        transaction.finish(SpanStatus::InternalError);
        transaction.finish(SpanStatus::Ok);

        assert!(transaction.is_finished());
        assert_eq!(transaction.status(), Some(SpanStatus::InternalError));
    }

    #[test]
    fn test_concurrent_children_are_not_lost() {
        let transaction = Transaction::start(TransactionContext::new("aTransaction", "op", true));

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let transaction = transaction.clone();
                thread::spawn(move || {
                    for call in 0..50 {
                        transaction
                            .start_child("http.client", format!("GET /w/{worker}/{call}"))
                            .finish();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let spans = transaction.spans();
        assert_eq!(spans.len(), 400);
        assert!(spans.iter().all(Span::is_finished));
    }
}

//! Child spans recorded under a transaction

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::header::TraceHeader;
use super::id::{SpanId, TraceId};

/// Terminal outcome of a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanStatus {
    Ok,
    InternalError,
}

impl SpanStatus {
    /// 2xx maps to `Ok`, every other status to `InternalError`
    #[must_use]
    pub fn from_http_status(status_code: u16) -> Self {
        if (200..300).contains(&status_code) {
            SpanStatus::Ok
        } else {
            SpanStatus::InternalError
        }
    }
}

impl fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanStatus::Ok => write!(f, "ok"),
            SpanStatus::InternalError => write!(f, "internal_error"),
        }
    }
}

/// Append-only span list shared by a transaction and all of its spans
#[derive(Debug, Default)]
pub(crate) struct SpanRecorder {
    spans: Mutex<Vec<Span>>,
}

impl SpanRecorder {
    fn lock(&self) -> MutexGuard<'_, Vec<Span>> {
        self.spans.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn record(&self, span: Span) {
        self.lock().push(span);
    }

    pub(crate) fn snapshot(&self) -> Vec<Span> {
        self.lock().clone()
    }
}

#[derive(Debug)]
struct SpanState {
    status: Option<SpanStatus>,
    finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct SpanInner {
    trace_id: TraceId,
    span_id: SpanId,
    parent_span_id: SpanId,
    sampled: Option<bool>,
    op: String,
    description: String,
    started_at: DateTime<Utc>,
    state: Mutex<SpanState>,
    recorder: Weak<SpanRecorder>,
}

/// Handle to a span; clones refer to the same span.
#[derive(Debug, Clone)]
pub struct Span {
    inner: Arc<SpanInner>,
}

impl Span {
    /// Creates the span and appends it to `recorder` while the owning
    /// transaction is still alive.
    pub(crate) fn start(
        recorder: Weak<SpanRecorder>,
        trace_id: TraceId,
        parent_span_id: SpanId,
        sampled: Option<bool>,
        op: &str,
        description: String,
    ) -> Self {
        let span = Self {
            inner: Arc::new(SpanInner {
                trace_id,
                span_id: SpanId::random(),
                parent_span_id,
                sampled,
                op: op.to_string(),
                description,
                started_at: Utc::now(),
                state: Mutex::new(SpanState {
                    status: None,
                    finished_at: None,
                }),
                recorder,
            }),
        };
        if let Some(recorder) = span.inner.recorder.upgrade() {
            recorder.record(span.clone());
        }
        debug!(
            op = %span.inner.op,
            span_id = %span.inner.span_id,
            parent_span_id = %parent_span_id,
            "Span started"
        );
        span
    }

    fn state(&self) -> MutexGuard<'_, SpanState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts a nested span recorded in the same transaction
    #[must_use]
    pub fn start_child(&self, op: &str, description: impl Into<String>) -> Span {
        Span::start(
            Weak::clone(&self.inner.recorder),
            self.inner.trace_id,
            self.inner.span_id,
            self.inner.sampled,
            op,
            description.into(),
        )
    }

    pub fn operation(&self) -> &str {
        &self.inner.op
    }

    pub fn description(&self) -> &str {
        &self.inner.description
    }

    pub fn trace_id(&self) -> TraceId {
        self.inner.trace_id
    }

    pub fn span_id(&self) -> SpanId {
        self.inner.span_id
    }

    pub fn parent_span_id(&self) -> SpanId {
        self.inner.parent_span_id
    }

    pub fn sampled(&self) -> Option<bool> {
        self.inner.sampled
    }

    pub fn status(&self) -> Option<SpanStatus> {
        self.state().status
    }

    /// Ignored once the span is finished
    pub fn set_status(&self, status: SpanStatus) {
        let mut state = self.state();
        if state.finished_at.is_none() {
            state.status = Some(status);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state().finished_at.is_some()
    }

    /// Marks the span finished; later calls are no-ops.
    pub fn finish(&self) {
        let mut state = self.state();
        if state.finished_at.is_some() {
            return;
        }
        state.finished_at = Some(Utc::now());
        debug!(
            op = %self.inner.op,
            span_id = %self.inner.span_id,
            status = ?state.status,
            "Span finished"
        );
    }

    /// Header announcing this span as the parent of the callee's work
    #[must_use]
    pub fn to_trace_header(&self) -> TraceHeader {
        TraceHeader::new(self.inner.trace_id, self.inner.span_id, self.inner.sampled)
    }

    #[must_use]
    pub fn to_record(&self) -> SpanRecord {
        let state = self.state();
        SpanRecord {
            trace_id: self.inner.trace_id,
            span_id: self.inner.span_id,
            parent_span_id: self.inner.parent_span_id,
            op: self.inner.op.clone(),
            description: self.inner.description.clone(),
            status: state.status,
            start_timestamp: self.inner.started_at,
            timestamp: state.finished_at,
        }
    }
}

/// Serializable snapshot of a span
#[derive(Debug, Clone, Serialize)]
pub struct SpanRecord {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: SpanId,
    pub op: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SpanStatus>,
    pub start_timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

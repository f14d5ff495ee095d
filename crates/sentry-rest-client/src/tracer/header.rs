//! The `sentry-trace` propagation header

use std::fmt;
use std::str::FromStr;

use super::id::{SpanId, TraceId};
use crate::error::TraceHeaderError;

/// Name of the header carrying trace and span ids to the callee
pub const SENTRY_TRACE_HEADER: &str = "sentry-trace";

/// Parsed or generated `sentry-trace` value: `<trace-id>-<span-id>[-<0|1>]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceHeader {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub sampled: Option<bool>,
}

impl TraceHeader {
    #[must_use]
    pub fn new(trace_id: TraceId, span_id: SpanId, sampled: Option<bool>) -> Self {
        Self {
            trace_id,
            span_id,
            sampled,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        SENTRY_TRACE_HEADER
    }

    #[must_use]
    pub fn value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TraceHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sampled {
            Some(sampled) => write!(
                f,
                "{}-{}-{}",
                self.trace_id,
                self.span_id,
                if sampled { "1" } else { "0" }
            ),
            None => write!(f, "{}-{}", self.trace_id, self.span_id),
        }
    }
}

impl FromStr for TraceHeader {
    type Err = TraceHeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(TraceHeaderError::SegmentCount(parts.len()));
        }

        let trace_id = parts[0].parse()?;
        let span_id = parts[1].parse()?;
        let sampled = match parts.get(2) {
            None => None,
            Some(&"1") => Some(true),
            Some(&"0") => Some(false),
            Some(other) => return Err(TraceHeaderError::Sampled((*other).to_string())),
        };

        Ok(Self {
            trace_id,
            span_id,
            sampled,
        })
    }
}

//! Span-recording interceptor for [`RestClient`](crate::RestClient)

use async_trait::async_trait;
use reqwest::{Request, Response};
use tracing::{Instrument, debug, warn};

use super::propagation::inject_trace_header;
use super::span::{make_http_client_span, record_http_error, record_http_status};
use super::{HTTP_CLIENT_OP, describe};
use crate::TracingOptions;
use crate::client::{Interceptor, InterceptorKey, Next};
use crate::error::ClientError;
use crate::tracer::{Scope, SpanStatus, Transaction};

/// Wraps each exchange in an `http.client` span under the active transaction
/// and forwards the `sentry-trace` header.
#[derive(Debug, Clone)]
pub struct TracingInterceptor {
    scope: Scope,
    options: TracingOptions,
}

impl TracingInterceptor {
    pub const KEY: InterceptorKey = InterceptorKey::new("sentry.tracing");

    #[must_use]
    pub fn new(scope: Scope) -> Self {
        Self::with_options(scope, TracingOptions::default())
    }

    #[must_use]
    pub fn with_options(scope: Scope, options: TracingOptions) -> Self {
        Self { scope, options }
    }

    fn active_transaction(&self) -> Option<Transaction> {
        if !self.options.enabled {
            return None;
        }
        self.scope.transaction()
    }
}

#[async_trait]
impl Interceptor for TracingInterceptor {
    fn key(&self) -> InterceptorKey {
        Self::KEY
    }

    async fn intercept(
        &self,
        mut request: Request,
        next: Next<'_>,
    ) -> Result<Response, ClientError> {
        let Some(transaction) = self.active_transaction() else {
            return next.run(request).await;
        };

        let span = transaction.start_child(
            HTTP_CLIENT_OP,
            describe(request.method(), request.url().path()),
        );
        let log_span = make_http_client_span(
            request.method().as_str(),
            request.url().as_str(),
            request.url().host_str().unwrap_or_default(),
            &span,
        );

        if self.options.propagate_trace_header {
            inject_trace_header(&span.to_trace_header(), request.headers_mut());
        }

        let result = next.run(request).instrument(log_span.clone()).await;

        match &result {
            Ok(response) => {
                let status_code = response.status().as_u16();
                span.set_status(SpanStatus::from_http_status(status_code));
                record_http_status(&log_span, &span, status_code);
                debug!(parent: &log_span, status = status_code, "Received response");
            }
            Err(e) => {
                span.set_status(SpanStatus::InternalError);
                record_http_error(&log_span, &span, &e.to_string());
                warn!(parent: &log_span, error = %e, "HTTP client call failed");
            }
        }
        span.finish();

        result
    }
}

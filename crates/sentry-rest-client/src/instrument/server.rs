//! Tower layer starting a transaction per incoming request
//!
//! The transaction continues the caller's trace when a valid `sentry-trace`
//! header arrives, and is bound to the [`Scope`] while the request is handled
//! so outgoing calls made through an instrumented client attach their spans
//! to it.

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use http::{Request, Response};
use pin_project_lite::pin_project;
use tower::{Layer, Service};

use super::propagation::extract_trace_header;
use super::span::attributes;
use super::{HTTP_SERVER_OP, describe};
use crate::TracingOptions;
use crate::tracer::{Scope, SpanStatus, Transaction, TransactionContext};

/// Tower layer for servers: one transaction per request, finished with a
/// status derived from the response code.
#[derive(Debug, Clone)]
pub struct TransactionLayer {
    scope: Scope,
    options: TracingOptions,
    sampled: bool,
}

impl TransactionLayer {
    #[must_use]
    pub fn new(scope: Scope) -> Self {
        Self::with_options(scope, TracingOptions::default())
    }

    #[must_use]
    pub fn with_options(scope: Scope, options: TracingOptions) -> Self {
        Self {
            scope,
            options,
            sampled: true,
        }
    }

    /// Sampling decision for traces started here. Continued traces keep the
    /// caller's decision.
    #[must_use]
    pub fn sampled(mut self, sampled: bool) -> Self {
        self.sampled = sampled;
        self
    }
}

impl<S> Layer<S> for TransactionLayer {
    type Service = TransactionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TransactionService {
            inner,
            scope: self.scope.clone(),
            options: self.options.clone(),
            sampled: self.sampled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransactionService<S> {
    inner: S,
    scope: Scope,
    options: TracingOptions,
    sampled: bool,
}

impl<S> TransactionService<S> {
    fn context_for<B>(&self, req: &Request<B>) -> TransactionContext {
        let name = describe(req.method(), req.uri().path());
        match extract_trace_header(req.headers()) {
            Some(header) => TransactionContext::from_trace_header(name, HTTP_SERVER_OP, &header),
            None => TransactionContext::new(name, HTTP_SERVER_OP, self.sampled),
        }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for TransactionService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Error: Display,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = TransactionFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if !self.options.enabled {
            return TransactionFuture {
                inner: self.inner.call(req),
                in_flight: None,
            };
        }

        let transaction = self.scope.start_transaction(self.context_for(&req));
        let log_span = tracing::debug_span!(
            "http.server",
            name = %transaction.name(),
            { attributes::HTTP_REQUEST_METHOD } = %req.method(),
            { attributes::SENTRY_TRACE_ID } = %transaction.trace_id(),
            { attributes::SENTRY_SPAN_ID } = %transaction.span_id(),
            { attributes::HTTP_RESPONSE_STATUS_CODE } = tracing::field::Empty,
            { attributes::SENTRY_STATUS } = tracing::field::Empty,
            { attributes::ERROR_TYPE } = tracing::field::Empty,
        );

        let future = {
            let _enter = log_span.enter();
            self.inner.call(req)
        };

        TransactionFuture {
            inner: future,
            in_flight: Some(InFlight {
                scope: self.scope.clone(),
                transaction,
                log_span,
            }),
        }
    }
}

struct InFlight {
    scope: Scope,
    transaction: Transaction,
    log_span: tracing::Span,
}

pin_project! {
    /// Response future that finishes the request's transaction on completion
    pub struct TransactionFuture<F> {
        #[pin]
        inner: F,
        in_flight: Option<InFlight>,
    }
}

impl<F, ResBody, E> Future for TransactionFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
    E: Display,
{
    type Output = Result<Response<ResBody>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        let result = match this.in_flight.as_ref() {
            Some(in_flight) => {
                let _guard = in_flight.log_span.enter();
                ready!(this.inner.poll(cx))
            }
            None => ready!(this.inner.poll(cx)),
        };

        if let Some(InFlight {
            scope,
            transaction,
            log_span,
        }) = this.in_flight.take()
        {
            let status = match &result {
                Ok(response) => {
                    let status_code = response.status().as_u16();
                    log_span.record(attributes::HTTP_RESPONSE_STATUS_CODE, status_code);
                    SpanStatus::from_http_status(status_code)
                }
                Err(e) => {
                    log_span.record(attributes::ERROR_TYPE, tracing::field::display(e));
                    tracing::warn!(parent: &log_span, error = %e, "Request handler failed");
                    SpanStatus::InternalError
                }
            };
            log_span.record(attributes::SENTRY_STATUS, tracing::field::display(status));
            transaction.finish(status);
            scope.clear_transaction_if(&transaction);
        }

        Poll::Ready(result)
    }
}

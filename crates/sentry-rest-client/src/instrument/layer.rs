//! Tower layer recording `http.client` spans
//!
//! For clients built on tower services (hyper, tonic, or custom stacks)
//! rather than [`RestClient`](crate::RestClient).

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use http::{Request, Response};
use pin_project_lite::pin_project;
use tower::{Layer, Service};

use super::propagation::inject_trace_header;
use super::span::{make_http_client_span, record_http_error, record_http_status};
use super::{HTTP_CLIENT_OP, describe};
use crate::TracingOptions;
use crate::tracer::{Scope, Span, SpanStatus};

/// Tower layer that adds span recording to HTTP clients.
///
/// This layer:
/// - Creates a child span of the active transaction for each call
/// - Propagates the `sentry-trace` header
/// - Records the span status when the response future resolves
#[derive(Debug, Clone)]
pub struct TracingLayer {
    scope: Scope,
    options: TracingOptions,
}

impl TracingLayer {
    #[must_use]
    pub fn new(scope: Scope) -> Self {
        Self::with_options(scope, TracingOptions::default())
    }

    #[must_use]
    pub fn with_options(scope: Scope, options: TracingOptions) -> Self {
        Self { scope, options }
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService {
            inner,
            scope: self.scope.clone(),
            options: self.options.clone(),
        }
    }
}

/// Instrumented service wrapper
#[derive(Debug, Clone)]
pub struct TracingService<S> {
    inner: S,
    scope: Scope,
    options: TracingOptions,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for TracingService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Error: Display,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = TracedResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let transaction = if self.options.enabled {
            self.scope.transaction()
        } else {
            None
        };
        let Some(transaction) = transaction else {
            return TracedResponseFuture {
                inner: self.inner.call(req),
                in_flight: None,
            };
        };

        let span =
            transaction.start_child(HTTP_CLIENT_OP, describe(req.method(), req.uri().path()));
        let log_span = make_http_client_span(
            req.method().as_str(),
            &req.uri().to_string(),
            req.uri().host().unwrap_or_default(),
            &span,
        );

        if self.options.propagate_trace_header {
            inject_trace_header(&span.to_trace_header(), req.headers_mut());
        }

        let future = {
            let _enter = log_span.enter();
            self.inner.call(req)
        };

        TracedResponseFuture {
            inner: future,
            in_flight: Some(InFlight { span, log_span }),
        }
    }
}

struct InFlight {
    span: Span,
    log_span: tracing::Span,
}

pin_project! {
    /// Response future that finishes the span on completion
    pub struct TracedResponseFuture<F> {
        #[pin]
        inner: F,
        in_flight: Option<InFlight>,
    }
}

impl<F, ResBody, E> Future for TracedResponseFuture<F>
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

        if let Some(InFlight { span, log_span }) = this.in_flight.take() {
            match &result {
                Ok(response) => {
                    let status_code = response.status().as_u16();
                    span.set_status(SpanStatus::from_http_status(status_code));
                    record_http_status(&log_span, &span, status_code);
                }
                Err(e) => {
                    span.set_status(SpanStatus::InternalError);
                    record_http_error(&log_span, &span, &e.to_string());
                    tracing::warn!(parent: &log_span, error = %e, "HTTP client call failed");
                }
            }
            span.finish();
        }

        Poll::Ready(result)
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};

    use http::{HeaderMap, Request, Response};
    use test_log::test;
    use tower::{Layer, Service, ServiceExt};

    use super::TracingLayer;
    use crate::TracingOptions;
    use crate::tracer::{SENTRY_TRACE_HEADER, Scope, SpanStatus, TransactionContext};

    /// Mock HTTP service answering with a fixed status, capturing request headers
    #[derive(Clone)]
    struct MockHttpService {
        status: u16,
        captured_headers: Arc<Mutex<Option<HeaderMap>>>,
    }

    impl MockHttpService {
        fn new(status: u16) -> Self {
            Self {
                status,
                captured_headers: Arc::new(Mutex::new(None)),
            }
        }
    }

    impl<B> Service<Request<B>> for MockHttpService
    where
        B: Send + 'static,
    {
        type Response = Response<String>;
        type Error = std::io::Error;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<B>) -> Self::Future {
            *self.captured_headers.lock().unwrap() = Some(req.headers().clone());
            let status = self.status;
            Box::pin(async move {
                Ok(Response::builder()
                    .status(status)
                    .body("OK".to_string())
                    .unwrap())
            })
        }
    }

    /// Mock service failing before any response exists
    #[derive(Clone)]
    struct FailingService;

    impl<B> Service<Request<B>> for FailingService {
        type Response = Response<String>;
        type Error = std::io::Error;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<B>) -> Self::Future {
            std::future::ready(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )))
        }
    }

    fn request() -> Request<()> {
        Request::builder()
            .method("GET")
            .uri("http://backend.local/test/123?verbose=1")
            .body(())
            .unwrap()
    }

    #[test(tokio::test)]
    async fn test_layer_records_span_and_injects_header() {
        let scope = Scope::new();
        let transaction = scope.start_transaction(TransactionContext::new("aTransaction", "op", true));
        let mock_service = MockHttpService::new(200);
        let captured = mock_service.captured_headers.clone();

        let response = TracingLayer::new(scope)
            .layer(mock_service)
            .oneshot(request())
            .await
            .unwrap();
        assert_eq!(response.body(), "OK");

        let spans = transaction.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].operation(), "http.client");
        assert_eq!(spans[0].description(), "GET /test/123");
        assert_eq!(spans[0].status(), Some(SpanStatus::Ok));
        assert!(spans[0].is_finished());

        let headers = captured.lock().unwrap();
        let headers = headers.as_ref().expect("Headers should be captured");
        let value = headers.get(SENTRY_TRACE_HEADER).unwrap().to_str().unwrap();
        assert_eq!(value, spans[0].to_trace_header().value());
    }

    #[test(tokio::test)]
    async fn test_layer_records_error_status() {
        let scope = Scope::new();
        let transaction = scope.start_transaction(TransactionContext::new("aTransaction", "op", true));

        let response = TracingLayer::new(scope)
            .layer(MockHttpService::new(502))
            .oneshot(request())
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 502);

        let spans = transaction.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].status(), Some(SpanStatus::InternalError));
    }

    #[test(tokio::test)]
    async fn test_layer_propagates_service_errors() {
        let scope = Scope::new();
        let transaction = scope.start_transaction(TransactionContext::new("aTransaction", "op", true));

        let err = TracingLayer::new(scope)
            .layer(FailingService)
            .oneshot(request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::ConnectionReset);

        let spans = transaction.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].status(), Some(SpanStatus::InternalError));
        assert!(spans[0].is_finished());
    }

    #[test(tokio::test)]
    async fn test_layer_passes_through_without_transaction() {
        let mock_service = MockHttpService::new(200);
        let captured = mock_service.captured_headers.clone();

        let mut service = TracingLayer::new(Scope::new()).layer(mock_service);
        let response = service.call(request()).await.unwrap();
        assert_eq!(response.body(), "OK");

        let headers = captured.lock().unwrap();
        assert!(!headers.as_ref().unwrap().contains_key(SENTRY_TRACE_HEADER));
    }

    #[test(tokio::test)]
    async fn test_layer_respects_disabled_options() {
        let scope = Scope::new();
        let transaction = scope.start_transaction(TransactionContext::new("aTransaction", "op", true));
        let options = TracingOptions {
            enabled: false,
            propagate_trace_header: true,
        };

        TracingLayer::with_options(scope, options)
            .layer(MockHttpService::new(200))
            .oneshot(request())
            .await
            .unwrap();

        assert!(transaction.spans().is_empty());
    }
}

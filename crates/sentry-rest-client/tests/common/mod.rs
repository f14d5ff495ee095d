use std::time::Duration;

use sentry_rest_client::{
    RestClient, RestClientCustomizer, RestClientOptions, Scope, Transaction, TransactionContext,
    TracingCustomizer, TracingOptions,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(250);

/// Mock backend, a tracing-enabled client, and a transaction that is only
/// bound to the scope when a test asks for it.
pub struct Fixture {
    pub scope: Scope,
    pub transaction: Transaction,
    pub customizer: TracingCustomizer,
    pub mock_server: MockServer,
    pub client: RestClient,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_options(TracingOptions {
            enabled: true,
            propagate_trace_header: true,
        })
        .await
    }

    pub async fn with_options(options: TracingOptions) -> Self {
        let scope = Scope::new();
        let mock_server = MockServer::start().await;
        let client = RestClient::new(&RestClientOptions {
            base_url: mock_server.uri(),
            timeout: Some(REQUEST_TIMEOUT),
            ..Default::default()
        })
        .expect("Failed to create RestClient");

        Self {
            transaction: Transaction::start(TransactionContext::new("aTransaction", "op", true)),
            customizer: TracingCustomizer::with_options(scope.clone(), options),
            scope,
            mock_server,
            client,
        }
    }

    /// Registers the customizer and mounts `GET /test/123`. A failing
    /// transport is simulated by delaying the response past the client timeout.
    pub async fn get_sut(
        &mut self,
        is_transaction_active: bool,
        status: u16,
        fail_transport: bool,
    ) -> &RestClient {
        self.customizer.customize(&mut self.client);

        if is_transaction_active {
            self.scope.set_transaction(self.transaction.clone());
        }

        let mut response = ResponseTemplate::new(status).set_body_string("OK");
        if fail_transport {
            response = response.set_delay(REQUEST_TIMEOUT * 8);
        }

        Mock::given(method("GET"))
            .and(path("/test/123"))
            .respond_with(response)
            .mount(&self.mock_server)
            .await;

        &self.client
    }

    /// Value of the `sentry-trace` header on the single received request
    pub async fn received_trace_header(&self) -> Option<String> {
        let requests = self
            .mock_server
            .received_requests()
            .await
            .expect("request recording enabled");
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests[0]
            .headers
            .get("sentry-trace")
            .map(|v| v.to_str().expect("ascii header").to_string())
    }
}

use std::sync::Arc;

use tracing::debug;

use super::interceptor::TracingInterceptor;
use crate::TracingOptions;
use crate::client::{RestClient, RestClientCustomizer};
use crate::tracer::Scope;

/// Registers a [`TracingInterceptor`] on a client, at most once.
#[derive(Debug, Clone)]
pub struct TracingCustomizer {
    interceptor: Arc<TracingInterceptor>,
}

impl TracingCustomizer {
    #[must_use]
    pub fn new(scope: Scope) -> Self {
        Self::with_options(scope, TracingOptions::default())
    }

    #[must_use]
    pub fn with_options(scope: Scope, options: TracingOptions) -> Self {
        Self {
            interceptor: Arc::new(TracingInterceptor::with_options(scope, options)),
        }
    }
}

impl RestClientCustomizer for TracingCustomizer {
    fn customize(&self, client: &mut RestClient) {
        if client.add_interceptor_if_absent(self.interceptor.clone()) {
            debug!(base_url = %client.base_url(), "Tracing interceptor registered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RestClientOptions;
    use crate::client::Interceptor;

    #[test]
    fn test_customize_twice_registers_once() {
        let customizer = TracingCustomizer::new(Scope::new());
        let mut client = RestClient::new(&RestClientOptions::default()).unwrap();

        customizer.customize(&mut client);
        assert_eq!(client.interceptors().len(), 1);
        customizer.customize(&mut client);
        assert_eq!(client.interceptors().len(), 1);
        assert_eq!(client.interceptors()[0].key(), TracingInterceptor::KEY);
    }

    #[test]
    fn test_separate_customizers_share_the_key() {
        let scope = Scope::new();
        let mut client = RestClient::new(&RestClientOptions::default()).unwrap();

        TracingCustomizer::new(scope.clone()).customize(&mut client);
        TracingCustomizer::new(scope).customize(&mut client);

        assert_eq!(client.interceptors().len(), 1);
    }
}

//! Interceptor chain for [`RestClient`](super::RestClient)
//!
//! Interceptors run in registration order. Each one receives the request and a
//! [`Next`] handle; calling [`Next::run`] hands the request to the following
//! interceptor, or to the transport once the chain is exhausted.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Request, Response};

use crate::error::ClientError;

/// Typed marker naming the capability an interceptor provides.
///
/// Registration through [`RestClient::add_interceptor_if_absent`](super::RestClient::add_interceptor_if_absent)
/// compares keys, so two instances of the same interceptor never coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorKey(&'static str);

impl InterceptorKey {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for InterceptorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[async_trait]
pub trait Interceptor: Send + Sync + fmt::Debug {
    fn key(&self) -> InterceptorKey;

    /// Handle one exchange. Implementations must either call
    /// `next.run(request)` or produce a response themselves.
    async fn intercept(&self, request: Request, next: Next<'_>) -> Result<Response, ClientError>;
}

/// Remainder of the chain after the current interceptor
#[derive(Clone, Copy)]
pub struct Next<'a> {
    client: &'a Client,
    interceptors: &'a [Arc<dyn Interceptor>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(client: &'a Client, interceptors: &'a [Arc<dyn Interceptor>]) -> Self {
        Self {
            client,
            interceptors,
        }
    }

    pub async fn run(mut self, request: Request) -> Result<Response, ClientError> {
        match self.interceptors.split_first() {
            Some((current, rest)) => {
                self.interceptors = rest;
                current.intercept(request, self).await
            }
            None => Ok(self.client.execute(request).await?),
        }
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.interceptors.len())
            .finish()
    }
}

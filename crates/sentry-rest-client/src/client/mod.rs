//! # REST client
//!
//! A `reqwest` client bound to a base URL with an ordered list of
//! [`Interceptor`]s wrapped around every exchange.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sentry_rest_client::{RestClient, RestClientOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = RestClient::new(&RestClientOptions {
//!         base_url: "http://localhost:8080".to_string(),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//!     let body = client.get_text("/orders/{id}", &[&42]).await.unwrap();
//!     println!("{body}");
//! }
//! ```

mod interceptor;

use std::fmt::Display;
use std::sync::Arc;

use reqwest::{Client, ClientBuilder, Method, Request, Response};
use tracing::{debug, instrument};
use url::Url;

use crate::RestClientOptions;
use crate::error::ClientError;

pub use interceptor::{Interceptor, InterceptorKey, Next};

/// Hook applied to a freshly built client, e.g. to register interceptors
pub trait RestClientCustomizer {
    fn customize(&self, client: &mut RestClient);
}

#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: Url,
    client: Client,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl RestClient {
    pub fn new(options: &RestClientOptions) -> Result<Self, ClientError> {
        let base_url = Url::parse(&options.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "'{}' cannot be used as a base URL",
                options.base_url
            )));
        }

        let mut builder = ClientBuilder::new()
            .default_headers(options.headers.clone())
            .connect_timeout(options.connect_timeout);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            client,
            interceptors: Vec::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }

    pub fn has_interceptor(&self, key: InterceptorKey) -> bool {
        self.interceptors.iter().any(|i| i.key() == key)
    }

    /// Appends `interceptor` unconditionally
    pub fn add_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) {
        debug!(key = %interceptor.key(), "Adding interceptor");
        self.interceptors.push(interceptor);
    }

    /// Appends `interceptor` unless one with the same key is registered.
    /// Returns whether it was added.
    pub fn add_interceptor_if_absent(&mut self, interceptor: Arc<dyn Interceptor>) -> bool {
        if self.has_interceptor(interceptor.key()) {
            debug!(key = %interceptor.key(), "Interceptor already registered");
            return false;
        }
        self.add_interceptor(interceptor);
        true
    }

    /// Builds a request for `path`, resolved against the base URL
    pub fn request(&self, method: Method, path: &str) -> Result<Request, ClientError> {
        let url = self.base_url.join(path)?;
        Ok(Request::new(method, url))
    }

    /// Runs the interceptor chain and the transport. Any HTTP status is a
    /// successful exchange here.
    pub async fn execute(&self, request: Request) -> Result<Response, ClientError> {
        Next::new(&self.client, &self.interceptors).run(request).await
    }

    /// GETs the expanded `template` and returns the body of a 2xx response.
    ///
    /// `{name}` placeholders are replaced by `vars` in order; values are
    /// inserted verbatim.
    #[instrument(skip(self, vars))]
    pub async fn get_text(
        &self,
        template: &str,
        vars: &[&(dyn Display + Sync)],
    ) -> Result<String, ClientError> {
        let path = expand_template(template, vars)?;
        let request = self.request(Method::GET, &path)?;

        let response = self.execute(request).await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Received response");

        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status { status, body });
        }
        Ok(body)
    }
}

fn expand_template(template: &str, vars: &[&(dyn Display + Sync)]) -> Result<String, ClientError> {
    let mut expanded = String::with_capacity(template.len());
    let mut values = vars.iter();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        expanded.push_str(&rest[..open]);
        let close = rest[open..].find('}').ok_or_else(|| {
            ClientError::Template(format!("unclosed placeholder in '{}'", template))
        })?;
        let placeholder = &rest[open..open + close + 1];
        let value = values.next().ok_or_else(|| {
            ClientError::Template(format!("no value for {} in '{}'", placeholder, template))
        })?;
        expanded.push_str(&value.to_string());
        rest = &rest[open + close + 1..];
    }
    expanded.push_str(rest);

    if values.next().is_some() {
        return Err(ClientError::Template(format!(
            "{} values supplied for '{}' but fewer placeholders",
            vars.len(),
            template
        )));
    }
    Ok(expanded)
}

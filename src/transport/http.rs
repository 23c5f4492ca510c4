//! HTTP transport backed by `reqwest`.
//!
//! The client is supplied by the caller (or defaulted), so whatever
//! authentication, proxying, and timeout policy it carries applies to
//! every invocation unchanged. Query pairs from the binder are passed to
//! the client unencoded; percent-encoding happens here, in the client.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde_json::Value;

use crate::binding::binder::ResolvedRequest;
use crate::errors::TransportError;
use crate::openapi::route::HttpMethod;
use crate::transport::Transport;

/// Transport that executes resolved requests against one HTTP origin.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    default_headers: Vec<(String, String)>,
}

impl HttpTransport {
    /// Create a transport for a base URL with a default client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            default_headers: Vec::new(),
        }
    }

    /// Builder: use a caller-configured client (auth, proxy, timeouts).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Builder: add a header sent on every request. Per-request headers
    /// from the binder are applied afterwards and win on conflict.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Join the base URL and a resolved path.
    fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

fn method_for(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
        HttpMethod::Trace => Method::TRACE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ResolvedRequest) -> Result<Value, TransportError> {
        let url = self.url_for(&request.path);
        log::debug!("executing {} {}", request.method, url);

        let mut builder = self
            .client
            .request(method_for(request.method), &url)
            .query(&request.query);

        for (name, value) in &self.default_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?.error_for_status()?;

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("json"))
            .unwrap_or(false);

        if is_json {
            Ok(response.json().await?)
        } else {
            Ok(Value::String(response.text().await?))
        }
    }
}

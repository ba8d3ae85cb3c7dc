//! HTTP transport for posting request bodies.
//!
//! The client talks to a [`Transport`] so the request/response lifecycle can
//! run against an in-memory transport in tests. [`ReqwestTransport`] is the
//! real one.

use std::collections::HashMap;
use std::error::Error as _;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder};
use thiserror::Error;

use crate::error::ErrorCode;
use crate::options::TransportOptions;

/// A fully built POST.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A transport-level failure, classified the way responses report it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct TransportError {
    /// `NetworkError` or `SslError`.
    pub code: ErrorCode,
    pub message: String,
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NetworkError,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        let code = if is_tls_error(&error) {
            ErrorCode::SslError
        } else {
            ErrorCode::NetworkError
        };
        Self {
            code,
            message: error.to_string(),
        }
    }
}

/// reqwest does not expose TLS failures as a kind, so this is a heuristic:
/// any cause in the source chain whose message mentions a certificate, TLS or
/// SSL counts. A miss reports the failure as a plain network error.
fn is_tls_error(error: &reqwest::Error) -> bool {
    mentions_tls(error.source())
}

fn mentions_tls(mut source: Option<&(dyn std::error::Error + 'static)>) -> bool {
    while let Some(cause) = source {
        let text = cause.to_string().to_ascii_lowercase();
        if ["certificate", "tls", "ssl"].iter().any(|needle| text.contains(needle)) {
            return true;
        }
        source = cause.source();
    }
    false
}

/// Status and incrementally readable body of a reply.
#[async_trait]
pub trait ReplyBody: Send {
    fn status(&self) -> u16;

    /// Next chunk of the body, `None` once it is complete.
    async fn chunk(&mut self) -> Result<Option<Bytes>, TransportError>;
}

#[async_trait]
impl ReplyBody for reqwest::Response {
    fn status(&self) -> u16 {
        reqwest::Response::status(self).as_u16()
    }

    async fn chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        Ok(reqwest::Response::chunk(self).await?)
    }
}

/// Sends requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request`. Resolves once the status line and headers arrived.
    async fn post(&self, request: HttpRequest) -> Result<Box<dyn ReplyBody>, TransportError>;
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    extra_headers: Option<HashMap<String, String>>,
}

impl ReqwestTransport {
    pub fn new(options: &TransportOptions) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(options)?,
            extra_headers: options.extra_headers.clone(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> Result<Box<dyn ReplyBody>, TransportError> {
        let builder = self
            .client
            .post(&request.url)
            .headers(request.headers)
            .body(request.body);
        let builder = add_extra_headers(builder, &self.extra_headers);
        let response = builder.send().await?;
        Ok(Box::new(response))
    }
}

/// Build a configured HTTP client from transport options.
///
/// This applies the transfer timeout and the proxy, if any.
///
/// # Example
/// ```ignore
/// let client = build_http_client(&transport_options)?;
/// ```
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }

    builder.build()
}

/// Add extra headers to a request if specified in transport options.
///
/// # Example
/// ```ignore
/// let mut req = client.post(url);
/// req = add_extra_headers(req, &transport_options.extra_headers);
/// ```
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

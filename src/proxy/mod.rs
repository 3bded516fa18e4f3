//! Upstream forwarding
//!
//! Admitted requests are replayed against the configured IPFS endpoint and
//! the upstream response is streamed back as-is.
//!
//! ```text
//! Client ──► Gateway (auth) ──► IPFS API
//!                 ◄── streamed response ──┘
//! ```
//!
//! Hop-by-hop headers (RFC 9110 section 7.6.1) are dropped in both
//! directions; everything else (method, path, query, headers, body) is
//! forwarded unchanged. Redirects are passed through, not followed.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use http_body_util::{BodyDataStream, BodyExt, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::header::{HeaderMap, HeaderName};
use hyper::{Request, Response};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Args;
use crate::types::{BoxError, GatewayError, ResponseBody, Result};

const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Delivers an admitted request to the upstream
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, req: Request<Incoming>) -> Result<Response<ResponseBody>>;
}

/// Forwarder backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    target: String,
    client: reqwest::Client,
}

impl HttpForwarder {
    pub fn new(target: impl Into<String>, connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            // Ignore HTTP_PROXY and friends; the upstream is always IPFS_ENDPOINT
            .no_proxy()
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            target: target.into(),
            client,
        })
    }

    pub fn from_args(args: &Args) -> Result<Self> {
        Self::new(
            args.ipfs_endpoint.clone(),
            Duration::from_millis(args.connect_timeout_ms),
            Duration::from_millis(args.request_timeout_ms),
        )
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Upstream URL for an inbound path + query
    fn target_url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.target.trim_end_matches('/'), path_and_query)
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, req: Request<Incoming>) -> Result<Response<ResponseBody>> {
        let (parts, body) = req.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = self.target_url(path_and_query);

        debug!(method = %parts.method, url = %url, "Proxying request upstream");

        let upstream = self
            .client
            .request(parts.method, &url)
            .headers(strip_hop_by_hop(parts.headers))
            .body(reqwest::Body::wrap_stream(BodyDataStream::new(body)))
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Upstream request failed");
                GatewayError::Upstream(error_chain(&e))
            })?;

        let status = upstream.status();
        let headers = strip_hop_by_hop(upstream.headers().clone());

        let stream = upstream
            .bytes_stream()
            .map_ok(Frame::data)
            .map_err(|e| -> BoxError { Box::new(e) });

        let mut response = Response::new(StreamBody::new(stream).boxed_unsync());
        *response.status_mut() = status;
        *response.headers_mut() = headers;

        debug!(status = %status, url = %url, "Upstream responded");
        Ok(response)
    }
}

/// Remove hop-by-hop headers, including any named in `Connection`
pub fn strip_hop_by_hop(mut headers: HeaderMap) -> HeaderMap {
    let listed: Vec<HeaderName> = headers
        .get_all(hyper::header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
    headers
}

/// Render an error with its source chain, e.g.
/// "error sending request: client error (Connect): tcp connect error: Connection refused"
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        if !message.contains(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = cause.source();
    }
    message
}

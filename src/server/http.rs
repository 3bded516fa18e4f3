//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Every request passes
//! through the auth gate; admitted requests go to the forwarder.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::auth::{AuthDecision, AuthGate};
use crate::config::Args;
use crate::proxy::{Forwarder, HttpForwarder};
use crate::types::{BoxError, GatewayError, ResponseBody, Result};
use crate::verify::VerificationChain;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Authentication gate (read-only after startup)
    pub gate: AuthGate,
    /// Delivers admitted requests to the IPFS endpoint
    pub forwarder: Arc<dyn Forwarder>,
}

impl AppState {
    /// State with the default scheme chain and an HTTP forwarder to `IPFS_ENDPOINT`
    pub fn new(args: Args) -> Result<Self> {
        let forwarder = HttpForwarder::from_args(&args)?;
        Ok(Self::with_parts(
            args,
            AuthGate::new(VerificationChain::with_default_schemes()),
            Arc::new(forwarder),
        ))
    }

    pub fn with_parts(args: Args, gate: AuthGate, forwarder: Arc<dyn Forwarder>) -> Self {
        Self {
            args,
            gate,
            forwarder,
        }
    }
}

/// Bind the configured address and serve forever
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let addr = state.args.listen_addr();
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}

/// Serve connections from an already-bound listener
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    let local_addr = listener.local_addr()?;
    info!("Listening on {}", local_addr);
    info!("Proxying admitted requests to {}", state.args.ipfs_endpoint);
    info!(
        "Verification schemes: {}",
        state
            .gate
            .chain()
            .schemes()
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Authenticate, then forward or reject
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<ResponseBody>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    // Pre-flight acknowledgement, not an authentication decision
    if method == Method::OPTIONS {
        return Ok(preflight_response());
    }

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let decision = state.gate.authorize(header);
    if !decision.admitted {
        return Ok(unauthorized_response(&decision));
    }

    info!("Proxying request to {}", state.args.ipfs_endpoint);
    match state.forwarder.forward(req).await {
        Ok(response) => Ok(response),
        Err(e) => {
            error!("[{}] {} {} forwarding failed: {}", addr, method, path, e);
            Ok(forwarding_error_response(&e))
        }
    }
}

/// JSON response with the given status
fn json_response(status: StatusCode, body: serde_json::Value) -> Response<ResponseBody> {
    let body = Full::new(Bytes::from(body.to_string()))
        .map_err(|never| -> BoxError { match never {} })
        .boxed_unsync();

    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Pre-flight acknowledgement
fn preflight_response() -> Response<ResponseBody> {
    let mut response = json_response(StatusCode::OK, serde_json::json!({ "Success": true }));
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert("Access-Control-Allow-Headers", HeaderValue::from_static("*"));
    headers.insert("Access-Control-Allow-Methods", HeaderValue::from_static("*"));
    response
}

/// 401 with the caller-facing failure message
fn unauthorized_response(decision: &AuthDecision) -> Response<ResponseBody> {
    let message = decision
        .failure_reason
        .map(|reason| reason.public_message())
        .unwrap_or("Invalid Signature");

    json_response(
        StatusCode::UNAUTHORIZED,
        serde_json::json!({ "Error": message }),
    )
}

/// 500 carrying the forwarding error message
fn forwarding_error_response(err: &GatewayError) -> Response<ResponseBody> {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        serde_json::json!({ "Error": err.to_string() }),
    )
}

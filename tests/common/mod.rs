//! Shared helpers for integration tests: account fixtures, stub upstream,
//! gateway bootstrap.

#![allow(dead_code)]

use bytes::Bytes;
use clap::Parser;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::HeaderValue;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use k256::ecdsa::SigningKey;
use schnorrkel::{ExpansionMode, MiniSecretKey};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use w3auth_gateway::auth::Credential;
use w3auth_gateway::config::Args;
use w3auth_gateway::server::{self, AppState};
use w3auth_gateway::verify::{challenge_bytes, ethereum, ss58, substrate, to_prefixed_hex};

/// sr25519 account that signed its own SS58 address
pub fn substrate_credential(seed: [u8; 32]) -> Credential {
    let pair = MiniSecretKey::from_bytes(&seed)
        .unwrap()
        .expand_to_keypair(ExpansionMode::Ed25519);
    let address = ss58::encode(&pair.public.to_bytes(), ss58::SUBSTRATE_PREFIX).unwrap();
    let signature = pair.sign_simple(substrate::SIGNING_CONTEXT, address.as_bytes());

    Credential::new(address, to_prefixed_hex(&signature.to_bytes()))
}

/// Ethereum account that `personal_sign`ed its own checksummed address
pub fn ethereum_credential(seed: [u8; 32], prefixed: bool) -> Credential {
    let signing_key = SigningKey::from_slice(&seed).unwrap();
    let address = ethereum::to_checksum_address(&ethereum::address_from_key(
        signing_key.verifying_key(),
    ));

    let digest = ethereum::hash_message(&challenge_bytes(&address));
    let (sig, recid) = signing_key.sign_prehash_recoverable(&digest).unwrap();
    let mut bytes = sig.to_bytes().to_vec();
    bytes.push(27 + recid.to_byte());

    let signature = if prefixed {
        to_prefixed_hex(&bytes)
    } else {
        hex::encode(bytes)
    };
    Credential::new(address, signature)
}

/// Non-zero random seed usable by every key type
pub fn random_seed() -> [u8; 32] {
    let mut seed: [u8; 32] = rand::random();
    // Keep below the secp256k1 order and away from zero
    seed[0] &= 0x7f;
    seed[31] |= 0x01;
    seed
}

/// Stub IPFS API: replies `201` with `"<METHOD> <URI> <BODY>"` and an
/// `x-upstream: ipfs` header.
pub async fn spawn_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let service = service_fn(|req: Request<Incoming>| async move {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    let body = req.into_body().collect().await?.to_bytes();

                    let text = format!("{} {} {}", method, uri, String::from_utf8_lossy(&body));
                    let mut response = Response::new(Full::new(Bytes::from(text)));
                    *response.status_mut() = StatusCode::CREATED;
                    response
                        .headers_mut()
                        .insert("x-upstream", HeaderValue::from_static("ipfs"));
                    Ok::<_, hyper::Error>(response)
                });

                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    addr
}

/// Address on which nothing is listening
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start a gateway in front of `upstream`; returns its base URL
pub async fn spawn_gateway(upstream: &str) -> String {
    let args = tokio_test::assert_ok!(Args::try_parse_from([
        "w3auth-gateway",
        "--host",
        "127.0.0.1",
        "--ipfs-endpoint",
        upstream,
        "--connect-timeout-ms",
        "2000",
        "--request-timeout-ms",
        "5000",
    ]));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState::new(args).unwrap());
    tokio::spawn(server::serve(listener, state));

    format!("http://{}", addr)
}

/// Test client that ignores any `HTTP_PROXY` in the environment
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

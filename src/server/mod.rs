//! HTTP listener for the gateway

pub mod http;

pub use http::{run, serve, AppState};

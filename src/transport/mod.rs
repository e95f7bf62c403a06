//! Transport strategies: how a prepared request reaches the wire.
//!
//! A [`Transport`] performs one send/receive and reports what happened as an
//! [`Exchange`]. It never fails outward: a broken connection is an `Exchange`
//! whose body is an error. The [`crate::Dispatcher`] picks a transport by the
//! action's [`crate::TransportKind`] and knows nothing about the concrete
//! implementation, so a new strategy only needs a new `Transport`.
//!
//! Neither built-in strategy sets a timeout, retries, or accepts TLS material.
pub mod pooled;
pub mod standard;

pub use pooled::PooledTransport;
pub use standard::StandardTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, Url, header::HeaderValue};

use crate::error::TransportError;

/// A request with every placeholder already substituted.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub accept: HeaderValue,
    pub body: Option<String>,
}

/// What came back from one send.
#[derive(Debug)]
pub struct Exchange {
    /// Response status, or 0 when none was received.
    pub status: u16,
    /// Send through end of body (or failure), request construction excluded.
    pub elapsed: Duration,
    pub body: Result<Bytes, TransportError>,
}

impl Exchange {
    pub fn failed(status: u16, elapsed: Duration, error: TransportError) -> Self {
        Self {
            status,
            elapsed,
            body: Err(error),
        }
    }
}

/// A request/response execution strategy.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> Exchange;
}

/// Best status carried by a reqwest error, 0 when it has none.
pub(crate) fn error_status(err: &reqwest::Error) -> u16 {
    err.status().map_or(0, |status| status.as_u16())
}

/// Execute a built request and read its body, timing both.
pub(crate) async fn execute(client: &reqwest::Client, request: reqwest::Request) -> Exchange {
    let start = tokio::time::Instant::now();
    let response = match client.execute(request).await {
        Ok(response) => response,
        Err(e) => {
            let status = error_status(&e);
            return Exchange::failed(status, start.elapsed(), TransportError::Send(Box::new(e)));
        }
    };

    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|e| TransportError::Body(Box::new(e)));
    Exchange {
        status,
        elapsed: start.elapsed(),
        body,
    }
}

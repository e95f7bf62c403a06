use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header::ACCEPT};

use super::{Exchange, PreparedRequest, Transport, error_status, execute};
use crate::error::TransportError;

/// The fast path: one keep-alive client shared by every dispatch.
///
/// Sends method, URL and `Accept` only; a body template on the action is
/// ignored by this strategy.
#[derive(Debug, Clone, Default)]
pub struct PooledTransport {
    client: Client,
}

impl PooledTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for PooledTransport {
    async fn send(&self, request: &PreparedRequest) -> Exchange {
        if request.body.is_some() {
            tracing::debug!(url = %request.url, "pooled transport does not send request bodies");
        }

        let built = self
            .client
            .request(request.method.clone(), request.url.clone())
            .header(ACCEPT, request.accept.clone())
            .build();
        match built {
            Ok(built) => execute(&self.client, built).await,
            Err(e) => Exchange::failed(
                error_status(&e),
                Duration::ZERO,
                TransportError::Send(Box::new(e)),
            ),
        }
    }
}

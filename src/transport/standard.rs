use async_trait::async_trait;
use reqwest::{Body, Client, Request, header::ACCEPT};

use super::{Exchange, PreparedRequest, Transport, execute};

/// The standard path: an explicit request object per send, body included.
///
/// Idle connections are not kept, so every dispatch opens its own.
#[derive(Debug, Clone)]
pub struct StandardTransport {
    client: Client,
}

impl StandardTransport {
    pub fn new() -> Self {
        let client = match Client::builder().pool_max_idle_per_host(0).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to a default client, idle connections will be reused");
                Client::default()
            }
        };
        Self { client }
    }
}

impl Default for StandardTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StandardTransport {
    async fn send(&self, prepared: &PreparedRequest) -> Exchange {
        let mut request = Request::new(prepared.method.clone(), prepared.url.clone());
        request
            .headers_mut()
            .insert(ACCEPT, prepared.accept.clone());
        if let Some(body) = &prepared.body {
            *request.body_mut() = Some(Body::from(body.clone()));
        }
        execute(&self.client, request).await
    }
}

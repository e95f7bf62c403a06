use thiserror::Error;

/// Boxed error used where the concrete source depends on the transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures on the way to (or back from) the remote endpoint.
///
/// None of these ever escape a dispatch: they are logged and folded into a
/// degraded [`crate::HttpResult`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    #[error("invalid request URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid Accept header `{0}`")]
    InvalidAccept(String),

    /// Building or sending the request failed before any response arrived.
    #[error("send HTTP request failed: {0}")]
    Send(#[source] BoxError),

    /// The response head arrived but its body could not be read.
    #[error("reading HTTP response failed: {0}")]
    Body(#[source] BoxError),
}

/// Failures while running a structured query over a response body.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Both a JSON path and an XML path were configured on the same handler.
    #[error("extraction handler configures both a JSON path and an XML path")]
    Ambiguous,

    #[error("invalid JSON path `{expr}`: {reason}")]
    JsonPath { expr: String, reason: String },

    #[error("response body is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("invalid XML path `{expr}`: {reason}")]
    XmlPath { expr: String, reason: String },

    #[error("response body is not well-formed XML: {0}")]
    MalformedXml(String),
}

impl ExtractError {
    pub(crate) fn malformed_xml(err: impl std::fmt::Display) -> Self {
        Self::MalformedXml(err.to_string())
    }
}

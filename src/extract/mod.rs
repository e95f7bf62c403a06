//! Response extraction: structured queries over response bodies.
//!
//! An [`ExtractionHandler`] names at most one query. [`extract`] compiles it,
//! runs it against the raw body and returns every match as text, in document
//! order. Failures are returned, never raised: a malformed expression or a
//! body that does not parse as the query's format yields an [`ExtractError`]
//! and the dispatcher carries on without touching the session.
pub mod json;
pub mod xml;

pub use json::JsonQuery;
pub use xml::XmlPath;

use crate::{ExtractionHandler, error::ExtractError};

/// Run the handler's query over `body`.
///
/// Returns an empty sequence when no query is configured, and
/// [`ExtractError::Ambiguous`] when both are.
///
/// ```rust
/// use barrage::{ExtractionHandler, extract::extract};
///
/// let handler = ExtractionHandler::builder()
///     .jsonpath("$.items[*]")
///     .variable("item")
///     .build();
/// let matches = extract(&handler, br#"{"items":["x","y","z"]}"#).unwrap();
/// assert_eq!(matches, vec!["x", "y", "z"]);
/// ```
pub fn extract(handler: &ExtractionHandler, body: &[u8]) -> Result<Vec<String>, ExtractError> {
    let configured = |expr: &Option<String>| {
        expr.as_deref()
            .map(str::trim)
            .filter(|expr| !expr.is_empty())
            .map(str::to_owned)
    };

    match (configured(&handler.jsonpath), configured(&handler.xmlpath)) {
        (Some(_), Some(_)) => Err(ExtractError::Ambiguous),
        (Some(expr), None) => JsonQuery::compile(&expr)?.evaluate(body),
        (None, Some(expr)) => XmlPath::compile(&expr)?.evaluate(body),
        (None, None) => Ok(Vec::new()),
    }
}

use serde_json::Value;
use serde_json_path::JsonPath;

use crate::error::ExtractError;

/// A compiled JSONPath (RFC 9535) query.
#[derive(Debug, Clone)]
pub struct JsonQuery {
    path: JsonPath,
}

impl JsonQuery {
    pub fn compile(expr: &str) -> Result<Self, ExtractError> {
        let path = JsonPath::parse(expr).map_err(|e| ExtractError::JsonPath {
            expr: expr.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self { path })
    }

    /// Every node matched in `body`, in document order, rendered as text.
    pub fn evaluate(&self, body: &[u8]) -> Result<Vec<String>, ExtractError> {
        let document: Value = serde_json::from_slice(body)?;
        Ok(self
            .path
            .query(&document)
            .all()
            .into_iter()
            .map(render)
            .collect())
    }
}

/// Strings render as their unescaped content, untouched. Everything else is
/// compact JSON, trimmed, with one layer of `"` stripped.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => strip_quotes(other.to_string().trim()).to_owned(),
    }
}

/// Drop one trailing and one leading `"`.
fn strip_quotes(s: &str) -> &str {
    let s = s.strip_suffix('"').unwrap_or(s);
    s.strip_prefix('"').unwrap_or(s)
}

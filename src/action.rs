use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Declarative description of a single HTTP call.
///
/// Actions are produced by a scenario loader (or built in code) and are never
/// mutated by the engine; everything that varies per virtual user lives in the
/// [`crate::Session`] and is spliced in through `${name}` placeholders.
///
/// ```rust
/// use barrage::{Action, ExtractionHandler, SelectionPolicy, TransportKind};
///
/// let action = Action::builder()
///     .title("List items")
///     .url("http://localhost:3000/items?owner=${user}")
///     .accept("application/json")
///     .transport(TransportKind::Pooled)
///     .extraction(
///         ExtractionHandler::builder()
///             .jsonpath("$.items[*].id")
///             .index(SelectionPolicy::Random)
///             .variable("item")
///             .build(),
///     )
///     .build();
///
/// assert_eq!(action.method, "GET");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct Action {
    #[builder(default = String::from("GET"), setter(into))]
    #[serde(default = "default_method")]
    pub method: String,
    /// URL template, may contain `${name}` placeholders.
    #[builder(setter(into))]
    pub url: String,
    #[builder(default = String::from(DEFAULT_ACCEPT), setter(into))]
    #[serde(default = "default_accept")]
    pub accept: String,
    /// Body template. Only the standard transport sends a body.
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Label used to group results downstream.
    #[builder(setter(into))]
    pub title: String,
    #[builder(default)]
    #[serde(default, rename = "client")]
    pub transport: TransportKind,
    #[builder(default, setter(strip_option))]
    #[serde(default, rename = "response", skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionHandler>,
}

const DEFAULT_ACCEPT: &str = "*/*";

fn default_method() -> String {
    String::from("GET")
}

fn default_accept() -> String {
    String::from(DEFAULT_ACCEPT)
}

impl Action {
    /// The body template, treating an empty template as no body at all.
    pub fn body_template(&self) -> Option<&str> {
        self.body.as_deref().filter(|body| !body.is_empty())
    }
}

/// Which transport strategy carries an [`Action`].
///
/// Deserializes from `"pooled"` (or the legacy `"fasthttp"`) for the pooled
/// strategy; every other value selects the standard one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum TransportKind {
    /// Shared keep-alive client; method, URL and `Accept` only.
    Pooled,
    /// Explicit request object per send, body included.
    #[default]
    Standard,
}

impl From<String> for TransportKind {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "pooled" | "fasthttp" | "fast" => Self::Pooled,
            _ => Self::Standard,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pooled => f.write_str("pooled"),
            Self::Standard => f.write_str("standard"),
        }
    }
}

/// How an ordered sequence of matches is reduced to one session value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SelectionPolicy {
    #[default]
    First,
    Last,
    Random,
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "random" => Ok(Self::Random),
            other => Err(format!(
                "unknown selection policy `{other}`, expected first, last or random"
            )),
        }
    }
}

impl TryFrom<String> for SelectionPolicy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Pulls a value out of a response body and stores it in the session.
///
/// At most one of `jsonpath` and `xmlpath` may be set; a handler with both is
/// rejected at extraction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct ExtractionHandler {
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonpath: Option<String>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xmlpath: Option<String>,
    #[builder(default)]
    #[serde(default)]
    pub index: SelectionPolicy,
    /// Session variable that receives the selected match.
    #[builder(setter(into))]
    pub variable: String,
}

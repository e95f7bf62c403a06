//! The action dispatcher: one request/response round trip per call.
//!
//! A dispatch runs the whole pipeline for one [`Action`]:
//!
//! 1. substitute session variables into the URL and body templates,
//! 2. send through the transport registered for the action's
//!    [`TransportKind`],
//! 3. on a readable body, run the extraction handler and write the selected
//!    match into the session,
//! 4. build exactly one [`HttpResult`] and push it into the sink.
//!
//! Nothing is returned to the caller. Every failure (bad method, bad URL,
//! connection refused, truncated body, broken query) is logged and folded
//! into the record: a transport failure yields content length 0 and the best
//! status known, a body failure yields content length 0 with the real status,
//! an extraction failure only skips the session write.
use std::{collections::HashMap, sync::Arc, time::Duration};

use reqwest::{Method, Url, header::HeaderValue};

use crate::{
    Action, ExtractionHandler, HttpResult, ResultSink, Session, SimulationClock, TransportKind,
    build_result,
    error::TransportError,
    extract::extract,
    select::select,
    transport::{PooledTransport, PreparedRequest, StandardTransport, Transport},
};

/// Executes actions against the transports it holds.
///
/// One dispatcher is shared (behind an `Arc`) by every virtual user of a
/// simulation; sessions are passed in per call.
///
/// ```rust,no_run
/// use barrage::{Action, Dispatcher, Session, SimulationClock, sink::result_channel};
///
/// # async fn run() {
/// let dispatcher = Dispatcher::new(SimulationClock::start());
/// let (sink, mut results) = result_channel(1024);
/// let mut session = Session::new();
///
/// let action = Action::builder()
///     .title("Home")
///     .url("http://localhost:3000/")
///     .build();
/// dispatcher.dispatch(&action, &mut session, &sink).await;
///
/// let result = results.recv().await.unwrap();
/// println!("{} -> {}", result.title(), result.status());
/// # }
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    clock: SimulationClock,
    transports: HashMap<TransportKind, Arc<dyn Transport>>,
}

impl Dispatcher {
    /// A dispatcher with the built-in pooled and standard transports.
    pub fn new(clock: SimulationClock) -> Self {
        Self {
            clock,
            transports: HashMap::new(),
        }
        .with_transport(TransportKind::Pooled, PooledTransport::new())
        .with_transport(TransportKind::Standard, StandardTransport::new())
    }

    /// Register (or replace) the transport used for `kind`.
    pub fn with_transport(mut self, kind: TransportKind, transport: impl Transport + 'static) -> Self {
        self.transports.insert(kind, Arc::new(transport));
        self
    }

    /// The timing origin every record is measured against.
    pub fn clock(&self) -> SimulationClock {
        self.clock
    }

    /// Perform `action` and deliver its record to `sink`.
    pub async fn dispatch(&self, action: &Action, session: &mut Session, sink: &ResultSink) {
        let result = self.execute(action, session).await;
        sink.submit(result).await;
    }

    /// Perform `action` and return its record instead of submitting it.
    pub async fn execute(&self, action: &Action, session: &mut Session) -> HttpResult {
        let request = match prepare(action, session) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(title = %action.title, error = %e, "could not build HTTP request");
                return self.record(action, Duration::ZERO, 0, 0);
            }
        };

        let Some(transport) = self.transports.get(&action.transport) else {
            tracing::warn!(
                title = %action.title,
                transport = %action.transport,
                "no transport registered"
            );
            return self.record(action, Duration::ZERO, 0, 0);
        };

        tracing::debug!(
            title = %action.title,
            method = %request.method,
            url = %request.url,
            transport = %action.transport,
            "dispatching"
        );
        let exchange = transport.send(&request).await;

        match exchange.body {
            Ok(body) => {
                if let Some(handler) = &action.extraction {
                    apply_extraction(handler, &body, session, &action.title);
                }
                self.record(action, exchange.elapsed, body.len(), exchange.status)
            }
            Err(e) => {
                tracing::warn!(
                    title = %action.title,
                    status = exchange.status,
                    error = %e,
                    "HTTP exchange failed"
                );
                self.record(action, exchange.elapsed, 0, exchange.status)
            }
        }
    }

    fn record(&self, action: &Action, elapsed: Duration, content_length: usize, status: u16) -> HttpResult {
        build_result(&self.clock, elapsed, content_length, status, &action.title)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("clock", &self.clock)
            .field("transports", &self.transports.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Substitute the session into the action and validate the result.
pub fn prepare(action: &Action, session: &Session) -> Result<PreparedRequest, TransportError> {
    let method = Method::from_bytes(action.method.trim().as_bytes())
        .map_err(|_| TransportError::InvalidMethod(action.method.clone()))?;

    let url = session.substitute(&action.url);
    let url = Url::parse(&url).map_err(|e| TransportError::InvalidUrl {
        reason: e.to_string(),
        url,
    })?;

    let accept = HeaderValue::from_str(&action.accept)
        .map_err(|_| TransportError::InvalidAccept(action.accept.clone()))?;

    let body = action.body_template().map(|body| session.substitute(body));

    Ok(PreparedRequest {
        method,
        url,
        accept,
        body,
    })
}

fn apply_extraction(handler: &ExtractionHandler, body: &[u8], session: &mut Session, title: &str) {
    match extract(handler, body) {
        Ok(matches) => {
            if matches.is_empty() {
                tracing::debug!(title, variable = %handler.variable, "extraction matched nothing");
            }
            select(&matches, handler.index, &handler.variable, session);
        }
        Err(e) => {
            tracing::warn!(
                title,
                variable = %handler.variable,
                error = %e,
                "extraction failed, session left unchanged"
            );
        }
    }
}

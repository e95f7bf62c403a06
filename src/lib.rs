//! Barrage: the action-execution engine of an HTTP load generator.
//!
//! Given a declarative [`Action`] and the [`Session`] of one virtual user, the
//! engine performs the HTTP call, measures it, optionally pulls values out of
//! the response into the session, and emits one normalized [`HttpResult`] per
//! call for whatever aggregates and reports downstream.
//!
//! Scenario parsing, ramp-up, statistics and reporting live outside this crate
//! and talk to it only through actions, sessions and the result sink.
//!
//! # Architecture
//!
//! The main building blocks are:
//!
//! - [`Action`]: one HTTP call, with `${name}` placeholders in its URL and body
//!   and an optional [`ExtractionHandler`].
//! - [`Session`]: the variables of one virtual user, threaded by `&mut` through
//!   its actions. [`substitute`] splices them into templates.
//! - [`extract()`]: JSONPath and XML path queries over a response body.
//! - [`select()`]: reduces a sequence of matches to one session value
//!   (first, last or random).
//! - [`Dispatcher`]: runs one round trip through a [`Transport`] strategy and
//!   always emits exactly one record.
//! - [`HttpResult`]: the immutable outcome, timed against a [`SimulationClock`].
//! - [`ResultSink`]: the bounded, many-writer stream of records.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use barrage::{
//!     Action, Dispatcher, ExtractionHandler, SimulationClock, VirtualUser,
//!     sink::{drain, result_channel},
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     // Capture the timing origin once, before anything is dispatched.
//!     let dispatcher = Arc::new(Dispatcher::new(SimulationClock::start()));
//!     let (sink, results) = result_channel(1024);
//!
//!     let actions: Arc<[Action]> = vec![
//!         Action::builder()
//!             .title("Login")
//!             .method("POST")
//!             .url("http://localhost:3000/login")
//!             .body(r#"{"user":"${user}"}"#)
//!             .extraction(
//!                 ExtractionHandler::builder()
//!                     .jsonpath("$.token")
//!                     .variable("token")
//!                     .build(),
//!             )
//!             .build(),
//!         Action::builder()
//!             .title("Profile")
//!             .url("http://localhost:3000/profile?token=${token}")
//!             .build(),
//!     ]
//!     .into();
//!
//!     let user = VirtualUser::new(0, actions).spawn(dispatcher, sink, 10);
//!     let count = drain(results, 64, |batch| println!("{} results", batch.len())).await;
//!     user.await.unwrap();
//!     println!("{count} results in total");
//! }
//! ```
//!
//! # Limitations
//!
//! The engine never retries, sets no request timeout, does not tune the
//! connection pool and accepts no TLS material. Both transports share these
//! limits.

/// Actions, extraction handlers and their policies
pub mod action;
/// The round-trip orchestrator
pub mod dispatch;
/// Transport and extraction errors
pub mod error;
/// Structured queries over response bodies
pub mod extract;
/// Result records and the simulation clock
pub mod metric;
/// Match selection into the session
pub mod select;
/// Per-user variables and placeholder substitution
pub mod session;
/// The result stream
pub mod sink;
/// Request/response execution strategies
pub mod transport;
/// Sequential per-user driver
pub mod user;

pub use action::{Action, ExtractionHandler, SelectionPolicy, TransportKind};
pub use dispatch::Dispatcher;
pub use error::{ExtractError, TransportError};
pub use extract::extract;
pub use metric::{HttpResult, Metric, SimulationClock, build_result};
pub use select::select;
pub use session::{Session, substitute};
pub use sink::ResultSink;
pub use transport::Transport;
pub use user::VirtualUser;

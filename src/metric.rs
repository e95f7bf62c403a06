use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Protocol tag carried by every [`HttpResult`].
pub const PROTOCOL: &str = "HTTP";

/// A `Metric` is a single observed measurement produced by the engine.
///
/// Metrics flow from the dispatchers into a sink and are summarized by
/// whatever aggregator drains it. They must be comparable, thread-safe and
/// cheap to clone.
pub trait Metric
where
    Self: PartialOrd + PartialEq + Send + Sync + Clone + 'static,
{
}

/// Normalized outcome of one dispatched action.
///
/// Built once by [`build_result`] and never modified afterwards; fields are
/// only readable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Serialize)]
pub struct HttpResult {
    protocol: &'static str,
    elapsed_nanos: u64,
    content_length: usize,
    status: u16,
    title: String,
    offset_nanos: u64,
}

impl Metric for HttpResult {}

impl HttpResult {
    pub fn protocol(&self) -> &'static str {
        self.protocol
    }

    /// Round-trip time, send through full body receipt.
    pub fn elapsed_nanos(&self) -> u64 {
        self.elapsed_nanos
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos)
    }

    /// Body size in bytes, 0 for any failed exchange.
    pub fn content_length(&self) -> usize {
        self.content_length
    }

    /// HTTP status, 0 when no response was received.
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Time between the simulation start and the moment this record was built.
    pub fn offset_nanos(&self) -> u64 {
        self.offset_nanos
    }
}

/// The timing origin of a simulation.
///
/// Captured once before the first dispatch and then only read; every record
/// carries its offset from this instant so reporters can bucket by time.
#[derive(Debug, Clone, Copy)]
pub struct SimulationClock {
    start: Instant,
}

impl SimulationClock {
    /// Start the clock now.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Use an origin captured earlier, e.g. before a warm-up phase.
    pub fn starting_at(start: Instant) -> Self {
        Self { start }
    }

    /// Time since the simulation started.
    pub fn offset(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::start()
    }
}

/// Assemble the record for one dispatch.
pub fn build_result(
    clock: &SimulationClock,
    elapsed: Duration,
    content_length: usize,
    status: u16,
    title: &str,
) -> HttpResult {
    HttpResult {
        protocol: PROTOCOL,
        elapsed_nanos: nanos(elapsed),
        content_length,
        status,
        title: title.to_owned(),
        offset_nanos: nanos(clock.offset()),
    }
}

fn nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

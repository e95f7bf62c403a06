use tokio::sync::mpsc;

use crate::{HttpResult, metric::Metric};

/// Write end of the result stream, shared by every dispatcher.
///
/// Backed by a bounded channel: when the consumer falls behind, `submit`
/// waits for room instead of dropping records.
#[derive(Debug, Clone)]
pub struct ResultSink {
    tx: mpsc::Sender<HttpResult>,
}

impl ResultSink {
    pub fn new(tx: mpsc::Sender<HttpResult>) -> Self {
        Self { tx }
    }

    /// Hand a record to the consumer, waiting while the channel is full.
    ///
    /// A sink whose consumer is gone logs and drops the record.
    pub async fn submit(&self, result: HttpResult) {
        if let Err(mpsc::error::SendError(result)) = self.tx.send(result).await {
            tracing::warn!(title = result.title(), "result sink is closed, dropping record");
        }
    }
}

/// Create a sink holding at most `capacity` undrained records.
pub fn result_channel(capacity: usize) -> (ResultSink, mpsc::Receiver<HttpResult>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ResultSink::new(tx), rx)
}

/// Drain `rx` until every sender is dropped, feeding `consumer` in batches.
///
/// Waits for the first record of each batch, then takes whatever else is
/// already queued, up to `batch_size`. Returns how many records were drained.
pub async fn drain<M, F>(mut rx: mpsc::Receiver<M>, batch_size: usize, mut consumer: F) -> usize
where
    M: Metric,
    F: FnMut(&[M]),
{
    let batch_size = batch_size.max(1);
    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0;

    // Receive the first metric or end the loop if every sender is dropped
    while let Some(metric) = rx.recv().await {
        batch.push(metric);

        while batch.len() < batch_size {
            match rx.try_recv() {
                Ok(metric) => batch.push(metric),
                Err(_) => break,
            }
        }

        total += batch.len();
        consumer(&batch);
        batch.clear();
    }
    total
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{SimulationClock, build_result};

    fn record(title: &str) -> HttpResult {
        build_result(&SimulationClock::start(), Duration::ZERO, 1, 200, title)
    }

    #[tokio::test]
    async fn drains_everything_in_bounded_batches() {
        let (sink, rx) = result_channel(16);
        for i in 0..10 {
            sink.submit(record(&format!("r{i}"))).await;
        }
        drop(sink);

        let mut batches = Vec::new();
        let total = drain(rx, 4, |batch: &[HttpResult]| batches.push(batch.len())).await;

        assert_eq!(total, 10);
        assert!(batches.iter().all(|&n| (1..=4).contains(&n)));
        assert_eq!(batches.iter().sum::<usize>(), 10);
    }

    #[tokio::test]
    async fn many_writers_one_consumer() {
        let (sink, rx) = result_channel(2);
        let consumer = tokio::spawn(drain(rx, 8, |_: &[HttpResult]| {}));

        let writers: Vec<_> = (0..8)
            .map(|w| {
                let sink = sink.clone();
                tokio::spawn(async move {
                    for i in 0..25 {
                        sink.submit(record(&format!("{w}-{i}"))).await;
                    }
                })
            })
            .collect();
        drop(sink);
        for writer in writers {
            writer.await.unwrap();
        }

        assert_eq!(consumer.await.unwrap(), 200);
    }

    #[tokio::test]
    async fn closed_sink_does_not_fail_the_writer() {
        let (sink, rx) = result_channel(1);
        drop(rx);
        sink.submit(record("orphan")).await;
    }
}

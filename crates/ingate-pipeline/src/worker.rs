use std::sync::Arc;
use std::time::Duration;

use ingate_core::{Record, Sink};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, warn};

use crate::pipeline::PipelineError;
use crate::queue::IngestionQueue;
use crate::retry::RetryPolicy;
use crate::shutdown::StopSignal;

/// Single consumer of the ingestion queue.
///
/// Accumulates dequeued records and flushes to the primary sink when the
/// batch fills or when `flush_interval` has elapsed since the previous
/// flush. Batches the primary sink rejects after retries, or rejects
/// permanently, are routed to the dead-letter sink; only a dead-letter
/// failure stops the worker, because at that point nothing remains that
/// could keep the batch from being lost silently.
pub struct BatchWorker {
    queue: Arc<IngestionQueue>,
    batch_size: usize,
    flush_interval: Duration,
    sink: Arc<dyn Sink>,
    dlq_sink: Arc<dyn Sink>,
    retry_policy: RetryPolicy,
    current_batch: Vec<Record>,
}

impl BatchWorker {
    pub fn new(
        queue: Arc<IngestionQueue>,
        batch_size: usize,
        flush_interval: Duration,
        sink: Arc<dyn Sink>,
        dlq_sink: Arc<dyn Sink>,
        retry_policy: RetryPolicy,
    ) -> Self {
        assert!(batch_size >= 1, "batch size must be at least 1");
        assert!(
            flush_interval > Duration::ZERO,
            "flush interval must be positive"
        );
        Self {
            queue,
            batch_size,
            flush_interval,
            sink,
            dlq_sink,
            retry_policy,
            current_batch: Vec::new(),
        }
    }

    /// Run until the stop signal fires, then drain the current batch.
    ///
    /// The time trigger is measured from the last flush rather than from the
    /// first record of the batch, which keeps a steady flush cadence under
    /// sustained load. The timer restarts on every tick, including ticks
    /// where the batch was empty and nothing was delivered.
    pub async fn run(mut self, mut stop: StopSignal) -> Result<(), PipelineError> {
        let queue = Arc::clone(&self.queue);
        let mut last_flush = Instant::now();

        while !stop.fired() {
            let deadline = last_flush + self.flush_interval;
            tokio::select! {
                _ = stop.wait() => break,
                taken = timeout_at(deadline, queue.take()) => match taken {
                    Ok(record) => {
                        self.current_batch.push(record);
                        if self.current_batch.len() >= self.batch_size {
                            self.flush().await?;
                            last_flush = Instant::now();
                        }
                    }
                    Err(_elapsed) => {
                        self.flush().await?;
                        last_flush = Instant::now();
                    }
                },
            }
        }

        debug!(
            remaining = self.current_batch.len(),
            "stop signal observed; draining current batch"
        );
        self.flush().await
    }

    /// Deliver the current batch, retrying per policy and falling back to
    /// the dead-letter sink.
    ///
    /// The batch is cleared whether or not the dead-letter write succeeds:
    /// retaining records the DLQ refused would block all forward progress.
    async fn flush(&mut self) -> Result<(), PipelineError> {
        if self.current_batch.is_empty() {
            return Ok(());
        }

        let snapshot = self.current_batch.clone();
        let delivered = self
            .retry_policy
            .execute(|| self.sink.write_batch(&snapshot))
            .await;
        self.current_batch.clear();

        match delivered {
            Ok(()) => {
                debug!(records = snapshot.len(), "batch delivered");
                Ok(())
            }
            Err(err) => {
                warn!(
                    records = snapshot.len(),
                    error = %err,
                    "delivery failed; routing batch to dead-letter sink"
                );
                self.dlq_sink
                    .write_batch(&snapshot)
                    .await
                    .map_err(|dlq_err| {
                        error!(
                            records = snapshot.len(),
                            error = %dlq_err,
                            "dead-letter sink rejected batch"
                        );
                        PipelineError::DeadLetterWrite {
                            records: snapshot.len(),
                            source: dlq_err,
                        }
                    })
            }
        }
    }
}

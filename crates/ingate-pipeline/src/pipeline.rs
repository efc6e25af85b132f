use std::sync::Arc;
use std::time::Duration;

use ingate_core::{DeliveryError, QueueFullError, Record, Sink};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

use crate::queue::IngestionQueue;
use crate::retry::RetryPolicy;
use crate::shutdown::{stop_channel, StopHandle};
use crate::worker::BatchWorker;

/// Tuning knobs consumed by `Pipeline::start`.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub retry_max_attempts: u32,
    pub retry_base_delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            batch_size: 100,
            flush_interval: Duration::from_secs(5),
            retry_max_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

/// Fatal pipeline failures surfaced from the worker task.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The dead-letter sink rejected a batch; there is no remaining
    /// fallback, so the pipeline halts instead of dropping records silently.
    #[error("dead-letter sink rejected a batch of {records} records: {source}")]
    DeadLetterWrite {
        records: usize,
        #[source]
        source: DeliveryError,
    },

    #[error("batch worker task failed: {0}")]
    WorkerTask(#[from] tokio::task::JoinError),
}

/// Wires the queue, retry policy and batch worker together and exposes the
/// admission interface upward.
///
/// One worker per pipeline. Producers call `admit` concurrently; the worker
/// owns its batch exclusively and invokes the sinks serially.
pub struct Pipeline {
    queue: Arc<IngestionQueue>,
    stop: StopHandle,
    worker: Mutex<Option<JoinHandle<Result<(), PipelineError>>>>,
}

impl Pipeline {
    /// Construct the pipeline and spawn its batch worker on the current
    /// runtime.
    pub fn start(settings: PipelineSettings, sink: Arc<dyn Sink>, dlq_sink: Arc<dyn Sink>) -> Self {
        let queue = Arc::new(IngestionQueue::new(settings.queue_capacity));
        let retry_policy = RetryPolicy::new(settings.retry_max_attempts, settings.retry_base_delay);
        let (stop, stop_signal) = stop_channel();

        let worker = BatchWorker::new(
            Arc::clone(&queue),
            settings.batch_size,
            settings.flush_interval,
            sink,
            dlq_sink,
            retry_policy,
        );
        let handle = tokio::spawn(worker.run(stop_signal));

        info!(
            queue_capacity = settings.queue_capacity,
            batch_size = settings.batch_size,
            flush_interval_secs = settings.flush_interval.as_secs_f64(),
            "ingestion pipeline started"
        );

        Self {
            queue,
            stop,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Offer records to the pipeline and return how many were accepted.
    ///
    /// All-or-nothing: on `QueueFullError` nothing was enqueued and the
    /// producer should back off and retry later.
    pub fn admit(&self, records: Vec<Record>) -> Result<usize, QueueFullError> {
        let count = records.len();
        self.queue.admit(records)?;
        Ok(count)
    }

    /// Best-effort number of records waiting in the queue.
    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// Whether the worker task is still alive. The worker only exits early
    /// on a fatal dead-letter failure.
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Fire the stop signal and wait for the worker to drain its current
    /// batch. Records still sitting in the queue are dropped by design; the
    /// queue is in-memory and durability begins at the sinks. Subsequent
    /// calls return Ok without waiting.
    pub async fn shutdown(&self) -> Result<(), PipelineError> {
        self.stop.fire();
        let handle = self.worker.lock().take();
        match handle {
            Some(handle) => handle.await?,
            None => Ok(()),
        }
    }
}

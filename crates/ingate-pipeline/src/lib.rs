// ingate-pipeline - the asynchronous batching pipeline
//
// Bounded admission queue, retry policy, batch worker, and the facade that
// wires them together. Producers call `Pipeline::admit`; a single background
// worker drains the queue and delivers size- or time-triggered batches to
// the primary sink, falling back to the dead-letter sink when retries are
// exhausted or the failure is permanent.

mod pipeline;
mod queue;
mod retry;
mod shutdown;
mod worker;

pub use pipeline::{Pipeline, PipelineError, PipelineSettings};
pub use queue::IngestionQueue;
pub use retry::RetryPolicy;
pub use shutdown::{stop_channel, StopHandle, StopSignal};
pub use worker::BatchWorker;

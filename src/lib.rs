// ingate - asynchronous JSON-record ingestion gateway
//
// Re-exports the pieces needed to embed the pipeline without the HTTP
// surface: the contracts, the pipeline itself, the concrete sinks, and the
// configuration loader.

pub use ingate_config::GatewayConfig;
pub use ingate_core::{DeliveryError, QueueFullError, Record, Sink};
pub use ingate_pipeline::{Pipeline, PipelineError, PipelineSettings, RetryPolicy};
pub use ingate_sink::{FileSink, ObjectStoreSink, TerminalSink};

use async_trait::async_trait;

use crate::{DeliveryError, Record};

/// Destination for delivered batches.
///
/// `write_batch` is invoked with a non-empty, ordered batch that stays
/// immutable for the duration of the call. The write must be atomic: either
/// every record is persisted or the whole call fails, so the pipeline can
/// retry or dead-letter the batch as a unit. The batch worker calls a sink
/// serially; implementations do not need to tolerate concurrent writes from
/// the pipeline.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn write_batch(&self, records: &[Record]) -> Result<(), DeliveryError>;
}

use async_trait::async_trait;
use ingate_core::{DeliveryError, Record, Sink};
use tokio::io::AsyncWriteExt;

use crate::ndjson;

/// Writes each record to stdout as one JSON line. Development sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalSink;

#[async_trait]
impl Sink for TerminalSink {
    async fn write_batch(&self, records: &[Record]) -> Result<(), DeliveryError> {
        let bytes = ndjson::encode(records)?;
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(&bytes)
            .await
            .map_err(DeliveryError::retryable)?;
        stdout.flush().await.map_err(DeliveryError::retryable)?;
        Ok(())
    }
}

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ingate_core::{DeliveryError, Record, Sink};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::ndjson;

/// Appends batches to a file as newline-delimited JSON, creating the file
/// on first write.
///
/// Also serves as the reference dead-letter sink: append-only, one JSON
/// object per line. The batch is encoded up front and handed to the file in
/// a single write.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// NotFound here means a missing parent directory, which no retry will fix.
fn classify_io(err: std::io::Error) -> DeliveryError {
    match err.kind() {
        ErrorKind::PermissionDenied | ErrorKind::NotFound | ErrorKind::InvalidInput => {
            DeliveryError::permanent(err)
        }
        _ => DeliveryError::retryable(err),
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn write_batch(&self, records: &[Record]) -> Result<(), DeliveryError> {
        let bytes = ndjson::encode(records)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(classify_io)?;
        file.write_all(&bytes).await.map_err(classify_io)?;
        file.flush().await.map_err(classify_io)?;
        debug!(records = records.len(), path = %self.path.display(), "appended batch");
        Ok(())
    }
}

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use ingate_core::{DeliveryError, Record, Sink};
use opendal::{ErrorKind, Operator};
use tracing::debug;

use crate::ndjson;

/// Writes each batch as a single object, keyed by a millisecond timestamp.
///
/// Backed by any opendal operator; production wiring uses S3. Keys must
/// advance even when two flushes land in the same millisecond, so the
/// timestamp is bumped monotonically.
pub struct ObjectStoreSink {
    op: Operator,
    prefix: String,
    last_key_millis: AtomicI64,
}

impl ObjectStoreSink {
    pub fn new(op: Operator, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self {
            op,
            prefix,
            last_key_millis: AtomicI64::new(0),
        }
    }

    /// S3-backed sink. Credentials are discovered from the environment or
    /// an IAM role, matching the rest of the opendal S3 stack.
    pub fn s3(
        bucket: &str,
        region: &str,
        endpoint: Option<&str>,
        prefix: &str,
    ) -> anyhow::Result<Self> {
        let mut builder = opendal::services::S3::default().bucket(bucket).region(region);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint(endpoint);
        }
        let op = Operator::new(builder)?.finish();
        Ok(Self::new(op, prefix))
    }

    fn object_key(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last_key_millis
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
                Some(last.max(now - 1) + 1)
            })
            .unwrap_or(now - 1);
        let millis = prev.max(now - 1) + 1;
        format!("{}batch_{}.ndjson", self.prefix, millis)
    }
}

fn classify(err: opendal::Error) -> DeliveryError {
    if err.is_temporary() {
        return DeliveryError::retryable(err);
    }
    match err.kind() {
        ErrorKind::PermissionDenied | ErrorKind::NotFound | ErrorKind::ConfigInvalid => {
            DeliveryError::permanent(err)
        }
        _ => DeliveryError::unclassified(err),
    }
}

#[async_trait]
impl Sink for ObjectStoreSink {
    async fn write_batch(&self, records: &[Record]) -> Result<(), DeliveryError> {
        let bytes = ndjson::encode(records)?;
        let key = self.object_key();
        self.op.write(&key, bytes).await.map_err(classify)?;
        debug!(records = records.len(), key = %key, "wrote batch object");
        Ok(())
    }
}

// Error taxonomy for admission and delivery
//
// Exactly two error shapes cross component boundaries upward: QueueFullError
// at admission time (producer-visible backpressure) and DeliveryError from
// sinks (consumed by the retry policy and dead-letter routing).

use thiserror::Error;

/// Returned by admission when the bounded queue cannot take the whole batch.
///
/// Admission is all-or-nothing: when this is returned, none of the offered
/// records were enqueued and the queue is exactly as it was.
#[derive(Debug, Error)]
#[error("ingestion queue full: {queued} queued, {requested} offered, capacity {capacity}")]
pub struct QueueFullError {
    pub capacity: usize,
    pub queued: usize,
    pub requested: usize,
}

/// A failed batch delivery, classified for the retry policy.
///
/// Sinks signal `Retryable` for transient conditions (network, throttling,
/// temporary unavailability) and `Permanent` for failures that cannot
/// succeed on retry (malformed payload, authorization denied,
/// misconfiguration). `Unclassified` failures are retried like transient
/// ones.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("retryable delivery failure: {0}")]
    Retryable(#[source] anyhow::Error),

    #[error("permanent delivery failure: {0}")]
    Permanent(#[source] anyhow::Error),

    #[error("delivery failure: {0}")]
    Unclassified(#[source] anyhow::Error),
}

impl DeliveryError {
    pub fn retryable(err: impl Into<anyhow::Error>) -> Self {
        Self::Retryable(err.into())
    }

    pub fn permanent(err: impl Into<anyhow::Error>) -> Self {
        Self::Permanent(err.into())
    }

    pub fn unclassified(err: impl Into<anyhow::Error>) -> Self {
        Self::Unclassified(err.into())
    }

    /// Whether the retry policy may attempt this delivery again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, DeliveryError::Permanent(_))
    }
}

// Configuration validation
//
// Rejects configurations the pipeline cannot honor before anything spawns.

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub(crate) fn validate_config(config: &GatewayConfig) -> Result<()> {
    validate_queue_config(&config.queue)?;
    validate_batch_config(&config.batch)?;
    validate_retry_config(&config.retry)?;
    validate_sink_config(&config.sink)?;
    validate_server_config(&config.server)?;
    Ok(())
}

fn validate_queue_config(config: &QueueConfig) -> Result<()> {
    if config.capacity == 0 {
        bail!("queue.capacity must be greater than 0");
    }
    Ok(())
}

fn validate_batch_config(config: &BatchConfig) -> Result<()> {
    if config.size == 0 {
        bail!("batch.size must be greater than 0");
    }

    if !config.flush_interval_secs.is_finite() || config.flush_interval_secs <= 0.0 {
        bail!("batch.flush_interval_secs must be a positive number");
    }

    if config.size > 1_000_000 {
        warn!(
            size = config.size,
            "batch.size is very large; may cause memory issues"
        );
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<()> {
    if config.max_attempts == 0 {
        bail!("retry.max_attempts must be at least 1");
    }

    if !config.base_delay_secs.is_finite() || config.base_delay_secs < 0.0 {
        bail!("retry.base_delay_secs must be zero or greater");
    }

    Ok(())
}

fn validate_sink_config(config: &SinkConfig) -> Result<()> {
    match config.backend {
        SinkBackend::Terminal => {}
        SinkBackend::File => {
            let file = config
                .file
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("file sink backend requires 'sink.file' configuration"))?;

            if file.path.is_empty() {
                bail!("sink.file.path must not be empty");
            }
        }
        SinkBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("s3 sink backend requires 'sink.s3' configuration"))?;

            if s3.bucket.is_empty() {
                bail!("sink.s3.bucket is required for the s3 backend");
            }

            if s3.region.is_empty() {
                bail!("sink.s3.region is required for the s3 backend");
            }
        }
    }

    if config.dlq_path.is_empty() {
        bail!("sink.dlq_path must not be empty");
    }

    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<()> {
    if config.listen_addr.is_empty() {
        bail!("server.listen_addr must not be empty");
    }

    if !config.listen_addr.contains(':') {
        bail!("server.listen_addr must be in 'host:port' form");
    }

    if config.max_payload_bytes == 0 {
        bail!("server.max_payload_bytes must be greater than 0");
    }

    Ok(())
}

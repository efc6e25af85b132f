// Startup wiring: turns validated configuration into live sinks and a
// tracing subscriber before the pipeline spawns.

use std::sync::Arc;

use anyhow::{Context, Result};
use ingate_config::{GatewayConfig, LogFormat, SinkBackend, SinkConfig};
use ingate_core::Sink;
use ingate_sink::{FileSink, ObjectStoreSink, TerminalSink};
use tracing::info;

/// Build the primary sink from configuration.
pub(crate) fn build_sink(config: &SinkConfig) -> Result<Arc<dyn Sink>> {
    let sink: Arc<dyn Sink> = match config.backend {
        SinkBackend::Terminal => {
            info!("Using terminal sink");
            Arc::new(TerminalSink)
        }
        SinkBackend::File => {
            let file = config
                .file
                .as_ref()
                .context("file sink requires 'sink.file' configuration")?;
            info!("Using file sink at: {}", file.path);
            Arc::new(FileSink::new(&file.path))
        }
        SinkBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .context("s3 sink requires 'sink.s3' configuration")?;
            info!("Using S3 sink: bucket={}, region={}", s3.bucket, s3.region);
            Arc::new(ObjectStoreSink::s3(
                &s3.bucket,
                &s3.region,
                s3.endpoint.as_deref(),
                &s3.prefix,
            )?)
        }
    };

    Ok(sink)
}

/// The dead-letter sink is always an append-only NDJSON file.
pub(crate) fn build_dlq_sink(config: &SinkConfig) -> Arc<dyn Sink> {
    info!("Using dead-letter file at: {}", config.dlq_path);
    Arc::new(FileSink::new(&config.dlq_path))
}

/// Install the tracing subscriber in the format the config asks for.
pub(crate) fn init_tracing(config: &GatewayConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Config sets the default level; RUST_LOG still wins when set.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.server.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

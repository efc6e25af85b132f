// Configuration source loading
//
// Builds a GatewayConfig from file and environment sources, then validates
// the merged result. Environment variables win over the file; the file wins
// over built-in defaults.

use crate::{FileSinkConfig, GatewayConfig, S3SinkConfig};
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::Path;

pub(crate) fn load_config() -> Result<GatewayConfig> {
    let mut config = load_file_config()?.unwrap_or_default();
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

fn load_file_config() -> Result<Option<GatewayConfig>> {
    if let Some(path) = env_var("INGATE_CONFIG") {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {path}"))?;
        return parse_toml(&contents).map(Some);
    }

    if let Some(contents) = env_var("INGATE_CONFIG_CONTENT") {
        return parse_toml(&contents).map(Some);
    }

    let default_path = Path::new("./ingate.toml");
    if default_path.exists() {
        let contents =
            std::fs::read_to_string(default_path).context("failed to read ./ingate.toml")?;
        return parse_toml(&contents).map(Some);
    }

    Ok(None)
}

fn parse_toml(contents: &str) -> Result<GatewayConfig> {
    toml::from_str(contents).context("failed to parse config file")
}

fn apply_env_overrides(config: &mut GatewayConfig) -> Result<()> {
    if let Some(capacity) = parse_env("INGATE_QUEUE_CAPACITY")? {
        config.queue.capacity = capacity;
    }
    if let Some(size) = parse_env("INGATE_BATCH_SIZE")? {
        config.batch.size = size;
    }
    if let Some(interval) = parse_env("INGATE_FLUSH_INTERVAL_SECS")? {
        config.batch.flush_interval_secs = interval;
    }
    if let Some(attempts) = parse_env("INGATE_RETRY_MAX_ATTEMPTS")? {
        config.retry.max_attempts = attempts;
    }
    if let Some(delay) = parse_env("INGATE_RETRY_BASE_DELAY_SECS")? {
        config.retry.base_delay_secs = delay;
    }

    if let Some(backend) = env_var("INGATE_SINK_BACKEND") {
        config.sink.backend = backend.parse()?;
    }
    if let Some(path) = env_var("INGATE_FILE_SINK_PATH") {
        config.sink.file = Some(FileSinkConfig { path });
    }
    if let Some(bucket) = env_var("INGATE_S3_BUCKET") {
        s3_config(config).bucket = bucket;
    }
    if let Some(region) = env_var("INGATE_S3_REGION") {
        s3_config(config).region = region;
    }
    if let Some(endpoint) = env_var("INGATE_S3_ENDPOINT") {
        s3_config(config).endpoint = Some(endpoint);
    }
    if let Some(prefix) = env_var("INGATE_S3_PREFIX") {
        s3_config(config).prefix = prefix;
    }
    if let Some(dlq_path) = env_var("INGATE_DLQ_PATH") {
        config.sink.dlq_path = dlq_path;
    }

    if let Some(addr) = env_var("INGATE_LISTEN_ADDR") {
        config.server.listen_addr = addr;
    }
    if let Some(level) = env_var("INGATE_LOG_LEVEL") {
        config.server.log_level = level;
    }
    if let Some(format) = env_var("INGATE_LOG_FORMAT") {
        config.server.log_format = format.parse()?;
    }
    if let Some(max) = parse_env("INGATE_MAX_PAYLOAD_BYTES")? {
        config.server.max_payload_bytes = max;
    }

    Ok(())
}

fn s3_config(config: &mut GatewayConfig) -> &mut S3SinkConfig {
    config.sink.s3.get_or_insert_with(S3SinkConfig::default)
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|err| anyhow!("invalid {key}: {err}")),
        None => Ok(None),
    }
}

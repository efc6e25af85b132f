// ingate-config - layered configuration for the gateway
//
// Sources, highest priority first:
// 1. INGATE_* environment variables
// 2. Config file path from INGATE_CONFIG
// 3. Inline config contents from INGATE_CONFIG_CONTENT
// 4. ./ingate.toml, if present
// 5. Built-in defaults

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod sources;
mod validation;

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub queue: QueueConfig,
    pub batch: BatchConfig,
    pub retry: RetryConfig,
    pub sink: SinkConfig,
    pub server: ServerConfig,
}

impl GatewayConfig {
    /// Load configuration from all sources and validate the result.
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

/// Bounded admission queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: 1000 }
    }
}

/// Batch accumulation and flushing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub size: usize,
    pub flush_interval_secs: f64,
}

impl BatchConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs_f64(self.flush_interval_secs.max(0.0))
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: 100,
            flush_interval_secs: 5.0,
        }
    }
}

/// Delivery retry schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_secs: f64,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs_f64(self.base_delay_secs.max(0.0))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
        }
    }
}

/// Primary sink selection and the dead-letter path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub backend: SinkBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileSinkConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3SinkConfig>,
    pub dlq_path: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            backend: SinkBackend::Terminal,
            file: None,
            s3: None,
            dlq_path: "./ingate-dlq.ndjson".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkBackend {
    #[default]
    Terminal,
    File,
    S3,
}

impl std::fmt::Display for SinkBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkBackend::Terminal => write!(f, "terminal"),
            SinkBackend::File => write!(f, "file"),
            SinkBackend::S3 => write!(f, "s3"),
        }
    }
}

impl std::str::FromStr for SinkBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "terminal" | "stdout" => Ok(SinkBackend::Terminal),
            "file" => Ok(SinkBackend::File),
            "s3" | "object-store" => Ok(SinkBackend::S3),
            _ => anyhow::bail!(
                "unsupported sink backend: {}. Supported: terminal, file, s3",
                s
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSinkConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct S3SinkConfig {
    pub bucket: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub prefix: String,
}

impl Default for S3SinkConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: String::new(),
            endpoint: None,
            prefix: "ingestion/".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: LogFormat,
    pub max_payload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            max_payload_bytes: 8 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("unsupported log format: {}. Supported: text, json", s),
        }
    }
}

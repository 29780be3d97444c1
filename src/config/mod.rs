use crate::utils::error::{AggregatorError, AggregatorResult};
use config::{Config as RawConfig, Environment, File, FileFormat};
use dotenv::dotenv;
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

fn default_port() -> u16 {
    3000
}

fn default_host() -> Ipv4Addr {
    Ipv4Addr::new(127, 0, 0, 1)
}

fn default_ttl() -> Duration {
    Duration::from_secs(180)
}

fn default_flush_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_generator_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_max_retry_attempts() -> usize {
    3
}

fn default_queue_depth() -> usize {
    32
}

fn default_bus_capacity() -> usize {
    256
}

fn human_readable_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let duration_str: String = Deserialize::deserialize(deserializer)?;
    humantime::parse_duration(&duration_str).map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: Ipv4Addr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Settings for the windowed aggregate store.
#[derive(Debug, Deserialize, Clone)]
pub struct AggregationConfig {
    /// How long a counter survives past its last event.
    #[serde(default = "default_ttl", deserialize_with = "human_readable_duration")]
    pub ttl: Duration,
    /// Bounded retries for a transient store failure before the event is dropped.
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            max_retry_attempts: default_max_retry_attempts(),
        }
    }
}

/// Settings for the periodic flush job.
#[derive(Debug, Deserialize, Clone)]
pub struct FlushConfig {
    #[serde(
        default = "default_flush_interval",
        deserialize_with = "human_readable_duration"
    )]
    pub interval: Duration,
    /// Where snapshots are persisted; omit to disable persistence.
    #[serde(default)]
    pub sink_path: Option<PathBuf>,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            interval: default_flush_interval(),
            sink_path: None,
        }
    }
}

/// Settings for the synthetic attack source.
#[derive(Debug, Deserialize, Clone)]
pub struct GeneratorConfig {
    #[serde(
        default = "default_generator_interval",
        deserialize_with = "human_readable_duration"
    )]
    pub interval: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            interval: default_generator_interval(),
        }
    }
}

/// Settings for subscriber fan-out.
#[derive(Debug, Deserialize, Clone)]
pub struct FanoutConfig {
    /// Per-connection queue depth before drop-oldest kicks in.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    /// Capacity of the shared broadcast ring.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            queue_depth: default_queue_depth(),
            bus_capacity: default_bus_capacity(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub flush: FlushConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub fanout: FanoutConfig,
}

impl Config {
    /// Loads the configuration from an optional file and environment variables.
    pub fn new(config_path: Option<PathBuf>) -> AggregatorResult<Self> {
        dotenv().ok();

        let mut builder = RawConfig::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );

        let raw = builder
            .build()
            .map_err(|e| AggregatorError::ConfigError(e.to_string()))?;
        let cfg: Config = raw
            .try_deserialize()
            .map_err(|e| AggregatorError::ConfigError(e.to_string()))?;

        Ok(cfg)
    }

    /// Rejects configurations the runtime could not operate under. Called
    /// before any task is spawned or connection accepted.
    pub fn validate(&self) -> AggregatorResult<()> {
        if self.aggregation.ttl == Duration::from_secs(0) {
            return Err(AggregatorError::ConfigError(
                "aggregation.ttl must be greater than 0".to_string(),
            ));
        }
        if self.flush.interval == Duration::from_secs(0) {
            return Err(AggregatorError::ConfigError(
                "flush.interval must be greater than 0".to_string(),
            ));
        }
        if self.generator.interval == Duration::from_secs(0) {
            return Err(AggregatorError::ConfigError(
                "generator.interval must be greater than 0".to_string(),
            ));
        }
        if self.fanout.queue_depth == 0 {
            return Err(AggregatorError::ConfigError(
                "fanout.queue_depth must be greater than 0".to_string(),
            ));
        }
        if self.fanout.bus_capacity == 0 {
            return Err(AggregatorError::ConfigError(
                "fanout.bus_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
